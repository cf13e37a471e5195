//! Workbook decoding: raw uploaded bytes into header-keyed rows.
//!
//! Uploads carry no reliable content type, so the format is sniffed from
//! magic bytes: a zip container or OLE compound file goes through the Excel
//! reader, everything else is treated as CSV.

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::columns::SheetRow;

/// Zip local-file header (xlsx)
const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound file header (legacy xls)
const XLS_MAGIC: &[u8] = &[0xd0, 0xcf, 0x11, 0xe0];

/// Decode an uploaded workbook into rows. The first row is taken as the
/// header row; every following row is zipped against it.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    if bytes.starts_with(XLSX_MAGIC) || bytes.starts_with(XLS_MAGIC) {
        parse_excel(bytes)
    } else {
        parse_csv(bytes)
    }
}

fn parse_excel(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("failed to open workbook")?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.context("failed to read first sheet")?,
        None => bail!("workbook has no sheets"),
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .map(|row| {
            let values = row.iter().map(cell_to_string);
            let cells = headers
                .iter()
                .cloned()
                .zip(values.chain(std::iter::repeat(String::new())))
                .collect();
            SheetRow::new(cells)
        })
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Sheets store integers as floats; render 12 rather than 12.0
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read csv header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read csv row")?;
        let values = record.iter().map(|v| v.to_string());
        let cells = headers
            .iter()
            .cloned()
            .zip(values.chain(std::iter::repeat(String::new())))
            .collect();
        rows.push(SheetRow::new(cells));
    }
    Ok(rows)
}
