//! Column inference engine.
//!
//! Supplier spreadsheets arrive with uncontrolled header names. Field
//! resolution composes two strategies: exact (case-insensitive) header
//! lookup from a saved mapping profile when one is supplied, then
//! substring-based smart detection over fixed token lists. The fallback is
//! per field, per row: a profile header that is absent or empty on one row
//! falls back to smart detection for that field on that row only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domains::promos::NewPromoItem;

/// Canonical product fields a spreadsheet column can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Name,
    Price,
    Sku,
    Unit,
    Category,
    Vendor,
    Image,
}

impl CanonicalField {
    /// Candidate tokens for smart substring detection.
    pub fn tokens(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Name => &["name", "product", "description", "item", "title"],
            CanonicalField::Price => &["price", "cost", "amount", "retail"],
            CanonicalField::Sku => &["sku", "item_no", "item#", "code", "part"],
            CanonicalField::Unit => &["unit", "uom", "each", "pack"],
            CanonicalField::Category => &["category", "dept", "department", "type"],
            CanonicalField::Vendor => &["vendor", "brand", "supplier", "manufacturer", "mfr"],
            CanonicalField::Image => &["image", "image_url", "photo", "img"],
        }
    }
}

/// A saved association of canonical fields to literal header strings.
/// The image column has no profile slot; it is always smart-detected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingProfile {
    pub name: Option<String>,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
}

impl MappingProfile {
    fn header_for(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Name => self.name.as_deref(),
            CanonicalField::Price => self.price.as_deref(),
            CanonicalField::Sku => self.sku.as_deref(),
            CanonicalField::Unit => self.unit.as_deref(),
            CanonicalField::Category => self.category.as_deref(),
            CanonicalField::Vendor => self.vendor.as_deref(),
            CanonicalField::Image => None,
        }
    }
}

/// One spreadsheet row as ordered (header, cell) pairs. Header order is the
/// sheet's column order and matters for smart detection ties.
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    cells: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    /// Value under a header matched exactly, case-insensitively.
    fn value_for_header(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(header))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first column whose header contains any candidate token,
    /// case-insensitively. Column order wins over token order.
    fn first_matching(&self, tokens: &[&str]) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| {
                let header = h.to_lowercase();
                tokens.iter().any(|t| header.contains(t))
            })
            .map(|(_, v)| v.as_str())
    }
}

/// Resolve one canonical field for one row: profile exact-header match
/// first, smart detection when that is absent or empty. Returns the trimmed
/// cell value, or an empty string when nothing matches.
pub fn resolve_field(
    row: &SheetRow,
    profile: Option<&MappingProfile>,
    field: CanonicalField,
) -> String {
    if let Some(profile) = profile {
        if let Some(header) = profile.header_for(field) {
            if let Some(value) = row.value_for_header(header) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    row.first_matching(field.tokens())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Numeric-parse a price cell. Anything unparsable becomes zero so
/// downstream rendering always has a numeric price.
pub fn parse_price(raw: &str) -> Decimal {
    raw.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Normalize parsed rows into item records. `sort_order` is the original
/// row index, assigned before filtering, so a dropped row leaves a gap
/// rather than renumbering its successors.
pub fn normalize_rows(rows: &[SheetRow], profile: Option<&MappingProfile>) -> Vec<NewPromoItem> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let optional = |field: CanonicalField| {
                let value = resolve_field(row, profile, field);
                if value.is_empty() {
                    None
                } else {
                    Some(value)
                }
            };

            NewPromoItem {
                name: resolve_field(row, profile, CanonicalField::Name),
                price: parse_price(&resolve_field(row, profile, CanonicalField::Price)),
                sku: optional(CanonicalField::Sku),
                unit: optional(CanonicalField::Unit),
                category: optional(CanonicalField::Category),
                vendor: optional(CanonicalField::Vendor),
                image_url: optional(CanonicalField::Image),
                sort_order: index as i32,
            }
        })
        .filter(|item| !item.name.is_empty())
        .collect()
}
