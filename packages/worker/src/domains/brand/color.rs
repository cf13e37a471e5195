//! Color math for brand palette refinement.
//!
//! Pure helpers over 6-digit hex colors: RGB/HSL conversion, WCAG relative
//! luminance and contrast ratio, and a single-step lightness correction that
//! nudges scraped brand colors toward legibility.

/// Contrast ratio below which a palette color gets corrected.
const MIN_CONTRAST_RATIO: f64 = 3.0;

/// Lightness moved per correction step.
const LIGHTNESS_STEP: f64 = 0.20;

/// The surface a palette color will sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    White,
    Black,
}

impl Background {
    fn luminance(self) -> f64 {
        match self {
            Background::White => 1.0,
            Background::Black => 0.0,
        }
    }
}

/// Parse a `#rrggbb` color. Returns `None` for anything else.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// RGB to HSL. Hue in degrees [0, 360), saturation and lightness in [0, 1].
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let delta = max - min;
    if delta == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h * 60.0, s, l)
}

/// HSL back to RGB, inverse of [`rgb_to_hsl`].
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        channel_byte(r1 + m),
        channel_byte(g1 + m),
        channel_byte(b1 + m),
    )
}

fn channel_byte(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// WCAG relative luminance of a hex color, `None` for invalid hex.
pub fn relative_luminance(hex: &str) -> Option<f64> {
    let (r, g, b) = hex_to_rgb(hex)?;
    Some(0.2126 * linearize(r) + 0.7152 * linearize(g) + 0.0722 * linearize(b))
}

// sRGB linearization, piecewise per the WCAG definition
fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG contrast ratio between two relative luminances, in [1, 21].
pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
    let lighter = l1.max(l2);
    let darker = l1.min(l2);
    (lighter + 0.05) / (darker + 0.05)
}

/// Shift a color's HSL lightness by `delta`, clamped to [0, 1].
pub fn shift_lightness(hex: &str, delta: f64) -> Option<String> {
    let (r, g, b) = hex_to_rgb(hex)?;
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let (r, g, b) = hsl_to_rgb(h, s, (l + delta).clamp(0.0, 1.0));
    Some(rgb_to_hex(r, g, b))
}

/// Single-pass legibility correction: when `hex` fails the contrast
/// threshold against `background`, move lightness one step the right way
/// (darker against white, lighter against black). Passing colors and
/// invalid hex come back unchanged.
pub fn adjust_for_contrast(hex: &str, background: Background) -> String {
    let luminance = match relative_luminance(hex) {
        Some(l) => l,
        None => return hex.to_string(),
    };
    if contrast_ratio(luminance, background.luminance()) >= MIN_CONTRAST_RATIO {
        return hex.to_string();
    }

    let delta = match background {
        Background::White => -LIGHTNESS_STEP,
        Background::Black => LIGHTNESS_STEP,
    };
    shift_lightness(hex, delta).unwrap_or_else(|| hex.to_string())
}

/// Correct a scraped palette positionally: the first two colors sit on
/// white surfaces, the third on black, the rest are decorative and left
/// alone.
pub fn refine_palette(colors: &[String]) -> Vec<String> {
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| match i {
            0 | 1 => adjust_for_contrast(color, Background::White),
            2 => adjust_for_contrast(color, Background::Black),
            _ => color.clone(),
        })
        .collect()
}
