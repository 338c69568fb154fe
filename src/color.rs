use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Opacity applied to marks when the panel does not send one.
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Highlight fill color, parsed from the panel's `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("expected 6 hex digits, got {0}")]
    BadLength(usize),
    #[error("invalid hex digits: {0}")]
    BadDigits(#[from] hex::FromHexError),
}

impl HighlightColor {
    /// Default panel color.
    pub const YELLOW: Self = Self {
        r: 0xFF,
        g: 0xFF,
        b: 0x00,
    };

    pub fn parse(raw: &str) -> Result<Self, ColorError> {
        let digits = raw.strip_prefix('#').unwrap_or(raw);
        if digits.len() != 6 {
            return Err(ColorError::BadLength(digits.len()));
        }
        let bytes = hex::decode(digits)?;
        Ok(Self {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
        })
    }

    /// CSS value written into `background-color`, e.g. `rgba(255, 255, 0, 0.5)`.
    pub fn css_rgba(&self, opacity: f32) -> String {
        let alpha = opacity.clamp(0.0, 1.0);
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::YELLOW
    }
}

impl FromStr for HighlightColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
