use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// QR error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    #[serde(rename = "L")]
    Low,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "Q")]
    Quartile,
    #[serde(rename = "H")]
    High,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [
        ErrorCorrectionLevel::Low,
        ErrorCorrectionLevel::Medium,
        ErrorCorrectionLevel::Quartile,
        ErrorCorrectionLevel::High,
    ];

    /// Single-letter code (`L`, `M`, `Q`, `H`)
    pub fn code(&self) -> char {
        match self {
            ErrorCorrectionLevel::Low => 'L',
            ErrorCorrectionLevel::Medium => 'M',
            ErrorCorrectionLevel::Quartile => 'Q',
            ErrorCorrectionLevel::High => 'H',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorCorrectionLevel::Low => "Low (7%)",
            ErrorCorrectionLevel::Medium => "Medium (15%)",
            ErrorCorrectionLevel::Quartile => "Quartile (25%)",
            ErrorCorrectionLevel::High => "High (30%)",
        }
    }

    /// Position in [`Self::ALL`], used by the option pickers
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|l| l == self).unwrap_or(1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown error correction level '{0}' (expected L, M, Q or H)")]
    UnknownLevel(String),

    #[error("unsupported pixel size {0} (expected 150, 200 or 300)")]
    UnsupportedSize(u32),
}

impl FromStr for ErrorCorrectionLevel {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(ErrorCorrectionLevel::Low),
            "M" => Ok(ErrorCorrectionLevel::Medium),
            "Q" => Ok(ErrorCorrectionLevel::Quartile),
            "H" => Ok(ErrorCorrectionLevel::High),
            _ => Err(OptionError::UnknownLevel(s.to_string())),
        }
    }
}

/// Edge length of the rendered QR image. Only three sizes are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PixelSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PixelSize {
    pub const ALL: [PixelSize; 3] = [PixelSize::Small, PixelSize::Medium, PixelSize::Large];

    pub fn pixels(&self) -> u32 {
        match self {
            PixelSize::Small => 150,
            PixelSize::Medium => 200,
            PixelSize::Large => 300,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PixelSize::Small => "Small (150x150)",
            PixelSize::Medium => "Medium (200x200)",
            PixelSize::Large => "Large (300x300)",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl TryFrom<u32> for PixelSize {
    type Error = OptionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.pixels() == value)
            .ok_or(OptionError::UnsupportedSize(value))
    }
}

impl From<PixelSize> for u32 {
    fn from(size: PixelSize) -> Self {
        size.pixels()
    }
}

/// How the QR image is rendered; independent of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub error_correction: ErrorCorrectionLevel,
    pub pixel_size: PixelSize,
}
