//! Parameter translation between caller inputs and provider-specific formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Aspect ratios supported by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 16:9
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [Self; 5] =
        [Self::Square, Self::Landscape, Self::Portrait, Self::Standard, Self::StandardPortrait];

    /// The `W:H` form providers expect.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|r| r.as_str() == s).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
            format!("Unsupported aspect ratio '{s}'. Valid: {valid:?}")
        })
    }
}

/// Translate an aspect ratio to a classic image-endpoint pixel size.
///
/// The classic endpoint has no 4:3 or 3:4 sizes; those fall back to square,
/// as does anything unrecognized.
#[must_use]
pub fn aspect_ratio_to_classic_size(ratio: &str) -> &'static str {
    match ratio {
        "16:9" => "1792x1024",
        "9:16" => "1024x1792",
        _ => "1024x1024",
    }
}

/// Whether the classic endpoint renders this ratio as a square image.
#[must_use]
pub fn degrades_to_square(ratio: &str) -> bool {
    ratio != "1:1" && aspect_ratio_to_classic_size(ratio) == "1024x1024"
}

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "jpeg" | "png" | "webp" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: jpeg, png, webp")),
    }
}

/// Validate a requested variation count.
///
/// # Errors
///
/// Returns an error if the count is zero or larger than a grid holds.
pub fn validate_count(count: usize) -> Result<(), String> {
    if (1..=9).contains(&count) {
        Ok(())
    } else {
        Err(format!("Unsupported count {count}. Valid: 1-9"))
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "jpeg" => "jpg",
        "webp" => "webp",
        _ => "png",
    }
}
