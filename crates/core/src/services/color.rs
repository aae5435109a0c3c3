//! Color algebra for emotion and mood colors.
//!
//! Colors travel as `#RRGGBB` strings. Every color entering the system comes
//! from the fixed emotion palette or from averaging two valid colors, so a
//! malformed hex string means corrupted data and is reported as a
//! [`ColorError`] instead of being coerced.

use moodlog_common::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Malformed hex color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("expected 6 hex digits in color {0:?}")]
    InvalidLength(String),

    #[error("invalid hex digit in color {0:?}")]
    InvalidDigit(String),
}

impl From<ColorError> for AppError {
    fn from(err: ColorError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl Rgb {
    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel mean of two colors, rounding halves up.
    #[must_use]
    pub fn average(self, other: Self) -> Self {
        Self {
            r: mean_channel(self.r, other.r),
            g: mean_channel(self.g, other.g),
            b: mean_channel(self.b, other.b),
        }
    }
}

fn mean_channel(a: u8, b: u8) -> u8 {
    let mean = (u16::from(a) + u16::from(b) + 1) / 2;
    mean.clamp(0, 255) as u8
}

/// Parse `#RRGGBB` (the `#` is optional, digits are case-insensitive).
pub fn hex_to_rgb(hex: &str) -> Result<Rgb, ColorError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let mut channels = [0u8; 3];

    hex::decode_to_slice(digits, &mut channels).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { .. } => ColorError::InvalidDigit(hex.to_string()),
        _ => ColorError::InvalidLength(hex.to_string()),
    })?;

    let [r, g, b] = channels;
    Ok(Rgb { r, g, b })
}

/// Format as upper-case `#RRGGBB`.
#[must_use]
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.r, rgb.g, rgb.b)
}

/// Average two hex colors channel by channel.
pub fn average_color(a: &str, b: &str) -> Result<String, ColorError> {
    Ok(rgb_to_hex(hex_to_rgb(a)?.average(hex_to_rgb(b)?)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#DC2626").unwrap(), Rgb::new(0xDC, 0x26, 0x26));
        assert_eq!(hex_to_rgb("fbbf24").unwrap(), Rgb::new(0xFB, 0xBF, 0x24));
    }

    #[test]
    fn test_rgb_to_hex_pads_and_uppercases() {
        assert_eq!(rgb_to_hex(Rgb::new(0, 10, 255)), "#000AFF");
        assert_eq!(rgb_to_hex(Rgb::new(0xab, 0xcd, 0xef)), "#ABCDEF");
    }

    #[test]
    fn test_round_trip_each_channel() {
        for v in 0..=255u8 {
            for rgb in [Rgb::new(v, 0, 0), Rgb::new(0, v, 0), Rgb::new(0, 0, v), Rgb::new(v, 255 - v, v / 2)] {
                assert_eq!(hex_to_rgb(&rgb_to_hex(rgb)).unwrap(), rgb);
            }
        }
    }

    #[test]
    fn test_average_black_white_rounds_half_up() {
        assert_eq!(average_color("#000000", "#FFFFFF").unwrap(), "#808080");
    }

    #[test]
    fn test_average_is_per_channel() {
        // (0xDC + 0xFF) / 2 = 237.5 -> 238, (0x26 + 0xFF) / 2 = 146.5 -> 147
        assert_eq!(average_color("#DC2626", "#FFFFFF").unwrap(), "#EE9393");
        assert_eq!(average_color("#123456", "#123456").unwrap(), "#123456");
    }

    #[test]
    fn test_average_extremes_stay_in_range() {
        assert_eq!(average_color("#FFFFFF", "#FFFFFF").unwrap(), "#FFFFFF");
        assert_eq!(average_color("#000000", "#000001").unwrap(), "#000001");
    }

    #[test]
    fn test_malformed_length() {
        assert!(matches!(hex_to_rgb("#FFF"), Err(ColorError::InvalidLength(_))));
        assert!(matches!(hex_to_rgb("#FFFFFFFF"), Err(ColorError::InvalidLength(_))));
        assert!(matches!(hex_to_rgb(""), Err(ColorError::InvalidLength(_))));
    }

    #[test]
    fn test_malformed_digit() {
        assert!(matches!(hex_to_rgb("#GGGGGG"), Err(ColorError::InvalidDigit(_))));
        assert!(matches!(average_color("#FFFFFF", "#12345Z"), Err(ColorError::InvalidDigit(_))));
    }

    #[test]
    fn test_color_error_is_internal() {
        let err: AppError = ColorError::InvalidDigit("#zz".to_string()).into();
        assert!(err.is_server_error());
    }
}
