//! Capture configuration.
//!
//! Type-safe options for a capture run: viewport width and output image
//! format.
//!
//! # Example
//!
//! ```ignore
//! use cdp_capture::{CaptureOptions, ImageFormat};
//!
//! let options = CaptureOptions::new()
//!     .with_width(1920)
//!     .with_format(ImageFormat::Jpeg);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// ImageFormat
// ============================================================================

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG (lossless).
    #[default]
    Png,
    /// JPEG at the fixed capture quality.
    Jpeg,
}

impl ImageFormat {
    /// JPEG capture quality; not configurable.
    pub const JPEG_QUALITY: u8 = 85;

    /// Returns the format string used on the protocol.
    #[inline]
    #[must_use]
    pub const fn protocol_name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// Returns the quality parameter, set for JPEG only.
    #[inline]
    #[must_use]
    pub const fn quality(self) -> Option<u8> {
        match self {
            Self::Png => None,
            Self::Jpeg => Some(Self::JPEG_QUALITY),
        }
    }

    /// Returns the conventional file extension.
    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    /// Accepts the CLI spellings `png`, `jpg` and `jpeg`.
    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(Error::config(format!(
                "unsupported image format: {other} (expected png or jpg)"
            ))),
        }
    }
}

// ============================================================================
// CaptureOptions
// ============================================================================

/// Configuration for one capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Viewport width in pixels; the capture height is measured from the
    /// page content.
    pub width: u32,

    /// Output image format.
    pub format: ImageFormat,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureOptions {
    /// Default viewport width in pixels.
    pub const DEFAULT_WIDTH: u32 = 1280;

    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            format: ImageFormat::Png,
        }
    }

    /// Sets the viewport width in pixels.
    #[inline]
    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Sets the output image format.
    #[inline]
    #[must_use]
    pub const fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the width is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(Error::config("viewport width must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_defaults() {
        let options = CaptureOptions::new();
        assert_eq!(options.width, 1280);
        assert_eq!(options.format, ImageFormat::Png);
    }

    #[test]
    fn test_builder_chain() {
        let options = CaptureOptions::new()
            .with_width(1920)
            .with_format(ImageFormat::Jpeg);

        assert_eq!(options.width, 1920);
        assert_eq!(options.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let options = CaptureOptions::new().with_width(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_default() {
        assert!(CaptureOptions::new().validate().is_ok());
    }

    #[test]
    fn test_format_protocol_names() {
        assert_eq!(ImageFormat::Png.protocol_name(), "png");
        assert_eq!(ImageFormat::Jpeg.protocol_name(), "jpeg");
    }

    #[test]
    fn test_jpeg_quality_is_fixed() {
        assert_eq!(ImageFormat::Png.quality(), None);
        assert_eq!(ImageFormat::Jpeg.quality(), Some(85));
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("png".parse::<ImageFormat>().expect("png"), ImageFormat::Png);
        assert_eq!("jpg".parse::<ImageFormat>().expect("jpg"), ImageFormat::Jpeg);
        assert_eq!(
            "jpeg".parse::<ImageFormat>().expect("jpeg"),
            ImageFormat::Jpeg
        );
        assert_eq!("PNG".parse::<ImageFormat>().expect("PNG"), ImageFormat::Png);
    }

    #[test]
    fn test_format_parsing_rejects_unknown() {
        let err = "webp".parse::<ImageFormat>().expect_err("must fail");
        assert!(matches!(err, Error::Config { .. }));
    }
}
