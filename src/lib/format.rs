//! Output formats understood by the renderer.
//!
//! PNG is produced directly by the `standalone` class' convert option, JPEG is
//! derived from that PNG with ImageMagick and SVG comes from `pdf2svg`. Any
//! other format name is passed through untouched: the renderer looks for
//! `tikz.<name>` and labels it `image/<name>`.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("png", "image/png"),
        ("svg", "image/svg+xml"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
    ])
});

/// Requested image format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Raster output written by the LaTeX driver itself
    #[default]
    Png,
    /// Vector output produced by `pdf2svg`
    Svg,
    /// JPEG flattened from the PNG; keeps the spelling (`jpg` or `jpeg`) used for the file extension
    Jpeg(String),
    /// Anything else, passed through verbatim
    Other(String),
}

impl OutputFormat {
    /// Parses a format name. Never fails: unknown names become [`OutputFormat::Other`].
    ///
    /// # Example
    ///
    /// ```
    /// use tikz2img::format::OutputFormat;
    /// assert_eq!(OutputFormat::parse("SVG"), OutputFormat::Svg);
    /// assert_eq!(OutputFormat::parse("jpg").extension(), "jpg");
    /// assert_eq!(OutputFormat::parse("webp").mime_type(), "image/webp");
    /// ```
    pub fn parse(name: &str) -> OutputFormat {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "png" => OutputFormat::Png,
            "svg" => OutputFormat::Svg,
            "jpg" | "jpeg" => OutputFormat::Jpeg(lower),
            _ => OutputFormat::Other(name.trim().to_string()),
        }
    }

    /// File extension of `tikz.<ext>` inside the work directory.
    pub fn extension(&self) -> &str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Jpeg(ext) => ext,
            OutputFormat::Other(name) => name,
        }
    }

    /// MIME type used when publishing the image.
    pub fn mime_type(&self) -> String {
        let ext = self.extension();
        MIME_TYPES
            .get(ext)
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("image/{}", ext))
    }

    /// Raster formats get a `density=300` hint in the document class.
    pub fn is_raster(&self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Jpeg(_))
    }

    /// SVG output carries glyph definitions that clash between images on the same page,
    /// so hosts should render it in isolation.
    pub fn requires_isolation(&self) -> bool {
        matches!(self, OutputFormat::Svg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats_map_to_fixed_mime_types() {
        assert_eq!(OutputFormat::parse("png").mime_type(), "image/png");
        assert_eq!(OutputFormat::parse("svg").mime_type(), "image/svg+xml");
        assert_eq!(OutputFormat::parse("jpg").mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::parse("jpeg").mime_type(), "image/jpeg");
    }

    #[test]
    fn unknown_format_falls_back_to_image_prefix() {
        let format = OutputFormat::parse("tiff");
        assert_eq!(format, OutputFormat::Other("tiff".to_string()));
        assert_eq!(format.mime_type(), "image/tiff");
        assert_eq!(format.extension(), "tiff");
        assert!(!format.is_raster());
    }

    #[test]
    fn jpeg_keeps_its_spelling() {
        assert_eq!(OutputFormat::parse("JPEG").extension(), "jpeg");
        assert_eq!(OutputFormat::parse("jpg").extension(), "jpg");
        assert!(OutputFormat::parse("jpg").is_raster());
    }

    #[test]
    fn only_svg_is_isolated() {
        assert!(OutputFormat::Svg.requires_isolation());
        assert!(!OutputFormat::Png.requires_isolation());
    }
}
