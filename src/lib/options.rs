//! Per-request rendering options.
//!
//! [`RenderOptions`] is built once per invocation and never mutated by the
//! pipeline. Every option has its default encoded in the `Default` impl, so
//! callers (the command grammar, the TOML configuration, library users) only
//! override what they were given.

use crate::format::OutputFormat;
use crate::TikzError;
use std::fmt;
use std::path::PathBuf;

/// Pixel size the `standalone` class converts to when none was requested.
pub const DEFAULT_SIZE: Size = Size {
    width: 400,
    height: 240,
};

/// Output size in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Parses `"WIDTH,HEIGHT"`.
    ///
    /// # Example
    ///
    /// ```
    /// use tikz2img::options::Size;
    /// let size = Size::parse("300, 150").unwrap();
    /// assert_eq!((size.width, size.height), (300, 150));
    /// assert!(Size::parse("300").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Size, TikzError> {
        let invalid = || {
            TikzError::config_error(
                format!("Invalid size '{}'", value),
                "Use WIDTH,HEIGHT in pixels, e.g. --size 400,240",
            )
        };

        let (width, height) = value.split_once(',').ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Size { width, height })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Encoding used to write `tikz.tex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl TextEncoding {
    pub fn parse(name: &str) -> Result<TextEncoding, TikzError> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            other => Err(TikzError::config_error(
                format!("Unsupported text encoding '{}'", other),
                "Supported encodings are utf-8, latin-1 and ascii",
            )),
        }
    }

    /// Encodes the document text, failing on the first character the encoding cannot hold.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, TikzError> {
        let limit = match self {
            TextEncoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => 0xFF,
            TextEncoding::Ascii => 0x7F,
        };

        text.chars()
            .map(|c| {
                let code = c as u32;
                if code <= limit {
                    Ok(code as u8)
                } else {
                    Err(TikzError::EncodingError {
                        encoding: self.to_string(),
                        character: c,
                    })
                }
            })
            .collect()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
        })
    }
}

/// Which picture package and environment wrap the drawing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PictureVariant {
    #[default]
    Tikz,
    CircuiTikz,
    TkzEuclide,
}

impl PictureVariant {
    pub fn parse(name: &str) -> Result<PictureVariant, TikzError> {
        match name.trim().to_lowercase().as_str() {
            "tikz" => Ok(PictureVariant::Tikz),
            "circuitikz" => Ok(PictureVariant::CircuiTikz),
            "tkz-euclide" | "tkz_euclide" => Ok(PictureVariant::TkzEuclide),
            other => Err(TikzError::config_error(
                format!("Unknown picture variant '{}'", other),
                "Use one of: tikz, circuitikz, tkz-euclide",
            )),
        }
    }

    /// Package loaded in the preamble.
    pub fn package(&self) -> &'static str {
        match self {
            PictureVariant::Tikz => "tikz",
            PictureVariant::CircuiTikz => "circuitikz",
            PictureVariant::TkzEuclide => "tkz-euclide",
        }
    }

    /// Environment wrapping the body.
    pub fn environment(&self) -> &'static str {
        match self {
            PictureVariant::CircuiTikz => "circuitikz",
            PictureVariant::Tikz | PictureVariant::TkzEuclide => "tikzpicture",
        }
    }
}

/// Immutable option set for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Passed through to `scale=` without numeric validation
    pub scale: String,
    /// Requested pixel size; `None` lets SVG output keep its viewBox size
    pub size: Option<Size>,
    pub format: OutputFormat,
    pub encoding: TextEncoding,
    pub preamble: String,
    pub packages: Vec<String>,
    pub libraries: Vec<String>,
    pub pgfplots_libraries: Vec<String>,
    /// Copy of the output file is written here when set
    pub save: Option<PathBuf>,
    /// ImageMagick executable, optionally with a path or leading arguments
    pub imagemagick: String,
    /// Extra options for the picture environment
    pub picture_options: String,
    /// Options used when loading the picture package
    pub package_options: String,
    pub variant: PictureVariant,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            scale: "1".to_string(),
            size: None,
            format: OutputFormat::Png,
            encoding: TextEncoding::Utf8,
            preamble: String::new(),
            packages: Vec::new(),
            libraries: Vec::new(),
            pgfplots_libraries: Vec::new(),
            save: None,
            imagemagick: "convert".to_string(),
            picture_options: String::new(),
            package_options: String::new(),
            variant: PictureVariant::Tikz,
        }
    }
}

impl RenderOptions {
    /// Size handed to the document class.
    pub fn effective_size(&self) -> Size {
        self.size.unwrap_or(DEFAULT_SIZE)
    }
}

/// Splits a comma-separated list, trimming tokens and dropping empty ones.
///
/// # Example
///
/// ```
/// use tikz2img::options::split_list;
/// assert_eq!(split_list("matrix, arrows,,"), vec!["matrix", "arrows"]);
/// assert!(split_list("").is_empty());
/// ```
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strips one pair of matching outer quotes, as long as the quote character
/// does not also appear inside.
pub fn strip_delimiters(value: &str) -> &str {
    let mut chars = value.chars();
    let (Some(first), Some(last)) = (chars.next(), value.chars().last()) else {
        return value;
    };
    if value.len() < 2 || !matches!(first, '\'' | '"') || first != last {
        return value;
    }
    let inner = &value[1..value.len() - 1];
    if inner.contains(first) {
        value
    } else {
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = RenderOptions::default();
        assert_eq!(options.scale, "1");
        assert_eq!(options.size, None);
        assert_eq!(options.effective_size(), DEFAULT_SIZE);
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.imagemagick, "convert");
        assert!(options.packages.is_empty());
        assert_eq!(options.variant, PictureVariant::Tikz);
    }

    #[test]
    fn size_rejects_garbage() {
        assert!(Size::parse("a,b").is_err());
        assert!(Size::parse("0,10").is_err());
        assert!(Size::parse("10,").is_err());
        assert_eq!(Size::parse("600,800").unwrap().to_string(), "600x800");
    }

    #[test]
    fn strip_delimiters_only_removes_matching_pair() {
        assert_eq!(strip_delimiters("'red, thick'"), "red, thick");
        assert_eq!(strip_delimiters("\"red\""), "red");
        assert_eq!(strip_delimiters("'red\""), "'red\"");
        assert_eq!(strip_delimiters("'a'b'"), "'a'b'");
        assert_eq!(strip_delimiters("'"), "'");
        assert_eq!(strip_delimiters(""), "");
    }

    #[test]
    fn latin1_encoding_rejects_wide_characters() {
        let encoding = TextEncoding::parse("ISO-8859-1").unwrap();
        assert_eq!(encoding.encode("caf\u{e9}").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
        assert!(encoding.encode("\u{2192}").is_err());
        assert!(TextEncoding::Ascii.encode("\u{e9}").is_err());
        assert!(TextEncoding::parse("ebcdic").is_err());
    }

    #[test]
    fn variants_select_package_and_environment() {
        assert_eq!(PictureVariant::CircuiTikz.package(), "circuitikz");
        assert_eq!(PictureVariant::CircuiTikz.environment(), "circuitikz");
        assert_eq!(PictureVariant::TkzEuclide.package(), "tkz-euclide");
        assert_eq!(PictureVariant::TkzEuclide.environment(), "tikzpicture");
    }
}
