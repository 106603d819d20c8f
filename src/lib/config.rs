//! Configuration module for render defaults and tool locations.
//!
//! Settings are read from TOML and provide the starting point that command
//! line options are applied on top of. Two sections are recognised:
//!
//! ```toml
//! [render]
//! scale = "1"
//! size = "400,240"          # omit to keep SVG viewBox sizes
//! format = "png"            # png, svg, jpg, jpeg or any other extension
//! encoding = "utf-8"        # utf-8, latin-1 or ascii
//! preamble = ""
//! packages = ["pgfplots"]   # or a comma-separated string
//! libraries = "arrows,matrix"
//! pgfplots_libraries = []
//! picture_options = ""
//! package_options = ""
//! variant = "tikz"          # tikz, circuitikz or tkz-euclide
//!
//! [tools]
//! pdflatex = "pdflatex"
//! pdf2svg = "pdf2svg"
//! imagemagick = "convert"   # e.g. "magick convert" for ImageMagick 7
//! ```
//!
//! Missing keys keep their defaults. A `tikz2imgrc.toml` in the working
//! directory is picked up automatically, then `tikz2img/config.toml` in the
//! user's configuration directory.

use crate::format::OutputFormat;
use crate::options::{split_list, PictureVariant, RenderOptions, Size, TextEncoding};
use crate::toolchain::Toolchain;
use crate::TikzError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tikz2imgrc.toml";

/// Where the TOML configuration should be loaded from.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Built-in defaults
    Default,
    /// Load configuration from a file path
    File(&'a Path),
    /// TOML text supplied by the caller
    Embedded(&'a str),
}

/// Render defaults plus the tools used to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub options: RenderOptions,
    pub toolchain: Toolchain,
}

fn get_str<'v>(section: Option<&'v Value>, key: &str) -> Result<Option<&'v str>, TikzError> {
    match section.and_then(|s| s.get(key)) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(TikzError::config_error(
            format!("'{}' must be a string, found {}", key, other.type_str()),
            format!("Quote the value, e.g. {} = \"{}\"", key, other),
        )),
    }
}

/// Accepts either an array of strings or a comma-separated string.
fn get_list(section: Option<&Value>, key: &str) -> Result<Option<Vec<String>>, TikzError> {
    match section.and_then(|s| s.get(key)) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(split_list(s))),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    TikzError::config_error(
                        format!("'{}' must only contain strings", key),
                        format!("Write {} = [\"a\", \"b\"]", key),
                    )
                })
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(TikzError::config_error(
            format!("'{}' must be a list, found {}", key, other.type_str()),
            format!("Write {} = [\"a\", \"b\"]", key),
        )),
    }
}

/// Scale may be written as a number or a string; it is passed to LaTeX as text.
fn get_scale(section: Option<&Value>) -> Result<Option<String>, TikzError> {
    match section.and_then(|s| s.get("scale")) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Integer(i)) => Ok(Some(i.to_string())),
        Some(Value::Float(f)) => Ok(Some(f.to_string())),
        Some(other) => Err(TikzError::config_error(
            format!("'scale' must be a number or string, found {}", other.type_str()),
            "Write scale = 1.5",
        )),
    }
}

/// Parses TOML configuration text on top of the built-in defaults.
///
/// # Example
/// ```rust
/// use tikz2img::config::parse_config_string;
/// use tikz2img::format::OutputFormat;
///
/// let settings = parse_config_string(r#"
/// [render]
/// format = "svg"
/// libraries = ["arrows", "matrix"]
///
/// [tools]
/// imagemagick = "magick convert"
/// "#).unwrap();
/// assert_eq!(settings.options.format, OutputFormat::Svg);
/// assert_eq!(settings.options.libraries, vec!["arrows", "matrix"]);
/// assert_eq!(settings.options.imagemagick, "magick convert");
/// ```
pub fn parse_config_string(config_str: &str) -> Result<Settings, TikzError> {
    let config: Value = toml::from_str(config_str).map_err(|e| {
        TikzError::config_error(
            format!("Invalid TOML: {}", e),
            "Compare with the output of --get-default-configuration",
        )
    })?;

    let mut settings = Settings::default();
    let render = config.get("render");
    let tools = config.get("tools");
    let options = &mut settings.options;

    if let Some(scale) = get_scale(render)? {
        options.scale = scale;
    }
    if let Some(size) = get_str(render, "size")? {
        options.size = Some(Size::parse(size)?);
    }
    if let Some(format) = get_str(render, "format")? {
        options.format = OutputFormat::parse(format);
    }
    if let Some(encoding) = get_str(render, "encoding")? {
        options.encoding = TextEncoding::parse(encoding)?;
    }
    if let Some(preamble) = get_str(render, "preamble")? {
        options.preamble = preamble.to_string();
    }
    if let Some(packages) = get_list(render, "packages")? {
        options.packages = packages;
    }
    if let Some(libraries) = get_list(render, "libraries")? {
        options.libraries = libraries;
    }
    if let Some(libraries) = get_list(render, "pgfplots_libraries")? {
        options.pgfplots_libraries = libraries;
    }
    if let Some(picture_options) = get_str(render, "picture_options")? {
        options.picture_options = picture_options.to_string();
    }
    if let Some(package_options) = get_str(render, "package_options")? {
        options.package_options = package_options.to_string();
    }
    if let Some(variant) = get_str(render, "variant")? {
        options.variant = PictureVariant::parse(variant)?;
    }

    if let Some(imagemagick) = get_str(tools, "imagemagick")? {
        options.imagemagick = imagemagick.to_string();
    }
    if let Some(pdflatex) = get_str(tools, "pdflatex")? {
        settings.toolchain.pdflatex = pdflatex.to_string();
    }
    if let Some(pdf2svg) = get_str(tools, "pdf2svg")? {
        settings.toolchain.pdf2svg = pdf2svg.to_string();
    }

    Ok(settings)
}

/// Loads settings from `source`.
pub fn load_config_from_source(source: ConfigSource) -> Result<Settings, TikzError> {
    match source {
        ConfigSource::Default => Ok(Settings::default()),
        ConfigSource::File(path) => {
            let config_str = fs::read_to_string(path).map_err(|e| {
                TikzError::io_error(
                    format!("Could not read configuration: {}", e),
                    path,
                    "Check the --config path",
                )
            })?;
            debug!("Loaded configuration from {}", path.display());
            parse_config_string(&config_str)
        }
        ConfigSource::Embedded(config_str) => parse_config_string(config_str),
    }
}

/// Finds a configuration file when none was given explicitly.
///
/// Priority order:
/// 1. `tikz2imgrc.toml` in `cwd`
/// 2. `tikz2img/config.toml` in the user configuration directory
pub fn discover_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("tikz2img").join("config.toml"))
        .filter(|path| path.is_file())
}

/// A commented configuration file that parses back to the defaults.
pub fn default_config_toml() -> String {
    let defaults = Settings::default();
    let options = &defaults.options;
    format!(
        r#"# tikz2img configuration
[render]
scale = "{scale}"
# size = "400,240"   # pixel size; unset keeps SVG viewBox sizes
format = "{format}"
encoding = "{encoding}"
preamble = ""
packages = []
libraries = []
pgfplots_libraries = []
picture_options = ""
package_options = ""
variant = "tikz"

[tools]
pdflatex = "{pdflatex}"
pdf2svg = "{pdf2svg}"
imagemagick = "{imagemagick}"
"#,
        scale = options.scale,
        format = options.format,
        encoding = options.encoding,
        pdflatex = defaults.toolchain.pdflatex,
        pdf2svg = defaults.toolchain.pdf2svg,
        imagemagick = options.imagemagick,
    )
}
