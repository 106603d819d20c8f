//! The tikz2img library turns TikZ and CircuiTikZ drawing code into PNG, SVG or JPEG images.
//! It assembles a `standalone` LaTeX document around the drawing, compiles it with `pdflatex`,
//! converts the result with `pdf2svg` or ImageMagick when needed and hands the image bytes to a
//! display publisher.
//!
//! TeX, `pdf2svg` and ImageMagick are not bundled; they must be installed and on `PATH`
//! (or configured, see [`config`]).
//!
//! Rendering a drawing into bytes:
//! ```no_run
//! use tikz2img::{Renderer, RenderResult};
//! use tikz2img::options::RenderOptions;
//! use std::error::Error;
//!
//! fn example() -> Result<(), Box<dyn Error>> {
//!     let renderer = Renderer::default();
//!     let options = RenderOptions::default();
//!     match renderer.render(&options, "\\draw (0,0) rectangle (1,1);")? {
//!         Some(RenderResult::Image { mime_type, data }) => {
//!             println!("{} ({} bytes)", mime_type, data.len());
//!         }
//!         Some(RenderResult::Log(log)) => eprintln!("LaTeX failed:\n{}", log),
//!         None => eprintln!("no image generated"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Hosts that accept a command line plus a body (notebooks, editors, chat bots) use the
//! [`command::TikzCommand`] instead, which understands the same options as the CLI:
//! ```no_run
//! use tikz2img::command::{CellCommand, RecordingPublisher, TikzCommand};
//!
//! let command = TikzCommand::default();
//! let mut publisher = RecordingPublisher::default();
//! command
//!     .run("-f svg -s 300,150 -l arrows", Some("\\draw[->] (0,0) -- (1,0);"), &mut publisher)
//!     .unwrap();
//! ```
//!
//! Only the document text is needed for debugging:
//! ```rust
//! use tikz2img::document::build_document;
//! use tikz2img::options::{PictureVariant, RenderOptions};
//!
//! let options = RenderOptions {
//!     variant: PictureVariant::CircuiTikz,
//!     ..RenderOptions::default()
//! };
//! let tex = build_document(&options, "\\draw (0,0) to[R] (2,0);");
//! assert!(tex.contains("\\begin{circuitikz}"));
//! ```
//!
//! ## Pipeline
//! ```text
//! +-------------+     +----------------+     +----------------+
//! |  Options    |     |  tikz.tex      |     |  tikz.pdf      |
//! |  + body     | --> |  standalone    | --> |  tikz.png      |
//! |             |     |  document      |     |  (pdflatex)    |
//! +-------------+     +----------------+     +----------------+
//!                                                    |
//!        +-------------------------------------------+
//!        v
//! +---------------+     +------------------+     +--------------+
//! | Conversion    |     | Read tikz.<fmt>  |     | Publish      |
//! | jpg: convert  | --> | svg: fix width/  | --> | mime -> data |
//! | svg: pdf2svg  |     |      height      |     | or log text  |
//! +---------------+     +------------------+     +--------------+
//! ```
//!
//! Each render works in its own temporary directory, which is removed before
//! `render` returns whatever the outcome.

pub mod command;
pub mod config;
pub mod document;
pub mod format;
pub mod options;
pub mod svg;
pub mod toolchain;

use format::OutputFormat;
use log::{debug, info, warn};
use options::RenderOptions;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toolchain::{CompileOutcome, Toolchain};

/// Errors raised while preparing or finishing a render.
///
/// LaTeX and converter failures are not errors: they surface as a
/// [`RenderResult::Log`] or as no result at all.
#[derive(Debug)]
pub enum TikzError {
    /// An option or configuration value could not be used
    ConfigError { message: String, suggestion: String },
    /// Reading or writing a file failed
    IoError {
        message: String,
        path: String,
        suggestion: String,
    },
    /// The document contains a character the requested encoding cannot represent
    EncodingError { encoding: String, character: char },
    /// SVG output could not be parsed or did not have a single root `svg` element
    SvgError { message: String },
    /// The option line could not be parsed
    ArgumentError { message: String },
}

impl Error for TikzError {}
impl fmt::Display for TikzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TikzError::ConfigError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Configuration Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            TikzError::IoError {
                message,
                path,
                suggestion,
            } => {
                write!(f, "❌ File Error: {}", message)?;
                write!(f, "\n📁 Path: {}", path)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            TikzError::EncodingError {
                encoding,
                character,
            } => {
                write!(
                    f,
                    "❌ Encoding Error: U+{:04X} ({}) cannot be written as {}",
                    *character as u32, character, encoding
                )?;
                write!(f, "\n💡 Suggestion: Use --encoding utf-8")?;
                Ok(())
            }
            TikzError::SvgError { message } => write!(f, "❌ SVG Error: {}", message),
            TikzError::ArgumentError { message } => write!(f, "❌ Argument Error: {}", message),
        }
    }
}

impl TikzError {
    pub fn config_error(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        TikzError::ConfigError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn io_error(
        message: impl Into<String>,
        path: &Path,
        suggestion: impl Into<String>,
    ) -> Self {
        TikzError::IoError {
            message: message.into(),
            path: path.display().to_string(),
            suggestion: suggestion.into(),
        }
    }

    pub fn svg_error(message: impl Into<String>) -> Self {
        TikzError::SvgError {
            message: message.into(),
        }
    }
}

/// Outcome of a render that produced something to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    /// LaTeX failed; the compiler log replaces the image
    Log(String),
    /// Final image bytes
    Image { mime_type: String, data: Vec<u8> },
}

impl RenderResult {
    pub fn mime_type(&self) -> &str {
        match self {
            RenderResult::Log(_) => "text/plain",
            RenderResult::Image { mime_type, .. } => mime_type,
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, RenderResult::Log(_))
    }
}

/// Runs the compile, convert and read pipeline.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    toolchain: Toolchain,
    temp_root: Option<PathBuf>,
    caller_dir: Option<PathBuf>,
}

impl Renderer {
    pub fn new(toolchain: Toolchain) -> Self {
        Renderer {
            toolchain,
            ..Renderer::default()
        }
    }

    /// Create work directories under `root` instead of the system temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Directory relative TeX inputs resolve against. Defaults to the current directory.
    pub fn with_caller_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.caller_dir = Some(dir.into());
        self
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Renders `body` with `options`.
    ///
    /// Returns `Ok(None)` when nothing can be shown: the compiler failed without
    /// leaving a log, or no output file was produced.
    pub fn render(
        &self,
        options: &RenderOptions,
        body: &str,
    ) -> Result<Option<RenderResult>, TikzError> {
        let document = document::build_document(options, body);
        let encoded = options.encoding.encode(&document)?;

        let caller_dir = match &self.caller_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                TikzError::io_error(
                    format!("Cannot determine current directory: {}", e),
                    Path::new("."),
                    "Run from an existing, readable directory",
                )
            })?,
        };

        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("tikz2img-");
            b
        };
        let workdir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            TikzError::io_error(
                format!("Could not create work directory: {}", e),
                self.temp_root.as_deref().unwrap_or(Path::new("<tmp>")),
                "Check free space and permissions of the temporary directory",
            )
        })?;
        debug!("Rendering in {}", workdir.path().display());

        let result = self.run_pipeline(workdir.path(), &caller_dir, options, &document, &encoded);

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            warn!("Could not remove {}: {}", path.display(), e);
        }
        result
    }

    fn run_pipeline(
        &self,
        dir: &Path,
        caller_dir: &Path,
        options: &RenderOptions,
        document: &str,
        encoded: &[u8],
    ) -> Result<Option<RenderResult>, TikzError> {
        if let CompileOutcome::Failed(log) =
            self.toolchain.compile(dir, caller_dir, document, encoded)?
        {
            return Ok(log.map(RenderResult::Log));
        }

        match &options.format {
            OutputFormat::Jpeg(ext) => toolchain::convert_png_to_jpeg(&options.imagemagick, dir, ext),
            OutputFormat::Svg => self.toolchain.convert_pdf_to_svg(dir),
            OutputFormat::Png | OutputFormat::Other(_) => {}
        }

        let image_path = dir.join(format!("tikz.{}", options.format.extension()));
        let image = match fs::read(&image_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("No image generated. ({}: {})", image_path.display(), e);
                if let Some(save) = &options.save {
                    warn!("Nothing to save to {}", save.display());
                }
                return Ok(None);
            }
        };

        let data = if options.format == OutputFormat::Svg {
            svg::fix_svg_size(&image, options.size)?
        } else {
            image
        };

        if let Some(save) = &options.save {
            fs::copy(&image_path, save).map_err(|e| {
                TikzError::io_error(
                    format!("Could not save a copy of the image: {}", e),
                    save,
                    "Check that the target directory exists and is writable",
                )
            })?;
            info!("Saved {} to {}", options.format, save.display());
        }

        Ok(Some(RenderResult::Image {
            mime_type: options.format.mime_type(),
            data,
        }))
    }
}
