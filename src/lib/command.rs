//! Command interface for hosts that pass an option line and a body.
//!
//! A host (notebook kernel, editor plugin, the CLI) registers a
//! [`CellCommand`] under its [`name`](CellCommand::name) and calls
//! [`run`](CellCommand::run) with the text after the command name and the
//! optional multi-line body. Results are handed to a [`DisplayPublisher`]:
//!
//! - failure: `{"text/plain": <pdflatex log>}`
//! - success: `{<mime type>: <image bytes>}`, SVG marked `isolated`
//!
//! Option grammar (shared with the `tikz2img` binary):
//!
//! ```text
//! -sc, --scale SCALE            scaling factor (default 1)
//! -s,  --size WIDTH,HEIGHT      pixel size (default 400,240)
//! -f,  --format FORMAT          png, svg, jpg or jpeg
//! -e,  --encoding ENCODING      utf-8, latin-1 or ascii
//! -x,  --preamble TEXT          inserted before \begin{document}
//! -p,  --package LIST           LaTeX packages, comma-separated
//! -l,  --library LIST           TikZ libraries, comma-separated
//! -g,  --pgfplotslibrary LIST   pgfplots libraries, comma-separated
//! -S,  --save FILE              keep a copy of the output file
//! -i,  --imagemagick EXE        ImageMagick executable (default convert)
//! -po, --pictureoptions OPTS    extra picture environment options
//!      --tikzoptions OPTS       options for loading tikz/circuitikz
//!      --showlatex              return the LaTeX source instead of rendering
//! -ct, --circuitikz             use CircuiTikZ
//! -eu, --tkz-euclide            use tkz-euclide
//! CODE...                       drawing code placed before the body
//! ```
//!
//! Backslashes in the option line are literal, outside single quotes too, so
//! `\draw` survives word splitting.

use crate::config::Settings;
use crate::format::OutputFormat;
use crate::options::{split_list, strip_delimiters, PictureVariant, RenderOptions, Size, TextEncoding};
use crate::{document, RenderResult, Renderer, TikzError};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, warn};
use std::path::PathBuf;

/// Name hosts register [`TikzCommand`] under.
pub const COMMAND_NAME: &str = "tikz";

/// Source tag attached to every published bundle.
pub const DISPLAY_SOURCE: &str = "tikz2img.tikz";

/// One display output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBundle {
    pub source: &'static str,
    pub data: RenderResult,
    /// Render in an isolated frame (SVG glyph ids clash otherwise)
    pub isolated: bool,
}

impl DisplayBundle {
    /// The `(mime type, payload)` pair of the bundle.
    pub fn mime_data(&self) -> (&str, &[u8]) {
        match &self.data {
            RenderResult::Log(log) => ("text/plain", log.as_bytes()),
            RenderResult::Image { mime_type, data } => (mime_type, data),
        }
    }
}

/// Receives display output. Any `FnMut(DisplayBundle)` closure is a publisher.
pub trait DisplayPublisher {
    fn publish(&mut self, bundle: DisplayBundle);
}

impl<F: FnMut(DisplayBundle)> DisplayPublisher for F {
    fn publish(&mut self, bundle: DisplayBundle) {
        self(bundle)
    }
}

/// Keeps everything published, in order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub bundles: Vec<DisplayBundle>,
}

impl DisplayPublisher for RecordingPublisher {
    fn publish(&mut self, bundle: DisplayBundle) {
        self.bundles.push(bundle);
    }
}

/// What a command invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `--showlatex`: the assembled document, nothing rendered
    Latex(String),
    /// A bundle with this MIME type was published
    Published(String),
    /// Nothing could be shown; details went to the log
    Nothing,
}

/// A named command taking an option line and a body.
pub trait CellCommand {
    fn name(&self) -> &str;

    fn run(
        &self,
        line: &str,
        body: Option<&str>,
        publisher: &mut dyn DisplayPublisher,
    ) -> Result<CommandOutcome, TikzError>;
}

/// The `tikz` command.
#[derive(Debug, Clone, Default)]
pub struct TikzCommand {
    settings: Settings,
    renderer: Renderer,
}

impl TikzCommand {
    pub fn new(settings: Settings) -> Self {
        let renderer = Renderer::new(settings.toolchain.clone());
        TikzCommand { settings, renderer }
    }

    /// Replace the renderer, e.g. to choose where work directories go.
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }
}

impl CellCommand for TikzCommand {
    fn name(&self) -> &str {
        COMMAND_NAME
    }

    fn run(
        &self,
        line: &str,
        body: Option<&str>,
        publisher: &mut dyn DisplayPublisher,
    ) -> Result<CommandOutcome, TikzError> {
        let words = split_line(line)?;
        let matches = build_command(COMMAND_NAME)
            .no_binary_name(true)
            .try_get_matches_from(words)
            .map_err(|e| TikzError::ArgumentError {
                message: e.render().to_string(),
            })?;

        let options = options_from_matches(&self.settings.options, &matches)?;
        let code = code_from_matches(&matches, body.unwrap_or(""));

        if matches.get_flag("showlatex") {
            return Ok(CommandOutcome::Latex(document::build_document(&options, &code)));
        }
        render_and_publish(&self.renderer, &options, &code, publisher)
    }
}

/// Renders and publishes the result, if any.
pub fn render_and_publish(
    renderer: &Renderer,
    options: &RenderOptions,
    code: &str,
    publisher: &mut dyn DisplayPublisher,
) -> Result<CommandOutcome, TikzError> {
    let Some(result) = renderer.render(options, code)? else {
        return Ok(CommandOutcome::Nothing);
    };

    let isolated = !result.is_log() && options.format.requires_isolation();
    let mime_type = result.mime_type().to_string();
    debug!("Publishing {} (isolated: {})", mime_type, isolated);
    publisher.publish(DisplayBundle {
        source: DISPLAY_SOURCE,
        data: result,
        isolated,
    });
    Ok(CommandOutcome::Published(mime_type))
}

/// Option grammar shared by [`TikzCommand`] and the binary.
pub fn build_command(name: &'static str) -> Command {
    Command::new(name)
        .about("Render TikZ code with pdflatex")
        .arg(
            Arg::new("scale")
                .long("scale")
                .value_name("SCALE")
                .allow_hyphen_values(true)
                .help("Scaling factor of plots. Default is \"--scale 1\""),
        )
        .arg(
            Arg::new("size")
                .short('s')
                .long("size")
                .value_name("WIDTH,HEIGHT")
                .help("Pixel size of plots. Default is \"--size 400,240\""),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Plot format (png, svg, jpg or jpeg)"),
        )
        .arg(
            Arg::new("encoding")
                .short('e')
                .long("encoding")
                .value_name("ENCODING")
                .help("Text encoding of the LaTeX file, e.g. -e utf-8"),
        )
        .arg(
            Arg::new("preamble")
                .short('x')
                .long("preamble")
                .value_name("TEXT")
                .allow_hyphen_values(true)
                .help("LaTeX preamble to insert before the picture"),
        )
        .arg(
            Arg::new("package")
                .short('p')
                .long("package")
                .value_name("LIST")
                .help("LaTeX packages to load, separated by comma, e.g. -p pgfplots,textcomp"),
        )
        .arg(
            Arg::new("library")
                .short('l')
                .long("library")
                .value_name("LIST")
                .help("TikZ libraries to load, separated by comma, e.g. -l matrix,arrows"),
        )
        .arg(
            Arg::new("pgfplotslibrary")
                .short('g')
                .long("pgfplotslibrary")
                .value_name("LIST")
                .help("Pgfplots libraries to load, separated by comma, e.g. -g fillbetween"),
        )
        .arg(
            Arg::new("save")
                .short('S')
                .long("save")
                .value_name("FILE")
                .help("Save a copy of the output file"),
        )
        .arg(
            Arg::new("imagemagick")
                .short('i')
                .long("imagemagick")
                .value_name("EXE")
                .help("ImageMagick executable, optionally with full path. Default is \"convert\""),
        )
        .arg(
            Arg::new("pictureoptions")
                .long("pictureoptions")
                .value_name("OPTIONS")
                .allow_hyphen_values(true)
                .help("Additional options for the picture environment"),
        )
        .arg(
            Arg::new("tikzoptions")
                .long("tikzoptions")
                .value_name("OPTIONS")
                .allow_hyphen_values(true)
                .help("Options to pass when loading TikZ or CircuiTikZ"),
        )
        .arg(
            Arg::new("showlatex")
                .long("showlatex")
                .help("Show the LaTeX file instead of generating an image")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("circuitikz")
                .long("circuitikz")
                .help("Use CircuiTikZ instead of regular TikZ")
                .action(ArgAction::SetTrue)
                .conflicts_with("tkz-euclide"),
        )
        .arg(
            Arg::new("tkz-euclide")
                .long("tkz-euclide")
                .help("Use tkz-euclide instead of regular TikZ")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("code")
                .value_name("CODE")
                .num_args(1..)
                .help("TikZ code, placed before the body"),
        )
}

/// Applies parsed options on top of `base`.
pub fn options_from_matches(
    base: &RenderOptions,
    matches: &ArgMatches,
) -> Result<RenderOptions, TikzError> {
    let mut options = base.clone();
    let value = |id: &str| matches.get_one::<String>(id).map(String::as_str);

    if let Some(scale) = value("scale") {
        options.scale = scale.to_string();
    }
    if let Some(size) = value("size") {
        options.size = Some(Size::parse(size)?);
    }
    if let Some(format) = value("format") {
        options.format = OutputFormat::parse(format);
    }
    if let Some(encoding) = value("encoding") {
        options.encoding = TextEncoding::parse(encoding)?;
    }
    if let Some(preamble) = value("preamble") {
        options.preamble = preamble.to_string();
    }
    if let Some(packages) = value("package") {
        options.packages = split_list(packages);
    }
    if let Some(libraries) = value("library") {
        options.libraries = split_list(libraries);
    }
    if let Some(libraries) = value("pgfplotslibrary") {
        options.pgfplots_libraries = split_list(libraries);
    }
    if let Some(save) = value("save") {
        options.save = Some(PathBuf::from(save));
    }
    if let Some(imagemagick) = value("imagemagick") {
        options.imagemagick = imagemagick.to_string();
    }
    if let Some(picture_options) = value("pictureoptions") {
        options.picture_options = strip_delimiters(picture_options).to_string();
    }
    if let Some(tikz_options) = value("tikzoptions") {
        options.package_options = tikz_options.to_string();
    }
    if matches.get_flag("circuitikz") {
        options.variant = PictureVariant::CircuiTikz;
    } else if matches.get_flag("tkz-euclide") {
        options.variant = PictureVariant::TkzEuclide;
    }

    Ok(options)
}

/// Code words from the option line, then the body.
pub fn code_from_matches(matches: &ArgMatches, body: &str) -> String {
    let inline: Vec<&str> = matches
        .get_many::<String>("code")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();

    match (inline.is_empty(), body.is_empty()) {
        (true, _) => body.to_string(),
        (false, true) => inline.join(" "),
        (false, false) => format!("{}\n{}", inline.join(" "), body),
    }
}

/// Rewrites the two-letter short options to their long form; clap only knows single-letter shorts.
pub fn expand_short_aliases<I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    words
        .into_iter()
        .map(|word| match word.as_str() {
            "-sc" => "--scale".to_string(),
            "-po" => "--pictureoptions".to_string(),
            "-ct" => "--circuitikz".to_string(),
            "-eu" => "--tkz-euclide".to_string(),
            _ => word,
        })
        .collect()
}

/// Splits an option line into words with backslashes kept literal.
pub fn split_line(line: &str) -> Result<Vec<String>, TikzError> {
    let mut protected = String::with_capacity(line.len());
    let mut in_single = false;
    let mut in_double = false;
    for c in line.chars() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if !in_single => protected.push('\\'),
            _ => {}
        }
        protected.push(c);
    }

    let words = shell_words::split(&protected).map_err(|e| {
        warn!("Cannot split option line '{}': {}", line, e);
        TikzError::ArgumentError {
            message: format!("Cannot parse options: {}", e),
        }
    })?;
    Ok(expand_short_aliases(words))
}
