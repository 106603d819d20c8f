use clap::{Arg, ArgAction, ArgMatches};
use log::{debug, error, info, LevelFilter};
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process;
use tikz2img::command::{self, CommandOutcome, DisplayBundle, DisplayPublisher};
use tikz2img::config::{self, ConfigSource, Settings};
use tikz2img::{document, Renderer, RenderResult, TikzError};

/// Exit status when LaTeX failed and its log was printed instead of an image.
const EXIT_COMPILE_FAILED: i32 = 2;

#[derive(Debug)]
enum AppError {
    InputError(io::Error),
    OutputError(String),
    RenderError(TikzError),
    NothingRendered,
}

impl From<TikzError> for AppError {
    fn from(e: TikzError) -> Self {
        AppError::RenderError(e)
    }
}

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verbosity {
    Quiet,   // Only errors
    Normal,  // Warnings and errors
    Verbose, // Debug output
}

impl Verbosity {
    fn from_matches(matches: &ArgMatches) -> Self {
        if matches.get_flag("quiet") {
            Verbosity::Quiet
        } else if matches.get_flag("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Writes images to `--output` (or stdout) and compiler logs to stdout.
struct CliPublisher {
    output: Option<PathBuf>,
    compile_failed: bool,
    write_error: Option<String>,
}

impl DisplayPublisher for CliPublisher {
    fn publish(&mut self, bundle: DisplayBundle) {
        let written = match (&bundle.data, &self.output) {
            (RenderResult::Log(log), _) => {
                self.compile_failed = true;
                io::stdout().write_all(log.as_bytes())
            }
            (RenderResult::Image { data, .. }, Some(path)) => fs::write(path, data),
            (RenderResult::Image { data, .. }, None) => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(data).and_then(|_| stdout.flush())
            }
        };
        if let Err(e) = written {
            self.write_error = Some(e.to_string());
        } else if let (RenderResult::Image { mime_type, data }, Some(path)) =
            (&bundle.data, &self.output)
        {
            info!("Wrote {} ({} bytes) to {}", mime_type, data.len(), path.display());
        }
    }
}

/// Drawing code comes from `--input`, the positional words, or stdin.
fn get_body_input(matches: &ArgMatches) -> Result<String, AppError> {
    if let Some(path) = matches.get_one::<String>("input") {
        return fs::read_to_string(path).map_err(AppError::InputError);
    }
    if matches.contains_id("code") || io::stdin().is_terminal() {
        return Ok(String::new());
    }
    let mut body = String::new();
    io::stdin()
        .read_to_string(&mut body)
        .map_err(AppError::InputError)?;
    Ok(body)
}

/// Get the configuration source based on CLI arguments or default behavior.
///
/// Priority order:
/// 1. If `--config` is explicitly provided, use that file
/// 2. `tikz2imgrc.toml` in the current directory, then the user config directory
/// 3. Otherwise use default configuration
fn get_config_path(matches: &ArgMatches) -> Option<PathBuf> {
    if let Some(config_file) = matches.get_one::<String>("config") {
        return Some(PathBuf::from(config_file));
    }
    let cwd = std::env::current_dir().ok()?;
    config::discover_config_file(&cwd)
}

fn load_settings(matches: &ArgMatches) -> Result<Settings, AppError> {
    let mut settings = match get_config_path(matches) {
        Some(path) => {
            debug!("Using configuration {}", path.display());
            config::load_config_from_source(ConfigSource::File(&path))?
        }
        None => config::load_config_from_source(ConfigSource::Default)?,
    };

    if let Some(pdflatex) = matches.get_one::<String>("pdflatex") {
        settings.toolchain.pdflatex = pdflatex.to_string();
    }
    if let Some(pdf2svg) = matches.get_one::<String>("pdf2svg") {
        settings.toolchain.pdf2svg = pdf2svg.to_string();
    }
    Ok(settings)
}

fn run(matches: ArgMatches) -> Result<i32, AppError> {
    let settings = load_settings(&matches)?;
    let options = command::options_from_matches(&settings.options, &matches)?;
    let body = get_body_input(&matches)?;
    let code = command::code_from_matches(&matches, &body);

    if matches.get_flag("showlatex") {
        println!("{}", document::build_document(&options, &code));
        return Ok(0);
    }

    let renderer = Renderer::new(settings.toolchain);
    let mut publisher = CliPublisher {
        output: matches.get_one::<String>("output").map(PathBuf::from),
        compile_failed: false,
        write_error: None,
    };

    let outcome = command::render_and_publish(&renderer, &options, &code, &mut publisher)?;
    if let Some(e) = publisher.write_error {
        return Err(AppError::OutputError(e));
    }

    match outcome {
        CommandOutcome::Nothing => Err(AppError::NothingRendered),
        _ if publisher.compile_failed => Ok(EXIT_COMPILE_FAILED),
        _ => Ok(0),
    }
}

fn build_cli() -> clap::Command {
    command::build_command("tikz2img")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render TikZ or CircuiTikZ code to PNG, SVG or JPEG")
        .after_help(
            "EXAMPLES:\n  \
            tikz2img -o square.png '\\draw (0,0) rectangle (1,1);'\n  \
            tikz2img -f svg -s 600,800 --scale 2 -I drawing.tikz -o drawing.svg\n  \
            tikz2img --circuitikz --showlatex -I circuit.tikz\n  \
            cat matrix.tikz | tikz2img -l arrows,matrix -f jpg > matrix.jpg\n",
        )
        .arg(
            Arg::new("input")
                .short('I')
                .long("input")
                .value_name("FILE")
                .help("Read the drawing code from a file (defaults to stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the image to a file instead of stdout"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Path to configuration file (TOML format). Auto-detects tikz2imgrc.toml if not specified"),
        )
        .arg(
            Arg::new("pdflatex")
                .long("pdflatex")
                .value_name("EXE")
                .help("LaTeX compiler executable (default: pdflatex)"),
        )
        .arg(
            Arg::new("pdf2svg")
                .long("pdf2svg")
                .value_name("EXE")
                .help("PDF to SVG converter executable (default: pdf2svg)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show debug output from every pipeline step")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress all diagnostics except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("get-default-configuration")
                .long("get-default-configuration")
                .help("Print a default tikz2imgrc.toml to stdout and exit")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    let args = command::expand_short_aliases(std::env::args());
    let matches = build_cli().get_matches_from(args);

    // RUST_LOG still wins over -v/-q when set
    let mut logger = env_logger::Builder::new();
    logger.format_timestamp_millis();
    logger.filter_level(match Verbosity::from_matches(&matches) {
        Verbosity::Quiet => LevelFilter::Error,
        Verbosity::Normal => LevelFilter::Warn,
        Verbosity::Verbose => LevelFilter::Debug,
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    if matches.get_flag("get-default-configuration") {
        println!("{}", config::default_config_toml());
        process::exit(0);
    }

    match run(matches) {
        Ok(code) => process::exit(code),
        Err(e) => {
            match e {
                AppError::InputError(e) => error!("[X] Error reading input: {}", e),
                AppError::OutputError(e) => error!("[X] Error writing output: {}", e),
                AppError::RenderError(e) => error!("[X] {}", e),
                AppError::NothingRendered => error!("[X] No image generated"),
            }
            process::exit(1);
        }
    }
}
