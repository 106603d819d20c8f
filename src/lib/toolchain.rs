//! External process orchestration.
//!
//! Every tool runs with the work directory passed explicitly through
//! [`Command::current_dir`]; the process-wide working directory is never
//! touched, so independent renders cannot race on it.
//!
//! Tool failures here are diagnostics, not errors. A failed compile is reported
//! through its log file, and a failed conversion simply leaves the expected
//! output file missing.

use crate::TikzError;
use log::{debug, error, warn};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

pub const TEX_FILE: &str = "tikz.tex";
pub const LOG_FILE: &str = "tikz.log";
pub const PDF_FILE: &str = "tikz.pdf";
pub const PNG_FILE: &str = "tikz.png";

/// Executables used for compiling and converting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub pdflatex: String,
    pub pdf2svg: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            pdflatex: "pdflatex".to_string(),
            pdf2svg: "pdf2svg".to_string(),
        }
    }
}

/// Result of running the LaTeX compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Success,
    /// Compilation failed; carries `tikz.log` when it could be read
    Failed(Option<String>),
}

impl Toolchain {
    /// Writes the document to `dir/tikz.tex` and runs `pdflatex --shell-escape` on it.
    ///
    /// `caller_dir` is put on `TEXINPUTS` so `\input` and friends resolve
    /// relative to where the render was requested from.
    pub fn compile(
        &self,
        dir: &Path,
        caller_dir: &Path,
        document: &str,
        encoded: &[u8],
    ) -> Result<CompileOutcome, TikzError> {
        let tex_path = dir.join(TEX_FILE);
        fs::write(&tex_path, encoded).map_err(|e| {
            TikzError::io_error(
                format!("Could not write LaTeX source: {}", e),
                &tex_path,
                "Check that the temporary directory is writable",
            )
        })?;

        let texinputs = texinputs(caller_dir, std::env::var_os("TEXINPUTS"));
        debug!("TEXINPUTS={}", texinputs.to_string_lossy());

        let spec = format!("{} --shell-escape {}", self.pdflatex, TEX_FILE);
        let result = tool_command(&self.pdflatex).and_then(|mut cmd| {
            cmd.arg("--shell-escape")
                .arg(TEX_FILE)
                .current_dir(dir)
                .env("TEXINPUTS", &texinputs)
                .output()
                .map_err(|e| e.to_string())
        });

        let failed = match result {
            Ok(output) if output.status.success() => {
                debug!("{} finished", spec);
                false
            }
            Ok(output) => {
                error!("pdflatex terminated with status {}", output.status);
                report_failure(&spec, document, &output);
                true
            }
            Err(e) => {
                error!("LaTeX execution failed: {}", e);
                true
            }
        };

        if !failed {
            return Ok(CompileOutcome::Success);
        }

        let log_path = dir.join(LOG_FILE);
        match fs::read(&log_path) {
            Ok(bytes) => Ok(CompileOutcome::Failed(Some(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))),
            Err(e) => {
                warn!("Could not read {}: {}", log_path.display(), e);
                Ok(CompileOutcome::Failed(None))
            }
        }
    }

    /// `pdf2svg tikz.pdf tikz.svg`
    pub fn convert_pdf_to_svg(&self, dir: &Path) {
        run_converter("pdf2svg", &self.pdf2svg, &[PDF_FILE, "tikz.svg"], dir);
    }
}

/// Flattens `tikz.png` onto a white background as `tikz.<extension>` at full quality.
pub fn convert_png_to_jpeg(imagemagick: &str, dir: &Path, extension: &str) {
    let target = format!("tikz.{}", extension);
    run_converter(
        "convert",
        imagemagick,
        &[
            PNG_FILE,
            "-quality",
            "100",
            "-background",
            "white",
            "-flatten",
            &target,
        ],
        dir,
    );
}

/// Search path for TeX inputs: the caller's directory goes in front of any
/// existing value. Without one, `.` and the caller directory are followed by
/// an empty segment so TeX still consults its default locations.
pub fn texinputs(caller_dir: &Path, existing: Option<OsString>) -> OsString {
    let sep = path_separator();
    let mut value = OsString::new();
    match existing {
        Some(existing) => {
            value.push(caller_dir);
            value.push(sep);
            value.push(existing);
        }
        None => {
            value.push(".");
            value.push(sep);
            value.push(caller_dir);
            value.push(sep);
            value.push(sep);
        }
    }
    value
}

fn path_separator() -> &'static OsStr {
    if cfg!(windows) {
        OsStr::new(";")
    } else {
        OsStr::new(":")
    }
}

/// Builds a [`Command`] from an executable spec such as `convert` or `"/opt/im/magick" convert`.
/// The spec is split into words; no shell is involved.
fn tool_command(spec: &str) -> Result<Command, String> {
    let words = shell_words::split(spec).map_err(|e| format!("cannot parse '{}': {}", spec, e))?;
    let (program, args) = words
        .split_first()
        .ok_or_else(|| "empty executable name".to_string())?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    Ok(cmd)
}

fn run_converter(label: &str, spec: &str, args: &[&str], dir: &Path) {
    let status = tool_command(spec).and_then(|mut cmd| {
        cmd.args(args)
            .current_dir(dir)
            .status()
            .map_err(|e| e.to_string())
    });
    match status {
        Ok(status) if status.success() => debug!("{} {} finished", spec, args.join(" ")),
        Ok(status) => warn!("{} terminated with status {}", label, status),
        Err(e) => warn!("{} execution failed: {}", label, e),
    }
}

fn report_failure(command: &str, document: &str, output: &Output) {
    warn!("command:\n{}", indent(command));
    warn!("{}:\n{}", TEX_FILE, indent(document));
    warn!("stdout:\n{}", indent(&String::from_utf8_lossy(&output.stdout)));
    warn!("stderr:\n{}", indent(&String::from_utf8_lossy(&output.stderr)));
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
