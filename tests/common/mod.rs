//! Stand-in executables for pdflatex, pdf2svg and ImageMagick.
//!
//! The fake compiler copies `tikz.tex` into `tikz.pdf`, `tikz.png` and
//! `tikz.bmp` (the PNG starts with `PNG` and records `TEXINPUTS`). A document
//! containing `undefinedmacro` fails with a log, one containing `NOLOG` fails
//! without writing a log.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tikz2img::toolchain::Toolchain;

const PDFLATEX: &str = r#"#!/bin/sh
tex="$2"
if grep -q 'NOLOG' "$tex"; then
  exit 3
fi
if grep -q 'undefinedmacro' "$tex"; then
  printf '! Undefined control sequence.\nl.6 \\undefinedmacro\n' > tikz.log
  exit 1
fi
cp "$tex" tikz.pdf
{ printf 'PNG\n'; printf 'TEXINPUTS=%s\n' "$TEXINPUTS"; cat "$tex"; } > tikz.png
cp tikz.png tikz.bmp
"#;

const PDF2SVG: &str = r##"#!/bin/sh
printf '<?xml version="1.0" encoding="UTF-8"?>\n<svg xmlns="http://www.w3.org/2000/svg" width="100pt" height="50pt" viewBox="0 0 100 50" version="1.1"><path d="M 0 0 L 1 1"/></svg>\n' > "$2"
"##;

const CONVERT: &str = r#"#!/bin/sh
for last; do :; done
{ printf 'JPEG %s\n' "$*"; cat "$1"; } > "$last"
"#;

pub struct FakeTools {
    pub dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "pdflatex", PDFLATEX);
        write_script(dir.path(), "pdf2svg", PDF2SVG);
        write_script(dir.path(), "convert", CONVERT);
        FakeTools { dir }
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            pdflatex: self.path("pdflatex"),
            pdf2svg: self.path("pdf2svg"),
        }
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
