//! LaTeX document assembly.
//!
//! The document is a `standalone` class file whose convert option makes the
//! LaTeX driver emit `tikz.png` next to `tikz.pdf`. PNG is always requested,
//! whatever the final format; JPEG and SVG are derived afterwards.
//!
//! Nothing in here escapes or validates its input. Option strings and the body
//! are pasted verbatim, so broken LaTeX only shows up as a compiler failure.

use crate::options::RenderOptions;

/// Builds the complete LaTeX source for one drawing.
///
/// # Example
///
/// ```
/// use tikz2img::document::build_document;
/// use tikz2img::options::RenderOptions;
///
/// let mut options = RenderOptions::default();
/// options.libraries = vec!["arrows".to_string()];
/// let tex = build_document(&options, "\\draw (0,0) -- (1,1);");
/// assert!(tex.contains("\\usetikzlibrary{arrows}"));
/// assert!(tex.contains("\\begin{tikzpicture}[scale=1,]"));
/// ```
pub fn build_document(options: &RenderOptions, body: &str) -> String {
    let size = options.effective_size();
    let density = if options.format.is_raster() {
        "density=300,"
    } else {
        ""
    };
    let package = options.variant.package();
    let environment = options.variant.environment();

    let mut tex = String::new();
    tex.push_str(&format!(
        "\\documentclass[convert={{convertexe={{{}}},{}size={}x{},outext=.png}},border=0pt]{{standalone}}\n",
        options.imagemagick, density, size.width, size.height
    ));
    tex.push_str(&format!(
        "\\usepackage[{}]{{{}}}\n",
        options.package_options, package
    ));

    for pkg in options.packages.iter().filter(|p| !p.is_empty()) {
        tex.push_str(&format!("\\usepackage{{{}}}\n", pkg));
    }
    for lib in options.libraries.iter().filter(|l| !l.is_empty()) {
        tex.push_str(&format!("\\usetikzlibrary{{{}}}\n", lib));
    }
    for lib in options.pgfplots_libraries.iter().filter(|l| !l.is_empty()) {
        tex.push_str(&format!("\\usepgfplotslibrary{{{}}}\n", lib));
    }

    if !options.preamble.is_empty() {
        tex.push_str(&options.preamble);
        tex.push('\n');
    }

    tex.push_str("\\begin{document}\n");
    tex.push_str(&format!(
        "\\begin{{{}}}[scale={},{}]\n",
        environment, options.scale, options.picture_options
    ));
    tex.push_str(body);
    tex.push_str(&format!("\n\\end{{{}}}\n\\end{{document}}\n", environment));
    tex
}
