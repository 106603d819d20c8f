//! Explicit sizing for SVG output.
//!
//! `pdf2svg` and similar producers size the root element in points (or not at
//! all), which makes viewers scale the drawing inconsistently. The renderer
//! rewrites `width`/`height` in pixels, taken from the requested size or, when
//! none was requested, from the `viewBox`.

use crate::options::Size;
use crate::TikzError;
use std::ops::Range;

/// Sets pixel `width`/`height` on the single `svg` element and returns that element
/// serialized on its own (any XML prolog is dropped).
///
/// Fails when the document does not parse or does not contain exactly one `svg` element.
///
/// # Example
///
/// ```
/// use tikz2img::svg::fix_svg_size;
///
/// let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"/>"#;
/// let fixed = String::from_utf8(fix_svg_size(svg, None).unwrap()).unwrap();
/// assert!(fixed.contains(r#"width="100px""#));
/// assert!(fixed.contains(r#"height="50px""#));
/// ```
pub fn fix_svg_size(image: &[u8], size: Option<Size>) -> Result<Vec<u8>, TikzError> {
    let text = std::str::from_utf8(image)
        .map_err(|e| TikzError::svg_error(format!("SVG output is not valid UTF-8: {}", e)))?;
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| TikzError::svg_error(format!("SVG output is not well-formed: {}", e)))?;

    let svgs: Vec<roxmltree::Node> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "svg")
        .collect();
    let [svg] = svgs.as_slice() else {
        return Err(TikzError::svg_error(format!(
            "Expected exactly one <svg> element, found {}",
            svgs.len()
        )));
    };

    let (width, height) = match size {
        Some(size) => (u64::from(size.width), u64::from(size.height)),
        None => viewbox_size(svg.attribute("viewBox"))?,
    };

    let element = svg.range();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    for (name, value) in [("width", width), ("height", height)] {
        let replacement = format!("{}=\"{}px\"", name, value);
        let existing = svg
            .attributes()
            .find(|a| a.name() == name && a.namespace().is_none());
        match existing {
            Some(attr) => edits.push((attr.range(), replacement)),
            None => {
                let at = element.start + 1 + qualified_name_len(&text[element.start + 1..]);
                edits.push((at..at, format!(" {}", replacement)));
            }
        }
    }

    // Apply back to front so earlier offsets stay valid. Reversing before the
    // stable sort applies same-offset inserts height first, leaving width first in the output.
    edits.reverse();
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut out = text[element.clone()].to_string();
    for (range, replacement) in edits {
        out.replace_range(
            range.start - element.start..range.end - element.start,
            &replacement,
        );
    }
    Ok(out.into_bytes())
}

/// Third and fourth `viewBox` fields, truncated to whole pixels.
fn viewbox_size(viewbox: Option<&str>) -> Result<(u64, u64), TikzError> {
    let viewbox = viewbox.ok_or_else(|| {
        TikzError::svg_error("SVG has no viewBox and no size was requested")
    })?;
    let fields: Vec<f64> = viewbox
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| TikzError::svg_error(format!("Malformed viewBox '{}'", viewbox)))?;

    match fields.as_slice() {
        [_, _, w, h] if *w >= 0.0 && *h >= 0.0 => Ok((w.trunc() as u64, h.trunc() as u64)),
        _ => Err(TikzError::svg_error(format!("Malformed viewBox '{}'", viewbox))),
    }
}

fn qualified_name_len(tag: &str) -> usize {
    tag.find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len())
}
