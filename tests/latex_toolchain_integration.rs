use tikz2img::format::OutputFormat;
use tikz2img::options::RenderOptions;
use tikz2img::{RenderResult, Renderer};

// These tests need a TeX installation with pdflatex, pdf2svg and ImageMagick on
// PATH. Run them with `cargo test -- --ignored`.

#[ignore]
#[test]
fn test_real_png_render() {
    let renderer = Renderer::default();
    let result = renderer
        .render(&RenderOptions::default(), "\\draw (0,0) rectangle (1,1);")
        .unwrap();
    match result {
        Some(RenderResult::Image { mime_type, data }) => {
            assert_eq!(mime_type, "image/png");
            assert!(data.starts_with(b"\x89PNG"));
        }
        other => panic!("expected PNG, got {:?}", other),
    }
}

#[ignore]
#[test]
fn test_real_svg_render() {
    let renderer = Renderer::default();
    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..RenderOptions::default()
    };
    let result = renderer
        .render(&options, "\\draw (0,0) circle (1);")
        .unwrap();
    match result {
        Some(RenderResult::Image { data, .. }) => {
            let svg = String::from_utf8(data).unwrap();
            assert!(svg.contains("px\""));
        }
        other => panic!("expected SVG, got {:?}", other),
    }
}

#[ignore]
#[test]
fn test_real_invalid_latex_returns_log() {
    let renderer = Renderer::default();
    let result = renderer
        .render(&RenderOptions::default(), "\\draw (0,0) -- ;\n\\thisisnotamacro")
        .unwrap();
    match result {
        Some(RenderResult::Log(log)) => assert!(!log.is_empty()),
        other => panic!("expected a log, got {:?}", other),
    }
}
