//! End-to-end pipeline tests against stand-in tools.
#![cfg(unix)]

mod common;

use common::{entries, FakeTools};
use tikz2img::command::{CellCommand, CommandOutcome, RecordingPublisher, TikzCommand};
use tikz2img::config::Settings;
use tikz2img::format::OutputFormat;
use tikz2img::options::{RenderOptions, Size};
use tikz2img::toolchain::Toolchain;
use tikz2img::{RenderResult, Renderer};

const SQUARE: &str = "\\draw (0,0) rectangle (1,1);";

fn image(result: Option<RenderResult>) -> (String, Vec<u8>) {
    match result {
        Some(RenderResult::Image { mime_type, data }) => (mime_type, data),
        other => panic!("expected an image, got {:?}", other),
    }
}

#[test]
fn png_render_returns_driver_output_and_cleans_up() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(tools.toolchain()).with_temp_root(root.path());

    let (mime, data) = image(renderer.render(&RenderOptions::default(), SQUARE).unwrap());
    assert_eq!(mime, "image/png");
    let text = String::from_utf8(data).unwrap();
    assert!(text.starts_with("PNG\n"));
    assert!(text.contains(SQUARE));
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn rendering_twice_is_byte_identical() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(tools.toolchain())
        .with_temp_root(root.path())
        .with_caller_dir("/work");
    let options = RenderOptions::default();

    let first = renderer.render(&options, SQUARE).unwrap();
    let second = renderer.render(&options, SQUARE).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn compile_failure_returns_only_the_log() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(tools.toolchain()).with_temp_root(root.path());

    let result = renderer
        .render(&RenderOptions::default(), "\\undefinedmacro (0,0);")
        .unwrap();
    match result {
        Some(RenderResult::Log(log)) => assert!(log.contains("Undefined control sequence")),
        other => panic!("expected a log, got {:?}", other),
    }
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn compile_failure_without_log_yields_nothing() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(tools.toolchain()).with_temp_root(root.path());

    let result = renderer.render(&RenderOptions::default(), "% NOLOG").unwrap();
    assert_eq!(result, None);
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn caller_directory_is_on_texinputs() {
    let tools = FakeTools::new();
    let renderer = Renderer::new(tools.toolchain()).with_caller_dir("/srv/notebooks/project");
    let (_, data) = image(renderer.render(&RenderOptions::default(), SQUARE).unwrap());
    let text = String::from_utf8(data).unwrap();
    let line = text.lines().find(|l| l.starts_with("TEXINPUTS=")).unwrap();
    assert!(line.contains("/srv/notebooks/project"), "{}", line);
}

#[test]
fn svg_is_sized_from_viewbox_without_requested_size() {
    let tools = FakeTools::new();
    let renderer = Renderer::new(tools.toolchain());
    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..RenderOptions::default()
    };

    let (mime, data) = image(renderer.render(&options, SQUARE).unwrap());
    assert_eq!(mime, "image/svg+xml");
    let svg = String::from_utf8(data).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"width="100px""#));
    assert!(svg.contains(r#"height="50px""#));
}

#[test]
fn svg_uses_requested_size() {
    let tools = FakeTools::new();
    let renderer = Renderer::new(tools.toolchain());
    let options = RenderOptions {
        format: OutputFormat::Svg,
        size: Some(Size {
            width: 300,
            height: 150,
        }),
        ..RenderOptions::default()
    };

    let (_, data) = image(renderer.render(&options, SQUARE).unwrap());
    let svg = String::from_utf8(data).unwrap();
    assert!(svg.contains(r#"width="300px""#));
    assert!(svg.contains(r#"height="150px""#));
}

#[test]
fn jpeg_is_flattened_with_imagemagick() {
    let tools = FakeTools::new();
    let renderer = Renderer::new(tools.toolchain());
    let options = RenderOptions {
        format: OutputFormat::parse("jpg"),
        imagemagick: tools.path("convert"),
        ..RenderOptions::default()
    };

    let (mime, data) = image(renderer.render(&options, SQUARE).unwrap());
    assert_eq!(mime, "image/jpeg");
    let text = String::from_utf8(data).unwrap();
    assert!(text.starts_with(
        "JPEG tikz.png -quality 100 -background white -flatten tikz.jpg\nPNG\n"
    ));
}

#[test]
fn failed_conversion_surfaces_as_missing_image() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(Toolchain {
        pdf2svg: "tikz2img-no-such-pdf2svg".to_string(),
        ..tools.toolchain()
    })
    .with_temp_root(root.path());
    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..RenderOptions::default()
    };

    assert_eq!(renderer.render(&options, SQUARE).unwrap(), None);
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn unknown_format_passes_through() {
    let tools = FakeTools::new();
    let renderer = Renderer::new(tools.toolchain());
    let options = RenderOptions {
        format: OutputFormat::parse("bmp"),
        ..RenderOptions::default()
    };

    let (mime, _) = image(renderer.render(&options, SQUARE).unwrap());
    assert_eq!(mime, "image/bmp");
}

#[test]
fn save_copies_the_output_file() {
    let tools = FakeTools::new();
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("square.png");
    let renderer = Renderer::new(tools.toolchain());
    let options = RenderOptions {
        save: Some(target.clone()),
        ..RenderOptions::default()
    };

    let (_, data) = image(renderer.render(&options, SQUARE).unwrap());
    assert_eq!(std::fs::read(&target).unwrap(), data);
}

#[test]
fn save_into_missing_directory_is_an_error() {
    let tools = FakeTools::new();
    let root = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(tools.toolchain()).with_temp_root(root.path());
    let options = RenderOptions {
        save: Some(root.path().join("missing").join("square.png")),
        ..RenderOptions::default()
    };

    assert!(renderer.render(&options, SQUARE).is_err());
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn command_publishes_isolated_svg() {
    let tools = FakeTools::new();
    let settings = Settings {
        toolchain: tools.toolchain(),
        ..Settings::default()
    };
    let command = TikzCommand::new(settings);
    let mut publisher = RecordingPublisher::default();

    let outcome = command
        .run("-f svg -s 300,150 -l arrows", Some(SQUARE), &mut publisher)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Published("image/svg+xml".to_string()));
    assert_eq!(publisher.bundles.len(), 1);

    let bundle = &publisher.bundles[0];
    assert!(bundle.isolated);
    let (mime, data) = bundle.mime_data();
    assert_eq!(mime, "image/svg+xml");
    assert!(String::from_utf8_lossy(data).contains(r#"width="300px""#));
}

#[test]
fn command_publishes_log_as_plain_text() {
    let tools = FakeTools::new();
    let command = TikzCommand::new(Settings {
        toolchain: tools.toolchain(),
        ..Settings::default()
    });
    let mut publisher = RecordingPublisher::default();

    let outcome = command
        .run("-f svg", Some("\\undefinedmacro"), &mut publisher)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Published("text/plain".to_string()));
    let bundle = &publisher.bundles[0];
    assert!(!bundle.isolated);
    assert_eq!(bundle.mime_data().0, "text/plain");
}

#[test]
fn command_publishes_nothing_when_no_image() {
    let tools = FakeTools::new();
    let command = TikzCommand::new(Settings {
        toolchain: tools.toolchain(),
        ..Settings::default()
    });
    let mut publisher = RecordingPublisher::default();

    let outcome = command.run("", Some("% NOLOG"), &mut publisher).unwrap();
    assert_eq!(outcome, CommandOutcome::Nothing);
    assert!(publisher.bundles.is_empty());
}
