use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fs;
use std::future::Future;

use posterkit::api::{Paint, TextBaseline};
use posterkit::backends::recording::{DrawOp, PathCommand, RecordingCanvas};
use posterkit::{
    ImageData, ImageFetcher, Painter, PosterError, Rect, Result, SessionConfig, ShapeStyle,
    StyleArg, TextStyle, load_images,
};

fn painter(pixel_ratio: f64) -> Painter<RecordingCanvas> {
    let config = SessionConfig {
        pixel_ratio,
        ..SessionConfig::default()
    };
    Painter::new(RecordingCanvas::new().with_char_advance(10.0), config)
}

fn write_png(path: &std::path::Path, width: u32, height: u32, rgba: &[u8]) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = png::Encoder::new(file, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(rgba).unwrap();
    writer.finish().unwrap();
}

#[test]
fn rounded_rect_at_double_scale() {
    let mut p = painter(1.0);
    let style = ShapeStyle::new().fill("#0f0").border("2 solid #000");
    p.round_rect(Rect::new(0.0, 0.0, 100.0, 100.0), [10.0; 4], &style)
        .unwrap();

    let ops = p.canvas().ops();
    assert_eq!(ops.len(), 2);

    let DrawOp::FillPath { path, state, .. } = &ops[0] else {
        panic!("expected fill, got {:?}", ops[0]);
    };
    assert_eq!(
        path.commands,
        vec![
            PathCommand::Arc {
                x: 20.0,
                y: 20.0,
                radius: 20.0,
                start_angle: PI,
                end_angle: PI * 1.5
            },
            PathCommand::Arc {
                x: 180.0,
                y: 20.0,
                radius: 20.0,
                start_angle: PI * 1.5,
                end_angle: TAU
            },
            PathCommand::Arc {
                x: 180.0,
                y: 180.0,
                radius: 20.0,
                start_angle: 0.0,
                end_angle: FRAC_PI_2
            },
            PathCommand::Arc {
                x: 20.0,
                y: 180.0,
                radius: 20.0,
                start_angle: FRAC_PI_2,
                end_angle: PI
            },
            PathCommand::ClosePath,
        ]
    );
    assert_eq!(state.fill_style, Paint::Color("#0f0".into()));
    assert_eq!(state.shadow_blur, 0.0);
    assert_eq!(state.shadow_color, "rgba(0,0,0,0)");

    let DrawOp::StrokePath { state, .. } = &ops[1] else {
        panic!("expected stroke, got {:?}", ops[1]);
    };
    assert_eq!(state.line_width, 4.0);
    assert_eq!(state.stroke_style, Paint::Color("#000".into()));
    assert!(state.line_dash.is_empty());
    assert_eq!(
        (state.shadow_offset_x, state.shadow_offset_y, state.shadow_blur),
        (0.0, 0.0, 0.0)
    );

    assert_eq!(p.canvas().depth(), 0);
}

#[test]
fn rect_image_fits_inside_border() {
    // pixel ratio 0.5 with the default 2x supersample keeps scale at 1
    let mut p = painter(0.5);
    let image = ImageData {
        width: 2,
        height: 2,
        data: vec![255; 16],
    };
    p.rect_image(&image, Rect::new(0.0, 0.0, 50.0, 50.0), 5.0, StyleArg::Absent)
        .unwrap();

    let kinds: Vec<&str> = p
        .canvas()
        .ops()
        .iter()
        .map(|op| match op {
            DrawOp::StrokePath { .. } => "stroke",
            DrawOp::Clip { .. } => "clip",
            DrawOp::DrawImageScaled { .. } => "image",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["stroke", "clip", "image"]);

    let fit = 50.0 / 55.0;
    let expected = [fit, 0.0, 0.0, fit, 2.5, 2.5];
    let clip = p.canvas().ops()[1].state();
    assert_eq!(clip.transform, expected);

    match &p.canvas().ops()[2] {
        DrawOp::DrawImageScaled {
            dx,
            dy,
            dw,
            dh,
            state,
            ..
        } => {
            assert_eq!((*dx, *dy, *dw, *dh), (0.0, 0.0, 50.0, 50.0));
            assert_eq!(state.transform, expected);
            assert!(state.clip.is_some());
        }
        other => panic!("unexpected op {other:?}"),
    }
    assert_eq!(p.canvas().depth(), 0);
}

fn drawn_lines(p: &Painter<RecordingCanvas>) -> Vec<String> {
    p.canvas()
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillText { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn paragraph_wraps_into_three_lines() {
    let mut p = painter(0.5);
    let text = "x".repeat(27);
    let lines = p
        .paragraph(&text, 0.0, 0.0, 100.0, 30.0, 3, &TextStyle::new().font(20.0))
        .unwrap();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| !l.ends_with("...")));
    assert_eq!(drawn_lines(&p), lines);
}

#[test]
fn paragraph_overflow_truncates_second_line() {
    let mut p = painter(0.5);
    let text = "x".repeat(27);
    let lines = p
        .paragraph(&text, 0.0, 0.0, 100.0, 30.0, 2, &TextStyle::new())
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("..."));
    assert_eq!(drawn_lines(&p).len(), 2);
}

#[test]
fn every_drawing_call_leaves_state_balanced() {
    let mut p = painter(1.0);
    let image = ImageData {
        width: 1,
        height: 1,
        data: vec![0, 0, 0, 255],
    };
    let shadowed = ShapeStyle::new()
        .fill("#fff")
        .border("1 dashed #ccc")
        .shadow("0 4 8 rgba(0,0,0,0.3)");

    p.rect(Rect::new(0.0, 0.0, 10.0, 10.0), &shadowed).unwrap();
    p.round_rect(Rect::new(0.0, 0.0, 10.0, 10.0), vec![2.0, 4.0], &shadowed)
        .unwrap();
    p.circle(0.0, 0.0, 10.0, &shadowed).unwrap();
    p.ellipse(Rect::new(0.0, 0.0, 20.0, 10.0), &shadowed).unwrap();
    p.round_rect_image(&image, Rect::new(0.0, 0.0, 10.0, 10.0), 3.0, "2 #000", "1 1 2")
        .unwrap();
    p.ellipse_image(&image, Rect::new(0.0, 0.0, 10.0, 4.0), StyleArg::Absent, StyleArg::Absent)
        .unwrap();
    p.text("t", 0.0, 0.0, &TextStyle::new().outline("1 #000"), None)
        .unwrap();
    p.center_text("t", 0.0, 0.0, 100.0, &TextStyle::new().font("24rpx bold"))
        .unwrap();

    assert_eq!(p.canvas().depth(), 0);
    let state = p.canvas().current_state();
    assert_eq!(state.shadow_blur, 0.0);
    assert_eq!(state.text_baseline, TextBaseline::Alphabetic);
    assert!(state.clip.is_none());
}

struct DiskFetcher {
    files: HashMap<String, String>,
}

impl ImageFetcher for DiskFetcher {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<String>> {
        let found = self.files.get(src).cloned();
        let src = src.to_string();
        async move {
            found.ok_or(PosterError::Fetch {
                src,
                reason: "not cached".into(),
            })
        }
    }
}

#[test]
fn fetched_images_decode_and_draw() {
    let dir = tempfile::tempdir().unwrap();
    let avatar = dir.path().join("avatar.png");
    write_png(&avatar, 1, 1, &[10, 20, 30, 255]);
    let avatar = avatar.to_string_lossy().into_owned();

    let fetcher = DiskFetcher {
        files: HashMap::from([("https://cdn.example/avatar.png".to_string(), avatar.clone())]),
    };
    let resolved = pollster::block_on(load_images(&fetcher, &["https://cdn.example/avatar.png"]))
        .unwrap();
    assert_eq!(resolved, vec![avatar]);

    let image = ImageData::decode_png(&fs::read(&resolved[0]).unwrap()).unwrap();
    assert_eq!(image.data, vec![10, 20, 30, 255]);

    let mut p = painter(1.0);
    p.circle_image(&image, 10.0, 10.0, 40.0, "2 #fff", StyleArg::Absent)
        .unwrap();
    pollster::block_on(p.to_canvas(false)).unwrap();

    assert_eq!(p.canvas().commits(), &[false]);
    assert!(matches!(
        p.canvas().ops().last(),
        Some(DrawOp::DrawImageScaled {
            source_width: 1,
            ..
        })
    ));
}

#[test]
fn failed_fetch_is_a_value() {
    let fetcher = DiskFetcher {
        files: HashMap::new(),
    };
    let result = pollster::block_on(load_images(&fetcher, &["http://cdn.example/a.png", ""]));
    assert!(matches!(result, Err(PosterError::Fetch { .. })));
}
