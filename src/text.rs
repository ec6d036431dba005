//! Text drawing: single lines, centered lines, and wrapped paragraphs.
//!
//! All positions here are physical pixels and every line is drawn with a
//! top baseline, so `y` is the top edge of the glyph box.

use log::trace;

use crate::api::{CanvasRenderingContext2D, Paint, TextAlign, TextBaseline};
use crate::error::Result;
use crate::guard::StateGuard;
use crate::style::{Border, StyleArg};

pub const ELLIPSIS: &str = "...";

/// Text styling as callers supply it: font (size or CSS-ish spec), fill
/// color, and an outline in the border grammar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextStyle {
    pub font: StyleArg,
    pub color: Option<String>,
    pub outline: StyleArg,
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font(mut self, font: impl Into<StyleArg>) -> Self {
        self.font = font.into();
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn outline(mut self, outline: impl Into<StyleArg>) -> Self {
        self.outline = outline.into();
        self
    }
}

/// Resolved paint for a text draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextPaint {
    /// Full CSS font string; `None` keeps the surface font.
    pub font: Option<String>,
    pub color: Option<String>,
    pub outline: Option<Border>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParagraphBox {
    pub width: f64,
    pub line_height: f64,
    pub max_lines: usize,
}

pub fn draw_line<C>(
    ctx: &mut C,
    text: &str,
    x: f64,
    y: f64,
    paint: &TextPaint,
    max_width: Option<f64>,
) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    let mut ctx = StateGuard::new(ctx)?;
    prepare(&mut *ctx, paint)?;
    paint_text(&mut *ctx, text, x, y, paint, max_width)
}

/// Draws one line centered in the span `[x, x + width]`.
pub fn draw_centered<C>(
    ctx: &mut C,
    text: &str,
    x: f64,
    y: f64,
    width: f64,
    paint: &TextPaint,
) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    let mut ctx = StateGuard::new(ctx)?;
    prepare(&mut *ctx, paint)?;
    ctx.set_text_align(TextAlign::Center)?;
    paint_text(&mut *ctx, text, x + width / 2.0, y, paint, Some(width))
}

/// Wraps `text` into `block.width`, draws at most `block.max_lines` lines and
/// returns the lines as drawn. Line `j` sits at `y + line_height * (j + 1)`.
pub fn draw_paragraph<C>(
    ctx: &mut C,
    text: &str,
    x: f64,
    y: f64,
    block: ParagraphBox,
    paint: &TextPaint,
) -> Result<Vec<String>>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    let mut ctx = StateGuard::new(ctx)?;
    prepare(&mut *ctx, paint)?;

    let measure = |s: &str| ctx.measure_text(s).map(|m| m.width);
    let lines = wrap_lines(text, block.width, measure)?;
    let lines = truncate_lines(lines, block.max_lines);

    for (j, line) in lines.iter().enumerate() {
        let line_y = y + block.line_height * (j as f64 + 1.0);
        paint_text(&mut *ctx, line, x, line_y, paint, None)?;
    }
    Ok(lines)
}

/// Greedy character wrap. Characters are appended one at a time; once a line
/// measures `width` or more, its last character moves to a new line.
pub fn wrap_lines<M>(text: &str, width: f64, mut measure: M) -> Result<Vec<String>>
where
    M: FnMut(&str) -> Result<f64>,
{
    if measure(text)? <= width {
        return Ok(vec![text.to_string()]);
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    for ch in text.chars() {
        line.push(ch);
        let line_width = measure(&line)?;
        if line_width >= width {
            line.pop();
            trace!("wrapped line {} at {line_width}px: {line:?}", lines.len() + 1);
            lines.push(std::mem::replace(&mut line, ch.to_string()));
        }
    }
    lines.push(line);
    Ok(lines)
}

/// Keeps the first `max_lines` lines. When lines were dropped, the last kept
/// line loses its final character to an ellipsis.
pub fn truncate_lines(mut lines: Vec<String>, max_lines: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        last.pop();
        last.push_str(ELLIPSIS);
    }
    lines
}

fn prepare<C>(ctx: &mut C, paint: &TextPaint) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    if let Some(font) = &paint.font {
        ctx.set_font(font.clone())?;
    }
    if let Some(color) = &paint.color {
        ctx.set_fill_style(Paint::Color(color.clone()))?;
    }
    if let Some(outline) = &paint.outline {
        ctx.set_line_width(outline.width)?;
        ctx.set_stroke_style(Paint::Color(outline.color.clone()))?;
    }
    ctx.set_text_baseline(TextBaseline::Top)
}

/// Outline under fill.
fn paint_text<C>(
    ctx: &mut C,
    text: &str,
    x: f64,
    y: f64,
    paint: &TextPaint,
    max_width: Option<f64>,
) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    if paint.outline.is_some() {
        ctx.stroke_text(text, x, y, max_width)?;
    }
    ctx.fill_text(text, x, y, max_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::recording::{DrawOp, RecordingCanvas};

    fn mono(advance: f64) -> impl FnMut(&str) -> Result<f64> {
        move |s| Ok(s.chars().count() as f64 * advance)
    }

    fn fills(ops: &[DrawOp]) -> Vec<(String, f64, f64)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_lines("abc", 30.0, mono(10.0)).unwrap(), vec!["abc"]);
        // exact fit of the whole text does not wrap
        assert_eq!(wrap_lines("abc", 30.0, mono(10.0)).unwrap().len(), 1);
    }

    #[test]
    fn wraps_when_line_reaches_width() {
        // 10px per char, 100px wide: the 10th char reaches 100 and moves down
        let text = "a".repeat(27);
        let lines = wrap_lines(&text, 100.0, mono(10.0)).unwrap();
        assert_eq!(lines, vec!["a".repeat(9), "a".repeat(9), "a".repeat(9)]);
    }

    #[test]
    fn wraps_multibyte_text_by_character() {
        let lines = wrap_lines("海报生成工具", 35.0, mono(10.0)).unwrap();
        assert_eq!(lines, vec!["海报生", "成工具"]);
    }

    #[test]
    fn truncation_only_on_overflow() {
        let lines = vec!["abc".to_string(), "def".to_string(), "ghi".to_string()];
        assert_eq!(truncate_lines(lines.clone(), 3), lines);
        assert_eq!(truncate_lines(lines.clone(), 5), lines);
        assert_eq!(truncate_lines(lines.clone(), 2), vec!["abc", "de..."]);
        assert!(truncate_lines(lines, 0).is_empty());
    }

    #[test]
    fn paragraph_lines_start_one_line_height_down() {
        let mut canvas = RecordingCanvas::new().with_char_advance(10.0);
        let block = ParagraphBox {
            width: 100.0,
            line_height: 40.0,
            max_lines: 3,
        };
        let text = "b".repeat(27);
        let drawn =
            draw_paragraph(&mut canvas, &text, 8.0, 100.0, block, &TextPaint::default()).unwrap();
        assert_eq!(drawn.len(), 3);
        let ys: Vec<f64> = fills(canvas.ops()).iter().map(|(_, _, y)| *y).collect();
        assert_eq!(ys, vec![140.0, 180.0, 220.0]);
        assert!(drawn.iter().all(|l| !l.ends_with(ELLIPSIS)));
    }

    #[test]
    fn paragraph_truncates_to_max_lines() {
        let mut canvas = RecordingCanvas::new().with_char_advance(10.0);
        let block = ParagraphBox {
            width: 100.0,
            line_height: 40.0,
            max_lines: 2,
        };
        let text = "c".repeat(27);
        let drawn =
            draw_paragraph(&mut canvas, &text, 0.0, 0.0, block, &TextPaint::default()).unwrap();
        assert_eq!(drawn, vec!["c".repeat(9), format!("{}...", "c".repeat(8))]);
        assert_eq!(fills(canvas.ops()).len(), 2);
    }

    #[test]
    fn outline_strokes_before_fill() {
        let mut canvas = RecordingCanvas::new();
        let paint = TextPaint {
            font: Some("20px serif".into()),
            color: Some("#fff".into()),
            outline: Some(Border {
                width: 4.0,
                color: "#000".into(),
                ..Border::default()
            }),
        };
        draw_line(&mut canvas, "hi", 1.0, 2.0, &paint, Some(50.0)).unwrap();

        match canvas.ops() {
            [
                DrawOp::StrokeText { state: stroke, .. },
                DrawOp::FillText {
                    state: fill,
                    max_width,
                    ..
                },
            ] => {
                assert_eq!(stroke.line_width, 4.0);
                assert_eq!(stroke.stroke_style, Paint::Color("#000".into()));
                assert_eq!(fill.fill_style, Paint::Color("#fff".into()));
                assert_eq!(fill.font, "20px serif");
                assert_eq!(fill.text_baseline, TextBaseline::Top);
                assert_eq!(*max_width, Some(50.0));
            }
            other => panic!("unexpected ops {other:?}"),
        }
        assert_eq!(canvas.depth(), 0);
        assert_eq!(canvas.current_state().text_baseline, TextBaseline::Alphabetic);
    }

    #[test]
    fn centered_line_anchors_mid_span() {
        let mut canvas = RecordingCanvas::new();
        draw_centered(&mut canvas, "hi", 10.0, 5.0, 200.0, &TextPaint::default()).unwrap();
        match &canvas.ops()[0] {
            DrawOp::FillText {
                x, max_width, state, ..
            } => {
                assert_eq!(*x, 110.0);
                assert_eq!(*max_width, Some(200.0));
                assert_eq!(state.text_align, TextAlign::Center);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
