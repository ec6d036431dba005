//! In-memory backend that records every paint operation together with a
//! snapshot of the paint state it ran under. Used as the surface double in
//! tests and for inspecting what a poster would draw.

use crate::api::*;
use crate::error::Result;
use crate::surface::{CommitCallback, DrawSurface};

#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    ClosePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPath {
    pub commands: Vec<PathCommand>,
}

impl RecordedPath {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipState {
    pub path: RecordedPath,
    pub rule: FillRule,
    pub transform: [f64; 6],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub shadow_offset_x: f64,
    pub shadow_offset_y: f64,
    pub shadow_blur: f64,
    pub shadow_color: String,
    pub line_width: f64,
    pub line_dash: Vec<f64>,
    pub fill_style: Paint,
    pub stroke_style: Paint,
    pub font: String,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub transform: [f64; 6],
    pub clip: Option<ClipState>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillPath {
        path: RecordedPath,
        state: Snapshot,
        rule: FillRule,
    },
    StrokePath {
        path: RecordedPath,
        state: Snapshot,
    },
    Clip {
        path: RecordedPath,
        state: Snapshot,
        rule: FillRule,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
        state: Snapshot,
    },
    StrokeText {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
        state: Snapshot,
    },
    DrawImageScaled {
        source_width: u32,
        source_height: u32,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
        state: Snapshot,
    },
}

impl DrawOp {
    pub fn state(&self) -> &Snapshot {
        match self {
            DrawOp::FillPath { state, .. }
            | DrawOp::StrokePath { state, .. }
            | DrawOp::Clip { state, .. }
            | DrawOp::FillText { state, .. }
            | DrawOp::StrokeText { state, .. }
            | DrawOp::DrawImageScaled { state, .. } => state,
        }
    }
}

pub const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Clone, Debug)]
struct RecorderState {
    shadow_offset_x: f64,
    shadow_offset_y: f64,
    shadow_blur: f64,
    shadow_color: String,
    line_width: f64,
    line_dash: Vec<f64>,
    fill_style: Paint,
    stroke_style: Paint,
    font: String,
    text_align: TextAlign,
    text_baseline: TextBaseline,
    transform: [f64; 6],
    clip: Option<ClipState>,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_blur: 0.0,
            shadow_color: "rgba(0,0,0,0)".to_string(),
            line_width: 1.0,
            line_dash: Vec::new(),
            fill_style: Paint::Color("#000".to_string()),
            stroke_style: Paint::Color("#000".to_string()),
            font: "10px sans-serif".to_string(),
            text_align: TextAlign::Start,
            text_baseline: TextBaseline::Alphabetic,
            transform: IDENTITY,
            clip: None,
        }
    }
}

pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    state: RecorderState,
    stack: Vec<RecorderState>,
    current_path: Vec<PathCommand>,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    char_advance: f64,
    commits: Vec<bool>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            state: RecorderState::default(),
            stack: Vec::new(),
            current_path: Vec::new(),
            current_point: None,
            subpath_start: None,
            char_advance: 1.0,
            commits: Vec::new(),
        }
    }

    /// Measures text as a monospace font where every character advances by `advance`.
    pub fn with_char_advance(mut self, advance: f64) -> Self {
        self.char_advance = advance;
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of states currently saved.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The `reserve` flag of every commit received, in order.
    pub fn commits(&self) -> &[bool] {
        &self.commits
    }

    /// The live paint state, as a fresh draw would see it.
    pub fn current_state(&self) -> Snapshot {
        self.snapshot()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            shadow_offset_x: self.state.shadow_offset_x,
            shadow_offset_y: self.state.shadow_offset_y,
            shadow_blur: self.state.shadow_blur,
            shadow_color: self.state.shadow_color.clone(),
            line_width: self.state.line_width,
            line_dash: self.state.line_dash.clone(),
            fill_style: self.state.fill_style.clone(),
            stroke_style: self.state.stroke_style.clone(),
            font: self.state.font.clone(),
            text_align: self.state.text_align.clone(),
            text_baseline: self.state.text_baseline.clone(),
            transform: self.state.transform,
            clip: self.state.clip.clone(),
        }
    }

    fn ensure_subpath(&mut self) -> Result<()> {
        if self.current_point.is_none() {
            self.move_to(0.0, 0.0)?;
        }
        Ok(())
    }

    fn set_current_point(&mut self, x: f64, y: f64) {
        self.current_point = Some((x, y));
    }

    fn multiply_transform(&mut self, m: [f64; 6]) {
        let [a, b, c, d, e, f] = self.state.transform;
        let [na, nb, nc, nd, ne, nf] = m;
        self.state.transform = [
            a * na + c * nb,
            b * na + d * nb,
            a * nc + c * nd,
            b * nc + d * nd,
            a * ne + c * nf + e,
            b * ne + d * nf + f,
        ];
    }

    fn push_path(&mut self, cmd: PathCommand) {
        self.current_path.push(cmd);
    }

    /// The current path stays in place after painting, as on a real canvas.
    fn recorded_path(&self) -> RecordedPath {
        RecordedPath::new(self.current_path.clone())
    }

    fn record_op(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasState for RecordingCanvas {
    fn save(&mut self) -> Result<()> {
        self.stack.push(self.state.clone());
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        Ok(())
    }
}

impl CanvasTransforms for RecordingCanvas {
    fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        self.multiply_transform([x, 0.0, 0.0, y, 0.0, 0.0]);
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.multiply_transform([1.0, 0.0, 0.0, 1.0, x, y]);
        Ok(())
    }
}

impl CanvasCompositing for RecordingCanvas {
    fn set_shadow_offset_x(&mut self, value: f64) -> Result<()> {
        self.state.shadow_offset_x = value;
        Ok(())
    }

    fn shadow_offset_x(&self) -> Result<f64> {
        Ok(self.state.shadow_offset_x)
    }

    fn set_shadow_offset_y(&mut self, value: f64) -> Result<()> {
        self.state.shadow_offset_y = value;
        Ok(())
    }

    fn shadow_offset_y(&self) -> Result<f64> {
        Ok(self.state.shadow_offset_y)
    }

    fn set_shadow_blur(&mut self, value: f64) -> Result<()> {
        self.state.shadow_blur = value;
        Ok(())
    }

    fn shadow_blur(&self) -> Result<f64> {
        Ok(self.state.shadow_blur)
    }

    fn set_shadow_color(&mut self, value: String) -> Result<()> {
        self.state.shadow_color = value;
        Ok(())
    }

    fn shadow_color(&self) -> Result<String> {
        Ok(self.state.shadow_color.clone())
    }
}

impl CanvasLineStyles for RecordingCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        self.state.line_width = value;
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.state.line_width)
    }

    fn set_line_dash(&mut self, segments: Vec<f64>) -> Result<()> {
        self.state.line_dash = segments;
        Ok(())
    }

    fn line_dash(&self) -> Result<Vec<f64>> {
        Ok(self.state.line_dash.clone())
    }
}

impl CanvasFillStrokeStyles for RecordingCanvas {
    fn set_fill_style(&mut self, style: Paint) -> Result<()> {
        self.state.fill_style = style;
        Ok(())
    }

    fn fill_style(&self) -> Result<Paint> {
        Ok(self.state.fill_style.clone())
    }

    fn set_stroke_style(&mut self, style: Paint) -> Result<()> {
        self.state.stroke_style = style;
        Ok(())
    }

    fn stroke_style(&self) -> Result<Paint> {
        Ok(self.state.stroke_style.clone())
    }
}

impl CanvasPaths for RecordingCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.current_path.clear();
        self.current_point = None;
        self.subpath_start = None;
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        self.push_path(PathCommand::ClosePath);
        if let Some((x, y)) = self.subpath_start {
            self.set_current_point(x, y);
        }
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.push_path(PathCommand::MoveTo { x, y });
        self.subpath_start = Some((x, y));
        self.set_current_point(x, y);
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ensure_subpath()?;
        self.push_path(PathCommand::LineTo { x, y });
        self.set_current_point(x, y);
        Ok(())
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) -> Result<()> {
        // An arc opening a path starts its own subpath at the arc's first point.
        if self.current_point.is_none() {
            self.subpath_start = Some((
                x + radius * start_angle.cos(),
                y + radius * start_angle.sin(),
            ));
        }
        self.push_path(PathCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
        });
        self.set_current_point(x + radius * end_angle.cos(), y + radius * end_angle.sin());
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.push_path(PathCommand::Rect { x, y, w, h });
        self.subpath_start = Some((x, y));
        self.set_current_point(x, y);
        Ok(())
    }

    fn fill(&mut self, fill_rule: FillRule) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        let op = DrawOp::FillPath {
            path: self.recorded_path(),
            state: self.snapshot(),
            rule: fill_rule,
        };
        self.record_op(op);
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        let op = DrawOp::StrokePath {
            path: self.recorded_path(),
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }

    fn clip(&mut self, fill_rule: FillRule) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        let path = self.recorded_path();
        self.state.clip = Some(ClipState {
            path: path.clone(),
            rule: fill_rule.clone(),
            transform: self.state.transform,
        });
        let op = DrawOp::Clip {
            path,
            state: self.snapshot(),
            rule: fill_rule,
        };
        self.record_op(op);
        Ok(())
    }
}

impl CanvasText for RecordingCanvas {
    fn set_font(&mut self, value: String) -> Result<()> {
        self.state.font = value;
        Ok(())
    }

    fn font(&self) -> Result<String> {
        Ok(self.state.font.clone())
    }

    fn set_text_align(&mut self, value: TextAlign) -> Result<()> {
        self.state.text_align = value;
        Ok(())
    }

    fn text_align(&self) -> Result<TextAlign> {
        Ok(self.state.text_align.clone())
    }

    fn set_text_baseline(&mut self, value: TextBaseline) -> Result<()> {
        self.state.text_baseline = value;
        Ok(())
    }

    fn text_baseline(&self) -> Result<TextBaseline> {
        Ok(self.state.text_baseline.clone())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()> {
        let op = DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            max_width,
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()> {
        let op = DrawOp::StrokeText {
            text: text.to_string(),
            x,
            y,
            max_width,
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }

    fn measure_text(&self, text: &str) -> Result<TextMetrics> {
        Ok(TextMetrics {
            width: text.chars().count() as f64 * self.char_advance,
        })
    }
}

impl CanvasDrawImage for RecordingCanvas {
    fn draw_image_scaled(
        &mut self,
        image: &dyn CanvasImageSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<()> {
        let op = DrawOp::DrawImageScaled {
            source_width: image.width(),
            source_height: image.height(),
            dx,
            dy,
            dw,
            dh,
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }
}

impl DrawSurface for RecordingCanvas {
    fn draw(&mut self, reserve: bool, done: CommitCallback) {
        self.commits.push(reserve);
        done(Ok(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_almost_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn path_survives_fill_stroke_and_clip() {
        let mut c = RecordingCanvas::new();
        c.begin_path().unwrap();
        c.rect(1.0, 2.0, 3.0, 4.0).unwrap();
        c.set_fill_style("#f00".into()).unwrap();
        c.fill(FillRule::NonZero).unwrap();
        c.stroke().unwrap();
        c.clip(FillRule::NonZero).unwrap();

        let ops = c.ops();
        assert_eq!(ops.len(), 3);
        let rect = vec![PathCommand::Rect {
            x: 1.0,
            y: 2.0,
            w: 3.0,
            h: 4.0,
        }];
        match &ops[0] {
            DrawOp::FillPath { path, state, .. } => {
                assert_eq!(path.commands, rect);
                assert_eq!(state.fill_style, Paint::Color("#f00".into()));
                assert_eq!(state.transform, IDENTITY);
            }
            _ => panic!("unexpected op"),
        }
        match &ops[2] {
            DrawOp::Clip { path, state, .. } => {
                assert_eq!(path.commands, rect);
                assert!(state.clip.is_some());
            }
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn begin_path_discards_previous_path() {
        let mut c = RecordingCanvas::new();
        c.begin_path().unwrap();
        c.move_to(0.0, 0.0).unwrap();
        c.line_to(10.0, 0.0).unwrap();
        c.begin_path().unwrap();
        c.rect(1.0, 1.0, 2.0, 2.0).unwrap();
        c.fill(FillRule::NonZero).unwrap();

        match &c.ops()[0] {
            DrawOp::FillPath { path, .. } => assert_eq!(path.commands.len(), 1),
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn records_transforms() {
        let mut c = RecordingCanvas::new();
        c.translate(5.0, 6.0).unwrap();
        c.scale(2.0, 3.0).unwrap();
        c.begin_path().unwrap();
        c.move_to(0.0, 0.0).unwrap();
        c.line_to(1.0, 1.0).unwrap();
        c.stroke().unwrap();

        match &c.ops()[0] {
            DrawOp::StrokePath { state, .. } => {
                assert_eq!(state.transform, [2.0, 0.0, 0.0, 3.0, 5.0, 6.0]);
            }
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn save_restore_tracks_depth() {
        let mut c = RecordingCanvas::new();
        c.save().unwrap();
        c.set_line_width(7.0).unwrap();
        assert_eq!(c.depth(), 1);
        c.restore().unwrap();
        assert_eq!(c.depth(), 0);
        assert_almost_eq(c.line_width().unwrap(), 1.0);
    }

    #[test]
    fn monospace_measurement() {
        let c = RecordingCanvas::new().with_char_advance(12.0);
        assert_almost_eq(c.measure_text("abc").unwrap().width, 36.0);
        assert_almost_eq(c.measure_text("海报").unwrap().width, 24.0);
    }
}
