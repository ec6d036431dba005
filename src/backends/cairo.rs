//! Cairo backend implementing the canvas traits behind the optional `cairo`
//! crate feature. Draws into an in-memory ARGB image surface that can be
//! exported as PNG. Cairo has no shadow primitive, so shadow state is kept
//! for readers but never painted.

use std::fs::{self, File};
use std::future::{Future, ready};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use cairo::{
    Context, Extend, Filter, FillRule as CairoFillRule, FontSlant, FontWeight, Format,
    ImageSurface, SurfacePattern,
};
use log::debug;

use crate::api::*;
use crate::error::{PosterError, Result};
use crate::surface::{CommitCallback, DrawSurface, ExportOptions, RasterExport};

/// Canvas state cairo does not track itself. Line width, dash, transform and
/// clip live in the cairo context and follow its own save/restore.
#[derive(Clone, Debug)]
struct PaintState {
    fill_style: Paint,
    stroke_style: Paint,
    shadow_offset_x: f64,
    shadow_offset_y: f64,
    shadow_blur: f64,
    shadow_color: String,
    font: String,
    text_align: TextAlign,
    text_baseline: TextBaseline,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill_style: Paint::Color("#000000".into()),
            stroke_style: Paint::Color("#000000".into()),
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_blur: 0.0,
            shadow_color: "rgba(0,0,0,0)".into(),
            font: "10px sans-serif".into(),
            text_align: TextAlign::Start,
            text_baseline: TextBaseline::Alphabetic,
        }
    }
}

/// Adapter that translates canvas calls into Cairo operations.
pub struct CairoCanvas {
    surface: ImageSurface,
    ctx: Context,
    state: PaintState,
    stack: Vec<PaintState>,
}

impl CairoCanvas {
    pub fn new(surface: ImageSurface) -> Result<Self> {
        let ctx = Context::new(&surface)?;
        Ok(Self {
            surface,
            ctx,
            state: PaintState::default(),
            stack: Vec::new(),
        })
    }

    /// A transparent ARGB canvas of the given pixel size.
    pub fn with_size(width: u32, height: u32) -> Result<Self> {
        let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
        Self::new(surface)
    }

    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    fn apply_paint(&self, paint: &Paint) {
        match paint {
            Paint::Color(s) => {
                let (r, g, b, a) = parse_color(s);
                self.ctx.set_source_rgba(r, g, b, a);
            }
        }
    }

    fn apply_font(&self) {
        let face = parse_font(&self.state.font);
        self.ctx
            .select_font_face(&face.family, face.slant, face.weight);
        self.ctx.set_font_size(face.size);
    }

    /// Saves the context and positions the current point so text drawn at
    /// the origin honors align, baseline and `max_width`. The caller restores.
    fn begin_text(&self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()> {
        self.apply_font();
        let width = self.ctx.text_extents(text)?.x_advance();
        let squeeze = match max_width {
            Some(max) if max > 0.0 && width > max => max / width,
            _ => 1.0,
        };
        let (dx, dy) = text_offset(&self.ctx, width, &self.state.text_align, &self.state.text_baseline)?;

        self.ctx.save()?;
        self.ctx.translate(x, y);
        self.ctx.scale(squeeze, 1.0);
        self.ctx.move_to(dx, dy);
        Ok(())
    }

    fn image_surface_from_rgba(&self, image: &dyn CanvasImageSource) -> Result<ImageSurface> {
        let width = image.width();
        let height = image.height();
        let data = image
            .data_rgba()
            .ok_or_else(|| PosterError::InvalidImage("image source has no RGBA data".into()))?;

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| PosterError::InvalidImage("image dimensions overflow".into()))?;

        if data.len() != expected {
            return Err(PosterError::InvalidImage(format!(
                "RGBA buffer is {} bytes, expected {expected}",
                data.len()
            )));
        }

        let mut buf = vec![0u8; expected];
        for (px, out) in data.chunks_exact(4).zip(buf.chunks_exact_mut(4)) {
            let a = px[3] as u32;
            let premul = |c: u8| ((c as u32 * a + 127) / 255) as u8;
            // ARgb32 is a native-endian u32 with premultiplied color.
            let packed = (a << 24)
                | ((premul(px[0]) as u32) << 16)
                | ((premul(px[1]) as u32) << 8)
                | premul(px[2]) as u32;
            out.copy_from_slice(&packed.to_ne_bytes());
        }

        let stride = (width * 4) as i32;
        let surface =
            ImageSurface::create_for_data(buf, Format::ARgb32, width as i32, height as i32, stride)?;
        Ok(surface)
    }

    /// Reads the surface back as straight-alpha RGBA rows.
    fn read_rgba(&self) -> Result<(u32, u32, Vec<u8>)> {
        let width = self.surface.width().max(0) as usize;
        let height = self.surface.height().max(0) as usize;
        let stride = self.surface.stride().max(0) as usize;
        let mut rgba = Vec::with_capacity(width * height * 4);
        self.surface.with_data(|data| {
            for row in data.chunks(stride).take(height) {
                for px in row[..width * 4].chunks_exact(4) {
                    let packed = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                    let a = packed >> 24;
                    let unpremul = |c: u32| match a {
                        0 => 0,
                        _ => ((c * 255 + a / 2) / a).min(255) as u8,
                    };
                    rgba.extend_from_slice(&[
                        unpremul((packed >> 16) & 0xff),
                        unpremul((packed >> 8) & 0xff),
                        unpremul(packed & 0xff),
                        a as u8,
                    ]);
                }
            }
        })?;
        Ok((width as u32, height as u32, rgba))
    }

    fn write_png(&self, path: &Path) -> Result<()> {
        let (width, height, rgba) = self.read_rgba()?;
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(file, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
        writer.finish()?;
        Ok(())
    }
}

impl CanvasState for CairoCanvas {
    fn save(&mut self) -> Result<()> {
        self.ctx.save()?;
        self.stack.push(self.state.clone());
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.ctx.restore()?;
        }
        Ok(())
    }
}

impl CanvasTransforms for CairoCanvas {
    fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.scale(x, y);
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.translate(x, y);
        Ok(())
    }
}

impl CanvasCompositing for CairoCanvas {
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

impl CanvasLineStyles for CairoCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        self.ctx.set_line_width(value);
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.ctx.line_width())
    }

    fn set_line_dash(&mut self, segments: Vec<f64>) -> Result<()> {
        self.ctx.set_dash(&segments, 0.0);
        Ok(())
    }

    fn line_dash(&self) -> Result<Vec<f64>> {
        Ok(self.ctx.dash().0)
    }
}

impl CanvasFillStrokeStyles for CairoCanvas {
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

impl CanvasPaths for CairoCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.ctx.new_path();
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        self.ctx.close_path();
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.move_to(x, y);
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.line_to(x, y);
        Ok(())
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) -> Result<()> {
        self.ctx.arc(x, y, radius, start_angle, end_angle);
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.ctx.rectangle(x, y, w, h);
        Ok(())
    }

    fn fill(&mut self, fill_rule: FillRule) -> Result<()> {
        self.ctx.set_fill_rule(map_fill_rule(fill_rule));
        self.apply_paint(&self.state.fill_style);
        self.ctx.fill_preserve()?;
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        self.apply_paint(&self.state.stroke_style);
        self.ctx.stroke_preserve()?;
        Ok(())
    }

    fn clip(&mut self, fill_rule: FillRule) -> Result<()> {
        self.ctx.set_fill_rule(map_fill_rule(fill_rule));
        self.ctx.clip_preserve();
        Ok(())
    }
}

impl CanvasText for CairoCanvas {
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
        let path = self.ctx.copy_path()?;
        self.ctx.new_path();
        self.begin_text(text, x, y, max_width)?;
        self.apply_paint(&self.state.fill_style);
        let shown = self.ctx.show_text(text);
        self.ctx.restore()?;
        self.ctx.new_path();
        self.ctx.append_path(&path);
        shown?;
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()> {
        let path = self.ctx.copy_path()?;
        self.ctx.new_path();
        self.begin_text(text, x, y, max_width)?;
        self.apply_paint(&self.state.stroke_style);
        self.ctx.text_path(text);
        let stroked = self.ctx.stroke();
        self.ctx.restore()?;
        self.ctx.append_path(&path);
        stroked?;
        Ok(())
    }

    fn measure_text(&self, text: &str) -> Result<TextMetrics> {
        self.apply_font();
        let extents = self.ctx.text_extents(text)?;
        Ok(TextMetrics {
            width: extents.x_advance(),
        })
    }
}

impl CanvasDrawImage for CairoCanvas {
    fn draw_image_scaled(
        &mut self,
        image: &dyn CanvasImageSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let surface = self.image_surface_from_rgba(image)?;
        let pattern = SurfacePattern::create(&surface);
        pattern.set_filter(Filter::Good);
        pattern.set_extend(Extend::Pad);
        let scale_x = dw / image.width() as f64;
        let scale_y = dh / image.height() as f64;

        let path = self.ctx.copy_path()?;
        self.ctx.save()?;
        self.ctx.new_path();
        self.ctx.translate(dx, dy);
        self.ctx.scale(scale_x, scale_y);
        self.ctx.set_source(&pattern)?;
        self.ctx.rectangle(0.0, 0.0, image.width() as f64, image.height() as f64);
        self.ctx.clip();
        let painted = self.ctx.paint();
        self.ctx.restore()?;
        self.ctx.append_path(&path);
        painted?;
        Ok(())
    }
}

impl DrawSurface for CairoCanvas {
    /// Cairo paints immediately, so a commit only flushes. `reserve` has
    /// nothing to preserve.
    fn draw(&mut self, reserve: bool, done: CommitCallback) {
        self.surface.flush();
        debug!("cairo commit (reserve = {reserve})");
        done(Ok(()));
    }
}

impl RasterExport for CairoCanvas {
    fn to_file(
        &mut self,
        canvas_id: &str,
        options: &ExportOptions,
    ) -> impl Future<Output = Result<PathBuf>> {
        let stem = options
            .file_stem
            .clone()
            .unwrap_or_else(|| canvas_id.to_string());
        let path = options.dir.join(format!("{stem}.png"));
        let written = fs::create_dir_all(&options.dir)
            .map_err(PosterError::from)
            .and_then(|()| self.write_png(&path))
            .map(|()| path);
        ready(written)
    }
}

fn map_fill_rule(rule: FillRule) -> CairoFillRule {
    match rule {
        FillRule::NonZero => CairoFillRule::Winding,
        FillRule::EvenOdd => CairoFillRule::EvenOdd,
    }
}

/// Parses the color forms posters use: `#rgb`, `#rrggbb`, `#rrggbbaa`,
/// `rgb()`, `rgba()`, `transparent` and a few names. Anything else is
/// opaque black.
fn parse_color(color: &str) -> (f64, f64, f64, f64) {
    let c = color.trim().to_ascii_lowercase();
    let channel = |hex: &str| u8::from_str_radix(hex, 16).unwrap_or(0) as f64 / 255.0;

    if let Some(hex) = c.strip_prefix('#') {
        if hex.is_ascii() {
            match hex.len() {
                3 => {
                    let d = |i: usize| channel(&hex[i..i + 1].repeat(2));
                    return (d(0), d(1), d(2), 1.0);
                }
                6 => return (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]), 1.0),
                8 => {
                    return (
                        channel(&hex[0..2]),
                        channel(&hex[2..4]),
                        channel(&hex[4..6]),
                        channel(&hex[6..8]),
                    );
                }
                _ => {}
            }
        }
    }

    if let Some(args) = c
        .strip_prefix("rgba(")
        .or_else(|| c.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<f64> = args
            .split(',')
            .map(|p| p.trim().parse().unwrap_or(0.0))
            .collect();
        if parts.len() >= 3 {
            let alpha = parts.get(3).copied().unwrap_or(1.0);
            return (
                parts[0].clamp(0.0, 255.0) / 255.0,
                parts[1].clamp(0.0, 255.0) / 255.0,
                parts[2].clamp(0.0, 255.0) / 255.0,
                alpha.clamp(0.0, 1.0),
            );
        }
    }

    match c.as_str() {
        "transparent" => (0.0, 0.0, 0.0, 0.0),
        "white" => (1.0, 1.0, 1.0, 1.0),
        "red" => (1.0, 0.0, 0.0, 1.0),
        "green" => (0.0, 128.0 / 255.0, 0.0, 1.0),
        "blue" => (0.0, 0.0, 1.0, 1.0),
        _ => (0.0, 0.0, 0.0, 1.0),
    }
}

#[derive(Debug, PartialEq)]
struct FontFace {
    size: f64,
    family: String,
    slant: FontSlant,
    weight: FontWeight,
}

/// Minimal CSS font parser: `[italic] [bold|<weight>] <size>px <family...>`.
fn parse_font(font: &str) -> FontFace {
    let mut face = FontFace {
        size: 10.0,
        family: "Sans".to_string(),
        slant: FontSlant::Normal,
        weight: FontWeight::Normal,
    };
    let mut tokens = font.split_whitespace();
    for part in tokens.by_ref() {
        match part {
            "italic" | "oblique" => face.slant = FontSlant::Italic,
            "bold" | "bolder" | "600" | "700" | "800" | "900" => face.weight = FontWeight::Bold,
            _ => {
                if let Some(px) = part.strip_suffix("px") {
                    if let Ok(v) = px.parse::<f64>() {
                        face.size = v;
                    }
                    break;
                }
            }
        }
    }

    let family = tokens.collect::<Vec<_>>().join(" ");
    let family = family
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    face.family = match family {
        "" | "sans-serif" => "Sans".to_string(),
        "serif" => "Serif".to_string(),
        "monospace" => "Monospace".to_string(),
        other => other.to_string(),
    };
    face
}

/// Offset from the anchor point to where cairo's text origin must sit.
fn text_offset(
    ctx: &Context,
    width: f64,
    align: &TextAlign,
    baseline: &TextBaseline,
) -> Result<(f64, f64)> {
    let font = ctx.font_extents()?;
    let dx = match align {
        TextAlign::Left | TextAlign::Start => 0.0,
        TextAlign::Center => -width / 2.0,
        TextAlign::Right | TextAlign::End => -width,
    };
    let dy = match baseline {
        TextBaseline::Top => font.ascent(),
        TextBaseline::Hanging => font.ascent() * 0.8,
        TextBaseline::Middle => (font.ascent() - font.descent()) / 2.0,
        TextBaseline::Alphabetic => 0.0,
        TextBaseline::Ideographic | TextBaseline::Bottom => -font.descent(),
    };
    Ok((dx, dy))
}
