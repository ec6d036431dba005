//! The poster drawing API. Every coordinate, size, radius, and line height a
//! caller passes is in virtual units; the painter converts once, at entry,
//! using the session scale.

use log::debug;

use crate::api::{CanvasDrawImage, CanvasImageSource, CanvasRenderingContext2D};
use crate::compositor::{ShapeStyle, composite};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::path::{Rect, circle_path, ellipse_path, rect_path, resolve_radii, rounded_rect_path};
use crate::style::{StyleArg, parse_border};
use crate::surface::{self, DrawSurface, ExportOptions, ExportedImage, RasterExport};
use crate::text::{self, ParagraphBox, TextPaint, TextStyle};
use crate::units::{Scale, font_spec};

/// Draws onto a surface `C` for one rendering session.
pub struct Painter<C> {
    ctx: C,
    config: SessionConfig,
    scale: Scale,
}

impl<C: CanvasRenderingContext2D> Painter<C> {
    pub fn new(ctx: C, config: SessionConfig) -> Self {
        let scale = config.scale();
        debug!("painter session at scale {}", scale.ratio());
        Self { ctx, config, scale }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn canvas(&self) -> &C {
        &self.ctx
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn into_inner(self) -> C {
        self.ctx
    }

    /// Draws `image` stretched over the rect, no path or styling involved.
    pub fn image(&mut self, image: &dyn CanvasImageSource, bounds: Rect) -> Result<()> {
        let r = bounds.to_physical(self.scale);
        self.ctx.draw_image_scaled(image, r.x, r.y, r.w, r.h)
    }

    /// Draws `image` horizontally centered in a column `column_width` wide
    /// that starts at `bounds.x`.
    pub fn center_image(
        &mut self,
        image: &dyn CanvasImageSource,
        bounds: Rect,
        column_width: f64,
    ) -> Result<()> {
        let mut r = bounds.to_physical(self.scale);
        r.x += (self.scale.to_physical(column_width) - r.w) / 2.0;
        self.ctx.draw_image_scaled(image, r.x, r.y, r.w, r.h)
    }

    pub fn rect(&mut self, bounds: Rect, style: &ShapeStyle<'_>) -> Result<()> {
        let r = bounds.to_physical(self.scale);
        rect_path(&mut self.ctx, r)?;
        composite(&mut self.ctx, self.scale, r, style)
    }

    pub fn rect_image(
        &mut self,
        image: &dyn CanvasImageSource,
        bounds: Rect,
        border: impl Into<StyleArg>,
        shadow: impl Into<StyleArg>,
    ) -> Result<()> {
        let style = image_style(image, border, shadow);
        self.rect(bounds, &style)
    }

    /// `radius` is a single radius or per-corner radii, clockwise from the
    /// top-left.
    pub fn round_rect(
        &mut self,
        bounds: Rect,
        radius: impl Into<StyleArg>,
        style: &ShapeStyle<'_>,
    ) -> Result<()> {
        let r = bounds.to_physical(self.scale);
        let radii = resolve_radii(&radius.into(), self.scale);
        rounded_rect_path(&mut self.ctx, r, radii)?;
        composite(&mut self.ctx, self.scale, r, style)
    }

    pub fn round_rect_image(
        &mut self,
        image: &dyn CanvasImageSource,
        bounds: Rect,
        radius: impl Into<StyleArg>,
        border: impl Into<StyleArg>,
        shadow: impl Into<StyleArg>,
    ) -> Result<()> {
        let style = image_style(image, border, shadow);
        self.round_rect(bounds, radius, &style)
    }

    /// Circle of diameter `d` whose bounding square starts at `(x, y)`.
    pub fn circle(&mut self, x: f64, y: f64, d: f64, style: &ShapeStyle<'_>) -> Result<()> {
        let r = Rect::new(x, y, d, d).to_physical(self.scale);
        circle_path(&mut self.ctx, r.x, r.y, r.w)?;
        composite(&mut self.ctx, self.scale, r, style)
    }

    pub fn circle_image(
        &mut self,
        image: &dyn CanvasImageSource,
        x: f64,
        y: f64,
        d: f64,
        border: impl Into<StyleArg>,
        shadow: impl Into<StyleArg>,
    ) -> Result<()> {
        let style = image_style(image, border, shadow);
        self.circle(x, y, d, &style)
    }

    pub fn ellipse(&mut self, bounds: Rect, style: &ShapeStyle<'_>) -> Result<()> {
        let r = bounds.to_physical(self.scale);
        ellipse_path(&mut self.ctx, r)?;
        composite(&mut self.ctx, self.scale, r, style)
    }

    pub fn ellipse_image(
        &mut self,
        image: &dyn CanvasImageSource,
        bounds: Rect,
        border: impl Into<StyleArg>,
        shadow: impl Into<StyleArg>,
    ) -> Result<()> {
        let style = image_style(image, border, shadow);
        self.ellipse(bounds, &style)
    }

    /// One line of text with its top edge at `y`. `max_width` squeezes the
    /// line horizontally on surfaces that support it; it never wraps.
    pub fn text(
        &mut self,
        txt: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        max_width: Option<f64>,
    ) -> Result<()> {
        let paint = self.text_paint(style);
        let s = self.scale;
        text::draw_line(
            &mut self.ctx,
            txt,
            s.to_physical(x),
            s.to_physical(y),
            &paint,
            s.to_physical_opt(max_width),
        )
    }

    pub fn center_text(
        &mut self,
        txt: &str,
        x: f64,
        y: f64,
        width: f64,
        style: &TextStyle,
    ) -> Result<()> {
        let paint = self.text_paint(style);
        let s = self.scale;
        text::draw_centered(
            &mut self.ctx,
            txt,
            s.to_physical(x),
            s.to_physical(y),
            s.to_physical(width),
            &paint,
        )
    }

    /// Wraps `txt` to `width` and draws up to `max_lines` lines. Returns the
    /// lines actually drawn, ellipsis included.
    #[allow(clippy::too_many_arguments)]
    pub fn paragraph(
        &mut self,
        txt: &str,
        x: f64,
        y: f64,
        width: f64,
        line_height: f64,
        max_lines: usize,
        style: &TextStyle,
    ) -> Result<Vec<String>> {
        let paint = self.text_paint(style);
        let s = self.scale;
        let block = ParagraphBox {
            width: s.to_physical(width),
            line_height: s.to_physical(line_height),
            max_lines,
        };
        text::draw_paragraph(
            &mut self.ctx,
            txt,
            s.to_physical(x),
            s.to_physical(y),
            block,
            &paint,
        )
    }

    fn text_paint(&self, style: &TextStyle) -> TextPaint {
        TextPaint {
            font: font_spec(&style.font, self.scale, &self.config.font_family),
            color: style.color.clone(),
            outline: parse_border(&style.outline, self.scale),
        }
    }
}

impl<C: CanvasRenderingContext2D + DrawSurface> Painter<C> {
    /// Commits everything drawn so far. With `reserve`, the surface keeps its
    /// previous contents underneath.
    pub async fn to_canvas(&mut self, reserve: bool) -> Result<()> {
        surface::commit(&mut self.ctx, reserve).await
    }
}

impl<C: CanvasRenderingContext2D + RasterExport> Painter<C> {
    /// Commits, then exports the surface to an image file.
    pub async fn to_image(
        &mut self,
        canvas_id: &str,
        options: &ExportOptions,
    ) -> Result<ExportedImage> {
        surface::export_raster(&mut self.ctx, canvas_id, options).await
    }
}

fn image_style<'i>(
    image: &'i dyn CanvasImageSource,
    border: impl Into<StyleArg>,
    shadow: impl Into<StyleArg>,
) -> ShapeStyle<'i> {
    ShapeStyle::new().border(border).shadow(shadow).image(image)
}
