//! Paints the current path: shadow, fill, border, then an optional image
//! clipped to the path. The order is fixed; later steps rely on the state
//! the earlier ones leave behind.

use log::debug;

use crate::api::{CanvasImageSource, CanvasRenderingContext2D, FillRule, Paint};
use crate::error::Result;
use crate::guard::StateGuard;
use crate::path::Rect;
use crate::style::{Border, BorderStyle, StyleArg, parse_border, parse_shadow};
use crate::units::Scale;

/// What to paint on a shape. Every part is optional and skipped when unset.
#[derive(Clone, Default)]
pub struct ShapeStyle<'i> {
    pub fill: Option<String>,
    pub border: StyleArg,
    pub shadow: StyleArg,
    pub image: Option<&'i dyn CanvasImageSource>,
    /// Inset of the image inside the shape, in virtual units.
    pub padding: Option<f64>,
}

impl<'i> ShapeStyle<'i> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, color: impl Into<String>) -> Self {
        self.fill = Some(color.into());
        self
    }

    pub fn border(mut self, border: impl Into<StyleArg>) -> Self {
        self.border = border.into();
        self
    }

    pub fn shadow(mut self, shadow: impl Into<StyleArg>) -> Self {
        self.shadow = shadow.into();
        self
    }

    pub fn image(mut self, image: &'i dyn CanvasImageSource) -> Self {
        self.image = Some(image);
        self
    }

    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }
}

/// Transform that pulls an image inside a stroked border so the stroke's
/// inner half does not cover it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderFit {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl BorderFit {
    pub fn new(bounds: Rect, border_width: f64) -> Self {
        let scale_x = bounds.w / (bounds.w + border_width);
        let scale_y = bounds.h / (bounds.h + border_width);
        Self {
            translate_x: border_width / 2.0 + bounds.x * (1.0 - scale_x),
            translate_y: border_width / 2.0 + bounds.y * (1.0 - scale_y),
            scale_x,
            scale_y,
        }
    }
}

/// Paints the path currently on `ctx`, whose bounding box is `bounds`
/// (physical pixels). The canvas state is restored on return, error or not.
pub fn composite<C>(ctx: &mut C, scale: Scale, bounds: Rect, style: &ShapeStyle<'_>) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    let mut ctx = StateGuard::new(ctx)?;

    if let Some(shadow) = parse_shadow(&style.shadow) {
        ctx.set_shadow_offset_x(shadow.offset_x)?;
        ctx.set_shadow_offset_y(shadow.offset_y)?;
        ctx.set_shadow_blur(shadow.blur)?;
        ctx.set_shadow_color(shadow.color)?;
    }

    if let Some(fill) = &style.fill {
        ctx.set_fill_style(Paint::Color(fill.clone()))?;
        ctx.fill(FillRule::NonZero)?;
    }

    let border = parse_border(&style.border, scale);
    if let Some(border) = &border {
        stroke_border(&mut *ctx, border)?;
    }

    // The image must not inherit the shape's shadow.
    ctx.set_shadow_offset_x(0.0)?;
    ctx.set_shadow_offset_y(0.0)?;
    ctx.set_shadow_blur(0.0)?;
    ctx.set_shadow_color("#000".to_string())?;

    if let Some(image) = style.image {
        if let Some(border) = &border {
            let fit = BorderFit::new(bounds, border.width);
            debug!("fitting image inside {}px border: {fit:?}", border.width);
            ctx.translate(fit.translate_x, fit.translate_y)?;
            ctx.scale(fit.scale_x, fit.scale_y)?;
        }
        let dest = match style.padding {
            Some(padding) => bounds.inset(scale.to_physical(padding)),
            None => bounds,
        };
        ctx.clip(FillRule::NonZero)?;
        ctx.draw_image_scaled(image, dest.x, dest.y, dest.w, dest.h)?;
    }

    Ok(())
}

fn stroke_border<C>(ctx: &mut C, border: &Border) -> Result<()>
where
    C: CanvasRenderingContext2D + ?Sized,
{
    ctx.set_line_width(border.width)?;
    ctx.set_stroke_style(Paint::Color(border.color.clone()))?;
    if border.style == BorderStyle::Dashed {
        ctx.set_line_dash(border.dash())?;
    }
    ctx.stroke()
}
