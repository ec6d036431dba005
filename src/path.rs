//! Path construction in physical pixels. Each builder starts a fresh path and
//! leaves it current for the compositor to fill, stroke and clip.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::api::CanvasPaths;
use crate::error::Result;
use crate::style::StyleArg;
use crate::units::Scale;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn to_physical(self, scale: Scale) -> Self {
        Self {
            x: scale.to_physical(self.x),
            y: scale.to_physical(self.y),
            w: scale.to_physical(self.w),
            h: scale.to_physical(self.h),
        }
    }

    /// Shrinks the rect by `d` on every side.
    pub fn inset(self, d: f64) -> Self {
        Self {
            x: self.x + d,
            y: self.y + d,
            w: self.w - 2.0 * d,
            h: self.h - 2.0 * d,
        }
    }
}

/// Corner radii `[top_left, top_right, bottom_right, bottom_left]` in
/// physical pixels. A scalar rounds every corner; a short tuple leaves the
/// missing corners square.
pub fn resolve_radii(radius: &StyleArg, scale: Scale) -> [f64; 4] {
    let mut radii = [0.0; 4];
    match radius {
        StyleArg::Scalar(r) => radii = [*r; 4],
        StyleArg::Tuple(values) => {
            for (slot, r) in radii.iter_mut().zip(values) {
                *slot = *r;
            }
        }
        StyleArg::Spec(spec) => {
            if let Ok(r) = spec.trim().parse::<f64>() {
                radii = [r; 4];
            }
        }
        StyleArg::Absent => {}
    }
    radii.map(|r| scale.to_physical(r))
}

pub fn rect_path<C: CanvasPaths + ?Sized>(ctx: &mut C, r: Rect) -> Result<()> {
    ctx.begin_path()?;
    ctx.rect(r.x, r.y, r.w, r.h)
}

/// Four quarter arcs swept clockwise from the top-left corner; the canvas
/// joins consecutive arcs with straight edges.
pub fn rounded_rect_path<C: CanvasPaths + ?Sized>(
    ctx: &mut C,
    r: Rect,
    radii: [f64; 4],
) -> Result<()> {
    let [tl, tr, br, bl] = radii;
    let Rect { x, y, w, h } = r;
    ctx.begin_path()?;
    ctx.arc(x + tl, y + tl, tl, PI, PI * 1.5)?;
    ctx.arc(x + w - tr, y + tr, tr, PI * 1.5, TAU)?;
    ctx.arc(x + w - br, y + h - br, br, 0.0, FRAC_PI_2)?;
    ctx.arc(x + bl, y + h - bl, bl, FRAC_PI_2, PI)?;
    ctx.close_path()
}

/// A circle of diameter `d` is a square with every corner fully rounded.
pub fn circle_path<C: CanvasPaths + ?Sized>(ctx: &mut C, x: f64, y: f64, d: f64) -> Result<()> {
    rounded_rect_path(ctx, Rect::new(x, y, d, d), [d / 2.0; 4])
}

/// Polyline approximation of the ellipse inscribed in `r`. The angular step
/// is one radian over the larger semi-axis, so bigger ellipses get more
/// vertices.
pub fn ellipse_path<C: CanvasPaths + ?Sized>(ctx: &mut C, r: Rect) -> Result<()> {
    let a = r.w / 2.0;
    let b = r.h / 2.0;
    let step = 1.0 / a.abs().max(b.abs());

    ctx.begin_path()?;
    ctx.move_to(r.x + 2.0 * a, r.y + b)?;
    let mut theta = 0.0;
    while theta < TAU {
        ctx.line_to(r.x + a * (1.0 + theta.cos()), r.y + b * (1.0 + theta.sin()))?;
        theta += step;
    }
    ctx.close_path()
}
