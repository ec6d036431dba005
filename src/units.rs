//! Virtual-unit to physical-pixel conversion.
//!
//! Every public drawing call takes virtual units; the pipeline converts each
//! coordinate, dimension, radius and line metric exactly once on the way in.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::style::StyleArg;

static RPX_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)rpx\b").expect("static regex"));

static CSS_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+(\.\d+)?(px|pt|em|rem|%)(/\S+)?$").expect("static regex"));

/// Device pixels per virtual unit, fixed for a rendering session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale(f64);

impl Scale {
    pub const fn new(ratio: f64) -> Self {
        Self(ratio)
    }

    pub fn ratio(self) -> f64 {
        self.0
    }

    /// Converts a virtual length to physical pixels. Zero and non-finite
    /// values are "unset" sentinels and pass through untouched.
    pub fn to_physical(self, v: f64) -> f64 {
        if v == 0.0 || !v.is_finite() {
            v
        } else {
            v * self.0
        }
    }

    pub fn to_virtual(self, v: f64) -> f64 {
        v / self.0
    }

    pub fn to_physical_opt(self, v: Option<f64>) -> Option<f64> {
        v.map(|v| self.to_physical(v))
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Builds a CSS font string with every size expressed in physical pixels.
///
/// A bare number is a font size; a string may carry `rpx` sizes, which are
/// rewritten, and gets `family` appended when it names no family of its own.
/// Anything else leaves the surface font alone.
pub fn font_spec(font: &StyleArg, scale: Scale, family: &str) -> Option<String> {
    match font {
        StyleArg::Scalar(size) => Some(format!(
            "{}px {}",
            scale.to_physical(*size).round() as i64,
            family
        )),
        StyleArg::Spec(spec) => {
            let spec = spec.trim().trim_end_matches(';');
            let converted = RPX_SIZE.replace_all(spec, |caps: &Captures| {
                let size: f64 = caps[1].parse().unwrap_or(0.0);
                format!("{}px", scale.to_physical(size).round() as i64)
            });
            if names_family(&converted) {
                Some(converted.into_owned())
            } else {
                Some(format!("{converted} {family}"))
            }
        }
        StyleArg::Absent | StyleArg::Tuple(_) => None,
    }
}

fn names_family(font: &str) -> bool {
    let tokens: Vec<&str> = font.split_whitespace().collect();
    let after_size = match tokens.iter().rposition(|t| CSS_SIZE.is_match(t)) {
        Some(idx) => &tokens[idx + 1..],
        None => &tokens[tokens.len().saturating_sub(1)..],
    };
    after_size.iter().any(|t| {
        t.starts_with(|c: char| c.is_ascii_alphabetic() || c == '\'' || c == '"')
    })
}
