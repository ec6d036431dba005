//! Style arguments and the lenient border/shadow grammar.
//!
//! Border and shadow specs are short token strings such as `"2 dashed #fff"`
//! or `"0 4 12 rgba(0,0,0,0.3)"`. Parsing never fails: tokens that are not
//! understood are dropped and the defaults stand.

use std::sync::LazyLock;

use regex::Regex;

use crate::units::Scale;

static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:#|rgba?|transparent)").expect("static regex"));

/// A loosely-typed style argument as callers supply it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StyleArg {
    #[default]
    Absent,
    Scalar(f64),
    Spec(String),
    Tuple(Vec<f64>),
}

impl StyleArg {
    pub fn is_absent(&self) -> bool {
        matches!(self, StyleArg::Absent)
    }
}

impl From<f64> for StyleArg {
    fn from(v: f64) -> Self {
        StyleArg::Scalar(v)
    }
}

impl From<&str> for StyleArg {
    fn from(v: &str) -> Self {
        StyleArg::Spec(v.to_string())
    }
}

impl From<String> for StyleArg {
    fn from(v: String) -> Self {
        StyleArg::Spec(v)
    }
}

impl From<Vec<f64>> for StyleArg {
    fn from(v: Vec<f64>) -> Self {
        StyleArg::Tuple(v)
    }
}

impl<const N: usize> From<[f64; N]> for StyleArg {
    fn from(v: [f64; N]) -> Self {
        StyleArg::Tuple(v.to_vec())
    }
}

impl<T: Into<StyleArg>> From<Option<T>> for StyleArg {
    fn from(v: Option<T>) -> Self {
        v.map_or(StyleArg::Absent, Into::into)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
}

impl BorderStyle {
    fn from_keyword(token: &str) -> Option<Self> {
        match token {
            "solid" => Some(BorderStyle::Solid),
            "dashed" => Some(BorderStyle::Dashed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Border {
    /// Physical pixels.
    pub width: f64,
    pub style: BorderStyle,
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 1.0,
            style: BorderStyle::Solid,
            color: "#000".to_string(),
        }
    }
}

impl Border {
    /// Parses a token string. Numeric tokens are widths in virtual units.
    pub fn parse(spec: &str, scale: Scale) -> Self {
        spec.split_whitespace().fold(Border::default(), |mut acc, token| {
            if let Some(style) = BorderStyle::from_keyword(token) {
                acc.style = style;
            } else if is_color(token) {
                acc.color = token.to_string();
            } else if let Some(width) = leading_int(token) {
                acc.width = scale.to_physical(width as f64);
            }
            acc
        })
    }

    /// Dash pattern for the stroke, empty when solid.
    pub fn dash(&self) -> Vec<f64> {
        match self.style {
            BorderStyle::Solid => Vec::new(),
            BorderStyle::Dashed => vec![self.width * 2.0, self.width * 4.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: String,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: "#000".to_string(),
        }
    }
}

impl Shadow {
    /// Parses a token string positionally: a numeric token in slot 0, 1 or 2
    /// lands in offset x, offset y or blur. A non-numeric token still
    /// occupies its slot, so `"#f00 3"` sets offset y, not offset x.
    pub fn parse(spec: &str) -> Self {
        spec.split_whitespace()
            .enumerate()
            .fold(Shadow::default(), |mut acc, (i, token)| {
                if let Some(v) = leading_int(token) {
                    let v = v as f64;
                    match i {
                        0 => acc.offset_x = v,
                        1 => acc.offset_y = v,
                        2 => acc.blur = v,
                        _ => {}
                    }
                } else if is_color(token) {
                    acc.color = token.to_string();
                }
                acc
            })
    }
}

/// Resolves a border argument. `None` means no stroke at all, which is
/// distinct from a zero-width border.
pub fn parse_border(spec: &StyleArg, scale: Scale) -> Option<Border> {
    match spec {
        StyleArg::Scalar(width) => Some(Border {
            width: scale.to_physical(*width),
            ..Border::default()
        }),
        StyleArg::Spec(spec) if !spec.trim().is_empty() => Some(Border::parse(spec, scale)),
        _ => None,
    }
}

/// Resolves a shadow argument. Only non-empty token strings describe a shadow.
pub fn parse_shadow(spec: &StyleArg) -> Option<Shadow> {
    match spec {
        StyleArg::Spec(spec) if !spec.trim().is_empty() => Some(Shadow::parse(spec)),
        _ => None,
    }
}

pub fn is_color(token: &str) -> bool {
    COLOR.is_match(token)
}

/// Integer prefix of a token (`"12px"` is 12), or `None` if it has no digits up front.
fn leading_int(token: &str) -> Option<i64> {
    let (sign, rest) = match token.as_bytes().first() {
        Some(b'-') => (-1, &token[1..]),
        Some(b'+') => (1, &token[1..]),
        _ => (1, token),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    rest[..digits].parse::<i64>().ok().map(|v| sign * v)
}
