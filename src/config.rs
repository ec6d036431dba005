use serde::{Deserialize, Serialize};

use crate::units::Scale;

/// Session-wide rendering configuration, fixed once a painter is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Device pixel ratio reported by the host.
    pub pixel_ratio: f64,
    /// Extra multiplier so posters rasterize sharper than the screen.
    pub supersample: f64,
    /// Family appended to font specs that name none.
    pub font_family: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            supersample: 2.0,
            font_family: "sans-serif".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn scale(&self) -> Scale {
        Scale::new(self.pixel_ratio * self.supersample)
    }
}
