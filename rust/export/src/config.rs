// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export configuration loaded from environment variables.

/// Host length unit (feet) expressed in meters
pub const FOOT_TO_METER: f64 = 0.3048;

/// Output length unit preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    /// Output coordinates in the host's own units
    #[default]
    Native,
    /// Convert host feet to meters
    Meters,
}

impl LengthUnit {
    pub fn scale(self) -> f64 {
        match self {
            LengthUnit::Native => 1.0,
            LengthUnit::Meters => FOOT_TO_METER,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Factor applied to every output coordinate.
    pub unit_scale: f64,
    /// Name of the single output scene.
    pub scene_name: String,
    /// `asset.generator` written into glTF output.
    pub generator: String,
    /// Embed the binary buffer as a data URI in `.gltf` output instead of
    /// writing a sibling `.bin` file.
    pub embed_buffers: bool,
}

impl ExportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            unit_scale: std::env::var("SCENEBAKE_UNIT_SCALE")
                .ok()
                .and_then(|raw| {
                    let scale = parse_unit_scale(&raw);
                    if scale.is_none() {
                        tracing::warn!(
                            value = %raw,
                            fallback = defaults.unit_scale,
                            "Ignoring invalid SCENEBAKE_UNIT_SCALE"
                        );
                    }
                    scale
                })
                .unwrap_or(defaults.unit_scale),
            scene_name: std::env::var("SCENEBAKE_SCENE_NAME").unwrap_or(defaults.scene_name),
            generator: std::env::var("SCENEBAKE_GENERATOR").unwrap_or(defaults.generator),
            embed_buffers: std::env::var("SCENEBAKE_EMBED_BUFFERS")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(defaults.embed_buffers),
        }
    }

    /// Use a length unit preset
    pub fn with_length_unit(mut self, unit: LengthUnit) -> Self {
        self.unit_scale = unit.scale();
        self
    }

    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }
}

/// A unit scale must be a finite, positive number
fn parse_unit_scale(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            unit_scale: 1.0,
            scene_name: "Default".into(),
            generator: concat!("SceneBake ", env!("CARGO_PKG_VERSION")).into(),
            embed_buffers: false,
        }
    }
}
