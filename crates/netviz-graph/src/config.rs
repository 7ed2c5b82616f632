use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a canvas session. Every field has a default so partial JSON
/// files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Height (pixels) of the initial fit; the width follows the layout's aspect ratio.
    pub canvas_height: f32,
    /// Hit radius of a vertex, also the drawn diameter.
    pub point_radius: f32,
    /// Drawn diameter of a selected vertex.
    pub selected_point_radius: f32,
    /// Maximum perpendicular pixel distance for an edge hit.
    pub line_distance: f32,
    pub zoom_step: f32,
    /// Additive zoom per wheel notch (120 units of angle delta).
    pub wheel_zoom_step: f32,
    pub min_zoom: f32,
    pub default_layout: String,
    pub default_clustering: String,
    pub default_filter: FilterDefaults,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    pub attribute: String,
    pub low: f64,
    pub high: f64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            attribute: "total_delay".to_string(),
            low: 0.0,
            high: 54.0,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas_height: 500.0,
            point_radius: 8.0,
            selected_point_radius: 12.0,
            line_distance: 2.0,
            zoom_step: 1.2,
            wheel_zoom_step: 0.05,
            min_zoom: 0.05,
            default_layout: crate::layout::DEFAULT_LAYOUT.to_string(),
            default_clustering: crate::cluster::DEFAULT_CLUSTERING.to_string(),
            default_filter: FilterDefaults::default(),
            seed: 0x6e65_7476,
        }
    }
}

impl CanvasConfig {
    /// Read a JSON config file, falling back to defaults for absent keys.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::info!("Loaded canvas config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CanvasConfig =
            serde_json::from_str(r#"{ "point_radius": 10.0, "default_filter": { "high": 20 } }"#)
                .unwrap();
        assert_eq!(config.point_radius, 10.0);
        assert_eq!(config.canvas_height, 500.0);
        assert_eq!(config.default_filter.attribute, "total_delay");
        assert_eq!(config.default_filter.high, 20.0);
        assert_eq!(config.default_layout, "layout_lgl");
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        let config = CanvasConfig {
            zoom_step: 1.5,
            ..CanvasConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(CanvasConfig::from_json_file(&path).unwrap(), config);
    }
}
