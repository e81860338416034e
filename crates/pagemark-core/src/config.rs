//! Drawing surface configuration, read from a JSON file.

use crate::error::ConfigError;
use crate::shapes::SerializableColor;
use crate::tools::DrawingDefaults;
use crate::widget::SelectionStyle;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When the line options popup appears for a freshly drawn line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupReveal {
    /// Once the pointer is released.
    #[default]
    GestureEnd,
    /// As soon as the pointer goes down.
    GestureStart,
}

/// Tunables for the drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Canvas width divided by height.
    pub aspect_ratio: f64,
    /// Color of new lines until the popup commits another.
    pub default_color: SerializableColor,
    /// Width of new lines until the popup commits another.
    pub default_width: f64,
    pub popup_reveal: PopupReveal,
    /// Active object frame appearance.
    pub selection: SelectionStyle,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        let defaults = DrawingDefaults::default();
        Self {
            aspect_ratio: 4.0 / 3.0,
            default_color: defaults.color,
            default_width: defaults.width,
            popup_reveal: PopupReveal::default(),
            selection: SelectionStyle::default(),
        }
    }
}

impl SurfaceConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        if !config.aspect_ratio.is_finite() || config.aspect_ratio <= 0.0 {
            log::warn!(
                "Ignoring invalid aspect ratio {}, using default",
                config.aspect_ratio
            );
            config.aspect_ratio = Self::default().aspect_ratio;
        }
        Ok(config)
    }

    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// `<config dir>/pagemark/config.json`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Result<std::path::PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("pagemark").join("config.json"))
    }

    /// Load from `path`, falling back to defaults if it is absent or invalid.
    pub fn load_or_default_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from the default location.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                log::warn!("{e}, using default config");
                Self::default()
            }
        }
    }

    /// Initial drawing defaults.
    pub fn drawing_defaults(&self) -> DrawingDefaults {
        DrawingDefaults::new(self.default_color, self.default_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SurfaceConfig::default();
        assert!((config.aspect_ratio - 4.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(config.popup_reveal, PopupReveal::GestureEnd);
        assert_eq!(config.drawing_defaults(), DrawingDefaults::default());
    }

    #[test]
    fn test_partial_json() {
        let config = SurfaceConfig::from_json(
            r##"{"default_color": "#ff0000", "popup_reveal": "gesture_start"}"##,
        )
        .unwrap();
        assert_eq!(config.default_color, SerializableColor::new(255, 0, 0, 255));
        assert_eq!(config.popup_reveal, PopupReveal::GestureStart);
        assert!((config.default_width - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_width_clamped() {
        let config = SurfaceConfig::from_json(r#"{"default_width": 40}"#).unwrap();
        assert!((config.drawing_defaults().width - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_aspect_ratio_replaced() {
        let config = SurfaceConfig::from_json(r#"{"aspect_ratio": -2}"#).unwrap();
        assert!((config.aspect_ratio - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"aspect_ratio": 1.5, "selection": {{"padding": 4}}}}"#).unwrap();
        let config = SurfaceConfig::load(file.path()).unwrap();
        assert!((config.aspect_ratio - 1.5).abs() < f64::EPSILON);
        assert!((config.selection.padding - 4.0).abs() < f64::EPSILON);
        assert!((config.selection.corner_size - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SurfaceConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(SurfaceConfig::load_or_default_from(file.path()), SurfaceConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert_eq!(SurfaceConfig::load_or_default_from(&path), SurfaceConfig::default());
    }
}
