//! Session settings
//!
//! Stored as a small JSON file next to the binary (or wherever `--settings`
//! points). Every field has a default, so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::biometric::{BPM_CEIL, BPM_FLOOR};
use crate::consts::TARGET_FPS;
use crate::error::SettingsError;
use crate::sim::LevelLayout;

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Resting heart rate the difficulty thresholds are measured from
    pub baseline_bpm: i32,
    /// Run seed (drift and projectile spread)
    pub seed: u64,
    /// Stage to start on (1-based)
    pub start_level: u32,
    /// Simulation frames per second
    pub frame_rate: u32,
    /// UDP address to receive live bpm on, e.g. `0.0.0.0:5005`
    pub bpm_listen: Option<String>,
    /// Layout files replacing the built-in stages, in play order
    pub custom_levels: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baseline_bpm: 80,
            seed: 0x5EED,
            start_level: 1,
            frame_rate: TARGET_FPS,
            bpm_listen: None,
            custom_levels: Vec::new(),
        }
    }
}

impl Settings {
    /// Read and validate a settings file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing or broken file yields defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(BPM_FLOOR..=BPM_CEIL).contains(&self.baseline_bpm) {
            return Err(SettingsError::BaselineOutOfRange {
                value: self.baseline_bpm,
                min: BPM_FLOOR,
                max: BPM_CEIL,
            });
        }
        if self.frame_rate == 0 {
            return Err(SettingsError::ZeroFrameRate);
        }
        Ok(())
    }

    /// Fixed step matching `frame_rate`
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// Stage layouts for this session: custom files if any, else built-ins
    pub fn layouts(&self) -> Result<Vec<LevelLayout>, crate::error::LevelError> {
        if self.custom_levels.is_empty() {
            return Ok(LevelLayout::builtins());
        }
        self.custom_levels
            .iter()
            .map(|path| LevelLayout::load(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("heartbeat-devil-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.baseline_bpm, 80);
        assert_eq!(settings.start_level, 1);
        assert!((settings.frame_dt() - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(settings.layouts().unwrap().len(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"baseline_bpm": 72}"#).unwrap();
        assert_eq!(settings.baseline_bpm, 72);
        assert_eq!(settings.frame_rate, TARGET_FPS);
        assert!(settings.bpm_listen.is_none());
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.baseline_bpm = 39;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::BaselineOutOfRange { value: 39, .. })
        ));
        settings.baseline_bpm = 200;
        assert!(settings.validate().is_ok());
        settings.frame_rate = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::ZeroFrameRate)));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("settings.json");
        let settings = Settings {
            baseline_bpm: 66,
            bpm_listen: Some("0.0.0.0:5005".into()),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = temp_path("does-not-exist.json");
        assert!(matches!(Settings::load(&path), Err(SettingsError::Io { .. })));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_custom_layouts_load_in_order() {
        let path = temp_path("stage.json");
        let layout = LevelLayout::builtin(2).unwrap();
        std::fs::write(&path, layout.to_json().unwrap()).unwrap();

        let settings = Settings {
            custom_levels: vec![path.clone(), path.clone()],
            ..Default::default()
        };
        let layouts = settings.layouts().unwrap();
        assert_eq!(layouts, vec![layout.clone(), layout]);
        let _ = std::fs::remove_file(&path);
    }
}
