use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_system::SoundCategory;
use crate::error::ConfigError;

/// Pool group key used when none is configured
pub const DEFAULT_POOL_GROUP: &str = "AudioSound";

fn default_pool_group() -> String {
    DEFAULT_POOL_GROUP.to_string()
}

fn default_tick_interval_ms() -> u64 {
    16
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum concurrent music channels
    pub max_capacity_music: usize,

    /// Maximum concurrent sound effect channels
    pub max_capacity_sfx: usize,

    /// Music category enabled at startup and after `destroy_all`
    pub music_enabled: bool,

    /// SFX category enabled at startup and after `destroy_all`
    pub sfx_enabled: bool,

    /// Music volume multiplier (0.0-1.0)
    pub music_volume: f32,

    /// SFX volume multiplier (0.0-1.0)
    pub sfx_volume: f32,

    /// Resource group the channel pool recycles under
    #[serde(default = "default_pool_group")]
    pub pool_group: String,

    /// Tick period used by the threaded driver
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_capacity_music: 5,
            max_capacity_sfx: 10,
            music_enabled: true,
            sfx_enabled: true,
            music_volume: 1.0,
            sfx_volume: 1.0,
            pool_group: default_pool_group(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Capacity limit for a category
    pub fn capacity(&self, category: SoundCategory) -> usize {
        match category {
            SoundCategory::Music => self.max_capacity_music,
            SoundCategory::Sfx => self.max_capacity_sfx,
        }
    }

    /// Builder-style capacity override
    pub fn with_capacity(mut self, category: SoundCategory, capacity: usize) -> Self {
        match category {
            SoundCategory::Music => self.max_capacity_music = capacity,
            SoundCategory::Sfx => self.max_capacity_sfx = capacity,
        }
        self
    }

    /// Check that every capacity is at least one and volumes are fractions
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in SoundCategory::ALL {
            if self.capacity(category) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "max capacity for {} must be at least 1",
                    category
                )));
            }
        }

        for (field, value) in [
            ("music_volume", self.music_volume),
            ("sfx_volume", self.sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0-1.0, got {}",
                    field, value
                )));
            }
        }

        if self.pool_group.is_empty() {
            return Err(ConfigError::Invalid("pool_group must not be empty".to_string()));
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: SchedulerConfig =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;

        tracing::info!("Loaded scheduler config from: {}", path.display());
        Ok(config)
    }

    /// Load configuration, creating a default file if none exists
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Created default scheduler config at: {}", path.display());
            Ok(config)
        }
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_failed(Box::new(e)))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Platform config file path
    ///
    /// - macOS: ~/Library/Application Support/SoundScheduler/config.json
    /// - Windows: %APPDATA%/SoundScheduler/config.json
    /// - Linux: ~/.config/SoundScheduler/config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("SoundScheduler").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }
}
