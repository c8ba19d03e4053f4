//! Sound catalog
//!
//! Read-only mapping from sound identifiers (and clips) to descriptors.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::category::SoundCategory;
use super::fade::unit_volume;
use crate::error::CatalogError;

/// Reference to a clip asset
///
/// Two references denote the same clip when their names match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRef {
    pub name: String,

    /// Where a backend can load the asset from
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ClipRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl PartialEq for ClipRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClipRef {}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_group() -> String {
    "Default".to_string()
}

/// Catalog entry for one sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    pub id: String,
    pub clip: ClipRef,

    #[serde(default)]
    pub category: SoundCategory,

    /// Default volume fraction used when a request carries no fade
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Informational grouping label
    #[serde(default = "default_group")]
    pub group: String,
}

impl SoundDescriptor {
    pub fn new(id: impl Into<String>, clip: ClipRef, category: SoundCategory) -> Self {
        Self {
            id: id.into(),
            clip,
            category,
            volume: default_volume(),
            group: default_group(),
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = unit_volume(volume);
        self
    }
}

/// Lookup interface the scheduler resolves requests through
pub trait SoundCatalog {
    fn resolve(&self, id: &str) -> Option<&SoundDescriptor>;
    fn resolve_clip(&self, clip: &ClipRef) -> Option<&SoundDescriptor>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SoundBankFile {
    #[serde(default)]
    sounds: Vec<SoundDescriptor>,
}

/// In-memory sound bank, loadable from JSON
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    sounds: Vec<SoundDescriptor>,
    by_id: HashMap<String, usize>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank, rejecting duplicate ids
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = SoundDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut bank = Self::new();
        for descriptor in descriptors {
            bank.insert(descriptor)?;
        }
        Ok(bank)
    }

    pub fn insert(&mut self, mut descriptor: SoundDescriptor) -> Result<(), CatalogError> {
        if self.by_id.contains_key(&descriptor.id) {
            return Err(CatalogError::DuplicateId(descriptor.id));
        }
        descriptor.volume = unit_volume(descriptor.volume);
        self.by_id.insert(descriptor.id.clone(), self.sounds.len());
        self.sounds.push(descriptor);
        Ok(())
    }

    /// Parse a bank from JSON text
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let file: SoundBankFile = serde_json::from_str(json)?;
        Ok(Self::from_descriptors(file.sounds)?)
    }

    /// Load a bank from a JSON file; an empty bank is an error
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| CatalogError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let bank = Self::from_json(&content).map_err(load_failed)?;
        if bank.is_empty() {
            return Err(CatalogError::Empty);
        }

        tracing::info!("Loaded sound bank: {} ({} sounds)", path.display(), bank.len());
        Ok(bank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundDescriptor> {
        self.sounds.iter()
    }
}

impl SoundCatalog for SoundBank {
    fn resolve(&self, id: &str) -> Option<&SoundDescriptor> {
        self.by_id.get(id).map(|&index| &self.sounds[index])
    }

    fn resolve_clip(&self, clip: &ClipRef) -> Option<&SoundDescriptor> {
        self.sounds.iter().find(|s| &s.clip == clip)
    }

    fn len(&self) -> usize {
        self.sounds.len()
    }
}
