//! Persistence for published pattern sets and DNA profiles.
//!
//! The store is a cache, not the source of truth: components accept
//! `Option<Arc<dyn …Store>>` and behave as "nothing published yet" when it
//! is absent or empty.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use surgelab_core::dna::DnaProfile;
use surgelab_core::patterns::PatternSet;

use crate::error::StoreError;

pub trait PatternStore: Send + Sync {
    fn load_patterns(&self) -> Result<Option<PatternSet>, StoreError>;
    fn save_patterns(&self, set: &PatternSet) -> Result<(), StoreError>;
}

pub trait DnaStore: Send + Sync {
    fn load_profile(&self) -> Result<Option<DnaProfile>, StoreError>;
    fn save_profile(&self, profile: &DnaProfile) -> Result<(), StoreError>;
}

/// JSON files under one directory: `patterns.json` and `dna_profile.json`.
///
/// Writes go to a `.tmp` sibling and are renamed into place, so a reader
/// never observes a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub const PATTERNS_FILE: &'static str = "patterns.json";
    pub const DNA_FILE: &'static str = "dna_profile.json";

    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl PatternStore for JsonFileStore {
    fn load_patterns(&self) -> Result<Option<PatternSet>, StoreError> {
        self.read(Self::PATTERNS_FILE)
    }

    fn save_patterns(&self, set: &PatternSet) -> Result<(), StoreError> {
        self.write(Self::PATTERNS_FILE, set)
    }
}

impl DnaStore for JsonFileStore {
    fn load_profile(&self) -> Result<Option<DnaProfile>, StoreError> {
        self.read(Self::DNA_FILE)
    }

    fn save_profile(&self, profile: &DnaProfile) -> Result<(), StoreError> {
        self.write(Self::DNA_FILE, profile)
    }
}
