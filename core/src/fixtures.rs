//! Cached fixture bundle: load, regenerate-and-persist, or fall back.
//!
//! # Design
//! `FixtureStore` walks an explicit state machine:
//!
//! ```text
//! Absent ──read ok──────────────────────────────▶ Loaded
//!   │
//!   └─missing/unreadable─▶ Regenerating ─persisted─▶ Loaded
//!                               │
//!                               └─persist failed──▶ Fallback
//! ```
//!
//! `load_or_generate` never fails, so test cases never block on fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::FixtureError;
use crate::generator::TestDataGenerator;
use crate::types::FixtureBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    Absent,
    Loaded,
    Regenerating,
    Fallback,
}

#[derive(Debug)]
pub struct FixtureStore {
    path: PathBuf,
    state: FixtureState,
}

impl FixtureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: FixtureState::Absent,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fixture_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> FixtureState {
        self.state
    }

    /// Read and parse the fixture file.
    pub fn load(&self) -> Result<FixtureBundle, FixtureError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| FixtureError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| FixtureError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `bundle` as pretty JSON, creating the parent directory.
    pub fn save(&self, bundle: &FixtureBundle) -> Result<(), FixtureError> {
        let io_err = |source| FixtureError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(bundle).map_err(|source| FixtureError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)?;
        info!(path = %self.path.display(), "Test data saved");
        Ok(())
    }

    /// Return the cached bundle, regenerating or falling back as needed.
    pub fn load_or_generate(&mut self, generator: &mut TestDataGenerator) -> FixtureBundle {
        self.state = FixtureState::Absent;
        match self.load() {
            Ok(bundle) => {
                info!(path = %self.path.display(), "Test data loaded");
                self.state = FixtureState::Loaded;
                return bundle;
            }
            Err(err) => {
                info!(error = %err, "Test data not usable, generating new data");
                self.state = FixtureState::Regenerating;
            }
        }

        let regenerated = generator.generate_bundle();
        match self.save(&regenerated).and_then(|()| self.load()) {
            Ok(bundle) => {
                self.state = FixtureState::Loaded;
                bundle
            }
            Err(err) => {
                error!(error = %err, "Error persisting test data");
                warn!("Generating fallback test data");
                self.state = FixtureState::Fallback;
                generator.generate_fallback_bundle()
            }
        }
    }
}
