//! Lazily loaded dependency manifest (`package.json`).
//!
//! The manifest is read and parsed at most once between [`DependencyRegistry::reset`]
//! calls. A missing or unparsable document degrades to an empty manifest: a
//! question script must never fail because the project has no manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default manifest file name, resolved against the working directory.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Environment variable a host sets to point question scripts at another manifest.
pub const MANIFEST_ENV: &str = "HARNESS_MANIFEST";

/// Parsed dependency sections. Absent sections are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyManifest {
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
}

impl DependencyManifest {
    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("parse dependency manifest")
    }
}

/// Name-keyed lookups into a cached [`DependencyManifest`].
#[derive(Debug)]
pub struct DependencyRegistry {
    path: PathBuf,
    cache: Mutex<Option<Arc<DependencyManifest>>>,
}

impl Default for DependencyRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST)
    }
}

impl DependencyRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Registry for the manifest named by [`MANIFEST_ENV`], or [`DEFAULT_MANIFEST`].
    pub fn from_env() -> Self {
        match std::env::var_os(MANIFEST_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dependency(&self, name: &str) -> Option<String> {
        self.manifest().dependencies.get(name).cloned()
    }

    pub fn dev_dependency(&self, name: &str) -> Option<String> {
        self.manifest().dev_dependencies.get(name).cloned()
    }

    pub fn peer_dependency(&self, name: &str) -> Option<String> {
        self.manifest().peer_dependencies.get(name).cloned()
    }

    pub fn get_dependencies(&self) -> BTreeMap<String, String> {
        self.manifest().dependencies.clone()
    }

    pub fn get_dev_dependencies(&self) -> BTreeMap<String, String> {
        self.manifest().dev_dependencies.clone()
    }

    pub fn get_peer_dependencies(&self) -> BTreeMap<String, String> {
        self.manifest().peer_dependencies.clone()
    }

    /// Drop the cached manifest; the next lookup re-reads the document.
    pub fn reset(&self) {
        debug!(path = %self.path.display(), "resetting dependency manifest");
        *self.lock() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Cached manifest, loading it on first use.
    ///
    /// Load and store happen under one lock so concurrent first lookups read
    /// the document once.
    pub fn manifest(&self) -> Arc<DependencyManifest> {
        let mut cache = self.lock();
        if let Some(manifest) = cache.as_ref() {
            return Arc::clone(manifest);
        }
        let manifest = Arc::new(self.load());
        *cache = Some(Arc::clone(&manifest));
        manifest
    }

    fn load(&self) -> DependencyManifest {
        match read_manifest(&self.path) {
            Ok(manifest) => {
                debug!(
                    path = %self.path.display(),
                    dependencies = manifest.dependencies.len(),
                    dev_dependencies = manifest.dev_dependencies.len(),
                    peer_dependencies = manifest.peer_dependencies.len(),
                    "dependency manifest loaded"
                );
                manifest
            }
            Err(err) => {
                let reason = format!("{err:#}");
                debug!(
                    path = %self.path.display(),
                    err = %reason,
                    "dependency manifest unavailable, using empty manifest"
                );
                DependencyManifest::default()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<DependencyManifest>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_manifest(path: &Path) -> Result<DependencyManifest> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    DependencyManifest::parse(&contents).with_context(|| format!("parse {}", path.display()))
}
