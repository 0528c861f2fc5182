//! Manifest catalog snapshot
//!
//! A read-only projection of the rights an application declares statically.
//! Produced by an external manifest parser, usually serialized as JSON:
//!
//! ```json
//! {
//!   "uses_sdk": { "min_sdk_version": 24 },
//!   "permissions": [
//!     { "name": "android.permission.CAMERA" },
//!     { "name": "android.permission.WRITE_EXTERNAL_STORAGE", "max_sdk_version": 29 }
//!   ],
//!   "queries_packages": ["com.example.partner"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// `max_sdk_version` of a declaration that carries no such attribute
pub const DEFAULT_MAX_SDK_VERSION: u32 = u32::MAX;

fn default_max_sdk_version() -> u32 {
    DEFAULT_MAX_SDK_VERSION
}

/// Error type for snapshot decoding
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `<uses-sdk>` information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsesSdk {
    pub min_sdk_version: u32,
}

/// One `<uses-permission>` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredPermission {
    /// Declared right name
    pub name: String,

    /// Highest API level the declaration applies to
    #[serde(default = "default_max_sdk_version")]
    pub max_sdk_version: u32,
}

/// Snapshot of the application's declared rights
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    #[serde(default)]
    pub uses_sdk: Option<UsesSdk>,

    /// Declarations in document order
    #[serde(default)]
    pub permissions: Vec<DeclaredPermission>,

    /// Packages listed under `<queries>`
    #[serde(default)]
    pub queries_packages: Vec<String>,
}

impl ManifestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a snapshot from a reader
    pub fn from_reader(reader: impl Read) -> Result<Self, ManifestError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Decode a snapshot from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Add a declaration without `max_sdk_version`
    pub fn declare(self, name: impl Into<String>) -> Self {
        self.declare_with_max_sdk(name, DEFAULT_MAX_SDK_VERSION)
    }

    /// Add a declaration limited to `max_sdk_version`
    pub fn declare_with_max_sdk(mut self, name: impl Into<String>, max_sdk_version: u32) -> Self {
        self.permissions.push(DeclaredPermission {
            name: name.into(),
            max_sdk_version,
        });
        self
    }

    /// Add a `<queries>` package
    pub fn query_package(mut self, package: impl Into<String>) -> Self {
        self.queries_packages.push(package.into());
        self
    }

    /// Set `<uses-sdk android:minSdkVersion>`
    pub fn min_sdk(mut self, min_sdk_version: u32) -> Self {
        self.uses_sdk = Some(UsesSdk { min_sdk_version });
        self
    }

    /// First declaration with exactly this name
    pub fn find(&self, name: &str) -> Option<&DeclaredPermission> {
        self.permissions.iter().find(|info| info.name == name)
    }
}
