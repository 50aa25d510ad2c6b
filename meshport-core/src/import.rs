//! Importer trait and runtime registry.
//!
//! Readers are selected by file extension first, falling back to content
//! detection over the leading bytes of the file.

use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors produced while reading a source scene file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a recognized scene file (bad or missing signature)")]
    UnrecognizedFormat,

    #[error(
        "unsupported file version {found}: this reader supports {supported_min} through {supported_max}"
    )]
    UnsupportedVersion {
        found: u32,
        supported_min: u32,
        supported_max: u32,
    },

    #[error("malformed scene data: {0}")]
    Malformed(String),

    #[error("failed to inflate compressed data: {0}")]
    Decompress(String),
}

/// Importer feature toggles, mirroring the IO settings of the source
/// toolkit. Conversion disables everything: the pipeline rebuilds materials
/// itself and carries no textures, links, shapes, or animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    pub materials: bool,
    pub textures: bool,
    pub links: bool,
    pub shapes: bool,
    pub animation: bool,
    pub global_settings: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            materials: true,
            textures: true,
            links: true,
            shapes: true,
            animation: true,
            global_settings: true,
        }
    }
}

impl ImportOptions {
    /// The toggle set used by the conversion pipeline: everything off.
    pub fn conversion_defaults() -> Self {
        Self {
            materials: false,
            textures: false,
            links: false,
            shapes: false,
            animation: false,
            global_settings: false,
        }
    }
}

/// A scene reader for one interchange format.
pub trait Importer: Send + Sync {
    /// Short format name, e.g. `"FBX"`.
    fn name(&self) -> &str;

    /// Reader version.
    fn version(&self) -> &str;

    /// File extensions this reader claims, lowercase without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Check the leading bytes of a file for this reader's signature.
    fn detect(&self, header: &[u8]) -> bool;

    /// Load the file into a scene.
    fn import(&self, path: &Path, options: &ImportOptions) -> Result<Scene, ImportError>;
}

/// Importer description for CLI and API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ImporterInfo {
    pub name: String,
    pub version: String,
    pub extensions: Vec<String>,
}

/// Registry of available scene readers.
#[derive(Default)]
pub struct ImporterRegistry {
    importers: Vec<Box<dyn Importer>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, importer: Box<dyn Importer>) {
        debug!(
            importer = importer.name(),
            version = importer.version(),
            "registered importer"
        );
        self.importers.push(importer);
    }

    /// Find a reader for the given file: extension match plus signature
    /// check first, then signature-only detection.
    pub fn find(&self, path: &Path, header: &[u8]) -> Option<&dyn Importer> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            for importer in &self.importers {
                if importer.supported_extensions().contains(&ext.as_str())
                    && importer.detect(header)
                {
                    return Some(importer.as_ref());
                }
            }
        }
        self.importers
            .iter()
            .map(|i| i.as_ref())
            .find(|i| i.detect(header))
    }

    pub fn list(&self) -> Vec<ImporterInfo> {
        self.importers
            .iter()
            .map(|i| ImporterInfo {
                name: i.name().to_string(),
                version: i.version().to_string(),
                extensions: i
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.importers.len()
    }
}
