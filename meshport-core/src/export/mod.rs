//! Exporter trait and runtime registry.
//!
//! Writers are located at runtime by their description string, the way the
//! source toolkit resolves its writer plugins.

mod obj;

pub use obj::{ObjExporter, OBJ_WRITER_DESCRIPTION};

use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors produced while writing an output scene file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene cannot be written: {0}")]
    InvalidScene(String),
}

/// Exporter feature toggles, mirroring the IO settings of the source
/// toolkit. Conversion re-enables everything except media embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    pub materials: bool,
    pub textures: bool,
    pub embed_media: bool,
    pub shapes: bool,
    pub animation: bool,
    pub global_settings: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::conversion_defaults()
    }
}

impl ExportOptions {
    /// The toggle set used by the conversion pipeline: everything on,
    /// except media embedding.
    pub fn conversion_defaults() -> Self {
        Self {
            materials: true,
            textures: true,
            embed_media: false,
            shapes: true,
            animation: true,
            global_settings: true,
        }
    }
}

/// Result information for one export.
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    /// Files written (primary output plus any sidecars).
    pub files: Vec<PathBuf>,
    /// Total bytes written across all files.
    pub bytes_written: u64,
    /// Number of mesh nodes written.
    pub meshes_written: usize,
}

/// A scene writer for one output format.
pub trait Exporter: Send + Sync {
    /// Human-readable description used for runtime lookup,
    /// e.g. `"Wavefront OBJ (*.obj)"`.
    fn description(&self) -> &str;

    /// File extensions this writer produces, lowercase without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Write the scene to `path`.
    fn export(
        &self,
        scene: &Scene,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<ExportStats, ExportError>;
}

/// Exporter description for CLI and API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ExporterInfo {
    pub description: String,
    pub extensions: Vec<String>,
}

/// Registry of available scene writers.
#[derive(Default)]
pub struct ExporterRegistry {
    exporters: Vec<Box<dyn Exporter>>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, exporter: Box<dyn Exporter>) {
        debug!(writer = exporter.description(), "registered exporter");
        self.exporters.push(exporter);
    }

    /// Locate a writer by its description string.
    pub fn find_by_description(&self, description: &str) -> Option<&dyn Exporter> {
        self.exporters
            .iter()
            .map(|e| e.as_ref())
            .find(|e| e.description() == description)
    }

    pub fn list(&self) -> Vec<ExporterInfo> {
        self.exporters
            .iter()
            .map(|e| ExporterInfo {
                description: e.description().to_string(),
                extensions: e
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.exporters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_lookup_is_by_exact_description() {
        let mut registry = ExporterRegistry::new();
        registry.register(Box::new(ObjExporter::new()));

        assert!(registry.find_by_description("Wavefront OBJ (*.obj)").is_some());
        assert!(registry.find_by_description("Alias OBJ").is_none());
        assert_eq!(registry.count(), 1);
    }
}
