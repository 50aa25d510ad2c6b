//! The conversion engine: import, classify materials, export.
//!
//! One [`Converter`] instance spans a run. The pipeline is single-threaded
//! and synchronous; an import failure is terminal and skips export.

use crate::export::{ExportOptions, ExporterRegistry, OBJ_WRITER_DESCRIPTION};
use crate::import::{ImportError, ImportOptions, ImporterRegistry};
use crate::material::{assign_materials, MaterialSet};
use crate::DETECTION_HEADER_LEN;
use glam::DVec3;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can end a conversion run.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("no suitable importer for file: {0}")]
    NoSuitableImporter(PathBuf),

    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error("no writer registered with description {0:?}")]
    NoSuchWriter(String),

    #[error("export failed: {0}")]
    Export(#[from] crate::export::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conversion configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Description string of the writer plugin to use.
    pub writer_description: String,
    /// Rotation forced onto the scene root before export, XYZ Euler degrees.
    pub root_rotation_deg: DVec3,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            writer_description: OBJ_WRITER_DESCRIPTION.to_string(),
            root_rotation_deg: DVec3::new(-90.0, 0.0, 0.0),
        }
    }
}

/// Result of one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Total nodes in the imported hierarchy, root included.
    pub nodes_visited: usize,
    /// Mesh nodes written to the output.
    pub meshes_exported: usize,
    /// Material assignment counts per preset name.
    pub materials_assigned: HashMap<String, usize>,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

/// Conversion engine tying importers, the material pass, and exporters
/// together.
pub struct Converter {
    importers: ImporterRegistry,
    exporters: ExporterRegistry,
    config: Config,
}

impl Converter {
    pub fn new(importers: ImporterRegistry, exporters: ExporterRegistry) -> Self {
        Self::with_config(importers, exporters, Config::default())
    }

    pub fn with_config(
        importers: ImporterRegistry,
        exporters: ExporterRegistry,
        config: Config,
    ) -> Self {
        Self {
            importers,
            exporters,
            config,
        }
    }

    pub fn importers(&self) -> &ImporterRegistry {
        &self.importers
    }

    pub fn exporters(&self) -> &ExporterRegistry {
        &self.exporters
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full pipeline on one file.
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<ConversionResult, ConversionError> {
        let start = std::time::Instant::now();
        let mut warnings = Vec::new();

        if !input.exists() {
            return Err(ConversionError::InputNotFound(input.to_path_buf()));
        }

        let mut header = vec![0u8; DETECTION_HEADER_LEN];
        let mut file = File::open(input)?;
        let read = file.read(&mut header)?;
        header.truncate(read);
        drop(file);

        let importer = self
            .importers
            .find(input, &header)
            .ok_or_else(|| ConversionError::NoSuitableImporter(input.to_path_buf()))?;
        info!(
            importer = importer.name(),
            version = importer.version(),
            input = %input.display(),
            "importing scene"
        );

        let mut scene = importer.import(input, &ImportOptions::conversion_defaults())?;
        let nodes_visited = scene.node_count();
        info!(nodes = nodes_visited, "scene loaded");

        let set = MaterialSet::install(&mut scene);

        let root = scene.root();
        scene.node_mut(root).transform.rotation_deg = self.config.root_rotation_deg;

        let summary = assign_materials(&mut scene, &set);
        if summary.assigned == 0 {
            warn!("scene contains no mesh nodes");
            warnings.push("scene contains no mesh nodes".to_string());
        }

        let exporter = self
            .exporters
            .find_by_description(&self.config.writer_description)
            .ok_or_else(|| {
                ConversionError::NoSuchWriter(self.config.writer_description.clone())
            })?;
        info!(writer = exporter.description(), output = %output.display(), "exporting scene");

        let stats = exporter.export(&scene, output, &ExportOptions::conversion_defaults())?;

        Ok(ConversionResult {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            nodes_visited,
            meshes_exported: stats.meshes_written,
            materials_assigned: summary.by_preset,
            bytes_written: stats.bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ObjExporter;
    use crate::import::Importer;
    use crate::scene::{Mesh, Node, Scene};
    use glam::DVec3 as V;
    use std::path::Path;
    use tempfile::TempDir;

    struct FixedSceneImporter;

    impl Importer for FixedSceneImporter {
        fn name(&self) -> &str {
            "Fixed"
        }
        fn version(&self) -> &str {
            "0.0.0"
        }
        fn supported_extensions(&self) -> &[&str] {
            &["fixed"]
        }
        fn detect(&self, header: &[u8]) -> bool {
            header.starts_with(b"FIXED")
        }
        fn import(&self, _path: &Path, _options: &ImportOptions) -> Result<Scene, ImportError> {
            let mut scene = Scene::new("fixed");
            let root = scene.root();
            let mesh = Mesh {
                positions: vec![V::new(0.0, 0.0, 0.0), V::new(1.0, 0.0, 0.0), V::new(0.0, 1.0, 0.0)],
                polygons: vec![vec![0, 1, 2]],
                normals: None,
            };
            scene.add_node(root, Node::new("Road_Crosswalk_01").with_mesh(mesh));
            scene.add_node(root, Node::new("EmptyGroup"));
            Ok(scene)
        }
    }

    fn registries() -> (ImporterRegistry, ExporterRegistry) {
        let mut importers = ImporterRegistry::new();
        importers.register(Box::new(FixedSceneImporter));
        let mut exporters = ExporterRegistry::new();
        exporters.register(Box::new(ObjExporter::new()));
        (importers, exporters)
    }

    #[test]
    fn missing_input_is_reported_before_detection() {
        let (importers, exporters) = registries();
        let converter = Converter::new(importers, exporters);
        let err = converter
            .convert_file(Path::new("/nonexistent/scene.fixed"), Path::new("out.obj"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::InputNotFound(_)));
    }

    #[test]
    fn unknown_format_has_no_importer() {
        let (importers, exporters) = registries();
        let converter = Converter::new(importers, exporters);

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scene.bin");
        std::fs::write(&input, b"not a scene").unwrap();

        let err = converter
            .convert_file(&input, &dir.path().join("out.obj"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::NoSuitableImporter(_)));
    }

    #[test]
    fn unknown_writer_description_fails_lookup() {
        let (importers, exporters) = registries();
        let config = Config {
            writer_description: "No Such Writer (*.xyz)".to_string(),
            ..Config::default()
        };
        let converter = Converter::with_config(importers, exporters, config);

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scene.fixed");
        std::fs::write(&input, b"FIXED").unwrap();

        let err = converter
            .convert_file(&input, &dir.path().join("out.obj"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::NoSuchWriter(_)));
    }

    #[test]
    fn pipeline_rotates_root_and_assigns_materials() {
        let (importers, exporters) = registries();
        let converter = Converter::new(importers, exporters);

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scene.fixed");
        std::fs::write(&input, b"FIXED").unwrap();
        let output = dir.path().join("out.obj");

        let result = converter.convert_file(&input, &output).unwrap();

        // Root + mesh node + empty group.
        assert_eq!(result.nodes_visited, 3);
        assert_eq!(result.meshes_exported, 1);
        assert_eq!(result.materials_assigned.get("crosswalk"), Some(&1));
        assert!(result.bytes_written > 0);

        let obj = std::fs::read_to_string(&output).unwrap();
        assert!(obj.contains("usemtl crosswalk"));
        // (0,1,0) through the forced -90 deg X root rotation.
        assert!(obj
            .lines()
            .filter(|l| l.starts_with("v "))
            .any(|l| {
                let xyz: Vec<f64> = l[2..]
                    .split_whitespace()
                    .map(|t| t.parse().unwrap())
                    .collect();
                (xyz[0]).abs() < 1e-5 && (xyz[1]).abs() < 1e-5 && (xyz[2] + 1.0).abs() < 1e-5
            }));
    }
}
