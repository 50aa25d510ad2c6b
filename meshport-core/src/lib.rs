//! # Meshport Core
//!
//! Core engine for meshport, a scene file converter that re-exports 3D
//! interchange files as mesh formats after reassigning surface materials by
//! naming convention.
//!
//! This crate provides:
//! - An in-memory scene model (node hierarchy, meshes, shared materials)
//! - The preset material table and the prefix-rule classifier
//! - Importer/exporter traits with runtime registries
//! - The single-pass conversion engine tying the three together
//!
//! ## Architecture
//!
//! Format support is pluggable: readers implement the [`import::Importer`]
//! trait and writers implement the [`export::Exporter`] trait. Readers are
//! selected by extension and content detection; writers are located at
//! runtime by their description string (e.g. `"Wavefront OBJ (*.obj)"`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshport_core::{
//!     convert::Converter,
//!     export::{ExporterRegistry, ObjExporter},
//!     import::ImporterRegistry,
//! };
//! use std::path::Path;
//!
//! let importers = ImporterRegistry::new(); // register format plugins here
//! let mut exporters = ExporterRegistry::new();
//! exporters.register(Box::new(ObjExporter::new()));
//!
//! let converter = Converter::new(importers, exporters);
//! let result = converter.convert_file(Path::new("scene.fbx"), Path::new("scene.obj"))?;
//!
//! println!("wrote {} bytes", result.bytes_written);
//! # Ok::<(), meshport_core::convert::ConversionError>(())
//! ```

pub mod convert;
pub mod export;
pub mod import;
pub mod material;
pub mod scene;

// Re-export commonly used types
pub use convert::{Config, ConversionError, ConversionResult, Converter};
pub use export::{
    ExportError, ExportOptions, Exporter, ExporterInfo, ExporterRegistry, ObjExporter,
    OBJ_WRITER_DESCRIPTION,
};
pub use import::{ImportError, ImportOptions, Importer, ImporterInfo, ImporterRegistry};
pub use material::{assign_materials, classify, MaterialPreset, MaterialSet, SurfaceMaterial};
pub use scene::{MaterialId, Mesh, Node, NodeId, Scene, Transform};

/// Version information for the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of leading bytes read from an input file for format detection.
pub const DETECTION_HEADER_LEN: usize = 1024;
