//! # Meshport FBX
//!
//! Binary FBX importer plugin for meshport. Parses the node-record tree of
//! FBX 7.1 through 7.5 files and lowers the mesh models, their transforms,
//! and the object hierarchy into the meshport scene model.
//!
//! ASCII FBX is detected and rejected; textures, skinning, shapes, and
//! animation data are not imported.

pub mod document;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod integration_test;

use memmap2::Mmap;
use meshport_core::import::{ImportError, ImportOptions, Importer};
use meshport_core::scene::Scene;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Binary FBX scene reader.
#[derive(Debug, Default)]
pub struct FbxImporter;

impl FbxImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Importer for FbxImporter {
    fn name(&self) -> &str {
        "FBX"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn supported_extensions(&self) -> &[&str] {
        &["fbx"]
    }

    fn detect(&self, header: &[u8]) -> bool {
        tree::is_binary_fbx(header)
    }

    fn import(&self, path: &Path, options: &ImportOptions) -> Result<Scene, ImportError> {
        let file = File::open(path)?;
        let data = unsafe { Mmap::map(&file)? };

        let parsed = tree::parse(&data)?;
        info!(
            version = parsed.version,
            records = parsed.nodes.len(),
            input = %path.display(),
            "parsed binary FBX"
        );

        let scene_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene");
        document::lower(&parsed, scene_name, options)
    }
}
