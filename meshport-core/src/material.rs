//! Preset surface materials and the naming-convention classifier.
//!
//! Conversion replaces whatever materials the source scene carried with one
//! of five fixed presets, chosen per node by an ordered prefix-rule table.

use crate::scene::{MaterialId, Scene};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One of the five fixed surface presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialPreset {
    Road,
    Sidewalk,
    Crosswalk,
    Grass,
    Block,
}

impl MaterialPreset {
    /// Material name as written to the output file.
    pub fn name(self) -> &'static str {
        match self {
            MaterialPreset::Road => "road",
            MaterialPreset::Sidewalk => "sidewalk",
            MaterialPreset::Crosswalk => "crosswalk",
            MaterialPreset::Grass => "grass",
            MaterialPreset::Block => "block",
        }
    }

    /// Diffuse color used when the writer needs one (e.g. MTL `Kd`).
    pub fn diffuse(self) -> [f32; 3] {
        match self {
            MaterialPreset::Road => [0.25, 0.25, 0.25],
            MaterialPreset::Sidewalk => [0.55, 0.55, 0.55],
            MaterialPreset::Crosswalk => [0.90, 0.90, 0.90],
            MaterialPreset::Grass => [0.15, 0.45, 0.15],
            MaterialPreset::Block => [0.60, 0.60, 0.60],
        }
    }

    pub const ALL: [MaterialPreset; 5] = [
        MaterialPreset::Road,
        MaterialPreset::Sidewalk,
        MaterialPreset::Crosswalk,
        MaterialPreset::Grass,
        MaterialPreset::Block,
    ];
}

/// Concrete material instance stored in a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

impl SurfaceMaterial {
    pub fn from_preset(preset: MaterialPreset) -> Self {
        Self {
            name: preset.name().to_string(),
            diffuse: preset.diffuse(),
            specular: [0.10, 0.10, 0.10],
        }
    }
}

/// Ordered rule table; first match wins, unmatched names fall back to block.
const RULES: &[(&str, MaterialPreset)] = &[
    ("Road_Road", MaterialPreset::Road),
    ("Road_Marking", MaterialPreset::Road),
    ("Road_Curb", MaterialPreset::Road),
    ("Road_Gutter", MaterialPreset::Road),
    ("Road_Sidewalk", MaterialPreset::Sidewalk),
    ("Road_Crosswalk", MaterialPreset::Crosswalk),
    ("Road_Grass", MaterialPreset::Grass),
];

/// Length-bounded prefix equality: a name shorter than the prefix never
/// matches, and empty names match nothing.
fn name_matches(name: &str, prefix: &str) -> bool {
    if name.is_empty() || name.len() < prefix.len() {
        return false;
    }
    name.as_bytes()[..prefix.len()] == *prefix.as_bytes()
}

/// Pick the preset for a node name.
pub fn classify(name: &str) -> MaterialPreset {
    for (prefix, preset) in RULES {
        if name_matches(name, prefix) {
            return *preset;
        }
    }
    MaterialPreset::Block
}

/// The five presets installed into one scene, addressed by preset.
#[derive(Debug, Clone)]
pub struct MaterialSet {
    ids: HashMap<MaterialPreset, MaterialId>,
}

impl MaterialSet {
    /// Create all five presets in `scene` once; nodes share these instances.
    pub fn install(scene: &mut Scene) -> Self {
        let mut ids = HashMap::new();
        for preset in MaterialPreset::ALL {
            let id = scene.add_material(SurfaceMaterial::from_preset(preset));
            ids.insert(preset, id);
        }
        Self { ids }
    }

    pub fn id(&self, preset: MaterialPreset) -> MaterialId {
        self.ids[&preset]
    }
}

/// Summary of a material-assignment pass.
#[derive(Debug, Clone, Default)]
pub struct AssignmentSummary {
    /// Number of mesh nodes that received a material.
    pub assigned: usize,
    /// Assignment count per preset name.
    pub by_preset: HashMap<String, usize>,
}

/// Walk the whole hierarchy depth-first pre-order and attach a preset to
/// every mesh-bearing node. Existing assignments are stripped first; nodes
/// without a mesh are visited but left untouched.
pub fn assign_materials(scene: &mut Scene, set: &MaterialSet) -> AssignmentSummary {
    let mut summary = AssignmentSummary::default();
    for id in scene.preorder() {
        let node = scene.node_mut(id);
        if node.mesh.is_none() {
            continue;
        }
        node.material = None;
        let preset = classify(&node.name);
        node.material = Some(set.id(preset));
        debug!(node = %node.name, material = preset.name(), "assigned material");
        summary.assigned += 1;
        *summary.by_preset.entry(preset.name().to_string()).or_insert(0) += 1;
    }
    summary
}
