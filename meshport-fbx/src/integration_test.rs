//! End-to-end conversion: synthetic binary FBX in, OBJ + MTL out.

use crate::fixtures;
use crate::FbxImporter;
use meshport_core::convert::{ConversionError, Converter};
use meshport_core::export::{ExporterRegistry, ObjExporter};
use meshport_core::import::ImporterRegistry;
use tempfile::TempDir;

fn converter() -> Converter {
    let mut importers = ImporterRegistry::new();
    importers.register(Box::new(FbxImporter::new()));
    let mut exporters = ExporterRegistry::new();
    exporters.register(Box::new(ObjExporter::new()));
    Converter::new(importers, exporters)
}

#[test]
fn converts_binary_fbx_to_obj_with_reassigned_materials() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("town.fbx");
    let output = dir.path().join("town.obj");
    std::fs::write(&input, fixtures::road_scene_document(7400)).unwrap();

    let result = converter().convert_file(&input, &output).unwrap();

    // Root + Group + Road_Sidewalk_01 + Building_42, two of them meshes.
    assert_eq!(result.nodes_visited, 4);
    assert_eq!(result.meshes_exported, 2);
    assert_eq!(result.materials_assigned.get("sidewalk"), Some(&1));
    assert_eq!(result.materials_assigned.get("block"), Some(&1));

    let obj = std::fs::read_to_string(&output).unwrap();
    assert!(obj.contains("o Road_Sidewalk_01"));
    assert!(obj.contains("usemtl sidewalk"));
    assert!(obj.contains("o Building_42"));
    assert!(obj.contains("usemtl block"));

    // The forced -90 deg X root rotation maps +Y to -Z: the quad corner
    // (0,1,0) must land at (0,0,-1).
    let landed = obj
        .lines()
        .filter(|l| l.starts_with("v "))
        .map(|l| {
            let xyz: Vec<f64> = l[2..]
                .split_whitespace()
                .map(|t| t.parse().unwrap())
                .collect();
            (xyz[0], xyz[1], xyz[2])
        })
        .any(|(x, y, z)| x.abs() < 1e-5 && y.abs() < 1e-5 && (z + 1.0).abs() < 1e-5);
    assert!(landed, "root rotation was not baked into vertices");

    let mtl = std::fs::read_to_string(output.with_extension("mtl")).unwrap();
    for name in ["road", "sidewalk", "crosswalk", "grass", "block"] {
        assert!(mtl.contains(&format!("newmtl {name}")));
    }
}

#[test]
fn converts_the_7500_long_offset_flavor() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("town.fbx");
    let output = dir.path().join("town.obj");
    std::fs::write(&input, fixtures::road_scene_document(7500)).unwrap();

    let result = converter().convert_file(&input, &output).unwrap();
    assert_eq!(result.meshes_exported, 2);
}

#[test]
fn import_failure_is_terminal_and_reports_versions() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("old.fbx");
    let output = dir.path().join("old.obj");
    std::fs::write(&input, fixtures::document(6100, &[])).unwrap();

    let err = converter().convert_file(&input, &output).unwrap_err();
    match err {
        ConversionError::Import(inner) => {
            let msg = inner.to_string();
            assert!(msg.contains("6100"), "missing file version: {msg}");
            assert!(msg.contains("7100") && msg.contains("7500"), "missing supported range: {msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Export never ran.
    assert!(!output.exists());
}
