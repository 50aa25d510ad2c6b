//! Wavefront OBJ writer.
//!
//! Node world transforms are baked into the emitted geometry, one `o` group
//! per mesh node, with a sidecar `.mtl` file declaring the scene materials.

use super::{ExportError, ExportOptions, ExportStats, Exporter};
use crate::scene::{NodeId, Scene};
use crate::VERSION;
use glam::{DMat3, DMat4};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Description string used for runtime writer lookup.
pub const OBJ_WRITER_DESCRIPTION: &str = "Wavefront OBJ (*.obj)";

/// OBJ/MTL scene writer.
#[derive(Debug, Default)]
pub struct ObjExporter;

impl ObjExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for ObjExporter {
    fn description(&self) -> &str {
        OBJ_WRITER_DESCRIPTION
    }

    fn supported_extensions(&self) -> &[&str] {
        &["obj"]
    }

    fn export(
        &self,
        scene: &Scene,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<ExportStats, ExportError> {
        let with_materials = options.materials && !scene.materials().is_empty();
        let mtl_path = path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        let mut writer = ObjWriter::new(scene, with_materials);
        if let (true, Some(name)) = (with_materials, &mtl_name) {
            writer.header(name);
        } else {
            writer.header_plain();
        }
        writer.emit()?;

        let mut stats = ExportStats::default();
        fs::write(path, writer.obj.as_bytes())?;
        stats.bytes_written += writer.obj.len() as u64;
        stats.files.push(path.to_path_buf());

        if with_materials {
            let mtl = write_mtl(scene);
            fs::write(&mtl_path, mtl.as_bytes())?;
            stats.bytes_written += mtl.len() as u64;
            stats.files.push(mtl_path);
        }

        stats.meshes_written = writer.meshes_written;
        info!(
            output = %path.display(),
            meshes = stats.meshes_written,
            bytes = stats.bytes_written,
            "wrote OBJ"
        );
        Ok(stats)
    }
}

struct ObjWriter<'a> {
    scene: &'a Scene,
    with_materials: bool,
    obj: String,
    vertex_offset: u32,
    normal_offset: u32,
    meshes_written: usize,
}

impl<'a> ObjWriter<'a> {
    fn new(scene: &'a Scene, with_materials: bool) -> Self {
        Self {
            scene,
            with_materials,
            obj: String::new(),
            vertex_offset: 0,
            normal_offset: 0,
            meshes_written: 0,
        }
    }

    fn header(&mut self, mtl_name: &str) {
        let _ = writeln!(self.obj, "# Exported by meshport v{VERSION}");
        let _ = writeln!(self.obj, "mtllib {mtl_name}");
    }

    fn header_plain(&mut self) {
        let _ = writeln!(self.obj, "# Exported by meshport v{VERSION}");
    }

    fn emit(&mut self) -> Result<(), ExportError> {
        for id in self.scene.preorder() {
            if self.scene.node(id).mesh.is_some() {
                let world = self.scene.world_transform(id);
                self.emit_mesh(id, world)?;
            }
        }
        Ok(())
    }

    fn emit_mesh(&mut self, id: NodeId, world: DMat4) -> Result<(), ExportError> {
        let node = self.scene.node(id);
        let Some(mesh) = &node.mesh else {
            return Ok(());
        };

        let _ = writeln!(self.obj, "o {}", sanitize_name(&node.name));

        for polygon in &mesh.polygons {
            for &idx in polygon {
                if idx as usize >= mesh.positions.len() {
                    return Err(ExportError::InvalidScene(format!(
                        "node {:?} references vertex {} out of {}",
                        node.name,
                        idx,
                        mesh.positions.len()
                    )));
                }
            }
        }

        for position in &mesh.positions {
            let p = world.transform_point3(*position);
            let _ = writeln!(self.obj, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z);
        }

        // Normals go through the inverse-transpose; drop them for
        // degenerate transforms instead of emitting NaNs.
        let mut normals_valid = false;
        if let Some(normals) = &mesh.normals {
            if normals.len() != mesh.polygon_vertex_count() {
                warn!(
                    node = %node.name,
                    "normal count does not match polygon-vertex count, skipping normals"
                );
            } else {
                let linear = DMat3::from_mat4(world);
                if linear.determinant().abs() > f64::EPSILON {
                    let normal_matrix = linear.inverse().transpose();
                    for normal in normals {
                        let n = (normal_matrix * *normal).normalize_or_zero();
                        let _ = writeln!(self.obj, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z);
                    }
                    normals_valid = true;
                } else {
                    warn!(node = %node.name, "singular transform, skipping normals");
                }
            }
        }

        if self.with_materials {
            if let Some(material) = node.material {
                let _ = writeln!(self.obj, "usemtl {}", self.scene.material(material).name);
            }
        }

        let mut polygon_vertex = 0u32;
        for polygon in &mesh.polygons {
            let _ = write!(self.obj, "f");
            for &idx in polygon {
                let v = self.vertex_offset + idx + 1;
                if normals_valid {
                    let vn = self.normal_offset + polygon_vertex + 1;
                    let _ = write!(self.obj, " {v}//{vn}");
                } else {
                    let _ = write!(self.obj, " {v}");
                }
                polygon_vertex += 1;
            }
            let _ = writeln!(self.obj);
        }

        self.vertex_offset += mesh.positions.len() as u32;
        if normals_valid {
            self.normal_offset += mesh.polygon_vertex_count() as u32;
        }
        self.meshes_written += 1;
        Ok(())
    }
}

fn write_mtl(scene: &Scene) -> String {
    let mut mtl = String::new();
    let _ = writeln!(mtl, "# Exported by meshport v{VERSION}");
    for material in scene.materials() {
        let _ = writeln!(mtl, "newmtl {}", sanitize_name(&material.name));
        let [dr, dg, db] = material.diffuse;
        let [sr, sg, sb] = material.specular;
        let _ = writeln!(mtl, "Kd {dr:.4} {dg:.4} {db:.4}");
        let _ = writeln!(mtl, "Ks {sr:.4} {sg:.4} {sb:.4}");
        let _ = writeln!(mtl, "illum 2");
    }
    mtl
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
