//! Lowering from the raw FBX record tree to the meshport scene model.
//!
//! Only the object classes the conversion needs are interpreted: `Geometry`
//! meshes, `Model` nodes with their local TRS, and `OO` connections. Every
//! other class is skipped.

use crate::tree::{FbxTree, Property, RawNode};
use glam::DVec3;
use meshport_core::import::{ImportError, ImportOptions};
use meshport_core::scene::{Mesh, Node, NodeId, Scene, Transform};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub(crate) fn lower(
    tree: &FbxTree,
    scene_name: &str,
    options: &ImportOptions,
) -> Result<Scene, ImportError> {
    let mut scene = Scene::new(scene_name);

    let objects = match tree.find("Objects") {
        Some(objects) => objects,
        None => {
            warn!("file has no Objects section, producing an empty scene");
            return Ok(scene);
        }
    };

    if options.materials {
        debug!("source materials are not carried through conversion");
    }

    let mut geometries: HashMap<i64, Mesh> = HashMap::new();
    let mut models: Vec<(i64, ModelRecord)> = Vec::new();
    let mut model_index: HashMap<i64, usize> = HashMap::new();

    for object in &objects.children {
        match object.name.as_str() {
            "Geometry" => {
                let (id, mesh) = lower_geometry(object)?;
                geometries.insert(id, mesh);
            }
            "Model" => {
                let (id, record) = lower_model(object)?;
                model_index.insert(id, models.len());
                models.push((id, record));
            }
            other => {
                debug!(class = other, "skipping object class");
            }
        }
    }

    // OO connections: geometry -> model and model -> model/root(0).
    let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut mesh_for_model: HashMap<i64, i64> = HashMap::new();
    if let Some(connections) = tree.find("Connections") {
        for c in connections.children_named("C") {
            let kind = c.properties.first().and_then(Property::as_str);
            if kind != Some("OO") {
                debug!(?kind, "skipping non-object connection");
                continue;
            }
            let (child, parent) = match (
                c.properties.get(1).and_then(Property::as_i64),
                c.properties.get(2).and_then(Property::as_i64),
            ) {
                (Some(child), Some(parent)) => (child, parent),
                _ => {
                    warn!("connection record without object ids");
                    continue;
                }
            };

            if geometries.contains_key(&child) && model_index.contains_key(&parent) {
                mesh_for_model.insert(parent, child);
            } else if model_index.contains_key(&child)
                && (parent == 0 || model_index.contains_key(&parent))
            {
                children_of.entry(parent).or_default().push(child);
            } else {
                debug!(child, parent, "skipping connection to unknown object");
            }
        }
    }

    let context = Assembly {
        geometries: &geometries,
        models: &models,
        model_index: &model_index,
        children_of: &children_of,
        mesh_for_model: &mesh_for_model,
    };

    let root = scene.root();
    let mut attached = HashSet::new();
    if let Some(top) = children_of.get(&0) {
        for &id in top {
            context.attach(&mut scene, root, id, &mut attached);
        }
    }

    // Models the connection table never reached still belong in the tree.
    for (id, _) in &models {
        if !attached.contains(id) {
            warn!(id, "model is not connected to the hierarchy, attaching to root");
            context.attach(&mut scene, root, *id, &mut attached);
        }
    }

    Ok(scene)
}

struct ModelRecord {
    name: String,
    transform: Transform,
}

struct Assembly<'a> {
    geometries: &'a HashMap<i64, Mesh>,
    models: &'a [(i64, ModelRecord)],
    model_index: &'a HashMap<i64, usize>,
    children_of: &'a HashMap<i64, Vec<i64>>,
    mesh_for_model: &'a HashMap<i64, i64>,
}

impl Assembly<'_> {
    fn attach(&self, scene: &mut Scene, parent: NodeId, id: i64, attached: &mut HashSet<i64>) {
        if !attached.insert(id) {
            warn!(id, "model reached twice through connections, skipping repeat");
            return;
        }
        let record = &self.models[self.model_index[&id]].1;

        let mut node = Node::new(record.name.clone()).with_transform(record.transform);
        if let Some(geo_id) = self.mesh_for_model.get(&id) {
            match self.geometries.get(geo_id) {
                Some(mesh) => node = node.with_mesh(mesh.clone()),
                None => warn!(id, geo_id, "model references missing geometry"),
            }
        }

        let node_id = scene.add_node(parent, node);
        if let Some(children) = self.children_of.get(&id) {
            for &child in children {
                self.attach(scene, node_id, child, attached);
            }
        }
    }
}

fn object_id(node: &RawNode) -> Result<i64, ImportError> {
    node.properties
        .first()
        .and_then(Property::as_i64)
        .ok_or_else(|| ImportError::Malformed(format!("{} record without object id", node.name)))
}

/// Display name of an object: the part before the `\0\x01Class` suffix.
fn display_name(node: &RawNode) -> String {
    node.properties
        .get(1)
        .and_then(Property::as_str)
        .and_then(|raw| raw.split('\u{0}').next())
        .unwrap_or("")
        .to_string()
}

fn lower_geometry(node: &RawNode) -> Result<(i64, Mesh), ImportError> {
    let id = object_id(node)?;

    let vertices = node
        .child("Vertices")
        .and_then(|n| n.properties.first())
        .and_then(Property::as_f64_array)
        .ok_or_else(|| ImportError::Malformed(format!("geometry {id} without vertices")))?;
    if vertices.len() % 3 != 0 {
        return Err(ImportError::Malformed(format!(
            "geometry {id} vertex array length {} is not a multiple of 3",
            vertices.len()
        )));
    }
    let positions: Vec<DVec3> = vertices
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect();

    let indices = node
        .child("PolygonVertexIndex")
        .and_then(|n| n.properties.first())
        .and_then(Property::as_i32_array)
        .unwrap_or(&[]);
    let polygons = decode_polygons(id, indices, positions.len())?;

    let normals = node
        .child("LayerElementNormal")
        .and_then(|layer| lower_normals(id, layer, &polygons));

    Ok((
        id,
        Mesh {
            positions,
            polygons,
            normals,
        },
    ))
}

/// Polygon index runs are closed by a negative index holding the bitwise
/// NOT of the final vertex.
fn decode_polygons(
    id: i64,
    indices: &[i32],
    vertex_count: usize,
) -> Result<Vec<Vec<u32>>, ImportError> {
    let mut polygons = Vec::new();
    let mut current = Vec::new();
    for &raw in indices {
        let index = if raw < 0 { !raw } else { raw } as u32;
        if index as usize >= vertex_count {
            return Err(ImportError::Malformed(format!(
                "geometry {id} polygon index {index} out of {vertex_count} vertices"
            )));
        }
        current.push(index);
        if raw < 0 {
            polygons.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        warn!(id, "dropping unterminated trailing polygon");
    }
    Ok(polygons)
}

/// Normals in `Direct` reference mode with `ByPolygonVertex` or
/// `ByVertice` mapping; everything else is skipped with a warning.
fn lower_normals(id: i64, layer: &RawNode, polygons: &[Vec<u32>]) -> Option<Vec<DVec3>> {
    let mapping = layer
        .child("MappingInformationType")
        .and_then(|n| n.properties.first())
        .and_then(Property::as_str)
        .unwrap_or("");
    let reference = layer
        .child("ReferenceInformationType")
        .and_then(|n| n.properties.first())
        .and_then(Property::as_str)
        .unwrap_or("Direct");
    if reference != "Direct" {
        warn!(id, reference, "unsupported normal reference mode, skipping normals");
        return None;
    }

    let raw = layer
        .child("Normals")
        .and_then(|n| n.properties.first())
        .and_then(Property::as_f64_array)?;
    if raw.len() % 3 != 0 {
        warn!(id, "normal array length is not a multiple of 3, skipping normals");
        return None;
    }
    let normals: Vec<DVec3> = raw
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect();

    let polygon_vertex_count: usize = polygons.iter().map(|p| p.len()).sum();
    match mapping {
        "ByPolygonVertex" => {
            if normals.len() != polygon_vertex_count {
                warn!(id, "normal count does not match polygon vertices, skipping normals");
                return None;
            }
            Some(normals)
        }
        // Per control point: expand into polygon-vertex order.
        "ByVertice" | "ByVertex" => {
            let mut expanded = Vec::with_capacity(polygon_vertex_count);
            for polygon in polygons {
                for &index in polygon {
                    expanded.push(*normals.get(index as usize)?);
                }
            }
            Some(expanded)
        }
        other => {
            warn!(id, mapping = other, "unsupported normal mapping, skipping normals");
            None
        }
    }
}

fn lower_model(node: &RawNode) -> Result<(i64, ModelRecord), ImportError> {
    let id = object_id(node)?;
    let name = display_name(node);

    let mut transform = Transform::default();
    if let Some(properties) = node.child("Properties70") {
        for p in properties.children_named("P") {
            let Some(kind) = p.properties.first().and_then(Property::as_str) else {
                continue;
            };
            let Some(values) = read_vec3(p) else {
                warn!(id, kind, "local transform property without three values");
                continue;
            };
            match kind {
                "Lcl Translation" => transform.translation = values,
                "Lcl Rotation" => transform.rotation_deg = values,
                "Lcl Scaling" => transform.scale = values,
                _ => {}
            }
        }
    }

    Ok((id, ModelRecord { name, transform }))
}

fn read_vec3(p: &RawNode) -> Option<DVec3> {
    let x = p.properties.get(4).and_then(Property::as_f64)?;
    let y = p.properties.get(5).and_then(Property::as_f64)?;
    let z = p.properties.get(6).and_then(Property::as_f64)?;
    Some(DVec3::new(x, y, z))
}
