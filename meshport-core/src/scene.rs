//! In-memory scene model: a node hierarchy with meshes and shared materials.
//!
//! Nodes live in an arena owned by the [`Scene`]; parent/child links and
//! material assignments are ids into that arena, so many nodes can reference
//! one material instance.

use crate::material::SurfaceMaterial;
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Handle to a node stored in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Handle to a material stored in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(usize);

/// Local transform of a node: translation, XYZ Euler rotation (degrees),
/// and scale, composed as `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    /// Euler angles in degrees, applied about X first, then Y, then Z.
    pub rotation_deg: DVec3,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation_deg: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    /// Compose the local transform matrix. Rotation about X is applied
    /// first, matching the FBX `eEulerXYZ` order.
    pub fn matrix(&self) -> DMat4 {
        let (rx, ry, rz) = (
            self.rotation_deg.x.to_radians(),
            self.rotation_deg.y.to_radians(),
            self.rotation_deg.z.to_radians(),
        );
        let rotation =
            DMat4::from_rotation_z(rz) * DMat4::from_rotation_y(ry) * DMat4::from_rotation_x(rx);
        DMat4::from_translation(self.translation) * rotation * DMat4::from_scale(self.scale)
    }
}

/// Polygonal mesh data attached to a node.
///
/// Polygons are index lists into `positions` and may have any arity >= 3.
/// Normals, when present, are per polygon-vertex in flattened polygon order.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<DVec3>,
    pub polygons: Vec<Vec<u32>>,
    pub normals: Option<Vec<DVec3>>,
}

impl Mesh {
    /// Total number of polygon-vertices across all polygons.
    pub fn polygon_vertex_count(&self) -> usize {
        self.polygons.iter().map(|p| p.len()).sum()
    }
}

/// Single element of the scene hierarchy; may carry mesh data.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub material: Option<MaterialId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Hierarchical container of nodes loaded from a source scene file.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    nodes: Vec<Node>,
    materials: Vec<SurfaceMaterial>,
    root: NodeId,
}

impl Scene {
    /// Create a scene with an empty root node.
    pub fn new(name: impl Into<String>) -> Self {
        let root = Node::new("RootNode");
        Self {
            name: name.into(),
            nodes: vec![root],
            materials: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Append a node under `parent` and return its id.
    pub fn add_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_material(&mut self, material: SurfaceMaterial) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    pub fn material(&self, id: MaterialId) -> &SurfaceMaterial {
        &self.materials[id.0]
    }

    pub fn materials(&self) -> &[SurfaceMaterial] {
        &self.materials
    }

    /// Depth-first pre-order traversal over the whole hierarchy.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &Node)) {
        self.visit_from(self.root, &mut f);
    }

    fn visit_from(&self, id: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        let node = &self.nodes[id.0];
        f(id, node);
        for &child in &node.children {
            self.visit_from(child, f);
        }
    }

    /// Node ids in depth-first pre-order, for traversals that mutate nodes.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.visit(|id, _| order.push(id));
        order
    }

    /// World transform of a node: the product of local transforms from the
    /// root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> DMat4 {
        // Parent links are implicit; walk down from the root.
        let mut world = DMat4::IDENTITY;
        let mut path = Vec::new();
        if self.find_path(self.root, id, &mut path) {
            for nid in path {
                world *= self.nodes[nid.0].transform.matrix();
            }
        }
        world
    }

    fn find_path(&self, from: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
        path.push(from);
        if from == target {
            return true;
        }
        for &child in &self.nodes[from.0].children {
            if self.find_path(child, target, path) {
                return true;
            }
        }
        path.pop();
        false
    }
}
