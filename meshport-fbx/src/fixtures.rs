//! Test-only binary FBX writer, used to build synthetic input files.

use crate::tree::{Property, RawNode, MAGIC};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// Serialize a record list as a binary FBX document.
pub fn document(version: u32, roots: &[RawNode]) -> Vec<u8> {
    document_with(version, roots, false)
}

/// Like [`document`], but zlib-deflates every array property.
pub fn document_compressed(version: u32, roots: &[RawNode]) -> Vec<u8> {
    document_with(version, roots, true)
}

fn document_with(version: u32, roots: &[RawNode], compress: bool) -> Vec<u8> {
    let long_offsets = version >= 7500;
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[0x1a, 0x00]);
    out.extend_from_slice(&version.to_le_bytes());
    for node in roots {
        write_node(&mut out, node, long_offsets, compress);
    }
    // Top-level terminator record, then a little footer padding.
    out.extend(std::iter::repeat(0u8).take(header_size(long_offsets)));
    out.extend_from_slice(&[0xf8; 16]);
    out
}

fn header_size(long_offsets: bool) -> usize {
    if long_offsets {
        25
    } else {
        13
    }
}

fn write_node(out: &mut Vec<u8>, node: &RawNode, long_offsets: bool, compress: bool) {
    let header_pos = out.len();
    out.extend(std::iter::repeat(0u8).take(header_size(long_offsets)));
    out.extend_from_slice(node.name.as_bytes());

    let props_start = out.len();
    for property in &node.properties {
        write_property(out, property, compress);
    }
    let property_list_len = out.len() - props_start;

    if !node.children.is_empty() {
        for child in &node.children {
            write_node(out, child, long_offsets, compress);
        }
        out.extend(std::iter::repeat(0u8).take(header_size(long_offsets)));
    }

    let end_offset = out.len() as u64;
    patch_header(
        out,
        header_pos,
        end_offset,
        node.properties.len() as u64,
        property_list_len as u64,
        node.name.len() as u8,
        long_offsets,
    );
}

fn patch_header(
    out: &mut [u8],
    pos: usize,
    end_offset: u64,
    num_properties: u64,
    property_list_len: u64,
    name_len: u8,
    long_offsets: bool,
) {
    if long_offsets {
        out[pos..pos + 8].copy_from_slice(&end_offset.to_le_bytes());
        out[pos + 8..pos + 16].copy_from_slice(&num_properties.to_le_bytes());
        out[pos + 16..pos + 24].copy_from_slice(&property_list_len.to_le_bytes());
        out[pos + 24] = name_len;
    } else {
        out[pos..pos + 4].copy_from_slice(&(end_offset as u32).to_le_bytes());
        out[pos + 4..pos + 8].copy_from_slice(&(num_properties as u32).to_le_bytes());
        out[pos + 8..pos + 12].copy_from_slice(&(property_list_len as u32).to_le_bytes());
        out[pos + 12] = name_len;
    }
}

fn write_property(out: &mut Vec<u8>, property: &Property, compress: bool) {
    match property {
        Property::I16(v) => {
            out.push(b'Y');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Property::Bool(v) => {
            out.push(b'C');
            out.push(u8::from(*v));
        }
        Property::I32(v) => {
            out.push(b'I');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Property::F32(v) => {
            out.push(b'F');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Property::F64(v) => {
            out.push(b'D');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Property::I64(v) => {
            out.push(b'L');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Property::String(s) => {
            out.push(b'S');
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Property::Raw(bytes) => {
            out.push(b'R');
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Property::I32Array(values) => {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            write_array(out, b'i', values.len(), &bytes, compress);
        }
        Property::I64Array(values) => {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            write_array(out, b'l', values.len(), &bytes, compress);
        }
        Property::F32Array(values) => {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            write_array(out, b'f', values.len(), &bytes, compress);
        }
        Property::F64Array(values) => {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            write_array(out, b'd', values.len(), &bytes, compress);
        }
        Property::BoolArray(values) => {
            let bytes: Vec<u8> = values.iter().map(|v| u8::from(*v)).collect();
            write_array(out, b'b', values.len(), &bytes, compress);
        }
    }
}

fn write_array(out: &mut Vec<u8>, code: u8, count: usize, bytes: &[u8], compress: bool) {
    out.push(code);
    out.extend_from_slice(&(count as u32).to_le_bytes());
    if compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        let deflated = encoder.finish().unwrap();
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(deflated.len() as u32).to_le_bytes());
        out.extend_from_slice(&deflated);
    } else {
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }
}

/// Object name in the FBX on-disk convention: `Name\0\x01Class`.
pub fn object_name(name: &str, class: &str) -> String {
    format!("{name}\u{0}\u{1}{class}")
}

/// A `Geometry` record with positions, one polygon index list, and
/// per-control-point normals.
pub fn geometry(id: i64, name: &str, positions: &[f64], indices: &[i32], normals: &[f64]) -> RawNode {
    let mut geometry = RawNode::new("Geometry");
    geometry.properties = vec![
        Property::I64(id),
        Property::String(object_name(name, "Geometry")),
        Property::String("Mesh".to_string()),
    ];

    let mut vertices = RawNode::new("Vertices");
    vertices.properties = vec![Property::F64Array(positions.to_vec())];
    geometry.children.push(vertices);

    let mut polygon_index = RawNode::new("PolygonVertexIndex");
    polygon_index.properties = vec![Property::I32Array(indices.to_vec())];
    geometry.children.push(polygon_index);

    if !normals.is_empty() {
        let mut layer = RawNode::new("LayerElementNormal");
        layer.properties = vec![Property::I32(0)];
        let mut mapping = RawNode::new("MappingInformationType");
        mapping.properties = vec![Property::String("ByVertice".to_string())];
        let mut reference = RawNode::new("ReferenceInformationType");
        reference.properties = vec![Property::String("Direct".to_string())];
        let mut normals_node = RawNode::new("Normals");
        normals_node.properties = vec![Property::F64Array(normals.to_vec())];
        layer.children = vec![mapping, reference, normals_node];
        geometry.children.push(layer);
    }

    geometry
}

/// A `Model` record of subclass `Mesh` with local TRS properties.
pub fn model(id: i64, name: &str, translation: [f64; 3], rotation: [f64; 3]) -> RawNode {
    let mut model = RawNode::new("Model");
    model.properties = vec![
        Property::I64(id),
        Property::String(object_name(name, "Model")),
        Property::String("Mesh".to_string()),
    ];

    let mut properties70 = RawNode::new("Properties70");
    properties70.children = vec![
        local_property("Lcl Translation", translation),
        local_property("Lcl Rotation", rotation),
        local_property("Lcl Scaling", [1.0, 1.0, 1.0]),
    ];
    model.children.push(properties70);
    model
}

fn local_property(name: &str, values: [f64; 3]) -> RawNode {
    let mut p = RawNode::new("P");
    p.properties = vec![
        Property::String(name.to_string()),
        Property::String(name.to_string()),
        Property::String(String::new()),
        Property::String("A".to_string()),
        Property::F64(values[0]),
        Property::F64(values[1]),
        Property::F64(values[2]),
    ];
    p
}

/// An `OO` connection record: `child` object id attached under `parent`.
pub fn connection(child: i64, parent: i64) -> RawNode {
    let mut c = RawNode::new("C");
    c.properties = vec![
        Property::String("OO".to_string()),
        Property::I64(child),
        Property::I64(parent),
    ];
    c
}

/// A complete small document: two mesh models under the root, one matching
/// the sidewalk naming rule and one unrecognized, plus an empty group node.
pub fn road_scene_document(version: u32) -> Vec<u8> {
    let quad_positions = [
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ];
    // Quad encoded with the closing index bitwise-NOTed.
    let quad_indices = [0, 1, 2, -4];
    let quad_normals = [
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    ];
    let tri_positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let tri_indices = [0, 1, -3];

    let mut objects = RawNode::new("Objects");
    objects.children = vec![
        geometry(100, "WalkGeo", &quad_positions, &quad_indices, &quad_normals),
        geometry(101, "BlockGeo", &tri_positions, &tri_indices, &[]),
        model(200, "Road_Sidewalk_01", [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        model(201, "Building_42", [5.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        model(202, "Group", [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
    ];

    let mut connections = RawNode::new("Connections");
    connections.children = vec![
        connection(100, 200),
        connection(101, 201),
        connection(202, 0),
        connection(200, 202),
        connection(201, 0),
    ];

    document(version, &[objects, connections])
}
