//! Low-level binary FBX reader.
//!
//! Parses the node-record tree of a binary FBX file without interpreting
//! it: records are `(name, properties, children)` triples, properties are
//! typed scalars, arrays (optionally zlib-deflated), strings, or raw bytes.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use meshport_core::import::ImportError;
use std::io::{Cursor, Read};

/// Binary FBX file signature, including the trailing NUL.
pub const MAGIC: &[u8] = b"Kaydara FBX Binary  \x00";

/// Lowest file version this reader understands (FBX 2011).
pub const SUPPORTED_MIN_VERSION: u32 = 7100;
/// Highest file version this reader understands (FBX 2016+).
pub const SUPPORTED_MAX_VERSION: u32 = 7500;

/// Node record headers switch from 32-bit to 64-bit fields at this version.
const LONG_OFFSETS_FROM: u32 = 7500;

/// Two reserved bytes between the magic and the version field.
const HEADER_PAD: usize = 2;

/// Check the leading bytes of a file for the binary FBX signature.
pub fn is_binary_fbx(header: &[u8]) -> bool {
    header.len() >= MAGIC.len() && &header[..MAGIC.len()] == MAGIC
}

/// A typed property of a node record.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    String(String),
    Raw(Vec<u8>),
}

impl Property {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Property::I16(v) => Some(i64::from(*v)),
            Property::I32(v) => Some(i64::from(*v)),
            Property::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Property::F32(v) => Some(f64::from(*v)),
            Property::F64(v) => Some(*v),
            Property::I16(v) => Some(f64::from(*v)),
            Property::I32(v) => Some(f64::from(*v)),
            Property::I64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64_array(&self) -> Option<&[f64]> {
        match self {
            Property::F64Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32_array(&self) -> Option<&[i32]> {
        match self {
            Property::I32Array(v) => Some(v),
            _ => None,
        }
    }
}

/// One node record: name, property list, nested records.
#[derive(Debug, Clone, Default)]
pub struct RawNode {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&RawNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parsed record tree of one binary FBX file.
#[derive(Debug, Clone)]
pub struct FbxTree {
    pub version: u32,
    pub nodes: Vec<RawNode>,
}

impl FbxTree {
    /// Find a top-level record by name.
    pub fn find(&self, name: &str) -> Option<&RawNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Parse a whole binary FBX byte buffer into a record tree.
pub fn parse(data: &[u8]) -> Result<FbxTree, ImportError> {
    if !is_binary_fbx(data) {
        return Err(ImportError::UnrecognizedFormat);
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position((MAGIC.len() + HEADER_PAD) as u64);
    let version = cursor.read_u32::<LittleEndian>()?;
    if !(SUPPORTED_MIN_VERSION..=SUPPORTED_MAX_VERSION).contains(&version) {
        return Err(ImportError::UnsupportedVersion {
            found: version,
            supported_min: SUPPORTED_MIN_VERSION,
            supported_max: SUPPORTED_MAX_VERSION,
        });
    }
    let long_offsets = version >= LONG_OFFSETS_FROM;

    let mut nodes = Vec::new();
    while let Some(node) = read_node(&mut cursor, data.len() as u64, long_offsets)? {
        nodes.push(node);
    }
    Ok(FbxTree { version, nodes })
}

struct RecordHeader {
    end_offset: u64,
    num_properties: u64,
    name_len: u8,
}

impl RecordHeader {
    fn size(long_offsets: bool) -> u64 {
        if long_offsets {
            25
        } else {
            13
        }
    }

    fn is_null(&self) -> bool {
        self.end_offset == 0 && self.num_properties == 0 && self.name_len == 0
    }
}

fn read_header(
    cursor: &mut Cursor<&[u8]>,
    long_offsets: bool,
) -> Result<RecordHeader, ImportError> {
    if long_offsets {
        let end_offset = cursor.read_u64::<LittleEndian>()?;
        let num_properties = cursor.read_u64::<LittleEndian>()?;
        let _property_list_len = cursor.read_u64::<LittleEndian>()?;
        let name_len = cursor.read_u8()?;
        Ok(RecordHeader {
            end_offset,
            num_properties,
            name_len,
        })
    } else {
        let end_offset = u64::from(cursor.read_u32::<LittleEndian>()?);
        let num_properties = u64::from(cursor.read_u32::<LittleEndian>()?);
        let _property_list_len = cursor.read_u32::<LittleEndian>()?;
        let name_len = cursor.read_u8()?;
        Ok(RecordHeader {
            end_offset,
            num_properties,
            name_len,
        })
    }
}

/// Read one node record ending at or before `limit`. Returns `None` on a
/// null (terminator) record or when too few bytes remain for a header,
/// which tolerates the footer padding after the top-level record list.
fn read_node(
    cursor: &mut Cursor<&[u8]>,
    limit: u64,
    long_offsets: bool,
) -> Result<Option<RawNode>, ImportError> {
    if cursor.position() + RecordHeader::size(long_offsets) > limit {
        return Ok(None);
    }

    let header = read_header(cursor, long_offsets)?;
    if header.is_null() {
        return Ok(None);
    }
    if header.end_offset > limit {
        return Err(ImportError::Malformed(format!(
            "node record claims end offset {} past limit {}",
            header.end_offset, limit
        )));
    }
    if header.end_offset < cursor.position() {
        return Err(ImportError::Malformed(format!(
            "node record end offset {} precedes its own header",
            header.end_offset
        )));
    }

    let mut name_buf = vec![0u8; header.name_len as usize];
    cursor.read_exact(&mut name_buf)?;
    let name = String::from_utf8_lossy(&name_buf).into_owned();

    let mut properties = Vec::new();
    for _ in 0..header.num_properties {
        properties.push(read_property(cursor)?);
    }

    let mut children = Vec::new();
    while cursor.position() < header.end_offset {
        match read_node(cursor, header.end_offset, long_offsets)? {
            Some(child) => children.push(child),
            None => break,
        }
    }
    cursor.set_position(header.end_offset);

    Ok(Some(RawNode {
        name,
        properties,
        children,
    }))
}

fn read_property(cursor: &mut Cursor<&[u8]>) -> Result<Property, ImportError> {
    let code = cursor.read_u8()?;
    let property = match code {
        b'Y' => Property::I16(cursor.read_i16::<LittleEndian>()?),
        b'C' => Property::Bool(cursor.read_u8()? & 1 == 1),
        b'I' => Property::I32(cursor.read_i32::<LittleEndian>()?),
        b'F' => Property::F32(cursor.read_f32::<LittleEndian>()?),
        b'D' => Property::F64(cursor.read_f64::<LittleEndian>()?),
        b'L' => Property::I64(cursor.read_i64::<LittleEndian>()?),
        b'b' => {
            let bytes = read_array_bytes(cursor, 1)?;
            Property::BoolArray(bytes.iter().map(|b| b & 1 == 1).collect())
        }
        b'i' => {
            let bytes = read_array_bytes(cursor, 4)?;
            Property::I32Array(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            )
        }
        b'l' => {
            let bytes = read_array_bytes(cursor, 8)?;
            Property::I64Array(
                bytes
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            )
        }
        b'f' => {
            let bytes = read_array_bytes(cursor, 4)?;
            Property::F32Array(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            )
        }
        b'd' => {
            let bytes = read_array_bytes(cursor, 8)?;
            Property::F64Array(
                bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            )
        }
        b'S' => {
            let len = cursor.read_u32::<LittleEndian>()? as usize;
            let bytes = read_exact_checked(cursor, len)?;
            Property::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        b'R' => {
            let len = cursor.read_u32::<LittleEndian>()? as usize;
            Property::Raw(read_exact_checked(cursor, len)?)
        }
        other => {
            return Err(ImportError::Malformed(format!(
                "unknown property typecode 0x{other:02x}"
            )))
        }
    };
    Ok(property)
}

/// Read one array property payload, inflating it when encoding 1 (zlib).
fn read_array_bytes(cursor: &mut Cursor<&[u8]>, elem_size: usize) -> Result<Vec<u8>, ImportError> {
    let len = cursor.read_u32::<LittleEndian>()? as usize;
    let encoding = cursor.read_u32::<LittleEndian>()?;
    let compressed_len = cursor.read_u32::<LittleEndian>()? as usize;

    let expected = len
        .checked_mul(elem_size)
        .ok_or_else(|| ImportError::Malformed(format!("array length {len} overflows")))?;

    match encoding {
        0 => read_exact_checked(cursor, expected),
        1 => {
            let compressed = read_exact_checked(cursor, compressed_len)?;
            let mut inflated = Vec::with_capacity(expected);
            ZlibDecoder::new(compressed.as_slice())
                .read_to_end(&mut inflated)
                .map_err(|e| ImportError::Decompress(e.to_string()))?;
            if inflated.len() != expected {
                return Err(ImportError::Decompress(format!(
                    "inflated {} bytes, expected {expected}",
                    inflated.len()
                )));
            }
            Ok(inflated)
        }
        other => Err(ImportError::Malformed(format!(
            "unknown array encoding {other}"
        ))),
    }
}

fn read_exact_checked(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, ImportError> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if (len as u64) > remaining {
        return Err(ImportError::Malformed(format!(
            "record claims {len} bytes but only {remaining} remain"
        )));
    }
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}
