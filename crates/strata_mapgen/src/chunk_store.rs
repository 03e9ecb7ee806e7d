//! # Persisted Chunks
//!
//! Generated chunks are saved as a small header followed by an LZ4 body.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "STRC"
//! 4       1     format version
//! 5       12    area min edge, 3 x i32 LE
//! 17      12    area max edge, 3 x i32 LE
//! 29      4     heightmap length, u32 LE
//! 33      ..    lz4 (size prepended): MapNode array, then heightmap as i16 LE
//! ```
//!
//! Decoding never truncates: a short, mis-sized or foreign blob is
//! [`MapgenError::CorruptChunk`], a newer format is
//! [`MapgenError::UnsupportedVersion`].

use std::io::{Read, Write};
use std::path::Path;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use strata_core::{MapNode, Vec3i, VoxelArea, VoxelBuffer};

use crate::error::{MapgenError, MapgenResult};
use crate::mapgen::ChunkResult;

/// File magic.
pub const CHUNK_MAGIC: [u8; 4] = *b"STRC";

/// Newest format this build reads and the one it writes.
pub const CHUNK_FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 12 + 12 + 4;

/// A decoded chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredChunk {
    /// Box the nodes cover.
    pub area: VoxelArea,
    /// Nodes in area index order.
    pub nodes: Vec<MapNode>,
    /// Surface Y per column.
    pub heightmap: Vec<i16>,
}

impl StoredChunk {
    /// Rebuilds a voxel buffer. Every cell counts as holding data.
    ///
    /// # Errors
    ///
    /// [`MapgenError::CorruptChunk`] if the node count does not match the area.
    pub fn into_buffer(self) -> MapgenResult<VoxelBuffer> {
        let flags = vec![0; self.nodes.len()];
        VoxelBuffer::from_parts(self.area, self.nodes, flags).map_err(|e| MapgenError::CorruptChunk(e.to_string()))
    }
}

/// Serializes a generated chunk.
#[must_use]
pub fn encode_chunk(chunk: &ChunkResult) -> Vec<u8> {
    let area = chunk.buffer.area();
    let node_bytes = bytemuck::cast_slice::<MapNode, u8>(chunk.buffer.nodes());

    let mut body = Vec::with_capacity(node_bytes.len() + chunk.heightmap.len() * 2);
    body.extend_from_slice(node_bytes);
    for h in &chunk.heightmap {
        body.extend_from_slice(&h.to_le_bytes());
    }
    let compressed = compress_prepend_size(&body);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    out.push(CHUNK_FORMAT_VERSION);
    for v in [area.min_edge, area.max_edge] {
        out.extend_from_slice(&v.x.to_le_bytes());
        out.extend_from_slice(&v.y.to_le_bytes());
        out.extend_from_slice(&v.z.to_le_bytes());
    }
    out.extend_from_slice(&u32::try_from(chunk.heightmap.len()).unwrap_or(u32::MAX).to_le_bytes());
    out.extend_from_slice(&compressed);
    out
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_vec3(data: &[u8], at: usize) -> Vec3i {
    Vec3i::new(read_i32(data, at), read_i32(data, at + 4), read_i32(data, at + 8))
}

/// Parses a serialized chunk.
///
/// # Errors
///
/// - [`MapgenError::CorruptChunk`] for a wrong magic, a truncated header,
///   an inverted or oversized box, or a body that does not decompress to
///   the declared sizes
/// - [`MapgenError::UnsupportedVersion`] for a newer format
pub fn decode_chunk(data: &[u8]) -> MapgenResult<StoredChunk> {
    if data.len() < HEADER_LEN {
        return Err(MapgenError::CorruptChunk(format!(
            "{} bytes is shorter than the {HEADER_LEN}-byte header",
            data.len()
        )));
    }
    if data[..4] != CHUNK_MAGIC {
        return Err(MapgenError::CorruptChunk("bad magic".to_owned()));
    }
    let version = data[4];
    if version > CHUNK_FORMAT_VERSION {
        return Err(MapgenError::UnsupportedVersion {
            found: version,
            supported: CHUNK_FORMAT_VERSION,
        });
    }

    let area = VoxelArea::new(read_vec3(data, 5), read_vec3(data, 17));
    let heightmap_len = u32::from_le_bytes([data[29], data[30], data[31], data[32]]) as usize;

    let node_len = area
        .checked_volume()
        .and_then(|volume| volume.checked_mul(std::mem::size_of::<MapNode>()))
        .ok_or_else(|| MapgenError::CorruptChunk(format!("area {}..{} is not a valid box", area.min_edge, area.max_edge)))?;
    let expected = heightmap_len
        .checked_mul(2)
        .and_then(|h| h.checked_add(node_len))
        .ok_or_else(|| MapgenError::CorruptChunk("declared sizes overflow".to_owned()))?;

    // The body's own size prefix must agree before anything is allocated
    let compressed = &data[HEADER_LEN..];
    if compressed.len() < 4 {
        return Err(MapgenError::CorruptChunk("missing body".to_owned()));
    }
    let declared = u32::from_le_bytes([compressed[0], compressed[1], compressed[2], compressed[3]]) as usize;
    if declared != expected {
        return Err(MapgenError::CorruptChunk(format!(
            "body declares {declared} bytes, header needs {expected}"
        )));
    }

    let body = decompress_size_prepended(compressed).map_err(|e| MapgenError::CorruptChunk(e.to_string()))?;
    if body.len() != expected {
        return Err(MapgenError::CorruptChunk(format!(
            "body is {} bytes, area {area} needs {expected}",
            body.len()
        )));
    }

    let node_size = std::mem::size_of::<MapNode>();
    let nodes = body[..node_len]
        .chunks_exact(node_size)
        .map(bytemuck::pod_read_unaligned::<MapNode>)
        .collect();
    let heightmap = body[node_len..]
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(StoredChunk { area, nodes, heightmap })
}

/// Writes a chunk to `path`.
///
/// # Errors
///
/// [`MapgenError::Io`] if the file cannot be written.
pub fn save_chunk(path: &Path, chunk: &ChunkResult) -> MapgenResult<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(&encode_chunk(chunk))?;
    Ok(())
}

/// Reads a chunk from `path`.
///
/// # Errors
///
/// [`MapgenError::Io`] if the file cannot be read, otherwise as
/// [`decode_chunk`].
pub fn load_chunk(path: &Path) -> MapgenResult<StoredChunk> {
    let mut data = Vec::new();
    std::fs::File::open(path)?.read_to_end(&mut data)?;
    decode_chunk(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::ChunkRequest;

    fn sample() -> ChunkResult {
        let area = VoxelArea::new(Vec3i::new(-2, -2, -2), Vec3i::new(1, 1, 1));
        let mut buffer = VoxelBuffer::with_area(area);
        buffer.fill_area(&area, MapNode::AIR);
        buffer.set(Vec3i::new(0, -1, 0), MapNode::with_params(7, 3, 9));
        ChunkResult {
            request: ChunkRequest::new(Vec3i::ZERO, 1, 0),
            buffer,
            heightmap: vec![-1, 0, 5, -300],
            biomemap: Vec::new(),
            ground_level: 5,
        }
    }

    #[test]
    fn test_encode_decode() {
        let chunk = sample();
        let stored = decode_chunk(&encode_chunk(&chunk)).unwrap();
        assert_eq!(stored.area, *chunk.buffer.area());
        assert_eq!(stored.nodes, chunk.buffer.nodes());
        assert_eq!(stored.heightmap, chunk.heightmap);

        let buffer = stored.into_buffer().unwrap();
        assert_eq!(buffer.get(Vec3i::new(0, -1, 0)), MapNode::with_params(7, 3, 9));
        assert!(buffer.flags().iter().all(|&f| f == 0));
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_chunk(&sample());
        assert_eq!(&bytes[..4], b"STRC");
        assert_eq!(bytes[4], CHUNK_FORMAT_VERSION);
        assert_eq!(read_i32(&bytes, 5), -2);
        assert_eq!(read_i32(&bytes, 17), 1);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode_chunk(&sample());
        bytes[0] = b'X';
        assert!(matches!(decode_chunk(&bytes), Err(MapgenError::CorruptChunk(_))));
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut bytes = encode_chunk(&sample());
        bytes[4] = CHUNK_FORMAT_VERSION + 1;
        assert!(matches!(
            decode_chunk(&bytes),
            Err(MapgenError::UnsupportedVersion { found, supported })
                if found == CHUNK_FORMAT_VERSION + 1 && supported == CHUNK_FORMAT_VERSION
        ));
    }

    #[test]
    fn test_truncation_is_an_error() {
        let bytes = encode_chunk(&sample());
        assert!(matches!(decode_chunk(&bytes[..10]), Err(MapgenError::CorruptChunk(_))));
        assert!(matches!(
            decode_chunk(&bytes[..bytes.len() - 3]),
            Err(MapgenError::CorruptChunk(_))
        ));
    }

    #[test]
    fn test_area_mismatch_is_an_error() {
        let mut bytes = encode_chunk(&sample());
        // Claim a larger box than the body holds
        bytes[17..21].copy_from_slice(&5i32.to_le_bytes());
        assert!(matches!(decode_chunk(&bytes), Err(MapgenError::CorruptChunk(_))));
    }

    #[test]
    fn test_hostile_box_is_an_error() {
        let mut bytes = encode_chunk(&sample());
        for at in [5, 9, 13] {
            bytes[at..at + 4].copy_from_slice(&i32::MIN.to_le_bytes());
        }
        for at in [17, 21, 25] {
            bytes[at..at + 4].copy_from_slice(&i32::MAX.to_le_bytes());
        }
        assert!(matches!(decode_chunk(&bytes), Err(MapgenError::CorruptChunk(_))));
    }

    #[test]
    fn test_inverted_box_is_an_error() {
        let mut bytes = encode_chunk(&sample());
        bytes[5..9].copy_from_slice(&7i32.to_le_bytes());
        assert!(matches!(decode_chunk(&bytes), Err(MapgenError::CorruptChunk(_))));
    }

    #[test]
    fn test_oversized_body_prefix_is_an_error() {
        let mut bytes = encode_chunk(&sample());
        bytes[HEADER_LEN..HEADER_LEN + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode_chunk(&bytes), Err(MapgenError::CorruptChunk(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("strata_chunk_{}.bin", std::process::id()));
        let chunk = sample();
        save_chunk(&path, &chunk).unwrap();
        let stored = load_chunk(&path).unwrap();
        assert_eq!(stored.nodes, chunk.buffer.nodes());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("strata_chunk_does_not_exist.bin");
        assert!(matches!(load_chunk(&path), Err(MapgenError::Io(_))));
    }
}
