//! Wavefront OBJ parsing
//!
//! Parsing is delegated to `tobj`; this module turns its models into
//! per-object triangle meshes with per-vertex normals.

use std::io::{BufReader, Cursor};

use crate::scene::compute_vertex_normals;

/// Raw OBJ file supplied by the user.
#[derive(Debug, Clone)]
pub struct ObjSource {
    /// File name as dropped or opened
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ObjSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name without directories and extension
    pub fn stem(&self) -> &str {
        let file = self.name.rsplit(['/', '\\']).next().unwrap_or(self.name.as_str());
        match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        }
    }
}

/// One OBJ object/group converted to an indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct ParsedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Errors that can occur while loading an element
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to parse OBJ '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("Empty mesh: '{0}' contains no triangles")]
    EmptyMesh(String),

    #[error("Element was already loaded")]
    AlreadyLoaded,
}

/// Parses OBJ bytes into triangle meshes, one per OBJ object.
///
/// Material libraries are not resolved; `mtllib` statements are ignored.
pub fn parse_obj(source: &ObjSource) -> Result<Vec<ParsedMesh>, LoadError> {
    let mut reader = BufReader::new(Cursor::new(source.bytes.as_slice()));

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj_buf(&mut reader, &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| LoadError::Parse {
        name: source.name.clone(),
        reason: e.to_string(),
    })?;

    let meshes: Vec<ParsedMesh> = models
        .into_iter()
        .filter(|model| model.mesh.indices.len() >= 3)
        .map(|model| {
            let mesh = model.mesh;
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();

            // Triangle list indices only; a trailing partial triangle is dropped
            let mut indices = mesh.indices;
            indices.truncate(indices.len() - indices.len() % 3);

            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            } else {
                compute_vertex_normals(&positions, &indices)
            };

            ParsedMesh {
                name: model.name,
                positions,
                normals,
                indices,
            }
        })
        .collect();

    if meshes.is_empty() {
        return Err(LoadError::EmptyMesh(source.name.clone()));
    }

    let triangles: usize = meshes.iter().map(|m| m.indices.len() / 3).sum();
    tracing::debug!(
        "Parsed '{}': {} objects, {} triangles",
        source.name,
        meshes.len(),
        triangles
    );

    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    const TWO_OBJECTS: &str = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 4 5 6 7
";

    #[test]
    fn test_parse_single_triangle() {
        let meshes = parse_obj(&ObjSource::new("tri.obj", TRIANGLE)).unwrap();

        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].positions.len(), 3);
        assert_eq!(meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(meshes[0].normals.len(), 3);
    }

    #[test]
    fn test_objects_become_separate_meshes() {
        let meshes = parse_obj(&ObjSource::new("two.obj", TWO_OBJECTS)).unwrap();

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name, "first");
        // Quad is triangulated
        assert_eq!(meshes[1].indices.len(), 6);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = parse_obj(&ObjSource::new("empty.obj", "")).unwrap_err();
        assert!(matches!(err, LoadError::EmptyMesh(_)));
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        assert!(parse_obj(&ObjSource::new("junk.obj", "this is not geometry\n")).is_err());
        assert!(parse_obj(&ObjSource::new("bin.obj", vec![0xFF, 0xFE, 0x00, 0x9F])).is_err());
    }

    #[test]
    fn test_stem() {
        assert_eq!(ObjSource::new("models/teapot.obj", "").stem(), "teapot");
        assert_eq!(ObjSource::new("C:\\a\\b.obj", "").stem(), "b");
        assert_eq!(ObjSource::new(".hidden", "").stem(), ".hidden");
    }
}
