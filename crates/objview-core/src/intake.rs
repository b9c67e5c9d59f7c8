//! Drag-and-drop intake
//!
//! Only files whose declared media type is `model/obj` are accepted.

use crate::obj::ObjSource;

/// Media type of Wavefront OBJ files
pub const OBJ_MEDIA_TYPE: &str = "model/obj";

/// A file handed over by the UI shell
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub name: String,
    /// Declared media type (may be empty if the platform does not provide one)
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    /// Builds a dropped file, filling an empty media type from the extension.
    pub fn new(name: impl Into<String>, declared: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let media_type = media_type_for(&name, declared);
        Self {
            name,
            media_type,
            bytes: bytes.into(),
        }
    }
}

/// Intake errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Unsupported file '{name}' of type '{media_type}' (expected {OBJ_MEDIA_TYPE})")]
    UnsupportedMediaType { name: String, media_type: String },
}

/// Media type of a file: the declared one, or a guess from its extension.
pub fn media_type_for(name: &str, declared: &str) -> String {
    let declared = declared.trim();
    if !declared.is_empty() {
        return declared.to_string();
    }

    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "obj" => OBJ_MEDIA_TYPE.to_string(),
        _ => String::new(),
    }
}

/// Accepts a dropped file as an OBJ source or rejects it.
pub fn accept(file: DroppedFile) -> Result<ObjSource, IntakeError> {
    if file.media_type != OBJ_MEDIA_TYPE {
        return Err(IntakeError::UnsupportedMediaType {
            name: file.name,
            media_type: file.media_type,
        });
    }

    Ok(ObjSource::new(file.name, file.bytes))
}
