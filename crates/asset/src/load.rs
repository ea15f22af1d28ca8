//! Reading glTF JSON into a raw [`Gltf`] document.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::Gltf;
use crate::source::DEFAULT_SOFT_LIMIT;

#[derive(Clone, Copy, Debug)]
pub struct LoadOptions {
    /// Documents above this many bytes are rejected before parsing.
    pub max_bytes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_SOFT_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open glTF document {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read glTF document")]
    Read(#[source] io::Error),

    #[error("glTF document exceeds the {limit} byte soft limit")]
    TooLarge { limit: u64 },

    #[error("failed to parse glTF JSON")]
    Json(#[from] serde_json::Error),
}

/// Parse a document held in memory. No size limit is applied.
pub fn from_slice(bytes: &[u8]) -> Result<Gltf, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Gltf, LoadError> {
    let mut bytes = Vec::new();
    // One byte past the limit tells "exactly at" from "above".
    reader
        .take(options.max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(LoadError::Read)?;
    if bytes.len() as u64 > options.max_bytes {
        return Err(LoadError::TooLarge {
            limit: options.max_bytes,
        });
    }
    from_slice(&bytes)
}

/// Load a `.gltf` file. Its directory becomes the document's default
/// search path for buffer URIs.
pub fn from_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Gltf, LoadError> {
    let path = path.as_ref();
    let open_err = |source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_err)?;
    let size = file.metadata().map_err(open_err)?.len();
    if size > options.max_bytes {
        return Err(LoadError::TooLarge {
            limit: options.max_bytes,
        });
    }
    log::info!("Loading glTF document {:?} ({} bytes)", path, size);

    let document = from_reader(file, options)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(document.with_source_dir(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{ "asset": { "version": "2.0" }, "nodes": [ {}, { "children": [0] } ] }"#;

    #[test]
    fn from_slice_parses() {
        let doc = from_slice(DOC.as_bytes()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert!(doc.source_dir().is_none());
    }

    #[test]
    fn json_errors_pass_through() {
        let err = from_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn reader_respects_soft_limit() {
        let options = LoadOptions { max_bytes: 10 };
        let err = from_reader(DOC.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { limit: 10 }));

        let exact = LoadOptions {
            max_bytes: DOC.len() as u64,
        };
        assert!(from_reader(DOC.as_bytes(), &exact).is_ok());
    }

    #[test]
    fn from_path_records_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        std::fs::write(&path, DOC).unwrap();

        let doc = from_path(&path, &LoadOptions::default()).unwrap();
        assert_eq!(doc.source_dir(), Some(dir.path()));

        let err = from_path(&path, &LoadOptions { max_bytes: 4 }).unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { .. }));
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = from_path("does/not/exist.gltf", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
