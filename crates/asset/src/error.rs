//! Resolution errors.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which entity a structural error was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Document,
    Buffer(usize),
    BufferView(usize),
    Accessor(usize),
    Primitive { mesh: usize, primitive: usize },
    Node(usize),
    Skin(usize),
    AnimationSampler { animation: usize, sampler: usize },
    AnimationChannel { animation: usize, channel: usize },
    Scene(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Buffer(i) => write!(f, "buffer {i}"),
            Self::BufferView(i) => write!(f, "buffer view {i}"),
            Self::Accessor(i) => write!(f, "accessor {i}"),
            Self::Primitive { mesh, primitive } => write!(f, "mesh {mesh} primitive {primitive}"),
            Self::Node(i) => write!(f, "node {i}"),
            Self::Skin(i) => write!(f, "skin {i}"),
            Self::AnimationSampler { animation, sampler } => {
                write!(f, "animation {animation} sampler {sampler}")
            }
            Self::AnimationChannel { animation, channel } => {
                write!(f, "animation {animation} channel {channel}")
            }
            Self::Scene(i) => write!(f, "scene {i}"),
        }
    }
}

/// Coarse classification, used to tell lenient outcomes from fatal ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Buffer bytes could not be read. Fatal.
    Io,
    /// Buffer shorter than declared; data was zero-padded. Not fatal.
    ShortBuffer,
    /// Bad index, unknown enumeration code or out-of-bounds byte range. Fatal.
    Structural,
}

/// A buffer held fewer bytes than its declared `byteLength`.
///
/// The resolved buffer still has the declared length, with the missing tail
/// filled with zeros.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("buffer {buffer} ('{uri}') is shorter than declared: expected {expected} bytes, got {actual}")]
pub struct ShortBufferError {
    pub buffer: usize,
    pub uri: String,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("buffer {buffer} has no uri; embedded binary chunks are not supported")]
    MissingUri { buffer: usize },

    #[error("no search path to look up buffer {buffer} ('{uri}')")]
    NoSearchPath { buffer: usize, uri: String },

    #[error("failed to read buffer {buffer} ('{uri}')")]
    Io {
        buffer: usize,
        uri: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    ShortBuffer(#[from] ShortBufferError),

    #[error("{entity}: {field} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        entity: EntityRef,
        field: String,
        index: usize,
        len: usize,
    },

    #[error("{entity}: unknown component type {code}")]
    UnknownComponentType { entity: EntityRef, code: u32 },

    #[error("{entity}: component type {code} cannot hold indices")]
    InvalidIndexType { entity: EntityRef, code: u32 },

    #[error("{entity}: unknown element type '{tag}'")]
    UnknownElementType { entity: EntityRef, tag: String },

    #[error("{entity}: unknown buffer view target {code}")]
    UnknownTarget { entity: EntityRef, code: u32 },

    #[error("{entity}: unknown primitive mode {code}")]
    UnknownMode { entity: EntityRef, code: u32 },

    #[error(
        "buffer view {view}: bytes {offset}..+{length} exceed buffer {buffer} of {buffer_length} bytes"
    )]
    BufferViewOutOfBounds {
        view: usize,
        buffer: usize,
        offset: usize,
        length: usize,
        buffer_length: usize,
    },

    #[error("{entity}: needs {required} bytes of buffer view {view}, which has {available}")]
    AccessorOutOfBounds {
        entity: EntityRef,
        view: usize,
        required: usize,
        available: usize,
    },

    #[error("{entity}: sparse count {sparse} exceeds accessor count {count}")]
    SparseCountTooLarge {
        entity: EntityRef,
        sparse: usize,
        count: usize,
    },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingUri { .. } | Self::NoSearchPath { .. } | Self::Io { .. } => ErrorKind::Io,
            Self::ShortBuffer(_) => ErrorKind::ShortBuffer,
            Self::IndexOutOfRange { .. }
            | Self::UnknownComponentType { .. }
            | Self::InvalidIndexType { .. }
            | Self::UnknownElementType { .. }
            | Self::UnknownTarget { .. }
            | Self::UnknownMode { .. }
            | Self::BufferViewOutOfBounds { .. }
            | Self::AccessorOutOfBounds { .. }
            | Self::SparseCountTooLarge { .. } => ErrorKind::Structural,
        }
    }

    pub(crate) fn out_of_range(
        entity: EntityRef,
        field: impl Into<String>,
        index: usize,
        len: usize,
    ) -> Self {
        Self::IndexOutOfRange {
            entity,
            field: field.into(),
            index,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_entity_field_and_index() {
        let err = ResolveError::out_of_range(EntityRef::Node(3), "children", 9, 4);
        assert_eq!(err.to_string(), "node 3: children index 9 is out of range (len 4)");
        assert_eq!(err.kind(), ErrorKind::Structural);

        let entity = EntityRef::Primitive { mesh: 1, primitive: 0 };
        let err = ResolveError::out_of_range(entity, "attributes.POSITION", 7, 2);
        assert!(err.to_string().starts_with("mesh 1 primitive 0: attributes.POSITION"));
    }

    #[test]
    fn kinds_follow_the_failure_source() {
        let short = ShortBufferError {
            buffer: 0,
            uri: "a.bin".into(),
            expected: 36,
            actual: 20,
        };
        let err = ResolveError::from(short);
        assert_eq!(err.kind(), ErrorKind::ShortBuffer);
        assert!(err.to_string().contains("expected 36 bytes, got 20"));

        let io = ResolveError::Io {
            buffer: 0,
            uri: "a.bin".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(io.kind(), ErrorKind::Io);

        let sparse = ResolveError::SparseCountTooLarge {
            entity: EntityRef::Accessor(2),
            sparse: 9,
            count: 4,
        };
        assert_eq!(sparse.kind(), ErrorKind::Structural);
        assert_eq!(sparse.to_string(), "accessor 2: sparse count 9 exceeds accessor count 4");
    }
}
