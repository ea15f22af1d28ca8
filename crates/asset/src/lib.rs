//! glTF asset loading and reference resolution.
//!
//! [`load`] turns JSON into a raw, index-based [`Gltf`]. [`resolve()`] reads
//! its buffers and links every index into a [`ResolvedGltf`].

pub mod document;
pub mod error;
pub mod graph;
pub mod load;
pub mod materialize;
pub mod resolve;
pub mod semantic;
pub mod source;
pub mod types;

pub use document::Gltf;
pub use error::{EntityRef, ErrorKind, ResolveError, ShortBufferError};
pub use graph::{PartialGltf, ResolvedGltf, Stage};
pub use load::{LoadError, LoadOptions};
pub use resolve::{PartialResolve, resolve, resolve_with_source};
pub use semantic::Semantic;
pub use source::{BufferSource, FileSource};
