//! Raw, index-referencing glTF document as deserialized from JSON.
//!
//! Every cross reference here is a plain `usize` into one of the top-level
//! arrays of [`Gltf`]. Nothing is validated at this level; see
//! [`crate::resolve`] for turning it into a linked graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use corelib::{Mat4, Quat, Transform, Vec3};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{Interpolation, TargetPath};

/// Extension objects keyed by extension name, kept as raw JSON.
pub type Extensions = Map<String, Value>;

/// Root object of a glTF asset.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gltf {
    pub asset: Asset,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,

    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Default scene, as an index into `scenes`.
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub skins: Vec<Skin>,

    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,

    /// Directory of the file this document was read from, if any.
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

impl Gltf {
    /// Default search location for relative buffer URIs.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: String,
    pub min_version: Option<String>,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// Location of the binary payload. Absent for GLB-embedded buffers.
    pub uri: Option<String>,
    pub byte_length: usize,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    /// Raw `target` code, checked during resolution.
    pub target: Option<u32>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    /// Raw `componentType` code, checked during resolution.
    pub component_type: u32,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    /// Raw `type` tag (`"SCALAR"`, `"VEC3"`, ...), checked during resolution.
    #[serde(rename = "type")]
    pub element_type: String,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    pub sparse: Option<Sparse>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Camera {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    pub perspective: Option<Perspective>,
    pub orthographic: Option<Orthographic>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perspective {
    pub aspect_ratio: Option<f32>,
    pub yfov: f32,
    /// Absent means an infinite projection.
    pub zfar: Option<f32>,
    pub znear: f32,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Orthographic {
    pub xmag: f32,
    pub ymag: f32,
    pub zfar: f32,
    pub znear: f32,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
    #[serde(default)]
    pub weights: Vec<f32>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Primitive {
    /// Semantic name to accessor index.
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    /// Absent means the default material.
    pub material: Option<usize>,
    /// Raw topology code, checked during resolution.
    pub mode: Option<u32>,
    /// Morph targets: semantic name to accessor index, one map per target.
    #[serde(default)]
    pub targets: Vec<BTreeMap<String, usize>>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Node {
    pub camera: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    pub skin: Option<usize>,
    pub matrix: Option<Mat4>,
    pub mesh: Option<usize>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub translation: Option<Vec3>,
    #[serde(default)]
    pub weights: Vec<f32>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

impl Node {
    /// Local transform. `matrix` wins over TRS when both are present.
    pub fn transform(&self) -> Transform {
        match self.matrix {
            Some(matrix) => Transform::from_matrix(matrix),
            None => Transform::from_trs(
                self.translation.unwrap_or(Vec3::ZERO),
                self.rotation.unwrap_or(Quat::IDENTITY),
                self.scale.unwrap_or(Vec3::ONE),
            ),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub joints: Vec<usize>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<usize>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Animation {
    pub channels: Vec<AnimationChannel>,
    pub samplers: Vec<AnimationSampler>,
    pub name: Option<String>,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnimationChannel {
    /// Index into the owning animation's `samplers`.
    pub sampler: usize,
    pub target: ChannelTarget,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelTarget {
    pub node: Option<usize>,
    pub path: TargetPath,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnimationSampler {
    pub input: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
    pub output: usize,
    pub extensions: Option<Extensions>,
    pub extras: Option<Value>,
}
