//! Resolved, fully linked glTF graph.
//!
//! Every entity array is owned by [`ResolvedGltf`] and sized once. Cross
//! references are typed ids into those arrays; index the graph with an id to
//! get the entity (`&graph[node_id]`). Ids are only minted by the resolver
//! after a bounds check, so indexing the graph that produced them never fails.
//! Each resolved entity also borrows its raw counterpart as `raw`.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, Range};

use crate::document::{self, Gltf};
use crate::error::{ResolveError, ShortBufferError};
use crate::semantic::Semantic;
use crate::types::{BufferTarget, ComponentType, ElementType, Interpolation, Mode, TargetPath};

pub(crate) trait EntityId: Copy {
    fn from_index(index: usize) -> Self;
}

macro_rules! entity_id {
    ($($(#[$meta:meta])* $name:ident;)+) => {$(
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Position in the document's array.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl EntityId for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index)
            }
        }
    )+};
}

entity_id! {
    BufferId;
    BufferViewId;
    AccessorId;
    MaterialId;
    CameraId;
    MeshId;
    NodeId;
    SkinId;
    SceneId;
}

pub struct ResolvedBuffer<'a> {
    pub raw: &'a document::Buffer,
    pub(crate) data: Vec<u8>,
}

impl ResolvedBuffer<'_> {
    /// Exactly `byteLength` bytes, zero-padded if the source was short.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for ResolvedBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBuffer")
            .field("uri", &self.raw.uri)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct ResolvedBufferView<'a> {
    pub raw: &'a document::BufferView,
    pub buffer: BufferId,
    /// Byte range inside the buffer.
    pub range: Range<usize>,
    pub target: Option<BufferTarget>,
}

#[derive(Debug)]
pub struct ResolvedAccessor<'a> {
    pub raw: &'a document::Accessor,
    pub buffer_view: BufferViewId,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub sparse: Option<ResolvedSparse<'a>>,
}

impl ResolvedAccessor<'_> {
    /// Bytes per element: component size times component count.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }

    pub fn count(&self) -> usize {
        self.raw.count
    }
}

#[derive(Debug)]
pub struct ResolvedSparse<'a> {
    pub raw: &'a document::Sparse,
    pub indices: BufferViewId,
    pub index_type: ComponentType,
    pub values: BufferViewId,
}

#[derive(Debug)]
pub struct ResolvedMaterial<'a> {
    pub raw: &'a document::Material,
}

#[derive(Debug)]
pub struct ResolvedCamera<'a> {
    pub raw: &'a document::Camera,
}

#[derive(Debug)]
pub struct ResolvedMesh<'a> {
    pub raw: &'a document::Mesh,
    pub primitives: Vec<ResolvedPrimitive<'a>>,
}

#[derive(Debug)]
pub struct ResolvedPrimitive<'a> {
    pub raw: &'a document::Primitive,
    pub attributes: BTreeMap<Semantic, AccessorId>,
    /// `None` means a non-indexed draw.
    pub indices: Option<AccessorId>,
    /// `None` means the default material.
    pub material: Option<MaterialId>,
    pub mode: Mode,
    pub targets: Vec<BTreeMap<Semantic, AccessorId>>,
}

impl ResolvedPrimitive<'_> {
    pub fn attribute(&self, semantic: &Semantic) -> Option<AccessorId> {
        self.attributes.get(semantic).copied()
    }

    /// Look up an attribute by its document name, e.g. `"POSITION"`.
    pub fn get(&self, name: &str) -> Option<AccessorId> {
        self.attribute(&Semantic::from(name))
    }
}

#[derive(Debug)]
pub struct ResolvedNode<'a> {
    pub raw: &'a document::Node,
    pub mesh: Option<MeshId>,
    pub camera: Option<CameraId>,
    pub skin: Option<SkinId>,
    /// May form cycles in malformed documents; walkers must guard.
    pub children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct ResolvedSkin<'a> {
    pub raw: &'a document::Skin,
    pub inverse_bind_matrices: Option<AccessorId>,
    pub skeleton: Option<NodeId>,
    pub joints: Vec<NodeId>,
}

#[derive(Debug)]
pub struct ResolvedAnimation<'a> {
    pub raw: &'a document::Animation,
    pub samplers: Vec<ResolvedAnimationSampler<'a>>,
    pub channels: Vec<ResolvedAnimationChannel<'a>>,
}

impl<'a> ResolvedAnimation<'a> {
    /// The sampler driving `channel`, which must belong to this animation.
    pub fn sampler_of(
        &self,
        channel: &ResolvedAnimationChannel<'_>,
    ) -> &ResolvedAnimationSampler<'a> {
        &self.samplers[channel.sampler]
    }
}

#[derive(Debug)]
pub struct ResolvedAnimationSampler<'a> {
    pub raw: &'a document::AnimationSampler,
    pub input: AccessorId,
    pub output: AccessorId,
    pub interpolation: Interpolation,
}

#[derive(Debug)]
pub struct ResolvedAnimationChannel<'a> {
    pub raw: &'a document::AnimationChannel,
    /// Index into the owning animation's `samplers`.
    pub sampler: usize,
    pub node: Option<NodeId>,
    pub path: TargetPath,
}

#[derive(Debug)]
pub struct ResolvedScene<'a> {
    pub raw: &'a document::Scene,
    pub nodes: Vec<NodeId>,
}

/// Resolution steps, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Buffers,
    BufferViews,
    Accessors,
    Materials,
    Cameras,
    Meshes,
    Nodes,
    Skins,
    Animations,
    Scenes,
}

/// Output of a successful resolution. Immutable; borrows the raw document.
#[derive(Debug)]
pub struct ResolvedGltf<'a> {
    pub(crate) document: &'a Gltf,
    pub(crate) buffers: Vec<ResolvedBuffer<'a>>,
    pub(crate) buffer_views: Vec<ResolvedBufferView<'a>>,
    pub(crate) accessors: Vec<ResolvedAccessor<'a>>,
    pub(crate) materials: Vec<ResolvedMaterial<'a>>,
    pub(crate) cameras: Vec<ResolvedCamera<'a>>,
    pub(crate) meshes: Vec<ResolvedMesh<'a>>,
    pub(crate) nodes: Vec<ResolvedNode<'a>>,
    pub(crate) skins: Vec<ResolvedSkin<'a>>,
    pub(crate) animations: Vec<ResolvedAnimation<'a>>,
    pub(crate) scenes: Vec<ResolvedScene<'a>>,
    pub(crate) default_scene: Option<SceneId>,
    pub(crate) short_buffers: Vec<ShortBufferError>,
}

impl<'a> ResolvedGltf<'a> {
    pub(crate) fn empty(document: &'a Gltf) -> Self {
        Self {
            document,
            buffers: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            materials: Vec::new(),
            cameras: Vec::new(),
            meshes: Vec::new(),
            nodes: Vec::new(),
            skins: Vec::new(),
            animations: Vec::new(),
            scenes: Vec::new(),
            default_scene: None,
            short_buffers: Vec::new(),
        }
    }

    pub fn document(&self) -> &'a Gltf {
        self.document
    }

    pub fn buffers(&self) -> &[ResolvedBuffer<'a>] {
        &self.buffers
    }

    pub fn buffer_views(&self) -> &[ResolvedBufferView<'a>] {
        &self.buffer_views
    }

    pub fn accessors(&self) -> &[ResolvedAccessor<'a>] {
        &self.accessors
    }

    pub fn materials(&self) -> &[ResolvedMaterial<'a>] {
        &self.materials
    }

    pub fn cameras(&self) -> &[ResolvedCamera<'a>] {
        &self.cameras
    }

    pub fn meshes(&self) -> &[ResolvedMesh<'a>] {
        &self.meshes
    }

    pub fn nodes(&self) -> &[ResolvedNode<'a>] {
        &self.nodes
    }

    pub fn skins(&self) -> &[ResolvedSkin<'a>] {
        &self.skins
    }

    pub fn animations(&self) -> &[ResolvedAnimation<'a>] {
        &self.animations
    }

    pub fn scenes(&self) -> &[ResolvedScene<'a>] {
        &self.scenes
    }

    pub fn default_scene_id(&self) -> Option<SceneId> {
        self.default_scene
    }

    pub fn default_scene(&self) -> Option<&ResolvedScene<'a>> {
        self.default_scene.map(|id| &self[id])
    }

    /// Buffers that were zero-padded because their source was short.
    pub fn short_buffers(&self) -> &[ShortBufferError] {
        &self.short_buffers
    }

    /// Fails with the first padded buffer, for callers that want short
    /// buffers treated as errors.
    pub fn ensure_complete_buffers(&self) -> Result<(), ResolveError> {
        match self.short_buffers.first() {
            Some(short) => Err(ResolveError::ShortBuffer(short.clone())),
            None => Ok(()),
        }
    }

    /// Bytes covered by a buffer view; a borrow of the buffer, not a copy.
    pub fn buffer_view_data(&self, id: BufferViewId) -> &[u8] {
        let view = &self[id];
        &self[view.buffer].data[view.range.clone()]
    }

    /// Bytes of the buffer view behind an accessor, starting at the
    /// accessor's own byte offset.
    pub fn accessor_data(&self, id: AccessorId) -> &[u8] {
        let accessor = &self[id];
        &self.buffer_view_data(accessor.buffer_view)[accessor.raw.byte_offset..]
    }
}

macro_rules! index_by_id {
    ($($id:ident => $field:ident: $entity:ident;)+) => {$(
        impl<'a> Index<$id> for ResolvedGltf<'a> {
            type Output = $entity<'a>;

            #[inline]
            fn index(&self, id: $id) -> &Self::Output {
                &self.$field[id.0]
            }
        }
    )+};
}

index_by_id! {
    BufferId => buffers: ResolvedBuffer;
    BufferViewId => buffer_views: ResolvedBufferView;
    AccessorId => accessors: ResolvedAccessor;
    MaterialId => materials: ResolvedMaterial;
    CameraId => cameras: ResolvedCamera;
    MeshId => meshes: ResolvedMesh;
    NodeId => nodes: ResolvedNode;
    SkinId => skins: ResolvedSkin;
    SceneId => scenes: ResolvedScene;
}

/// What was resolved before a fatal error. Only arrays of completed stages
/// are exposed; the rest read as `None`.
#[derive(Debug)]
pub struct PartialGltf<'a> {
    pub(crate) inner: ResolvedGltf<'a>,
    pub(crate) completed: Option<Stage>,
}

impl<'a> PartialGltf<'a> {
    /// Last stage that finished, if any.
    pub fn completed(&self) -> Option<Stage> {
        self.completed
    }

    pub fn has(&self, stage: Stage) -> bool {
        self.completed.is_some_and(|done| stage <= done)
    }

    pub fn buffers(&self) -> Option<&[ResolvedBuffer<'a>]> {
        self.has(Stage::Buffers).then_some(&self.inner.buffers[..])
    }

    pub fn buffer_views(&self) -> Option<&[ResolvedBufferView<'a>]> {
        self.has(Stage::BufferViews).then_some(&self.inner.buffer_views[..])
    }

    pub fn accessors(&self) -> Option<&[ResolvedAccessor<'a>]> {
        self.has(Stage::Accessors).then_some(&self.inner.accessors[..])
    }

    pub fn materials(&self) -> Option<&[ResolvedMaterial<'a>]> {
        self.has(Stage::Materials).then_some(&self.inner.materials[..])
    }

    pub fn cameras(&self) -> Option<&[ResolvedCamera<'a>]> {
        self.has(Stage::Cameras).then_some(&self.inner.cameras[..])
    }

    pub fn meshes(&self) -> Option<&[ResolvedMesh<'a>]> {
        self.has(Stage::Meshes).then_some(&self.inner.meshes[..])
    }

    pub fn nodes(&self) -> Option<&[ResolvedNode<'a>]> {
        self.has(Stage::Nodes).then_some(&self.inner.nodes[..])
    }

    pub fn skins(&self) -> Option<&[ResolvedSkin<'a>]> {
        self.has(Stage::Skins).then_some(&self.inner.skins[..])
    }

    pub fn animations(&self) -> Option<&[ResolvedAnimation<'a>]> {
        self.has(Stage::Animations).then_some(&self.inner.animations[..])
    }

    pub fn scenes(&self) -> Option<&[ResolvedScene<'a>]> {
        self.has(Stage::Scenes).then_some(&self.inner.scenes[..])
    }

    pub fn short_buffers(&self) -> &[ShortBufferError] {
        &self.inner.short_buffers
    }
}

macro_rules! partial_get {
    ($($method:ident($id:ident) => $field:ident: $entity:ident @ $stage:ident;)+) => {
        /// Single-entity lookups. `None` when the stage never completed or
        /// the id does not belong to this graph.
        impl<'a> PartialGltf<'a> {$(
            pub fn $method(&self, id: $id) -> Option<&$entity<'a>> {
                if self.has(Stage::$stage) {
                    self.inner.$field.get(id.0)
                } else {
                    None
                }
            }
        )+}
    };
}

partial_get! {
    buffer(BufferId) => buffers: ResolvedBuffer @ Buffers;
    buffer_view(BufferViewId) => buffer_views: ResolvedBufferView @ BufferViews;
    accessor(AccessorId) => accessors: ResolvedAccessor @ Accessors;
    material(MaterialId) => materials: ResolvedMaterial @ Materials;
    camera(CameraId) => cameras: ResolvedCamera @ Cameras;
    mesh(MeshId) => meshes: ResolvedMesh @ Meshes;
    node(NodeId) => nodes: ResolvedNode @ Nodes;
    skin(SkinId) => skins: ResolvedSkin @ Skins;
    scene(SceneId) => scenes: ResolvedScene @ Scenes;
}
