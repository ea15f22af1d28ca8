//! Reference resolution: raw document in, linked graph out.
//!
//! One forward pass, one stage per entity type, in dependency order:
//! buffers, buffer views, accessors, materials, cameras, meshes, nodes,
//! skins, animations, scenes. Each stage reserves its array at the final
//! length before filling it, and every index is bounds-checked before an id
//! is minted for it. The first structural or I/O error stops the pass.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::document::{self, Gltf};
use crate::error::{EntityRef, ResolveError};
use crate::graph::{
    AccessorId, BufferId, BufferViewId, CameraId, EntityId, MaterialId, MeshId, NodeId,
    PartialGltf, ResolvedAccessor, ResolvedAnimation, ResolvedAnimationChannel,
    ResolvedAnimationSampler, ResolvedBuffer, ResolvedBufferView, ResolvedCamera, ResolvedGltf,
    ResolvedMaterial, ResolvedMesh, ResolvedNode, ResolvedPrimitive, ResolvedScene,
    ResolvedSkin, ResolvedSparse, SceneId, SkinId, Stage,
};
use crate::materialize::materialize;
use crate::semantic::Semantic;
use crate::source::{BufferSource, FileSource, effective_search_paths};
use crate::types::{BufferTarget, ComponentType, ElementType, Mode};

/// Resolution stopped on a fatal error. Carries what was built before it.
#[derive(Debug, Error)]
#[error("glTF resolution stopped: {error}")]
pub struct PartialResolve<'a> {
    pub graph: PartialGltf<'a>,
    #[source]
    pub error: ResolveError,
}

impl PartialResolve<'_> {
    pub fn into_error(self) -> ResolveError {
        self.error
    }
}

/// Resolve `document`, reading buffers from disk.
///
/// `search_paths` are tried in order for every buffer URI. When empty, the
/// directory the document was loaded from is used instead.
///
/// A short buffer does not fail resolution: it is zero-padded and listed in
/// [`ResolvedGltf::short_buffers`]. Anything else stops the pass and comes
/// back as [`PartialResolve`].
pub fn resolve<'a>(
    document: &'a Gltf,
    search_paths: &[PathBuf],
) -> Result<ResolvedGltf<'a>, PartialResolve<'a>> {
    resolve_with_source(document, search_paths, &FileSource::default())
}

/// Same as [`resolve`], with buffer bytes coming from `source`.
pub fn resolve_with_source<'a>(
    document: &'a Gltf,
    search_paths: &[PathBuf],
    source: &dyn BufferSource,
) -> Result<ResolvedGltf<'a>, PartialResolve<'a>> {
    let mut graph = ResolvedGltf::empty(document);
    let mut completed = None;

    let outcome = Resolver {
        document,
        graph: &mut graph,
        completed: &mut completed,
    }
    .run(search_paths, source);

    match outcome {
        Ok(()) => {
            log::info!(
                "Resolved glTF: {} buffers, {} accessors, {} meshes, {} nodes, {} scenes",
                graph.buffers.len(),
                graph.accessors.len(),
                graph.meshes.len(),
                graph.nodes.len(),
                graph.scenes.len()
            );
            Ok(graph)
        }
        Err(error) => {
            log::error!("glTF resolution stopped after {:?}: {}", completed, error);
            Err(PartialResolve {
                graph: PartialGltf { inner: graph, completed },
                error,
            })
        }
    }
}

/// Bounds-check `index` against an array of `len` and mint an id for it.
fn link<I: EntityId>(
    index: usize,
    len: usize,
    entity: EntityRef,
    field: impl Into<String>,
) -> Result<I, ResolveError> {
    if index < len {
        Ok(I::from_index(index))
    } else {
        Err(ResolveError::out_of_range(entity, field, index, len))
    }
}

fn link_opt<I: EntityId>(
    index: Option<usize>,
    len: usize,
    entity: EntityRef,
    field: &str,
) -> Result<Option<I>, ResolveError> {
    index.map(|i| link(i, len, entity, field)).transpose()
}

fn component_type(code: u32, entity: EntityRef) -> Result<ComponentType, ResolveError> {
    ComponentType::from_code(code).ok_or(ResolveError::UnknownComponentType { entity, code })
}

struct Resolver<'r, 'a> {
    document: &'a Gltf,
    graph: &'r mut ResolvedGltf<'a>,
    completed: &'r mut Option<Stage>,
}

impl<'a> Resolver<'_, 'a> {
    fn run(
        mut self,
        search_paths: &[PathBuf],
        source: &dyn BufferSource,
    ) -> Result<(), ResolveError> {
        self.buffers(search_paths, source)?;
        self.done(Stage::Buffers);
        self.buffer_views()?;
        self.done(Stage::BufferViews);
        self.accessors()?;
        self.done(Stage::Accessors);
        self.materials();
        self.done(Stage::Materials);
        self.cameras();
        self.done(Stage::Cameras);
        self.meshes()?;
        self.done(Stage::Meshes);
        self.nodes()?;
        self.done(Stage::Nodes);
        self.skins()?;
        self.done(Stage::Skins);
        self.animations()?;
        self.done(Stage::Animations);
        self.scenes()?;
        self.done(Stage::Scenes);
        Ok(())
    }

    fn done(&mut self, stage: Stage) {
        log::debug!("Stage {:?} complete", stage);
        *self.completed = Some(stage);
    }

    fn buffers(
        &mut self,
        search_paths: &[PathBuf],
        source: &dyn BufferSource,
    ) -> Result<(), ResolveError> {
        let doc = self.document;
        let paths = effective_search_paths(search_paths, doc.source_dir());
        self.graph.buffers.reserve_exact(doc.buffers.len());

        for (index, raw) in doc.buffers.iter().enumerate() {
            let materialized = materialize(index, raw, source, &paths)?;
            if let Some(short) = materialized.short {
                log::warn!("{short}; padded with zeros");
                self.graph.short_buffers.push(short);
            }
            self.graph.buffers.push(ResolvedBuffer {
                raw,
                data: materialized.data,
            });
        }
        Ok(())
    }

    fn buffer_views(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        self.graph.buffer_views.reserve_exact(doc.buffer_views.len());

        for (index, raw) in doc.buffer_views.iter().enumerate() {
            let entity = EntityRef::BufferView(index);
            let buffer: BufferId = link(raw.buffer, doc.buffers.len(), entity, "buffer")?;
            // Resolved buffers are exactly `byteLength` long.
            let buffer_length = doc.buffers[buffer.index()].byte_length;
            let end = raw
                .byte_offset
                .checked_add(raw.byte_length)
                .filter(|&end| end <= buffer_length)
                .ok_or(ResolveError::BufferViewOutOfBounds {
                    view: index,
                    buffer: raw.buffer,
                    offset: raw.byte_offset,
                    length: raw.byte_length,
                    buffer_length,
                })?;
            let target = raw
                .target
                .map(|code| {
                    BufferTarget::from_code(code).ok_or(ResolveError::UnknownTarget { entity, code })
                })
                .transpose()?;

            self.graph.buffer_views.push(ResolvedBufferView {
                raw,
                buffer,
                range: raw.byte_offset..end,
                target,
            });
        }
        Ok(())
    }

    fn accessors(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        let views = &doc.buffer_views;
        self.graph.accessors.reserve_exact(doc.accessors.len());

        for (index, raw) in doc.accessors.iter().enumerate() {
            let entity = EntityRef::Accessor(index);
            let buffer_view: BufferViewId =
                link(raw.buffer_view, views.len(), entity, "bufferView")?;
            let component_type = component_type(raw.component_type, entity)?;
            let element_type = ElementType::from_tag(&raw.element_type).ok_or_else(|| {
                ResolveError::UnknownElementType {
                    entity,
                    tag: raw.element_type.clone(),
                }
            })?;

            let view = &views[buffer_view.index()];
            let element_size = component_type.size() * element_type.components();
            let required = accessor_extent(raw, element_size, view.byte_stride);
            if required > view.byte_length {
                return Err(ResolveError::AccessorOutOfBounds {
                    entity,
                    view: raw.buffer_view,
                    required,
                    available: view.byte_length,
                });
            }

            let sparse = raw
                .sparse
                .as_ref()
                .map(|sparse| resolve_sparse(sparse, raw.count, element_size, views, entity))
                .transpose()?;

            self.graph.accessors.push(ResolvedAccessor {
                raw,
                buffer_view,
                component_type,
                element_type,
                sparse,
            });
        }
        Ok(())
    }

    fn materials(&mut self) {
        let doc = self.document;
        self.graph.materials = doc.materials.iter().map(|raw| ResolvedMaterial { raw }).collect();
    }

    fn cameras(&mut self) {
        let doc = self.document;
        self.graph.cameras = doc.cameras.iter().map(|raw| ResolvedCamera { raw }).collect();
    }

    fn meshes(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        self.graph.meshes.reserve_exact(doc.meshes.len());

        for (mesh, raw) in doc.meshes.iter().enumerate() {
            let mut primitives = Vec::with_capacity(raw.primitives.len());
            for (primitive, raw_primitive) in raw.primitives.iter().enumerate() {
                let entity = EntityRef::Primitive { mesh, primitive };
                primitives.push(self.primitive(raw_primitive, entity)?);
            }
            self.graph.meshes.push(ResolvedMesh { raw, primitives });
        }
        Ok(())
    }

    fn primitive(
        &self,
        raw: &'a document::Primitive,
        entity: EntityRef,
    ) -> Result<ResolvedPrimitive<'a>, ResolveError> {
        let doc = self.document;
        let accessors = doc.accessors.len();

        let attributes = semantic_map(&raw.attributes, accessors, entity, "attributes")?;
        let targets = raw
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| semantic_map(target, accessors, entity, &format!("targets[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        let indices: Option<AccessorId> = link_opt(raw.indices, accessors, entity, "indices")?;
        let material: Option<MaterialId> =
            link_opt(raw.material, doc.materials.len(), entity, "material")?;
        let mode = match raw.mode {
            None => Mode::default(),
            Some(code) => Mode::from_code(code).ok_or(ResolveError::UnknownMode { entity, code })?,
        };

        Ok(ResolvedPrimitive {
            raw,
            attributes,
            indices,
            material,
            mode,
            targets,
        })
    }

    /// Nodes may reference each other in any direction, cycles included, so
    /// every slot is allocated before any child link is made.
    fn nodes(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        let nodes = &mut self.graph.nodes;
        nodes.reserve_exact(doc.nodes.len());

        for (index, raw) in doc.nodes.iter().enumerate() {
            let entity = EntityRef::Node(index);
            let mesh: Option<MeshId> = link_opt(raw.mesh, doc.meshes.len(), entity, "mesh")?;
            let camera: Option<CameraId> =
                link_opt(raw.camera, doc.cameras.len(), entity, "camera")?;
            let skin: Option<SkinId> = link_opt(raw.skin, doc.skins.len(), entity, "skin")?;
            nodes.push(ResolvedNode {
                raw,
                mesh,
                camera,
                skin,
                children: Vec::with_capacity(raw.children.len()),
            });
        }

        let len = nodes.len();
        for (index, (node, raw)) in nodes.iter_mut().zip(&doc.nodes).enumerate() {
            let entity = EntityRef::Node(index);
            for &child in &raw.children {
                node.children.push(link(child, len, entity, "children")?);
            }
        }
        Ok(())
    }

    fn skins(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        let nodes = doc.nodes.len();
        self.graph.skins.reserve_exact(doc.skins.len());

        for (index, raw) in doc.skins.iter().enumerate() {
            let entity = EntityRef::Skin(index);
            let inverse_bind_matrices: Option<AccessorId> = link_opt(
                raw.inverse_bind_matrices,
                doc.accessors.len(),
                entity,
                "inverseBindMatrices",
            )?;
            let skeleton: Option<NodeId> = link_opt(raw.skeleton, nodes, entity, "skeleton")?;
            let joints = raw
                .joints
                .iter()
                .map(|&joint| link(joint, nodes, entity, "joints"))
                .collect::<Result<Vec<NodeId>, _>>()?;

            self.graph.skins.push(ResolvedSkin {
                raw,
                inverse_bind_matrices,
                skeleton,
                joints,
            });
        }
        Ok(())
    }

    fn animations(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        let accessors = doc.accessors.len();
        self.graph.animations.reserve_exact(doc.animations.len());

        for (animation, raw) in doc.animations.iter().enumerate() {
            let mut samplers = Vec::with_capacity(raw.samplers.len());
            for (sampler, raw_sampler) in raw.samplers.iter().enumerate() {
                let entity = EntityRef::AnimationSampler { animation, sampler };
                samplers.push(ResolvedAnimationSampler {
                    raw: raw_sampler,
                    input: link(raw_sampler.input, accessors, entity, "input")?,
                    output: link(raw_sampler.output, accessors, entity, "output")?,
                    interpolation: raw_sampler.interpolation,
                });
            }

            let mut channels = Vec::with_capacity(raw.channels.len());
            for (channel, raw_channel) in raw.channels.iter().enumerate() {
                let entity = EntityRef::AnimationChannel { animation, channel };
                if raw_channel.sampler >= samplers.len() {
                    return Err(ResolveError::out_of_range(
                        entity,
                        "sampler",
                        raw_channel.sampler,
                        samplers.len(),
                    ));
                }
                channels.push(ResolvedAnimationChannel {
                    raw: raw_channel,
                    sampler: raw_channel.sampler,
                    node: link_opt(
                        raw_channel.target.node,
                        doc.nodes.len(),
                        entity,
                        "target.node",
                    )?,
                    path: raw_channel.target.path,
                });
            }

            self.graph.animations.push(ResolvedAnimation {
                raw,
                samplers,
                channels,
            });
        }
        Ok(())
    }

    fn scenes(&mut self) -> Result<(), ResolveError> {
        let doc = self.document;
        self.graph.scenes.reserve_exact(doc.scenes.len());

        for (index, raw) in doc.scenes.iter().enumerate() {
            let entity = EntityRef::Scene(index);
            let nodes = raw
                .nodes
                .iter()
                .map(|&node| link(node, doc.nodes.len(), entity, "nodes"))
                .collect::<Result<Vec<NodeId>, _>>()?;
            self.graph.scenes.push(ResolvedScene { raw, nodes });
        }

        let default_scene: Option<SceneId> =
            link_opt(doc.scene, doc.scenes.len(), EntityRef::Document, "scene")?;
        self.graph.default_scene = default_scene;
        Ok(())
    }
}

/// Bytes an accessor needs from the start of its buffer view.
fn accessor_extent(
    raw: &document::Accessor,
    element_size: usize,
    byte_stride: Option<usize>,
) -> usize {
    if raw.count == 0 {
        return raw.byte_offset;
    }
    let stride = byte_stride.unwrap_or(element_size);
    stride
        .checked_mul(raw.count - 1)
        .and_then(|span| span.checked_add(element_size))
        .and_then(|span| span.checked_add(raw.byte_offset))
        .unwrap_or(usize::MAX)
}

/// Sparse indices and values are tightly packed: `count` entries each, from
/// their byte offsets, with no stride.
fn resolve_sparse<'a>(
    raw: &'a document::Sparse,
    accessor_count: usize,
    element_size: usize,
    views: &[document::BufferView],
    entity: EntityRef,
) -> Result<ResolvedSparse<'a>, ResolveError> {
    if raw.count > accessor_count {
        return Err(ResolveError::SparseCountTooLarge {
            entity,
            sparse: raw.count,
            count: accessor_count,
        });
    }

    let indices: BufferViewId = link(
        raw.indices.buffer_view,
        views.len(),
        entity,
        "sparse.indices.bufferView",
    )?;
    let index_type = component_type(raw.indices.component_type, entity)?;
    if !index_type.is_index() {
        return Err(ResolveError::InvalidIndexType {
            entity,
            code: raw.indices.component_type,
        });
    }
    let values: BufferViewId = link(
        raw.values.buffer_view,
        views.len(),
        entity,
        "sparse.values.bufferView",
    )?;

    for (view, offset, size) in [
        (indices, raw.indices.byte_offset, index_type.size()),
        (values, raw.values.byte_offset, element_size),
    ] {
        let available = views[view.index()].byte_length;
        let required = size
            .checked_mul(raw.count)
            .and_then(|span| span.checked_add(offset))
            .unwrap_or(usize::MAX);
        if required > available {
            return Err(ResolveError::AccessorOutOfBounds {
                entity,
                view: view.index(),
                required,
                available,
            });
        }
    }

    Ok(ResolvedSparse {
        raw,
        indices,
        index_type,
        values,
    })
}

fn semantic_map(
    raw: &BTreeMap<String, usize>,
    accessors: usize,
    entity: EntityRef,
    field: &str,
) -> Result<BTreeMap<Semantic, AccessorId>, ResolveError> {
    raw.iter()
        .map(|(name, &index)| {
            let id = link(index, accessors, entity, format!("{field}.{name}"))?;
            Ok((Semantic::from(name.as_str()), id))
        })
        .collect()
}
