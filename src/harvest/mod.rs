//! Reassembly of kernel output into a labeled finite-element model.

pub mod ordering;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{KernelError, Result, SessionError, Stage};
use crate::fem::{Element, ElementShape, FemModel, FemSet, Node, NodeId};
use crate::kernel::{KernelEntity, MeshKernel};
use crate::registry::EntityRegistry;
use crate::structure::section::FaceTag;

/// Builds the [`FemModel`] of a meshed session.
pub struct Harvest<'a, K: MeshKernel> {
    registry: &'a mut EntityRegistry,
    kernel: &'a K,
}

impl<'a, K: MeshKernel> Harvest<'a, K> {
    /// Creates a new `Harvest` operation.
    #[must_use]
    pub fn new(registry: &'a mut EntityRegistry, kernel: &'a K) -> Self {
        Self { registry, kernel }
    }

    /// Executes the harvest.
    ///
    /// Every registered object yields one set named after it; web and
    /// flange pieces also yield `<object>_<face>` sets. A piece shared by
    /// two objects is harvested once and appears in both sets.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Kernel`] if kernel output cannot be read and
    /// [`crate::error::ModelError::DuplicateSetName`] on a set name clash.
    pub fn execute(mut self) -> Result<FemModel> {
        let mut model = FemModel::new();
        let objects: Vec<(String, Vec<KernelEntity>)> = self
            .registry
            .iter()
            .map(|(_, o)| (o.name.clone(), o.entities.clone()))
            .collect();

        for (name, entities) in objects {
            let fail = |source: KernelError| SessionError::Kernel {
                object: Some(name.clone()),
                stage: Stage::Harvesting,
                source,
            };
            let mut set = FemSet::new(name.as_str(), name.as_str());
            let mut faces: BTreeMap<FaceTag, FemSet> = BTreeMap::new();

            for entity in entities {
                let mut face = self.registry.face_of(entity).map(|tag| {
                    faces
                        .entry(tag)
                        .or_insert_with(|| FemSet::new(format!("{name}_{}", tag.name()), name.as_str()))
                });
                for block in self.kernel.elements(entity).map_err(fail)? {
                    let shape = ElementShape::from_type_code(block.type_code)
                        .ok_or_else(|| fail(KernelError::UnsupportedElementType(block.type_code)))?;
                    for (tag, native) in block.iter() {
                        let mut nodes = Vec::with_capacity(native.len());
                        for kernel_node in ordering::canonical(shape, native) {
                            nodes.push(self.node(&mut model, kernel_node).map_err(fail)?);
                        }
                        let (id, fresh) = self.registry.resolve_element(tag);
                        if fresh {
                            model.insert_element(Element {
                                id,
                                shape,
                                nodes: nodes.clone(),
                            });
                        }
                        set.elements.insert(id);
                        set.nodes.extend(nodes.iter().copied());
                        if let Some(face) = face.as_deref_mut() {
                            face.elements.insert(id);
                            face.nodes.extend(nodes);
                        }
                    }
                }
            }

            debug!(
                set = %set.name,
                nodes = set.nodes.len(),
                elements = set.elements.len(),
                faces = faces.len(),
                "set harvested"
            );
            model.add_set(set, Stage::Harvesting)?;
            for (_, face_set) in faces {
                model.add_set(face_set, Stage::Harvesting)?;
            }
        }
        Ok(model)
    }

    /// Resolves a kernel node, recording its coordinates on first sight.
    fn node(&mut self, model: &mut FemModel, kernel_tag: usize) -> std::result::Result<NodeId, KernelError> {
        let (id, fresh) = self.registry.resolve_node(kernel_tag);
        if fresh {
            model.insert_node(Node {
                id,
                point: self.kernel.node(kernel_tag)?,
                session: self.registry.session(),
            });
        }
        Ok(id)
    }
}
