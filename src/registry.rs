//! Correlation of domain objects, kernel entities and model ids.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::adapter::{GeomRepr, GeometrySource};
use crate::error::{ModelError, Stage};
use crate::fem::{ElementId, FemModel, NodeId, SessionId};
use crate::kernel::{FragmentMap, KernelEntity};
use crate::structure::section::FaceTag;
use crate::structure::StructuralObject;

new_key_type! {
    /// Identifies an object registered in a session.
    pub struct ObjectKey;
}

/// Whether an object has been through a fragmentation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionState {
    /// Still the single entity it was added as.
    Unpartitioned,
    /// Represented by the pieces of a fragmentation.
    Partitioned,
}

/// A domain object and its current kernel entities.
#[derive(Debug, Clone)]
pub struct RegisteredObject {
    pub name: String,
    pub object: StructuralObject,
    pub repr: GeomRepr,
    pub source: GeometrySource,
    pub entities: Vec<KernelEntity>,
    pub state: PartitionState,
}

/// An entity claimed by two differently named objects after fragmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collapse {
    pub entity: KernelEntity,
    pub first: String,
    pub second: String,
}

/// Registry owned by one session.
#[derive(Debug)]
pub struct EntityRegistry {
    session: SessionId,
    objects: SlotMap<ObjectKey, RegisteredObject>,
    order: Vec<ObjectKey>,
    by_name: HashMap<String, ObjectKey>,
    owners: HashMap<KernelEntity, Vec<ObjectKey>>,
    faces: HashMap<KernelEntity, FaceTag>,
    node_ids: HashMap<usize, NodeId>,
    element_ids: HashMap<usize, ElementId>,
    next_node: usize,
    next_element: usize,
}

impl EntityRegistry {
    #[must_use]
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            objects: SlotMap::with_key(),
            order: Vec::new(),
            by_name: HashMap::new(),
            owners: HashMap::new(),
            faces: HashMap::new(),
            node_ids: HashMap::new(),
            element_ids: HashMap::new(),
            next_node: FemModel::ID_BASE,
            next_element: FemModel::ID_BASE,
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Registers an object with the entities it was added as.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSetName`] if an object with the same
    /// name is already registered.
    pub fn register(
        &mut self,
        object: &StructuralObject,
        source: GeometrySource,
        entities: Vec<KernelEntity>,
    ) -> Result<ObjectKey, ModelError> {
        let name = object.name().to_owned();
        if self.by_name.contains_key(&name) {
            return Err(ModelError::DuplicateSetName {
                name,
                stage: Stage::GeometryStaging,
            });
        }
        let key = self.objects.insert(RegisteredObject {
            name: name.clone(),
            object: object.clone(),
            repr: source.repr(),
            source,
            entities: entities.clone(),
            state: PartitionState::Unpartitioned,
        });
        for e in entities {
            self.owners.entry(e).or_default().push(key);
        }
        self.order.push(key);
        self.by_name.insert(name, key);
        Ok(key)
    }

    #[must_use]
    pub fn get(&self, key: ObjectKey) -> Option<&RegisteredObject> {
        self.objects.get(key)
    }

    #[must_use]
    pub fn key_of(&self, name: &str) -> Option<ObjectKey> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, key: ObjectKey) -> Option<&str> {
        self.objects.get(key).map(|o| o.name.as_str())
    }

    /// Registered objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &RegisteredObject)> {
        self.order.iter().filter_map(|&k| Some((k, self.objects.get(k)?)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current entities of an object.
    #[must_use]
    pub fn entities_of(&self, key: ObjectKey) -> &[KernelEntity] {
        self.objects
            .get(key)
            .map(|o| o.entities.as_slice())
            .unwrap_or_default()
    }

    /// Objects that own an entity, in the order they claimed it.
    #[must_use]
    pub fn owners_of(&self, entity: KernelEntity) -> &[ObjectKey] {
        self.owners.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replaces fragmented entities with their pieces.
    ///
    /// Every object whose entity appears in the map becomes
    /// [`PartitionState::Partitioned`]. Returns pieces now claimed by two
    /// differently named objects; both keep the piece.
    pub fn apply_fragments(&mut self, map: &FragmentMap) -> Vec<Collapse> {
        for (old, pieces) in &map.entries {
            let owners = self.owners.remove(old).unwrap_or_default();
            self.faces.remove(old);
            for key in owners {
                let Some(obj) = self.objects.get_mut(key) else {
                    continue;
                };
                let mut entities = Vec::with_capacity(obj.entities.len() + pieces.len());
                for &e in &obj.entities {
                    let replacement: &[KernelEntity] = if e == *old { pieces } else { std::slice::from_ref(&e) };
                    for &r in replacement {
                        if !entities.contains(&r) {
                            entities.push(r);
                        }
                    }
                }
                obj.entities = entities;
                obj.state = PartitionState::Partitioned;
            }
        }

        self.owners.clear();
        for &key in &self.order {
            if let Some(obj) = self.objects.get(key) {
                for &e in &obj.entities {
                    let owners = self.owners.entry(e).or_default();
                    if !owners.contains(&key) {
                        owners.push(key);
                    }
                }
            }
        }

        let mut collapses = Vec::new();
        let mut seen = Vec::new();
        for (_, pieces) in &map.entries {
            for &piece in pieces {
                if seen.contains(&piece) {
                    continue;
                }
                seen.push(piece);
                let [first, second, ..] = self.owners_of(piece) else {
                    continue;
                };
                if let (Some(a), Some(b)) = (self.name_of(*first), self.name_of(*second)) {
                    if a != b {
                        collapses.push(Collapse {
                            entity: piece,
                            first: a.to_owned(),
                            second: b.to_owned(),
                        });
                    }
                }
            }
        }
        collapses
    }

    pub fn set_face(&mut self, entity: KernelEntity, face: FaceTag) {
        self.faces.insert(entity, face);
    }

    #[must_use]
    pub fn face_of(&self, entity: KernelEntity) -> Option<FaceTag> {
        self.faces.get(&entity).copied()
    }

    /// Model node id for a kernel node tag.
    ///
    /// Idempotent within a session: the same tag always yields the same id.
    pub fn resolve_node_id(&mut self, kernel_tag: usize) -> NodeId {
        self.resolve_node(kernel_tag).0
    }

    /// Like [`resolve_node_id`](Self::resolve_node_id), also reporting
    /// whether the id was allocated by this call.
    pub fn resolve_node(&mut self, kernel_tag: usize) -> (NodeId, bool) {
        if let Some(&id) = self.node_ids.get(&kernel_tag) {
            return (id, false);
        }
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.node_ids.insert(kernel_tag, id);
        (id, true)
    }

    /// Model element id for a kernel element tag, reporting whether it is new.
    pub fn resolve_element(&mut self, kernel_tag: usize) -> (ElementId, bool) {
        if let Some(&id) = self.element_ids.get(&kernel_tag) {
            return (id, false);
        }
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.element_ids.insert(kernel_tag, id);
        (id, true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapter::{Adapt, GeomRepr};
    use crate::math::Point3;
    use crate::structure::section::{CrossSection, RectangularSection};
    use crate::structure::{Beam, Plate};

    fn plate(name: &str) -> StructuralObject {
        Plate::horizontal(name, (0.0, 0.0), (1.0, 1.0), 0.0, 0.01).into()
    }

    fn register(reg: &mut EntityRegistry, obj: &StructuralObject, tag: u32) -> ObjectKey {
        let source = Adapt::new(obj, GeomRepr::Shell).execute().unwrap();
        reg.register(obj, source, vec![KernelEntity::new(2, tag)]).unwrap()
    }

    #[test]
    fn node_resolution_is_idempotent() {
        let mut reg = EntityRegistry::new(SessionId(1));
        let a = reg.resolve_node_id(42);
        let b = reg.resolve_node_id(7);
        assert_eq!(a, NodeId(FemModel::ID_BASE));
        assert_eq!(reg.resolve_node_id(42), a);
        assert_ne!(a, b);
        assert_eq!(reg.resolve_node(7), (b, false));
        assert!(reg.resolve_node(8).1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = EntityRegistry::new(SessionId(1));
        register(&mut reg, &plate("deck"), 1);
        let obj = plate("deck");
        let source = Adapt::new(&obj, GeomRepr::Shell).execute().unwrap();
        let err = reg.register(&obj, source, vec![KernelEntity::new(2, 2)]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateSetName {
                stage: Stage::GeometryStaging,
                ..
            }
        ));
    }

    #[test]
    fn fragments_replace_entities_and_flag_collapses() {
        let mut reg = EntityRegistry::new(SessionId(1));
        let a = register(&mut reg, &plate("left"), 1);
        let b = register(&mut reg, &plate("right"), 2);
        let map = FragmentMap {
            entries: vec![
                (KernelEntity::new(2, 1), vec![KernelEntity::new(2, 3), KernelEntity::new(2, 4)]),
                (KernelEntity::new(2, 2), vec![KernelEntity::new(2, 4), KernelEntity::new(2, 5)]),
            ],
        };
        let collapses = reg.apply_fragments(&map);
        assert_eq!(reg.entities_of(a), &[KernelEntity::new(2, 3), KernelEntity::new(2, 4)]);
        assert_eq!(reg.get(b).unwrap().state, PartitionState::Partitioned);
        assert_eq!(
            collapses,
            vec![Collapse {
                entity: KernelEntity::new(2, 4),
                first: "left".into(),
                second: "right".into(),
            }]
        );
        assert_eq!(reg.owners_of(KernelEntity::new(2, 4)), &[a, b]);
        assert!(reg.owners_of(KernelEntity::new(2, 1)).is_empty());
    }

    #[test]
    fn unsplit_entity_keeps_owner() {
        let mut reg = EntityRegistry::new(SessionId(1));
        let beam: StructuralObject = Beam::new(
            "post",
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
            CrossSection::Rectangle(RectangularSection::new(0.1, 0.1)),
        )
        .into();
        let source = Adapt::new(&beam, GeomRepr::Line).execute().unwrap();
        let key = reg.register(&beam, source, vec![KernelEntity::new(1, 1)]).unwrap();
        let map = FragmentMap {
            entries: vec![(KernelEntity::new(1, 1), vec![KernelEntity::new(1, 1)])],
        };
        assert!(reg.apply_fragments(&map).is_empty());
        assert_eq!(reg.owners_of(KernelEntity::new(1, 1)), &[key]);
        assert_eq!(reg.key_of("post"), Some(key));
        assert_eq!(reg.name_of(key), Some("post"));
    }
}
