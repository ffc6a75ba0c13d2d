//! Finite-element model produced by harvesting.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ModelError, Stage};
use crate::kernel::element_type;
use crate::math::Point3;

/// Identifier of a model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Identifier of a model element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Namespace of the session that created a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub point: Point3,
    pub session: SessionId,
}

/// Element topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementShape {
    Line2,
    Line3,
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Tet4,
    Tet10,
    Hex8,
    Hex20,
}

impl ElementShape {
    /// Maps a kernel type code to a shape.
    #[must_use]
    pub fn from_type_code(code: i32) -> Option<Self> {
        Some(match code {
            element_type::LINE2 => Self::Line2,
            element_type::LINE3 => Self::Line3,
            element_type::TRI3 => Self::Tri3,
            element_type::TRI6 => Self::Tri6,
            element_type::QUAD4 => Self::Quad4,
            element_type::QUAD8 => Self::Quad8,
            element_type::TET4 => Self::Tet4,
            element_type::TET10 => Self::Tet10,
            element_type::HEX8 => Self::Hex8,
            element_type::HEX20 => Self::Hex20,
            _ => return None,
        })
    }

    #[must_use]
    pub fn node_count(self) -> usize {
        match self {
            Self::Line2 => 2,
            Self::Line3 | Self::Tri3 => 3,
            Self::Quad4 | Self::Tet4 => 4,
            Self::Tri6 => 6,
            Self::Quad8 | Self::Hex8 => 8,
            Self::Tet10 => 10,
            Self::Hex20 => 20,
        }
    }

    /// Number of corner nodes.
    #[must_use]
    pub fn corner_count(self) -> usize {
        match self {
            Self::Line2 | Self::Line3 => 2,
            Self::Tri3 | Self::Tri6 => 3,
            Self::Quad4 | Self::Quad8 | Self::Tet4 | Self::Tet10 => 4,
            Self::Hex8 | Self::Hex20 => 8,
        }
    }

    /// Topological dimension.
    #[must_use]
    pub fn dim(self) -> u8 {
        match self {
            Self::Line2 | Self::Line3 => 1,
            Self::Tri3 | Self::Tri6 | Self::Quad4 | Self::Quad8 => 2,
            Self::Tet4 | Self::Tet10 | Self::Hex8 | Self::Hex20 => 3,
        }
    }
}

/// A mesh element with canonically ordered nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub shape: ElementShape,
    pub nodes: Vec<NodeId>,
}

/// Named node/element collection traceable to a domain object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FemSet {
    pub name: String,
    /// Name of the originating object.
    pub owner: String,
    pub nodes: BTreeSet<NodeId>,
    pub elements: BTreeSet<ElementId>,
}

impl FemSet {
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            ..Self::default()
        }
    }
}

/// Nodes, elements and sets of a meshed model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FemModel {
    nodes: BTreeMap<NodeId, Node>,
    elements: BTreeMap<ElementId, Element>,
    sets: BTreeMap<String, FemSet>,
}

impl FemModel {
    /// First id handed out for nodes and elements.
    pub const ID_BASE: usize = 1;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Inserts an element, replacing any element with the same id.
    pub fn insert_element(&mut self, element: Element) {
        self.elements.insert(element.id, element);
    }

    /// Adds a set.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSetName`] if the name is taken.
    pub fn add_set(&mut self, set: FemSet, stage: Stage) -> Result<(), ModelError> {
        if self.sets.contains_key(&set.name) {
            return Err(ModelError::DuplicateSetName { name: set.name, stage });
        }
        self.sets.insert(set.name.clone(), set);
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn sets(&self) -> impl Iterator<Item = &FemSet> {
        self.sets.values()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    #[must_use]
    pub fn set(&self, name: &str) -> Option<&FemSet> {
        self.sets.get(name)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Largest node id, or `ID_BASE - 1` for an empty model.
    #[must_use]
    pub fn max_node_id(&self) -> usize {
        self.nodes.keys().next_back().map_or(Self::ID_BASE - 1, |id| id.0)
    }

    /// Largest element id, or `ID_BASE - 1` for an empty model.
    #[must_use]
    pub fn max_element_id(&self) -> usize {
        self.elements.keys().next_back().map_or(Self::ID_BASE - 1, |id| id.0)
    }

    /// Nodes within `tolerance` of `point`.
    #[must_use]
    pub fn nodes_near(&self, point: &Point3, tolerance: f64) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| (n.point - point).norm() <= tolerance)
            .collect()
    }

    /// Elements referencing a node.
    #[must_use]
    pub fn elements_with_node(&self, id: NodeId) -> Vec<&Element> {
        self.elements.values().filter(|e| e.nodes.contains(&id)).collect()
    }

    /// Nodes referenced by the elements of a set.
    #[must_use]
    pub fn element_nodes(&self, set: &FemSet) -> BTreeSet<NodeId> {
        set.elements
            .iter()
            .filter_map(|id| self.elements.get(id))
            .flat_map(|e| e.nodes.iter().copied())
            .collect()
    }

    /// Moves `other` into this model, shifting its ids by the given offsets.
    ///
    /// Nothing is inserted unless every check passes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSetName`] on a set name clash, and
    /// [`ModelError::NodeIdCollision`] / [`ModelError::ElementIdCollision`]
    /// if a shifted id is already taken.
    pub fn merge(
        &mut self,
        other: FemModel,
        node_offset: usize,
        element_offset: usize,
        task: &str,
    ) -> Result<(), ModelError> {
        if let Some(name) = other.sets.keys().find(|n| self.sets.contains_key(*n)) {
            return Err(ModelError::DuplicateSetName {
                name: name.clone(),
                stage: Stage::Merging,
            });
        }
        let shift_node = |id: NodeId| NodeId(id.0 + node_offset);
        let shift_element = |id: ElementId| ElementId(id.0 + element_offset);
        if let Some(id) = other.nodes.keys().map(|&id| shift_node(id)).find(|id| self.nodes.contains_key(id)) {
            return Err(ModelError::NodeIdCollision {
                id: id.0,
                task: task.to_owned(),
            });
        }
        if let Some(id) = other
            .elements
            .keys()
            .map(|&id| shift_element(id))
            .find(|id| self.elements.contains_key(id))
        {
            return Err(ModelError::ElementIdCollision {
                id: id.0,
                task: task.to_owned(),
            });
        }

        for (_, mut node) in other.nodes {
            node.id = shift_node(node.id);
            self.nodes.insert(node.id, node);
        }
        for (_, mut element) in other.elements {
            element.id = shift_element(element.id);
            element.nodes = element.nodes.into_iter().map(shift_node).collect();
            self.elements.insert(element.id, element);
        }
        for (name, mut set) in other.sets {
            set.nodes = set.nodes.into_iter().map(shift_node).collect();
            set.elements = set.elements.into_iter().map(shift_element).collect();
            self.sets.insert(name, set);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line_model(set: &str, session: u64) -> FemModel {
        let mut model = FemModel::new();
        for (i, x) in [0.0, 1.0].into_iter().enumerate() {
            model.insert_node(Node {
                id: NodeId(i + 1),
                point: Point3::new(x, 0.0, 0.0),
                session: SessionId(session),
            });
        }
        model.insert_element(Element {
            id: ElementId(1),
            shape: ElementShape::Line2,
            nodes: vec![NodeId(1), NodeId(2)],
        });
        let mut s = FemSet::new(set, set);
        s.nodes.extend([NodeId(1), NodeId(2)]);
        s.elements.insert(ElementId(1));
        model.add_set(s, Stage::Harvesting).unwrap();
        model
    }

    #[test]
    fn empty_model_ids_sit_below_base() {
        let model = FemModel::new();
        assert_eq!(model.max_node_id(), FemModel::ID_BASE - 1);
        assert_eq!(model.max_element_id(), FemModel::ID_BASE - 1);
    }

    #[test]
    fn merge_shifts_ids_and_sets() {
        let mut a = line_model("a", 1);
        let b = line_model("b", 2);
        let (dn, de) = (a.max_node_id(), a.max_element_id());
        a.merge(b, dn, de, "second").unwrap();
        assert_eq!(a.node_count(), 4);
        assert_eq!(a.element_count(), 2);
        let set = a.set("b").unwrap();
        assert_eq!(set.nodes, BTreeSet::from([NodeId(3), NodeId(4)]));
        assert_eq!(a.element(ElementId(2)).unwrap().nodes, vec![NodeId(3), NodeId(4)]);
        assert_eq!(a.element_nodes(set), set.nodes);
    }

    #[test]
    fn merge_rejects_duplicate_set_names() {
        let mut a = line_model("deck", 1);
        let err = a.merge(line_model("deck", 2), 2, 1, "second").unwrap_err();
        assert!(matches!(err, ModelError::DuplicateSetName { stage: Stage::Merging, .. }));
        assert_eq!(a.node_count(), 2);
    }

    #[test]
    fn merge_rejects_colliding_ids() {
        let mut a = line_model("a", 1);
        let err = a.merge(line_model("b", 2), 1, 1, "second").unwrap_err();
        assert!(matches!(err, ModelError::NodeIdCollision { id: 2, .. }));
        let err = a.merge(line_model("c", 2), 2, 0, "third").unwrap_err();
        assert!(matches!(err, ModelError::ElementIdCollision { id: 1, .. }));
    }

    #[test]
    fn type_codes_round_trip_through_shapes() {
        let shape = ElementShape::from_type_code(element_type::HEX20).unwrap();
        assert_eq!(shape, ElementShape::Hex20);
        assert_eq!(shape.node_count(), 20);
        assert_eq!(shape.corner_count(), 8);
        assert!(ElementShape::from_type_code(15).is_none());
    }
}
