//! The meshing kernel boundary.
//!
//! A kernel owns geometric entities addressed by `(dim, tag)` handles,
//! fragments them against each other in batches, and generates a mesh whose
//! raw output (node coordinates, element blocks in kernel-native node order)
//! is read back by the harvester.

pub mod grid;

pub use grid::GridKernel;

use std::fmt;

use crate::adapter::{Block, Patch, Segment};
use crate::config::MeshParams;
use crate::error::KernelError;
use crate::math::{Point3, Vector3};

/// Opaque handle to a kernel entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelEntity {
    /// Topological dimension (1 curve, 2 surface, 3 volume).
    pub dim: u8,
    /// Tag, unique per dimension.
    pub tag: u32,
}

impl KernelEntity {
    #[must_use]
    pub fn new(dim: u8, tag: u32) -> Self {
        Self { dim, tag }
    }
}

impl fmt::Display for KernelEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dim, self.tag)
    }
}

/// Geometry of a cut tool.
#[derive(Debug, Clone, PartialEq)]
pub enum CutGeometry {
    /// Splits at a point.
    Point(Point3),
    /// Splits along a bounded line.
    Line { start: Point3, end: Point3 },
    /// Splits along an unbounded plane.
    Plane { origin: Point3, normal: Vector3 },
}

impl CutGeometry {
    /// Checks if the cut has zero extent where extent matters.
    #[must_use]
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        match self {
            Self::Point(_) => false,
            Self::Line { start, end } => (end - start).norm() <= tolerance,
            Self::Plane { normal, .. } => normal.norm() <= tolerance,
        }
    }
}

/// A cut tool together with the entities it may split.
#[derive(Debug, Clone, PartialEq)]
pub struct CutTool {
    pub geometry: CutGeometry,
    pub targets: Vec<KernelEntity>,
}

/// Old → new entity mapping returned by a fragmentation.
///
/// Entries follow the order of the fragmented objects. Two old entities may
/// map to the same new entity when their pieces coincide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentMap {
    pub entries: Vec<(KernelEntity, Vec<KernelEntity>)>,
}

impl FragmentMap {
    /// Pieces that replaced `old`.
    #[must_use]
    pub fn pieces_of(&self, old: KernelEntity) -> Option<&[KernelEntity]> {
        self.entries
            .iter()
            .find(|(e, _)| *e == old)
            .map(|(_, pieces)| pieces.as_slice())
    }

    /// Total number of pieces, counting shared ones once per owner.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.entries.iter().map(|(_, p)| p.len()).sum()
    }
}

/// Kernel type codes for element blocks.
pub mod element_type {
    pub const LINE2: i32 = 1;
    pub const TRI3: i32 = 2;
    pub const QUAD4: i32 = 3;
    pub const TET4: i32 = 4;
    pub const HEX8: i32 = 5;
    pub const LINE3: i32 = 8;
    pub const TRI6: i32 = 9;
    pub const TET10: i32 = 11;
    pub const QUAD8: i32 = 16;
    pub const HEX20: i32 = 17;

    /// Number of nodes per element for a type code.
    #[must_use]
    pub fn node_count(type_code: i32) -> Option<usize> {
        Some(match type_code {
            LINE2 => 2,
            TRI3 | LINE3 => 3,
            QUAD4 | TET4 => 4,
            TRI6 => 6,
            HEX8 | QUAD8 => 8,
            TET10 => 10,
            HEX20 => 20,
            _ => return None,
        })
    }
}

/// Elements of one type on one entity, in kernel-native node order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementBlock {
    /// Kernel type code (see [`element_type`]).
    pub type_code: i32,
    /// Element tags.
    pub tags: Vec<usize>,
    /// Node tags, `nodes_per_element` per element, flattened.
    pub nodes: Vec<usize>,
}

impl ElementBlock {
    #[must_use]
    pub fn new(type_code: i32) -> Self {
        Self {
            type_code,
            ..Self::default()
        }
    }

    /// Iterates `(element tag, node tags)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        let n = element_type::node_count(self.type_code).unwrap_or(1);
        self.tags.iter().copied().zip(self.nodes.chunks_exact(n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Operations a meshing kernel provides to a session.
///
/// Kernels are stateful and not reentrant; sessions serialize access.
pub trait MeshKernel {
    /// Adds a straight curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is degenerate.
    fn add_segment(&mut self, segment: &Segment) -> Result<KernelEntity, KernelError>;

    /// Adds a rectangular surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is degenerate.
    fn add_patch(&mut self, patch: &Patch) -> Result<KernelEntity, KernelError>;

    /// Adds a rectangular volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is degenerate.
    fn add_block(&mut self, block: &Block) -> Result<KernelEntity, KernelError>;

    /// Fragments `objects` against each other and against `tools` in one
    /// batch, so shared boundaries become shared topology.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity is unknown or a cut cannot be made
    /// conforming.
    fn fragment(&mut self, objects: &[KernelEntity], tools: &[CutTool]) -> Result<FragmentMap, KernelError>;

    /// Generates the mesh of every entity.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters or elements below the
    /// requested quality.
    fn mesh(&mut self, params: &MeshParams) -> Result<(), KernelError>;

    /// Number of mesh nodes.
    fn node_count(&self) -> usize;

    /// Coordinates of a mesh node.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh exists or the tag is unknown.
    fn node(&self, tag: usize) -> Result<Point3, KernelError>;

    /// Element blocks meshed on one entity.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh exists or the entity is unknown.
    fn elements(&self, entity: KernelEntity) -> Result<Vec<ElementBlock>, KernelError>;

    /// Geometric center of an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is unknown.
    fn centroid(&self, entity: KernelEntity) -> Result<Point3, KernelError>;

    /// Opens the kernel's interactive viewer, if it has one.
    fn open_viewer(&mut self);

    /// Drops every entity and mesh.
    fn clear(&mut self);
}
