//! A deterministic structured kernel for straight segments, rectangular
//! patches and rectangular blocks.
//!
//! Entities fragmented together form a group sharing one frame. Every cell
//! boundary in a group becomes a mesh station on that frame's axes, so
//! touching cells always share nodes. Free segments (not parallel to any
//! frame axis) are split only at explicit cut points.

mod cell;
mod fragment;
mod locator;
mod mesher;
mod quality;
mod stations;

use std::collections::{BTreeMap, BTreeSet};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info, info_span};

use crate::adapter::{Block, Patch, Segment};
use crate::config::MeshParams;
use crate::error::KernelError;
use crate::kernel::{CutTool, ElementBlock, FragmentMap, KernelEntity, MeshKernel};
use crate::math::{Frame, Point3};

use cell::Cell;
use mesher::{MeshBuilder, MeshData};
use stations::Stations;

new_key_type! {
    /// Identifies a group of entities fragmented together.
    pub struct GroupId;
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Segment(Segment),
    Cell(Cell),
}

impl Shape {
    fn coincides(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (Self::Cell(a), Self::Cell(b)) => a.coincides(b, tol),
            (Self::Segment(a), Self::Segment(b)) => {
                let same = (a.start - b.start).norm() <= tol && (a.end - b.end).norm() <= tol;
                let flipped = (a.start - b.end).norm() <= tol && (a.end - b.start).norm() <= tol;
                same || flipped
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct EntityData {
    shape: Shape,
    group: GroupId,
}

#[derive(Debug, Clone, Default)]
struct Group {
    frame: Option<Frame>,
    members: BTreeSet<KernelEntity>,
}

/// Reference meshing kernel with exact, reproducible output.
#[derive(Debug)]
pub struct GridKernel {
    tolerance: f64,
    entities: BTreeMap<KernelEntity, EntityData>,
    groups: SlotMap<GroupId, Group>,
    next_tag: [u32; 4],
    mesh: Option<MeshData>,
    viewer_requests: usize,
}

impl Default for GridKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl GridKernel {
    /// Default distance under which coordinates are merged.
    pub const DEFAULT_TOLERANCE: f64 = 1e-8;

    #[must_use]
    pub fn new() -> Self {
        Self::with_tolerance(Self::DEFAULT_TOLERANCE)
    }

    #[must_use]
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            entities: BTreeMap::new(),
            groups: SlotMap::with_key(),
            next_tag: [1; 4],
            mesh: None,
            viewer_requests: 0,
        }
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of times the viewer was requested.
    #[must_use]
    pub fn viewer_requests(&self) -> usize {
        self.viewer_requests
    }

    fn allocate(&mut self, dim: u8) -> KernelEntity {
        let slot = usize::from(dim.min(3));
        let tag = self.next_tag[slot];
        self.next_tag[slot] += 1;
        KernelEntity::new(dim, tag)
    }

    fn shape_dim(&self, shape: &Shape) -> u8 {
        match shape {
            Shape::Segment(_) => 1,
            Shape::Cell(c) => c.dim(self.tolerance),
        }
    }

    fn insert_alone(&mut self, shape: Shape, frame: Option<Frame>) -> KernelEntity {
        let entity = self.allocate(self.shape_dim(&shape));
        let group = self.groups.insert(Group {
            frame,
            members: BTreeSet::from([entity]),
        });
        self.entities.insert(entity, EntityData { shape, group });
        self.mesh = None;
        entity
    }

    fn data(&self, entity: KernelEntity) -> Result<&EntityData, KernelError> {
        self.entities.get(&entity).ok_or(KernelError::EntityNotFound(entity))
    }

    /// Chooses the batch frame and re-expresses every member of the merged
    /// groups in it.
    fn merge_groups(&self, group_ids: &[GroupId]) -> Result<(Option<Frame>, BTreeMap<KernelEntity, Shape>), KernelError> {
        let frame = group_ids.iter().find_map(|g| self.groups[*g].frame.clone());
        let mut shapes = BTreeMap::new();
        for gid in group_ids {
            let group = &self.groups[*gid];
            for &member in &group.members {
                let shape = self.data(member)?.shape.clone();
                let shape = match (&shape, &group.frame, &frame) {
                    (Shape::Cell(c), Some(from), Some(to)) => Shape::Cell(c.reframed(from, to).ok_or_else(|| {
                        KernelError::NonConformingCut {
                            entity: member,
                            reason: "frame is not aligned with the rest of the batch".to_owned(),
                        }
                    })?),
                    _ => shape,
                };
                shapes.insert(member, shape);
            }
        }
        Ok((frame, shapes))
    }
}

impl MeshKernel for GridKernel {
    fn add_segment(&mut self, segment: &Segment) -> Result<KernelEntity, KernelError> {
        if segment.length() <= self.tolerance {
            return Err(KernelError::DegenerateGeometry("zero-length segment".to_owned()));
        }
        Ok(self.insert_alone(Shape::Segment(*segment), None))
    }

    fn add_patch(&mut self, patch: &Patch) -> Result<KernelEntity, KernelError> {
        let frame = patch
            .frame()
            .ok_or_else(|| KernelError::DegenerateGeometry("patch edges are not perpendicular".to_owned()))?;
        let cell = Cell::around(&frame, &patch.corners());
        Ok(self.insert_alone(Shape::Cell(cell), Some(frame)))
    }

    fn add_block(&mut self, block: &Block) -> Result<KernelEntity, KernelError> {
        let frame = block
            .frame()
            .ok_or_else(|| KernelError::DegenerateGeometry("block edges are not perpendicular".to_owned()))?;
        let cell = Cell::around(&frame, &block.corners());
        Ok(self.insert_alone(Shape::Cell(cell), Some(frame)))
    }

    fn fragment(&mut self, objects: &[KernelEntity], tools: &[CutTool]) -> Result<FragmentMap, KernelError> {
        let tol = self.tolerance;
        let _span = info_span!("fragment", objects = objects.len(), tools = tools.len()).entered();

        let mut ordered: Vec<KernelEntity> = Vec::with_capacity(objects.len());
        for &e in objects {
            self.data(e)?;
            if !ordered.contains(&e) {
                ordered.push(e);
            }
        }
        for tool in tools {
            for &target in &tool.targets {
                if !ordered.contains(&target) {
                    return Err(KernelError::NonConformingCut {
                        entity: target,
                        reason: "cut target is not part of the batch".to_owned(),
                    });
                }
            }
        }

        let mut group_ids: Vec<GroupId> = Vec::new();
        for e in &ordered {
            let g = self.entities[e].group;
            if !group_ids.contains(&g) {
                group_ids.push(g);
            }
        }
        let (frame, mut shapes) = self.merge_groups(&group_ids)?;

        // Curves parallel to the batch frame join the station grid.
        if let Some(frame) = &frame {
            for e in &ordered {
                if let Some(Shape::Segment(s)) = shapes.get(e) {
                    if let Some(cell) = Cell::from_segment(frame, s) {
                        shapes.insert(*e, Shape::Cell(cell));
                    }
                }
            }
        }

        let peers: Vec<Cell> = ordered
            .iter()
            .filter_map(|e| match &shapes[e] {
                Shape::Cell(c) => Some(*c),
                Shape::Segment(_) => None,
            })
            .collect();

        let mut produced: Vec<(Shape, KernelEntity)> = Vec::new();
        let mut entries = Vec::with_capacity(ordered.len());
        for &object in &ordered {
            let own_tools = tools.iter().filter(|t| t.targets.contains(&object));
            let pieces: Vec<Shape> = match &shapes[&object] {
                Shape::Cell(c) => {
                    let mut cuts = fragment::peer_splits(c, &peers, tol);
                    if let Some(frame) = &frame {
                        for tool in own_tools {
                            fragment::tool_splits_cell(object, c, frame, &tool.geometry, tol, &mut cuts)?;
                        }
                    }
                    c.split(&cuts, tol).into_iter().map(Shape::Cell).collect()
                }
                Shape::Segment(s) => {
                    let mut params = Vec::new();
                    for tool in own_tools {
                        fragment::tool_splits_segment(s, &tool.geometry, tol, &mut params);
                    }
                    fragment::split_segment(s, &params, tol)
                        .into_iter()
                        .map(Shape::Segment)
                        .collect()
                }
            };
            let unsplit = pieces.len() == 1;
            let mut new_entities = Vec::with_capacity(pieces.len());
            for piece in pieces {
                if let Some((_, existing)) = produced.iter().find(|(s, _)| s.coincides(&piece, tol)) {
                    if !new_entities.contains(existing) {
                        new_entities.push(*existing);
                    }
                    continue;
                }
                let entity = if unsplit { object } else { self.allocate(self.shape_dim(&piece)) };
                produced.push((piece, entity));
                new_entities.push(entity);
            }
            entries.push((object, new_entities));
        }

        let group = self.groups.insert(Group {
            frame,
            members: BTreeSet::new(),
        });
        let mut members = BTreeSet::new();
        for (member, shape) in shapes {
            if !ordered.contains(&member) {
                members.insert(member);
                self.entities.insert(member, EntityData { shape, group });
            }
        }
        for object in &ordered {
            self.entities.remove(object);
        }
        for (shape, entity) in produced {
            members.insert(entity);
            self.entities.insert(entity, EntityData { shape, group });
        }
        for gid in group_ids {
            self.groups.remove(gid);
        }
        self.groups[group].members = members;
        self.mesh = None;

        let map = FragmentMap { entries };
        debug!(pieces = map.piece_count(), "fragmentation complete");
        Ok(map)
    }

    fn mesh(&mut self, params: &MeshParams) -> Result<(), KernelError> {
        params.validate()?;
        let _span = info_span!("mesh", size = params.size).entered();
        let tol = self.tolerance;
        let mut builder = MeshBuilder::new(params, tol);
        for group in self.groups.values() {
            builder.begin_group();
            let cells: Vec<Cell> = group
                .members
                .iter()
                .filter_map(|e| match &self.entities.get(e)?.shape {
                    Shape::Cell(c) => Some(*c),
                    Shape::Segment(_) => None,
                })
                .collect();
            let stations = Stations::build(&cells, params, tol);
            for &entity in &group.members {
                match &self.data(entity)?.shape {
                    Shape::Segment(s) => builder.segment(entity, s),
                    Shape::Cell(c) => {
                        let frame = group.frame.as_ref().ok_or_else(|| {
                            KernelError::DegenerateGeometry(format!("cell {entity} has no frame"))
                        })?;
                        builder.cell(entity, c, frame, &stations)?;
                    }
                }
            }
        }
        let data = builder.finish();
        info!(nodes = data.nodes.len(), entities = data.blocks.len(), "mesh generated");
        self.mesh = Some(data);
        Ok(())
    }

    fn node_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, |m| m.nodes.len())
    }

    fn node(&self, tag: usize) -> Result<Point3, KernelError> {
        let mesh = self.mesh.as_ref().ok_or(KernelError::NotMeshed)?;
        tag.checked_sub(1)
            .and_then(|i| mesh.nodes.get(i))
            .copied()
            .ok_or_else(|| KernelError::InvalidParameters(format!("unknown node tag {tag}")))
    }

    fn elements(&self, entity: KernelEntity) -> Result<Vec<ElementBlock>, KernelError> {
        let mesh = self.mesh.as_ref().ok_or(KernelError::NotMeshed)?;
        self.data(entity)?;
        Ok(mesh.blocks.get(&entity).cloned().unwrap_or_default())
    }

    fn centroid(&self, entity: KernelEntity) -> Result<Point3, KernelError> {
        let data = self.data(entity)?;
        match &data.shape {
            Shape::Segment(s) => Ok(s.at(0.5)),
            Shape::Cell(c) => {
                let frame = self.groups[data.group].frame.as_ref().ok_or_else(|| {
                    KernelError::DegenerateGeometry(format!("cell {entity} has no frame"))
                })?;
                Ok(frame.to_world(c.center()))
            }
        }
    }

    fn open_viewer(&mut self) {
        self.viewer_requests += 1;
        info!(
            entities = self.entities.len(),
            nodes = self.node_count(),
            "grid kernel has no interactive viewer; state logged instead"
        );
    }

    fn clear(&mut self) {
        self.entities.clear();
        self.groups.clear();
        self.next_tag = [1; 4];
        self.mesh = None;
    }
}
