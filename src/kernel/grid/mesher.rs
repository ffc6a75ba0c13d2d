use std::collections::HashMap;

use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::debug;

use crate::adapter::Segment;
use crate::config::{ElementOrder, MeshParams};
use crate::error::KernelError;
use crate::kernel::{element_type, ElementBlock, KernelEntity};
use crate::math::{span_count, Frame, Point3};

use super::cell::Cell;
use super::locator::NodeLocator;
use super::quality::{tet_quality, tet_volume, tri_quality};
use super::stations::Stations;

/// Axis orders of the six Kuhn tetrahedra sharing a hexahedron's main diagonal.
const KUHN_PATHS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

/// Native edge order of a 20-node hexahedron.
const HEX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (0, 3),
    (0, 4),
    (1, 2),
    (1, 5),
    (2, 3),
    (2, 6),
    (3, 7),
    (4, 5),
    (4, 7),
    (5, 6),
    (6, 7),
];

/// Native edge order of a 10-node tetrahedron.
const TET_EDGES: [(usize, usize); 6] = [(0, 1), (1, 2), (0, 2), (0, 3), (2, 3), (1, 3)];

/// Raw mesh output.
#[derive(Debug, Default)]
pub(super) struct MeshData {
    /// Node coordinates; node `tag` lives at `nodes[tag - 1]`.
    pub nodes: Vec<Point3>,
    pub blocks: HashMap<KernelEntity, Vec<ElementBlock>>,
}

/// Accumulates nodes and elements while walking the entities of each group.
pub(super) struct MeshBuilder<'p> {
    params: &'p MeshParams,
    tolerance: f64,
    locator: NodeLocator,
    next_element: usize,
    data: MeshData,
}

impl<'p> MeshBuilder<'p> {
    pub fn new(params: &'p MeshParams, tolerance: f64) -> Self {
        Self {
            params,
            tolerance,
            locator: NodeLocator::new(tolerance),
            next_element: 1,
            data: MeshData::default(),
        }
    }

    /// Starts a new fragment group. Nodes never merge across groups.
    pub fn begin_group(&mut self) {
        self.locator = NodeLocator::new(self.tolerance);
    }

    pub fn finish(self) -> MeshData {
        self.data
    }

    fn quadratic(&self) -> bool {
        self.params.order == ElementOrder::Quadratic
    }

    fn node(&mut self, p: Point3) -> usize {
        if let Some(tag) = self.locator.find(&p, &self.data.nodes) {
            return tag;
        }
        self.data.nodes.push(p);
        let tag = self.data.nodes.len();
        self.locator.insert(&p, tag);
        tag
    }

    fn coords(&self, tag: usize) -> Point3 {
        self.data.nodes[tag - 1]
    }

    fn midside(&mut self, a: usize, b: usize) -> usize {
        let m = nalgebra::center(&self.coords(a), &self.coords(b));
        self.node(m)
    }

    fn push(&mut self, entity: KernelEntity, type_code: i32, nodes: &[usize]) {
        let blocks = self.data.blocks.entry(entity).or_default();
        let pos = match blocks.iter().position(|b| b.type_code == type_code) {
            Some(pos) => pos,
            None => {
                blocks.push(ElementBlock::new(type_code));
                blocks.len() - 1
            }
        };
        blocks[pos].tags.push(self.next_element);
        blocks[pos].nodes.extend_from_slice(nodes);
        self.next_element += 1;
    }

    fn line(&mut self, entity: KernelEntity, a: usize, b: usize) {
        if self.quadratic() {
            let m = self.midside(a, b);
            self.push(entity, element_type::LINE3, &[a, b, m]);
        } else {
            self.push(entity, element_type::LINE2, &[a, b]);
        }
    }

    fn with_edges(&mut self, corners: &[usize], edges: &[(usize, usize)]) -> Vec<usize> {
        let mut nodes = corners.to_vec();
        for &(a, b) in edges {
            let m = self.midside(corners[a], corners[b]);
            nodes.push(m);
        }
        nodes
    }

    fn triangle(&mut self, entity: KernelEntity, t: [usize; 3]) -> f64 {
        if self.quadratic() {
            let nodes = self.with_edges(&t, &[(0, 1), (1, 2), (2, 0)]);
            self.push(entity, element_type::TRI6, &nodes);
        } else {
            self.push(entity, element_type::TRI3, &t);
        }
        tri_quality(&t.map(|n| self.coords(n)))
    }

    fn quad(&mut self, entity: KernelEntity, q: [usize; 4]) {
        if self.quadratic() {
            let nodes = self.with_edges(&q, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
            self.push(entity, element_type::QUAD8, &nodes);
        } else {
            self.push(entity, element_type::QUAD4, &q);
        }
    }

    fn tet(&mut self, entity: KernelEntity, mut t: [usize; 4]) -> f64 {
        if tet_volume(&t.map(|n| self.coords(n))) < 0.0 {
            t.swap(1, 2);
        }
        if self.quadratic() {
            let nodes = self.with_edges(&t, &TET_EDGES);
            self.push(entity, element_type::TET10, &nodes);
        } else {
            self.push(entity, element_type::TET4, &t);
        }
        tet_quality(&t.map(|n| self.coords(n)))
    }

    fn hex(&mut self, entity: KernelEntity, h: [usize; 8]) {
        if self.quadratic() {
            let nodes = self.with_edges(&h, &HEX_EDGES);
            self.push(entity, element_type::HEX20, &nodes);
        } else {
            self.push(entity, element_type::HEX8, &h);
        }
    }

    /// Meshes a free segment with equal spans.
    #[allow(clippy::cast_precision_loss)]
    pub fn segment(&mut self, entity: KernelEntity, segment: &Segment) {
        let n = span_count(segment.length(), self.params.size);
        let tags: Vec<usize> = (0..=n).map(|i| self.node(segment.at(i as f64 / n as f64))).collect();
        for w in tags.windows(2) {
            self.line(entity, w[0], w[1]);
        }
    }

    /// Meshes a cell on the group's stations.
    ///
    /// # Errors
    ///
    /// Returns an error if triangulation fails or simplices fall below the
    /// quality threshold.
    pub fn cell(
        &mut self,
        entity: KernelEntity,
        cell: &Cell,
        frame: &Frame,
        stations: &Stations,
    ) -> Result<(), KernelError> {
        let tol = self.tolerance;
        let s: [Vec<f64>; 3] = std::array::from_fn(|a| {
            if cell.is_open(a, tol) {
                stations.within(a, cell.lo[a], cell.hi[a]).to_vec()
            } else {
                vec![cell.lo[a]]
            }
        });
        let grid = |mesher: &mut Self, idx: [usize; 3]| {
            mesher.node(frame.to_world([s[0][idx[0]], s[1][idx[1]], s[2][idx[2]]]))
        };
        let qualities = match cell.dim(tol) {
            1 => {
                let axis = cell.curve_axis(tol).unwrap_or(0);
                let tags: Vec<usize> = (0..s[axis].len())
                    .map(|i| {
                        let mut idx = [0; 3];
                        idx[axis] = i;
                        grid(self, idx)
                    })
                    .collect();
                for w in tags.windows(2) {
                    self.line(entity, w[0], w[1]);
                }
                Vec::new()
            }
            2 => {
                let k = cell.normal_axis(tol).unwrap_or(2);
                let (i, j) = ((k + 1) % 3, (k + 2) % 3);
                let tags: Vec<Vec<usize>> = (0..s[i].len())
                    .map(|a| {
                        (0..s[j].len())
                            .map(|b| {
                                let mut idx = [0; 3];
                                idx[i] = a;
                                idx[j] = b;
                                grid(self, idx)
                            })
                            .collect()
                    })
                    .collect();
                if self.params.use_quads {
                    for a in 0..tags.len() - 1 {
                        for b in 0..tags[a].len() - 1 {
                            self.quad(entity, [tags[a][b], tags[a + 1][b], tags[a + 1][b + 1], tags[a][b + 1]]);
                        }
                    }
                    Vec::new()
                } else {
                    self.triangulate(entity, &tags, &s[i], &s[j])?
                }
            }
            3 => {
                let tags: Vec<Vec<Vec<usize>>> = (0..s[0].len())
                    .map(|a| {
                        (0..s[1].len())
                            .map(|b| (0..s[2].len()).map(|c| grid(self, [a, b, c])).collect())
                            .collect()
                    })
                    .collect();
                self.volume(entity, &tags)
            }
            _ => {
                return Err(KernelError::DegenerateGeometry(format!(
                    "entity {entity} has no open axis"
                )))
            }
        };
        self.check_quality(entity, &qualities)
    }

    fn triangulate(
        &mut self,
        entity: KernelEntity,
        tags: &[Vec<usize>],
        si: &[f64],
        sj: &[f64],
    ) -> Result<Vec<f64>, KernelError> {
        let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
        let mut handles: Vec<Vec<FixedVertexHandle>> = Vec::with_capacity(si.len());
        let mut node_of: HashMap<usize, usize> = HashMap::new();
        for (a, &x) in si.iter().enumerate() {
            let mut column = Vec::with_capacity(sj.len());
            for (b, &y) in sj.iter().enumerate() {
                let h = cdt
                    .insert(SpadePoint2::new(x, y))
                    .map_err(|e: InsertionError| KernelError::Triangulation(format!("{entity}: {e}")))?;
                node_of.insert(h.index(), tags[a][b]);
                column.push(h);
            }
            handles.push(column);
        }

        let (na, nb) = (si.len() - 1, sj.len() - 1);
        let mut boundary: Vec<FixedVertexHandle> = Vec::new();
        boundary.extend((0..na).map(|a| handles[a][0]));
        boundary.extend((0..nb).map(|b| handles[na][b]));
        boundary.extend((1..=na).rev().map(|a| handles[a][nb]));
        boundary.extend((1..=nb).rev().map(|b| handles[0][b]));
        for i in 0..boundary.len() {
            let (from, to) = (boundary[i], boundary[(i + 1) % boundary.len()]);
            if from != to {
                cdt.add_constraint(from, to);
            }
        }

        let mut triangles = Vec::new();
        for face in cdt.inner_faces() {
            let verts = face.vertices();
            let mut t = [0usize; 3];
            for (slot, vh) in verts.iter().enumerate() {
                t[slot] = *node_of.get(&vh.fix().index()).ok_or_else(|| {
                    KernelError::Triangulation(format!("{entity}: triangle references an unknown vertex"))
                })?;
            }
            let [p0, p1, p2] = verts.map(|v| v.position());
            let orient = (p1.x - p0.x) * (p2.y - p0.y) - (p1.y - p0.y) * (p2.x - p0.x);
            if orient < 0.0 {
                t.swap(1, 2);
            }
            triangles.push(t);
        }
        debug!(%entity, triangles = triangles.len(), "triangulated surface");
        Ok(triangles.into_iter().map(|t| self.triangle(entity, t)).collect())
    }

    fn volume(&mut self, entity: KernelEntity, tags: &[Vec<Vec<usize>>]) -> Vec<f64> {
        let mut qualities = Vec::new();
        for a in 0..tags.len() - 1 {
            for b in 0..tags[a].len() - 1 {
                for c in 0..tags[a][b].len() - 1 {
                    let at = |bits: [usize; 3]| tags[a + bits[0]][b + bits[1]][c + bits[2]];
                    if self.params.use_hex {
                        self.hex(
                            entity,
                            [
                                at([0, 0, 0]),
                                at([1, 0, 0]),
                                at([1, 1, 0]),
                                at([0, 1, 0]),
                                at([0, 0, 1]),
                                at([1, 0, 1]),
                                at([1, 1, 1]),
                                at([0, 1, 1]),
                            ],
                        );
                        continue;
                    }
                    for path in KUHN_PATHS {
                        let mut bits = [0; 3];
                        let mut corners = [at(bits); 4];
                        for (step, &axis) in path.iter().enumerate() {
                            bits[axis] = 1;
                            corners[step + 1] = at(bits);
                        }
                        qualities.push(self.tet(entity, corners));
                    }
                }
            }
        }
        qualities
    }

    fn check_quality(&self, entity: KernelEntity, qualities: &[f64]) -> Result<(), KernelError> {
        let Some(threshold) = self.params.min_quality else {
            return Ok(());
        };
        let bad: Vec<f64> = qualities.iter().copied().filter(|&q| q < threshold).collect();
        if bad.is_empty() {
            return Ok(());
        }
        Err(KernelError::DegenerateElements {
            entity,
            count: bad.len(),
            worst: bad.iter().copied().fold(f64::INFINITY, f64::min),
            threshold,
        })
    }
}
