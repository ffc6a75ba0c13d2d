//! Detection of required splits between interacting objects.
//!
//! Planning reads a snapshot of the registry and never touches the kernel.
//! The resulting [`PartitionPlan`] is grouped into [`FragmentBatch`]es,
//! each applied with a single kernel fragmentation.

mod batches;
mod broad_phase;
mod crossing;
pub mod faces;
mod member_surface;
mod surfaces;

use tracing::{debug, info, warn};

use crate::adapter::{Block, GeometrySource, Patch, Segment};
use crate::config::PlannerOptions;
use crate::error::PartitionError;
use crate::kernel::CutGeometry;
use crate::math::{Point3, Vector3};
use crate::registry::{EntityRegistry, ObjectKey};

/// A pending split targeting one or more objects.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionCut {
    pub geometry: CutGeometry,
    pub targets: Vec<ObjectKey>,
}

impl PartitionCut {
    #[must_use]
    pub fn point(point: Point3, target: ObjectKey) -> Self {
        Self {
            geometry: CutGeometry::Point(point),
            targets: vec![target],
        }
    }

    #[must_use]
    pub fn line(start: Point3, end: Point3, target: ObjectKey) -> Self {
        Self {
            geometry: CutGeometry::Line { start, end },
            targets: vec![target],
        }
    }

    #[must_use]
    pub fn plane(origin: Point3, normal: Vector3, targets: Vec<ObjectKey>) -> Self {
        Self {
            geometry: CutGeometry::Plane { origin, normal },
            targets,
        }
    }
}

/// Objects fragmented together, with every cut that targets them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentBatch {
    pub objects: Vec<ObjectKey>,
    pub cuts: Vec<PartitionCut>,
}

/// Output of planning: contacts, cuts and the issues that were skipped.
#[derive(Debug, Clone, Default)]
pub struct PartitionPlan {
    /// Object pairs that must share topology.
    pub contacts: Vec<(ObjectKey, ObjectKey)>,
    pub cuts: Vec<PartitionCut>,
    pub warnings: Vec<PartitionError>,
}

impl PartitionPlan {
    /// Adds a cut, dropping degenerate ones.
    pub fn stage(&mut self, cut: PartitionCut, tolerance: f64) {
        if cut.geometry.is_degenerate(tolerance) || cut.targets.is_empty() {
            debug!(?cut.geometry, "dropping degenerate cut");
            return;
        }
        if !self.cuts.contains(&cut) {
            self.cuts.push(cut);
        }
    }

    /// Groups the plan into batches over connected objects.
    ///
    /// Also returns the contacts that could not be honored because they
    /// would join grids with misaligned frames.
    #[must_use]
    pub fn batches(&self, registry: &EntityRegistry) -> (Vec<FragmentBatch>, Vec<PartitionError>) {
        batches::group(registry, &self.contacts, &self.cuts)
    }
}

/// One geometric primitive of a registered object.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Primitive<'a> {
    Segment(&'a Segment),
    Patch(&'a Patch),
    Block(&'a Block),
}

pub(crate) fn primitives(source: &GeometrySource) -> Vec<Primitive<'_>> {
    match source {
        GeometrySource::Line(s) => s.iter().map(Primitive::Segment).collect(),
        GeometrySource::Shell(p) => p.iter().map(Primitive::Patch).collect(),
        GeometrySource::Solid(b) => b.iter().map(Primitive::Block).collect(),
    }
}

/// Shared state of the narrow phase for one object pair.
pub(crate) struct PairContext<'p> {
    pub options: PlannerOptions,
    pub names: (&'p str, &'p str),
    pub keys: (ObjectKey, ObjectKey),
    pub plan: &'p mut PartitionPlan,
    pub touching: bool,
    /// Smallest separation seen among non-touching primitive pairs.
    pub nearest_miss: Option<f64>,
}

impl<'p> PairContext<'p> {
    pub fn cut(&mut self, cut: PartitionCut) {
        self.plan.stage(cut, self.options.tolerance);
    }

    /// Keys and names ordered to match the primitive arguments of a
    /// narrow-phase routine.
    pub fn ordered(&self, swapped: bool) -> ((ObjectKey, &'p str), (ObjectKey, &'p str)) {
        let a = (self.keys.0, self.names.0);
        let b = (self.keys.1, self.names.1);
        if swapped {
            (b, a)
        } else {
            (a, b)
        }
    }

    pub fn touch(&mut self) {
        self.touching = true;
    }

    pub fn miss(&mut self, distance: f64) {
        if distance > self.options.tolerance && distance <= self.options.near_miss {
            self.nearest_miss = Some(self.nearest_miss.map_or(distance, |d: f64| d.min(distance)));
        }
    }

    pub fn ambiguous(&mut self, object: &str, reason: String) {
        warn!(object, %reason, "partition ambiguous; skipping");
        self.plan.warnings.push(PartitionError::Ambiguous {
            object: object.to_owned(),
            reason,
        });
    }
}

/// Plans the cuts needed between every registered object.
pub struct PlanPartition<'r> {
    registry: &'r EntityRegistry,
    options: PlannerOptions,
}

impl<'r> PlanPartition<'r> {
    /// Creates a new `PlanPartition` operation.
    #[must_use]
    pub fn new(registry: &'r EntityRegistry, options: PlannerOptions) -> Self {
        Self { registry, options }
    }

    /// Executes the broad and narrow phases.
    #[must_use]
    pub fn execute(&self) -> PartitionPlan {
        let mut plan = PartitionPlan::default();
        let boxes: Vec<_> = self
            .registry
            .iter()
            .filter_map(|(key, obj)| Some((key, obj.source.bounding_box()?)))
            .collect();
        let margin = self.options.tolerance.max(self.options.near_miss);
        let pairs = broad_phase::candidate_pairs(&boxes, margin);
        debug!(objects = boxes.len(), candidates = pairs.len(), "broad phase complete");

        for (i, j) in pairs {
            let (ka, kb) = (boxes[i].0, boxes[j].0);
            let (Some(a), Some(b)) = (self.registry.get(ka), self.registry.get(kb)) else {
                continue;
            };
            let mut ctx = PairContext {
                options: self.options,
                names: (&a.name, &b.name),
                keys: (ka, kb),
                plan: &mut plan,
                touching: false,
                nearest_miss: None,
            };
            for pa in primitives(&a.source) {
                for pb in primitives(&b.source) {
                    narrow_phase(&mut ctx, pa, pb);
                }
            }
            let (touching, nearest_miss) = (ctx.touching, ctx.nearest_miss);
            if touching {
                plan.contacts.push((ka, kb));
            } else if let Some(gap) = nearest_miss {
                warn!(first = %a.name, second = %b.name, gap, "missing expected intersection");
                plan.warnings.push(PartitionError::MissingIntersection {
                    first: a.name.clone(),
                    second: b.name.clone(),
                    gap,
                });
            }
        }
        info!(
            contacts = plan.contacts.len(),
            cuts = plan.cuts.len(),
            warnings = plan.warnings.len(),
            "partition planned"
        );
        plan
    }
}

/// Dispatches one primitive pair, ordering it so the lower-dimensional
/// primitive comes first.
fn narrow_phase(ctx: &mut PairContext<'_>, a: Primitive<'_>, b: Primitive<'_>) {
    use Primitive::{Block as B, Patch as P, Segment as S};
    match (a, b) {
        (S(sa), S(sb)) => crossing::segment_segment(ctx, sa, sb, false),
        (S(s), P(p)) => member_surface::segment_patch(ctx, s, p, false),
        (P(p), S(s)) => member_surface::segment_patch(ctx, s, p, true),
        (S(s), B(b)) => member_surface::segment_block(ctx, s, b, false),
        (B(b), S(s)) => member_surface::segment_block(ctx, s, b, true),
        (P(pa), P(pb)) => surfaces::patch_patch(ctx, pa, pb),
        (P(p), B(b)) => surfaces::patch_block(ctx, p, b, false),
        (B(b), P(p)) => surfaces::patch_block(ctx, p, b, true),
        (B(ba), B(bb)) => surfaces::block_block(ctx, ba, bb),
    }
}

/// Checks if parameter `t` on a segment of `length` is away from both ends.
pub(crate) fn is_interior(t: f64, length: f64, tolerance: f64) -> bool {
    t * length > tolerance && (1.0 - t) * length > tolerance
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapter::{Adapt, GeomRepr};
    use crate::fem::SessionId;
    use crate::kernel::KernelEntity;
    use crate::structure::section::{CrossSection, ISection, RectangularSection};
    use crate::structure::{Beam, Plate, StructuralObject};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn beam(name: &str, a: Point3, b: Point3) -> StructuralObject {
        Beam::new(name, a, b, CrossSection::Rectangle(RectangularSection::new(0.01, 0.01))).into()
    }

    fn registry(objects: &[(StructuralObject, GeomRepr)]) -> EntityRegistry {
        let mut reg = EntityRegistry::new(SessionId(0));
        for (i, (obj, repr)) in objects.iter().enumerate() {
            let source = Adapt::new(obj, *repr).execute().unwrap();
            let tag = u32::try_from(i + 1).unwrap();
            reg.register(obj, source, vec![KernelEntity::new(1, tag)]).unwrap();
        }
        reg
    }

    fn point_cuts_on(plan: &PartitionPlan, key: ObjectKey) -> Vec<Point3> {
        plan.cuts
            .iter()
            .filter(|c| c.targets.contains(&key))
            .filter_map(|c| match c.geometry {
                CutGeometry::Point(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn crossing_beams_are_both_cut() {
        let reg = registry(&[
            (beam("a", p(0.0, 0.5, 0.0), p(1.0, 0.5, 0.0)), GeomRepr::Line),
            (beam("b", p(0.5, 0.0, 0.0), p(0.5, 1.0, 0.0)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        let (a, b) = (reg.key_of("a").unwrap(), reg.key_of("b").unwrap());
        assert_eq!(plan.contacts, vec![(a, b)]);
        assert_eq!(point_cuts_on(&plan, a), vec![p(0.5, 0.5, 0.0)]);
        assert_eq!(point_cuts_on(&plan, b), vec![p(0.5, 0.5, 0.0)]);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn t_junction_cuts_only_the_through_member() {
        let reg = registry(&[
            (beam("through", p(0.5, 0.0, 0.0), p(0.5, 1.0, 0.0)), GeomRepr::Line),
            (beam("stub", p(0.0, 0.25, 0.0), p(0.5, 0.25, 0.0)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        assert_eq!(point_cuts_on(&plan, reg.key_of("through").unwrap()).len(), 1);
        assert!(point_cuts_on(&plan, reg.key_of("stub").unwrap()).is_empty());
        assert_eq!(plan.contacts.len(), 1);
    }

    #[test]
    fn near_miss_is_not_a_contact() {
        let reg = registry(&[
            (beam("a", p(0.0, 0.5, 0.0), p(1.0, 0.5, 0.0)), GeomRepr::Line),
            (beam("b", p(0.5, 0.0, 0.0005), p(0.5, 1.0, 0.0005)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        assert!(plan.contacts.is_empty());
        assert!(plan.cuts.is_empty());
        assert!(plan.batches(&reg).0.is_empty());
        assert_eq!(plan.warnings.len(), 1);
        let PartitionError::MissingIntersection { first, second, gap } = &plan.warnings[0] else {
            panic!("expected a missing intersection, got {:?}", plan.warnings[0]);
        };
        assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
        assert!((gap - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn parallel_members_report_their_gap() {
        let reg = registry(&[
            (beam("lower", p(0.0, 0.5, 0.0), p(1.0, 0.5, 0.0)), GeomRepr::Line),
            (beam("upper", p(0.2, 0.5, 0.0004), p(0.8, 0.5, 0.0004)), GeomRepr::Line),
            (beam("distant", p(0.0, 0.5, 0.5), p(1.0, 0.5, 0.5)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        assert!(plan.contacts.is_empty());
        assert_eq!(plan.warnings.len(), 1);
        assert!(matches!(
            &plan.warnings[0],
            PartitionError::MissingIntersection { gap, .. } if (gap - 0.0004).abs() < 1e-12
        ));
    }

    #[test]
    fn beam_on_plate_gets_line_cut() {
        let reg = registry(&[
            (Plate::horizontal("deck", (0.0, 0.0), (2.0, 1.0), 0.0, 0.01).into(), GeomRepr::Shell),
            (beam("joist", p(0.5, 0.5, 0.0), p(1.5, 0.5, 0.0)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        let deck = reg.key_of("deck").unwrap();
        assert!(plan
            .cuts
            .iter()
            .any(|c| c.targets == vec![deck] && matches!(c.geometry, CutGeometry::Line { .. })));
        assert_eq!(plan.batches(&reg).0.len(), 1);
    }

    #[test]
    fn diagonal_beam_on_plate_is_ambiguous() {
        let reg = registry(&[
            (Plate::horizontal("deck", (0.0, 0.0), (2.0, 1.0), 0.0, 0.01).into(), GeomRepr::Shell),
            (beam("brace", p(0.2, 0.2, 0.0), p(1.0, 0.8, 0.0)), GeomRepr::Line),
        ]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.contacts.is_empty());
    }

    #[test]
    fn thin_walled_beam_forms_its_own_batch() {
        let i_beam: StructuralObject = Beam::new(
            "girder",
            p(0.0, 0.0, 0.0),
            p(3.0, 0.0, 0.0),
            CrossSection::I(ISection::new(0.3, 0.15, 0.0071, 0.0107)),
        )
        .into();
        let reg = registry(&[(i_beam, GeomRepr::Shell)]);
        let plan = PlanPartition::new(&reg, PlannerOptions::default()).execute();
        let (batches, warnings) = plan.batches(&reg);
        assert!(warnings.is_empty());
        assert_eq!(batches.len(), 1);
        assert!(batches[0].cuts.is_empty());
    }

    #[test]
    fn degenerate_cuts_are_dropped() {
        let mut plan = PartitionPlan::default();
        let reg = registry(&[(beam("a", p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)), GeomRepr::Line)]);
        let a = reg.key_of("a").unwrap();
        plan.stage(PartitionCut::line(p(0.2, 0.0, 0.0), p(0.2, 0.0, 0.0), a), 1e-6);
        plan.stage(PartitionCut::plane(p(0.0, 0.0, 0.0), Vector3::zeros(), vec![a]), 1e-6);
        assert!(plan.cuts.is_empty());
    }
}
