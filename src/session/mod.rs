//! Scoped, exclusive access to the meshing kernel.

pub mod checkpoint;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, info_span, warn};

use crate::adapter::{Adapt, GeomRepr, GeometrySource};
use crate::config::{MeshParams, SessionOptions};
use crate::error::{FempartError, KernelError, PartitionError, Result, SessionError, Stage};
use crate::fem::{FemModel, SessionId};
use crate::harvest::Harvest;
use crate::kernel::{CutTool, KernelEntity, MeshKernel};
use crate::math::{Point3, Vector3};
use crate::planner::faces::identify_faces;
use crate::planner::{PartitionCut, PartitionPlan, PlanPartition};
use crate::registry::{Collapse, EntityRegistry, ObjectKey};
use crate::structure::StructuralObject;

use checkpoint::Pause;

/// Id of the open session, or zero when the kernel is free.
static ACTIVE_SESSION: AtomicU64 = AtomicU64::new(0);
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Stage of one mesh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskState {
    Init,
    GeometryStaged,
    CutsStaged,
    Partitioned,
    Meshed,
    Harvested,
    Released,
}

impl TaskState {
    /// Checkpoint name announced on entering this state.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::GeometryStaged => "geometry_staged",
            Self::CutsStaged => "cuts_staged",
            Self::Partitioned => "partitioned",
            Self::Meshed => "meshed",
            Self::Harvested => "harvested",
            Self::Released => "released",
        }
    }

    /// Checks if `self → to` is a legal step.
    ///
    /// Staging states may be re-entered; release is always allowed.
    #[must_use]
    pub fn allows(self, to: Self) -> bool {
        use TaskState::{CutsStaged, GeometryStaged, Harvested, Init, Meshed, Partitioned, Released};
        matches!(
            (self, to),
            (Init | GeometryStaged, GeometryStaged)
                | (GeometryStaged | CutsStaged, CutsStaged)
                | (CutsStaged, Partitioned)
                | (Partitioned, Meshed)
                | (Meshed, Harvested)
        ) || (to == Released && self != Released)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of applying staged cuts.
#[derive(Debug, Clone, Default)]
pub struct PartitionReport {
    /// Cuts handed to the kernel.
    pub cuts_applied: usize,
    /// Kernel fragmentation calls made.
    pub batches: usize,
    /// Pieces that received a web or flange tag.
    pub faces: usize,
    pub warnings: Vec<PartitionError>,
    pub collapsed: Vec<Collapse>,
}

/// Exclusive use of a kernel for one mesh task.
///
/// Dropping the session clears the kernel and frees the process-wide slot.
pub struct KernelSession<'k, K: MeshKernel> {
    id: SessionId,
    kernel: &'k mut K,
    options: SessionOptions,
    registry: EntityRegistry,
    plan: PartitionPlan,
    state: TaskState,
}

impl<'k, K: MeshKernel> KernelSession<'k, K> {
    /// Opens a session on `kernel`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Conflict`] if another session is open
    /// anywhere in the process.
    pub fn open(kernel: &'k mut K, options: SessionOptions) -> Result<Self> {
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        if let Err(active) = ACTIVE_SESSION.compare_exchange(0, id, Ordering::AcqRel, Ordering::Acquire) {
            warn!(active, "kernel already in use");
            return Err(SessionError::Conflict { active }.into());
        }
        let id = SessionId(id);
        kernel.clear();
        info!(session = %id, "session opened");
        Ok(Self {
            id,
            kernel,
            options,
            registry: EntityRegistry::new(id),
            plan: PartitionPlan::default(),
            state: TaskState::Init,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Cuts and contacts staged so far.
    #[must_use]
    pub fn staged(&self) -> &PartitionPlan {
        &self.plan
    }

    fn check(&self, to: TaskState) -> Result<()> {
        if self.state.allows(to) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { from: self.state, to }.into())
        }
    }

    fn enter(&mut self, to: TaskState) {
        if self.state != to {
            debug!(session = %self.id, from = %self.state, %to, "state changed");
        }
        self.state = to;
        let pause = self
            .options
            .listener
            .as_ref()
            .map_or(Pause::Continue, |l| l.on_checkpoint(to.name()));
        if pause == Pause::OpenView {
            self.open_interactive_view(to.name());
        }
    }

    fn object_of(&self, entity: Option<KernelEntity>) -> Option<String> {
        let owner = *self.registry.owners_of(entity?).first()?;
        self.registry.name_of(owner).map(str::to_owned)
    }

    fn kernel_error(&self, stage: Stage, source: KernelError) -> FempartError {
        let object = self.object_of(source.entity());
        SessionError::Kernel { object, stage, source }.into()
    }

    /// Converts `object` to `repr` and adds it to the kernel.
    ///
    /// # Errors
    ///
    /// Returns an adapter error if the object cannot take `repr`, a
    /// [`crate::error::ModelError::DuplicateSetName`] if its name is taken,
    /// or a kernel error if the kernel rejects a primitive.
    pub fn add_object(&mut self, object: &StructuralObject, repr: GeomRepr) -> Result<ObjectKey> {
        self.check(TaskState::GeometryStaged)?;
        let source = Adapt::new(object, repr).execute()?;
        let added: std::result::Result<Vec<KernelEntity>, KernelError> = match &source {
            GeometrySource::Line(segments) => segments.iter().map(|s| self.kernel.add_segment(s)).collect(),
            GeometrySource::Shell(patches) => patches.iter().map(|p| self.kernel.add_patch(p)).collect(),
            GeometrySource::Solid(blocks) => blocks.iter().map(|b| self.kernel.add_block(b)).collect(),
        };
        let entities = added.map_err(|source| SessionError::Kernel {
            object: Some(object.name().to_owned()),
            stage: Stage::GeometryStaging,
            source,
        })?;
        debug!(object = object.name(), %repr, entities = entities.len(), "object added");
        let key = self.registry.register(object, source, entities)?;
        self.enter(TaskState::GeometryStaged);
        Ok(key)
    }

    /// Runs the planner over every registered object and stages its cuts.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] before any object is
    /// added or after cuts were applied.
    pub fn plan(&mut self) -> Result<&PartitionPlan> {
        self.check(TaskState::CutsStaged)?;
        let _span = info_span!("plan", session = %self.id).entered();
        let planned = PlanPartition::new(&self.registry, self.options.planner).execute();
        let tolerance = self.options.planner.tolerance;
        for contact in planned.contacts {
            if !self.plan.contacts.contains(&contact) {
                self.plan.contacts.push(contact);
            }
        }
        for cut in planned.cuts {
            self.plan.stage(cut, tolerance);
        }
        self.plan.warnings.extend(planned.warnings);
        self.enter(TaskState::CutsStaged);
        Ok(&self.plan)
    }

    /// Stages a plane cut through the named objects.
    ///
    /// Degenerate planes are dropped. A surface or solid target whose grid
    /// has no axis along `normal` cannot be cut conformingly; it is left out
    /// of the cut and reported as [`PartitionError::Ambiguous`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownObject`] for an unregistered name.
    pub fn add_cutting_plane(&mut self, origin: Point3, normal: Vector3, targets: &[&str]) -> Result<()> {
        self.check(TaskState::CutsStaged)?;
        let keys = targets
            .iter()
            .map(|&name| {
                self.registry
                    .key_of(name)
                    .ok_or_else(|| SessionError::UnknownObject(name.to_owned()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut accepted = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(obj) = self.registry.get(key) else {
                continue;
            };
            if obj.source.frame().is_some_and(|f| f.axis_of(&normal).is_none()) {
                warn!(object = %obj.name, ?normal, "cutting plane is not normal to a grid axis; skipped");
                self.plan.warnings.push(PartitionError::Ambiguous {
                    object: obj.name.clone(),
                    reason: "cutting plane is not normal to any of its grid axes".to_owned(),
                });
            } else {
                accepted.push(key);
            }
        }
        self.plan
            .stage(PartitionCut::plane(origin, normal, accepted), self.options.planner.tolerance);
        self.enter(TaskState::CutsStaged);
        Ok(())
    }

    /// Applies every staged cut, one kernel fragmentation per batch, then
    /// tags the web and flange pieces of thin-walled members.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Kernel`] if the kernel rejects a batch.
    pub fn apply_cuts(&mut self) -> Result<PartitionReport> {
        self.check(TaskState::Partitioned)?;
        let _span = info_span!("apply_cuts", session = %self.id).entered();
        let mut report = PartitionReport {
            warnings: self.plan.warnings.clone(),
            ..PartitionReport::default()
        };

        let (batches, grouping_warnings) = self.plan.batches(&self.registry);
        report.warnings.extend(grouping_warnings);
        for batch in batches {
            let objects: Vec<KernelEntity> = batch
                .objects
                .iter()
                .flat_map(|&k| self.registry.entities_of(k).iter().copied())
                .collect();
            let tools: Vec<CutTool> = batch
                .cuts
                .iter()
                .map(|cut| CutTool {
                    geometry: cut.geometry.clone(),
                    targets: cut
                        .targets
                        .iter()
                        .flat_map(|&k| self.registry.entities_of(k).iter().copied())
                        .collect(),
                })
                .collect();
            let map = self
                .kernel
                .fragment(&objects, &tools)
                .map_err(|source| self.kernel_error(Stage::Partitioning, source))?;
            debug!(objects = batch.objects.len(), cuts = tools.len(), pieces = map.piece_count(), "batch fragmented");
            for collapse in self.registry.apply_fragments(&map) {
                warn!(
                    entity = %collapse.entity,
                    first = %collapse.first,
                    second = %collapse.second,
                    "fragmentation merged two named regions"
                );
                report.collapsed.push(collapse);
            }
            report.cuts_applied += tools.len();
            report.batches += 1;
        }

        let faces = identify_faces(&self.registry, &*self.kernel)
            .map_err(|source| self.kernel_error(Stage::Partitioning, source))?;
        report.faces = faces.assigned.len();
        for (entity, face) in faces.assigned {
            self.registry.set_face(entity, face);
        }
        report.warnings.extend(faces.warnings);

        info!(
            batches = report.batches,
            cuts = report.cuts_applied,
            faces = report.faces,
            warnings = report.warnings.len(),
            "cuts applied"
        );
        self.enter(TaskState::Partitioned);
        Ok(report)
    }

    /// Meshes every entity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MeshGenerationFailed`] naming the object
    /// whose elements fell below the quality threshold, or
    /// [`SessionError::Kernel`] for any other kernel failure.
    pub fn mesh(&mut self, params: &MeshParams) -> Result<()> {
        self.check(TaskState::Meshed)?;
        let _span = info_span!("mesh", session = %self.id, size = params.size).entered();
        if let Err(source) = self.kernel.mesh(params) {
            let object = self.object_of(source.entity());
            return Err(match source {
                KernelError::DegenerateElements { .. } => SessionError::MeshGenerationFailed {
                    object,
                    stage: Stage::Meshing,
                    source,
                },
                source => SessionError::Kernel {
                    object,
                    stage: Stage::Meshing,
                    source,
                },
            }
            .into());
        }
        info!(nodes = self.kernel.node_count(), "mesh generated");
        self.enter(TaskState::Meshed);
        Ok(())
    }

    /// Opens the kernel's viewer; does nothing in silent sessions.
    pub fn open_interactive_view(&mut self, name: &str) {
        if self.options.silent {
            debug!(checkpoint = name, "interactive view suppressed");
            return;
        }
        info!(checkpoint = name, "opening interactive view");
        self.kernel.open_viewer();
    }

    /// Harvests the finite-element model.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel output cannot be read or two sets
    /// share a name.
    pub fn get_fem(&mut self) -> Result<FemModel> {
        self.check(TaskState::Harvested)?;
        let _span = info_span!("harvest", session = %self.id).entered();
        let model = Harvest::new(&mut self.registry, &*self.kernel).execute()?;
        info!(
            nodes = model.node_count(),
            elements = model.element_count(),
            "model harvested"
        );
        self.enter(TaskState::Harvested);
        Ok(model)
    }
}

impl<K: MeshKernel> Drop for KernelSession<'_, K> {
    fn drop(&mut self) {
        self.kernel.clear();
        self.state = TaskState::Released;
        let _ = ACTIVE_SESSION.compare_exchange(self.id.0, 0, Ordering::AcqRel, Ordering::Acquire);
        info!(session = %self.id, "session released");
    }
}

/// Serializes tests that open sessions.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
