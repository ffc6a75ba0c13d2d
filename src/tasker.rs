//! Sequential execution and merging of independent mesh tasks.

use tracing::{info, info_span, warn};

use crate::adapter::GeomRepr;
use crate::config::{MeshParams, SessionOptions};
use crate::error::Result;
use crate::fem::FemModel;
use crate::kernel::MeshKernel;
use crate::session::{KernelSession, PartitionReport, TaskState};
use crate::structure::StructuralObject;

/// Objects meshed together in one session.
///
/// Objects that touch must share a task; nodes are never stitched across
/// tasks.
#[derive(Debug, Clone)]
pub struct MeshTask {
    pub name: String,
    pub objects: Vec<(StructuralObject, GeomRepr)>,
    pub params: MeshParams,
}

impl MeshTask {
    #[must_use]
    pub fn new(name: impl Into<String>, params: MeshParams) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            params,
        }
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<StructuralObject>, repr: GeomRepr) -> Self {
        self.objects.push((object.into(), repr));
        self
    }
}

/// Lifecycle of a tasker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskerState {
    Pending,
    Running,
    Merged,
    /// A task or the merge failed; the run stopped there.
    Failed,
}

/// Runs mesh tasks one at a time on a shared kernel and merges the results.
pub struct MultiSessionTasker<'k, K: MeshKernel> {
    kernel: &'k mut K,
    options: SessionOptions,
    state: TaskerState,
    task_states: Vec<(String, TaskState)>,
    reports: Vec<(String, PartitionReport)>,
    overlaps: Vec<(String, String)>,
}

impl<'k, K: MeshKernel> MultiSessionTasker<'k, K> {
    #[must_use]
    pub fn new(kernel: &'k mut K, options: SessionOptions) -> Self {
        Self {
            kernel,
            options,
            state: TaskerState::Pending,
            task_states: Vec::new(),
            reports: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> TaskerState {
        self.state
    }

    /// Final state of every task that ran, in run order.
    ///
    /// Completed tasks end [`TaskState::Released`]; a failed task keeps the
    /// last state it reached.
    #[must_use]
    pub fn task_states(&self) -> &[(String, TaskState)] {
        &self.task_states
    }

    /// Partition reports of the completed tasks.
    #[must_use]
    pub fn reports(&self) -> &[(String, PartitionReport)] {
        &self.reports
    }

    /// Object pairs from different tasks whose bounding boxes meet.
    ///
    /// Their nodes are never shared, so each pair is a likely gap in the
    /// merged model.
    #[must_use]
    pub fn cross_task_overlaps(&self) -> &[(String, String)] {
        &self.overlaps
    }

    /// Runs every task, then merges the models.
    ///
    /// Each task's ids are shifted past the largest ids merged so far.
    ///
    /// # Errors
    ///
    /// Stops at the first failing task and returns its error, or returns a
    /// [`crate::error::ModelError`] if a model cannot be merged.
    pub fn run(&mut self, tasks: &[MeshTask]) -> Result<FemModel> {
        self.state = TaskerState::Running;
        self.task_states.clear();
        self.reports.clear();
        self.overlaps = cross_task_overlaps(tasks, self.options.planner.tolerance);
        let mut merged = FemModel::new();
        for task in tasks {
            let step = self.run_task(task).and_then(|model| {
                let node_offset = merged.max_node_id() + 1 - FemModel::ID_BASE;
                let element_offset = merged.max_element_id() + 1 - FemModel::ID_BASE;
                merged.merge(model, node_offset, element_offset, &task.name)?;
                Ok(())
            });
            if let Err(err) = step {
                warn!(task = %task.name, error = %err, "task failed");
                self.state = TaskerState::Failed;
                return Err(err);
            }
        }
        self.state = TaskerState::Merged;
        info!(
            tasks = tasks.len(),
            nodes = merged.node_count(),
            elements = merged.element_count(),
            "tasks merged"
        );
        Ok(merged)
    }

    fn run_task(&mut self, task: &MeshTask) -> Result<FemModel> {
        let _span = info_span!("task", name = %task.name).entered();
        let mut session = KernelSession::open(&mut *self.kernel, self.options.clone())?;
        let result = drive(&mut session, task);
        let reached = session.state();
        drop(session);
        let final_state = match &result {
            Ok((_, report)) => {
                self.reports.push((task.name.clone(), report.clone()));
                TaskState::Released
            }
            Err(_) => reached,
        };
        self.task_states.push((task.name.clone(), final_state));
        result.map(|(model, _)| model)
    }
}

fn cross_task_overlaps(tasks: &[MeshTask], margin: f64) -> Vec<(String, String)> {
    let mut overlaps = Vec::new();
    for (i, first) in tasks.iter().enumerate() {
        for second in &tasks[i + 1..] {
            for (a, _) in &first.objects {
                let reach = a.bounding_box().inflated(margin);
                for (b, _) in &second.objects {
                    if reach.overlaps(&b.bounding_box()) {
                        warn!(
                            first = a.name(),
                            second = b.name(),
                            "objects in separate tasks meet; their nodes will not be shared"
                        );
                        overlaps.push((a.name().to_owned(), b.name().to_owned()));
                    }
                }
            }
        }
    }
    overlaps
}

fn drive<K: MeshKernel>(session: &mut KernelSession<'_, K>, task: &MeshTask) -> Result<(FemModel, PartitionReport)> {
    for (object, repr) in &task.objects {
        session.add_object(object, *repr)?;
    }
    session.plan()?;
    let report = session.apply_cuts()?;
    session.mesh(&task.params)?;
    Ok((session.get_fem()?, report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::error::{FempartError, ModelError, Stage};
    use crate::kernel::GridKernel;
    use crate::math::Point3;
    use crate::session::test_lock;
    use crate::structure::section::{CrossSection, RectangularSection};
    use crate::structure::{Beam, BoxVolume, Plate};

    fn plate_task(name: &str, set: &str, y0: f64) -> MeshTask {
        MeshTask::new(name, MeshParams::new(0.5).with_quads(true))
            .with_object(Plate::horizontal(set, (0.0, y0), (1.0, y0 + 1.0), 0.0, 0.01), GeomRepr::Shell)
    }

    #[test]
    fn disjoint_tasks_merge_with_unique_ids() {
        let _guard = test_lock();
        let mut kernel = GridKernel::new();
        let mut tasker = MultiSessionTasker::new(&mut kernel, SessionOptions::default());
        assert_eq!(tasker.state(), TaskerState::Pending);
        let beam = Beam::new(
            "post",
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 1.0),
            CrossSection::Rectangle(RectangularSection::new(0.1, 0.1)),
        );
        let tasks = [
            plate_task("deck", "deck", 0.0),
            MeshTask::new("frame", MeshParams::new(0.25)).with_object(beam, GeomRepr::Line),
        ];
        let model = tasker.run(&tasks).unwrap();

        assert_eq!(tasker.state(), TaskerState::Merged);
        assert_eq!(
            tasker.task_states(),
            &[
                ("deck".to_owned(), TaskState::Released),
                ("frame".to_owned(), TaskState::Released)
            ]
        );
        assert_eq!(model.node_count(), 9 + 5);
        assert_eq!(model.element_count(), 4 + 4);
        assert_eq!(model.max_node_id(), 14);

        let deck = model.set("deck").unwrap();
        let post = model.set("post").unwrap();
        assert_eq!(deck.elements.len(), 4);
        assert_eq!(post.elements.len(), 4);
        assert!(deck.nodes.is_disjoint(&post.nodes));
        assert_eq!(post.nodes, model.element_nodes(post));
        let ids: BTreeSet<_> = model.elements().map(|e| e.id).collect();
        assert_eq!(ids.len(), model.element_count());
        assert!(tasker.cross_task_overlaps().is_empty());
    }

    #[test]
    fn touching_objects_in_separate_tasks_are_reported() {
        let _guard = test_lock();
        let mut kernel = GridKernel::new();
        let mut tasker = MultiSessionTasker::new(&mut kernel, SessionOptions::default());
        let joist = Beam::new(
            "joist",
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(1.0, 0.5, 0.0),
            CrossSection::Rectangle(RectangularSection::new(0.1, 0.1)),
        );
        let tasks = [
            plate_task("deck", "deck", 0.0),
            plate_task("far", "far", 5.0),
            MeshTask::new("frame", MeshParams::new(0.25)).with_object(joist, GeomRepr::Line),
        ];
        let model = tasker.run(&tasks).unwrap();
        assert_eq!(
            tasker.cross_task_overlaps(),
            &[("deck".to_owned(), "joist".to_owned())]
        );
        assert_eq!(model.nodes_near(&Point3::new(0.5, 0.5, 0.0), 1e-9).len(), 2);
    }

    #[test]
    fn duplicate_set_names_fail_the_merge() {
        let _guard = test_lock();
        let mut kernel = GridKernel::new();
        let mut tasker = MultiSessionTasker::new(&mut kernel, SessionOptions::default());
        let tasks = [plate_task("first", "deck", 0.0), plate_task("second", "deck", 5.0)];
        let err = tasker.run(&tasks).unwrap_err();
        assert!(matches!(
            err,
            FempartError::Model(ModelError::DuplicateSetName {
                stage: Stage::Merging,
                ..
            })
        ));
        assert_eq!(tasker.state(), TaskerState::Failed);
    }

    #[test]
    fn failing_task_reports_the_state_it_reached() {
        let _guard = test_lock();
        let mut kernel = GridKernel::new();
        let mut tasker = MultiSessionTasker::new(&mut kernel, SessionOptions::default());
        let rod = BoxVolume::axis_aligned("rod", Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.05, 0.05));
        let tasks = [
            plate_task("deck", "deck", 0.0),
            MeshTask::new("rod", MeshParams::new(0.5).with_quality_check()).with_object(rod, GeomRepr::Solid),
        ];
        assert!(tasker.run(&tasks).is_err());
        assert_eq!(tasker.task_states()[1], ("rod".to_owned(), TaskState::Partitioned));
        assert_eq!(tasker.reports().len(), 1);
    }
}
