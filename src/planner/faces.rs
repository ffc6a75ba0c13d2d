//! Web and flange classification of thin-walled member pieces.

use tracing::{debug, warn};

use crate::error::{KernelError, PartitionError};
use crate::kernel::{KernelEntity, MeshKernel};
use crate::registry::EntityRegistry;
use crate::structure::section::FaceTag;

/// Face tags assigned to kernel entities, plus the pieces left unclassified.
#[derive(Debug, Default)]
pub struct FaceReport {
    pub assigned: Vec<(KernelEntity, FaceTag)>,
    pub warnings: Vec<PartitionError>,
}

/// Classifies every piece of every thin-walled member in the registry.
///
/// Each piece's centroid is taken into section coordinates and matched
/// against the section walls. Pieces of line members and of sections
/// without a web/flange split are skipped.
///
/// # Errors
///
/// Returns the kernel error if a centroid cannot be queried.
pub fn identify_faces<K: MeshKernel>(registry: &EntityRegistry, kernel: &K) -> Result<FaceReport, KernelError> {
    let mut report = FaceReport::default();
    for (_, obj) in registry.iter() {
        let Some(beam) = obj.object.as_beam() else {
            continue;
        };
        if obj.repr == crate::adapter::GeomRepr::Line || !beam.section().is_thin_walled() {
            continue;
        }
        let Some(frame) = beam.local_frame() else {
            continue;
        };
        let profile = beam.section().profile();
        let tolerance = profile.face_tolerance();
        for &entity in &obj.entities {
            let centroid = kernel.centroid(entity)?;
            let point = beam.section_point(&frame, &centroid);
            match profile.identify_face(&point, tolerance) {
                Ok(face) => {
                    debug!(object = %obj.name, %entity, face = face.name(), "face identified");
                    report.assigned.push((entity, face));
                }
                Err(reason) => {
                    warn!(object = %obj.name, %entity, %reason, "face not identified");
                    report.warnings.push(PartitionError::Ambiguous {
                        object: obj.name.clone(),
                        reason: format!("piece {entity}: {reason}"),
                    });
                }
            }
        }
    }
    Ok(report)
}
