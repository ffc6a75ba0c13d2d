use std::fmt;

use thiserror::Error;

use crate::adapter::GeomRepr;
use crate::kernel::KernelEntity;
use crate::session::TaskState;

/// Top-level error type for the partitioning and harvesting pipeline.
#[derive(Debug, Error)]
pub enum FempartError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Pipeline stage in which a failure surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GeometryStaging,
    Planning,
    Partitioning,
    Meshing,
    Harvesting,
    Merging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GeometryStaging => "geometry staging",
            Self::Planning => "planning",
            Self::Partitioning => "partitioning",
            Self::Meshing => "meshing",
            Self::Harvesting => "harvesting",
            Self::Merging => "merging",
        };
        f.write_str(name)
    }
}

/// Errors raised while converting domain objects to kernel geometry.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("object '{object}' cannot be represented as {repr}")]
    UnsupportedGeomRepr { object: String, repr: GeomRepr },

    #[error("object '{object}' has invalid geometry: {reason}")]
    InvalidGeometry { object: String, reason: String },
}

/// Partitioning issues that are logged and skipped, never fatal.
#[derive(Debug, Clone, Error)]
pub enum PartitionError {
    #[error("ambiguous partition for '{object}': {reason}")]
    Ambiguous { object: String, reason: String },

    #[error("missing expected intersection between '{first}' and '{second}' (gap {gap:.3e})")]
    MissingIntersection { first: String, second: String, gap: f64 },
}

/// Errors reported by a meshing kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("kernel entity not found: {0}")]
    EntityNotFound(KernelEntity),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("cut does not conform to the grid of {entity}: {reason}")]
    NonConformingCut { entity: KernelEntity, reason: String },

    #[error("{entity} produced {count} element(s) below quality {threshold} (worst {worst:.4})")]
    DegenerateElements {
        entity: KernelEntity,
        count: usize,
        worst: f64,
        threshold: f64,
    },

    #[error("invalid mesh parameters: {0}")]
    InvalidParameters(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("kernel has no mesh; call mesh() first")]
    NotMeshed,

    #[error("unsupported element type code {0}")]
    UnsupportedElementType(i32),
}

impl KernelError {
    /// The entity the failure is attributed to, if any.
    #[must_use]
    pub fn entity(&self) -> Option<KernelEntity> {
        match self {
            Self::EntityNotFound(entity)
            | Self::NonConformingCut { entity, .. }
            | Self::DegenerateElements { entity, .. } => Some(*entity),
            _ => None,
        }
    }
}

/// Errors related to session lifecycle and kernel use.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a kernel session ({active}) is already open")]
    Conflict { active: u64 },

    #[error("mesh generation failed for {} during {stage}: {source}", object_label(.object.as_deref()))]
    MeshGenerationFailed {
        object: Option<String>,
        stage: Stage,
        #[source]
        source: KernelError,
    },

    #[error("kernel failure for {} during {stage}: {source}", object_label(.object.as_deref()))]
    Kernel {
        object: Option<String>,
        stage: Stage,
        #[source]
        source: KernelError,
    },

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    #[error("object '{0}' is not registered in this session")]
    UnknownObject(String),
}

/// Errors related to assembling finite-element models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate set name '{name}' during {stage}")]
    DuplicateSetName { name: String, stage: Stage },

    #[error("node id {id} already exists (task '{task}')")]
    NodeIdCollision { id: usize, task: String },

    #[error("element id {id} already exists (task '{task}')")]
    ElementIdCollision { id: usize, task: String },
}

fn object_label(object: Option<&str>) -> String {
    object.map_or_else(|| "unknown object".to_owned(), |o| format!("'{o}'"))
}

/// Convenience type alias for results using [`FempartError`].
pub type Result<T> = std::result::Result<T, FempartError>;
