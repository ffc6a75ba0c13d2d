//! Parameter structs for meshing, planning and sessions.

use std::fmt;
use std::sync::Arc;

use crate::error::KernelError;
use crate::session::checkpoint::CheckpointListener;

/// Quality threshold used by [`MeshParams::with_quality_check`].
pub const DEFAULT_MIN_QUALITY: f64 = 0.1;

/// Polynomial order of generated elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementOrder {
    #[default]
    Linear,
    Quadratic,
}

/// Bias for volume meshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolidAlgorithm {
    /// Spacing follows the requested size on every axis.
    #[default]
    Uniform,
    /// Spacing is tightened so cells stay within a bounded aspect ratio of
    /// the thinnest solid dimension.
    AspectLimited,
}

/// Parameters passed to the kernel's mesh generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshParams {
    /// Target element edge length.
    pub size: f64,
    /// Element order.
    pub order: ElementOrder,
    /// Prefer quadrilaterals on surfaces.
    pub use_quads: bool,
    /// Prefer hexahedra in volumes.
    pub use_hex: bool,
    /// Volume meshing bias.
    pub algorithm_3d: SolidAlgorithm,
    /// Reject meshes with simplices below this quality (`None` disables the check).
    pub min_quality: Option<f64>,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            size: 0.1,
            order: ElementOrder::Linear,
            use_quads: false,
            use_hex: false,
            algorithm_3d: SolidAlgorithm::Uniform,
            min_quality: None,
        }
    }
}

impl MeshParams {
    /// Creates parameters with the given element size and defaults otherwise.
    #[must_use]
    pub fn new(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: ElementOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_quads(mut self, use_quads: bool) -> Self {
        self.use_quads = use_quads;
        self
    }

    #[must_use]
    pub fn with_hex(mut self, use_hex: bool) -> Self {
        self.use_hex = use_hex;
        self
    }

    #[must_use]
    pub fn with_algorithm_3d(mut self, algorithm: SolidAlgorithm) -> Self {
        self.algorithm_3d = algorithm;
        self
    }

    /// Enables the quality check at [`DEFAULT_MIN_QUALITY`].
    #[must_use]
    pub fn with_quality_check(self) -> Self {
        self.with_min_quality(DEFAULT_MIN_QUALITY)
    }

    #[must_use]
    pub fn with_min_quality(mut self, threshold: f64) -> Self {
        self.min_quality = Some(threshold);
        self
    }

    /// Checks that the parameters describe a meshable request.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidParameters`] for a non-positive size or a
    /// quality threshold outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), KernelError> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(KernelError::InvalidParameters(format!(
                "element size must be positive, got {}",
                self.size
            )));
        }
        if let Some(q) = self.min_quality {
            if !(q > 0.0 && q <= 1.0) {
                return Err(KernelError::InvalidParameters(format!(
                    "quality threshold must lie in (0, 1], got {q}"
                )));
            }
        }
        Ok(())
    }
}

/// Tolerances used while planning cuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerOptions {
    /// Distance under which two primitives are considered in contact.
    pub tolerance: f64,
    /// Separation under which a missed contact is reported.
    pub near_miss: f64,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            near_miss: 1e-3,
        }
    }
}

impl PlannerOptions {
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_near_miss(mut self, near_miss: f64) -> Self {
        self.near_miss = near_miss;
        self
    }
}

/// Options for a kernel session.
#[derive(Clone)]
pub struct SessionOptions {
    /// Suppresses interactive views.
    pub silent: bool,
    /// Receives checkpoint events; only set in development configurations.
    pub listener: Option<Arc<dyn CheckpointListener>>,
    /// Planner tolerances.
    pub planner: PlannerOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            silent: true,
            listener: None,
            planner: PlannerOptions::default(),
        }
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("silent", &self.silent)
            .field("listener", &self.listener.is_some())
            .field("planner", &self.planner)
            .finish()
    }
}

impl SessionOptions {
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn CheckpointListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    #[must_use]
    pub fn with_planner(mut self, planner: PlannerOptions) -> Self {
        self.planner = planner;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_chain() {
        let params = MeshParams::new(0.25)
            .with_order(ElementOrder::Quadratic)
            .with_hex(true)
            .with_quality_check();
        assert_eq!(params.order, ElementOrder::Quadratic);
        assert!(params.use_hex);
        assert!(!params.use_quads);
        assert_eq!(params.min_quality, Some(DEFAULT_MIN_QUALITY));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        assert!(matches!(
            MeshParams::new(0.0).validate(),
            Err(KernelError::InvalidParameters(_))
        ));
        assert!(MeshParams::new(f64::NAN).validate().is_err());
    }

    #[test]
    fn quality_threshold_must_be_a_fraction() {
        assert!(MeshParams::new(0.1).with_min_quality(1.5).validate().is_err());
        assert!(MeshParams::new(0.1).with_min_quality(0.0).validate().is_err());
    }

    #[test]
    fn sessions_are_silent_by_default() {
        let options = SessionOptions::default();
        assert!(options.silent);
        assert!(options.listener.is_none());
    }
}
