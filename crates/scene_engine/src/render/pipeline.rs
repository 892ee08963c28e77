//! Shared pipeline effect and depth/stencil configuration
//!
//! A [`PipelineEffect`] owns one compiled pipeline state plus the
//! projection-matrix slot every node drawing with that pipeline reads
//! from. The effect is built once at scene-construction time and shared
//! read-only across all nodes via `Arc`; only the projection slot is
//! mutable, and the scene writes it exactly once during setup.

use std::sync::RwLock;

use crate::foundation::math::Mat4;
use crate::render::api::{CompareFunction, PipelineStateHandle};

/// Depth/stencil test configuration
///
/// The scene graph requires a depth state on every node; the default is
/// a less-than compare with depth writes enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilConfig {
    /// Depth comparison function
    pub compare: CompareFunction,
    /// Whether passing fragments write their depth
    pub write_enabled: bool,
}

impl Default for DepthStencilConfig {
    fn default() -> Self {
        Self {
            compare: CompareFunction::Less,
            write_enabled: true,
        }
    }
}

/// Compiled pipeline state plus the shared projection slot
///
/// Immutable after construction apart from [`set_projection`], which the
/// owning scene calls once. The `RwLock` exists so the effect can be
/// shared through `Arc` before the scene (which computes the projection)
/// is built, mirroring the build order of real applications.
///
/// [`set_projection`]: PipelineEffect::set_projection
pub struct PipelineEffect {
    name: String,
    pipeline_state: PipelineStateHandle,
    projection: RwLock<Mat4>,
}

impl PipelineEffect {
    /// Wrap a compiled pipeline state
    pub fn new(name: impl Into<String>, pipeline_state: PipelineStateHandle) -> Self {
        Self {
            name: name.into(),
            pipeline_state,
            projection: RwLock::new(Mat4::identity()),
        }
    }

    /// Name of this effect (debug labels only)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled pipeline state handle
    pub fn pipeline_state(&self) -> PipelineStateHandle {
        self.pipeline_state
    }

    /// Write the projection slot; called once by the scene during setup
    pub fn set_projection(&self, projection: Mat4) {
        // Poisoning can only come from a panicked writer; recover with
        // the inner value since Mat4 has no invariants to violate.
        match self.projection.write() {
            Ok(mut slot) => *slot = projection,
            Err(poisoned) => *poisoned.into_inner() = projection,
        }
    }

    /// Read the current projection matrix
    pub fn projection(&self) -> Mat4 {
        match self.projection.read() {
            Ok(slot) => *slot,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_slot_roundtrip() {
        let effect = PipelineEffect::new("test", PipelineStateHandle(1));
        assert_relative_eq!(effect.projection(), Mat4::identity(), epsilon = 1e-6);

        let proj = Mat4::perspective(1.0, 1.5, 0.1, 100.0);
        effect.set_projection(proj);
        assert_relative_eq!(effect.projection(), proj, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_config_default_is_less_with_writes() {
        let config = DepthStencilConfig::default();
        assert_eq!(config.compare, CompareFunction::Less);
        assert!(config.write_enabled);
    }
}
