//! # Scene Engine
//!
//! A hierarchical scene-graph renderer core: a tree of transformable nodes
//! that compose parent/child transforms into per-node model matrices,
//! traverse the tree once per frame to emit draw commands, and pace
//! CPU-side uniform writes against GPU-side reads with a bounded rotating
//! buffer ring guarded by a counting semaphore.
//!
//! ## Architecture
//!
//! - **foundation**: math types (nalgebra-backed) and frame timing
//! - **render**: GPU collaborator traits, uniform ring, frame pacer,
//!   pipeline effect, primitive meshes, and a headless recording backend
//! - **scene**: the [`Node`](scene::Node) tree and the
//!   [`Scene`](scene::Scene) frame orchestrator
//! - **config**: TOML-backed scene configuration
//!
//! The actual GPU API is out of scope: the core records commands through
//! the trait family in [`render::api`] and never touches a device
//! directly. Asset loading, texture decoding, shader compilation, and
//! presentation surfaces are external collaborators reached through the
//! same seam.
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//! use scene_engine::render::backends::HeadlessBackend;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use scene_engine::render::RenderDevice;
//!
//! let backend = HeadlessBackend::new();
//! let effect = Arc::new(PipelineEffect::new("basic", backend.create_pipeline_state()?));
//!
//! let mut scene = Scene::new("main", effect.clone(), &backend, 800.0, 600.0)?;
//! scene.add_child(Node::structural("group", effect, &backend)?);
//! scene.prepare_to_draw(&backend)?;
//!
//! scene.update(1.0 / 60.0);
//! scene.render(&backend, &mut backend.surface(), &Mat4::identity())?;
//! # Ok(())
//! # }
//! ```

// Core engine modules
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{ConfigError, SceneConfig},
        foundation::{
            math::{Mat4, Mat4Ext, Vec3},
            time::Timer,
        },
        render::{
            CullMode, DepthStencilConfig, MaterialProperties, PipelineEffect, RenderError,
        },
        scene::{Node, NodeAnimator, Scene, SceneError},
    };
}
