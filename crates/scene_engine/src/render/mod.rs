//! # Rendering System
//!
//! Rendering support for the scene graph. This module owns everything the
//! tree traversal needs to turn nodes into GPU work:
//!
//! - **api**: the collaborator traits the core records commands through
//!   (device, command queue/stream/encoder, surface, uniform source)
//! - **pipeline**: the shared pipeline effect and depth/stencil config
//! - **uniforms**: the per-draw uniform block and the rotating buffer ring
//! - **frame_pacer**: the counting semaphore that keeps the CPU from
//!   overwriting uniform buffers the GPU has not finished reading
//! - **mesh**: vertex records and primitive generators
//! - **backends**: backend implementations (currently headless/recording)
//!
//! The real GPU API never appears here. The traversal requires only
//! scoped debug groups, state binding, resource binding by slot index,
//! triangle-list draws, and a completion callback on submitted work, so
//! any backend offering those can sit behind [`api`].

pub mod api;
pub mod backends;
pub mod frame_pacer;
pub mod mesh;
pub mod pipeline;
pub mod uniforms;

pub use api::{
    BufferHandle, CommandQueue, CommandStream, CompareFunction, CullMode, DepthStencilStateHandle,
    DrawableHandle, PipelineStateHandle, RenderDevice, RenderEncoder, RenderPassHandle,
    RenderSurface, SamplerHandle, TextureHandle, UniformSource,
};
pub use frame_pacer::FramePacer;
pub use mesh::{Mesh, Vertex};
pub use pipeline::{DepthStencilConfig, PipelineEffect};
pub use uniforms::{MaterialProperties, NodeUniforms, RingUniformProvider};

use thiserror::Error;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised by the rendering core
///
/// Construction-time failures (missing pipeline or depth state, resource
/// creation) are fatal and halt scene bring-up. Recoverable conditions
/// such as a missing texture are not errors: the node draws untextured
/// and the absence is logged where it is detected.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A node's effect carried a zeroed (never-minted) pipeline handle
    #[error("Pipeline state unavailable for node '{0}'")]
    MissingPipelineState(String),

    /// The device returned a zeroed (never-minted) depth/stencil handle
    #[error("Depth/stencil state unavailable for node '{0}'")]
    MissingDepthState(String),

    /// Scene configuration failed validation
    #[error("Invalid scene configuration: {0}")]
    InvalidConfiguration(#[from] crate::config::ConfigError),

    /// GPU resource creation failed (buffers, samplers, textures)
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A buffer write was issued against a handle the backend does not own
    #[error("Unknown buffer handle: {0:?}")]
    UnknownBuffer(BufferHandle),

    /// Frame orchestration was attempted before `prepare_to_draw`
    #[error("Scene not prepared: {0}")]
    NotPrepared(String),

    /// A pacer release arrived with no matching acquire
    ///
    /// Indicates a completion callback fired twice or out of band. The
    /// permit is dropped instead of applied, preserving backpressure.
    #[error("Frame pacer over-release: {0} permits already available")]
    PacerOverRelease(usize),

    /// Backend-specific failure, wrapped in a generic form
    #[error("Backend error: {0}")]
    BackendError(String),
}
