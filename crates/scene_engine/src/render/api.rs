//! Collaborator traits for the rendering backend
//!
//! This module defines the seam between the scene-graph core and whatever
//! GPU API executes its commands. The core is written entirely against
//! these traits; backends (see [`crate::render::backends`]) implement
//! them. Handles are opaque identifiers minted by the backend — the core
//! stores and passes them but never inspects them.
//!
//! All context objects are passed explicitly into construction and
//! per-frame calls. There is no ambient device or queue.

use crate::foundation::math::Mat4;
use crate::render::uniforms::MaterialProperties;
use crate::render::{DepthStencilConfig, RenderResult};

/// Opaque handle to a GPU-visible buffer (vertex or uniform)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Opaque handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to an immutable sampler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerHandle(pub u64);

/// Opaque handle to a compiled depth/stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateHandle(pub u64);

/// Opaque handle to a compiled pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineStateHandle(pub u64);

/// Opaque handle to a presentable drawable produced by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableHandle(pub u64);

/// Opaque handle to a render pass target (color + depth attachments)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPassHandle(pub u64);

/// Face culling mode for the render encoder
///
/// The scene graph culls `Front` faces, matching the winding convention
/// its mesh generators emit. Callers feeding standard counter-clockwise
/// geometry should verify the sign before relying on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Cull nothing
    None,
    /// Cull front-facing triangles
    Front,
    /// Cull back-facing triangles
    Back,
}

/// Depth comparison function for depth/stencil state creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    /// Never pass
    Never,
    /// Pass when the incoming depth is less than the stored depth
    Less,
    /// Pass on equality
    Equal,
    /// Pass when less than or equal
    LessEqual,
    /// Pass when greater
    Greater,
    /// Pass when not equal
    NotEqual,
    /// Pass when greater than or equal
    GreaterEqual,
    /// Always pass
    Always,
}

/// Resource factory side of the backend
///
/// Called at scene-build time (vertex buffers, samplers, states) and once
/// per node per frame for uniform writes. All methods take `&self`;
/// backends use interior mutability so resource creation can happen while
/// the same backend is shared with a queue or surface view.
pub trait RenderDevice {
    /// Create an immutable vertex buffer from raw bytes
    fn create_vertex_buffer(&self, data: &[u8]) -> RenderResult<BufferHandle>;

    /// Create `count` uniform buffers of `size` bytes each
    ///
    /// The buffers back the rotating ring; they are written once per draw
    /// and read by the GPU asynchronously.
    fn create_uniform_buffers(&self, count: usize, size: usize) -> RenderResult<Vec<BufferHandle>>;

    /// Write `data` into a previously created buffer
    ///
    /// Must not block: the write targets a slot the frame pacer has
    /// already proven free.
    fn write_buffer(&self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()>;

    /// Create an immutable sampler state (nearest filtering, clamp-to-edge)
    fn create_sampler_state(&self) -> RenderResult<SamplerHandle>;

    /// Compile a depth/stencil state from its configuration
    fn create_depth_stencil_state(
        &self,
        config: &DepthStencilConfig,
    ) -> RenderResult<DepthStencilStateHandle>;

    /// Compile the pipeline state the shared effect wraps
    fn create_pipeline_state(&self) -> RenderResult<PipelineStateHandle>;
}

/// Command queue: source of per-frame command streams
pub trait CommandQueue {
    /// Obtain a fresh command stream for one frame of work
    fn create_stream(&self) -> Box<dyn CommandStream>;
}

/// One frame's recorded command sequence
///
/// A stream is created, gets a completion callback registered, has one
/// render pass encoded into it, optionally schedules a presentation, and
/// is finally committed. The completion callback fires on a
/// backend-defined thread once the GPU has finished consuming every
/// buffer the stream referenced — it is the release half of the frame
/// pacer's acquire/release pair.
pub trait CommandStream {
    /// Register a callback invoked after GPU execution completes
    fn on_completed(&mut self, callback: Box<dyn FnOnce() + Send>);

    /// Open a render encoder against the given pass target
    fn begin_render_pass(&mut self, target: RenderPassHandle) -> Box<dyn RenderEncoder>;

    /// Schedule a drawable for presentation when this stream executes
    fn present(&mut self, drawable: DrawableHandle);

    /// Submit the stream for execution
    fn commit(self: Box<Self>);
}

/// Scoped command recording within one render pass
pub trait RenderEncoder {
    /// Bind a compiled depth/stencil state
    fn set_depth_stencil_state(&mut self, state: DepthStencilStateHandle);

    /// Bind a compiled pipeline state
    fn set_pipeline_state(&mut self, state: PipelineStateHandle);

    /// Bind a fragment sampler at the given slot
    fn set_fragment_sampler(&mut self, sampler: SamplerHandle, slot: u32);

    /// Set the face culling mode
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Open a named debug scope (diagnostic only, no behavioral effect)
    fn push_debug_group(&mut self, label: &str);

    /// Close the innermost debug scope
    fn pop_debug_group(&mut self);

    /// Bind a vertex-stage buffer at the given slot
    fn set_vertex_buffer(&mut self, buffer: BufferHandle, slot: u32);

    /// Bind a fragment texture at the given slot
    fn set_fragment_texture(&mut self, texture: TextureHandle, slot: u32);

    /// Record a triangle-list draw of `vertex_count` vertices from vertex 0
    fn draw_triangles(&mut self, vertex_count: u32);

    /// Finish encoding; no further commands may be recorded
    fn end_encoding(&mut self);
}

/// Presentation surface collaborator
///
/// Supplies the render pass target for the frame and, when one is
/// available, the drawable to present. A surface may legitimately produce
/// no drawable for a frame (e.g. the window is occluded); rendering still
/// proceeds, only presentation is skipped.
pub trait RenderSurface {
    /// The pass target (color + depth attachments) for this frame
    fn pass_target(&mut self) -> RenderPassHandle;

    /// The drawable to present this frame, if one was produced
    fn current_drawable(&mut self) -> Option<DrawableHandle>;
}

/// Per-draw uniform allocation capability
///
/// Resolved at construction time (never downcast at call sites) and
/// invoked exactly once per node per draw, synchronously, on the
/// submission thread. The returned handle is valid until the frame's
/// completion callback fires.
pub trait UniformSource {
    /// Fill the next free ring slot and return its buffer handle
    fn acquire_buffer(
        &mut self,
        projection: &Mat4,
        model_view: &Mat4,
        material: &MaterialProperties,
        node_name: &str,
    ) -> RenderResult<BufferHandle>;
}
