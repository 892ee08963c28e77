//! Headless recording backend
//!
//! Implements the full collaborator trait family without any GPU.
//! Commands are recorded into an inspectable log, buffer writes land in
//! host memory, and completion callbacks are queued rather than fired so
//! callers control exactly when "the GPU finishes" — which is what the
//! frame-pacing scenarios need. The backend handle is a cheap clone over
//! shared state, so the same instance can serve as device, queue, and
//! surface factory at once.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::render::api::{
    BufferHandle, CommandQueue, CommandStream, CullMode, DepthStencilStateHandle, DrawableHandle,
    PipelineStateHandle, RenderDevice, RenderEncoder, RenderPassHandle, RenderSurface,
    SamplerHandle, TextureHandle,
};
use crate::render::{DepthStencilConfig, RenderError, RenderResult};

/// One recorded backend command, for test assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    /// Depth/stencil state bound
    SetDepthStencilState(DepthStencilStateHandle),
    /// Pipeline state bound
    SetPipelineState(PipelineStateHandle),
    /// Fragment sampler bound at a slot
    SetFragmentSampler(SamplerHandle, u32),
    /// Cull mode set
    SetCullMode(CullMode),
    /// Debug scope opened
    PushDebugGroup(String),
    /// Debug scope closed
    PopDebugGroup,
    /// Vertex-stage buffer bound at a slot
    SetVertexBuffer(BufferHandle, u32),
    /// Fragment texture bound at a slot
    SetFragmentTexture(TextureHandle, u32),
    /// Triangle-list draw recorded
    DrawTriangles(u32),
    /// Encoder closed
    EndEncoding,
    /// Drawable scheduled for presentation
    Present(DrawableHandle),
    /// Stream committed for execution
    Commit,
}

type Completion = Box<dyn FnOnce() + Send>;

struct HeadlessShared {
    next_handle: AtomicU64,
    buffers: Mutex<HashMap<u64, Vec<u8>>>,
    commands: Mutex<Vec<RecordedCommand>>,
    pending_completions: Mutex<VecDeque<Completion>>,
}

impl HeadlessShared {
    fn mint(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    fn record(&self, command: RecordedCommand) {
        lock(&self.commands).push(command);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Recording backend: device, queue, and surface factory in one handle
#[derive(Clone)]
pub struct HeadlessBackend {
    shared: Arc<HeadlessShared>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HeadlessShared {
                // Handle 0 is never minted so zeroed handles stay invalid
                next_handle: AtomicU64::new(1),
                buffers: Mutex::new(HashMap::new()),
                commands: Mutex::new(Vec::new()),
                pending_completions: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Create a presentation surface view over this backend
    pub fn surface(&self) -> HeadlessSurface {
        HeadlessSurface {
            shared: Arc::clone(&self.shared),
            produce_drawables: true,
        }
    }

    /// Snapshot of every command recorded so far
    pub fn commands(&self) -> Vec<RecordedCommand> {
        lock(&self.shared.commands).clone()
    }

    /// Drop the recorded command log
    pub fn clear_commands(&self) {
        lock(&self.shared.commands).clear();
    }

    /// Number of committed streams whose completion has not yet fired
    pub fn pending_completions(&self) -> usize {
        lock(&self.shared.pending_completions).len()
    }

    /// Fire the oldest pending completion callback, as the GPU finishing
    /// that stream's work would; returns false when none are pending
    pub fn complete_next_frame(&self) -> bool {
        let callback = lock(&self.shared.pending_completions).pop_front();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Read back the current contents of a buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        lock(&self.shared.buffers).get(&buffer.0).cloned()
    }
}

impl RenderDevice for HeadlessBackend {
    fn create_vertex_buffer(&self, data: &[u8]) -> RenderResult<BufferHandle> {
        let handle = self.shared.mint();
        lock(&self.shared.buffers).insert(handle, data.to_vec());
        Ok(BufferHandle(handle))
    }

    fn create_uniform_buffers(&self, count: usize, size: usize) -> RenderResult<Vec<BufferHandle>> {
        if count == 0 {
            return Err(RenderError::ResourceCreationFailed(
                "uniform ring must hold at least one buffer".to_string(),
            ));
        }
        let mut buffers = lock(&self.shared.buffers);
        let handles = (0..count)
            .map(|_| {
                let handle = self.shared.mint();
                buffers.insert(handle, vec![0u8; size]);
                BufferHandle(handle)
            })
            .collect();
        Ok(handles)
    }

    fn write_buffer(&self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()> {
        let mut buffers = lock(&self.shared.buffers);
        match buffers.get_mut(&buffer.0) {
            Some(contents) => {
                contents.clear();
                contents.extend_from_slice(data);
                Ok(())
            }
            None => Err(RenderError::UnknownBuffer(buffer)),
        }
    }

    fn create_sampler_state(&self) -> RenderResult<SamplerHandle> {
        Ok(SamplerHandle(self.shared.mint()))
    }

    fn create_depth_stencil_state(
        &self,
        _config: &DepthStencilConfig,
    ) -> RenderResult<DepthStencilStateHandle> {
        Ok(DepthStencilStateHandle(self.shared.mint()))
    }

    fn create_pipeline_state(&self) -> RenderResult<PipelineStateHandle> {
        Ok(PipelineStateHandle(self.shared.mint()))
    }
}

impl CommandQueue for HeadlessBackend {
    fn create_stream(&self) -> Box<dyn CommandStream> {
        Box::new(HeadlessStream {
            shared: Arc::clone(&self.shared),
            completions: Vec::new(),
        })
    }
}

struct HeadlessStream {
    shared: Arc<HeadlessShared>,
    completions: Vec<Completion>,
}

impl CommandStream for HeadlessStream {
    fn on_completed(&mut self, callback: Completion) {
        self.completions.push(callback);
    }

    fn begin_render_pass(&mut self, _target: RenderPassHandle) -> Box<dyn RenderEncoder> {
        Box::new(HeadlessEncoder {
            shared: Arc::clone(&self.shared),
        })
    }

    fn present(&mut self, drawable: DrawableHandle) {
        self.shared.record(RecordedCommand::Present(drawable));
    }

    fn commit(self: Box<Self>) {
        self.shared.record(RecordedCommand::Commit);
        // Completions become pending on commit and fire only when the
        // caller simulates GPU completion via `complete_next_frame`.
        let mut pending = lock(&self.shared.pending_completions);
        for callback in self.completions {
            pending.push_back(callback);
        }
    }
}

struct HeadlessEncoder {
    shared: Arc<HeadlessShared>,
}

impl RenderEncoder for HeadlessEncoder {
    fn set_depth_stencil_state(&mut self, state: DepthStencilStateHandle) {
        self.shared.record(RecordedCommand::SetDepthStencilState(state));
    }

    fn set_pipeline_state(&mut self, state: PipelineStateHandle) {
        self.shared.record(RecordedCommand::SetPipelineState(state));
    }

    fn set_fragment_sampler(&mut self, sampler: SamplerHandle, slot: u32) {
        self.shared
            .record(RecordedCommand::SetFragmentSampler(sampler, slot));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.shared.record(RecordedCommand::SetCullMode(mode));
    }

    fn push_debug_group(&mut self, label: &str) {
        self.shared
            .record(RecordedCommand::PushDebugGroup(label.to_string()));
    }

    fn pop_debug_group(&mut self) {
        self.shared.record(RecordedCommand::PopDebugGroup);
    }

    fn set_vertex_buffer(&mut self, buffer: BufferHandle, slot: u32) {
        self.shared
            .record(RecordedCommand::SetVertexBuffer(buffer, slot));
    }

    fn set_fragment_texture(&mut self, texture: TextureHandle, slot: u32) {
        self.shared
            .record(RecordedCommand::SetFragmentTexture(texture, slot));
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        self.shared
            .record(RecordedCommand::DrawTriangles(vertex_count));
    }

    fn end_encoding(&mut self) {
        self.shared.record(RecordedCommand::EndEncoding);
    }
}

/// Presentation surface view over a headless backend
pub struct HeadlessSurface {
    shared: Arc<HeadlessShared>,
    produce_drawables: bool,
}

impl HeadlessSurface {
    /// Simulate an occluded surface: no drawables are produced, so
    /// frames render but skip presentation
    pub fn set_produce_drawables(&mut self, produce: bool) {
        self.produce_drawables = produce;
    }
}

impl RenderSurface for HeadlessSurface {
    fn pass_target(&mut self) -> RenderPassHandle {
        RenderPassHandle(self.shared.mint())
    }

    fn current_drawable(&mut self) -> Option<DrawableHandle> {
        if self.produce_drawables {
            Some(DrawableHandle(self.shared.mint()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_write_roundtrip() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_vertex_buffer(&[1, 2, 3]).unwrap();

        backend.write_buffer(buffer, &[4, 5]).unwrap();
        assert_eq!(backend.buffer_contents(buffer).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_write_to_unknown_buffer_fails() {
        let backend = HeadlessBackend::new();
        let result = backend.write_buffer(BufferHandle(99), &[0]);
        assert!(matches!(result, Err(RenderError::UnknownBuffer(_))));
    }

    #[test]
    fn test_completions_fire_in_commit_order() {
        let backend = HeadlessBackend::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in [1, 2] {
            let mut stream = backend.create_stream();
            let order = Arc::clone(&order);
            stream.on_completed(Box::new(move || lock(&order).push(tag)));
            stream.commit();
        }

        assert_eq!(backend.pending_completions(), 2);
        assert!(backend.complete_next_frame());
        assert!(backend.complete_next_frame());
        assert!(!backend.complete_next_frame());
        assert_eq!(*lock(&order), vec![1, 2]);
    }

    #[test]
    fn test_encoder_records_commands() {
        let backend = HeadlessBackend::new();
        let mut stream = backend.create_stream();
        let mut encoder = stream.begin_render_pass(RenderPassHandle(1));

        encoder.push_debug_group("node");
        encoder.draw_triangles(3);
        encoder.pop_debug_group();
        encoder.end_encoding();
        stream.commit();

        assert_eq!(
            backend.commands(),
            vec![
                RecordedCommand::PushDebugGroup("node".to_string()),
                RecordedCommand::DrawTriangles(3),
                RecordedCommand::PopDebugGroup,
                RecordedCommand::EndEncoding,
                RecordedCommand::Commit,
            ]
        );
    }
}
