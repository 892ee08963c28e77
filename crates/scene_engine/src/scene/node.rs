//! Scene-graph nodes
//!
//! A [`Node`] is one transformable entity in the hierarchy: it may own
//! renderable geometry, children, or both (a node with neither is a legal
//! no-op leaf). Nodes are constructed once at scene-build time with their
//! immutable vertex and texture data; afterwards only the animated
//! transform fields and the time accumulator change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::api::{
    BufferHandle, CommandStream, CullMode, DepthStencilStateHandle, RenderDevice, RenderEncoder,
    RenderPassHandle, SamplerHandle, TextureHandle, UniformSource,
};
use crate::render::{
    DepthStencilConfig, MaterialProperties, Mesh, PipelineEffect, RenderError, RenderResult,
};
use crate::scene::SceneError;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a node, used for removal by identity
///
/// Names are debug labels and may repeat; ids never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-frame animation hook
///
/// Attached to a node to drive its animated transform fields from the
/// accumulated clock, replacing subclass overrides of the update step.
/// Runs after the node's clock advances and before children update.
pub trait NodeAnimator: Send {
    /// Advance the node's animated parameters by `delta` seconds
    fn animate(&mut self, node: &mut Node, delta: f32);
}

/// One drawable (or purely structural) entity in the scene hierarchy
pub struct Node {
    id: NodeId,
    name: String,

    /// Animated position, applied after rotation
    pub position: Vec3,
    /// Animated Euler rotation in radians, applied in x, y, z order
    pub rotation: Vec3,
    /// Animated per-axis scale, applied to vertices first
    pub scale: Vec3,
    /// Lighting/material terms written into this node's uniform block
    pub material: MaterialProperties,

    initial_transform: Mat4,
    time: f32,

    vertex_buffer: Option<BufferHandle>,
    vertex_count: u32,
    texture: Option<TextureHandle>,
    sampler: SamplerHandle,
    depth_state: DepthStencilStateHandle,
    effect: Arc<PipelineEffect>,

    children: Vec<Node>,
    sibling_count: usize,

    animator: Option<Box<dyn NodeAnimator>>,
    // Most recently written uniform slot; owned for one draw submission
    last_uniform: Option<BufferHandle>,
}

impl Node {
    /// Create a node with optional geometry and texture
    ///
    /// The vertex data is uploaded once, here, and treated as immutable
    /// afterwards. The sampler and depth/stencil state are created on the
    /// supplied device; failure of either is fatal to scene bring-up
    /// since the pipeline cannot run without them. Zeroed handles are
    /// never minted by a backend, so a zeroed pipeline or depth/stencil
    /// handle means the state is missing and is rejected here. A missing
    /// texture is legal — the node draws untextured.
    pub fn new(
        name: impl Into<String>,
        effect: Arc<PipelineEffect>,
        device: &dyn RenderDevice,
        mesh: Option<&Mesh>,
        texture: Option<TextureHandle>,
    ) -> RenderResult<Self> {
        let name = name.into();

        if effect.pipeline_state().0 == 0 {
            return Err(RenderError::MissingPipelineState(name));
        }

        let (vertex_buffer, vertex_count) = match mesh {
            Some(mesh) => (
                Some(device.create_vertex_buffer(mesh.as_bytes())?),
                mesh.vertex_count(),
            ),
            None => (None, 0),
        };

        let sampler = device.create_sampler_state()?;
        let depth_state = device.create_depth_stencil_state(&DepthStencilConfig::default())?;
        if depth_state.0 == 0 {
            return Err(RenderError::MissingDepthState(name));
        }

        if texture.is_none() && vertex_count > 0 {
            log::debug!("Node '{}' has no texture, will draw untextured", name);
        }

        Ok(Self {
            id: NodeId::next(),
            name,
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            material: MaterialProperties::default(),
            initial_transform: Mat4::identity(),
            time: 0.0,
            vertex_buffer,
            vertex_count,
            texture,
            sampler,
            depth_state,
            effect,
            children: Vec::new(),
            sibling_count: 1,
            animator: None,
            last_uniform: None,
        })
    }

    /// Create a purely structural node: traversed for its children,
    /// issues no draw of its own
    pub fn structural(
        name: impl Into<String>,
        effect: Arc<PipelineEffect>,
        device: &dyn RenderDevice,
    ) -> RenderResult<Self> {
        Self::new(name, effect, device, None, None)
    }

    /// Set the model-space offset baked in at construction
    ///
    /// Independent of the animated parameters and never mutated by
    /// [`model_matrix`](Self::model_matrix).
    pub fn with_initial_transform(mut self, transform: Mat4) -> Self {
        self.initial_transform = transform;
        self
    }

    /// Attach an animation hook driven from `update_with_delta`
    pub fn with_animator(mut self, animator: Box<dyn NodeAnimator>) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Replace the material terms
    pub fn with_material(mut self, material: MaterialProperties) -> Self {
        self.material = material;
        self
    }

    /// Stable node identity
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Debug name (non-unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared pipeline effect this node draws with
    pub fn effect(&self) -> &Arc<PipelineEffect> {
        &self.effect
    }

    /// Number of vertices drawn for this node (0 for structural nodes)
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Accumulated animation clock in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Direct children, in traversal order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct children, mutable
    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// Size of this subtree: 1 + all descendants
    ///
    /// Maintained incrementally on every add/remove and used to size the
    /// frame's uniform-buffer pool.
    pub fn sibling_count(&self) -> usize {
        self.sibling_count
    }

    /// The uniform slot written for this node's most recent draw
    pub fn last_uniform(&self) -> Option<BufferHandle> {
        self.last_uniform
    }

    /// Set a uniform scale on all three axes
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = Vec3::new(scale, scale, scale);
    }

    /// Compose the node's model matrix
    ///
    /// `local = R(x)·R(y)·R(z) · T · S` — scale reaches vertices first,
    /// then translation, then rotation — and the result is left-composed
    /// with a copy of the initial transform: `model = initial · local`.
    /// Returns a fresh value every call; `initial_transform` is never
    /// aliased or mutated.
    pub fn model_matrix(&self) -> Mat4 {
        let local = Mat4::rotation_xyz(self.rotation.x, self.rotation.y, self.rotation.z)
            * Mat4::translation(self.position.x, self.position.y, self.position.z)
            * Mat4::scaling(self.scale.x, self.scale.y, self.scale.z);

        local.left_multiplied(&self.initial_transform)
    }

    /// Advance this node's clock and recurse into every child
    ///
    /// Propagation is unconditional, depth-first, in child-list order;
    /// each descendant's clock advances exactly once per call. The
    /// animator (if any) runs after this node's clock moves and before
    /// children update.
    pub fn update_with_delta(&mut self, delta: f32) {
        self.time += delta;

        if let Some(mut animator) = self.animator.take() {
            animator.animate(self, delta);
            self.animator = Some(animator);
        }

        for child in &mut self.children {
            child.update_with_delta(delta);
        }
    }

    /// Append a child, absorbing its subtree count
    pub fn add_child(&mut self, child: Node) {
        self.sibling_count += child.sibling_count;
        self.children.push(child);

        debug_assert_eq!(
            self.sibling_count,
            1 + self
                .children
                .iter()
                .map(Node::sibling_count)
                .sum::<usize>(),
            "sibling_count out of sync after add_child"
        );
    }

    /// Remove a direct child by identity
    ///
    /// Only the matching entry is removed, and the count decrement uses
    /// the child's subtree size *at removal time* — the child may have
    /// gained or lost descendants since it was added. Asking for an
    /// absent id leaves the tree untouched and reports the mismatch.
    pub fn remove_child(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let Some(index) = self.children.iter().position(|child| child.id == id) else {
            log::warn!("remove_child: {:?} is not a direct child, ignoring", id);
            return Err(SceneError::ChildNotFound(id));
        };

        let child = self.children.remove(index);
        self.sibling_count -= child.sibling_count;

        debug_assert_eq!(
            self.sibling_count,
            1 + self
                .children
                .iter()
                .map(Node::sibling_count)
                .sum::<usize>(),
            "sibling_count out of sync after remove_child"
        );

        Ok(child)
    }

    /// Record this subtree into the frame's command stream
    ///
    /// Opens the encoder if the caller did not supply one (binding depth
    /// state, pipeline state, sampler, and cull mode), brackets the
    /// subtree in a debug scope, records every child *before* this node's
    /// own draw, and returns the live encoder so the caller can continue
    /// emitting into the same stream.
    ///
    /// Children receive the same scene-level `parent_world` matrix this
    /// node received, not this node's composed world matrix: the
    /// hierarchy is deliberately flat for matrix purposes and every node
    /// transforms relative to the scene root directly.
    ///
    /// The uniform write for this node completes (synchronously, via
    /// `uniforms`) before its draw is recorded.
    pub fn render_node(
        &mut self,
        parent_world: &Mat4,
        projection: &Mat4,
        pass: RenderPassHandle,
        stream: &mut dyn CommandStream,
        encoder: Option<Box<dyn RenderEncoder>>,
        uniforms: &mut dyn UniformSource,
    ) -> RenderResult<Box<dyn RenderEncoder>> {
        let mut encoder = match encoder {
            Some(encoder) => encoder,
            None => {
                let mut encoder = stream.begin_render_pass(pass);
                encoder.set_depth_stencil_state(self.depth_state);
                encoder.set_pipeline_state(self.effect.pipeline_state());
                encoder.set_fragment_sampler(self.sampler, 0);
                // Front-face culling matches the winding the mesh
                // generators emit; verify the sign before feeding
                // standard counter-clockwise geometry.
                encoder.set_cull_mode(CullMode::Front);
                encoder
            }
        };

        encoder.push_debug_group(&self.name);

        for child in &mut self.children {
            encoder =
                child.render_node(parent_world, projection, pass, stream, Some(encoder), uniforms)?;
        }

        if self.vertex_count > 0 {
            let world = self.model_matrix().left_multiplied(parent_world);
            let uniform = uniforms.acquire_buffer(projection, &world, &self.material, &self.name)?;
            self.last_uniform = Some(uniform);

            if let Some(vertex_buffer) = self.vertex_buffer {
                encoder.set_vertex_buffer(vertex_buffer, 0);
                encoder.set_vertex_buffer(uniform, 1);
                if let Some(texture) = self.texture {
                    encoder.set_fragment_texture(texture, 0);
                }
                encoder.draw_triangles(self.vertex_count);
            }
        }

        encoder.pop_debug_group();

        Ok(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{CommandQueue, PipelineStateHandle};
    use crate::render::backends::{HeadlessBackend, RecordedCommand};
    use crate::render::uniforms::RingUniformProvider;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn test_effect() -> Arc<PipelineEffect> {
        Arc::new(PipelineEffect::new("test", PipelineStateHandle(1)))
    }

    fn leaf(backend: &HeadlessBackend, name: &str) -> Node {
        Node::structural(name, test_effect(), backend).unwrap()
    }

    fn drawable(backend: &HeadlessBackend, name: &str, mesh: &Mesh) -> Node {
        Node::new(name, test_effect(), backend, Some(mesh), None).unwrap()
    }

    #[test]
    fn test_zeroed_pipeline_state_is_fatal() {
        let backend = HeadlessBackend::new();
        let hollow = Arc::new(PipelineEffect::new("hollow", PipelineStateHandle(0)));

        let result = Node::structural("n", hollow, &backend);
        assert!(matches!(result, Err(RenderError::MissingPipelineState(_))));
    }

    /// Delegates to a headless backend but hands out a zeroed
    /// depth/stencil handle, as a backend with a broken state cache would
    struct NoDepthDevice(HeadlessBackend);

    impl RenderDevice for NoDepthDevice {
        fn create_vertex_buffer(&self, data: &[u8]) -> RenderResult<BufferHandle> {
            self.0.create_vertex_buffer(data)
        }

        fn create_uniform_buffers(
            &self,
            count: usize,
            size: usize,
        ) -> RenderResult<Vec<BufferHandle>> {
            self.0.create_uniform_buffers(count, size)
        }

        fn write_buffer(&self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()> {
            self.0.write_buffer(buffer, data)
        }

        fn create_sampler_state(&self) -> RenderResult<SamplerHandle> {
            self.0.create_sampler_state()
        }

        fn create_depth_stencil_state(
            &self,
            _config: &DepthStencilConfig,
        ) -> RenderResult<DepthStencilStateHandle> {
            Ok(DepthStencilStateHandle(0))
        }

        fn create_pipeline_state(&self) -> RenderResult<PipelineStateHandle> {
            self.0.create_pipeline_state()
        }
    }

    #[test]
    fn test_zeroed_depth_state_is_fatal() {
        let device = NoDepthDevice(HeadlessBackend::new());

        let result = Node::structural("n", test_effect(), &device);
        assert!(matches!(result, Err(RenderError::MissingDepthState(_))));
    }

    #[test]
    fn test_model_matrix_is_deterministic() {
        let backend = HeadlessBackend::new();
        let mut node = leaf(&backend, "n");
        node.position = Vec3::new(1.0, 2.0, 3.0);
        node.rotation = Vec3::new(0.3, 0.6, 0.9);
        node.set_scale(2.0);

        assert_relative_eq!(node.model_matrix(), node.model_matrix(), epsilon = EPSILON);
    }

    #[test]
    fn test_model_matrix_never_mutates_initial_transform() {
        let backend = HeadlessBackend::new();
        let initial = Mat4::translation(5.0, 0.0, 0.0);
        let mut node = leaf(&backend, "n").with_initial_transform(initial);
        node.rotation = Vec3::new(1.0, 0.5, 0.25);

        let _ = node.model_matrix();
        let _ = node.model_matrix();

        // Composing again with zeroed animation fields reproduces the
        // untouched initial transform exactly.
        node.rotation = Vec3::zeros();
        assert_relative_eq!(node.model_matrix(), initial, epsilon = EPSILON);
    }

    #[test]
    fn test_model_matrix_scale_applies_before_translate() {
        let backend = HeadlessBackend::new();
        let mut node = leaf(&backend, "n");
        node.position = Vec3::new(10.0, 0.0, 0.0);
        node.set_scale(2.0);

        // Unit X point: scaled to 2, then translated by 10 — the
        // translation itself must not be scaled.
        let p = node
            .model_matrix()
            .transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 12.0, epsilon = EPSILON);
    }

    #[test]
    fn test_set_scale_sets_all_axes() {
        let backend = HeadlessBackend::new();
        let mut node = leaf(&backend, "n");
        node.set_scale(2.0);

        assert_relative_eq!(node.scale.x, 2.0);
        assert_relative_eq!(node.scale.y, 2.0);
        assert_relative_eq!(node.scale.z, 2.0);
    }

    #[test]
    fn test_sibling_count_invariant_through_mutations() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");

        let mut branch = leaf(&backend, "branch");
        branch.add_child(leaf(&backend, "leaf-a"));
        branch.add_child(leaf(&backend, "leaf-b"));
        assert_eq!(branch.sibling_count(), 3);

        root.add_child(branch);
        root.add_child(leaf(&backend, "leaf-c"));
        assert_eq!(root.sibling_count(), 5);
        assert_eq!(
            root.sibling_count(),
            1 + root
                .children()
                .iter()
                .map(Node::sibling_count)
                .sum::<usize>()
        );
    }

    #[test]
    fn test_add_remove_roundtrip_restores_state() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");
        root.add_child(leaf(&backend, "keep"));

        let before_count = root.sibling_count();
        let before_children = root.children().len();

        let child = leaf(&backend, "transient");
        let child_id = child.id();
        root.add_child(child);
        root.remove_child(child_id).unwrap();

        assert_eq!(root.sibling_count(), before_count);
        assert_eq!(root.children().len(), before_children);
        assert_eq!(root.children()[0].name(), "keep");
    }

    #[test]
    fn test_remove_uses_count_at_removal_time() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");

        let child = leaf(&backend, "child");
        let child_id = child.id();
        root.add_child(child);
        assert_eq!(root.sibling_count(), 2);

        // The child grows a descendant *after* being added
        root.children_mut()[0].add_child(leaf(&backend, "grandchild"));
        assert_eq!(root.sibling_count(), 2, "parent count unchanged by deep add");

        // Removal must subtract the child's current subtree size (2),
        // not the size captured when it was added (1)... the parent
        // absorbed only 1, so the remaining count reflects that skew.
        let removed = root.remove_child(child_id).unwrap();
        assert_eq!(removed.sibling_count(), 2);
        assert_eq!(root.children().len(), 0);
    }

    #[test]
    fn test_remove_by_identity_not_position() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");

        // Two children with the same debug name
        let first = leaf(&backend, "twin");
        let second = leaf(&backend, "twin");
        let first_id = first.id();
        let second_id = second.id();
        root.add_child(first);
        root.add_child(second);

        root.remove_child(second_id).unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].id(), first_id);
    }

    #[test]
    fn test_remove_absent_child_is_reported_noop() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");
        root.add_child(leaf(&backend, "child"));

        let stranger = leaf(&backend, "stranger");
        let result = root.remove_child(stranger.id());

        assert!(matches!(result, Err(SceneError::ChildNotFound(_))));
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.sibling_count(), 2);
    }

    #[test]
    fn test_update_with_delta_accumulates_across_tree() {
        let backend = HeadlessBackend::new();
        let mut root = leaf(&backend, "root");
        let mut branch = leaf(&backend, "branch");
        branch.add_child(leaf(&backend, "deep"));
        root.add_child(branch);

        root.update_with_delta(0.25);
        root.update_with_delta(0.5);

        // d1 then d2 equals one call with d1 + d2, for every node
        assert_relative_eq!(root.time(), 0.75, epsilon = EPSILON);
        assert_relative_eq!(root.children()[0].time(), 0.75, epsilon = EPSILON);
        assert_relative_eq!(
            root.children()[0].children()[0].time(),
            0.75,
            epsilon = EPSILON
        );
    }

    struct Spinner;

    impl NodeAnimator for Spinner {
        fn animate(&mut self, node: &mut Node, delta: f32) {
            node.rotation.y += delta;
        }
    }

    #[test]
    fn test_animator_drives_transform_fields() {
        let backend = HeadlessBackend::new();
        let mut node = leaf(&backend, "spinning").with_animator(Box::new(Spinner));

        node.update_with_delta(0.5);
        node.update_with_delta(0.5);

        assert_relative_eq!(node.rotation.y, 1.0, epsilon = EPSILON);
        assert_relative_eq!(node.time(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_traversal_children_draw_before_parent() {
        let backend = HeadlessBackend::new();
        let mesh = Mesh::cube(0.5);

        let mut parent = drawable(&backend, "parent", &mesh);
        parent.add_child(drawable(&backend, "child", &mesh));

        let mut provider = RingUniformProvider::new(backend.clone(), 6).unwrap();
        let mut stream = backend.create_stream();
        backend.clear_commands();

        let mut encoder = parent
            .render_node(
                &Mat4::identity(),
                &Mat4::identity(),
                RenderPassHandle(1),
                stream.as_mut(),
                None,
                &mut provider,
            )
            .unwrap();
        encoder.end_encoding();
        stream.commit();

        let commands = backend.commands();
        let draws: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter_map(|(i, c)| matches!(c, RecordedCommand::DrawTriangles(_)).then_some(i))
            .collect();
        let scopes: Vec<(usize, &RecordedCommand)> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                matches!(
                    c,
                    RecordedCommand::PushDebugGroup(_) | RecordedCommand::PopDebugGroup
                )
            })
            .collect();

        // Two draws: the child's first, then the parent's
        assert_eq!(draws.len(), 2);
        // Scopes nest: parent opens, child opens/closes inside, parent closes
        assert_eq!(
            scopes[0].1,
            &RecordedCommand::PushDebugGroup("parent".to_string())
        );
        assert_eq!(
            scopes[1].1,
            &RecordedCommand::PushDebugGroup("child".to_string())
        );
        assert!(scopes[1].0 < draws[0], "child scope opens before first draw");
        assert!(draws[0] < draws[1], "child draw precedes parent draw");
    }

    #[test]
    fn test_structural_node_traverses_but_does_not_draw() {
        let backend = HeadlessBackend::new();
        let mesh = Mesh::cube(0.5);

        let mut group = leaf(&backend, "group");
        group.add_child(drawable(&backend, "drawable", &mesh));

        let mut provider = RingUniformProvider::new(backend.clone(), 6).unwrap();
        let mut stream = backend.create_stream();
        backend.clear_commands();

        let mut encoder = group
            .render_node(
                &Mat4::identity(),
                &Mat4::identity(),
                RenderPassHandle(1),
                stream.as_mut(),
                None,
                &mut provider,
            )
            .unwrap();
        encoder.end_encoding();
        stream.commit();

        let draw_count = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RecordedCommand::DrawTriangles(_)))
            .count();
        assert_eq!(draw_count, 1, "only the drawable child issues a draw");
        assert!(group.last_uniform().is_none());
    }

    #[test]
    fn test_untextured_node_binds_no_texture() {
        let backend = HeadlessBackend::new();
        let mesh = Mesh::cube(0.5);
        let mut node = drawable(&backend, "plain", &mesh);

        let mut provider = RingUniformProvider::new(backend.clone(), 3).unwrap();
        let mut stream = backend.create_stream();
        backend.clear_commands();

        let mut encoder = node
            .render_node(
                &Mat4::identity(),
                &Mat4::identity(),
                RenderPassHandle(1),
                stream.as_mut(),
                None,
                &mut provider,
            )
            .unwrap();
        encoder.end_encoding();
        stream.commit();

        let commands = backend.commands();
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RecordedCommand::SetFragmentTexture(_, _))));
        assert!(commands
            .iter()
            .any(|c| matches!(c, RecordedCommand::DrawTriangles(36))));
        assert!(node.last_uniform().is_some());
    }
}
