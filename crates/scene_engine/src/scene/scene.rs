//! Scene: root of the hierarchy and per-frame orchestration
//!
//! The scene owns the root node, derives the camera placement and
//! projection from the viewport, and runs the frame loop's render half:
//! acquire a pacer permit, record the whole tree into one command stream,
//! attach a completion callback that returns the permit, present, commit.

use std::sync::Arc;

use crate::config::SceneConfig;
use crate::foundation::math::{utils::deg_to_rad, Mat4, Mat4Ext};
use crate::render::api::{CommandQueue, RenderDevice, RenderSurface, UniformSource};
use crate::render::{
    FramePacer, PipelineEffect, RenderError, RenderResult, RingUniformProvider,
};
use crate::scene::{Node, NodeId, SceneError};

/// A renderable scene: root node, camera-derived projection, and the
/// frame-pacing machinery created by [`prepare_to_draw`](Self::prepare_to_draw)
pub struct Scene {
    root: Node,
    config: SceneConfig,
    scene_offset_z: f32,
    pacer: Option<Arc<FramePacer>>,
    uniforms: Option<Box<dyn UniformSource + Send>>,
}

impl Scene {
    /// Build a scene from explicit configuration
    ///
    /// The camera distance is derived so geometry of roughly viewport
    /// height fills the view at the configured field of view:
    /// `offset = (height / 2) / tan(fov / 2)`. The root node is placed at
    /// `-offset` on z and the effect's projection matrix is set from the
    /// viewport aspect, near plane, and a far plane scaled off the same
    /// offset.
    ///
    /// The config is validated first regardless of where it came from: a
    /// degenerate field of view or viewport would push the derived offset
    /// to infinity and poison the projection.
    pub fn from_config(
        name: impl Into<String>,
        effect: Arc<PipelineEffect>,
        device: &dyn RenderDevice,
        config: SceneConfig,
    ) -> RenderResult<Self> {
        config.validate()?;

        let fov = deg_to_rad(config.fov_degrees);
        let scene_offset_z = (config.height * 0.5) / (fov * 0.5).tan();

        effect.set_projection(Mat4::perspective(
            fov,
            config.width / config.height,
            config.near_plane,
            config.far_plane_factor * scene_offset_z,
        ));

        let mut root = Node::structural(name, effect, device)?;
        root.position.z = -scene_offset_z;

        log::info!(
            "Scene created: {}x{} viewport, camera offset {:.1}",
            config.width,
            config.height,
            scene_offset_z
        );

        Ok(Self {
            root,
            config,
            scene_offset_z,
            pacer: None,
            uniforms: None,
        })
    }

    /// Build a scene at a viewport size with default projection settings
    pub fn new(
        name: impl Into<String>,
        effect: Arc<PipelineEffect>,
        device: &dyn RenderDevice,
        width: f32,
        height: f32,
    ) -> RenderResult<Self> {
        Self::from_config(name, effect, device, SceneConfig::with_viewport(width, height))
    }

    /// Size the frame-pacing resources to the current tree
    ///
    /// Allocates `inflight_multiplier × node count` uniform buffers and a
    /// pacer with one permit per buffer, so the ring cursor can never lap
    /// a slot the GPU still reads. Must run after the tree is assembled
    /// and before the first [`render`](Self::render); calling it again
    /// resizes the pool for a changed tree (only safe while no frames are
    /// in flight).
    pub fn prepare_to_draw<D>(&mut self, device: &D) -> RenderResult<()>
    where
        D: RenderDevice + Clone + Send + 'static,
    {
        let pool_size = self.config.inflight_multiplier * self.root.sibling_count();

        self.pacer = Some(Arc::new(FramePacer::new(pool_size)));
        self.uniforms = Some(Box::new(RingUniformProvider::new(device.clone(), pool_size)?));

        log::info!(
            "Scene '{}' prepared: {} nodes, {} uniform buffers in flight",
            self.root.name(),
            self.root.sibling_count(),
            pool_size
        );
        Ok(())
    }

    /// Record and commit one frame
    ///
    /// Blocks until a pacer permit is free — this is the loop's only
    /// blocking point, and it bounds CPU encoding to at most
    /// `pool_size` submissions ahead of the GPU. The permit travels with
    /// the committed stream's completion callback; if recording fails
    /// before commit, the permit is returned here instead so the pacer
    /// never leaks capacity.
    pub fn render(
        &mut self,
        queue: &dyn CommandQueue,
        surface: &mut dyn RenderSurface,
        parent_world: &Mat4,
    ) -> RenderResult<()> {
        let Some(pacer) = self.pacer.as_ref().map(Arc::clone) else {
            return Err(RenderError::NotPrepared(
                "render called before prepare_to_draw".to_string(),
            ));
        };

        pacer.acquire();

        match self.record_frame(queue, surface, parent_world, &pacer) {
            Ok(()) => Ok(()),
            Err(err) => {
                // The stream never committed, so its callback will never
                // fire; hand the permit back directly.
                if let Err(release_err) = pacer.release() {
                    log::error!("Failed to return pacer permit: {}", release_err);
                }
                Err(err)
            }
        }
    }

    fn record_frame(
        &mut self,
        queue: &dyn CommandQueue,
        surface: &mut dyn RenderSurface,
        parent_world: &Mat4,
        pacer: &Arc<FramePacer>,
    ) -> RenderResult<()> {
        let uniforms = self.uniforms.as_mut().ok_or_else(|| {
            RenderError::NotPrepared("render called before prepare_to_draw".to_string())
        })?;

        let mut stream = queue.create_stream();
        let release = Arc::clone(pacer);
        stream.on_completed(Box::new(move || {
            if let Err(err) = release.release() {
                log::error!("Frame completion over-released pacer: {}", err);
            }
        }));

        let world = self.root.model_matrix().left_multiplied(parent_world);
        let projection = self.root.effect().projection();
        let pass = surface.pass_target();

        let mut encoder = None;
        for child in self.root.children_mut() {
            encoder = Some(child.render_node(
                &world,
                &projection,
                pass,
                stream.as_mut(),
                encoder.take(),
                uniforms.as_mut(),
            )?);
        }

        match surface.current_drawable() {
            Some(drawable) => stream.present(drawable),
            None => log::trace!("No drawable available, frame renders without presenting"),
        }

        if let Some(mut encoder) = encoder {
            encoder.end_encoding();
        }
        stream.commit();

        Ok(())
    }

    /// Advance the animation clock of every node in the tree
    pub fn update(&mut self, delta: f32) {
        self.root.update_with_delta(delta);
    }

    /// Attach a node under the root
    pub fn add_child(&mut self, child: Node) {
        self.root.add_child(child);
    }

    /// Detach a direct child of the root by identity
    pub fn remove_child(&mut self, id: NodeId) -> Result<Node, SceneError> {
        self.root.remove_child(id)
    }

    /// The root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The root node, mutable
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Derived camera distance along z
    pub fn scene_offset_z(&self) -> f32 {
        self.scene_offset_z
    }

    /// Permit/buffer pool size, once prepared
    pub fn pool_size(&self) -> Option<usize> {
        self.pacer.as_ref().map(|pacer| pacer.capacity())
    }

    /// Permits currently free, once prepared
    pub fn available_permits(&self) -> Option<usize> {
        self.pacer.as_ref().map(|pacer| pacer.available())
    }
}
