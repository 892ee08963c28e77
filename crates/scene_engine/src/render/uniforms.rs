//! Per-draw uniform data and the rotating buffer ring
//!
//! Every draw reads one [`NodeUniforms`] block: the node's model-view
//! matrix, the shared projection matrix, and the node's material
//! properties. Blocks live in a fixed ring of GPU-visible buffers sized
//! by the scene at `prepare_to_draw` time; the [`RingUniformProvider`]
//! rotates through that ring, relying on the frame pacer to guarantee the
//! slot it is about to overwrite is no longer in flight.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;
use crate::render::api::{BufferHandle, RenderDevice, UniformSource};
use crate::render::RenderResult;

/// Lighting/material properties carried by every node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    /// Diffuse reflection intensity
    pub diffuse_intensity: f32,
    /// Ambient reflection intensity
    pub ambient_intensity: f32,
    /// Specular reflection intensity
    pub specular_intensity: f32,
    /// Specular exponent
    pub shininess: f32,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            diffuse_intensity: 1.0,
            ambient_intensity: 1.0,
            specular_intensity: 1.0,
            shininess: 1.0,
        }
    }
}

/// GPU-visible uniform block written once per node per draw
///
/// `#[repr(C)]` keeps the layout identical to the shader-side struct:
/// two column-major matrices followed by four scalar material terms.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeUniforms {
    /// Model-view matrix (column-major)
    pub model_view: [[f32; 4]; 4],
    /// Projection matrix (column-major)
    pub projection: [[f32; 4]; 4],
    /// Diffuse intensity
    pub diffuse_intensity: f32,
    /// Ambient intensity
    pub ambient_intensity: f32,
    /// Specular intensity
    pub specular_intensity: f32,
    /// Specular exponent
    pub shininess: f32,
}

impl NodeUniforms {
    /// Pack matrices and material terms into the wire layout
    pub fn new(projection: &Mat4, model_view: &Mat4, material: &MaterialProperties) -> Self {
        Self {
            model_view: (*model_view).into(),
            projection: (*projection).into(),
            diffuse_intensity: material.diffuse_intensity,
            ambient_intensity: material.ambient_intensity,
            specular_intensity: material.specular_intensity,
            shininess: material.shininess,
        }
    }
}

/// Rotating fixed-size ring of uniform buffers
///
/// Allocates `inflight_count` buffers up front and hands them out in
/// round-robin order, one per draw. The provider itself does no
/// synchronization: the scene's frame pacer guarantees that by the time
/// the cursor wraps, the GPU has signaled completion for the work that
/// referenced the slot. `acquire_buffer` therefore never blocks.
pub struct RingUniformProvider {
    device: Box<dyn RenderDevice + Send>,
    buffers: Vec<BufferHandle>,
    next: usize,
}

impl RingUniformProvider {
    /// Allocate the ring on the given device
    pub fn new<D>(device: D, inflight_count: usize) -> RenderResult<Self>
    where
        D: RenderDevice + Send + 'static,
    {
        let buffers =
            device.create_uniform_buffers(inflight_count, std::mem::size_of::<NodeUniforms>())?;
        log::debug!(
            "Allocated uniform ring: {} buffers of {} bytes",
            buffers.len(),
            std::mem::size_of::<NodeUniforms>()
        );

        Ok(Self {
            device: Box::new(device),
            buffers,
            next: 0,
        })
    }

    /// Number of buffers in the ring
    pub fn inflight_count(&self) -> usize {
        self.buffers.len()
    }
}

impl UniformSource for RingUniformProvider {
    fn acquire_buffer(
        &mut self,
        projection: &Mat4,
        model_view: &Mat4,
        material: &MaterialProperties,
        node_name: &str,
    ) -> RenderResult<BufferHandle> {
        let uniforms = NodeUniforms::new(projection, model_view, material);

        let handle = self.buffers[self.next];
        self.next = (self.next + 1) % self.buffers.len();

        self.device.write_buffer(handle, bytemuck::bytes_of(&uniforms))?;
        log::trace!("Uniform slot {:?} written for node '{}'", handle, node_name);

        Ok(handle)
    }
}
