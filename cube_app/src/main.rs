//! Spinning cube demo
//!
//! Builds a scene with one textured-slot-free cube under the root,
//! attaches a spin animator, and runs a fixed number of frames against
//! the headless backend, acknowledging each frame's completion the way a
//! display link would. Mostly useful as an end-to-end smoke test of the
//! update/render loop and the frame pacer.

use std::sync::Arc;

use scene_engine::prelude::*;
use scene_engine::render::backends::HeadlessBackend;
use scene_engine::render::{Mesh, RenderDevice};

const VIEWPORT_WIDTH: f32 = 800.0;
const VIEWPORT_HEIGHT: f32 = 600.0;
const FRAME_COUNT: u32 = 300;

/// Spins the cube around x and y at fixed rates
struct CubeSpinner {
    x_rate: f32,
    y_rate: f32,
}

impl NodeAnimator for CubeSpinner {
    fn animate(&mut self, node: &mut Node, delta: f32) {
        node.rotation.x += self.x_rate * delta;
        node.rotation.y += self.y_rate * delta;
    }
}

struct CubeApp {
    backend: HeadlessBackend,
    scene: Scene,
    timer: Timer,
}

impl CubeApp {
    fn new() -> Result<Self, RenderError> {
        let backend = HeadlessBackend::new();
        let effect = Arc::new(PipelineEffect::new(
            "basic",
            backend.create_pipeline_state()?,
        ));

        let mut scene = Scene::new(
            "main",
            effect.clone(),
            &backend,
            VIEWPORT_WIDTH,
            VIEWPORT_HEIGHT,
        )?;

        let cube = Node::new("cube", effect, &backend, Some(&Mesh::cube(100.0)), None)?
            .with_animator(Box::new(CubeSpinner {
                x_rate: 0.5,
                y_rate: 0.8,
            }));
        scene.add_child(cube);

        scene.prepare_to_draw(&backend)?;
        log::info!(
            "Scene ready: {} uniform buffers in flight",
            scene.pool_size().unwrap_or(0)
        );

        Ok(Self {
            backend,
            scene,
            timer: Timer::new(),
        })
    }

    fn run(&mut self) -> Result<(), RenderError> {
        let mut surface = self.backend.surface();

        for frame in 0..FRAME_COUNT {
            self.timer.update();
            let delta = self.timer.delta_time();

            self.scene.update(delta);
            self.scene
                .render(&self.backend, &mut surface, &Mat4::identity())?;

            // Stand in for the display link: the previous submission
            // finishes before the next frame starts encoding.
            self.backend.complete_next_frame();

            if frame % 60 == 0 {
                log::info!(
                    "Frame {}: delta {:.4}s, cube rotation.y {:.2}",
                    frame,
                    delta,
                    self.scene.root().children()[0].rotation.y
                );
            }
        }

        log::info!(
            "Rendered {} frames in {:.2}s",
            FRAME_COUNT,
            self.timer.total_time()
        );
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let mut app = match CubeApp::new() {
        Ok(app) => app,
        Err(err) => {
            log::error!("Failed to build scene: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = app.run() {
        log::error!("Render loop failed: {}", err);
        std::process::exit(1);
    }
}
