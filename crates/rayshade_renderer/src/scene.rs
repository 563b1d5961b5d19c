//! A renderable scene: the world object, its lights and the render options.

use std::sync::Arc;

use rayshade_math::Aabb;

use crate::geom::Frame;
use crate::{Geom, Light, RenderOptions};

#[derive(Debug)]
pub struct Scene {
    pub world: Arc<Geom>,
    pub lights: Vec<Light>,
    pub options: RenderOptions,
}

impl Scene {
    pub fn new(world: Arc<Geom>, options: RenderOptions) -> Self {
        Self {
            world,
            lights: Vec::new(),
            options,
        }
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Compute bounds and build acceleration structures for a frame.
    ///
    /// Must be called before tracing; an unprepared scene still renders
    /// correctly, only without any culling.
    pub fn prepare(&self, frame_number: u64) -> Aabb {
        let frame = Frame::new(frame_number, &self.options);
        let bounds = self.world.compute_bounds(&frame);
        if bounds.is_unbounded() {
            log::debug!("frame {}: world is unbounded", frame_number);
        } else {
            log::debug!(
                "frame {}: world bounds {:?} .. {:?}",
                frame_number,
                bounds.min(),
                bounds.max()
            );
        }
        bounds
    }
}
