//! Single-threaded image loop.
//!
//! Each pixel averages `options.samples` eye rays. Samples are jittered
//! within the pixel and spread over the shutter interval when more than one
//! is taken.

use rand::Rng;

use crate::{Camera, Color, Scene, Tracer};

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to gamma-corrected 8-bit RGB.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let channel = |c: f64| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

/// Render output: color plus coverage per pixel.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
    /// Fraction of samples that hit geometry
    pub alpha: Vec<f64>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; len],
            alpha: vec![0.0; len],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> (Color, f64) {
        let i = (y * self.width + x) as usize;
        (self.pixels[i], self.alpha[i])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color, alpha: f64) {
        let i = (y * self.width + x) as usize;
        self.pixels[i] = color;
        self.alpha[i] = alpha;
    }
}

/// Render one pixel.
pub fn render_pixel<R: Rng + ?Sized>(
    camera: &Camera,
    scene: &Scene,
    tracer: &mut Tracer,
    x: u32,
    y: u32,
    rng: &mut R,
) -> (Color, f64) {
    let samples = scene.options.samples.max(1);
    let jitter = samples > 1;
    let mut color = Color::ZERO;
    let mut alpha = 0.0;

    for sample in 0..samples {
        let fraction = if jitter { rng.gen::<f64>() } else { 0.0 };
        let ray = camera
            .get_ray(x, y, jitter, rng)
            .with_sample(sample)
            .with_time(scene.options.sample_time(fraction));
        let (c, a) = tracer.sample_ray(scene, &ray);
        color += c;
        alpha += a;
    }

    (color / samples as f64, alpha / samples as f64)
}

/// Render the entire scene to an image buffer.
pub fn render<R: Rng + ?Sized>(camera: &Camera, scene: &Scene, tracer: &mut Tracer, rng: &mut R) -> ImageBuffer {
    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);

    for y in 0..camera.image_height {
        for x in 0..camera.image_width {
            let (color, alpha) = render_pixel(camera, scene, tracer, x, y, rng);
            image.set(x, y, color, alpha);
        }
    }

    image
}
