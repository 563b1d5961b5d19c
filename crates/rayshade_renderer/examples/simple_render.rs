//! Simple ray tracer example.
//!
//! Renders a small scene exercising CSG, a voxel grid, a glass ball and a
//! checkered floor, and saves it in PPM format.
//!
//! Options may be given as a JSON file: `simple_render [options.json] [output.ppm]`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayshade_renderer::{
    color_to_rgb, render, Camera, Checker, Color, CsgOp, DVec3, Geom, ImageBuffer, Light, OkOrReport, Plane,
    RenderOptions, Scene, Sphere, Surface, Torus, Tracer,
};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let options = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            RenderOptions::from_json_str(&json).with_context(|| format!("parsing {path}"))?
        }
        None => RenderOptions {
            samples: 4,
            ambient: Color::splat(0.2),
            background: Color::new(0.5, 0.7, 1.0),
            ..Default::default()
        },
    };
    let output = args.next().unwrap_or_else(|| "output.ppm".to_string());

    let start = std::time::Instant::now();
    let scene = build_scene(options)?;
    scene.prepare(0);
    log::info!("scene built in {:?}", start.elapsed());

    let mut camera = Camera::new()
        .with_resolution(400, 300)
        .with_position(DVec3::new(0.0, 3.0, 10.0), DVec3::new(0.0, 0.5, 0.0), DVec3::Y)
        .with_lens(40.0, 0.0, 10.0);
    camera.initialize();

    log::info!(
        "rendering {}x{} @ {} spp",
        camera.image_width,
        camera.image_height,
        scene.options.samples
    );

    let start = std::time::Instant::now();
    let mut tracer = Tracer::new();
    let mut rng = StdRng::seed_from_u64(1);
    let image = render(&camera, &scene, &mut tracer, &mut rng);
    log::info!("rendered in {:?}", start.elapsed());
    tracer.stats.report();

    save_ppm(&image, &output).with_context(|| format!("writing {output}"))?;
    log::info!("saved to {output}");
    Ok(())
}

fn build_scene(options: RenderOptions) -> Result<Scene> {
    let mut objects = Vec::new();

    // Checkered floor
    let white = Arc::new(Surface::diffuse(Color::splat(0.9)));
    let black = Arc::new(Surface::diffuse(Color::splat(0.1)));
    objects.push(Arc::new(
        Geom::primitive(Plane::new(DVec3::ZERO, DVec3::Y)?)
            .with_surface(white)
            .with_texture(Arc::new(Checker::new(black))),
    ));

    // A ball with a bite taken out of it
    let red = Arc::new(Surface::diffuse(Color::new(0.8, 0.1, 0.1)).with_specular(Color::ONE, 30.0));
    let ball = Arc::new(Geom::primitive(Sphere::new(DVec3::new(-2.5, 1.0, 0.0), 1.0)?));
    let bite = Arc::new(Geom::primitive(Sphere::new(DVec3::new(-2.0, 1.5, 0.8), 0.7)?));
    let bitten = Arc::new(Geom::csg(CsgOp::Difference, ball, bite).with_surface(red));
    objects.push(bitten.clone());

    // A smaller copy of it, turned to face the camera
    let copy = Geom::instance(bitten)
        .rotated(DVec3::Y, -0.8)?
        .scaled(DVec3::splat(0.4))?
        .translated(DVec3::new(-1.0, 0.0, 3.0));
    objects.push(Arc::new(copy));

    // Glass ball
    let glass = Arc::new(
        Surface::diffuse(Color::splat(0.05))
            .with_specular(Color::ONE, 80.0)
            .with_transparency(0.9, Color::new(0.9, 1.0, 0.95), 1.5),
    );
    objects.push(Arc::new(
        Geom::primitive(Sphere::new(DVec3::new(0.0, 1.0, 0.0), 1.0)?).with_surface(glass),
    ));

    // Mirror torus
    let chrome = Arc::new(Surface::diffuse(Color::splat(0.1)).with_reflect(0.8));
    if let Some(torus) = Torus::new(DVec3::new(2.5, 1.0, 0.0), DVec3::new(0.3, 1.0, 0.2), 0.8, 0.3).ok_or_report() {
        objects.push(Arc::new(Geom::primitive(torus).with_surface(chrome)));
    }

    // A cloud of small balls in a grid
    let mut rng = StdRng::seed_from_u64(7);
    let mut pebbles = Vec::new();
    for _ in 0..60 {
        let center = DVec3::new(rng.gen_range(-4.0..4.0), 0.15, rng.gen_range(1.5..4.0));
        let color = Color::new(rng.gen(), rng.gen(), rng.gen());
        if let Some(sphere) = Sphere::new(center, 0.15).ok_or_report() {
            pebbles.push(Arc::new(
                Geom::primitive(sphere).with_surface(Arc::new(Surface::diffuse(color))),
            ));
        }
    }
    let resolution = options.grid_resolution;
    objects.push(Arc::new(Geom::grid(pebbles, resolution)?));

    log::info!("created {} top-level objects", objects.len());
    let scene = Scene::new(Arc::new(Geom::list(objects)), options)
        .with_light(Light::point(Color::splat(0.8), DVec3::new(5.0, 8.0, 6.0)))
        .with_light(Light::extended(Color::splat(0.4), DVec3::new(-6.0, 6.0, 4.0), 0.5)?);
    Ok(scene)
}

fn save_ppm(image: &ImageBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    write!(writer, "P6\n{} {}\n255\n", image.width, image.height)?;
    for y in 0..image.height {
        for x in 0..image.width {
            let (color, _) = image.get(x, y);
            writer.write_all(&color_to_rgb(color))?;
        }
    }
    writer.flush()
}
