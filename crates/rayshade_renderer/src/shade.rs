//! Shading: the color seen along a ray.
//!
//! Local illumination is Phong (ambient, diffuse, specular) plus diffuse
//! translucency for light arriving from behind a surface. Reflected and
//! refracted rays recurse while the ray depth is below `max_depth` and the
//! ray could still change the pixel by more than `cutoff`.

use rayshade_math::DVec3;

use crate::ray::{Medium, VACUUM_INDEX};
use crate::shadow::Visibility;
use crate::surface::TextureHit;
use crate::tracer::Hit;
use crate::{report, Color, Ray, Scene, Severity, Surface, Tracer};

/// Everything shading needs about one hit, in world space.
#[derive(Debug, Clone)]
struct ShadePoint {
    position: DVec3,
    /// Shading normal, facing the incoming ray
    normal: DVec3,
    surface: Surface,
    /// The ray is entering the hit solid
    entering: bool,
}

impl Tracer {
    /// Color and coverage of an eye ray.
    pub fn sample_ray(&mut self, scene: &Scene, ray: &Ray) -> (Color, f64) {
        self.stats.eye_rays += 1;
        self.trace_color(scene, ray, Color::ONE)
    }

    /// `contrib` is how much this ray's color can still count in the pixel.
    fn trace_color(&mut self, scene: &Scene, ray: &Ray, contrib: Color) -> (Color, f64) {
        let Some(hit) = self.trace(&scene.world, ray, scene.options.hit_path_capacity) else {
            return (scene.options.background, 0.0);
        };
        let mut color = match self.shade_point(scene, ray, &hit) {
            Some(point) => self.shade(scene, ray, &point, contrib),
            None => scene.options.background,
        };
        if let Some(medium) = &ray.media {
            color *= medium.statten.powf(hit.dist);
        }
        (color, 1.0)
    }

    /// World-space geometry and textured surface of a hit.
    fn shade_point(&mut self, scene: &Scene, ray: &Ray, hit: &Hit<'_>) -> Option<ShadePoint> {
        let path = &hit.path;
        let inner = path.innermost()?;
        let prim = path.primitive()?;

        let local = inner.local_point();
        let normals = prim.normal(local);
        let uv = prim.uv(local);
        let mut surface = path.surface().map_or_else(Surface::default, |s| Surface::clone(s));
        let mut point = local;
        let mut normal = normals.shading;
        let mut geometric = normals.geometric;

        // Textures see the hit in the space of the node they belong to.
        for record in path.iter() {
            for texture in record.node.textures() {
                texture.apply(&mut TextureHit {
                    point,
                    normal: &mut normal,
                    uv,
                    surface: &mut surface,
                });
            }
            if let Some(xf) = &record.transform {
                point = xf.transform_point(point);
                normal = xf.transform_normal(normal).normalize_or_zero();
                geometric = xf.transform_normal(geometric).normalize_or_zero();
            }
        }

        if inner.flipped {
            normal = -normal;
            geometric = -geometric;
        }
        if geometric.dot(ray.direction) > 0.0 {
            normal = -normal;
            geometric = -geometric;
        }
        if normal.dot(ray.direction) > 0.0 {
            if scene.options.normal_advisories && !self.normal_advisory_reported {
                self.normal_advisory_reported = true;
                report(
                    Severity::Advisory,
                    format_args!(
                        "shading normal of {} faces away from the viewer; using the geometric normal",
                        inner.node.describe()
                    ),
                );
            }
            normal = geometric;
        }

        Some(ShadePoint {
            position: ray.at(hit.dist),
            normal,
            surface,
            entering: inner.enter,
        })
    }

    fn shade(&mut self, scene: &Scene, ray: &Ray, point: &ShadePoint, contrib: Color) -> Color {
        let options = &scene.options;
        let surface = &point.surface;
        let n = point.normal;
        let reflected = reflect(ray.direction, n);

        let mut color = surface.ambient * options.ambient;
        color += self.direct_light(scene, ray, point, reflected);

        let mut reflect_weight = surface.reflect;
        let mut transmit_weight = surface.transp;
        let mut refraction = None;
        if transmit_weight > 0.0 {
            let (eta, media) = if point.entering {
                let inside = Medium::push(&ray.media, surface.index, surface.statten);
                (ray.medium_index() / surface.index, Some(inside))
            } else {
                let outer = ray.media.as_ref().and_then(|m| m.pop());
                let outer_index = outer.as_ref().map_or(VACUUM_INDEX, |m| m.index);
                (ray.medium_index() / outer_index, outer)
            };
            match refract(ray.direction, n, eta) {
                Some(direction) => refraction = Some((direction, media)),
                None => {
                    self.stats.total_internal_reflections += 1;
                    reflect_weight += transmit_weight;
                    transmit_weight = 0.0;
                }
            }
        }

        if ray.depth >= options.max_depth {
            return color;
        }

        if reflect_weight > 0.0 {
            let weight = contrib * reflect_weight;
            if weight.cmpgt(options.cutoff).any() {
                self.stats.reflected_rays += 1;
                let child = ray.spawn(point.position, reflected);
                let (traced, _) = self.trace_color(scene, &child, weight);
                color += reflect_weight * traced;
            }
        }

        if let Some((direction, media)) = refraction.filter(|_| transmit_weight > 0.0) {
            let filter = surface.body * transmit_weight;
            let weight = contrib * filter;
            if weight.cmpgt(options.cutoff).any() {
                self.stats.refracted_rays += 1;
                let mut child = ray.spawn(point.position, direction);
                child.media = media;
                let (traced, _) = self.trace_color(scene, &child, weight);
                color += filter * traced;
            }
        }

        color
    }

    /// Direct light from every source.
    fn direct_light(&mut self, scene: &Scene, ray: &Ray, point: &ShadePoint, reflected: DVec3) -> Color {
        let surface = &point.surface;
        let n = point.normal;
        let mut color = Color::ZERO;

        for (index, light) in scene.lights.iter().enumerate() {
            let Some(sample) = light.illuminate(point.position, ray.sample, scene.options.samples) else {
                continue;
            };
            let cos = n.dot(sample.direction);
            let front = cos > 0.0;
            if !front && surface.translucency <= 0.0 {
                continue;
            }

            let shadow_ray = ray.spawn(point.position, sample.direction).with_depth(ray.depth);
            let arriving = match self.light_visibility(scene, index, &shadow_ray, sample.distance) {
                Visibility::Clear => sample.color,
                Visibility::Filtered(filter) => sample.color * filter,
                Visibility::Blocked => continue,
            };

            if front {
                color += surface.diffuse * arriving * cos;
                if surface.spec_exp > 0.0 {
                    let highlight = reflected.dot(sample.direction);
                    if highlight > 0.0 {
                        color += surface.specular * arriving * highlight.powf(surface.spec_exp);
                    }
                }
            } else {
                let lit = surface.translucent * arriving * surface.translucency;
                color += lit * -cos;
                if surface.trans_exp > 0.0 {
                    let highlight = ray.direction.dot(sample.direction);
                    if highlight > 0.0 {
                        color += lit * highlight.powf(surface.trans_exp);
                    }
                }
            }
        }

        color
    }
}

/// Mirror `incident` about `n`.
pub(crate) fn reflect(incident: DVec3, n: DVec3) -> DVec3 {
    incident - 2.0 * incident.dot(n) * n
}

/// Snell refraction of unit `incident` through a surface with unit normal
/// `n` facing it. `eta` is the ratio of the indices (from / to). `None` on
/// total internal reflection.
pub(crate) fn refract(incident: DVec3, n: DVec3, eta: f64) -> Option<DVec3> {
    let cos_i = -incident.dot(n);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some((eta * incident + (eta * cos_i - k.sqrt()) * n).normalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::primitive::{Plane, Sphere};
    use crate::{Geom, Light, RenderOptions};

    fn lit_scene(objects: Vec<Arc<Geom>>, options: RenderOptions) -> Scene {
        let scene = Scene::new(Arc::new(Geom::list(objects)), options)
            .with_light(Light::point(Color::ONE, DVec3::new(0.0, 0.0, 10.0)));
        scene.prepare(0);
        scene
    }

    #[test]
    fn test_reflect_and_refract() {
        let d = DVec3::new(1.0, -1.0, 0.0).normalize();
        assert!((reflect(d, DVec3::Y) - DVec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-12);

        // Matched indices pass straight through.
        assert!((refract(d, DVec3::Y, 1.0).unwrap() - d).length() < 1e-12);

        // Grazing exit from glass reflects totally.
        let grazing = DVec3::new(1.0, -0.1, 0.0).normalize();
        assert!(refract(grazing, DVec3::Y, 1.5).is_none());
    }

    #[test]
    fn test_background_on_miss() {
        let options = RenderOptions {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let scene = lit_scene(Vec::new(), options);
        let mut tracer = Tracer::new();
        let (color, alpha) = tracer.sample_ray(&scene, &Ray::new(DVec3::ZERO, DVec3::X));
        assert_eq!(color, Color::new(0.1, 0.2, 0.3));
        assert_eq!(alpha, 0.0);
    }

    #[test]
    fn test_diffuse_facing_light() {
        let white = Arc::new(Surface::diffuse(Color::ONE));
        let ball = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()).with_surface(white));
        let scene = lit_scene(vec![ball], RenderOptions::default());
        let mut tracer = Tracer::new();

        let (color, alpha) = tracer.sample_ray(&scene, &Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z));
        assert_eq!(alpha, 1.0);
        assert!((color - Color::ONE).length() < 1e-9);
        assert_eq!(tracer.stats.eye_rays, 1);
        assert_eq!(tracer.stats.shadow_rays, 1);
    }

    #[test]
    fn test_recursion_stops_at_max_depth() {
        // Two facing mirrors bounce a ray forever unless depth stops it.
        let mirror = Arc::new(Surface::diffuse(Color::ZERO).with_reflect(1.0));
        let floor = Arc::new(
            Geom::primitive(Plane::new(DVec3::new(0.0, 0.0, -1.0), DVec3::Z).unwrap()).with_surface(mirror.clone()),
        );
        let ceiling =
            Arc::new(Geom::primitive(Plane::new(DVec3::new(0.0, 0.0, 1.0), DVec3::NEG_Z).unwrap()).with_surface(mirror));
        let options = RenderOptions {
            max_depth: 3,
            cutoff: Color::ZERO,
            ..Default::default()
        };
        let scene = Scene::new(Arc::new(Geom::list(vec![floor, ceiling])), options);
        scene.prepare(0);

        let mut tracer = Tracer::new();
        tracer.sample_ray(&scene, &Ray::new(DVec3::ZERO, DVec3::NEG_Z));
        assert_eq!(tracer.stats.reflected_rays, 3);
    }

    #[test]
    fn test_cutoff_prunes_weak_rays() {
        let dull = Arc::new(Surface::diffuse(Color::splat(0.5)).with_reflect(0.001));
        let ball = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()).with_surface(dull));
        let scene = lit_scene(vec![ball], RenderOptions::default());
        let mut tracer = Tracer::new();
        tracer.sample_ray(&scene, &Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z));
        assert_eq!(tracer.stats.reflected_rays, 0);
    }

    #[test]
    fn test_refraction_through_glass_ball() {
        let glass = Arc::new(Surface::diffuse(Color::ZERO).with_transparency(1.0, Color::ONE, 1.5));
        let ball = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()).with_surface(glass));
        let options = RenderOptions {
            background: Color::splat(0.25),
            ..Default::default()
        };
        let scene = Scene::new(Arc::new(Geom::list(vec![ball])), options);
        scene.prepare(0);

        let mut tracer = Tracer::new();
        let (color, _) = tracer.sample_ray(&scene, &Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z));
        // In through the front, out through the back, then the background.
        assert_eq!(tracer.stats.refracted_rays, 2);
        assert!((color - Color::splat(0.25)).length() < 1e-9);
    }
}
