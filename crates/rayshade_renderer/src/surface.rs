//! Surface (material) records and textures.
//!
//! A node's surface is shared and immutable while rendering. Shading works on
//! a per-hit copy that the texture chain may rewrite.

use std::fmt;
use std::sync::Arc;

use rayshade_math::DVec3;

use crate::primitive::Uv;

/// RGB color type alias
pub type Color = DVec3;

/// Material description used by the shading engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// Color of light transmitted through the body
    pub body: Color,
    /// Color of light diffusely transmitted from behind
    pub translucent: Color,
    /// Phong exponent of the specular highlight
    pub spec_exp: f64,
    /// Phong exponent of the translucent highlight
    pub trans_exp: f64,
    /// Specular transmission attenuation per unit distance inside the body
    pub statten: f64,
    /// Index of refraction
    pub index: f64,
    pub reflect: f64,
    pub transp: f64,
    pub translucency: f64,
    /// Never casts shadows
    pub no_shadow: bool,
}

impl Default for Surface {
    /// The gray surface used when no node on a hit path carries one.
    fn default() -> Self {
        Self {
            ambient: Color::splat(0.1),
            diffuse: Color::splat(0.8),
            specular: Color::ZERO,
            body: Color::ONE,
            translucent: Color::ZERO,
            spec_exp: 0.0,
            trans_exp: 0.0,
            statten: 1.0,
            index: 1.0,
            reflect: 0.0,
            transp: 0.0,
            translucency: 0.0,
            no_shadow: false,
        }
    }
}

impl Surface {
    /// A matte surface of the given color.
    pub fn diffuse(color: Color) -> Self {
        Self {
            ambient: color * 0.1,
            diffuse: color,
            ..Default::default()
        }
    }

    pub fn with_specular(mut self, specular: Color, spec_exp: f64) -> Self {
        self.specular = specular;
        self.spec_exp = spec_exp;
        self
    }

    pub fn with_reflect(mut self, reflect: f64) -> Self {
        self.reflect = reflect;
        self
    }

    /// Make the surface transparent with the given body color and index.
    pub fn with_transparency(mut self, transp: f64, body: Color, index: f64) -> Self {
        self.transp = transp;
        self.body = body;
        self.index = index;
        self
    }

    pub fn with_statten(mut self, statten: f64) -> Self {
        self.statten = statten;
        self
    }

    pub fn with_translucency(mut self, translucency: f64, translucent: Color, trans_exp: f64) -> Self {
        self.translucency = translucency;
        self.translucent = translucent;
        self.trans_exp = trans_exp;
        self
    }

    pub fn with_no_shadow(mut self, no_shadow: bool) -> Self {
        self.no_shadow = no_shadow;
        self
    }

    /// Lets any light through.
    pub fn is_transparent(&self) -> bool {
        self.transp > 0.0
    }
}

/// What a texture sees of one hit, expressed in the space of the node the
/// texture is attached to.
pub struct TextureHit<'a> {
    pub point: DVec3,
    /// Unit shading normal; a texture may perturb it.
    pub normal: &'a mut DVec3,
    pub uv: Option<Uv>,
    pub surface: &'a mut Surface,
}

/// Procedural modulation of a surface.
pub trait Texture: Send + Sync + fmt::Debug {
    fn apply(&self, hit: &mut TextureHit<'_>);
}

/// Alternates between the node's surface and another one on unit cells.
#[derive(Debug, Clone)]
pub struct Checker {
    alternate: Arc<Surface>,
}

impl Checker {
    pub fn new(alternate: Arc<Surface>) -> Self {
        Self { alternate }
    }
}

impl Texture for Checker {
    fn apply(&self, hit: &mut TextureHit<'_>) {
        // Nudge so points exactly on a cell boundary pick a stable side.
        let cell = (hit.point + DVec3::splat(rayshade_math::EPSILON)).floor();
        let parity = (cell.x + cell.y + cell.z) as i64;
        if parity.rem_euclid(2) == 1 {
            *hit.surface = (*self.alternate).clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_at(texture: &dyn Texture, point: DVec3) -> Surface {
        let mut surface = Surface::default();
        let mut normal = DVec3::Z;
        texture.apply(&mut TextureHit {
            point,
            normal: &mut normal,
            uv: None,
            surface: &mut surface,
        });
        surface
    }

    #[test]
    fn test_checker_alternates() {
        let red = Arc::new(Surface::diffuse(Color::new(1.0, 0.0, 0.0)));
        let checker = Checker::new(red.clone());

        assert_eq!(apply_at(&checker, DVec3::new(0.5, 0.5, 0.5)), Surface::default());
        assert_eq!(apply_at(&checker, DVec3::new(1.5, 0.5, 0.5)), *red);
        assert_eq!(apply_at(&checker, DVec3::new(1.5, 1.5, 0.5)), Surface::default());
        assert_eq!(apply_at(&checker, DVec3::new(-0.5, 0.5, 0.5)), *red);
    }

    #[test]
    fn test_builders() {
        let glass = Surface::diffuse(Color::splat(0.1))
            .with_transparency(0.9, Color::new(0.9, 1.0, 0.9), 1.5)
            .with_statten(0.8);
        assert!(glass.is_transparent());
        assert_eq!(glass.index, 1.5);
        assert!(!Surface::default().is_transparent());
    }
}
