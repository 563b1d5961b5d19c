//! Light sources.

use std::f64::consts::TAU;

use rayshade_math::{DVec3, EPSILON, FAR_AWAY};

use crate::primitive::orthonormal_basis;
use crate::{Color, GeomError, GeomResult};

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Point {
        position: DVec3,
    },
    /// Infinitely far away; `direction` points from the scene toward it.
    Infinite {
        direction: DVec3,
    },
    Spot {
        position: DVec3,
        /// Unit axis the spot shines along
        axis: DVec3,
        /// Falloff exponent on the cosine to the axis
        exponent: f64,
        /// Cosine of the angle inside which the spot is at full strength
        cos_inner: f64,
        /// Cosine of the angle outside which the spot is dark
        cos_outer: f64,
    },
    /// A spherical light, sampled as a disc facing the shaded point.
    Extended {
        position: DVec3,
        radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Color,
    pub kind: LightKind,
    /// Never blocked by geometry
    pub no_shadow: bool,
}

/// Light arriving at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the point toward the light
    pub direction: DVec3,
    /// Distance to the light; shadow rays stop here
    pub distance: f64,
    pub color: Color,
}

impl Light {
    pub fn point(color: Color, position: DVec3) -> Self {
        Self::new(color, LightKind::Point { position })
    }

    pub fn infinite(color: Color, direction: DVec3) -> GeomResult<Self> {
        let direction = direction.try_normalize().ok_or(GeomError::degenerate("light", "zero direction"))?;
        Ok(Self::new(color, LightKind::Infinite { direction }))
    }

    /// A spot at `position` aimed at `target`. Angles are in degrees.
    pub fn spot(
        color: Color,
        position: DVec3,
        target: DVec3,
        exponent: f64,
        inner_angle: f64,
        outer_angle: f64,
    ) -> GeomResult<Self> {
        let axis = (target - position)
            .try_normalize()
            .ok_or(GeomError::degenerate("spot light", "target at light position"))?;
        if inner_angle > outer_angle {
            return Err(GeomError::degenerate("spot light", "inner angle exceeds outer angle"));
        }
        Ok(Self::new(
            color,
            LightKind::Spot {
                position,
                axis,
                exponent,
                cos_inner: inner_angle.to_radians().cos(),
                cos_outer: outer_angle.to_radians().cos(),
            },
        ))
    }

    pub fn extended(color: Color, position: DVec3, radius: f64) -> GeomResult<Self> {
        if radius <= 0.0 {
            return Err(GeomError::degenerate("extended light", "non-positive radius"));
        }
        Ok(Self::new(color, LightKind::Extended { position, radius }))
    }

    fn new(color: Color, kind: LightKind) -> Self {
        Self {
            color,
            kind,
            no_shadow: false,
        }
    }

    pub fn with_no_shadow(mut self, no_shadow: bool) -> Self {
        self.no_shadow = no_shadow;
        self
    }

    /// Light reaching `p`, or `None` when it cannot contribute.
    ///
    /// `sample` and `samples` select a stratum on extended lights so that
    /// successive pixel samples cover the whole light.
    pub fn illuminate(&self, p: DVec3, sample: u32, samples: u32) -> Option<LightSample> {
        match &self.kind {
            LightKind::Point { position } => toward(p, *position, self.color),
            LightKind::Infinite { direction } => Some(LightSample {
                direction: *direction,
                distance: FAR_AWAY,
                color: self.color,
            }),
            LightKind::Spot {
                position,
                axis,
                exponent,
                cos_inner,
                cos_outer,
            } => {
                let mut light = toward(p, *position, self.color)?;
                let cos = -light.direction.dot(*axis);
                if cos <= *cos_outer {
                    return None;
                }
                let mut falloff = cos.powf(*exponent);
                if cos < *cos_inner {
                    falloff *= smoothstep(*cos_outer, *cos_inner, cos);
                }
                light.color *= falloff;
                Some(light)
            }
            LightKind::Extended { position, radius } => {
                let offset = *position - p;
                let w = offset.try_normalize()?;
                let (u, v) = orthonormal_basis(w);
                let (x, y) = disc_stratum(sample, samples);
                toward(p, *position + *radius * (x * u + y * v), self.color)
            }
        }
    }
}

fn toward(p: DVec3, position: DVec3, color: Color) -> Option<LightSample> {
    let offset = position - p;
    let distance = offset.length();
    if distance < EPSILON {
        return None;
    }
    Some(LightSample {
        direction: offset / distance,
        distance,
        color,
    })
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Center of stratum `sample` out of `samples` on the unit disc.
///
/// The unit square is split into a `ceil(sqrt(samples))` grid and each cell
/// is mapped to the disc with equal area.
fn disc_stratum(sample: u32, samples: u32) -> (f64, f64) {
    let n = (samples.max(1) as f64).sqrt().ceil() as u32;
    let cell = sample % (n * n);
    let s = ((cell % n) as f64 + 0.5) / n as f64;
    let t = ((cell / n) as f64 + 0.5) / n as f64;
    let r = s.sqrt();
    let theta = TAU * t;
    (r * theta.cos(), r * theta.sin())
}
