//! Closed-form polynomial root finding for the implicit surfaces.
//!
//! Quadratics use the cancellation-free form, cubics Cardano / Viète, and
//! quartics Ferrari's resolvent cubic. Quartic roots are polished with a
//! couple of Newton steps since the closed form loses digits when the
//! coefficients span many orders of magnitude (distant rays against a torus).

use std::f64::consts::PI;

/// Coefficients smaller than this are treated as zero.
const COEFF_EPSILON: f64 = 1.0e-12;

/// Up to four real roots, in no particular order unless [`Roots::sorted`] is used.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Roots {
    values: [f64; 4],
    len: usize,
}

impl Roots {
    fn push(&mut self, x: f64) {
        // Non-finite roots come from degenerate coefficients; they are never hits.
        if self.len < 4 && x.is_finite() {
            self.values[self.len] = x;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }

    /// Roots in increasing order.
    pub fn sorted(mut self) -> Self {
        self.values[..self.len].sort_by(f64::total_cmp);
        self
    }

    /// The smallest root strictly inside `(lo, hi)`.
    pub fn first_between(&self, lo: f64, hi: f64) -> Option<f64> {
        self.iter()
            .filter(|&t| t > lo && t < hi)
            .min_by(f64::total_cmp)
    }
}

/// Solve `a x^2 + b x + c = 0`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::default();

    if a.abs() < COEFF_EPSILON {
        if b.abs() > COEFF_EPSILON {
            roots.push(-c / b);
        }
        return roots;
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    if disc == 0.0 {
        roots.push(-b / (2.0 * a));
        return roots;
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    roots.push(q / a);
    if q != 0.0 {
        roots.push(c / q);
    } else {
        roots.push(-q / a);
    }
    roots
}

/// Solve `a x^3 + b x^2 + c x + d = 0`.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    if a.abs() < COEFF_EPSILON {
        return solve_quadratic(b, c, d);
    }

    // Normalize: x^3 + p x^2 + q x + r = 0
    let p = b / a;
    let q = c / a;
    let r = d / a;

    // Depressed cubic t^3 + aa t + bb = 0 via x = t - p/3
    let p2 = p * p;
    let aa = q - p2 / 3.0;
    let bb = r - p * q / 3.0 + 2.0 * p2 * p / 27.0;
    let shift = p / 3.0;

    let delta = bb * bb / 4.0 + aa * aa * aa / 27.0;
    let mut roots = Roots::default();

    if delta > COEFF_EPSILON {
        // One real root
        let sqrt_delta = delta.sqrt();
        let u = (-bb / 2.0 + sqrt_delta).cbrt();
        let v = (-bb / 2.0 - sqrt_delta).cbrt();
        roots.push(u + v - shift);
    } else if delta.abs() <= COEFF_EPSILON {
        if aa.abs() < COEFF_EPSILON && bb.abs() < COEFF_EPSILON {
            roots.push(-shift);
        } else {
            let u = (-bb / 2.0).cbrt();
            roots.push(2.0 * u - shift);
            roots.push(-u - shift);
        }
    } else {
        // Three real roots (trigonometric form)
        let m = 2.0 * (-aa / 3.0).sqrt();
        let arg = (3.0 * bb / (aa * m)).clamp(-1.0, 1.0);
        let theta = arg.acos() / 3.0;
        roots.push(m * theta.cos() - shift);
        roots.push(m * (theta - 2.0 * PI / 3.0).cos() - shift);
        roots.push(m * (theta + 2.0 * PI / 3.0).cos() - shift);
    }

    roots
}

/// Solve `a x^4 + b x^3 + c x^2 + d x + e = 0`.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Roots {
    if a.abs() < COEFF_EPSILON {
        return solve_cubic(b, c, d, e);
    }

    let (bn, cn, dn, en) = (b / a, c / a, d / a, e / a);

    // Depressed quartic y^4 + p y^2 + q y + r = 0 via x = y - bn/4
    let b2 = bn * bn;
    let p = cn - 3.0 * b2 / 8.0;
    let q = dn - bn * cn / 2.0 + b2 * bn / 8.0;
    let r = en - bn * dn / 4.0 + b2 * cn / 16.0 - 3.0 * b2 * b2 / 256.0;
    let shift = bn / 4.0;

    let mut depressed = Roots::default();

    if q.abs() < COEFF_EPSILON {
        // Biquadratic: z = y^2
        for z in solve_quadratic(1.0, p, r).iter() {
            if z >= 0.0 {
                let y = z.sqrt();
                depressed.push(y);
                if y != 0.0 {
                    depressed.push(-y);
                }
            }
        }
    } else {
        // Ferrari: pick m > 0 with 8m^3 + 8pm^2 + (2p^2 - 8r)m - q^2 = 0.
        // Such a root always exists when q != 0.
        let m = solve_cubic(8.0, 8.0 * p, 2.0 * p * p - 8.0 * r, -q * q)
            .iter()
            .fold(f64::NEG_INFINITY, f64::max);
        if m <= 0.0 || !m.is_finite() {
            return Roots::default();
        }
        let s = (2.0 * m).sqrt();
        let half = p / 2.0 + m;
        let skew = q / (2.0 * s);

        for y in solve_quadratic(1.0, -s, half + skew).iter() {
            depressed.push(y);
        }
        for y in solve_quadratic(1.0, s, half - skew).iter() {
            depressed.push(y);
        }
    }

    let mut roots = Roots::default();
    for y in depressed.iter() {
        roots.push(polish_quartic([a, b, c, d, e], y - shift));
    }
    roots
}

/// Two Newton iterations on the original quartic.
fn polish_quartic(coeffs: [f64; 4 + 1], mut x: f64) -> f64 {
    let [a, b, c, d, e] = coeffs;
    for _ in 0..2 {
        let f = (((a * x + b) * x + c) * x + d) * x + e;
        let df = ((4.0 * a * x + 3.0 * b) * x + 2.0 * c) * x + d;
        if df.abs() < COEFF_EPSILON {
            break;
        }
        let next = x - f / df;
        if !next.is_finite() {
            break;
        }
        x = next;
    }
    x
}
