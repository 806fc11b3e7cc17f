//! Tensor field: basis fields blended into a single direction field sampled
//! continuously across the plane, plus the sea/river/park masks that other
//! stages query through it.
//!
//! Reference: Chen et al. 2008 - "Interactive Procedural Street Modeling"
//! https://www.sci.utah.edu/~chengu/street_sig08/street_sig08.pdf

use crate::geometry::{Polygon, Vector};
use crate::params::{BasisFieldKind, BasisFieldParams, NoiseParams, TensorFieldParams};

/// Degenerate-tensor threshold; below this magnitude a tensor has no
/// well-defined eigenvector direction.
pub const EPSILON: f64 = 1e-4;

/// A symmetric traceless 2x2 tensor `[[r, s], [s, -r]]` represented in
/// polar form. `r` is the magnitude, `theta` the orientation; the major
/// eigenvector points at `theta / 2`.
#[derive(Clone, Copy, Debug)]
pub struct Tensor {
    pub r: f64,
    pub theta: f64,
}

impl Tensor {
    pub const ZERO: Tensor = Tensor { r: 0.0, theta: 0.0 };

    pub fn from_angle(theta: f64) -> Self {
        Self { r: 1.0, theta: normalize_angle(2.0 * theta) }
    }

    fn as_rs(&self) -> (f64, f64) {
        (self.r * self.theta.cos(), self.r * self.theta.sin())
    }

    fn from_rs(r: f64, s: f64) -> Self {
        let magnitude = (r * r + s * s).sqrt();
        let theta = s.atan2(r);
        Tensor { r: magnitude, theta }
    }

    pub fn add(self, other: Tensor) -> Tensor {
        let (r1, s1) = self.as_rs();
        let (r2, s2) = other.as_rs();
        Tensor::from_rs(r1 + r2, s1 + s2)
    }

    pub fn scale(self, k: f64) -> Tensor {
        Tensor { r: self.r * k, theta: self.theta }
    }

    pub fn is_degenerate(&self) -> bool {
        self.r < EPSILON
    }

    /// Major eigenvector (unit length), angle `theta / 2`.
    pub fn major(&self) -> Vector {
        Vector::new((self.theta / 2.0).cos(), (self.theta / 2.0).sin())
    }

    /// Minor eigenvector: major rotated 90 degrees.
    pub fn minor(&self) -> Vector {
        self.major().perp()
    }

    pub fn rotated(&self, delta_theta: f64) -> Tensor {
        Tensor { r: self.r, theta: normalize_angle(self.theta + 2.0 * delta_theta) }
    }
}

fn normalize_angle(theta: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut t = theta % two_pi;
    if t <= -std::f64::consts::PI {
        t += two_pi;
    } else if t > std::f64::consts::PI {
        t -= two_pi;
    }
    t
}

/// Which eigenvector direction a streamline follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parity {
    Major,
    Minor,
}

impl Parity {
    pub fn opposite(self) -> Parity {
        match self {
            Parity::Major => Parity::Minor,
            Parity::Minor => Parity::Major,
        }
    }

    pub fn eigenvector(self, tensor: &Tensor) -> Vector {
        match self {
            Parity::Major => tensor.major(),
            Parity::Minor => tensor.minor(),
        }
    }
}

/// A primitive direction field: grid (globally constant orientation) or
/// radial (spirals around a centre).
#[derive(Clone, Copy, Debug)]
pub enum BasisField {
    Grid { centre: Vector, size: f64, decay: f64, theta: f64 },
    Radial { centre: Vector, size: f64, decay: f64 },
}

impl BasisField {
    pub fn from_params(p: &BasisFieldParams) -> Self {
        let centre = Vector::new(p.x, p.y);
        match p.kind {
            BasisFieldKind::Grid => BasisField::Grid { centre, size: p.size, decay: p.decay, theta: p.theta },
            BasisFieldKind::Radial => BasisField::Radial { centre, size: p.size, decay: p.decay },
        }
    }

    pub fn centre(&self) -> Vector {
        match self {
            BasisField::Grid { centre, .. } => *centre,
            BasisField::Radial { centre, .. } => *centre,
        }
    }

    pub fn tensor_at(&self, p: Vector) -> Tensor {
        match self {
            BasisField::Grid { size, theta, .. } => Tensor::from_angle(*theta).scale(size * size),
            BasisField::Radial { centre, .. } => {
                let d = p - *centre;
                if d.length_squared() < 1e-12 {
                    Tensor::ZERO
                } else {
                    // Perpendicular to the radius so streamlines spiral
                    // around the centre instead of pointing straight at it.
                    Tensor::from_angle(d.angle() + std::f64::consts::FRAC_PI_2)
                }
            }
        }
    }

    /// Exponential decay of influence with distance, normalized by `size`.
    pub fn weight(&self, p: Vector) -> f64 {
        let (centre, size, decay) = match self {
            BasisField::Grid { centre, size, decay, .. } => (*centre, *size, *decay),
            BasisField::Radial { centre, size, decay } => (*centre, *size, *decay),
        };
        let dist_sq = (p - centre).length_squared();
        let size = size.max(1e-6);
        (-decay * dist_sq / (size * size)).exp()
    }
}

/// Samples `noise2D(x, y) -> [-1, 1]`. Treated as an external black-box
/// collaborator per spec §1; the crate ships one real implementation
/// (`PerlinNoise`) but callers may substitute their own.
pub trait NoiseSource {
    fn sample(&self, x: f64, y: f64) -> f64;
}

pub struct PerlinNoise {
    perlin: noise::Perlin,
}

impl PerlinNoise {
    pub fn new(seed: u64) -> Self {
        Self { perlin: noise::Perlin::new(seed as u32) }
    }
}

impl NoiseSource for PerlinNoise {
    fn sample(&self, x: f64, y: f64) -> f64 {
        use noise::NoiseFn;
        self.perlin.get([x, y])
    }
}

/// The composite tensor field: weighted sum of basis fields, modulated by
/// noise, masked by sea/river/park geometry.
pub struct TensorField {
    pub basis_fields: Vec<BasisField>,
    pub sea: Polygon,
    pub river: Vec<Vector>,
    pub river_polygon: Polygon,
    pub parks: Vec<Polygon>,
    pub ignore_river: bool,
    pub noise: NoiseParams,
}

impl TensorField {
    pub fn new(params: &TensorFieldParams) -> Self {
        Self {
            basis_fields: params.basis_fields.iter().map(BasisField::from_params).collect(),
            sea: Polygon::new(Vec::new()),
            river: Vec::new(),
            river_polygon: Polygon::new(Vec::new()),
            parks: Vec::new(),
            ignore_river: false,
            noise: params.noise_params,
        }
    }

    pub fn add_basis_field(&mut self, field: BasisField) {
        self.basis_fields.push(field);
    }

    pub fn inside_sea(&self, p: Vector) -> bool {
        !self.sea.is_empty() && self.sea.contains(p)
    }

    pub fn inside_river(&self, p: Vector) -> bool {
        !self.river_polygon.is_empty() && self.river_polygon.contains(p)
    }

    pub fn inside_park(&self, p: Vector) -> bool {
        self.parks.iter().any(|park| park.contains(p))
    }

    /// Sample the composite field at `p`, applying the sea/river hard mask
    /// and park/global noise rotation, per spec §4.C.
    pub fn sample(&self, p: Vector, noise_source: &dyn NoiseSource) -> Tensor {
        if self.inside_sea(p) || (!self.ignore_river && self.inside_river(p)) {
            return Tensor::ZERO;
        }

        let mut total = Tensor::ZERO;
        for field in &self.basis_fields {
            let w = field.weight(p);
            if w < 1e-9 {
                continue;
            }
            total = total.add(field.tensor_at(p).scale(w));
        }

        if total.is_degenerate() {
            return Tensor::ZERO;
        }

        let park_hit = self.inside_park(p);
        if park_hit || self.noise.global_noise {
            let (size, angle_deg) = if park_hit {
                (self.noise.noise_size_park, self.noise.noise_angle_park)
            } else {
                (self.noise.noise_size_global, self.noise.noise_angle_global)
            };
            let n = noise_source.sample(p.x / size.max(1e-6), p.y / size.max(1e-6));
            let delta = n * angle_deg.to_radians();
            total = total.rotated(delta);
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ZeroNoise;
    impl NoiseSource for ZeroNoise {
        fn sample(&self, _x: f64, _y: f64) -> f64 {
            0.0
        }
    }

    #[test]
    fn empty_field_is_zero_everywhere() {
        let field = TensorField::new(&TensorFieldParams::default());
        let t = field.sample(Vector::new(10.0, 10.0), &ZeroNoise);
        assert!(t.is_degenerate());
    }

    #[test]
    fn sample_scales_without_changing_direction() {
        let mut field = TensorField::new(&TensorFieldParams::default());
        field.add_basis_field(BasisField::Grid {
            centre: Vector::ZERO,
            size: 500.0,
            decay: 10.0,
            theta: 0.3,
        });
        let p = Vector::new(5.0, 5.0);
        let t1 = field.sample(p, &ZeroNoise);
        let doubled = t1.add(t1);
        let major1 = t1.major();
        let major2 = doubled.major();
        assert!((major1.dot(major2) - 1.0).abs() < 1e-9 || (major1.dot(major2) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn sea_mask_zeroes_field() {
        let mut field = TensorField::new(&TensorFieldParams::default());
        field.add_basis_field(BasisField::Grid {
            centre: Vector::ZERO,
            size: 500.0,
            decay: 10.0,
            theta: 0.0,
        });
        field.sea = Polygon::new(vec![
            Vector::new(-10.0, -10.0),
            Vector::new(10.0, -10.0),
            Vector::new(10.0, 10.0),
            Vector::new(-10.0, 10.0),
        ]);
        let t = field.sample(Vector::new(0.0, 0.0), &ZeroNoise);
        assert!(t.is_degenerate());
    }

    #[test]
    fn major_minor_are_orthogonal() {
        let t = Tensor::from_angle(0.37);
        assert!(t.major().dot(t.minor()).abs() < 1e-9);
    }
}
