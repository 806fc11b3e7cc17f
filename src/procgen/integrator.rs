//! RK4 (and Euler fallback) integration of a streamline step along an
//! eigenvector of the tensor field.

use crate::geometry::Vector;

use super::tensor::{NoiseSource, Parity, TensorField};

/// Result of stepping the integrator: either the next position, or a report
/// that the tensor field went degenerate somewhere in the step.
pub enum StepResult {
    Next(Vector),
    Degenerate,
}

pub struct Integrator<'a> {
    field: &'a TensorField,
    noise: &'a dyn NoiseSource,
}

impl<'a> Integrator<'a> {
    pub fn new(field: &'a TensorField, noise: &'a dyn NoiseSource) -> Self {
        Self { field, noise }
    }

    /// Direction at `p` following `parity`, sign-aligned with `prev_dir` so
    /// the eigenvector choice never flips 180 degrees between samples.
    fn direction_at(&self, p: Vector, parity: Parity, prev_dir: Vector) -> Option<Vector> {
        let tensor = self.field.sample(p, self.noise);
        if tensor.is_degenerate() {
            return None;
        }
        let mut dir = parity.eigenvector(&tensor);
        if prev_dir.length_squared() > 1e-12 && dir.dot(prev_dir) < 0.0 {
            dir = -dir;
        }
        Some(dir)
    }

    /// Classic RK4 step of length `dstep` from `pos`, following `parity`
    /// and aligned against `prev_dir`.
    pub fn rk4_step(&self, pos: Vector, parity: Parity, prev_dir: Vector, dstep: f64) -> StepResult {
        let Some(k1) = self.direction_at(pos, parity, prev_dir) else {
            return StepResult::Degenerate;
        };
        let Some(k2) = self.direction_at(pos + k1 * (dstep * 0.5), parity, k1) else {
            return StepResult::Degenerate;
        };
        let Some(k3) = self.direction_at(pos + k2 * (dstep * 0.5), parity, k2) else {
            return StepResult::Degenerate;
        };
        let Some(k4) = self.direction_at(pos + k3 * dstep, parity, k3) else {
            return StepResult::Degenerate;
        };

        let step = (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dstep / 6.0);
        StepResult::Next(pos + step)
    }

    /// Single-evaluation Euler step. Exposed per spec §4.D for callers
    /// willing to trade accuracy for speed; the default pipeline always
    /// uses [`Integrator::rk4_step`].
    pub fn euler_step(&self, pos: Vector, parity: Parity, prev_dir: Vector, dstep: f64) -> StepResult {
        match self.direction_at(pos, parity, prev_dir) {
            Some(dir) => StepResult::Next(pos + dir * dstep),
            None => StepResult::Degenerate,
        }
    }

    /// The direction at `pos` alone, used when seeding a new streamline.
    pub fn initial_direction(&self, pos: Vector, parity: Parity) -> Option<Vector> {
        self.direction_at(pos, parity, Vector::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TensorFieldParams;
    use crate::procgen::tensor::BasisField;

    struct ZeroNoise;
    impl NoiseSource for ZeroNoise {
        fn sample(&self, _x: f64, _y: f64) -> f64 {
            0.0
        }
    }

    #[test]
    fn rk4_step_moves_by_dstep() {
        let mut field = TensorField::new(&TensorFieldParams::default());
        field.add_basis_field(BasisField::Grid {
            centre: Vector::ZERO,
            size: 500.0,
            decay: 0.0,
            theta: 0.0,
        });
        let noise = ZeroNoise;
        let integrator = Integrator::new(&field, &noise);
        match integrator.rk4_step(Vector::new(0.0, 0.0), Parity::Major, Vector::ZERO, 2.0) {
            StepResult::Next(p) => assert!((p.length() - 2.0).abs() < 1e-6),
            StepResult::Degenerate => panic!("expected a step"),
        }
    }

    #[test]
    fn degenerate_field_stops_integration() {
        let field = TensorField::new(&TensorFieldParams::default());
        let noise = ZeroNoise;
        let integrator = Integrator::new(&field, &noise);
        assert!(matches!(
            integrator.rk4_step(Vector::ZERO, Parity::Major, Vector::ZERO, 1.0),
            StepResult::Degenerate
        ));
    }
}
