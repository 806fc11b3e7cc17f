//! Streamline tracer: grows, separates, joins, and simplifies streamlines
//! through the tensor field under the dsep/dtest/dstep/dlookahead/
//! dcirclejoin/joinangle constraints.
//!
//! The tracer is single-threaded cooperative: [`StreamlineGenerator::step`]
//! performs bounded work and returns whether more remains, so a host can
//! interleave redraws between calls. [`generate_class`] drives it to
//! completion for non-interactive callers.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::geometry::{simplify_polyline, Rect, Vector};
use crate::params::StreamlineParams;
use crate::rng::GenRng;

use super::grid_index::GridIndex;
use super::integrator::{Integrator, StepResult};
use super::tensor::{NoiseSource, Parity, TensorField};

/// A completed streamline: the dense (collision) form and the
/// RDP-simplified (rendering/graph) form.
#[derive(Clone, Debug)]
pub struct Streamline {
    pub parity: Parity,
    pub dense: Vec<Vector>,
    pub simplified: Vec<Vector>,
}

impl Streamline {
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

enum HalfState {
    Growing { pos: Vector, prev_dir: Vector, points: Vec<Vector>, iterations: u32 },
    Done { points: Vec<Vector> },
}

struct Growth {
    seed: Vector,
    parity: Parity,
    fwd: HalfState,
    bwd: HalfState,
}

enum Phase {
    Seeding,
    Growing(Growth),
}

/// Grows a single road/water class's streamlines (one of main, major,
/// minor, coastline, river) against a shared pair of per-parity grids.
pub struct StreamlineGenerator<'a> {
    field: &'a TensorField,
    noise: &'a dyn NoiseSource,
    params: StreamlineParams,
    world: Rect,
    major_grid: GridIndex,
    minor_grid: GridIndex,
    streamlines: Vec<Streamline>,
    next_parity: Parity,
    consecutive_failures: u32,
    seed_exhausted: bool,
    done: bool,
    phase: Phase,
}

impl<'a> StreamlineGenerator<'a> {
    pub fn new(field: &'a TensorField, noise: &'a dyn NoiseSource, params: StreamlineParams, world: Rect) -> Self {
        Self {
            field,
            noise,
            params,
            world,
            major_grid: GridIndex::new(params.dsep),
            minor_grid: GridIndex::new(params.dsep),
            streamlines: Vec::new(),
            next_parity: Parity::Major,
            consecutive_failures: 0,
            seed_exhausted: false,
            done: false,
            phase: Phase::Seeding,
        }
    }

    /// Seed this generator's grids with samples from an earlier stage's
    /// streamlines, so this class never crosses them within `dtest`.
    pub fn seed_from(&mut self, polylines: &[Vec<Vector>]) {
        for (id, line) in polylines.iter().enumerate() {
            self.major_grid.add_polyline(id, line);
            self.minor_grid.add_polyline(id, line);
        }
    }

    pub fn streamlines(&self) -> &[Streamline] {
        &self.streamlines
    }

    pub fn into_streamlines(self) -> Vec<Streamline> {
        self.streamlines
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn seed_exhausted(&self) -> bool {
        self.seed_exhausted
    }

    pub fn wants_seed(&self) -> bool {
        matches!(self.phase, Phase::Seeding) && !self.done
    }

    pub fn world(&self) -> Rect {
        self.world
    }

    fn grid_for(&mut self, parity: Parity) -> &mut GridIndex {
        match parity {
            Parity::Major => &mut self.major_grid,
            Parity::Minor => &mut self.minor_grid,
        }
    }

    fn grid_for_ref(&self, parity: Parity) -> &GridIndex {
        match parity {
            Parity::Major => &self.major_grid,
            Parity::Minor => &self.minor_grid,
        }
    }

    fn ok_for_dsep(&self, p: Vector) -> bool {
        self.world.contains(p)
            && self.major_grid.ok_for_radius(p, self.params.dsep)
            && self.minor_grid.ok_for_radius(p, self.params.dsep)
    }

    /// Drive generation to completion in one call (non-interactive hosts).
    pub fn run(&mut self) {
        while self.step(u32::MAX) {}
    }

    /// Perform bounded work; returns `true` if more work remains.
    pub fn step(&mut self, budget_ms: u32) -> bool {
        let deadline = Instant::now() + Duration::from_millis(budget_ms as u64);
        loop {
            if self.done {
                return false;
            }
            if Instant::now() >= deadline {
                return true;
            }
            if self.wants_seed() {
                // Seeding needs a candidate drawn by the caller's RNG;
                // report pending work rather than spin.
                return true;
            }
            let growth = match std::mem::replace(&mut self.phase, Phase::Seeding) {
                Phase::Growing(g) => g,
                Phase::Seeding => return true,
            };
            self.advance_growth(growth);
        }
    }

    /// Supplies a candidate seed point (drawn by the caller's RNG) for the
    /// next attempt. Returns `true` if the seed was accepted and growth
    /// started, `false` if it failed the separation test (caller should
    /// draw another candidate).
    pub fn offer_seed(&mut self, candidate: Vector) -> bool {
        if self.done {
            return false;
        }
        if self.consecutive_failures >= self.params.seed_tries {
            warn!(tries = self.params.seed_tries, "seed rejection sampling exhausted");
            self.seed_exhausted = true;
            self.done = true;
            return false;
        }
        if !self.ok_for_dsep(candidate) {
            self.consecutive_failures += 1;
            return false;
        }
        self.consecutive_failures = 0;
        let parity = self.next_parity;
        self.next_parity = self.next_parity.opposite();

        let integrator = Integrator::new(self.field, self.noise);
        let initial_dir = integrator.initial_direction(candidate, parity).unwrap_or(Vector::ZERO);

        self.phase = Phase::Growing(Growth {
            seed: candidate,
            parity,
            fwd: HalfState::Growing { pos: candidate, prev_dir: initial_dir, points: Vec::new(), iterations: 0 },
            bwd: HalfState::Growing { pos: candidate, prev_dir: -initial_dir, points: Vec::new(), iterations: 0 },
        });
        true
    }

    fn advance_growth(&mut self, mut growth: Growth) {
        let integrator = Integrator::new(self.field, self.noise);

        self.step_half(&integrator, &mut growth.fwd, growth.parity, 1.0);
        self.step_half(&integrator, &mut growth.bwd, growth.parity, -1.0);

        let fwd_done = matches!(growth.fwd, HalfState::Done { .. });
        let bwd_done = matches!(growth.bwd, HalfState::Done { .. });

        if fwd_done && bwd_done {
            self.finish_growth(growth);
        } else {
            self.phase = Phase::Growing(growth);
        }
    }

    fn step_half(&self, integrator: &Integrator, half: &mut HalfState, parity: Parity, sign: f64) {
        let HalfState::Growing { pos, prev_dir, points, iterations } = half else {
            return;
        };

        if *iterations >= self.params.path_iterations {
            *half = HalfState::Done { points: std::mem::take(points) };
            return;
        }

        let step_len = self.params.dstep * sign;
        let new_pos = match integrator.rk4_step(*pos, parity, *prev_dir, step_len) {
            StepResult::Next(p) => p,
            StepResult::Degenerate => {
                *half = HalfState::Done { points: std::mem::take(points) };
                return;
            }
        };

        if !self.world.contains(new_pos) {
            *half = HalfState::Done { points: std::mem::take(points) };
            return;
        }

        let grid = self.grid_for_ref(parity);
        let dist = grid.nearest_distance(new_pos);
        let dir = (new_pos - *pos).normalize_or_zero();

        if dist < self.params.dtest {
            // Candidate fails separation. Check the join condition before
            // giving up: close enough and tangent enough to an existing
            // sample closes the streamline there instead of discarding it.
            if let Some((nearest_point, _)) = grid.nearest_sample(new_pos) {
                let to_nearest = (nearest_point - *pos).normalize_or_zero();
                let angle = angle_between(dir, to_nearest);
                if new_pos.distance(nearest_point) <= self.params.dcirclejoin && angle <= self.params.joinangle {
                    points.push(nearest_point);
                    *half = HalfState::Done { points: std::mem::take(points) };
                    return;
                }
            }

            let lookahead = self.params.dlookahead * self.params.collide_early;
            if dist >= lookahead && lookahead > 0.0 {
                *pos = new_pos;
                *prev_dir = dir;
                points.push(new_pos);
                *iterations += 1;
                return;
            }

            *half = HalfState::Done { points: std::mem::take(points) };
            return;
        }

        *pos = new_pos;
        *prev_dir = dir;
        points.push(new_pos);
        *iterations += 1;
    }

    fn finish_growth(&mut self, growth: Growth) {
        let HalfState::Done { points: mut fwd } = growth.fwd else { unreachable!() };
        let HalfState::Done { points: bwd } = growth.bwd else { unreachable!() };

        let mut dense = Vec::with_capacity(fwd.len() + bwd.len() + 1);
        dense.extend(bwd.into_iter().rev());
        dense.push(growth.seed);
        dense.append(&mut fwd);

        if dense.len() < 5 {
            debug!(len = dense.len(), "rejecting streamline shorter than 5 samples");
            self.phase = Phase::Seeding;
            return;
        }

        let simplified = simplify_polyline(&dense, self.params.simplify_tolerance);
        let streamline_id = self.streamlines.len();
        self.grid_for(growth.parity).add_polyline(streamline_id, &dense);
        self.streamlines.push(Streamline { parity: growth.parity, dense, simplified });
        self.phase = Phase::Seeding;
    }
}

fn angle_between(a: Vector, b: Vector) -> f64 {
    if a.length_squared() < 1e-12 || b.length_squared() < 1e-12 {
        return 0.0;
    }
    let cos_theta = (a.dot(b) / (a.length() * b.length())).clamp(-1.0, 1.0);
    cos_theta.acos()
}

/// Runs seed rejection sampling plus streamline growth for a complete road
/// class to completion, using the pipeline's shared RNG. This is the entry
/// point the pipeline driver calls for `main`/`major`/`minor` generation,
/// and for the coastline/river traces in `water.rs`.
pub fn generate_class<'a>(
    field: &'a TensorField,
    noise: &'a dyn NoiseSource,
    params: StreamlineParams,
    world: Rect,
    rng: &mut GenRng,
    seed_from: &[Vec<Vector>],
) -> StreamlineGenerator<'a> {
    let mut gen = StreamlineGenerator::new(field, noise, params, world);
    gen.seed_from(seed_from);

    while !gen.is_done() {
        if gen.wants_seed() {
            let candidate = rng.gen_point(gen.world().min, gen.world().max);
            gen.offer_seed(candidate);
        } else {
            gen.step(u32::MAX);
        }
    }

    debug!(count = gen.streamlines().len(), "streamline class generated");
    gen
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

    fn grid_field() -> TensorField {
        let mut field = TensorField::new(&TensorFieldParams::default());
        field.add_basis_field(BasisField::Grid { centre: Vector::ZERO, size: 2000.0, decay: 0.0, theta: 0.0 });
        field
    }

    #[test]
    fn generates_at_least_one_streamline_in_open_field() {
        let field = grid_field();
        let noise = ZeroNoise;
        let world = Rect::new(Vector::new(-500.0, -500.0), Vector::new(500.0, 500.0));
        let mut rng = GenRng::from_seed(1);
        let params = StreamlineParams { dsep: 50.0, dtest: 25.0, dstep: 2.0, path_iterations: 200, seed_tries: 200, ..StreamlineParams::default() };
        let gen = generate_class(&field, &noise, params, world, &mut rng, &[]);
        assert!(!gen.streamlines().is_empty());
    }

    #[test]
    fn committed_samples_respect_dtest() {
        let field = grid_field();
        let noise = ZeroNoise;
        let world = Rect::new(Vector::new(-500.0, -500.0), Vector::new(500.0, 500.0));
        let mut rng = GenRng::from_seed(7);
        let params = StreamlineParams { dsep: 50.0, dtest: 25.0, dstep: 2.0, path_iterations: 200, seed_tries: 300, ..StreamlineParams::default() };
        let gen = generate_class(&field, &noise, params, world, &mut rng, &[]);

        let same_parity: Vec<&Streamline> = gen.streamlines().iter().filter(|s| s.parity == Parity::Major).collect();
        for i in 0..same_parity.len() {
            for j in (i + 1)..same_parity.len() {
                for &p in &same_parity[i].dense {
                    for &q in &same_parity[j].dense {
                        assert!(p.distance(q) >= params.dtest - 1e-6, "points closer than dtest");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_field_yields_no_streamlines() {
        let field = TensorField::new(&TensorFieldParams::default());
        let noise = ZeroNoise;
        let world = Rect::new(Vector::new(-100.0, -100.0), Vector::new(100.0, 100.0));
        let mut rng = GenRng::from_seed(3);
        let params = StreamlineParams { seed_tries: 20, ..StreamlineParams::default() };
        let gen = generate_class(&field, &noise, params, world, &mut rng, &[]);
        assert!(gen.streamlines().is_empty());
        assert!(gen.seed_exhausted());
    }
}
