//! Coastline and river generation (spec components G): single streamlines
//! traced across the whole world rectangle, then turned into masking
//! polygons the tensor field and later road classes query against.
//!
//! Grounded on the teacher's `procgen::river` for the "trace a water body as
//! a path through the world, then buffer its banks" shape, generalized here
//! to trace through the tensor field itself (opposite-parity streamline)
//! rather than the teacher's bespoke Perlin meander.

use tracing::{debug, warn};

use crate::error::{GenError, Result};
use crate::geometry::{offset_polyline, slice_rect_by_polyline, Polygon, Rect, Vector};
use crate::params::{StreamlineParams, WaterParams};
use crate::rng::GenRng;

use super::integrator::{Integrator, StepResult};
use super::tensor::{NoiseSource, Parity, TensorField};

const MAX_ATTEMPTS: u32 = 100;
const EDGE_TOLERANCE_STEPS: f64 = 2.0;
const EXTENSION_STEPS: f64 = 5.0;

/// Grows a single bidirectional streamline from `seed` until it leaves
/// `world` on both ends, with no separation constraint against other
/// streamlines (coastline/river are traced before any road class).
fn grow_unconstrained(field: &TensorField, noise: &dyn NoiseSource, world: Rect, seed: Vector, parity: Parity, dstep: f64, max_iterations: u32) -> Option<Vec<Vector>> {
    let integrator = Integrator::new(field, noise);
    let initial_dir = integrator.initial_direction(seed, parity)?;

    let mut fwd = Vec::new();
    let mut pos = seed;
    let mut dir = initial_dir;
    for _ in 0..max_iterations {
        match integrator.rk4_step(pos, parity, dir, dstep) {
            StepResult::Next(p) => {
                if !world.contains(p) {
                    break;
                }
                dir = (p - pos).normalize_or_zero();
                pos = p;
                fwd.push(p);
            }
            StepResult::Degenerate => break,
        }
    }

    let mut bwd = Vec::new();
    let mut pos = seed;
    let mut dir = -initial_dir;
    for _ in 0..max_iterations {
        match integrator.rk4_step(pos, parity, dir, dstep) {
            StepResult::Next(p) => {
                if !world.contains(p) {
                    break;
                }
                dir = (p - pos).normalize_or_zero();
                pos = p;
                bwd.push(p);
            }
            StepResult::Degenerate => break,
        }
    }

    if !near_boundary(world, *fwd.last()?, dstep * EDGE_TOLERANCE_STEPS) {
        return None;
    }
    if !near_boundary(world, *bwd.last()?, dstep * EDGE_TOLERANCE_STEPS) {
        return None;
    }

    let mut dense = Vec::with_capacity(fwd.len() + bwd.len() + 1);
    dense.extend(bwd.into_iter().rev());
    dense.push(seed);
    dense.append(&mut fwd);

    // Extend both ends a little past the rect boundary along their local
    // tangent, so the slice against the rectangle always finds a clean hit
    // even when the last recorded sample landed just inside it.
    extend_past_boundary(&mut dense, dstep * EXTENSION_STEPS);
    Some(dense)
}

fn near_boundary(world: Rect, p: Vector, tol: f64) -> bool {
    p.x <= world.min.x + tol
        || p.x >= world.max.x - tol
        || p.y <= world.min.y + tol
        || p.y >= world.max.y - tol
}

fn extend_past_boundary(points: &mut Vec<Vector>, extension: f64) {
    if points.len() < 2 {
        return;
    }
    let n = points.len();
    let start_tangent = (points[0] - points[1]).normalize_or_zero();
    let end_tangent = (points[n - 1] - points[n - 2]).normalize_or_zero();
    points.insert(0, points[0] + start_tangent * extension);
    points.push(points[n] + end_tangent * extension);
}

/// Coastline: a land/sea split of the world rectangle, returned as the sea
/// polygon (the smaller of the two regions the trace cuts the rect into)
/// plus the raw coastline polyline for rendering.
pub struct Coastline {
    pub sea: Polygon,
    pub polyline: Vec<Vector>,
}

pub fn generate_coastline(field: &TensorField, noise: &dyn NoiseSource, world: Rect, base: StreamlineParams, rng: &mut GenRng) -> Result<Coastline> {
    for attempt in 0..MAX_ATTEMPTS {
        let seed = rng.gen_point(world.min, world.max);
        let Some(polyline) = grow_unconstrained(field, noise, world, seed, Parity::Major, base.dstep, base.path_iterations) else {
            continue;
        };
        let corners = world.corners();
        let Some(sea_region) = slice_rect_by_polyline(&corners, &polyline) else {
            continue;
        };
        debug!(attempt, "coastline found");
        return Ok(Coastline { sea: Polygon::new(sea_region), polyline });
    }
    warn!(attempts = MAX_ATTEMPTS, "no coastline streamline reached both world edges");
    Err(GenError::CoastNotFound { attempts: MAX_ATTEMPTS })
}

/// River: an opposite-parity streamline traced with the sea mask already in
/// place (so it never crosses onto land on the wrong side of the coast) and
/// `ignore_river` set so the river's own mask does not yet block its trace.
/// Returns the river polygon (outer bank at `river_size`) and the two bank
/// ribbons (`river_size` down to `river_size - river_bank_size`) split by
/// which side of the centreline they fall on.
pub struct River {
    pub centreline: Vec<Vector>,
    pub river_polygon: Polygon,
    pub left_bank: Polygon,
    pub right_bank: Polygon,
}

pub fn generate_river(field: &mut TensorField, noise: &dyn NoiseSource, world: Rect, base: StreamlineParams, water: WaterParams, rng: &mut GenRng, coastline_parity: Parity) -> Result<River> {
    field.ignore_river = true;
    let river_parity = coastline_parity.opposite();

    let result = (0..MAX_ATTEMPTS).find_map(|attempt| {
        let seed = rng.gen_point(world.min, world.max);
        if field.inside_sea(seed) {
            return None;
        }
        let polyline = grow_unconstrained(field, noise, world, seed, river_parity, base.dstep, base.path_iterations)?;
        debug!(attempt, "river centreline found");
        Some(polyline)
    });

    let Some(centreline) = result else {
        field.ignore_river = false;
        warn!(attempts = MAX_ATTEMPTS, "no river streamline reached both world edges");
        return Err(GenError::RiverNotFound { attempts: MAX_ATTEMPTS });
    };

    let Some((outer_left, outer_right)) = offset_polyline(&centreline, water.river_size) else {
        field.ignore_river = false;
        return Err(GenError::BufferFailure);
    };
    let Some((inner_left, inner_right)) = offset_polyline(&centreline, water.river_size - water.river_bank_size) else {
        field.ignore_river = false;
        return Err(GenError::BufferFailure);
    };

    let mut river_vertices = outer_left.clone();
    river_vertices.extend(outer_right.iter().rev());
    let river_polygon = Polygon::new(river_vertices);

    let mut left_vertices = outer_left;
    left_vertices.extend(inner_left.into_iter().rev());
    let left_bank = Polygon::new(left_vertices);

    let mut right_vertices = outer_right;
    right_vertices.extend(inner_right.into_iter().rev());
    let right_bank = Polygon::new(right_vertices);

    field.river = centreline.clone();
    field.river_polygon = river_polygon.clone();
    field.ignore_river = false;

    Ok(River { centreline, river_polygon, left_bank, right_bank })
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
    fn coastline_splits_world_into_two_regions() {
        let field = grid_field();
        let noise = ZeroNoise;
        let world = Rect::new(Vector::new(-500.0, -500.0), Vector::new(500.0, 500.0));
        let mut rng = GenRng::from_seed(11);
        let base = StreamlineParams { dstep: 4.0, path_iterations: 400, ..StreamlineParams::default() };
        let coastline = generate_coastline(&field, &noise, world, base, &mut rng).unwrap();
        assert!(coastline.sea.area() > 0.0);
        assert!(coastline.sea.area() < world.area());
    }

    #[test]
    fn river_banks_are_disjoint_from_centreline_crossing() {
        let mut field = grid_field();
        let noise = ZeroNoise;
        let world = Rect::new(Vector::new(-500.0, -500.0), Vector::new(500.0, 500.0));
        let mut rng = GenRng::from_seed(12);
        let base = StreamlineParams { dstep: 4.0, path_iterations: 400, ..StreamlineParams::default() };
        let water = WaterParams::default();
        let river = generate_river(&mut field, &noise, world, base, water, &mut rng, Parity::Major).unwrap();
        assert!(river.river_polygon.area() > 0.0);
        assert!(river.left_bank.area() > 0.0);
        assert!(river.right_bank.area() > 0.0);
    }
}
