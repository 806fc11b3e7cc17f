//! Block/lot polygon extraction and subdivision (spec component I).
//!
//! Face extraction is grounded on the planar-graph structure of
//! [`super::graph::PlanarGraph`]; recursive subdivision and the OBB-free
//! longest-edge bisection are grounded on the teacher's
//! `procgen::parcels::subdivide_recursive`/`split_polygon`, generalized to
//! use the shared [`crate::geometry::slice_polygon`] cutter and to apply a
//! shape-index sliver filter the teacher's version left as a `TODO`.

use petgraph::graph::NodeIndex;
use tracing::warn;

use crate::error::{GenError, Result};
use crate::geometry::{offset_polygon, slice_polygon, Polygon, Vector};
use crate::params::BuildingParams;
use crate::rng::GenRng;

use super::graph::PlanarGraph;

const MAX_FACE_WALK_STEPS: usize = 4096;
const SHAPE_INDEX_MIN: f64 = 0.04;

/// Trace every face of the planar graph by always continuing on the
/// clockwise-next edge around the vertex just arrived at (standard planar
/// straight-line face traversal). Bounded faces come out CCW (positive
/// signed area); the unbounded outer face(s) come out CW and are dropped
/// by the caller.
pub fn extract_faces(graph: &PlanarGraph, min_area: f64) -> Result<Vec<Polygon>> {
    use std::collections::HashSet;

    let mut visited: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut faces = Vec::new();

    let all_half_edges: Vec<(NodeIndex, NodeIndex)> = graph
        .nodes()
        .flat_map(|(u, _)| graph.sorted_neighbors(u).into_iter().map(move |(v, _)| (u, v)))
        .collect();

    for &(start_u, start_v) in &all_half_edges {
        if visited.contains(&(start_u, start_v)) {
            continue;
        }

        let mut vertices = Vec::new();
        let mut u = start_u;
        let mut v = start_v;
        let mut steps = 0;

        loop {
            if visited.contains(&(u, v)) {
                return Err(GenError::GraphDegenerate);
            }
            visited.insert((u, v));
            vertices.push(graph.node_by_index(u).unwrap().position);

            let neighbors = graph.sorted_neighbors(v);
            if neighbors.is_empty() {
                return Err(GenError::GraphDegenerate);
            }
            let arrival_idx = neighbors.iter().position(|&(n, _)| n == u).ok_or(GenError::GraphDegenerate)?;
            let next_idx = (arrival_idx + neighbors.len() - 1) % neighbors.len();
            let (w, _) = neighbors[next_idx];

            u = v;
            v = w;
            steps += 1;
            if steps > MAX_FACE_WALK_STEPS {
                return Err(GenError::GraphDegenerate);
            }
            if (u, v) == (start_u, start_v) {
                break;
            }
        }

        if vertices.len() >= 3 {
            faces.push(Polygon::new(vertices));
        }
    }

    let kept: Vec<Polygon> = faces
        .into_iter()
        .filter(|f| f.signed_area() > 0.0 && f.area() >= min_area)
        .collect();

    Ok(kept)
}

fn longest_edge_index(vertices: &[Vector]) -> usize {
    let n = vertices.len();
    (0..n)
        .max_by(|&a, &b| {
            let la = vertices[a].distance(vertices[(a + 1) % n]);
            let lb = vertices[b].distance(vertices[(b + 1) % n]);
            la.partial_cmp(&lb).unwrap()
        })
        .unwrap_or(0)
}

/// Recursively bisects a block polygon into buildable lots by repeatedly
/// cutting perpendicular to its longest edge, at a randomized point near
/// its midpoint, until each piece is small enough (or too sliver-shaped) to
/// keep as-is.
pub fn subdivide(polygon: &Polygon, params: &BuildingParams, rng: &mut GenRng) -> Vec<Polygon> {
    let mut out = Vec::new();
    subdivide_recursive(polygon.clone(), params, rng, &mut out);
    out
}

fn subdivide_recursive(polygon: Polygon, params: &BuildingParams, rng: &mut GenRng, out: &mut Vec<Polygon>) {
    let area = polygon.area();
    if area < 0.5 * params.min_area {
        return;
    }
    if polygon.shape_index() < SHAPE_INDEX_MIN {
        return;
    }
    if area < 2.0 * params.min_area || rng.gen_bool(params.chance_no_divide) {
        out.push(polygon);
        return;
    }

    let n = polygon.vertices.len();
    let idx = longest_edge_index(&polygon.vertices);
    let a = polygon.vertices[idx];
    let b = polygon.vertices[(idx + 1) % n];
    let t = rng.gen_range_f64(0.4..0.6);
    let origin = a.lerp(b, t);
    let dir = (b - a).perp();

    match slice_polygon(&polygon.vertices, origin, dir) {
        Some((left, right)) => {
            subdivide_recursive(Polygon::new(left), params, rng, out);
            subdivide_recursive(Polygon::new(right), params, rng, out);
        }
        None => out.push(polygon),
    }
}

/// Shrinks each lot inward by `shrink_spacing` to carve out a street
/// setback. Lots whose buffer collapses (`BufferFailure`) are dropped with
/// a warning rather than failing the whole batch, matching the non-fatal
/// per-lot policy in spec §7.
pub fn apply_setback(lots: &[Polygon], shrink_spacing: f64) -> Vec<Polygon> {
    lots.iter()
        .filter_map(|lot| match offset_polygon(&lot.vertices, -shrink_spacing) {
            Some(shrunk) if shrunk.len() >= 3 => Some(Polygon::new(shrunk)),
            _ => {
                warn!(area = lot.area(), "lot setback buffer failed, dropping lot");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::graph::build_planar_graph;

    #[test]
    fn single_square_face_is_extracted() {
        let square = vec![
            vec![Vector::new(0.0, 0.0), Vector::new(10.0, 0.0)],
            vec![Vector::new(10.0, 0.0), Vector::new(10.0, 10.0)],
            vec![Vector::new(10.0, 10.0), Vector::new(0.0, 10.0)],
            vec![Vector::new(0.0, 10.0), Vector::new(0.0, 0.0)],
        ];
        let graph = build_planar_graph(&square, 1e-3).unwrap();
        let faces = extract_faces(&graph, 1.0).unwrap();
        assert_eq!(faces.len(), 1);
        assert!((faces[0].area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn subdivide_respects_min_area_floor() {
        let polygon = Polygon::new(vec![
            Vector::new(0.0, 0.0),
            Vector::new(100.0, 0.0),
            Vector::new(100.0, 100.0),
            Vector::new(0.0, 100.0),
        ]);
        let params = BuildingParams { min_area: 400.0, chance_no_divide: 0.0, ..BuildingParams::default() };
        let mut rng = GenRng::from_seed(5);
        let lots = subdivide(&polygon, &params, &mut rng);
        assert!(!lots.is_empty());
        for lot in &lots {
            assert!(lot.area() >= 0.5 * params.min_area - 1e-6);
        }
    }

    #[test]
    fn setback_shrinks_lot_area() {
        let lots = vec![Polygon::new(vec![
            Vector::new(0.0, 0.0),
            Vector::new(20.0, 0.0),
            Vector::new(20.0, 20.0),
            Vector::new(0.0, 20.0),
        ])];
        let shrunk = apply_setback(&lots, 1.0);
        assert_eq!(shrunk.len(), 1);
        assert!(shrunk[0].area() < lots[0].area());
    }
}
