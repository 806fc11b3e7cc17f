//! Straight-skeleton-approximation buffering (offset) of polylines and
//! polygons.
//!
//! The source relies on a full Minkowski-sum/clipping library (JSTS); per
//! the geometry-library design note this crate instead offsets each edge
//! along its outward normal and miters adjacent offset edges at their
//! intersection, which is sufficient for river banks and lot setbacks on
//! the mostly-convex polygons this pipeline produces.

use super::intersect::segment_intersection;
use super::vector::Vector;

/// Offset each side of a polyline outward by `distance`, returning the two
/// parallel polylines (in the same point order as the input).
pub fn offset_polyline(points: &[Vector], distance: f64) -> Option<(Vec<Vector>, Vec<Vector>)> {
    if points.len() < 2 {
        return None;
    }
    let mut left = Vec::with_capacity(points.len());
    let mut right = Vec::with_capacity(points.len());

    for i in 0..points.len() {
        let normal = segment_normal_at(points, i);
        left.push(points[i] + normal * distance);
        right.push(points[i] - normal * distance);
    }

    Some((left, right))
}

fn segment_normal_at(points: &[Vector], i: usize) -> Vector {
    let n = points.len();
    let dir = if i == 0 {
        points[1] - points[0]
    } else if i == n - 1 {
        points[n - 1] - points[n - 2]
    } else {
        points[i + 1] - points[i - 1]
    };
    -dir.normalize_or_zero().perp()
}

/// Shrink (negative `distance`) or grow (positive) a closed polygon by
/// moving each edge along its outward normal and re-intersecting adjacent
/// offset edges (miter join). Returns `None` ("BufferFailure" in the
/// pipeline's error policy) if the result collapses to fewer than 3
/// vertices or a miter intersection cannot be found (near-degenerate
/// corners), matching §7's `BufferFailure` handling.
pub fn offset_polygon(vertices: &[Vector], distance: f64) -> Option<Vec<Vector>> {
    let n = vertices.len();
    if n < 3 {
        return None;
    }

    // Offset edges: edge i runs vertices[i] -> vertices[i+1], pushed outward
    // along its normal by `distance`. `perp()` rotates a direction 90
    // degrees CCW, which for a CCW loop points into the interior, so the
    // outward normal is the negation of that.
    let mut offset_edges = Vec::with_capacity(n);
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let normal = -(b - a).normalize_or_zero().perp();
        offset_edges.push((a + normal * distance, b + normal * distance));
    }

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = offset_edges[(i + n - 1) % n];
        let cur = offset_edges[i];
        match line_line_intersection(prev.0, prev.1, cur.0, cur.1) {
            Some(p) => result.push(p),
            None => result.push(cur.0),
        }
    }

    if super::polygon::signed_area(&result).abs() < 1e-9 {
        return None;
    }
    if is_self_intersecting(&result) {
        return None;
    }
    Some(result)
}

/// Intersection of the infinite lines through `a1->a2` and `b1->b2`.
fn line_line_intersection(a1: Vector, a2: Vector, b1: Vector, b2: Vector) -> Option<Vector> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < 1e-12 {
        return None;
    }
    let d = b1 - a1;
    let t = (d.x * d2.y - d.y * d2.x) / cross;
    Some(a1 + d1 * t)
}

/// Coarse self-intersection check: true if any two non-adjacent edges cross.
fn is_self_intersecting(vertices: &[Vector]) -> bool {
    let n = vertices.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = vertices[i];
        let a2 = vertices[(i + 1) % n];
        for j in (i + 1)..n {
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b1 = vertices[j];
            let b2 = vertices[(j + 1) % n];
            if segment_intersection(a1, a2, b1, b2).is_some() {
                return true;
            }
        }
    }
    false
}

/// Maximum per-vertex displacement between two polygons of equal vertex
/// count, used as an approximation of Hausdorff distance in tests (this
/// crate does not carry a full Hausdorff-distance routine).
pub fn max_vertex_displacement(a: &[Vector], b: &[Vector]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| p.distance(*q))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Vector> {
        vec![
            Vector::new(0.0, 0.0),
            Vector::new(side, 0.0),
            Vector::new(side, side),
            Vector::new(0.0, side),
        ]
    }

    #[test]
    fn shrinking_square_reduces_area() {
        let sq = square(10.0);
        let shrunk = offset_polygon(&sq, -1.0).unwrap();
        let area = super::super::polygon::signed_area(&shrunk).abs();
        assert!(area < 100.0);
        assert!(area > 0.0);
    }

    #[test]
    fn grow_then_shrink_approximately_roundtrips() {
        let sq = square(10.0);
        let grown = offset_polygon(&sq, 2.0).unwrap();
        let back = offset_polygon(&grown, -2.0).unwrap();
        let disp = max_vertex_displacement(&sq, &back);
        assert!(disp <= 2.0 + 1e-6);
    }

    #[test]
    fn collapsing_shrink_fails_gracefully() {
        let sq = square(2.0);
        // Shrinking by more than half the side collapses the square.
        assert!(offset_polygon(&sq, -5.0).is_none() || offset_polygon(&sq, -5.0).unwrap().len() < 3);
    }
}
