//! Segment intersection and polygon slicing.
//!
//! Grounded on the same parametric-line technique the teacher crate uses in
//! `procgen::river::segment_intersection`, generalized to also report the
//! two interpolation parameters so callers can splice intersections into a
//! polyline in order.

use super::vector::Vector;

/// A proper intersection between two segments, with the parametric position
/// along each.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub point: Vector,
    pub t: f64,
    pub u: f64,
}

/// Intersection of segment `a1..a2` with segment `b1..b2`, if the segments
/// cross strictly within both ranges `[0, 1]`.
pub fn segment_intersection(a1: Vector, a2: Vector, b1: Vector, b2: Vector) -> Option<Intersection> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < 1e-12 {
        return None;
    }

    let d = b1 - a1;
    let t = (d.x * d2.y - d.y * d2.x) / cross;
    let u = (d.x * d1.y - d.y * d1.x) / cross;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Intersection {
            point: a1 + d1 * t,
            t,
            u,
        })
    } else {
        None
    }
}

/// Intersect an infinite line (through `origin`, direction `dir`) against a
/// closed polygon edge loop, returning every crossing sorted by the
/// parameter along the line. Used to slice a polygon by a cut line.
fn line_polygon_intersections(origin: Vector, dir: Vector, vertices: &[Vector]) -> Vec<(f64, usize, Vector)> {
    let n = vertices.len();
    let far = dir * 1.0e7;
    let line_a = origin - far;
    let line_b = origin + far;

    let mut hits = Vec::new();
    for i in 0..n {
        let v1 = vertices[i];
        let v2 = vertices[(i + 1) % n];
        if let Some(hit) = segment_intersection(line_a, line_b, v1, v2) {
            let along = (hit.point - origin).dot(dir);
            hits.push((along, i, hit.point));
        }
    }
    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    hits
}

/// Split a convex-ish simple polygon into two polygons by the infinite line
/// through `origin` with direction `dir`. Returns `None` if the line does
/// not cross the polygon in exactly two places (degenerate cut).
pub fn slice_polygon(vertices: &[Vector], origin: Vector, dir: Vector) -> Option<(Vec<Vector>, Vec<Vector>)> {
    let dir = dir.normalize_or_zero();
    if dir.length_squared() < 1e-12 || vertices.len() < 3 {
        return None;
    }
    let normal = dir.perp();
    let hits = line_polygon_intersections(origin, dir, vertices);
    if hits.len() < 2 {
        return None;
    }
    let (_, edge_a, point_a) = hits[0];
    let (_, edge_b, point_b) = hits[hits.len() - 1];
    if edge_a == edge_b {
        return None;
    }

    let n = vertices.len();
    let mut left = Vec::new();
    let mut right = Vec::new();

    for i in 0..n {
        let v = vertices[i];
        let side = (v - origin).dot(normal);
        if side >= 0.0 {
            left.push(v);
        } else {
            right.push(v);
        }
        if i == edge_a {
            left.push(point_a);
            right.push(point_a);
        }
        if i == edge_b {
            left.push(point_b);
            right.push(point_b);
        }
    }

    if left.len() < 3 || right.len() < 3 {
        return None;
    }
    Some((left, right))
}

/// Slice an axis-aligned world rectangle by a (possibly open) polyline that
/// crosses it, returning the smaller of the two resulting regions. Used by
/// the coastline generator: the polyline is first extended to guarantee
/// clean edge hits, then treated as a cut through the rectangle boundary.
pub fn slice_rect_by_polyline(rect_corners: &[Vector; 4], polyline: &[Vector]) -> Option<Vec<Vector>> {
    if polyline.len() < 2 {
        return None;
    }
    // Build the cut loop: walk the rectangle boundary from the line's first
    // rectangle-edge hit to its last, inserting the polyline itself as one
    // side of the loop.
    let start = *polyline.first().unwrap();
    let end = *polyline.last().unwrap();

    let start_edge = point_rect_edge(rect_corners, start)?;
    let end_edge = point_rect_edge(rect_corners, end)?;

    // Walk rectangle corners from start_edge+1 up to end_edge (inclusive),
    // then append the reversed polyline to close the loop back to start.
    let mut loop_a = vec![start];
    let mut idx = (start_edge + 1) % 4;
    loop {
        loop_a.push(rect_corners[idx]);
        if idx == end_edge {
            break;
        }
        idx = (idx + 1) % 4;
    }
    loop_a.push(end);
    let mut reversed_line = polyline.to_vec();
    reversed_line.reverse();
    loop_a.extend(reversed_line.into_iter().skip(1));

    // The complementary region walks the other way around the rectangle.
    let mut loop_b = vec![start];
    let mut idx = start_edge;
    loop {
        if idx == end_edge {
            break;
        }
        loop_b.push(rect_corners[idx]);
        idx = (idx + 3) % 4;
    }
    loop_b.push(end);
    loop_b.extend(polyline.iter().rev().skip(1).cloned());

    let area_a = signed_area_abs(&loop_a);
    let area_b = signed_area_abs(&loop_b);
    Some(if area_a <= area_b { loop_a } else { loop_b })
}

fn signed_area_abs(vertices: &[Vector]) -> f64 {
    super::polygon::signed_area(vertices).abs()
}

/// Classify which rectangle edge (0=bottom,1=right,2=top,3=left) a point
/// closest to the boundary belongs to.
fn point_rect_edge(corners: &[Vector; 4], p: Vector) -> Option<usize> {
    let edges = [(corners[0], corners[1]), (corners[1], corners[2]), (corners[2], corners[3]), (corners[3], corners[0])];
    let mut best: Option<(usize, f64)> = None;
    for (i, (a, b)) in edges.iter().enumerate() {
        let d = point_segment_distance(p, *a, *b);
        if best.is_none() || d < best.unwrap().1 {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

fn point_segment_distance(p: Vector, a: Vector, b: Vector) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_cross_at_midpoint() {
        let hit = segment_intersection(
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 10.0),
            Vector::new(0.0, 10.0),
            Vector::new(10.0, 0.0),
        )
        .unwrap();
        assert!((hit.point.x - 5.0).abs() < 1e-9);
        assert!((hit.point.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(segment_intersection(
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 0.0),
            Vector::new(0.0, 1.0),
            Vector::new(10.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn slice_square_through_center() {
        let square = vec![
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 0.0),
            Vector::new(10.0, 10.0),
            Vector::new(0.0, 10.0),
        ];
        let (left, right) = slice_polygon(&square, Vector::new(5.0, 5.0), Vector::new(0.0, 1.0)).unwrap();
        let total = signed_area_abs(&left) + signed_area_abs(&right);
        assert!((total - 100.0).abs() < 1e-6);
    }
}
