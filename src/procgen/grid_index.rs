//! Uniform-grid spatial hash over streamline sample points, for O(1+k)
//! proximity queries during tracing.

use std::collections::HashMap;

use crate::geometry::Vector;

type CellKey = (i64, i64);

/// A reference into a streamline's dense sample buffer.
#[derive(Clone, Copy, Debug)]
pub struct SampleRef {
    pub streamline_id: usize,
    pub sample_index: usize,
}

pub struct GridIndex {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<(Vector, SampleRef)>>,
}

impl GridIndex {
    /// `cell_size` should equal `dsep`, guaranteeing a 3x3 neighbourhood
    /// search is complete for radius queries up to `dsep`.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn cell_key(&self, p: Vector) -> CellKey {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, p: Vector, sample: SampleRef) {
        let key = self.cell_key(p);
        self.cells.entry(key).or_default().push((p, sample));
    }

    /// Insert every sample of a polyline (not just endpoints) — spacing
    /// between samples is guaranteed `<= dstep << dsep`, so sampling alone
    /// is a sufficient proxy for the segments themselves.
    pub fn add_polyline(&mut self, streamline_id: usize, points: &[Vector]) {
        for (i, &p) in points.iter().enumerate() {
            self.insert(p, SampleRef { streamline_id, sample_index: i });
        }
    }

    /// Minimum distance from `p` to any indexed sample, searching the 3x3
    /// cell neighbourhood around `p`'s cell.
    pub fn nearest_distance(&self, p: Vector) -> f64 {
        let (cx, cy) = self.cell_key(p);
        let mut best = f64::INFINITY;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(points) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &(q, _) in points {
                        let d = p.distance(q);
                        if d < best {
                            best = d;
                        }
                    }
                }
            }
        }
        best
    }

    /// The nearest sample itself, if the 3x3 neighbourhood is non-empty.
    pub fn nearest_sample(&self, p: Vector) -> Option<(Vector, SampleRef)> {
        let (cx, cy) = self.cell_key(p);
        let mut best: Option<(f64, Vector, SampleRef)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(points) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &(q, sample) in points {
                        let d = p.distance(q);
                        if best.is_none() || d < best.unwrap().0 {
                            best = Some((d, q, sample));
                        }
                    }
                }
            }
        }
        best.map(|(_, q, s)| (q, s))
    }

    pub fn ok_for_radius(&self, p: Vector, radius: f64) -> bool {
        self.nearest_distance(p) >= radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_has_infinite_nearest_distance() {
        let idx = GridIndex::new(10.0);
        assert!(idx.nearest_distance(Vector::ZERO).is_infinite());
    }

    #[test]
    fn nearest_distance_finds_point_in_neighbour_cell() {
        let mut idx = GridIndex::new(10.0);
        idx.insert(Vector::new(15.0, 0.0), SampleRef { streamline_id: 0, sample_index: 0 });
        let d = idx.nearest_distance(Vector::new(9.9, 0.0));
        assert!((d - 5.1).abs() < 1e-6);
    }

    #[test]
    fn ok_for_radius_respects_dtest() {
        let mut idx = GridIndex::new(50.0);
        idx.insert(Vector::ZERO, SampleRef { streamline_id: 0, sample_index: 0 });
        assert!(!idx.ok_for_radius(Vector::new(1.0, 0.0), 5.0));
        assert!(idx.ok_for_radius(Vector::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn clear_drops_all_samples() {
        let mut idx = GridIndex::new(10.0);
        idx.insert(Vector::ZERO, SampleRef { streamline_id: 0, sample_index: 0 });
        idx.clear();
        assert!(idx.nearest_distance(Vector::ZERO).is_infinite());
    }
}
