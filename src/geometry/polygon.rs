//! Polygon area, winding, and point-in-polygon tests.

use super::vector::Vector;

/// An ordered loop of vertices with no repeated first/last point.
/// Orientation is CCW for solid regions by convention.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vector>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vector>) -> Self {
        Self { vertices }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Signed area via the shoelace formula. Positive for CCW winding.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn perimeter(&self) -> f64 {
        perimeter(&self.vertices)
    }

    /// `area / perimeter^2`; near zero for slivers, near `1/(4*pi)` for a circle.
    pub fn shape_index(&self) -> f64 {
        let perim = self.perimeter();
        if perim < 1e-9 {
            0.0
        } else {
            self.area() / (perim * perim)
        }
    }

    pub fn centroid(&self) -> Vector {
        if self.vertices.is_empty() {
            return Vector::ZERO;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector::ZERO, |acc, &v| acc + v);
        sum * (1.0 / self.vertices.len() as f64)
    }

    /// Returns a copy with CCW winding, reversing if currently CW.
    pub fn to_ccw(&self) -> Polygon {
        if self.signed_area() < 0.0 {
            let mut v = self.vertices.clone();
            v.reverse();
            Polygon::new(v)
        } else {
            self.clone()
        }
    }

    pub fn contains(&self, p: Vector) -> bool {
        point_in_polygon(p, &self.vertices)
    }

    pub fn reversed(&self) -> Polygon {
        let mut v = self.vertices.clone();
        v.reverse();
        Polygon::new(v)
    }
}

pub fn signed_area(vertices: &[Vector]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub fn perimeter(vertices: &[Vector]) -> f64 {
    let n = vertices.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| vertices[i].distance(vertices[(i + 1) % n]))
        .sum()
}

/// Ray-casting point-in-polygon test. Boundary points are not guaranteed
/// either way (standard ray-cast ambiguity); callers needing boundary
/// inclusion should pad with an epsilon buffer first.
pub fn point_in_polygon(p: Vector, vertices: &[Vector]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];
        let intersects = (vi.y > p.y) != (vj.y > p.y)
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 0.0),
            Vector::new(10.0, 10.0),
            Vector::new(0.0, 10.0),
        ])
    }

    #[test]
    fn area_of_reversed_polygon_is_equal() {
        let p = square();
        let r = p.reversed();
        assert!((p.area() - r.area()).abs() < 1e-9);
        assert!(p.signed_area() > 0.0);
        assert!(r.signed_area() < 0.0);
    }

    #[test]
    fn square_area_is_side_squared() {
        assert!((square().area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn point_in_polygon_basic() {
        let sq = square();
        assert!(sq.contains(Vector::new(5.0, 5.0)));
        assert!(!sq.contains(Vector::new(15.0, 5.0)));
    }

    #[test]
    fn shape_index_of_square_is_reasonable() {
        // perimeter = 40, area = 100 -> 100/1600 = 0.0625
        assert!((square().shape_index() - 0.0625).abs() < 1e-9);
    }
}
