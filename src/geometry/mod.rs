//! Computational-geometry primitives: vector arithmetic, polygon area and
//! winding, point-in-polygon, segment/polygon intersection, polyline
//! simplification, and polygon/polyline buffering.
//!
//! This module exists only because the source depended on two third-party
//! libraries (polygon slicing, JSTS buffering) that have no single
//! equivalent in the Rust ecosystem for this scale of problem; see
//! DESIGN.md for the tradeoff.

pub mod buffer;
pub mod intersect;
pub mod polygon;
pub mod simplify;
pub mod vector;

pub use buffer::{max_vertex_displacement, offset_polygon, offset_polyline};
pub use intersect::{segment_intersection, slice_polygon, slice_rect_by_polyline, Intersection};
pub use polygon::{point_in_polygon, Polygon};
pub use simplify::simplify as simplify_polyline;
pub use vector::{Rect, Vector};
