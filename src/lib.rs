//! Procedural 2D city map generator.
//!
//! Tensor-field road networks traced by streamline integration, planar
//! graph block extraction, recursive lot subdivision, and pseudo-3D
//! building projection, driven by a single [`Params`] document through a
//! [`Pipeline`].

pub mod error;
pub mod geometry;
pub mod params;
pub mod procgen;
pub mod rng;

pub use error::{GenError, Result};
pub use params::Params;
pub use procgen::{CityMap, Pipeline, StageId};
pub use rng::GenRng;
