//! Procedural generation: tensor-field road networks, streamline tracing,
//! water bodies, planar-graph block/lot extraction, and pseudo-3D building
//! projection.

pub mod buildings;
pub mod graph;
pub mod grid_index;
pub mod integrator;
pub mod pipeline;
pub mod polygons;
pub mod streamline;
pub mod tensor;
pub mod water;

pub use buildings::{Building, ProjectedBuilding, ViewState};
pub use pipeline::{CityMap, Pipeline, StageId};
pub use tensor::{NoiseSource, Parity, PerlinNoise, TensorField};
