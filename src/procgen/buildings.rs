//! Pseudo-3D building projection (spec component J).
//!
//! No single teacher module covers this; grounded on the teacher's
//! `OptionsParams`-style camera/orthographic toggle (kept verbatim in
//! [`crate::params::OptionsParams`]) generalized into an explicit
//! `ViewState` that both projection modes read from, instead of the
//! teacher's Bevy `Camera2d`/`Transform` components.

use crate::geometry::{Polygon, Vector};
use crate::params::{BuildingParams, OptionsParams};
use crate::rng::GenRng;

/// Everything building projection needs to know about how the map is framed.
#[derive(Clone, Copy, Debug)]
pub struct ViewState {
    pub origin: Vector,
    pub zoom: f64,
    pub world_dimensions: Vector,
    pub camera: Vector,
    pub orthographic: bool,
}

impl ViewState {
    pub fn from_options(options: &OptionsParams, origin: Vector, zoom: f64, world_dimensions: Vector) -> Self {
        Self {
            origin,
            zoom,
            world_dimensions,
            camera: Vector::new(options.camera_x, options.camera_y),
            orthographic: options.orthographic,
        }
    }

    pub fn world_to_screen(&self, p: Vector) -> Vector {
        (p - self.origin) * self.zoom
    }

    /// Screen-space roof position for a base point at `base` extruded by
    /// `height`. Orthographic shears every roof point by the unit camera
    /// direction; perspective pushes each roof point away from the camera
    /// position `camera` in proportion to `height / (d − height)`, with
    /// focal distance `d = 1000 / zoom`.
    fn project_roof(&self, base_screen: Vector, height: f64) -> Vector {
        if self.orthographic {
            base_screen + self.camera.normalize_or_zero() * (height * self.zoom)
        } else {
            let d = 1000.0 / self.zoom;
            let offset = base_screen - self.camera;
            base_screen + offset * (height / (d - height))
        }
    }
}

/// A wall quad in screen space, wound `[base_a, base_b, roof_b, roof_a]`.
pub type SideQuad = [Vector; 4];

/// A building footprint lifted to screen space, ready to draw: the roof
/// polygon on top, and the side walls whose outward normal faces the same
/// general direction the roof was extruded toward.
pub struct ProjectedBuilding {
    pub base: Vec<Vector>,
    pub roof: Vec<Vector>,
    pub sides: Vec<SideQuad>,
    pub height: f64,
}

/// A lot with its assigned height, before projection.
#[derive(Clone, Debug)]
pub struct Building {
    pub footprint: Polygon,
    pub height: f64,
}

/// Assigns each lot a random height in `[height_min, height_max]`.
pub fn assign_heights(lots: &[Polygon], params: &BuildingParams, rng: &mut GenRng) -> Vec<Building> {
    lots.iter()
        .map(|lot| Building {
            footprint: lot.clone(),
            height: rng.gen_range_f64(params.height_min..params.height_max),
        })
        .collect()
}

/// Projects buildings to screen space for rendering, sorted ascending by
/// height so a painter's-algorithm draw pass lays shorter buildings down
/// first and taller ones (more likely to visually overlap their neighbors
/// once extruded) last.
pub fn project_buildings(buildings: &[Building], view: &ViewState) -> Vec<ProjectedBuilding> {
    let mut ordered: Vec<&Building> = buildings.iter().collect();
    ordered.sort_by(|a, b| a.height.partial_cmp(&b.height).unwrap());

    ordered.into_iter().map(|b| project_building(b, view)).collect()
}

fn project_building(building: &Building, view: &ViewState) -> ProjectedBuilding {
    let base: Vec<Vector> = building.footprint.vertices.iter().map(|&p| view.world_to_screen(p)).collect();
    let roof: Vec<Vector> = base.iter().map(|&p| view.project_roof(p, building.height)).collect();

    let extrude_dir = if view.orthographic {
        view.camera.normalize_or_zero()
    } else {
        (roof.first().copied().unwrap_or(Vector::ZERO) - base.first().copied().unwrap_or(Vector::ZERO)).normalize_or_zero()
    };

    let n = base.len();
    let mut sides = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        let edge = base[j] - base[i];
        let outward_normal = edge.perp().normalize_or_zero();
        if outward_normal.dot(extrude_dir) <= 0.0 {
            continue;
        }
        sides.push([base[i], base[j], roof[j], roof[i]]);
    }

    ProjectedBuilding { base, roof, sides, height: building.height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OptionsParams;

    fn square() -> Polygon {
        Polygon::new(vec![
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 0.0),
            Vector::new(10.0, 10.0),
            Vector::new(0.0, 10.0),
        ])
    }

    #[test]
    fn assigned_heights_stay_in_range() {
        let params = BuildingParams { height_min: 10.0, height_max: 20.0, ..BuildingParams::default() };
        let mut rng = GenRng::from_seed(9);
        let buildings = assign_heights(&[square()], &params, &mut rng);
        assert!(buildings[0].height >= 10.0 && buildings[0].height <= 20.0);
    }

    #[test]
    fn orthographic_projection_shears_roof_uniformly() {
        let options = OptionsParams { orthographic: true, camera_x: 0.0, camera_y: -1.0, ..OptionsParams::default() };
        let view = ViewState::from_options(&options, Vector::ZERO, 1.0, Vector::new(100.0, 100.0));
        let building = Building { footprint: square(), height: 10.0 };
        let projected = project_building(&building, &view);
        for (b, r) in projected.base.iter().zip(projected.roof.iter()) {
            let delta = *r - *b;
            assert!((delta.y + 10.0).abs() < 1e-9);
            assert!(delta.x.abs() < 1e-9);
        }
    }

    #[test]
    fn projected_buildings_are_sorted_by_height() {
        let a = Building { footprint: square(), height: 30.0 };
        let b = Building { footprint: square(), height: 10.0 };
        let view = ViewState::from_options(&OptionsParams::default(), Vector::ZERO, 1.0, Vector::new(100.0, 100.0));
        let projected = project_buildings(&[a, b], &view);
        assert!(projected[0].height <= projected[1].height);
    }
}
