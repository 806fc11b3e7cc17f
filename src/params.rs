//! Parameter document (spec §6): the single fallible entry point into the
//! pipeline. Mirrors the `serde` + `thiserror` JSON-config pattern used by
//! the simulation crates in the reference corpus (e.g. a builtin-default
//! plus `from_file`/`from_json_str` loaders that wrap `serde_json::Error`).

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::geometry::Vector;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    pub zoom: f64,
    pub world_dimensions: Vector,
    pub origin: Vector,
    pub seed: u64,
    pub tensor_field: TensorFieldParams,
    pub water: WaterParams,
    pub streamlines: StreamlinesParams,
    pub parks: ParksParams,
    pub buildings: BuildingParams,
    pub options: OptionsParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            world_dimensions: Vector::new(2000.0, 1000.0),
            origin: Vector::new(0.0, 0.0),
            seed: 42,
            tensor_field: TensorFieldParams::default(),
            water: WaterParams::default(),
            streamlines: StreamlinesParams::default(),
            parks: ParksParams::default(),
            buildings: BuildingParams::default(),
            options: OptionsParams::default(),
        }
    }
}

impl Params {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate user-visible ranges. Every non-`ParamInvalid` failure mode
    /// in spec §7 is instead handled by the stage that hits it at
    /// generation time, not here.
    pub fn validate(&self) -> Result<()> {
        if !(0.3..=20.0).contains(&self.zoom) {
            return Err(GenError::ParamInvalid(format!(
                "zoom must be in [0.3, 20], got {}",
                self.zoom
            )));
        }
        if self.world_dimensions.x <= 0.0 || self.world_dimensions.y <= 0.0 {
            return Err(GenError::ParamInvalid(
                "world_dimensions must be positive".into(),
            ));
        }
        for (name, sp) in [
            ("main", &self.streamlines.main),
            ("major", &self.streamlines.major),
            ("minor", &self.streamlines.minor),
        ] {
            sp.validate(name)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseParams {
    pub global_noise: bool,
    pub noise_size_park: f64,
    pub noise_angle_park: f64,
    pub noise_size_global: f64,
    pub noise_angle_global: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            global_noise: false,
            noise_size_park: 20.0,
            noise_angle_park: 40.0,
            noise_size_global: 30.0,
            noise_angle_global: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BasisFieldKind {
    Grid,
    Radial,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BasisFieldParams {
    pub kind: BasisFieldKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub decay: f64,
    pub theta: f64,
}

impl Default for BasisFieldParams {
    fn default() -> Self {
        Self {
            kind: BasisFieldKind::Grid,
            x: 0.0,
            y: 0.0,
            size: 500.0,
            decay: 50.0,
            theta: 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TensorFieldParams {
    pub noise_params: NoiseParams,
    pub basis_fields: Vec<BasisFieldParams>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EdgeNoiseParams {
    pub noise_enabled: bool,
    pub noise_size: f64,
    pub noise_angle: f64,
}

impl Default for EdgeNoiseParams {
    fn default() -> Self {
        Self {
            noise_enabled: false,
            noise_size: 30.0,
            noise_angle: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterParams {
    pub coast_params: EdgeNoiseParams,
    pub river_params: EdgeNoiseParams,
    pub river_bank_size: f64,
    pub river_size: f64,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            coast_params: EdgeNoiseParams::default(),
            river_params: EdgeNoiseParams::default(),
            river_bank_size: 5.0,
            river_size: 30.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamlineParams {
    pub dsep: f64,
    pub dtest: f64,
    pub dstep: f64,
    pub dlookahead: f64,
    pub dcirclejoin: f64,
    pub joinangle: f64,
    pub path_iterations: u32,
    pub seed_tries: u32,
    pub simplify_tolerance: f64,
    pub collide_early: f64,
}

impl StreamlineParams {
    fn validate(&self, name: &str) -> Result<()> {
        if self.dsep <= 0.0 || self.dtest <= 0.0 || self.dstep <= 0.0 {
            return Err(GenError::ParamInvalid(format!(
                "{name}: dsep/dtest/dstep must be positive"
            )));
        }
        if self.dtest > self.dsep {
            return Err(GenError::ParamInvalid(format!(
                "{name}: dtest must be <= dsep"
            )));
        }
        if !(0.0..=1.0).contains(&self.collide_early) {
            return Err(GenError::ParamInvalid(format!(
                "{name}: collide_early must be in [0, 1]"
            )));
        }
        Ok(())
    }
}

impl Default for StreamlineParams {
    fn default() -> Self {
        Self {
            dsep: 400.0,
            dtest: 200.0,
            dstep: 1.0,
            dlookahead: 200.0,
            dcirclejoin: 5.0,
            joinangle: 0.1,
            path_iterations: 1000,
            seed_tries: 300,
            simplify_tolerance: 0.5,
            collide_early: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamlinesParams {
    pub main: StreamlineParams,
    pub major: StreamlineParams,
    pub minor: StreamlineParams,
}

impl Default for StreamlinesParams {
    fn default() -> Self {
        let main = StreamlineParams::default();
        let major = StreamlineParams {
            dsep: 300.0,
            dtest: 150.0,
            dlookahead: 150.0,
            ..StreamlineParams::default()
        };
        let minor = StreamlineParams {
            dsep: 150.0,
            dtest: 75.0,
            dlookahead: 75.0,
            ..StreamlineParams::default()
        };
        Self { main, major, minor }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParksParams {
    pub num_big_parks: usize,
    pub num_small_parks: usize,
    pub cluster_big_parks: bool,
}

impl Default for ParksParams {
    fn default() -> Self {
        Self {
            num_big_parks: 2,
            num_small_parks: 4,
            cluster_big_parks: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildingParams {
    pub min_area: f64,
    pub shrink_spacing: f64,
    pub chance_no_divide: f64,
    pub height_min: f64,
    pub height_max: f64,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self {
            min_area: 400.0,
            shrink_spacing: 1.5,
            chance_no_divide: 0.05,
            height_min: 20.0,
            height_max: 40.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptionsParams {
    pub draw_centre: bool,
    pub animation_speed: u32,
    pub orthographic: bool,
    pub camera_x: f64,
    pub camera_y: f64,
}

impl Default for OptionsParams {
    fn default() -> Self {
        Self {
            draw_centre: false,
            animation_speed: 30,
            orthographic: true,
            camera_x: 0.0,
            camera_y: -1.0,
        }
    }
}

impl Default for BasisFieldKind {
    fn default() -> Self {
        BasisFieldKind::Grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_roundtrip_through_json() {
        let params = Params::default();
        let json = serde_json::to_string(&params).unwrap();
        let back = Params::from_json_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn zoom_out_of_range_is_rejected() {
        let mut params = Params::default();
        params.zoom = 100.0;
        assert!(matches!(params.validate(), Err(GenError::ParamInvalid(_))));
    }

    #[test]
    fn negative_dsep_is_rejected() {
        let mut params = Params::default();
        params.streamlines.main.dsep = -1.0;
        assert!(matches!(params.validate(), Err(GenError::ParamInvalid(_))));
    }

    #[test]
    fn malformed_json_is_param_invalid() {
        let err = Params::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GenError::Json(_)));
    }
}
