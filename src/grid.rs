//! Lambert Conformal Conic grid projection
//!
//! The national forecast service addresses its model output by grid cell
//! rather than by latitude/longitude. This module converts coordinates into
//! that cell using the service's published projection parameters.

use crate::types::GridCell;
use std::f64::consts::PI;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Projection parameters of the forecast grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LccGridConfig {
    /// Earth radius in km
    pub earth_radius_km: f64,
    /// Grid spacing in km
    pub grid_spacing_km: f64,
    /// First standard parallel in degrees
    pub standard_parallel_1: f64,
    /// Second standard parallel in degrees
    pub standard_parallel_2: f64,
    /// Reference longitude in degrees
    pub origin_lon: f64,
    /// Reference latitude in degrees
    pub origin_lat: f64,
    /// Grid x of the reference point
    pub origin_x: f64,
    /// Grid y of the reference point
    pub origin_y: f64,
}

impl Default for LccGridConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: 6371.00877,
            grid_spacing_km: 5.0,
            standard_parallel_1: 30.0,
            standard_parallel_2: 60.0,
            origin_lon: 126.0,
            origin_lat: 38.0,
            origin_x: 43.0,
            origin_y: 136.0,
        }
    }
}

/// Projects coordinates onto the forecast grid
#[derive(Debug, Clone, Copy)]
pub struct GridProjector {
    config: LccGridConfig,
    re: f64,
    sn: f64,
    sf: f64,
    ro: f64,
}

impl Default for GridProjector {
    fn default() -> Self {
        Self::new(LccGridConfig::default())
    }
}

impl GridProjector {
    pub fn new(config: LccGridConfig) -> Self {
        let re = config.earth_radius_km / config.grid_spacing_km;
        let slat1 = config.standard_parallel_1 * DEG_TO_RAD;
        let slat2 = config.standard_parallel_2 * DEG_TO_RAD;
        let olat = config.origin_lat * DEG_TO_RAD;

        let sn = (PI * 0.25 + slat2 * 0.5).tan() / (PI * 0.25 + slat1 * 0.5).tan();
        let sn = (slat1.cos() / slat2.cos()).ln() / sn.ln();

        let sf = (PI * 0.25 + slat1 * 0.5).tan();
        let sf = sf.powf(sn) * slat1.cos() / sn;

        let ro = (PI * 0.25 + olat * 0.5).tan();
        let ro = re * sf / ro.powf(sn);

        Self {
            config,
            re,
            sn,
            sf,
            ro,
        }
    }

    pub fn config(&self) -> &LccGridConfig {
        &self.config
    }

    /// Convert latitude/longitude (degrees) into a grid cell.
    pub fn project(&self, lat: f64, lon: f64) -> GridCell {
        let ra = (PI * 0.25 + lat * DEG_TO_RAD * 0.5).tan();
        let ra = self.re * self.sf / ra.powf(self.sn);

        let mut theta = lon * DEG_TO_RAD - self.config.origin_lon * DEG_TO_RAD;
        if theta > PI {
            theta -= 2.0 * PI;
        }
        if theta < -PI {
            theta += 2.0 * PI;
        }
        theta *= self.sn;

        let x = ra * theta.sin() + self.config.origin_x;
        let y = self.ro - ra * theta.cos() + self.config.origin_y;

        GridCell {
            nx: (x + 0.5).floor() as i32,
            ny: (y + 0.5).floor() as i32,
        }
    }
}

/// Project with the service's default grid.
pub fn project(lat: f64, lon: f64) -> GridCell {
    GridProjector::default().project(lat, lon)
}
