// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coloured point cloud sampled on a regular azimuth/altitude grid

use crate::error::Result;
use crate::projector::{nearest_pixel, GeometryProjector};
use nalgebra::Point3;
use panodepth_core::Rgb;

/// Sampling grid for [`GeometryProjector::point_cloud`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCloudConfig {
    /// Azimuth samples around the full circle
    pub rays_lng: u32,
    /// Altitude samples from zenith to nadir
    pub rays_lat: u32,
    /// Fraction of the altitude samples to take, starting below the zenith
    pub lat_fraction: f64,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            rays_lng: 240,
            rays_lat: 60,
            lat_fraction: 0.51,
        }
    }
}

impl PointCloudConfig {
    /// Altitude indices sampled, `1..=floor(rays_lat * lat_fraction)`
    pub fn lat_steps(&self) -> u32 {
        (self.rays_lat as f64 * self.lat_fraction).floor().max(0.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPoint {
    pub position: Point3<f64>,
    pub color: Rgb,
}

impl<'a> GeometryProjector<'a> {
    /// Sample the panorama on the configured grid, coloured from the image.
    /// Sky samples are skipped.
    pub fn point_cloud(&self) -> Result<Vec<CloudPoint>> {
        let (_, image) = self.require()?;
        let config = self.point_cloud;
        if config.rays_lng == 0 || config.rays_lat == 0 {
            return Ok(Vec::new());
        }

        let lat_steps = config.lat_steps();
        let mut points = Vec::with_capacity((config.rays_lng * lat_steps) as usize);
        for lng in 0..config.rays_lng {
            let nx = lng as f64 / config.rays_lng as f64;
            for lat in 1..=lat_steps {
                let ny = lat as f64 / config.rays_lat as f64;
                if let Some(position) = self.point_at(nx, ny)? {
                    let (px, py) = nearest_pixel(nx, ny, image.width(), image.height());
                    points.push(CloudPoint {
                        position,
                        color: image.pixel(px, py),
                    });
                }
            }
        }

        tracing::debug!(
            samples = config.rays_lng * lat_steps,
            points = points.len(),
            "Sampled point cloud"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lat_steps() {
        assert_eq!(PointCloudConfig::default().lat_steps(), 30);
    }

    #[test]
    fn test_lat_steps_rounds_down() {
        let config = PointCloudConfig {
            rays_lng: 16,
            rays_lat: 8,
            lat_fraction: 0.51,
        };
        assert_eq!(config.lat_steps(), 4);

        let none = PointCloudConfig {
            lat_fraction: 0.0,
            ..config
        };
        assert_eq!(none.lat_steps(), 0);
    }
}
