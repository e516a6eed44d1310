// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry queries against a decoded depth field
//!
//! Rays come out of the depth payload in its own frame; everything returned
//! here is in the scene frame (+y up, +x north, +z east) via
//! `scene = (v.y, -v.z, v.x)`, optionally rotated about +y by the capture
//! heading.

use crate::error::{Error, Result};
use crate::image::PanoramaImage;
use crate::point_cloud::PointCloudConfig;
use crate::tessellation::TessellationConfig;
use nalgebra::{Point3, Rotation3, Vector3};
use panodepth_core::{intersect, is_sky, ray_direction, DepthField, Plane};
use std::f64::consts::{PI, TAU};

/// Convert a payload-frame vector into the scene frame
#[inline]
pub fn to_scene_frame(v: [f64; 3]) -> Vector3<f64> {
    Vector3::new(v[1], -v[2], v[0])
}

/// Scene-frame view direction for normalized panorama coordinates
/// (`nx` sweeps azimuth, `ny` runs from zenith at 0 to nadir at 1)
#[inline]
pub fn view_direction(nx: f64, ny: f64) -> Vector3<f64> {
    let azimuth = (nx + 0.5) * TAU;
    let altitude = PI * (0.5 - ny);
    Vector3::new(
        -azimuth.cos() * altitude.cos(),
        altitude.sin(),
        azimuth.sin() * altitude.cos(),
    )
}

/// Nearest pixel to normalized coordinates, consistent with [`view_direction`]
/// (the raster's columns are mirrored).
#[inline]
pub(crate) fn nearest_pixel(nx: f64, ny: f64, width: u32, height: u32) -> (u32, u32) {
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;
    let x = ((1.0 - nx) * max_x).round().clamp(0.0, max_x);
    let y = (ny * max_y).round().clamp(0.0, max_y);
    (x as u32, y as u32)
}

/// Reconstructs 3D positions from a depth field and its panorama image.
///
/// Both inputs are optional so a projector can be created before loading
/// finishes; every query fails with [`Error::NotLoaded`] until both exist.
#[derive(Debug, Clone)]
pub struct GeometryProjector<'a> {
    depth: Option<&'a DepthField>,
    image: Option<&'a PanoramaImage>,
    heading: Option<Rotation3<f64>>,
    pub(crate) tessellation: TessellationConfig,
    pub(crate) point_cloud: PointCloudConfig,
}

impl<'a> GeometryProjector<'a> {
    pub fn new(depth: Option<&'a DepthField>, image: Option<&'a PanoramaImage>) -> Self {
        Self {
            depth,
            image,
            heading: None,
            tessellation: TessellationConfig::default(),
            point_cloud: PointCloudConfig::default(),
        }
    }

    /// Projector over a fully loaded panorama
    pub fn loaded(depth: &'a DepthField, image: &'a PanoramaImage) -> Self {
        Self::new(Some(depth), Some(image))
    }

    /// Rotate all output into the track frame using the capture heading
    pub fn with_heading(mut self, heading_degrees: f64) -> Self {
        let angle = PI - heading_degrees.to_radians();
        self.heading = Some(Rotation3::from_axis_angle(&Vector3::y_axis(), angle));
        self
    }

    pub fn with_tessellation(mut self, config: TessellationConfig) -> Self {
        self.tessellation = config;
        self
    }

    pub fn with_point_cloud(mut self, config: PointCloudConfig) -> Self {
        self.point_cloud = config;
        self
    }

    /// Depth field and image, or `NotLoaded` naming the missing part
    pub(crate) fn require(&self) -> Result<(&'a DepthField, &'a PanoramaImage)> {
        match (self.depth, self.image) {
            (Some(depth), Some(image)) => Ok((depth, image)),
            (None, _) => Err(Error::NotLoaded("depth data")),
            (_, None) => Err(Error::NotLoaded("panorama image")),
        }
    }

    /// Apply the heading rotation, if any
    #[inline]
    pub(crate) fn orient(&self, p: Point3<f64>) -> Point3<f64> {
        match &self.heading {
            Some(rotation) => rotation * p,
            None => p,
        }
    }

    /// Surface point seen at normalized panorama coordinates.
    ///
    /// The depth is sampled at the nearest pixel; `Ok(None)` means the ray
    /// sees sky.
    pub fn point_at(&self, nx: f64, ny: f64) -> Result<Option<Point3<f64>>> {
        let (depth, _) = self.require()?;
        let (px, py) = nearest_pixel(nx, ny, depth.width, depth.height);
        let d = match depth.depth_at(px, py) {
            Some(d) if !is_sky(d) => d as f64,
            _ => return Ok(None),
        };
        Ok(Some(self.orient(Point3::from(view_direction(nx, ny) * d))))
    }

    /// Intersect the ray through raster position `(x, y)` (fractional
    /// positions allowed) with `plane`.
    pub fn plane_point_at_coord(&self, plane: &Plane, x: f64, y: f64) -> Result<Point3<f64>> {
        let (depth, _) = self.require()?;
        Ok(self.orient(local_plane_point(depth, plane, x, y)))
    }
}

/// Ray/plane intersection in the scene frame, before heading rotation
pub(crate) fn local_plane_point(depth: &DepthField, plane: &Plane, x: f64, y: f64) -> Point3<f64> {
    let v = ray_direction(x, y, depth.width, depth.height);
    let distance = intersect(plane, v).distance();
    Point3::from(to_scene_frame(v) * distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scene_frame_axes() {
        assert_eq!(to_scene_frame([1.0, 0.0, 0.0]), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(to_scene_frame([0.0, 1.0, 0.0]), Vector3::new(1.0, 0.0, 0.0));
        // Payload +z points at the nadir
        assert_eq!(to_scene_frame([0.0, 0.0, 1.0]), Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_view_direction_matches_rays() {
        let (w, h) = (64u32, 32u32);
        for (col, row) in [(5u32, 3u32), (20, 16), (40, 28), (63, 10)] {
            let nx = 1.0 - col as f64 / (w - 1) as f64;
            let ny = row as f64 / (h - 1) as f64;
            let from_view = view_direction(nx, ny);
            let from_ray = to_scene_frame(ray_direction(col as f64, row as f64, w, h));
            assert_relative_eq!(from_view, from_ray, epsilon = 1e-12);
            assert_eq!(nearest_pixel(nx, ny, w, h), (col, row));
        }
    }

    #[test]
    fn test_nearest_pixel_clamps() {
        assert_eq!(nearest_pixel(0.0, 0.0, 8, 4), (7, 0));
        assert_eq!(nearest_pixel(1.0, 1.0, 8, 4), (0, 3));
        assert_eq!(nearest_pixel(-0.5, 2.0, 8, 4), (7, 3));
    }
}
