// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Equirectangular rays and ray/plane depth
//!
//! Column 0 maps to the rightmost azimuth and increasing x sweeps westward;
//! this mirroring is part of the payload format and must not be "fixed".

use crate::planes::{Plane, NO_PLANE};
use std::f64::consts::{FRAC_PI_2, PI};

/// Depth written for pixels without a plane
pub const SKY_DEPTH: f32 = 9_999_999_999_999_999_999.0;

/// Depths above this are treated as "no surface"
pub const SKY_THRESHOLD: f32 = 1.0e8;

/// Clamp value for rays running (nearly) parallel to their plane
pub const DEGENERATE_DEPTH: f32 = 1.0e7;

/// `|v · n|` below this is treated as parallel
const PARALLEL_EPSILON: f64 = 1e-9;

/// Whether a depth sample means "no surface"
#[inline]
pub fn is_sky(depth: f32) -> bool {
    depth > SKY_THRESHOLD
}

/// Azimuth `phi` and altitude `theta` for a (possibly fractional) raster position
#[inline]
pub fn pixel_angles(x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
    let w = width as f64;
    let h = height as f64;
    let phi = (w - x - 1.0) / (w - 1.0) * 2.0 * PI + FRAC_PI_2;
    let theta = (h - y - 1.0) / (h - 1.0) * PI;
    (phi, theta)
}

/// Unit ray direction in the payload frame for a raster position
#[inline]
pub fn ray_direction(x: f64, y: f64, width: u32, height: u32) -> [f64; 3] {
    let (phi, theta) = pixel_angles(x, y, width, height);
    [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]
}

/// Outcome of casting a ray at a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    /// Distance along the ray to the plane
    Surface(f64),
    /// The ray is parallel to the plane or the distance blew up
    Degenerate,
}

impl RayHit {
    /// Depth as stored in a depth buffer
    #[inline]
    pub fn depth(self) -> f32 {
        match self {
            RayHit::Surface(d) => d as f32,
            RayHit::Degenerate => DEGENERATE_DEPTH,
        }
    }

    /// Full-precision distance, clamped like [`RayHit::depth`]
    #[inline]
    pub fn distance(self) -> f64 {
        match self {
            RayHit::Surface(d) => d,
            RayHit::Degenerate => DEGENERATE_DEPTH as f64,
        }
    }
}

/// Intersect a ray with a plane: `t = d / (v · n)`, depth `= |v * t|`.
#[inline]
pub fn intersect(plane: &Plane, v: [f64; 3]) -> RayHit {
    let n = plane.normal_f64();
    let dot = v[0] * n[0] + v[1] * n[1] + v[2] * n[2];
    if dot.abs() < PARALLEL_EPSILON {
        return RayHit::Degenerate;
    }

    let t = plane.d as f64 / dot;
    let depth = ((v[0] * t).powi(2) + (v[1] * t).powi(2) + (v[2] * t).powi(2)).sqrt();
    if !depth.is_finite() || depth >= DEGENERATE_DEPTH as f64 {
        RayHit::Degenerate
    } else {
        RayHit::Surface(depth)
    }
}

/// Dense depth buffer computed from a plane-index raster
#[derive(Debug, Clone)]
pub struct DepthProjection {
    /// Row-major depths, same indexing as the raster
    pub depths: Vec<f32>,
    /// Pixels whose depth was clamped to [`DEGENERATE_DEPTH`]
    pub degenerate_pixels: usize,
}

/// Cast one ray per pixel and intersect it with the pixel's plane.
pub fn project_depths(width: u32, height: u32, indices: &[u8], planes: &[Plane]) -> DepthProjection {
    let mut depths = Vec::with_capacity(indices.len());
    let mut degenerate_pixels = 0usize;

    for y in 0..height {
        for x in 0..width {
            let plane_idx = indices[(y * width + x) as usize];
            let plane = match planes.get(plane_idx as usize) {
                Some(plane) if plane_idx != NO_PLANE => plane,
                _ => {
                    depths.push(SKY_DEPTH);
                    continue;
                }
            };

            let hit = intersect(plane, ray_direction(x as f64, y as f64, width, height));
            if hit == RayHit::Degenerate {
                degenerate_pixels += 1;
            }
            depths.push(hit.depth());
        }
    }

    if degenerate_pixels > 0 {
        tracing::warn!(
            degenerate_pixels,
            clamp = DEGENERATE_DEPTH,
            "Rays parallel to their plane, depth clamped"
        );
    }

    DepthProjection {
        depths,
        degenerate_pixels,
    }
}
