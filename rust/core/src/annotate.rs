// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shard and plane annotation
//!
//! Assigns widths and colours to shards, aggregates shard extents back onto
//! their planes, and provides the include predicates used by renderers.

use crate::planes::Plane;
use crate::segment::Shard;
use smallvec::SmallVec;

/// Normals whose third component is below this face the ground
pub const GROUND_NORMAL_LIMIT: f32 = -0.95;

/// Narrower shards/planes (in depth map columns) are not rendered
pub const MIN_INCLUDED_WIDTH: u32 = 5;

/// Hue step between consecutive colour slots
pub const HUE_STEP: f64 = 0.022;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Colour of ground shards and of planes without a coloured shard
pub const GROUND_GRAY: Rgb = Rgb::new(120, 120, 120);

/// Convert HSV (all components in `0..=1`, hue wraps) to RGB, flooring each channel
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    let channel = |c: f64| (c * 255.0).floor().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

/// Whether a normal faces the ground
#[inline]
pub fn is_ground(n: &[f32; 3]) -> bool {
    n[2] < GROUND_NORMAL_LIMIT
}

/// Whether a shard is worth rendering
#[inline]
pub fn include_shard(shard: &Shard) -> bool {
    !is_ground(&shard.n) && shard.w >= MIN_INCLUDED_WIDTH
}

/// Whether a plane is worth rendering
#[inline]
pub fn include_plane(plane: &PlaneRecord) -> bool {
    !is_ground(&plane.plane.n)
        && plane
            .extent
            .map_or(false, |extent| extent.w >= MIN_INCLUDED_WIDTH)
}

/// Horizontal extent and tallest span of a plane, aggregated over its shards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneExtent {
    pub x0: u32,
    pub x1: u32,
    pub w: u32,
    pub hx: u32,
    pub hy0: u32,
    pub hy1: u32,
    pub h_max: u32,
}

/// Shard/plane bounds divided by the raster dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedBounds {
    pub x0: f64,
    pub x1: f64,
    pub hx: f64,
    pub hy0: f64,
    pub hy1: f64,
}

impl NormalizedBounds {
    fn new(x0: u32, x1: u32, hx: u32, hy0: u32, hy1: u32, width: u32, height: u32) -> Self {
        let w = width as f64;
        let h = height as f64;
        Self {
            x0: x0 as f64 / w,
            x1: x1 as f64 / w,
            hx: hx as f64 / w,
            hy0: hy0 as f64 / h,
            hy1: hy1 as f64 / h,
        }
    }
}

impl Shard {
    /// Bounds in `0..1` image coordinates
    pub fn normalized_bounds(&self, width: u32, height: u32) -> NormalizedBounds {
        NormalizedBounds::new(self.x0, self.x1, self.hx, self.hy0, self.hy1, width, height)
    }
}

impl PlaneExtent {
    /// Bounds in `0..1` image coordinates
    pub fn normalized_bounds(&self, width: u32, height: u32) -> NormalizedBounds {
        NormalizedBounds::new(self.x0, self.x1, self.hx, self.hy0, self.hy1, width, height)
    }
}

/// A plane with the annotations derived from its shards
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneRecord {
    pub index: u32,
    pub plane: Plane,
    /// `None` when no shard of this plane survived segmentation
    pub extent: Option<PlaneExtent>,
    /// Colour slot of the plane's leftmost coloured shard
    pub ci: Option<u32>,
    pub rgb: Rgb,
    /// Indices into the shard list, in shard order
    pub shards: SmallVec<[usize; 4]>,
}

/// Annotate shards in place and build one record per plane.
///
/// Shards are coloured in order of ascending `x0` (ties keep shard order):
/// ground shards get [`GROUND_GRAY`] without consuming a slot, every other
/// shard takes the next slot `ci` and hue `ci * HUE_STEP`. The result depends
/// only on the shard order, so annotating twice gives identical colours.
pub fn annotate(planes: &[Plane], shards: &mut [Shard]) -> Vec<PlaneRecord> {
    let mut records: Vec<PlaneRecord> = planes
        .iter()
        .enumerate()
        .map(|(index, plane)| PlaneRecord {
            index: index as u32,
            plane: *plane,
            extent: None,
            ci: None,
            rgb: GROUND_GRAY,
            shards: SmallVec::new(),
        })
        .collect();

    for (i, shard) in shards.iter_mut().enumerate() {
        shard.w = shard.x1 - shard.x0;
        if let Some(record) = records.get_mut(shard.plane_idx as usize) {
            record.shards.push(i);
        }
    }

    let mut order: Vec<usize> = (0..shards.len()).collect();
    order.sort_by_key(|&i| shards[i].x0);

    let mut ci = 0u32;
    let mut coloured: Vec<bool> = vec![false; records.len()];
    for &i in &order {
        let shard = &mut shards[i];
        if is_ground(&shard.n) {
            shard.ci = None;
            shard.rgb = GROUND_GRAY;
        } else {
            shard.ci = Some(ci);
            shard.rgb = hsv_to_rgb(ci as f64 * HUE_STEP, 1.0, 1.0);
            ci += 1;
        }

        let plane_idx = shard.plane_idx as usize;
        if let Some(record) = records.get_mut(plane_idx) {
            if !coloured[plane_idx] {
                coloured[plane_idx] = true;
                record.ci = shard.ci;
                record.rgb = shard.rgb;
            }
            record.extent = Some(merge_extent(record.extent, shard));
        }
    }

    records
}

fn merge_extent(extent: Option<PlaneExtent>, shard: &Shard) -> PlaneExtent {
    let from_shard = PlaneExtent {
        x0: shard.x0,
        x1: shard.x1,
        w: shard.w,
        hx: shard.hx,
        hy0: shard.hy0,
        hy1: shard.hy1,
        h_max: shard.h_max,
    };

    match extent {
        None => from_shard,
        Some(mut merged) => {
            merged.x0 = merged.x0.min(shard.x0);
            merged.x1 = merged.x1.max(shard.x1);
            merged.w = merged.x1 - merged.x0;
            if shard.h_max > merged.h_max {
                merged.hx = shard.hx;
                merged.hy0 = shard.hy0;
                merged.hy1 = shard.hy1;
                merged.h_max = shard.h_max;
            }
            merged
        }
    }
}
