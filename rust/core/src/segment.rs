// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column-scan segmentation
//!
//! The encoder reuses plane indices for unrelated surfaces at different
//! horizontal positions, so a plane is split into *shards*: maximal runs of
//! consecutive columns in which the plane appears. The scan walks columns left
//! to right and rows top to bottom, keeping one extent per plane:
//!
//! ```text
//! absent --(plane seen in column)--> open --(column without plane)--> closed
//!    ^                                                                  |
//!    +------------------------------------------------------------------+
//! ```
//!
//! Closing an extent emits a [`Shard`]; the plane is then free to open a new one.

use crate::annotate::{Rgb, GROUND_GRAY};
use crate::planes::{Plane, NO_PLANE};

/// What to do with extents still open when the scan reaches the right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgePolicy {
    /// Emit a shard for every extent still open after the last column
    #[default]
    Flush,
    /// Discard open extents (matches depth fields cached by older decoders)
    Drop,
}

impl std::str::FromStr for EdgePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flush" => Ok(EdgePolicy::Flush),
            "drop" => Ok(EdgePolicy::Drop),
            other => Err(format!("unknown edge policy '{}', expected flush or drop", other)),
        }
    }
}

/// Segmentation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentConfig {
    pub edge_policy: EdgePolicy,
}

/// A horizontally contiguous fragment of one plane's footprint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shard {
    pub plane_idx: u32,
    pub n: [f32; 3],
    pub d: f32,
    /// First column of the run
    pub x0: u32,
    /// Last column of the run
    pub x1: u32,
    /// Column holding the tallest vertical span
    pub hx: u32,
    /// Top row of the tallest span
    pub hy0: u32,
    /// Bottom row of the tallest span
    pub hy1: u32,
    /// `hy1 - hy0` of the tallest span
    pub h_max: u32,
    /// `x1 - x0`, filled in by the annotator
    pub w: u32,
    /// Colour slot, `None` for ground shards
    pub ci: Option<u32>,
    pub rgb: Rgb,
}

impl Shard {
    /// The plane this shard lies on
    #[inline]
    pub fn plane(&self) -> Plane {
        Plane::new(self.n, self.d)
    }
}

/// Vertical span of a plane inside one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnSpan {
    top: u32,
    bottom: u32,
}

/// Scan state of a plane with an open extent
#[derive(Debug, Clone, Copy)]
struct OpenExtent {
    x0: u32,
    x1: u32,
    hx: u32,
    hy0: u32,
    hy1: u32,
    h_max: u32,
}

impl OpenExtent {
    fn open(x: u32, span: ColumnSpan) -> Self {
        Self {
            x0: x,
            x1: x,
            hx: x,
            hy0: span.top,
            hy1: span.bottom,
            h_max: span.bottom - span.top,
        }
    }

    fn extend(&mut self, x: u32, span: ColumnSpan) {
        // Columns are visited once, left to right
        if x > self.x1 {
            self.x1 = x;
        }
        // A zero height counts as unset, so flat runs track their latest column
        let height = span.bottom - span.top;
        if self.h_max == 0 || height > self.h_max {
            self.h_max = height;
            self.hx = x;
            self.hy0 = span.top;
            self.hy1 = span.bottom;
        }
    }

    fn close(self, plane_idx: usize, plane: &Plane) -> Shard {
        Shard {
            plane_idx: plane_idx as u32,
            n: plane.n,
            d: plane.d,
            x0: self.x0,
            x1: self.x1,
            hx: self.hx,
            hy0: self.hy0,
            hy1: self.hy1,
            h_max: self.h_max,
            w: 0,
            ci: None,
            rgb: GROUND_GRAY,
        }
    }
}

/// Splits a plane-index raster into shards
pub struct ColumnScanSegmenter<'a> {
    width: u32,
    height: u32,
    indices: &'a [u8],
    planes: &'a [Plane],
    config: SegmentConfig,
}

impl<'a> ColumnScanSegmenter<'a> {
    pub fn new(width: u32, height: u32, indices: &'a [u8], planes: &'a [Plane]) -> Self {
        debug_assert_eq!(indices.len(), (width * height) as usize);
        Self {
            width,
            height,
            indices,
            planes,
            config: SegmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SegmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the scan and return shards in closing order
    pub fn segment(&self) -> Vec<Shard> {
        let plane_count = self.planes.len();
        let mut ongoing: Vec<Option<OpenExtent>> = vec![None; plane_count];
        let mut column: Vec<Option<ColumnSpan>> = vec![None; plane_count];
        let mut shards = Vec::new();

        for x in 0..self.width {
            column.fill(None);

            for y in 0..self.height {
                let plane_idx = self.indices[(y * self.width + x) as usize];
                if plane_idx == NO_PLANE || plane_idx as usize >= plane_count {
                    continue;
                }
                match &mut column[plane_idx as usize] {
                    Some(span) => span.bottom = y,
                    slot @ None => *slot = Some(ColumnSpan { top: y, bottom: y }),
                }
            }

            for plane_idx in 1..plane_count {
                match (column[plane_idx], ongoing[plane_idx].as_mut()) {
                    (Some(span), Some(extent)) => extent.extend(x, span),
                    (Some(span), None) => ongoing[plane_idx] = Some(OpenExtent::open(x, span)),
                    (None, Some(_)) => {
                        if let Some(extent) = ongoing[plane_idx].take() {
                            shards.push(extent.close(plane_idx, &self.planes[plane_idx]));
                        }
                    }
                    (None, None) => {}
                }
            }
        }

        let open_at_edge = ongoing.iter().filter(|e| e.is_some()).count();
        match self.config.edge_policy {
            EdgePolicy::Flush => {
                for (plane_idx, extent) in ongoing.into_iter().enumerate() {
                    if let Some(extent) = extent {
                        shards.push(extent.close(plane_idx, &self.planes[plane_idx]));
                    }
                }
            }
            EdgePolicy::Drop if open_at_edge > 0 => {
                tracing::debug!(dropped = open_at_edge, "Discarding extents open at right edge");
            }
            EdgePolicy::Drop => {}
        }

        shards
    }
}
