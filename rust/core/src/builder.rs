// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic depth payloads
//!
//! Writes the same layout the decoder reads. Used for fixtures and for
//! re-encoding edited rasters.

use crate::error::Result;
use crate::header::{Header, HEADER_LEN};
use crate::payload::encode_payload;
use crate::planes::{Plane, NO_PLANE};
use std::ops::RangeInclusive;

/// Builder for raw depth buffers and encoded payloads
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    width: u16,
    height: u16,
    indices: Vec<u8>,
    planes: Vec<Plane>,
}

impl PayloadBuilder {
    /// Empty (all-sky) raster with only the null plane
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            indices: vec![NO_PLANE; width as usize * height as usize],
            planes: vec![Plane::new([0.0; 3], 0.0)],
        }
    }

    /// Append a plane record and return its raster index
    pub fn add_plane(&mut self, n: [f32; 3], d: f32) -> u8 {
        self.planes.push(Plane::new(n, d));
        (self.planes.len() - 1) as u8
    }

    /// Assign `plane` to one pixel
    pub fn set(&mut self, x: u16, y: u16, plane: u8) -> &mut Self {
        let i = y as usize * self.width as usize + x as usize;
        self.indices[i] = plane;
        self
    }

    /// Assign `plane` to every pixel in the column/row ranges
    pub fn fill(&mut self, plane: u8, xs: RangeInclusive<u16>, ys: RangeInclusive<u16>) -> &mut Self {
        for y in ys {
            for x in xs.clone() {
                self.set(x, y, plane);
            }
        }
        self
    }

    pub fn header(&self) -> Header {
        Header {
            header_size: HEADER_LEN as u8,
            number_of_planes: self.planes.len() as u16,
            width: self.width,
            height: self.height,
            offset: HEADER_LEN as u16,
        }
    }

    /// Inflated depth buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = self.header();
        let mut out = Vec::with_capacity(header.required_len());
        header.write_to(&mut out);
        out.extend_from_slice(&self.indices);
        for plane in &self.planes {
            for component in plane.n {
                out.extend_from_slice(&component.to_le_bytes());
            }
            out.extend_from_slice(&plane.d.to_le_bytes());
        }
        out
    }

    /// Compressed, provider-encoded payload string
    pub fn to_payload(&self) -> Result<String> {
        encode_payload(&self.to_bytes())
    }
}
