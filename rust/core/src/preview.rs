// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGBA debug rasters of a depth field

use crate::annotate::{Rgb, GROUND_GRAY};
use crate::field::DepthField;
use crate::planes::NO_PLANE;

/// Depth that maps to full white in [`depth_image`]
pub const DEPTH_IMAGE_RANGE: f32 = 50.0;

const SKY_BLACK: Rgb = Rgb::new(0, 0, 0);
const LEGEND_BAR_HEIGHT: u32 = 3;
const LEGEND_BOTTOM_MARGIN: u32 = 20;

#[inline]
fn put(pixels: &mut [u8], width: u32, x: u32, y: u32, rgb: Rgb) {
    let i = 4 * (y * width + x) as usize;
    pixels[i..i + 4].copy_from_slice(&[rgb.r, rgb.g, rgb.b, 255]);
}

/// Greyscale depth, `depth / 50 * 255` saturated, one RGBA pixel per sample
pub fn depth_image(field: &DepthField) -> Vec<u8> {
    let mut pixels = vec![0u8; field.depth_map.len() * 4];
    for (i, &depth) in field.depth_map.iter().enumerate() {
        let c = (depth / DEPTH_IMAGE_RANGE * 255.0).clamp(0.0, 255.0) as u8;
        pixels[i * 4..i * 4 + 4].copy_from_slice(&[c, c, c, 255]);
    }
    pixels
}

/// Pixels painted with the colour of the shard covering them, sky black,
/// with a legend bar under every rendered shard.
pub fn plane_image(field: &DepthField) -> Vec<u8> {
    let (w, h) = (field.width, field.height);
    let mut pixels = vec![0u8; (w * h) as usize * 4];

    for y in 0..h {
        for x in 0..w {
            let idx = field.indices[(y * w + x) as usize];
            let rgb = if idx == NO_PLANE {
                SKY_BLACK
            } else {
                field
                    .shard_at(idx as usize, x)
                    .map_or(GROUND_GRAY, |shard| shard.rgb)
            };
            put(&mut pixels, w, x, y, rgb);
        }
    }

    for (_, shard) in field.included_shards() {
        let offset = LEGEND_BOTTOM_MARGIN + (shard.plane_idx % 10) * LEGEND_BAR_HEIGHT;
        let Some(top) = h.checked_sub(offset) else {
            continue;
        };
        for x in shard.x0..=shard.x1.min(w - 1) {
            for y in top..(top + LEGEND_BAR_HEIGHT).min(h) {
                put(&mut pixels, w, x, y, shard.rgb);
            }
        }
    }

    pixels
}
