// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ProcessingConfig;
use crate::error::{Error, Result};
use panodepth_core::DepthField;
use panodepth_geometry::{offset_for_location, GeometryProjector, LatLng, PanoramaImage, Vector3};

/// Identity and pose of a captured panorama
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaMeta {
    pub pano_id: String,
    /// Capture heading, degrees clockwise from north
    pub heading_degrees: f64,
    pub location: LatLng,
}

/// A panorama whose depth field and image may still be loading
#[derive(Debug, Clone)]
pub struct Panorama {
    pub meta: PanoramaMeta,
    pub depth: Option<DepthField>,
    pub image: Option<PanoramaImage>,
}

impl Panorama {
    pub fn new(meta: PanoramaMeta) -> Self {
        Self {
            meta,
            depth: None,
            image: None,
        }
    }

    pub fn with_depth(mut self, depth: DepthField) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_image(mut self, image: PanoramaImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Attach an RGBA8 image, checking it against its dimensions
    pub fn with_rgba(self, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Ok(self.with_image(PanoramaImage::from_rgba(width, height, pixels)?))
    }

    pub fn is_loaded(&self) -> bool {
        self.depth.is_some() && self.image.is_some()
    }

    /// Projector over the loaded depth field and image
    pub fn projector(&self) -> Result<GeometryProjector<'_>> {
        let depth = self.depth.as_ref().ok_or(Error::NotLoaded("depth data"))?;
        let image = self.image.as_ref().ok_or(Error::NotLoaded("panorama image"))?;
        Ok(GeometryProjector::loaded(depth, image))
    }

    /// Projector configured from processing settings, rotated by the
    /// capture heading when `apply_heading` is set
    pub fn projector_with(&self, config: &ProcessingConfig) -> Result<GeometryProjector<'_>> {
        let projector = self
            .projector()?
            .with_tessellation(config.tessellation)
            .with_point_cloud(config.point_cloud);
        Ok(if config.apply_heading {
            projector.with_heading(self.meta.heading_degrees)
        } else {
            projector
        })
    }

    /// Offset of this panorama from the first waypoint of a track
    pub fn track_offset(&self, origin: LatLng) -> Vector3<f64> {
        offset_for_location(origin, self.meta.location)
    }
}
