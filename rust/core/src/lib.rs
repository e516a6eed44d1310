// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # PanoDepth Core
//!
//! Decoder for the compressed depth maps that accompany street-level
//! panoramas, and the plane segmentation built on top of it.
//!
//! ## Overview
//!
//! - **Payload decoding**: URL-safe base64 + DEFLATE → raw depth buffer
//! - **Header/plane table**: bounds-checked binary parsing with [nom](https://docs.rs/nom)
//! - **Depth projection**: one equirectangular ray per pixel intersected with its plane
//! - **Segmentation**: column scan that splits planes into horizontally contiguous shards
//! - **Annotation**: deterministic per-shard colours, plane extents, include predicates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use panodepth_core::DepthField;
//!
//! let field = DepthField::decode(&response.model.depth_map)?;
//! for (index, shard) in field.included_shards() {
//!     println!("shard {}: plane {} columns {}..={}", index, shard.plane_idx, shard.x0, shard.x1);
//! }
//! ```
//!
//! ## Coordinate frame
//!
//! Rays are produced in the payload frame (`v = (sin θ cos φ, sin θ sin φ, cos θ)`).
//! Conversion to the renderer frame (+y up, +x north, +z east) happens in
//! `panodepth-geometry`.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for decoded fields

pub mod annotate;
pub mod builder;
pub mod error;
pub mod field;
pub mod header;
pub mod payload;
pub mod planes;
pub mod preview;
pub mod projection;
pub mod segment;

pub use annotate::{
    annotate, hsv_to_rgb, include_plane, include_shard, is_ground, NormalizedBounds, PlaneExtent,
    PlaneRecord, Rgb, GROUND_GRAY, MIN_INCLUDED_WIDTH,
};
pub use builder::PayloadBuilder;
pub use error::{Error, Result};
pub use field::DepthField;
pub use header::{parse_header, Header, HEADER_LEN, PLANE_RECORD_LEN};
pub use payload::{decode_base64url, decode_payload, encode_payload, inflate};
pub use planes::{parse_plane_table, Plane, PlaneTable, NO_PLANE};
pub use preview::{depth_image, plane_image};
pub use projection::{
    intersect, is_sky, pixel_angles, project_depths, ray_direction, DepthProjection, RayHit,
    DEGENERATE_DEPTH, SKY_DEPTH, SKY_THRESHOLD,
};
pub use segment::{ColumnScanSegmenter, EdgePolicy, SegmentConfig, Shard};
