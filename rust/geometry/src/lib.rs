//! PanoDepth Geometry
//!
//! Reconstructs surface points, coloured point clouds and textured shard
//! meshes from a decoded depth field and its panorama image, using nalgebra
//! for vector math and rayon for per-shard tessellation.

pub mod error;
pub mod geodesy;
pub mod image;
pub mod mesh;
pub mod point_cloud;
pub mod projector;
pub mod tessellation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Rotation3, Vector3};

pub use error::{Error, Result};
pub use geodesy::{lat_meters_per_degree, lng_meters_per_degree, offset_for_location, LatLng};
pub use image::PanoramaImage;
pub use mesh::{Mesh, ShardMesh, ShardMeshCollection};
pub use point_cloud::{CloudPoint, PointCloudConfig};
pub use projector::{to_scene_frame, view_direction, GeometryProjector};
pub use tessellation::{ShardGrid, TessellationConfig};
