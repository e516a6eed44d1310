// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector tests against a synthetic 64x32 panorama.
//! An east-facing wall (payload x = 10, scene z = 10) covers columns 8..=24 and
//! rows 8..=24, a ground plane two units below the camera covers rows 25..=31.

use approx::assert_relative_eq;
use panodepth_core::{DepthField, PayloadBuilder, Rgb};
use panodepth_geometry::{
    offset_for_location, Error, GeometryProjector, LatLng, PanoramaImage, PointCloudConfig,
    ShardMeshCollection, TessellationConfig,
};

const WIDTH: u16 = 64;
const HEIGHT: u16 = 32;
const RED: Rgb = Rgb::new(255, 0, 0);

fn wall_and_ground() -> DepthField {
    let mut builder = PayloadBuilder::new(WIDTH, HEIGHT);
    let wall = builder.add_plane([1.0, 0.0, 0.0], 10.0);
    let ground = builder.add_plane([0.0, 0.0, -1.0], -2.0);
    builder.fill(wall, 8..=24, 8..=24);
    builder.fill(ground, 0..=WIDTH - 1, 25..=HEIGHT - 1);
    DepthField::decode(&builder.to_payload().unwrap()).unwrap()
}

fn red_image() -> PanoramaImage {
    PanoramaImage::filled(WIDTH as u32, HEIGHT as u32, RED).unwrap()
}

/// Normalized coordinates that land exactly on a raster pixel
fn coords(col: u32, row: u32) -> (f64, f64) {
    (
        1.0 - col as f64 / (WIDTH - 1) as f64,
        row as f64 / (HEIGHT - 1) as f64,
    )
}

#[test]
fn test_point_at_hits_wall() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);

    let (nx, ny) = coords(16, 16);
    let p = projector.point_at(nx, ny).unwrap().expect("wall pixel");
    assert_relative_eq!(p.z, 10.0, epsilon = 1e-4);
    // Row 16 sits just below the horizon
    assert!(p.y < 0.0);
}

#[test]
fn test_point_at_hits_ground() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);

    for col in [0, 20, 40, 63] {
        let (nx, ny) = coords(col, 28);
        let p = projector.point_at(nx, ny).unwrap().expect("ground pixel");
        assert_relative_eq!(p.y, -2.0, epsilon = 1e-4);
    }
}

#[test]
fn test_point_at_sky_is_none() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);

    let (nx, ny) = coords(40, 2);
    assert!(projector.point_at(nx, ny).unwrap().is_none());
}

#[test]
fn test_plane_point_matches_point_at() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);
    let wall = *field.plane(1).unwrap();

    let (nx, ny) = coords(12, 20);
    let sampled = projector.point_at(nx, ny).unwrap().unwrap();
    let exact = projector.plane_point_at_coord(&wall, 12.0, 20.0).unwrap();
    assert_relative_eq!(sampled, exact, epsilon = 1e-4);
    assert_relative_eq!(exact.z, 10.0, epsilon = 1e-9);
}

#[test]
fn test_missing_inputs_report_not_loaded() {
    let field = wall_and_ground();
    let image = red_image();
    let shard = field.shards[0].clone();

    let no_image = GeometryProjector::new(Some(&field), None);
    assert!(matches!(no_image.point_at(0.5, 0.5), Err(Error::NotLoaded(_))));
    assert!(matches!(no_image.point_cloud(), Err(Error::NotLoaded(_))));

    let no_depth = GeometryProjector::new(None, Some(&image));
    assert!(matches!(no_depth.tessellate_shard(&shard), Err(Error::NotLoaded(_))));
    assert!(matches!(no_depth.shard_meshes(), Err(Error::NotLoaded(_))));
    let wall = shard.plane();
    assert!(matches!(
        no_depth.plane_point_at_coord(&wall, 1.0, 1.0),
        Err(Error::NotLoaded(_))
    ));
}

#[test]
fn test_tessellate_wall_shard() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);
    let shard = field.shards.iter().find(|s| s.plane_idx == 1).unwrap();
    assert_eq!((shard.x0, shard.x1, shard.w), (8, 24, 16));
    assert_eq!((shard.hx, shard.hy0, shard.hy1, shard.h_max), (8, 8, 24, 16));

    let grid = projector.tessellate_shard(shard).unwrap();
    // 16 of 64 columns at 64 per width, 16 of 32 rows at 16 per height
    assert_eq!((grid.cols, grid.rows), (16, 8));
    assert_eq!(grid.vertices.len(), 17 * 9);
    assert_eq!(grid.uvs.len(), 17 * 9);
    assert_eq!(grid.ci, Some(0));

    for v in &grid.vertices {
        assert_relative_eq!(v.z, 10.0, epsilon = 1e-6);
    }
    for uv in &grid.uvs {
        assert!((0.0..1.0).contains(&uv.x));
        assert!((0.0..=1.0).contains(&uv.y));
    }

    let top = grid.vertex(0, 0).unwrap();
    let bottom = grid.vertex(0, grid.rows).unwrap();
    assert!(top.y > 0.0);
    assert!(bottom.y < 0.0);
}

#[test]
fn test_shard_meshes_skip_ground() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);

    let grids = projector.shard_meshes().unwrap();
    assert_eq!(grids.len(), 1);
    let (index, _) = &grids[0];
    assert_eq!(field.shards[*index].plane_idx, 1);

    let collection = ShardMeshCollection::from_grids(&grids);
    assert_eq!(collection.len(), 1);
    let mesh = collection.into_combined_mesh();
    assert_eq!(mesh.vertex_count(), 17 * 9);
    assert_eq!(mesh.triangle_count(), 16 * 8 * 2);
}

#[test]
fn test_coarse_tessellation() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image).with_tessellation(TessellationConfig {
        column_density: 4.0,
        row_density: 2.0,
        ..Default::default()
    });

    let shard = field.shards.iter().find(|s| s.plane_idx == 1).unwrap();
    let grid = projector.tessellate_shard(shard).unwrap();
    assert_eq!((grid.cols, grid.rows), (1, 1));
    assert_eq!(grid.vertices.len(), 4);
}

#[test]
fn test_heading_rotation() {
    let field = wall_and_ground();
    let image = red_image();
    let (nx, ny) = coords(16, 16);

    let plain = GeometryProjector::loaded(&field, &image)
        .point_at(nx, ny)
        .unwrap()
        .unwrap();

    // Heading 180 degrees leaves the panorama frame unchanged
    let south = GeometryProjector::loaded(&field, &image)
        .with_heading(180.0)
        .point_at(nx, ny)
        .unwrap()
        .unwrap();
    assert_relative_eq!(south, plain, epsilon = 1e-9);

    // Heading 0 turns it half way round the vertical axis
    let north = GeometryProjector::loaded(&field, &image)
        .with_heading(0.0)
        .point_at(nx, ny)
        .unwrap()
        .unwrap();
    assert_relative_eq!(north.x, -plain.x, epsilon = 1e-9);
    assert_relative_eq!(north.y, plain.y, epsilon = 1e-9);
    assert_relative_eq!(north.z, -plain.z, epsilon = 1e-9);
}

#[test]
fn test_point_cloud_samples_wall() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image).with_point_cloud(PointCloudConfig {
        rays_lng: 16,
        rays_lat: 8,
        lat_fraction: 0.51,
    });

    // Altitude steps land on rows 4, 8, 12 and 16; five azimuths fall on
    // the wall columns and row 4 is sky
    let cloud = projector.point_cloud().unwrap();
    assert_eq!(cloud.len(), 15);
    for point in &cloud {
        assert_eq!(point.color, RED);
        assert!(point.position.z > 8.0 && point.position.z < 12.0);
    }
}

#[test]
fn test_track_offset_moves_meshes() {
    let field = wall_and_ground();
    let image = red_image();
    let projector = GeometryProjector::loaded(&field, &image);
    let mut collection = ShardMeshCollection::from_grids(&projector.shard_meshes().unwrap());

    let origin = LatLng::new(0.0, 0.0);
    let offset = offset_for_location(origin, LatLng::new(0.0, 0.001));
    assert_relative_eq!(offset.z, 111.319458, epsilon = 1e-3);

    let before = collection.iter().next().unwrap().mesh.bounds();
    collection.translate(&offset);
    let after = collection.iter().next().unwrap().mesh.bounds();
    assert_relative_eq!(after.1.z - before.1.z, 111.319458, epsilon = 1e-2);
}
