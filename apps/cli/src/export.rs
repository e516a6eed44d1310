// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File writers: OBJ meshes, XYZRGB point clouds and PNG previews.

use anyhow::{Context, Result};
use image::RgbaImage;
use panodepth_geometry::{CloudPoint, ShardMeshCollection};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Totals written to an OBJ file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObjStats {
    pub objects: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// Write shard meshes of one or more panoramas as a textured OBJ, one object
/// per shard. Coordinates are already Y-up.
pub fn write_obj(path: &Path, panoramas: &[(String, ShardMeshCollection)]) -> Result<ObjStats> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let stats = write_obj_to(&mut out, panoramas)?;
    out.flush()?;
    Ok(stats)
}

fn write_obj_to(out: &mut impl Write, panoramas: &[(String, ShardMeshCollection)]) -> Result<ObjStats> {
    writeln!(out, "# Generated by panodepth")?;
    writeln!(out, "# Coordinate system: Y-up, +X north, +Z east")?;
    writeln!(out)?;

    let mut stats = ObjStats::default();
    for (pano_id, collection) in panoramas {
        for shard_mesh in collection.iter() {
            let mesh = &shard_mesh.mesh;
            let rgb = shard_mesh.rgb;
            writeln!(out, "o {}_shard_{}", pano_id, shard_mesh.shard_index)?;
            writeln!(out, "# rgb {} {} {}", rgb.r, rgb.g, rgb.b)?;

            for p in mesh.positions.chunks_exact(3) {
                writeln!(out, "v {:.6} {:.6} {:.6}", p[0], p[1], p[2])?;
            }
            for uv in mesh.uvs.chunks_exact(2) {
                writeln!(out, "vt {:.6} {:.6}", uv[0], uv[1])?;
            }

            // OBJ indices are 1-based and global across objects
            let base = stats.vertices + 1;
            for tri in mesh.indices.chunks_exact(3) {
                let (a, b, c) = (
                    tri[0] as usize + base,
                    tri[1] as usize + base,
                    tri[2] as usize + base,
                );
                writeln!(out, "f {}/{} {}/{} {}/{}", a, a, b, b, c, c)?;
            }
            writeln!(out)?;

            stats.objects += 1;
            stats.vertices += mesh.vertex_count();
            stats.triangles += mesh.triangle_count();
        }
    }
    Ok(stats)
}

/// Write a point cloud as `x y z r g b` lines
pub fn write_xyz(path: &Path, points: &[CloudPoint]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for point in points {
        let p = &point.position;
        let c = point.color;
        writeln!(out, "{:.4} {:.4} {:.4} {} {} {}", p.x, p.y, p.z, c.r, c.g, c.b)?;
    }
    out.flush()?;
    Ok(())
}

/// Save an RGBA8 buffer as PNG
pub fn save_png(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let image = RgbaImage::from_raw(width, height, rgba)
        .with_context(|| format!("buffer does not match {}x{} image", width, height))?;
    image
        .save(path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use panodepth_core::Rgb;
    use panodepth_geometry::{Point2, Point3, ShardGrid};

    fn grid() -> ShardGrid {
        ShardGrid {
            cols: 1,
            rows: 1,
            ci: Some(0),
            rgb: Rgb::new(255, 0, 0),
            vertices: vec![
                Point3::new(0.0, 1.0, 5.0),
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(1.0, 1.0, 5.0),
                Point3::new(1.0, 0.0, 5.0),
            ],
            uvs: vec![Point2::new(0.25, 0.5); 4],
        }
    }

    #[test]
    fn test_obj_indices_are_global() {
        let collection = ShardMeshCollection::from_grids(&[(3, grid()), (7, grid())]);
        let mut out = Vec::new();
        let stats = write_obj_to(&mut out, &[("pano".to_string(), collection)]).unwrap();
        assert_eq!(
            stats,
            ObjStats {
                objects: 2,
                vertices: 8,
                triangles: 4
            }
        );

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("o pano_shard_3\n"));
        assert!(text.contains("o pano_shard_7\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 8);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 8);

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 4);
        assert_eq!(faces[0], "f 1/1 3/3 4/4");
        assert_eq!(faces[2], "f 5/5 7/7 8/8");
    }
}
