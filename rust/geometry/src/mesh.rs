// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::tessellation::ShardGrid;
use nalgebra::{Point2, Point3, Vector3};
use panodepth_core::Rgb;

/// Textured triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Panorama texture coordinates (u, v)
    pub uvs: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            uvs: Vec::with_capacity(vertex_count * 2),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Triangulate a tessellated shard: two triangles per grid cell.
    ///
    /// Grid vertices are column-major, `index = col * (rows + 1) + row`.
    pub fn from_shard_grid(grid: &ShardGrid) -> Self {
        let stride = grid.rows + 1;
        let mut mesh = Self::with_capacity(grid.vertices.len(), grid.cols * grid.rows * 6);

        for (vertex, uv) in grid.vertices.iter().zip(&grid.uvs) {
            mesh.add_vertex(*vertex, *uv);
        }

        for col in 0..grid.cols {
            for row in 0..grid.rows {
                let a = (col * stride + row) as u32;
                let b = ((col + 1) * stride + row) as u32;
                let c = b + 1;
                let d = a + 1;
                mesh.add_triangle(a, b, c);
                mesh.add_triangle(c, d, a);
            }
        }

        mesh
    }

    /// Add a vertex with texture coordinate
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, uv: Point2<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.uvs.push(uv.x as f32);
        self.uvs.push(uv.y as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Move every vertex by `offset`, in f64 before narrowing back to f32
    #[inline]
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        if offset.x == 0.0 && offset.y == 0.0 && offset.z == 0.0 {
            return;
        }
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 + offset.x) as f32;
            chunk[1] = (chunk[1] as f64 + offset.y) as f32;
            chunk[2] = (chunk[2] as f64 + offset.z) as f32;
        }
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;

        self.positions.reserve(other.positions.len());
        self.uvs.reserve(other.uvs.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });

        (min, max)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Mesh of a single shard, keeping its colour for flat-shaded previews
#[derive(Debug, Clone)]
pub struct ShardMesh {
    /// Index into the depth field's shard list
    pub shard_index: usize,
    pub ci: Option<u32>,
    pub rgb: Rgb,
    pub mesh: Mesh,
}

/// Collection of shard meshes from one panorama, preserving shard identity
#[derive(Debug, Clone, Default)]
pub struct ShardMeshCollection {
    pub shard_meshes: Vec<ShardMesh>,
}

impl ShardMeshCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self {
            shard_meshes: Vec::new(),
        }
    }

    /// Triangulate tessellated shards, skipping empty grids
    pub fn from_grids(grids: &[(usize, ShardGrid)]) -> Self {
        let mut collection = Self::new();
        for (shard_index, grid) in grids {
            collection.add(*shard_index, grid.ci, grid.rgb, Mesh::from_shard_grid(grid));
        }
        collection
    }

    /// Add a shard mesh
    pub fn add(&mut self, shard_index: usize, ci: Option<u32>, rgb: Rgb, mesh: Mesh) {
        if !mesh.is_empty() {
            self.shard_meshes.push(ShardMesh {
                shard_index,
                ci,
                rgb,
                mesh,
            });
        }
    }

    /// Check if collection is empty
    pub fn is_empty(&self) -> bool {
        self.shard_meshes.is_empty()
    }

    /// Get number of shard meshes
    pub fn len(&self) -> usize {
        self.shard_meshes.len()
    }

    /// Move every mesh by `offset` (e.g. a panorama's track offset)
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for shard_mesh in &mut self.shard_meshes {
            shard_mesh.mesh.translate(offset);
        }
    }

    /// Merge all shard meshes into a single mesh (loses per-shard identity)
    pub fn into_combined_mesh(self) -> Mesh {
        let mut combined = Mesh::new();
        for shard_mesh in self.shard_meshes {
            combined.merge(&shard_mesh.mesh);
        }
        combined
    }

    /// Iterate over shard meshes
    pub fn iter(&self) -> impl Iterator<Item = &ShardMesh> {
        self.shard_meshes.iter()
    }
}
