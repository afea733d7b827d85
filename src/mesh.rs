// Triangular surface meshes and their extraction from voxel volumes with the marching cubes algorithm (`mcubes`).
// A mesh stores each vertex by its x,y,z coord and each face by 3 vertices, stored as 3 indices into the vertices.
// Mesh coordinates are voxel coordinates of the input volume (unit spacing, voxel centers at integer positions).

use ndarray::Array3;
use nalgebra::Point3;
use tracing::debug;

use lin_alg::f32::Vec3;
use mcubes::{MarchingCubes, MeshSide};

use std::collections::HashMap;

use crate::error::{Result, TractshapeError};

/// Isosurface level used for binary (0/1) volumes: the midpoint of the value range.
pub const SURFACE_LEVEL: f64 = 0.5;

/// A triangle mesh.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct TriMesh {
    pub vertices: Vec<f64>,
    pub faces: Vec<usize>,
}

impl TriMesh {

    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertex(&self, index: usize) -> Point3<f64> {
        Point3::new(self.vertices[index * 3], self.vertices[index * 3 + 1], self.vertices[index * 3 + 2])
    }

    /// Area of a single face.
    pub fn face_area(&self, face: usize) -> f64 {
        let a = self.vertex(self.faces[face * 3]);
        let b = self.vertex(self.faces[face * 3 + 1]);
        let c = self.vertex(self.faces[face * 3 + 2]);
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    /// Total area of all faces.
    pub fn surface_area(&self) -> f64 {
        (0..self.num_faces()).map(|f| self.face_area(f)).sum()
    }
}


/// Key of a vertex position, used to merge the copies of a vertex emitted for neighbouring cubes.
fn position_key(x: f32, y: f32, z: f32) -> [i64; 3] {
    [x, y, z].map(|c| (f64::from(c) * 1e4).round() as i64)
}


/// Extract the isosurface at `level` from a scalar volume with marching cubes.
///
/// The surface is computed by `mcubes` with unit spacing, so mesh coordinates are voxel coordinates. Vertices
/// emitted for several cubes at the same position are merged. The volume is not padded, so structures touching the
/// volume border yield an open surface there.
pub fn marching_cubes(volume: &Array3<f64>, level: f64) -> Result<TriMesh> {
    let (nx, ny, nz) = volume.dim();
    if nx < 2 || ny < 2 || nz < 2 {
        return Err(TractshapeError::DegenerateVolume(format!(
            "marching cubes needs at least 2x2x2 voxels, volume has {}x{}x{}", nx, ny, nz)));
    }

    let (min, max) = volume.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(level > min && level < max) {
        return Err(TractshapeError::DegenerateVolume(format!(
            "surface level {} is not within the value range ({}, {}) of the volume", level, min, max)));
    }

    // mcubes expects the values with x varying fastest.
    let mut values: Vec<f32> = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                values.push(volume[[x, y, z]] as f32);
            }
        }
    }

    let dims = (nx as f32, ny as f32, nz as f32);
    let mc = MarchingCubes::new((nx, ny, nz), dims, dims, Vec3::new_zero(), values, level as f32)
        .map_err(|e| TractshapeError::DegenerateVolume(format!("marching cubes failed: {}", e)))?;
    let surface = mc.generate(MeshSide::OutsideOnly);

    let mut mesh = TriMesh::default();
    let mut vertex_index: HashMap<[i64; 3], usize> = HashMap::new();
    for &i in surface.indices.iter() {
        let p = &surface.vertices[i].posit;
        let index = *vertex_index.entry(position_key(p.x, p.y, p.z)).or_insert_with(|| {
            mesh.vertices.extend_from_slice(&[f64::from(p.x), f64::from(p.y), f64::from(p.z)]);
            mesh.vertices.len() / 3 - 1
        });
        mesh.faces.push(index);
    }

    debug!("Marching cubes produced {} vertices and {} faces.", mesh.num_vertices(), mesh.num_faces());
    Ok(mesh)
}
