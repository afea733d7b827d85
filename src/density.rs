//! Rasterization of streamlines into voxel volumes.

use ndarray::Array3;
use nalgebra::Point3;
use tracing::debug;

use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;
use crate::tract::Tract;

/// Voxels with a streamline density above this value are part of the binary tract volume.
pub const DENSITY_THRESHOLD: f64 = 0.5;

/// Per-voxel number of streamlines passing through the voxel.
pub type DensityMap = Array3<u32>;

/// A 3-D occupancy volume with values 0 and 1.
pub type BinaryVolume = Array3<u8>;


/// Map a world coordinate to the index of the voxel whose center is nearest. Coordinates that map to a negative
/// index (after rounding to 6 decimals) or beyond the grid dimensions are an error.
pub fn voxel_index(grid: &ReferenceGrid, p: &Point3<f64>) -> Result<[usize; 3]> {
    let v = grid.world_to_voxel(p);
    let dims = grid.dims();
    let outside = || TractshapeError::StreamlineOutsideGrid([p.x, p.y, p.z], [v.x, v.y, v.z]);

    let mut index = [0usize; 3];
    for axis in 0..3 {
        let shifted = v[axis] + 0.5;
        if !shifted.is_finite() || (shifted * 1e6).round() / 1e6 < 0.0 {
            return Err(outside());
        }
        let i = shifted.trunc() as usize;
        if i >= dims[axis] {
            return Err(outside());
        }
        index[axis] = i;
    }
    Ok(index)
}


/// Count, for every voxel of the grid, the streamlines of the tract that have at least one point in the voxel.
pub fn density_map(tract: &Tract, grid: &ReferenceGrid) -> Result<DensityMap> {
    let [nx, ny, nz] = grid.dims();
    let mut counts: DensityMap = Array3::zeros((nx, ny, nz));

    let mut visited: Vec<[usize; 3]> = Vec::new();
    for streamline in tract.iter() {
        visited.clear();
        for p in streamline.points.iter() {
            visited.push(voxel_index(grid, p)?);
        }
        visited.sort_unstable();
        visited.dedup();
        for index in visited.iter() {
            counts[*index] += 1;
        }
    }
    Ok(counts)
}


/// Rasterize the tract into the reference grid and binarize the density at `DENSITY_THRESHOLD`.
pub fn streamline_to_volume(tract: &Tract, grid: &ReferenceGrid) -> Result<BinaryVolume> {
    let density = density_map(tract, grid)?;
    let volume = density.mapv(|count| if f64::from(count) > DENSITY_THRESHOLD { 1u8 } else { 0u8 });
    debug!("Rasterized {} streamlines into {} of {} voxels.", tract.num_streamlines(), voxel_count(&volume), grid.num_voxels());
    Ok(volume)
}


/// The number of occupied (non-zero) voxels.
pub fn voxel_count(volume: &BinaryVolume) -> usize {
    volume.iter().filter(|&&v| v != 0).count()
}
