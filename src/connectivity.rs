//! Structural connectivity of a bundle: which pairs of parcellation labels its streamlines connect.

use ndarray::{Array2, Array3};
use tracing::{debug, info, warn};

use std::path::Path;

use crate::density::voxel_index;
use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;
use crate::nii::{read_volume, NiftiVolume};
use crate::report::write_array_csv;
use crate::tck::read_tck;
use crate::tract::Tract;

/// Streamline counts between pairs of labels, indexed by label.
pub type ConnectivityMatrix = Array2<u32>;


/// The labels of a parcellation volume as indices. Fractional labels are truncated, negative or non-finite values
/// are an error.
pub fn label_volume(volume: &NiftiVolume) -> Result<Array3<usize>> {
    if let Some(bad) = volume.data.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(TractshapeError::InvalidVolume(format!("labels must be non-negative, found {}", bad)));
    }
    Ok(volume.data.mapv(|v| v.trunc() as usize))
}


/// Count the streamlines connecting each pair of labels, by the labels of the voxels of their first and last point.
///
/// The matrix has one row and column per label from 0 to the largest label in the volume and is symmetric. A
/// streamline with both ends in the same label is counted once on the diagonal. Empty streamlines are skipped,
/// end points outside of the grid are an error.
pub fn connectivity_matrix(tract: &Tract, grid: &ReferenceGrid, labels: &Array3<usize>) -> Result<ConnectivityMatrix> {
    let (nx, ny, nz) = labels.dim();
    if grid.dims() != [nx, ny, nz] {
        return Err(TractshapeError::InvalidVolume(format!(
            "label volume has shape {:?}, grid has dimensions {:?}", [nx, ny, nz], grid.dims()
        )));
    }
    let size = labels.iter().copied().max().unwrap_or(0) + 1;
    let mut matrix = ConnectivityMatrix::zeros((size, size));

    let mut num_empty = 0usize;
    for streamline in tract.iter() {
        let (first, last) = match (streamline.first(), streamline.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                num_empty += 1;
                continue;
            }
        };
        let a = labels[voxel_index(grid, first)?];
        let b = labels[voxel_index(grid, last)?];
        matrix[[a.min(b), a.max(b)]] += 1;
    }
    if num_empty > 0 {
        warn!("Skipped {} empty streamlines.", num_empty);
    }

    for row in 0..size {
        for col in (row + 1)..size {
            matrix[[col, row]] = matrix[[row, col]];
        }
    }
    debug!("Counted connections of {} streamlines between {} labels.", tract.num_streamlines() - num_empty, size);
    Ok(matrix)
}


/// Zero the first row and column, i.e., the connections to the background label 0.
pub fn clear_background(matrix: &mut ConnectivityMatrix) {
    matrix.row_mut(0).fill(0);
    matrix.column_mut(0).fill(0);
}


/// Compute the connectivity of the tract in a track file over the parcellation in a NIfTI file, clear the
/// background connections and write the matrix to `output` as CSV. The affine of the parcellation is used.
pub fn connectivity_from_files<P, Q, R>(tck: P, parcellation: Q, output: R) -> Result<ConnectivityMatrix>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let tck = read_tck(tck)?;
    let parcellation = read_volume(parcellation)?;
    let grid = parcellation.grid()?;
    let labels = label_volume(&parcellation)?;

    let mut matrix = connectivity_matrix(&tck.tract, &grid, &labels)?;
    clear_background(&mut matrix);
    write_array_csv(output.as_ref(), &matrix.mapv(f64::from))?;
    info!("Wrote {}x{} connectivity matrix to {}.", matrix.nrows(), matrix.ncols(), output.as_ref().display());
    Ok(matrix)
}
