//! Reading and writing of 3-D NIfTI volumes such as masks, ROIs and segment label maps.

use nalgebra::Matrix4;
use ndarray::{Array3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use tracing::debug;

use std::path::Path;

use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;


/// A 3-D scalar volume together with the header it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiVolume {
    pub header: NiftiHeader,
    pub data: Array3<f64>,
}

impl NiftiVolume {

    /// Read a NIfTI file (`.nii` or `.nii.gz`). 4-D files are accepted if they hold a single frame.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiVolume> {
        let obj = ReaderOptions::new().read_file(path)?;
        let header = obj.header().clone();
        let data = obj.into_volume().into_ndarray::<f64>()?;

        let data = match data.ndim() {
            3 => data,
            4 if data.shape()[3] == 1 => data.index_axis_move(Axis(3), 0),
            _ => return Err(TractshapeError::InvalidVolume(format!("expected a 3-D volume, got shape {:?}", data.shape()))),
        };
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|e| TractshapeError::InvalidVolume(e.to_string()))?;
        debug!("Read volume with shape {:?}.", data.shape());
        Ok(NiftiVolume { header, data })
    }

    /// The voxel grid of this volume.
    pub fn grid(&self) -> Result<ReferenceGrid> {
        let (nx, ny, nz) = self.data.dim();
        let affine = self.header.affine::<f64>();
        ReferenceGrid::new([nx, ny, nz], Matrix4::from_fn(|r, c| affine[(r, c)]))
    }

    /// Indices of all voxels with a non-zero value, in row-major (C) order.
    pub fn nonzero_voxels(&self) -> Vec<[usize; 3]> {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v != 0.0)
            .map(|((i, j, k), _)| [i, j, k])
            .collect()
    }
}


/// Read a 3-D NIfTI volume.
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<NiftiVolume> {
    NiftiVolume::from_file(path)
}


/// Write an integer label volume, copying the spatial information (e.g., the affine) from the reference header.
pub fn write_label_volume<P: AsRef<Path>>(path: P, reference: &NiftiHeader, labels: &Array3<i32>) -> Result<()> {
    let mut header = reference.clone();
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    WriterOptions::new(path.as_ref())
        .reference_header(&header)
        .write_nifti(labels)?;
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    fn reference_header() -> NiftiHeader {
        NiftiHeader {
            pixdim: [1.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            sform_code: 1,
            srow_x: [2.0, 0.0, 0.0, -4.0],
            srow_y: [0.0, 2.0, 0.0, -4.0],
            srow_z: [0.0, 0.0, 2.0, -4.0],
            ..Default::default()
        }
    }

    #[test]
    fn a_written_label_volume_can_be_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.nii.gz");

        let mut labels = Array3::<i32>::zeros((4, 5, 6));
        labels[[1, 2, 3]] = 7;
        labels[[3, 4, 5]] = 2;
        write_label_volume(&path, &reference_header(), &labels).unwrap();

        let volume = read_volume(&path).unwrap();
        assert_eq!((4, 5, 6), volume.data.dim());
        assert_eq!(7.0, volume.data[[1, 2, 3]]);
        assert_eq!(vec![[1, 2, 3], [3, 4, 5]], volume.nonzero_voxels());

        let grid = volume.grid().unwrap();
        assert_eq!([4, 5, 6], grid.dims());
        assert_eq!(2.0, grid.affine()[(0, 0)]);
        assert_eq!(-4.0, grid.affine()[(2, 3)]);
    }
}
