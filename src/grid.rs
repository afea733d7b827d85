//! The reference grid: the voxel lattice of a reference volume that streamlines are rasterized into.

use approx::abs_diff_eq;
use nalgebra::{Matrix4, Point3};
use nifti::NiftiHeader;

use std::path::Path;

use crate::error::{Result, TractshapeError};

/// Determinants with an absolute value below this are treated as zero, i.e., the affine is singular.
const SINGULAR_DETERMINANT_EPSILON: f64 = 1e-12;


/// A 3-D sampling lattice: the number of voxels along each axis plus the affine transform from voxel indices to
/// world (physical) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGrid {
    dims: [usize; 3],
    affine: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl ReferenceGrid {

    /// Create a grid from its dimensions and voxel-to-world affine.
    /// Fails with `InvalidGrid` if a dimension is zero or the affine cannot be inverted.
    pub fn new(dims: [usize; 3], affine: Matrix4<f64>) -> Result<ReferenceGrid> {
        if dims.iter().any(|&d| d == 0) {
            return Err(TractshapeError::InvalidGrid(format!("dimensions must be positive, got {:?}", dims)));
        }
        if !affine.iter().all(|v| v.is_finite()) {
            return Err(TractshapeError::InvalidGrid(String::from("affine contains non-finite values")));
        }
        if abs_diff_eq!(affine.determinant(), 0.0, epsilon = SINGULAR_DETERMINANT_EPSILON) {
            return Err(TractshapeError::InvalidGrid(String::from("affine is singular")));
        }
        let inverse = affine
            .try_inverse()
            .ok_or_else(|| TractshapeError::InvalidGrid(String::from("affine is singular")))?;
        Ok(ReferenceGrid { dims, affine, inverse })
    }


    /// A grid with the given dimensions and an identity affine, i.e., world coordinates are voxel coordinates.
    pub fn with_identity_affine(dims: [usize; 3]) -> Result<ReferenceGrid> {
        ReferenceGrid::new(dims, Matrix4::identity())
    }


    /// Build the grid from a NIfTI header: dimensions `dim[1..4]` and the affine resolved by the header (sform,
    /// qform or pixdim scaling, in that order of preference).
    pub fn from_nifti_header(header: &NiftiHeader) -> Result<ReferenceGrid> {
        if header.dim[0] < 3 {
            return Err(TractshapeError::InvalidGrid(format!("expected at least 3 dimensions, header has {}", header.dim[0])));
        }
        let dims = [header.dim[1] as usize, header.dim[2] as usize, header.dim[3] as usize];
        let nifti_affine = header.affine::<f64>();
        let affine = Matrix4::from_fn(|r, c| nifti_affine[(r, c)]);
        ReferenceGrid::new(dims, affine)
    }


    /// Read the grid from the header of a NIfTI file (`.nii` or `.nii.gz`). The voxel data is not read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ReferenceGrid> {
        let header = NiftiHeader::from_file(path)?;
        ReferenceGrid::from_nifti_header(&header)
    }


    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn num_voxels(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn affine(&self) -> &Matrix4<f64> {
        &self.affine
    }

    pub fn inverse_affine(&self) -> &Matrix4<f64> {
        &self.inverse
    }


    /// Map a world coordinate to continuous voxel coordinates. Voxel centers are at integer coordinates.
    pub fn world_to_voxel(&self, p: &Point3<f64>) -> Point3<f64> {
        self.inverse.transform_point(p)
    }


    /// Map continuous voxel coordinates to a world coordinate.
    pub fn voxel_to_world(&self, v: &Point3<f64>) -> Point3<f64> {
        self.affine.transform_point(v)
    }
}
