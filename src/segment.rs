//! Segmentation of a binary tract mask into ordered segments along its principal axis.
//!
//! Each tract voxel is projected onto the segmentation direction, the projections are scaled to `[1, n]` and rounded
//! to the nearest segment, so segment 1 is at one end of the tract and segment n at the other.

use approx::abs_diff_eq;
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use ndarray::{Array1, Array2, Array3, Axis};
use ndarray_stats::{CorrelationExt, QuantileExt};
use tracing::{debug, info};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, TractshapeError};
use crate::nii::{read_volume, write_label_volume};

pub const DEFAULT_NUM_SEGMENTS: usize = 100;
pub const SEGMENTS_FILE_NAME: &str = "segments.nii.gz";


/// The direction along which a mask is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAxis {
    X,
    Y,
    Z,
    /// The major axis of the voxel coordinates, from a principal component analysis.
    Pca,
}

impl FromStr for SegmentAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<SegmentAxis, String> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(SegmentAxis::X),
            "y" => Ok(SegmentAxis::Y),
            "z" => Ok(SegmentAxis::Z),
            "pca" => Ok(SegmentAxis::Pca),
            _ => Err(format!("invalid axis '{}', expected one of x, y, z, pca", s)),
        }
    }
}

impl fmt::Display for SegmentAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SegmentAxis::X => "x",
            SegmentAxis::Y => "y",
            SegmentAxis::Z => "z",
            SegmentAxis::Pca => "pca",
        };
        write!(f, "{}", name)
    }
}


/// The unit eigenvector of the largest eigenvalue of the covariance of the coordinates (one column per point).
/// Its sign is chosen so that its largest component (by magnitude) is positive.
pub fn principal_axis(coords: &Array2<f64>) -> Result<Vector3<f64>> {
    let cov = coords
        .cov(0.0)
        .map_err(|_| TractshapeError::InvalidVolume(String::from("no coordinates to compute a principal axis from")))?;
    let eigen = SymmetricEigen::new(Matrix3::from_fn(|r, c| cov[[r, c]]));
    let major = eigen.eigenvalues.imax();
    let mut direction: Vector3<f64> = eigen.eigenvectors.column(major).into_owned();
    direction.normalize_mut();
    if direction[direction.iamax()] < 0.0 {
        direction = -direction;
    }
    Ok(direction)
}


/// Assign each voxel of the mask with value 1 to one of `num_segments` ordered segments along `axis`.
/// Background voxels are labelled 0.
pub fn divide_mask(mask: &Array3<f64>, num_segments: usize, axis: SegmentAxis) -> Result<Array3<i32>> {
    if num_segments == 0 {
        return Err(TractshapeError::InvalidVolume(String::from("number of segments must be positive")));
    }

    let voxels: Vec<[usize; 3]> = mask
        .indexed_iter()
        .filter(|(_, &v)| abs_diff_eq!(v, 1.0))
        .map(|((i, j, k), _)| [i, j, k])
        .collect();
    if voxels.is_empty() {
        return Err(TractshapeError::InvalidVolume(String::from("mask contains no voxels with value 1")));
    }

    let coords = Array2::from_shape_fn((3, voxels.len()), |(d, i)| voxels[i][d] as f64);
    let centroid = coords
        .mean_axis(Axis(1))
        .ok_or_else(|| TractshapeError::InvalidVolume(String::from("mask contains no voxels with value 1")))?;

    let direction = match axis {
        SegmentAxis::X => Vector3::x(),
        SegmentAxis::Y => Vector3::y(),
        SegmentAxis::Z => Vector3::z(),
        SegmentAxis::Pca => principal_axis(&coords)?,
    };
    debug!("Segmenting {} voxels along direction ({:.3}, {:.3}, {:.3}).", voxels.len(), direction.x, direction.y, direction.z);

    let projections: Array1<f64> = coords
        .axis_iter(Axis(1))
        .map(|c| (0..3).map(|d| (c[d] - centroid[d]) * direction[d]).sum::<f64>())
        .collect();
    let invalid = |_| TractshapeError::InvalidVolume(String::from("projections onto the segmentation axis are undefined"));
    let min = *projections.min().map_err(invalid)?;
    let max = *projections.max().map_err(invalid)?;
    let extent = max - min;
    if extent == 0.0 {
        return Err(TractshapeError::InvalidVolume(format!("mask has no extent along the {} axis", axis)));
    }

    let mut labels = Array3::<i32>::zeros(mask.raw_dim());
    for (voxel, projection) in voxels.iter().zip(projections.iter()) {
        let scaled = 1.0 + (num_segments - 1) as f64 * (projection - min) / extent;
        labels[*voxel] = scaled.round_ties_even() as i32;
    }
    Ok(labels)
}


/// Segment the mask stored in a NIfTI file and write the label volume to `SEGMENTS_FILE_NAME` in the output
/// directory. Returns the path of the written file.
pub fn segment_mask_file<P, Q>(input: P, output_dir: Q, num_segments: usize, axis: SegmentAxis) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mask = read_volume(input)?;
    let labels = divide_mask(&mask.data, num_segments, axis)?;
    let output = output_dir.as_ref().join(SEGMENTS_FILE_NAME);
    write_label_volume(&output, &mask.header, &labels)?;
    info!("Wrote {} segments to {}.", num_segments, output.display());
    Ok(output)
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn bar_along_y(length: usize) -> Array3<f64> {
        let mut mask = Array3::zeros((4, length + 2, 4));
        for y in 1..=length {
            for x in 1..=2 {
                for z in 1..=2 {
                    mask[[x, y, z]] = 1.0;
                }
            }
        }
        mask
    }

    #[test]
    fn axis_names_are_parsed() {
        assert_eq!(Ok(SegmentAxis::Pca), "PCA".parse::<SegmentAxis>());
        assert_eq!(Ok(SegmentAxis::Z), "z".parse::<SegmentAxis>());
        assert!("w".parse::<SegmentAxis>().is_err());
    }

    #[test]
    fn the_principal_axis_of_a_bar_is_its_long_axis() {
        let coords = Array2::from_shape_fn((3, 10), |(d, i)| if d == 1 { -(i as f64) } else { (i % 2) as f64 * 0.1 });
        let direction = principal_axis(&coords).unwrap();
        assert!(direction.y > 0.99);
        assert_relative_eq!(1.0, direction.norm(), epsilon = 1e-12);
    }

    #[test]
    fn a_bar_is_segmented_from_end_to_end() {
        let mask = bar_along_y(8);
        for axis in [SegmentAxis::Y, SegmentAxis::Pca] {
            let labels = divide_mask(&mask, 8, axis).unwrap();
            for y in 1..=8 {
                assert_eq!(y as i32, labels[[1, y, 1]]);
                assert_eq!(y as i32, labels[[2, y, 2]]);
            }
            assert_eq!(0, labels[[0, 0, 0]]);
            assert_eq!(0, labels[[3, 4, 3]]);
        }
    }

    #[test]
    fn segment_indices_round_half_to_even() {
        let mut mask = Array3::zeros((3, 5, 3));
        for y in 0..5 {
            mask[[1, y, 1]] = 1.0;
        }
        let labels = divide_mask(&mask, 3, SegmentAxis::Y).unwrap();
        let along: Vec<i32> = (0..5).map(|y| labels[[1, y, 1]]).collect();
        assert_eq!(vec![1, 2, 2, 2, 3], along);
    }

    #[test]
    fn unusable_masks_are_rejected() {
        let empty = Array3::<f64>::zeros((3, 3, 3));
        assert!(matches!(divide_mask(&empty, 10, SegmentAxis::Pca), Err(TractshapeError::InvalidVolume(_))));

        let bar = bar_along_y(5);
        assert!(matches!(divide_mask(&bar, 0, SegmentAxis::Y), Err(TractshapeError::InvalidVolume(_))));

        let mut line = Array3::<f64>::zeros((3, 6, 3));
        for y in 0..6 {
            line[[1, y, 1]] = 1.0;
        }
        assert!(matches!(divide_mask(&line, 10, SegmentAxis::X), Err(TractshapeError::InvalidVolume(_))));
    }

    #[test]
    fn only_voxels_with_value_one_are_segmented() {
        let mut mask = bar_along_y(4);
        mask[[1, 1, 1]] = 2.0;
        let labels = divide_mask(&mask, 4, SegmentAxis::Y).unwrap();
        assert_eq!(0, labels[[1, 1, 1]]);
        assert_eq!(1, labels[[2, 1, 2]]);
    }
}
