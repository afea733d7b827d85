//! Consistent orientation of the streamlines of a bundle, using a start and an end region of interest.

use nalgebra::Point3;
use tracing::debug;

use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;
use crate::nii::NiftiVolume;
use crate::tract::{Streamline, Tract};


/// World coordinates of the non-zero voxels of a ROI volume, in row-major (C) order. Voxel indices are mapped with
/// the affine of the reference grid, not the one in the ROI header.
pub fn roi_world_coordinates(grid: &ReferenceGrid, roi: &NiftiVolume) -> Vec<Point3<f64>> {
    roi.nonzero_voxels()
        .iter()
        .map(|[i, j, k]| grid.voxel_to_world(&Point3::new(*i as f64, *j as f64, *k as f64)))
        .collect()
}


/// Index of the first point of the streamline with the smallest distance to `target`.
fn closest_point_index(streamline: &Streamline, target: &Point3<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, p) in streamline.points.iter().enumerate() {
        let d = nalgebra::distance(p, target);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((index, d)),
        }
    }
    best.map(|(index, _)| index)
}


fn first_roi_point(grid: &ReferenceGrid, roi: &NiftiVolume, name: &str) -> Result<Point3<f64>> {
    roi_world_coordinates(grid, roi)
        .into_iter()
        .next()
        .ok_or_else(|| TractshapeError::InvalidVolume(format!("{} ROI contains no non-zero voxels", name)))
}


/// Flip streamlines so that they run from the start ROI to the end ROI.
///
/// A streamline is reversed if its point closest to the start ROI comes after its point closest to the end ROI.
/// The ROI voxels are placed in world space with the affine of `grid`, usually the grid of the image the tract was
/// reconstructed in. Empty streamlines are kept unchanged.
pub fn orient_by_rois(tract: &Tract, grid: &ReferenceGrid, roi_start: &NiftiVolume, roi_end: &NiftiVolume) -> Result<Tract> {
    let start = first_roi_point(grid, roi_start, "start")?;
    let end = first_roi_point(grid, roi_end, "end")?;

    let mut num_flipped = 0usize;
    let oriented: Tract = tract
        .iter()
        .map(|streamline| match (closest_point_index(streamline, &start), closest_point_index(streamline, &end)) {
            (Some(s), Some(e)) if s > e => {
                num_flipped += 1;
                streamline.reversed()
            }
            _ => streamline.clone(),
        })
        .collect();
    debug!("Reversed {} of {} streamlines.", num_flipped, tract.num_streamlines());
    Ok(oriented)
}


#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Matrix4;
    use ndarray::Array3;
    use nifti::NiftiHeader;

    fn roi(voxel: [usize; 3]) -> NiftiVolume {
        let mut data = Array3::zeros((10, 4, 4));
        data[voxel] = 1.0;
        let header = NiftiHeader {
            sform_code: 1,
            srow_x: [1.0, 0.0, 0.0, 0.0],
            srow_y: [0.0, 1.0, 0.0, 0.0],
            srow_z: [0.0, 0.0, 1.0, 0.0],
            ..Default::default()
        };
        NiftiVolume { header, data }
    }

    fn grid() -> ReferenceGrid {
        ReferenceGrid::with_identity_affine([10, 4, 4]).unwrap()
    }

    fn along_x(from: f64, to: f64) -> Streamline {
        let step = if to > from { 1.0 } else { -1.0 };
        let n = ((to - from).abs() as usize) + 1;
        Streamline::from((0..n).map(|i| [from + step * i as f64, 1.0, 1.0]).collect::<Vec<_>>())
    }

    #[test]
    fn streamlines_are_flipped_to_run_from_start_to_end() {
        let tract = Tract::new(vec![along_x(0.0, 9.0), along_x(9.0, 0.0), Streamline::default()]);
        let oriented = orient_by_rois(&tract, &grid(), &roi([1, 1, 1]), &roi([8, 1, 1])).unwrap();

        assert_eq!(3, oriented.num_streamlines());
        for streamline in oriented.streamlines.iter().take(2) {
            assert_eq!(0.0, streamline.first().unwrap().x);
            assert_eq!(9.0, streamline.last().unwrap().x);
        }
        assert!(oriented.streamlines[2].is_empty());
    }

    #[test]
    fn streamlines_reaching_both_rois_at_the_same_point_are_kept() {
        let tract = Tract::new(vec![Streamline::from(vec![[5.0, 1.0, 1.0], [5.0, 2.0, 1.0]])]);
        let oriented = orient_by_rois(&tract, &grid(), &roi([1, 1, 1]), &roi([8, 1, 1])).unwrap();
        assert_eq!(tract, oriented);
    }

    #[test]
    fn an_empty_roi_is_an_error() {
        let mut empty = roi([0, 0, 0]);
        empty.data.fill(0.0);
        let tract = Tract::new(vec![along_x(0.0, 9.0)]);
        assert!(matches!(orient_by_rois(&tract, &grid(), &empty, &roi([8, 1, 1])), Err(TractshapeError::InvalidVolume(_))));
    }

    #[test]
    fn roi_voxels_are_placed_with_the_reference_affine() {
        let shifted = ReferenceGrid::new(
            [10, 4, 4],
            Matrix4::new(
                -1.0, 0.0, 0.0, 9.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        )
        .unwrap();
        assert_eq!(vec![Point3::new(8.0, 1.0, 1.0)], roi_world_coordinates(&shifted, &roi([1, 1, 1])));

        let tract = Tract::new(vec![along_x(0.0, 9.0)]);
        let oriented = orient_by_rois(&tract, &shifted, &roi([1, 1, 1]), &roi([8, 1, 1])).unwrap();
        assert_eq!(9.0, oriented.streamlines[0].first().unwrap().x);
        assert_eq!(0.0, oriented.streamlines[0].last().unwrap().x);
    }
}
