//! Along-tract profiles: a scalar map (e.g., FA) sampled at equally spaced nodes along the streamlines of a bundle.
//!
//! All streamlines are resampled to the same number of nodes. At each node the values of the streamlines are
//! combined, either as a plain mean or weighted by how close each streamline runs to the core of the bundle (the
//! inverse Mahalanobis distance of its node to the node coordinates of all streamlines).

use approx::abs_diff_eq;
use nalgebra::{Matrix3, Point3, Vector3};
use ndarray::{Array1, Array2, Array3, Axis};
use ndarray_stats::CorrelationExt;
use tracing::{debug, info, warn};

use std::path::Path;

use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;
use crate::nii::read_volume;
use crate::report::write_array_csv;
use crate::tck::read_tck;
use crate::tract::{Streamline, Tract};

pub const DEFAULT_NUM_NODES: usize = 100;

/// Covariances with all entries below this are treated as zero: all streamlines share the node.
const ZERO_COVARIANCE_EPSILON: f64 = 1e-8;

const PSEUDO_INVERSE_EPSILON: f64 = 1e-12;


fn check_num_nodes(num_nodes: usize) -> Result<()> {
    if num_nodes < 2 {
        return Err(TractshapeError::InvalidArgument(format!("number of nodes must be at least 2, got {}", num_nodes)));
    }
    Ok(())
}


/// Resample a streamline to `num_nodes` points, equally spaced along its arc length. The first and last point are
/// kept. A streamline without length (a single point, or all points equal) repeats its first point.
pub fn resample_streamline(streamline: &Streamline, num_nodes: usize) -> Result<Streamline> {
    check_num_nodes(num_nodes)?;
    let points = &streamline.points;
    let first = *streamline.first().ok_or(TractshapeError::DegenerateTract("number of streamline points"))?;

    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in points.windows(2) {
        total += nalgebra::distance(&pair[0], &pair[1]);
        cumulative.push(total);
    }
    if total == 0.0 {
        return Ok(Streamline::new(vec![first; num_nodes]));
    }

    let mut resampled = Vec::with_capacity(num_nodes);
    let mut segment = 0usize;
    for node in 0..num_nodes {
        let target = total * node as f64 / (num_nodes - 1) as f64;
        while segment + 2 < points.len() && cumulative[segment + 1] < target {
            segment += 1;
        }
        let length = cumulative[segment + 1] - cumulative[segment];
        let t = if length > 0.0 { ((target - cumulative[segment]) / length).clamp(0.0, 1.0) } else { 0.0 };
        let p = points[segment] + (points[segment + 1] - points[segment]) * t;
        resampled.push(p);
    }
    Ok(Streamline::new(resampled))
}


/// Resample all non-empty streamlines of the tract to `num_nodes` points. Empty streamlines are dropped.
pub fn resample_tract(tract: &Tract, num_nodes: usize) -> Result<Tract> {
    check_num_nodes(num_nodes)?;
    let num_empty = tract.iter().filter(|s| s.is_empty()).count();
    if num_empty > 0 {
        warn!("Skipping {} empty streamlines.", num_empty);
    }
    let resampled = tract
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| resample_streamline(s, num_nodes))
        .collect::<Result<Tract>>()?;
    if resampled.is_empty() {
        return Err(TractshapeError::EmptyTract);
    }
    Ok(resampled)
}


/// Node weights of a resampled tract, one row per streamline and one column per node. The weights of each node
/// sum to 1.
///
/// A streamline is weighted by the inverse Mahalanobis distance of its node to the mean node of all streamlines.
/// Nodes where all streamlines coincide, and tracts with a single streamline, get equal weights. Streamlines right
/// at the mean share the node weight among them.
pub fn gaussian_weights(resampled: &Tract) -> Result<Array2<f64>> {
    let num_streamlines = resampled.num_streamlines();
    let num_nodes = resampled.streamlines.first().map(|s| s.num_points()).ok_or(TractshapeError::EmptyTract)?;
    if resampled.iter().any(|s| s.num_points() != num_nodes) {
        return Err(TractshapeError::InvalidArgument(String::from("streamlines must be resampled to the same number of nodes")));
    }

    let mut weights = Array2::<f64>::from_elem((num_streamlines, num_nodes), 1.0 / num_streamlines as f64);
    if num_streamlines == 1 {
        return Ok(weights);
    }

    for node in 0..num_nodes {
        let coords = Array2::from_shape_fn((3, num_streamlines), |(d, s)| resampled.streamlines[s].points[node][d]);
        let cov = coords
            .cov(0.0)
            .map_err(|_| TractshapeError::InvalidArgument(String::from("no node coordinates to compute a covariance from")))?;
        if cov.iter().all(|&c| abs_diff_eq!(c, 0.0, epsilon = ZERO_COVARIANCE_EPSILON)) {
            continue;
        }
        let mean = coords.mean_axis(Axis(1)).ok_or(TractshapeError::EmptyTract)?;
        let mean = Vector3::new(mean[0], mean[1], mean[2]);
        let inverse = Matrix3::from_fn(|r, c| cov[[r, c]])
            .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
            .map_err(|e| TractshapeError::InvalidArgument(format!("cannot invert node covariance: {}", e)))?;

        let distances: Vec<f64> = resampled
            .iter()
            .map(|s| {
                let diff = s.points[node].coords - mean;
                diff.dot(&(inverse * diff)).max(0.0).sqrt()
            })
            .collect();

        let num_at_mean = distances.iter().filter(|&&d| d == 0.0).count();
        let mut column = weights.column_mut(node);
        if num_at_mean > 0 {
            for (w, d) in column.iter_mut().zip(distances.iter()) {
                *w = if *d == 0.0 { 1.0 / num_at_mean as f64 } else { 0.0 };
            }
        } else {
            let total: f64 = distances.iter().map(|d| 1.0 / d).sum();
            for (w, d) in column.iter_mut().zip(distances.iter()) {
                *w = (1.0 / d) / total;
            }
        }
    }
    Ok(weights)
}


/// Trilinear interpolation of the volume at continuous voxel coordinates. Voxels outside of the volume count as
/// zero, so the value fades out within one voxel of the border and is 0 beyond.
pub fn sample_trilinear(volume: &Array3<f64>, v: &Point3<f64>) -> f64 {
    let (nx, ny, nz) = volume.dim();
    let dims = [nx as f64, ny as f64, nz as f64];
    if (0..3).any(|d| !v[d].is_finite() || v[d] <= -1.0 || v[d] >= dims[d]) {
        return 0.0;
    }

    let base = [v.x.floor(), v.y.floor(), v.z.floor()];
    let frac = [v.x - base[0], v.y - base[1], v.z - base[2]];
    let value_at = |i: f64, j: f64, k: f64| -> f64 {
        if i < 0.0 || j < 0.0 || k < 0.0 || i >= dims[0] || j >= dims[1] || k >= dims[2] {
            0.0
        } else {
            volume[[i as usize, j as usize, k as usize]]
        }
    };

    let mut value = 0.0;
    for corner in 0..8 {
        let offset = [(corner & 1) as f64, ((corner >> 1) & 1) as f64, ((corner >> 2) & 1) as f64];
        let weight: f64 = (0..3).map(|d| if offset[d] == 1.0 { frac[d] } else { 1.0 - frac[d] }).product();
        if weight != 0.0 {
            value += weight * value_at(base[0] + offset[0], base[1] + offset[1], base[2] + offset[2]);
        }
    }
    value
}


/// The profile of a scalar map along the tract: `num_nodes` values, one per node of the resampled streamlines.
///
/// Streamline points are mapped into the voxel grid of the map with the inverse affine of `grid`, whose dimensions
/// must match those of `data`. With `weighted`, the values at each node are combined using `gaussian_weights`,
/// otherwise their mean is used.
pub fn tract_profile(tract: &Tract, data: &Array3<f64>, grid: &ReferenceGrid, num_nodes: usize, weighted: bool) -> Result<Array1<f64>> {
    let (nx, ny, nz) = data.dim();
    if grid.dims() != [nx, ny, nz] {
        return Err(TractshapeError::InvalidVolume(format!(
            "scalar map has shape {:?}, grid has dimensions {:?}", [nx, ny, nz], grid.dims()
        )));
    }

    let resampled = resample_tract(tract, num_nodes)?;
    let num_streamlines = resampled.num_streamlines();
    let weights = if weighted {
        gaussian_weights(&resampled)?
    } else {
        Array2::from_elem((num_streamlines, num_nodes), 1.0 / num_streamlines as f64)
    };

    let values = Array2::from_shape_fn((num_streamlines, num_nodes), |(s, node)| {
        sample_trilinear(data, &grid.world_to_voxel(&resampled.streamlines[s].points[node]))
    });
    let profile = (&weights * &values).sum_axis(Axis(0));
    debug!("Computed a profile with {} nodes from {} streamlines.", num_nodes, num_streamlines);
    Ok(profile)
}


/// Compute the profile of the scalar map in a NIfTI file along the tract in a track file, and write it to `output`
/// as CSV, one node per line. The affine of the scalar map is used.
pub fn profile_from_files<P, Q, R>(tck: P, scalar_map: Q, output: R, num_nodes: usize, weighted: bool) -> Result<Array1<f64>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let tck = read_tck(tck)?;
    let map = read_volume(scalar_map)?;
    let grid = map.grid()?;
    let profile = tract_profile(&tck.tract, &map.data, &grid, num_nodes, weighted)?;
    write_array_csv(output.as_ref(), &profile.clone().insert_axis(Axis(1)))?;
    info!("Wrote profile with {} nodes to {}.", num_nodes, output.as_ref().display());
    Ok(profile)
}
