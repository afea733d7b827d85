//! Shape analysis of white matter tracts reconstructed by fiber tractography.
//!
//! The focus of this package is on bundle morphometry: tracts read from MRtrix track files (`.tck`) are rasterized
//! into the voxel grid of a reference NIfTI image, and shape descriptors like length, span, diameter, volume and
//! surface area are computed for them. Left/right ratios, segmentation of tract masks along their main axis,
//! consistent orientation of streamlines, profiles of scalar maps along a bundle and connectivity matrices over a
//! parcellation are supported as well.

pub mod connectivity;
pub mod density;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod morphometrics;
pub mod nii;
pub mod orient;
pub mod profile;
pub mod report;
pub mod segment;
pub mod tck;
pub mod tract;
pub mod util;

pub use connectivity::{clear_background, connectivity_from_files, connectivity_matrix, label_volume, ConnectivityMatrix};
pub use density::{density_map, streamline_to_volume, voxel_count, BinaryVolume, DensityMap, DENSITY_THRESHOLD};
pub use error::{Result, TractshapeError};
pub use grid::ReferenceGrid;
pub use mesh::{marching_cubes, TriMesh, SURFACE_LEVEL};
pub use morphometrics::{
    calculate_metrics, calculate_ratios, stream_length, stream_span, tract_diameter, tract_length, tract_span,
    tract_surface_area, MetricSet, RatioSet, METRIC_NAMES,
};
pub use nii::{read_volume, write_label_volume, NiftiVolume};
pub use orient::{orient_by_rois, roi_world_coordinates};
pub use profile::{
    gaussian_weights, profile_from_files, resample_streamline, resample_tract, sample_trilinear, tract_profile,
    DEFAULT_NUM_NODES,
};
pub use report::{
    compute_report, tract_metrics_from_file, write_array_csv, write_metrics, write_metrics_csv, TractReport,
    DEFAULT_METRICS_OUTPUT,
};
pub use segment::{divide_mask, segment_mask_file, SegmentAxis, DEFAULT_NUM_SEGMENTS, SEGMENTS_FILE_NAME};
pub use tck::{read_tck, write_tck, TckDatatype, TckFile, TckHeader};
pub use tract::{Streamline, Tract};
