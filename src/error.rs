use quick_error::quick_error;
use std::io::Error as IOError;

use nifti::error::NiftiError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum TractshapeError {
        /// Reference grid with a zero dimension or a singular affine.
        InvalidGrid(reason: String) {
            display("Invalid reference grid: {}", reason)
        }

        /// A tract without any streamlines, its mean metrics are undefined.
        EmptyTract {
            display("Tract contains no streamlines")
        }

        /// A metric that ends up in a denominator is zero.
        DegenerateTract(metric: &'static str) {
            display("Degenerate tract: {} is zero", metric)
        }

        /// No isosurface can be extracted from the volume.
        DegenerateVolume(reason: String) {
            display("Degenerate volume: {}", reason)
        }

        /// Right-hand side of a left/right ratio is zero.
        DivisionByZero(metric: String) {
            display("Cannot compute ratio for '{}': right tract value is zero", metric)
        }

        /// A streamline point maps outside of the reference grid.
        StreamlineOutsideGrid(point: [f64; 3], voxel: [f64; 3]) {
            display("Streamline point ({}, {}, {}) maps to voxel ({:.2}, {:.2}, {:.2}) outside of the reference grid",
                point[0], point[1], point[2], voxel[0], voxel[1], voxel[2])
        }

        InvalidTckFormat(reason: String) {
            display("Invalid TCK file: {}", reason)
        }

        UnsupportedTckDatatype(datatype: String) {
            display("Unsupported TCK datatype '{}'", datatype)
        }

        /// Volume (mask, ROI) with an unusable shape or content.
        InvalidVolume(reason: String) {
            display("Invalid volume: {}", reason)
        }

        /// A parameter combination that cannot be processed, e.g., a report without any tract.
        InvalidArgument(reason: String) {
            display("Invalid argument: {}", reason)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }

        Nifti(err: NiftiError) {
            from()
            display("NIfTI error: {}", err)
            source(err)
        }

        Csv(err: csv::Error) {
            from()
            display("CSV error: {}", err)
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, TractshapeError>;
