//! The CSV report of tract metrics and left/right ratios, and CSV output of numeric arrays.

use csv::WriterBuilder;
use ndarray::Array2;
use tracing::info;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::density::streamline_to_volume;
use crate::error::{Result, TractshapeError};
use crate::grid::ReferenceGrid;
use crate::morphometrics::{calculate_metrics, calculate_ratios, MetricSet, RatioSet, RATIO_SUFFIX};
use crate::tck::read_tck;
use crate::util::{format_float, format_scientific};

pub const DEFAULT_METRICS_OUTPUT: &str = "tract_metrics_output.csv";

/// The header row of the report.
pub const REPORT_COLUMNS: [&str; 4] = ["Metric", "Left Tract", "Right Tract", "Ratio (L/R)"];

/// Written for values that are not available, e.g., ratios when only one tract was processed.
pub const NOT_AVAILABLE: &str = "N/A";


fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format_float(v),
        None => String::from(NOT_AVAILABLE),
    }
}


/// The rows of the report: one per metric found in either tract, left metrics first, followed by those only
/// present for the right tract.
pub fn report_rows(left: Option<&MetricSet>, right: Option<&MetricSet>, ratios: Option<&RatioSet>) -> Vec<[String; 4]> {
    let mut names: Vec<&str> = left.map(|m| m.keys().collect()).unwrap_or_default();
    if let Some(r) = right {
        for name in r.keys() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let ratio_key = format!("{}{}", name, RATIO_SUFFIX);
            [
                name.to_string(),
                format_value(left.and_then(|m| m.get(name))),
                format_value(right.and_then(|m| m.get(name))),
                format_value(ratios.and_then(|m| m.get(&ratio_key))),
            ]
        })
        .collect()
}


/// Write the report to any writer.
pub fn write_metrics<W: Write>(output: W, left: Option<&MetricSet>, right: Option<&MetricSet>, ratios: Option<&RatioSet>) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(output);
    wtr.write_record(REPORT_COLUMNS)?;
    for row in report_rows(left, right, ratios) {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}


/// Write the report to a CSV file.
pub fn write_metrics_csv<P: AsRef<Path>>(path: P, left: Option<&MetricSet>, right: Option<&MetricSet>, ratios: Option<&RatioSet>) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    write_metrics(file, left, right, ratios)?;
    info!("Wrote metrics to {}.", path.as_ref().display());
    Ok(())
}


/// Write a 2-D array as CSV, one row per line, values in exponent form with 18 decimals.
pub fn write_array_csv<P: AsRef<Path>>(path: P, values: &Array2<f64>) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    for row in values.rows() {
        wtr.write_record(row.iter().map(|&v| format_scientific(v, 18)))?;
    }
    wtr.flush()?;
    info!("Wrote {}x{} values to {}.", values.nrows(), values.ncols(), path.as_ref().display());
    Ok(())
}


/// The metrics of the tracts of one report, and their ratios if both tracts were given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TractReport {
    pub left: Option<MetricSet>,
    pub right: Option<MetricSet>,
    pub ratios: Option<RatioSet>,
}


/// Read a tract from a track file, rasterize it into the reference grid and compute its metrics.
pub fn tract_metrics_from_file<P: AsRef<Path>>(path: P, grid: &ReferenceGrid) -> Result<MetricSet> {
    let tck = read_tck(path.as_ref())?;
    info!("Read {} streamlines from {}.", tck.tract.num_streamlines(), path.as_ref().display());
    let volume = streamline_to_volume(&tck.tract, grid)?;
    calculate_metrics(&tck.tract, &volume)
}


/// Compute the metrics of the left and/or right tract in the grid of the reference image, the ratios if both are
/// given, and write the CSV report to `output`.
///
/// The two tracts are processed in parallel. The report is only written if every requested tract was processed
/// successfully. Giving no tract at all is an `InvalidArgument` error.
pub fn compute_report(reference: &Path, left: Option<&Path>, right: Option<&Path>, output: &Path) -> Result<TractReport> {
    if left.is_none() && right.is_none() {
        return Err(TractshapeError::InvalidArgument(String::from("at least one of the left and right tract is required")));
    }
    let grid = ReferenceGrid::from_file(reference)?;

    let (metrics_left, metrics_right) = rayon::join(
        || left.map(|p| tract_metrics_from_file(p, &grid)).transpose(),
        || right.map(|p| tract_metrics_from_file(p, &grid)).transpose(),
    );
    let left = metrics_left?;
    let right = metrics_right?;

    let ratios = match (&left, &right) {
        (Some(l), Some(r)) => Some(calculate_ratios(l, r)?),
        _ => None,
    };

    write_metrics_csv(output, left.as_ref(), right.as_ref(), ratios.as_ref())?;
    Ok(TractReport { left, right, ratios })
}


#[cfg(test)]
mod test {
    use super::*;

    fn render(left: Option<&MetricSet>, right: Option<&MetricSet>, ratios: Option<&RatioSet>) -> String {
        let mut buffer: Vec<u8> = Vec::new();
        write_metrics(&mut buffer, left, right, ratios).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn both_tracts_and_ratios_are_reported() {
        let left: MetricSet = vec![("tract_length", 10.0), ("tract_volume", 32.0)].into_iter().collect();
        let right: MetricSet = vec![("tract_length", 5.0), ("tract_volume", 64.0)].into_iter().collect();
        let ratios: RatioSet = vec![("tract_length_ratio", 2.0), ("tract_volume_ratio", 0.5)].into_iter().collect();

        let expected = "Metric,Left Tract,Right Tract,Ratio (L/R)\n\
                        tract_length,10.0,5.0,2.0\n\
                        tract_volume,32.0,64.0,0.5\n";
        assert_eq!(expected, render(Some(&left), Some(&right), Some(&ratios)));
    }

    #[test]
    fn missing_values_are_not_available() {
        let right: MetricSet = vec![("tract_span", 7.25)].into_iter().collect();
        let expected = "Metric,Left Tract,Right Tract,Ratio (L/R)\n\
                        tract_span,N/A,7.25,N/A\n";
        assert_eq!(expected, render(None, Some(&right), None));
    }

    #[test]
    fn right_only_metrics_follow_the_left_ones() {
        let left: MetricSet = vec![("b", 1.0)].into_iter().collect();
        let right: MetricSet = vec![("a", 2.0), ("b", 3.0)].into_iter().collect();
        let rows = report_rows(Some(&left), Some(&right), None);
        assert_eq!(vec!["b", "a"], rows.iter().map(|r| r[0].as_str()).collect::<Vec<_>>());
        assert_eq!("N/A", rows[1][1]);
    }

    #[test]
    fn a_report_file_can_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_METRICS_OUTPUT);
        let left: MetricSet = vec![("tract_curl", 1.5)].into_iter().collect();
        write_metrics_csv(&path, Some(&left), None, None).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Metric,Left Tract,Right Tract,Ratio (L/R)\n"));
        assert!(content.contains("tract_curl,1.5,N/A,N/A"));
    }

    #[test]
    fn tiny_and_huge_values_use_two_digit_exponents() {
        let left: MetricSet = vec![("tract_volume", 1e16), ("tract_curl", 0.00001)].into_iter().collect();
        let expected = "Metric,Left Tract,Right Tract,Ratio (L/R)\n\
                        tract_volume,1e+16,N/A,N/A\n\
                        tract_curl,1e-05,N/A,N/A\n";
        assert_eq!(expected, render(Some(&left), None, None));
    }

    #[test]
    fn arrays_are_written_row_by_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let values = ndarray::arr2(&[[1.0, 0.0], [0.5, 2.0]]);
        write_array_csv(&path, &values).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            "1.000000000000000000e+00,0.000000000000000000e+00\n5.000000000000000000e-01,2.000000000000000000e+00\n",
            content
        );
    }

    #[test]
    fn a_report_needs_at_least_one_tract() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join(DEFAULT_METRICS_OUTPUT);
        let result = compute_report(&dir.path().join("reference.nii"), None, None, &output);
        assert!(matches!(result, Err(TractshapeError::InvalidArgument(_))));
        assert!(!output.exists());
    }
}
