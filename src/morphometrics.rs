//! Shape descriptors of tracts, following the bundle morphometry of Yeh (2020),
//! https://doi.org/10.1016/j.neuroimage.2020.117329 (table 1).
//!
//! Lengths and spans are in world units (usually mm). The volume is a voxel count and the surface area is measured on
//! a marching cubes mesh in voxel units, so both depend on the resolution of the reference grid.

use nalgebra::distance;
use tracing::{debug, warn};

use std::f64::consts::PI;
use std::fmt;

use crate::density::{voxel_count, BinaryVolume};
use crate::error::{Result, TractshapeError};
use crate::mesh::{marching_cubes, SURFACE_LEVEL};
use crate::tract::{Streamline, Tract};
use crate::util::mean;

pub const TRACT_LENGTH: &str = "tract_length";
pub const TRACT_SPAN: &str = "tract_span";
pub const TRACT_CURL: &str = "tract_curl";
pub const TRACT_DIAMETER: &str = "tract_diameter";
pub const TRACT_ELONGATION: &str = "tract_elongation";
pub const TRACT_VOLUME: &str = "tract_volume";
pub const TRACT_SURFACE_AREA: &str = "tract_surface_area";
pub const TRACT_IRREGULARITY: &str = "tract_irregularity";

/// The metrics computed by `calculate_metrics`, in output order.
pub const METRIC_NAMES: [&str; 8] = [
    TRACT_LENGTH, TRACT_SPAN, TRACT_CURL, TRACT_DIAMETER,
    TRACT_ELONGATION, TRACT_VOLUME, TRACT_SURFACE_AREA, TRACT_IRREGULARITY,
];

/// Key suffix of left/right ratios.
pub const RATIO_SUFFIX: &str = "_ratio";


/// Named metric values, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSet {
    entries: Vec<(String, f64)>,
}

/// Left/right ratios, keyed `<metric>_ratio`.
pub type RatioSet = MetricSet;

impl MetricSet {

    pub fn new() -> MetricSet {
        MetricSet { entries: Vec::new() }
    }

    /// Set the value of a metric. An existing metric keeps its position.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A new set with `suffix` appended to every key.
    pub fn with_suffix(&self, suffix: &str) -> MetricSet {
        self.iter().map(|(k, v)| (format!("{}{}", k, suffix), v)).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> MetricSet {
        let mut set = MetricSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (k, v)) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}


/// The length of a single streamline: the sum of the distances between consecutive points.
/// Streamlines with less than 2 points have length 0.
pub fn stream_length(stream: &Streamline) -> f64 {
    stream.points.windows(2).fold(0.0, |sum, w| sum + distance(&w[0], &w[1]))
}


/// The distance between the first and the last point of a streamline, 0 for an empty streamline.
pub fn stream_span(stream: &Streamline) -> f64 {
    match (stream.first(), stream.last()) {
        (Some(first), Some(last)) => distance(first, last),
        _ => 0.0,
    }
}


/// The mean length of the streamlines of the tract.
pub fn tract_length(tract: &Tract) -> Result<f64> {
    mean(tract.iter().map(stream_length)).ok_or(TractshapeError::EmptyTract)
}


/// The mean distance between the end points of the streamlines of the tract.
pub fn tract_span(tract: &Tract) -> Result<f64> {
    let num_empty = tract.iter().filter(|s| s.is_empty()).count();
    if num_empty > 0 {
        warn!("Tract contains {} empty streamlines, they count with a span of 0.", num_empty);
    }
    mean(tract.iter().map(stream_span)).ok_or(TractshapeError::EmptyTract)
}


/// Diameter of a cylinder with the given volume and length.
fn cylinder_diameter(volume: f64, length: f64) -> Result<f64> {
    if length == 0.0 {
        return Err(TractshapeError::DegenerateTract(TRACT_LENGTH));
    }
    Ok(2.0 * (volume / (PI * length)).sqrt())
}


/// The diameter of the tract, modelled as a cylinder of the tract length with the volume of the binary tract volume.
pub fn tract_diameter(tract: &Tract, volume: &BinaryVolume) -> Result<f64> {
    cylinder_diameter(voxel_count(volume) as f64, tract_length(tract)?)
}


/// The area of the marching cubes surface mesh of the binary tract volume.
pub fn tract_surface_area(volume: &BinaryVolume) -> Result<f64> {
    let mesh = marching_cubes(&volume.mapv(f64::from), SURFACE_LEVEL)?;
    Ok(mesh.surface_area())
}


/// `numerator / denominator`, or a `DegenerateTract` error naming the denominator if it is zero.
fn checked_ratio(numerator: f64, denominator: f64, denominator_name: &'static str) -> Result<f64> {
    if denominator == 0.0 {
        Err(TractshapeError::DegenerateTract(denominator_name))
    } else {
        Ok(numerator / denominator)
    }
}


/// Compute all shape metrics of a tract and its binary volume.
///
/// Either all metrics are computed, or the first error is returned:
/// `EmptyTract` for a tract without streamlines, `DegenerateTract` if the span, length or diameter of the tract is
/// zero, and `DegenerateVolume` if no surface can be extracted from the volume.
pub fn calculate_metrics(tract: &Tract, volume: &BinaryVolume) -> Result<MetricSet> {
    let length = tract_length(tract)?;
    let span = tract_span(tract)?;
    let curl = checked_ratio(length, span, TRACT_SPAN)?;
    let volume_metric = voxel_count(volume) as f64;
    let diameter = cylinder_diameter(volume_metric, length)?;
    let elongation = checked_ratio(length, diameter, TRACT_DIAMETER)?;
    let surface_area = tract_surface_area(volume)?;
    let irregularity = checked_ratio(surface_area, PI * diameter * length, TRACT_DIAMETER)?;

    debug!("Tract with {} streamlines: length {:.3}, span {:.3}, {} voxels.", tract.num_streamlines(), length, span, volume_metric);

    let mut metrics = MetricSet::new();
    metrics.insert(TRACT_LENGTH, length);
    metrics.insert(TRACT_SPAN, span);
    metrics.insert(TRACT_CURL, curl);
    metrics.insert(TRACT_DIAMETER, diameter);
    metrics.insert(TRACT_ELONGATION, elongation);
    metrics.insert(TRACT_VOLUME, volume_metric);
    metrics.insert(TRACT_SURFACE_AREA, surface_area);
    metrics.insert(TRACT_IRREGULARITY, irregularity);
    Ok(metrics)
}


/// The left/right ratio of every metric present in both sets, keyed `<metric>_ratio`.
/// Metrics present in only one of the sets are skipped. A zero right value is a `DivisionByZero` error.
pub fn calculate_ratios(metrics_left: &MetricSet, metrics_right: &MetricSet) -> Result<RatioSet> {
    let mut ratios = RatioSet::new();
    for (key, left) in metrics_left.iter() {
        if let Some(right) = metrics_right.get(key) {
            if right == 0.0 {
                return Err(TractshapeError::DivisionByZero(key.to_string()));
            }
            ratios.insert(format!("{}{}", key, RATIO_SUFFIX), left / right);
        }
    }
    Ok(ratios)
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn straight_tract(length: f64, count: usize) -> Tract {
        (0..count)
            .map(|i| Streamline::from(vec![[0.0, i as f64, 0.0], [length / 2.0, i as f64, 0.0], [length, i as f64, 0.0]]))
            .collect()
    }

    fn filled_cube(n: usize) -> BinaryVolume {
        let mut volume = Array3::zeros((n + 2, n + 2, n + 2));
        volume.slice_mut(ndarray::s![1..=n, 1..=n, 1..=n]).fill(1u8);
        volume
    }

    #[test]
    fn short_streamlines_have_zero_length() {
        assert_eq!(0.0, stream_length(&Streamline::default()));
        assert_eq!(0.0, stream_length(&Streamline::from(vec![[1.0, 2.0, 3.0]])));
        assert_eq!(0.0, stream_span(&Streamline::default()));
    }

    #[test]
    fn a_straight_segment_has_curl_one() {
        let tract = Tract::new(vec![Streamline::from(vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]])]);
        assert_eq!(10.0, stream_length(&tract.streamlines[0]));
        assert_eq!(10.0, tract_length(&tract).unwrap());
        assert_eq!(10.0, tract_span(&tract).unwrap());
        assert_eq!(1.0, tract_length(&tract).unwrap() / tract_span(&tract).unwrap());
    }

    #[test]
    fn a_bent_streamline_is_longer_than_its_span() {
        let bent = Streamline::from(vec![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0], [6.0, 0.0, 0.0]]);
        assert_relative_eq!(10.0, stream_length(&bent));
        assert_relative_eq!(6.0, stream_span(&bent));
    }

    #[test]
    fn tract_means_are_over_streamlines() {
        let tract = Tract::new(vec![
            Streamline::from(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]),
            Streamline::from(vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 3.0, 0.0]]),
        ]);
        assert_relative_eq!(4.5, tract_length(&tract).unwrap());
        assert_relative_eq!(3.5, tract_span(&tract).unwrap());
    }

    #[test]
    fn empty_tracts_are_an_error() {
        assert!(matches!(tract_length(&Tract::default()), Err(TractshapeError::EmptyTract)));
        assert!(matches!(tract_span(&Tract::default()), Err(TractshapeError::EmptyTract)));
        assert!(matches!(calculate_metrics(&Tract::default(), &filled_cube(2)), Err(TractshapeError::EmptyTract)));
    }

    #[test]
    fn the_diameter_of_a_filled_cube_follows_the_cylinder_model() {
        for n in 1..5usize {
            let length = 7.5;
            let diameter = tract_diameter(&straight_tract(length, 3), &filled_cube(n)).unwrap();
            let expected = 2.0 * ((n * n * n) as f64 / (PI * length)).sqrt();
            assert_relative_eq!(expected, diameter, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_length_tracts_are_degenerate() {
        let point_tract = Tract::new(vec![Streamline::from(vec![[1.0, 1.0, 1.0]])]);
        assert!(matches!(tract_diameter(&point_tract, &filled_cube(2)), Err(TractshapeError::DegenerateTract(TRACT_LENGTH))));
        assert!(matches!(calculate_metrics(&point_tract, &filled_cube(2)), Err(TractshapeError::DegenerateTract(TRACT_SPAN))));
    }

    #[test]
    fn a_loop_with_zero_span_is_degenerate() {
        let tract = Tract::new(vec![Streamline::from(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]])]);
        assert!(matches!(calculate_metrics(&tract, &filled_cube(2)), Err(TractshapeError::DegenerateTract(TRACT_SPAN))));
    }

    #[test]
    fn an_empty_volume_is_degenerate() {
        let empty: BinaryVolume = Array3::zeros((4, 4, 4));
        let result = calculate_metrics(&straight_tract(5.0, 2), &empty);
        assert!(matches!(result, Err(TractshapeError::DegenerateTract(TRACT_DIAMETER))));
        assert!(matches!(tract_surface_area(&empty), Err(TractshapeError::DegenerateVolume(_))));
    }

    #[test]
    fn metrics_of_a_straight_tract_and_a_cube() {
        let metrics = calculate_metrics(&straight_tract(10.0, 4), &filled_cube(2)).unwrap();
        assert_eq!(METRIC_NAMES.to_vec(), metrics.keys().collect::<Vec<_>>());

        let diameter = 2.0 * (8.0 / (PI * 10.0)).sqrt();
        let area = 6.0 + 6.0 * 2f64.sqrt() + 3f64.sqrt();
        assert_eq!(Some(1.0), metrics.get(TRACT_CURL));
        assert_eq!(Some(8.0), metrics.get(TRACT_VOLUME));
        assert_relative_eq!(diameter, metrics.get(TRACT_DIAMETER).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(10.0 / diameter, metrics.get(TRACT_ELONGATION).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(area, metrics.get(TRACT_SURFACE_AREA).unwrap(), epsilon = 1e-4);
        assert_relative_eq!(area / (PI * diameter * 10.0), metrics.get(TRACT_IRREGULARITY).unwrap(), epsilon = 1e-4);
    }

    #[test]
    fn calculating_metrics_is_idempotent() {
        let tract = straight_tract(12.0, 5);
        let volume = filled_cube(3);
        let first = calculate_metrics(&tract, &volume).unwrap();
        let second = calculate_metrics(&tract, &volume).unwrap();
        let bits = |m: &MetricSet| m.iter().map(|(k, v)| (k.to_string(), v.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn ratios_are_computed_for_shared_keys() {
        let left: MetricSet = vec![("a", 10.0), ("b", 4.0)].into_iter().collect();
        let right: MetricSet = vec![("a", 5.0), ("b", 2.0)].into_iter().collect();
        let ratios = calculate_ratios(&left, &right).unwrap();
        let expected: MetricSet = vec![("a_ratio", 2.0), ("b_ratio", 2.0)].into_iter().collect();
        assert_eq!(expected, ratios);
    }

    #[test]
    fn ratios_skip_keys_missing_on_one_side() {
        let left: MetricSet = vec![("a", 1.0)].into_iter().collect();
        let right: MetricSet = vec![("b", 1.0)].into_iter().collect();
        assert!(calculate_ratios(&left, &right).unwrap().is_empty());
    }

    #[test]
    fn a_zero_right_value_is_a_division_by_zero() {
        let left: MetricSet = vec![("a", 1.0), ("tract_volume", 3.0)].into_iter().collect();
        let right: MetricSet = vec![("a", 1.0), ("tract_volume", 0.0)].into_iter().collect();
        match calculate_ratios(&left, &right) {
            Err(TractshapeError::DivisionByZero(metric)) => assert_eq!("tract_volume", metric),
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn suffixes_produce_a_new_set() {
        let metrics: MetricSet = vec![("a", 1.0), ("b", 2.0)].into_iter().collect();
        let suffixed = metrics.with_suffix("_L");
        assert_eq!(vec!["a_L", "b_L"], suffixed.keys().collect::<Vec<_>>());
        assert_eq!(Some(1.0), metrics.get("a"));
        assert_eq!("{a: 1, b: 2}", format!("{}", metrics));
    }
}
