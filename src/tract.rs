//! The in-memory model of tractography data: streamlines and the tracts (bundles) they form.
//!
//! Coordinates are world (scanner RAS) coordinates in mm, as stored in MRtrix track files.

use nalgebra::Point3;


/// A single streamline: the ordered 3-D points of one reconstructed fiber path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Streamline {
    pub points: Vec<Point3<f64>>,
}

impl Streamline {

    pub fn new(points: Vec<Point3<f64>>) -> Streamline {
        Streamline { points }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point3<f64>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point3<f64>> {
        self.points.last()
    }

    /// The same path, traversed from the last to the first point.
    pub fn reversed(&self) -> Streamline {
        Streamline { points: self.points.iter().rev().cloned().collect() }
    }
}

impl From<Vec<[f64; 3]>> for Streamline {
    fn from(coords: Vec<[f64; 3]>) -> Streamline {
        Streamline { points: coords.into_iter().map(Point3::from).collect() }
    }
}


/// A tract (or bundle): all streamlines representing one anatomical structure, e.g., one hemisphere of a fiber pathway.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tract {
    pub streamlines: Vec<Streamline>,
}

impl Tract {

    pub fn new(streamlines: Vec<Streamline>) -> Tract {
        Tract { streamlines }
    }

    pub fn num_streamlines(&self) -> usize {
        self.streamlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streamlines.is_empty()
    }

    /// Total number of points over all streamlines.
    pub fn num_points(&self) -> usize {
        self.streamlines.iter().map(|s| s.num_points()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Streamline> {
        self.streamlines.iter()
    }
}

impl FromIterator<Streamline> for Tract {
    fn from_iter<I: IntoIterator<Item = Streamline>>(iter: I) -> Tract {
        Tract { streamlines: iter.into_iter().collect() }
    }
}
