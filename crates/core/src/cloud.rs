use crate::{Sample, ValidationError};

pub const DEFAULT_UNITS: &str = "meters";

/// An ordered, append-only collection of rangefinder points.
///
/// Coordinates and ranges are stored as parallel arrays. The i-th entry of
/// each array belongs to the i-th point ever pushed (until [`clear`]), so
/// insertion order is also export order.
///
/// Every stored value is finite: the only way in is through [`push`] and
/// [`extend`], which validate first.
///
/// [`clear`]: PointCloud::clear
/// [`push`]: PointCloud::push
/// [`extend`]: PointCloud::extend
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    distance: Vec<f64>,
    units: String,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::with_units(DEFAULT_UNITS)
    }

    pub fn with_units(units: impl Into<String>) -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            distance: Vec::new(),
            units: units.into(),
        }
    }

    /// Build a cloud from samples, rejecting the whole set if any is invalid.
    pub fn from_samples(samples: &[Sample]) -> Result<Self, ValidationError> {
        let mut cloud = Self::new();
        cloud.extend(samples)?;
        Ok(cloud)
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        debug_assert_eq!(self.x.len(), self.distance.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(&mut self, sample: Sample) -> Result<(), ValidationError> {
        sample.validate()?;
        self.push_unchecked(sample);
        Ok(())
    }

    /// Append every sample or none of them.
    pub fn extend(&mut self, samples: &[Sample]) -> Result<(), ValidationError> {
        for (index, sample) in samples.iter().enumerate() {
            sample.validate().map_err(|e| e.in_batch(index))?;
        }

        self.reserve(samples.len());
        for &sample in samples {
            self.push_unchecked(sample);
        }
        Ok(())
    }

    /// Drop all points. The unit label is kept.
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
        self.distance.clear();
    }

    pub fn distances(&self) -> &[f64] {
        &self.distance
    }

    pub fn point(&self, i: usize) -> [f64; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    pub fn sample(&self, i: usize) -> Sample {
        Sample::new(self.x[i], self.y[i], self.z[i], self.distance[i])
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    pub fn iter_samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.iter_points()
            .zip(&self.distance)
            .map(|(p, d)| Sample::new(p[0], p[1], p[2], *d))
    }

    /// Contiguous copy of the positions, for cache-friendly numeric passes.
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.iter_points().collect()
    }

    fn reserve(&mut self, additional: usize) {
        self.x.reserve(additional);
        self.y.reserve(additional);
        self.z.reserve(additional);
        self.distance.reserve(additional);
    }

    fn push_unchecked(&mut self, sample: Sample) {
        self.x.push(sample.x);
        self.y.push(sample.y);
        self.z.push(sample.z);
        self.distance.push(sample.distance);
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
