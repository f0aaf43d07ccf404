use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A single rangefinder reading: the hit position and the range reported
/// by the sensor for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub distance: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64, distance: f64) -> Self {
        Self { x, y, z, distance }
    }

    /// Builds a sample whose distance is its range from the origin.
    pub fn from_position(p: [f64; 3]) -> Self {
        let distance = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        Self::new(p[0], p[1], p[2], distance)
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Every field must be finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
            ("distance", self.distance),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
        }
        Ok(())
    }
}
