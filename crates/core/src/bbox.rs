use crate::HasPosition;

/// Axis-aligned bounding box. Non-finite points never widen it.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
    empty: bool,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn expand_with_point(&mut self, point: [f64; 3]) {
        if !point.iter().all(|v| v.is_finite()) {
            return;
        }

        if self.empty {
            self.min = point;
            self.max = point;
            self.empty = false;
            return;
        }

        for (axis, &val) in point.iter().enumerate() {
            self.min[axis] = self.min[axis].min(val);
            self.max[axis] = self.max[axis].max(val);
        }
    }

    /// Edge lengths along each axis; zero for an empty box.
    pub fn extent(&self) -> [f64; 3] {
        if self.empty {
            return [0.0; 3];
        }
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator,
        I::Item: HasPosition,
    {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_with_point(p.position());
        }
        aabb
    }
}
