use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::eigen::{cross, smallest_eigenvector};
use crate::SegmentationError;

/// Fewest points that can define a plane.
pub const MIN_PLANE_POINTS: usize = 3;

/// Below this cloud size trials are evaluated sequentially.
const PARALLEL_MIN_POINTS: usize = 10_000;

/// A triple whose edge vectors span an angle with sine below this is
/// treated as collinear.
const COLLINEAR_SINE: f64 = 1e-9;

/// A plane `normal · p = d` with a unit `normal`.
///
/// The normal is canonicalized so that its largest-magnitude component is
/// positive (the first axis wins an exact tie). Two fits of the same surface
/// therefore agree in sign, and a floor's normal points along its up axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: [f64; 3],
    pub d: f64,
}

impl Plane {
    /// Normalizes `normal` and applies the sign convention. `None` if the
    /// normal has zero or non-finite length.
    pub fn new(normal: [f64; 3], d: f64) -> Option<Self> {
        let len = norm(normal);
        if !len.is_finite() || len == 0.0 || !d.is_finite() {
            return None;
        }
        let unit = [normal[0] / len, normal[1] / len, normal[2] / len];
        Some(Self::canonical(unit, d / len))
    }

    /// The plane with the given normal direction passing through `point`.
    pub fn through_point(normal: [f64; 3], point: [f64; 3]) -> Option<Self> {
        let plane = Self::new(normal, 0.0)?;
        let d = dot(plane.normal, point);
        d.is_finite().then_some(Self { d, ..plane })
    }

    /// Positive on the side the normal points to.
    #[inline]
    pub fn signed_distance(&self, point: &[f64; 3]) -> f64 {
        dot(self.normal, *point) - self.d
    }

    #[inline]
    pub fn distance_to_point(&self, point: &[f64; 3]) -> f64 {
        self.signed_distance(point).abs()
    }

    fn canonical(normal: [f64; 3], d: f64) -> Self {
        let dominant = (1..3).fold(0, |best, axis| {
            if normal[axis].abs() > normal[best].abs() {
                axis
            } else {
                best
            }
        });
        if normal[dominant] < 0.0 {
            Self {
                normal: [-normal[0], -normal[1], -normal[2]],
                d: -d,
            }
        } else {
            Self { normal, d }
        }
    }
}

/// Tuning for [`PlaneFitter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneFitterParams {
    /// Points closer than this to a candidate plane are its inliers.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,

    /// Number of random 3-point hypotheses drawn per fit.
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,

    /// Absolute floor on the winning candidate's inlier count.
    #[serde(default = "default_min_inliers")]
    pub min_inliers: usize,

    /// Floor on the winning candidate's inliers as a fraction of the cloud.
    #[serde(default = "default_min_inlier_ratio")]
    pub min_inlier_ratio: f64,

    /// Seed for the hypothesis sampler when no RNG is supplied.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_distance_threshold() -> f64 {
    0.01
}

fn default_max_trials() -> usize {
    1000
}

fn default_min_inliers() -> usize {
    MIN_PLANE_POINTS
}

fn default_min_inlier_ratio() -> f64 {
    0.05
}

fn default_seed() -> u64 {
    42
}

impl Default for PlaneFitterParams {
    fn default() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            max_trials: default_max_trials(),
            min_inliers: default_min_inliers(),
            min_inlier_ratio: default_min_inlier_ratio(),
            seed: default_seed(),
        }
    }
}

/// Result of a plane fit: the plane (if one had enough support) and the
/// indices of its inliers in ascending order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaneFit {
    pub plane: Option<Plane>,
    pub inliers: Vec<usize>,
}

impl PlaneFit {
    pub fn none() -> Self {
        Self::default()
    }
}

/// RANSAC estimator for the dominant plane of a point set.
#[derive(Debug, Clone, Default)]
pub struct PlaneFitter {
    params: PlaneFitterParams,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    trial: usize,
    plane: Plane,
    count: usize,
    residual_sum: f64,
}

impl Candidate {
    fn mean_residual(&self) -> f64 {
        if self.count == 0 {
            f64::INFINITY
        } else {
            self.residual_sum / self.count as f64
        }
    }

    /// More inliers wins, then lower mean residual, then the earlier trial.
    fn beats(&self, other: &Candidate) -> bool {
        if self.count != other.count {
            return self.count > other.count;
        }
        let (mine, theirs) = (self.mean_residual(), other.mean_residual());
        if mine != theirs {
            return mine < theirs;
        }
        self.trial < other.trial
    }

    fn better_of(a: Candidate, b: Candidate) -> Candidate {
        if b.beats(&a) {
            b
        } else {
            a
        }
    }
}

impl PlaneFitter {
    pub fn new(params: PlaneFitterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PlaneFitterParams {
        &self.params
    }

    /// Inlier count the winning candidate must reach for a cloud of `n`.
    pub fn required_inliers(&self, n: usize) -> usize {
        let ratio = if self.params.min_inlier_ratio.is_finite() {
            self.params.min_inlier_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let from_ratio = (ratio * n as f64).ceil() as usize;
        self.params.min_inliers.max(from_ratio).max(1)
    }

    /// Fit with a sampler seeded from `seed`.
    pub fn fit_seeded(
        &self,
        points: &[[f64; 3]],
        seed: u64,
    ) -> Result<PlaneFit, SegmentationError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.fit(points, &mut rng)
    }

    /// Fits the dominant plane of `points`.
    ///
    /// # Algorithm
    ///
    /// 1. Draw `max_trials` triples of distinct indices from `rng` upfront.
    /// 2. Build the plane through each triple; collinear triples are skipped.
    /// 3. Score each plane by its inliers (distance strictly below the
    ///    threshold) and keep the best, evaluating trials with rayon on
    ///    large clouds. The ordering of candidates is total, so the parallel
    ///    and sequential paths pick the same winner.
    /// 4. Refine the winner by least squares over its inliers.
    ///
    /// Fails only with [`SegmentationError::InsufficientData`] for fewer than
    /// three points. A fit with too little support yields `plane: None`.
    pub fn fit<R: Rng + ?Sized>(
        &self,
        points: &[[f64; 3]],
        rng: &mut R,
    ) -> Result<PlaneFit, SegmentationError> {
        let n = points.len();
        if n < MIN_PLANE_POINTS {
            return Err(SegmentationError::InsufficientData {
                found: n,
                required: MIN_PLANE_POINTS,
            });
        }

        let threshold = self.params.distance_threshold;
        if !(threshold > 0.0 && threshold.is_finite()) {
            debug!(threshold, "non-positive plane distance threshold, no plane");
            return Ok(PlaneFit::none());
        }

        let samples: Vec<[usize; 3]> = (0..self.params.max_trials)
            .map(|_| {
                let picked = index::sample(rng, n, 3);
                [picked.index(0), picked.index(1), picked.index(2)]
            })
            .collect();

        let use_parallel = n >= PARALLEL_MIN_POINTS && samples.len() >= 16;

        let best = if use_parallel {
            samples
                .par_iter()
                .enumerate()
                .filter_map(|(trial, triple)| evaluate(points, threshold, trial, triple))
                .reduce_with(Candidate::better_of)
        } else {
            samples
                .iter()
                .enumerate()
                .filter_map(|(trial, triple)| evaluate(points, threshold, trial, triple))
                .reduce(Candidate::better_of)
        };

        let Some(best) = best else {
            debug!(trials = samples.len(), "every plane hypothesis was degenerate");
            return Ok(PlaneFit::none());
        };

        let required = self.required_inliers(n);
        if best.count < required {
            debug!(
                inliers = best.count,
                required, "best plane hypothesis lacks support"
            );
            return Ok(PlaneFit::none());
        }

        let inliers: Vec<usize> = (0..n)
            .filter(|&i| best.plane.distance_to_point(&points[i]) < threshold)
            .collect();

        let plane = refine(points, &inliers).unwrap_or(best.plane);

        debug!(
            trial = best.trial,
            inliers = inliers.len(),
            normal = ?plane.normal,
            d = plane.d,
            "plane fitted"
        );

        Ok(PlaneFit {
            plane: Some(plane),
            inliers,
        })
    }
}

fn evaluate(
    points: &[[f64; 3]],
    threshold: f64,
    trial: usize,
    &[i0, i1, i2]: &[usize; 3],
) -> Option<Candidate> {
    let plane = plane_through(&points[i0], &points[i1], &points[i2]).ok()?;

    let mut count = 0usize;
    let mut residual_sum = 0.0f64;
    for p in points {
        let dist = plane.distance_to_point(p);
        if dist < threshold {
            count += 1;
            residual_sum += dist;
        }
    }

    Some(Candidate {
        trial,
        plane,
        count,
        residual_sum,
    })
}

/// The plane through three points, via the cross product of two edges.
pub fn plane_through(
    p0: &[f64; 3],
    p1: &[f64; 3],
    p2: &[f64; 3],
) -> Result<Plane, SegmentationError> {
    let v1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
    let v2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];

    let n = cross(v1, v2);
    let len = norm(n);
    let scale = norm(v1) * norm(v2);

    if !len.is_finite() || !scale.is_finite() || len <= COLLINEAR_SINE * scale {
        return Err(SegmentationError::DegenerateGeometry);
    }

    Plane::through_point(n, *p0).ok_or(SegmentationError::DegenerateGeometry)
}

/// Total least squares plane over `indices`: through the centroid, normal
/// along the smallest principal axis.
fn refine(points: &[[f64; 3]], indices: &[usize]) -> Option<Plane> {
    if indices.len() < MIN_PLANE_POINTS {
        return None;
    }
    let count = indices.len() as f64;

    let mut c = [0.0f64; 3];
    for &i in indices {
        for axis in 0..3 {
            c[axis] += points[i][axis];
        }
    }
    for v in &mut c {
        *v /= count;
    }

    let (mut c00, mut c01, mut c02, mut c11, mut c12, mut c22) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for &i in indices {
        let dx = points[i][0] - c[0];
        let dy = points[i][1] - c[1];
        let dz = points[i][2] - c[2];
        c00 += dx * dx;
        c01 += dx * dy;
        c02 += dx * dz;
        c11 += dy * dy;
        c12 += dy * dz;
        c22 += dz * dz;
    }

    let normal = smallest_eigenvector(c00, c01, c02, c11, c12, c22)?;
    Plane::through_point(normal, c)
}

#[inline]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}
