use crate::bbox::{compute_objects, DetectedObject};
use crate::cluster::{ClusterParams, ObjectClusterer};
use crate::error::SegmentationError;
use crate::plane::{Plane, PlaneFit, PlaneFitter, PlaneFitterParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangescan_core::PointCloud;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Parameters for the full plane + objects pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmenterParams {
    #[serde(default)]
    pub plane: PlaneFitterParams,
    #[serde(default)]
    pub cluster: ClusterParams,
}

/// Result of segmenting one cloud snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segmentation {
    /// One label per cloud point: 0 for base or noise, `k` for object `k`.
    pub labels: Vec<u32>,
    pub objects: Vec<DetectedObject>,
    pub plane: Option<Plane>,
    /// Cloud indices of the plane inliers, ascending.
    pub plane_inliers: Vec<usize>,
}

impl Segmentation {
    /// No plane, no objects, every point labelled 0.
    pub fn unsegmented(n: usize) -> Self {
        Self {
            labels: vec![0; n],
            ..Self::default()
        }
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Points carrying label 0, plane inliers and noise alike.
    pub fn base_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 0).count()
    }
}

/// Splits a cloud into its dominant plane and the objects resting on it.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    params: SegmenterParams,
}

impl Segmenter {
    pub fn new(params: SegmenterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Segments `cloud` with the sampler seeded from the plane parameters,
    /// so repeated calls on the same cloud agree.
    #[instrument(skip_all, fields(points = cloud.len()))]
    pub fn segment(&self, cloud: &PointCloud) -> Segmentation {
        let mut rng = StdRng::seed_from_u64(self.params.plane.seed);
        self.segment_with_rng(cloud, &mut rng)
    }

    pub fn segment_with_rng<R: Rng + ?Sized>(
        &self,
        cloud: &PointCloud,
        rng: &mut R,
    ) -> Segmentation {
        let points = cloud.positions();
        let result = self.segment_points(&points, rng);

        info!(
            points = points.len(),
            plane = result.plane.is_some(),
            inliers = result.plane_inliers.len(),
            objects = result.objects.len(),
            "segmentation complete"
        );

        result
    }

    /// Runs the pipeline over raw positions.
    ///
    /// Plane inliers are removed, the remaining points are clustered in
    /// their original order, and residual indices are mapped back to
    /// positions in `points` before objects are built.
    pub fn segment_points<R: Rng + ?Sized>(
        &self,
        points: &[[f64; 3]],
        rng: &mut R,
    ) -> Segmentation {
        let n = points.len();

        let fit = match PlaneFitter::new(self.params.plane.clone()).fit(points, rng) {
            Ok(fit) => fit,
            Err(SegmentationError::InsufficientData { found, required }) => {
                debug!(found, required, "too few points for a plane");
                return Segmentation::unsegmented(n);
            }
            Err(err) => {
                debug!(%err, "plane fit failed");
                return Segmentation::unsegmented(n);
            }
        };

        let PlaneFit {
            plane: Some(plane),
            inliers,
        } = fit
        else {
            return Segmentation::unsegmented(n);
        };

        let mut on_plane = vec![false; n];
        for &i in &inliers {
            on_plane[i] = true;
        }
        let residual_index: Vec<usize> = (0..n).filter(|&i| !on_plane[i]).collect();
        let residual: Vec<[f64; 3]> = residual_index.iter().map(|&i| points[i]).collect();

        let clustering = ObjectClusterer::new(self.params.cluster.clone()).cluster(&residual);

        let clusters: Vec<Vec<usize>> = clustering
            .clusters
            .iter()
            .map(|members| members.iter().map(|&r| residual_index[r]).collect())
            .collect();

        let mut labels = vec![0u32; n];
        for (r, &label) in clustering.labels.iter().enumerate() {
            labels[residual_index[r]] = label;
        }

        Segmentation {
            labels,
            objects: compute_objects(points, &clusters),
            plane: Some(plane),
            plane_inliers: inliers,
        }
    }
}
