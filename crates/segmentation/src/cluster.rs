use rangescan_spatial::KdTree;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Tuning for [`ObjectClusterer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Two points closer than this are neighbours.
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Components smaller than this are noise.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

fn default_radius() -> f64 {
    0.08
}

fn default_min_points() -> usize {
    5
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            min_points: default_min_points(),
        }
    }
}

/// Output of [`ObjectClusterer::cluster`].
///
/// `labels[i]` is the label of input point `i` (0 for noise), and
/// `clusters[k]` holds the ascending input indices carrying label `k + 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clustering {
    pub labels: Vec<u32>,
    pub clusters: Vec<Vec<usize>>,
}

impl Clustering {
    fn unclustered(n: usize) -> Self {
        Self {
            labels: vec![0; n],
            clusters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Euclidean connected-component clustering.
#[derive(Debug, Clone, Default)]
pub struct ObjectClusterer {
    params: ClusterParams,
}

impl ObjectClusterer {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Groups points linked by chains of neighbours closer than `radius`.
    ///
    /// Components are flood-filled from seeds taken in input order, so every
    /// component is discovered at its lowest index. Components with fewer
    /// than `min_points` members stay at label 0; the rest are numbered
    /// 1..K in discovery order, which makes labelling a pure function of the
    /// input sequence.
    pub fn cluster(&self, points: &[[f64; 3]]) -> Clustering {
        let n = points.len();
        let radius = self.params.radius;
        if n == 0 || !(radius > 0.0 && radius.is_finite()) {
            return Clustering::unclustered(n);
        }
        let min_points = self.params.min_points.max(1);

        let tree = KdTree::from_points(points);
        let mut visited = vec![false; n];
        let mut result = Clustering::unclustered(n);
        let mut noise = 0usize;

        for seed in 0..n {
            if visited[seed] {
                continue;
            }

            let mut component = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(seed);
            visited[seed] = true;

            while let Some(current) = queue.pop_front() {
                component.push(current);

                for neighbor in tree.neighbors_within(&points[current], radius) {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }

            if component.len() < min_points {
                noise += component.len();
                continue;
            }

            component.sort_unstable();
            let label = result.clusters.len() as u32 + 1;
            for &idx in &component {
                result.labels[idx] = label;
            }
            result.clusters.push(component);
        }

        debug!(
            points = n,
            clusters = result.clusters.len(),
            noise,
            "clustered residual points"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn clusterer(radius: f64, min_points: usize) -> ObjectClusterer {
        ObjectClusterer::new(ClusterParams { radius, min_points })
    }

    #[test]
    fn two_separated_clusters() {
        let pts = [
            [0.0, 0.0, 0.0],
            [100.0, 100.0, 100.0],
            [0.1, 0.1, 0.0],
            [100.1, 100.1, 100.0],
            [0.2, 0.0, 0.1],
            [100.2, 100.0, 100.1],
        ];

        let result = clusterer(1.0, 1).cluster(&pts);
        assert_eq!(result.len(), 2);
        assert_eq!(result.clusters[0], vec![0, 2, 4]);
        assert_eq!(result.clusters[1], vec![1, 3, 5]);
        assert_eq!(result.labels, vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn labels_follow_first_member_not_size() {
        // A small group first, then a larger one.
        let pts = [
            [50.0, 0.0, 0.0],
            [50.1, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [0.2, 0.0, 0.0],
        ];
        let result = clusterer(0.5, 1).cluster(&pts);
        assert_eq!(result.clusters, vec![vec![0, 1], vec![2, 3, 4]]);
    }

    #[test]
    fn chains_link_distant_members() {
        let pts: Vec<[f64; 3]> = (0..10).map(|i| [i as f64 * 0.05, 0.0, 0.0]).collect();
        let result = clusterer(0.08, 1).cluster(&pts);
        assert_eq!(result.len(), 1);
        assert_eq!(result.clusters[0].len(), 10);
    }

    #[test]
    fn neighbour_relation_is_strict() {
        let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let result = clusterer(1.0, 1).cluster(&pts);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn small_components_are_noise() {
        let pts = [
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [50.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.1, 0.0, 0.0],
            [10.2, 0.0, 0.0],
        ];
        let result = clusterer(0.5, 3).cluster(&pts);
        assert_eq!(result.clusters, vec![vec![3, 4, 5]]);
        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn single_point_clusters_are_allowed() {
        let pts = [[0.0, 0.0, 0.0], [9.0, 9.0, 9.0]];
        let result = clusterer(0.5, 1).cluster(&pts);
        assert_eq!(result.clusters, vec![vec![0], vec![1]]);
    }

    #[test]
    fn zero_min_points_behaves_like_one() {
        let pts = [[0.0, 0.0, 0.0]];
        assert_eq!(clusterer(1.0, 0).cluster(&pts).len(), 1);
    }

    #[test]
    fn empty_input() {
        let result = clusterer(1.0, 1).cluster(&[]);
        assert!(result.is_empty());
        assert!(result.labels.is_empty());
    }

    #[test]
    fn invalid_radius_clusters_nothing() {
        let pts = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        for radius in [0.0, -1.0, f64::NAN] {
            let result = clusterer(radius, 1).cluster(&pts);
            assert!(result.is_empty());
            assert_eq!(result.labels, vec![0, 0]);
        }
    }

    proptest! {
        #[test]
        fn labels_partition_points(
            pts in prop::collection::vec(
                (-20.0f64..20.0, -20.0f64..20.0, -20.0f64..20.0),
                1..80
            ),
            radius in 0.1f64..6.0,
            min_points in 1usize..4,
        ) {
            let points: Vec<[f64; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let result = clusterer(radius, min_points).cluster(&points);

            prop_assert_eq!(result.labels.len(), points.len());
            let mut seen = HashSet::new();
            for (k, members) in result.clusters.iter().enumerate() {
                prop_assert!(members.len() >= min_points);
                for &idx in members {
                    prop_assert_eq!(result.labels[idx], k as u32 + 1);
                    prop_assert!(seen.insert(idx), "index {} in two clusters", idx);
                }
            }
            let labelled = result.labels.iter().filter(|&&l| l != 0).count();
            prop_assert_eq!(labelled, seen.len());

            // First members increase with the label.
            let firsts: Vec<usize> = result.clusters.iter().map(|c| c[0]).collect();
            prop_assert!(firsts.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
