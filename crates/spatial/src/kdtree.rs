use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;

/// A KdTree for radius queries over 3D positions.
///
/// Built on top of kiddo v5's `ImmutableKdTree`, which uses a cache-optimized
/// layout for faster queries than the mutable variant. The tree is built once
/// from a slice of points and cannot be modified afterwards.
///
/// The tree stores `u32` indices mapping back to the slice it was built from.
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f64, u32, 3, 32>,
    num_points: usize,
}

impl KdTree {
    /// Build a KdTree over `points`; item `i` refers to `points[i]`.
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        debug_assert!(points.len() <= u32::MAX as usize);

        Self {
            tree: ImmutableKdTree::new_from_slice(points),
            num_points: points.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// Find all points strictly closer than `radius` (Euclidean distance)
    /// to `query`; a point exactly `radius` away is not a neighbour.
    ///
    /// Returns empty if radius <= 0, the tree is empty, radius is non-finite,
    /// or query is non-finite. Indices are sorted ascending.
    pub fn neighbors_within(&self, query: &[f64; 3], radius: f64) -> Vec<usize> {
        if !self.accepts(query, radius) {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, radius_sq)
            .into_iter()
            .filter(|nn| nn.distance < radius_sq)
            .map(|nn| nn.item as usize)
            .collect();

        indices.sort_unstable();
        indices
    }

    fn accepts(&self, query: &[f64; 3], radius: f64) -> bool {
        !self.is_empty()
            && radius > 0.0
            && radius.is_finite()
            && query.iter().all(|v| v.is_finite())
    }
}
