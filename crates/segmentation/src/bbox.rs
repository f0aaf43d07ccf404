use rangescan_core::Aabb;

/// A labelled foreground object and its axis-aligned extent.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub label: u32,
    pub num_points: usize,
    pub bbox: Aabb,
    /// Cloud indices of the member points, ascending.
    pub indices: Vec<usize>,
}

/// Componentwise min/max over the given members of `points`.
pub fn bounding_box(points: &[[f64; 3]], members: &[usize]) -> Aabb {
    Aabb::from_points(members.iter().map(|&i| points[i]))
}

/// One object per cluster; cluster `k` gets label `k + 1`.
pub fn compute_objects(points: &[[f64; 3]], clusters: &[Vec<usize>]) -> Vec<DetectedObject> {
    clusters
        .iter()
        .enumerate()
        .map(|(k, members)| DetectedObject {
            label: k as u32 + 1,
            num_points: members.len(),
            bbox: bounding_box(points, members),
            indices: members.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_spans_members_only() {
        let pts = [[0.0, 0.0, 0.0], [5.0, 5.0, 5.0], [1.0, -1.0, 2.0], [0.5, 3.0, -1.0]];
        let bbox = bounding_box(&pts, &[0, 2, 3]);
        assert_eq!(bbox.min, [0.0, -1.0, -1.0]);
        assert_eq!(bbox.max, [1.0, 3.0, 2.0]);
    }

    #[test]
    fn single_point_object_has_degenerate_box() {
        let pts = [[2.0, 3.0, 4.0]];
        let objects = compute_objects(&pts, &[vec![0]]);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, 1);
        assert_eq!(objects[0].num_points, 1);
        assert_eq!(objects[0].bbox.min, objects[0].bbox.max);
        assert_eq!(objects[0].bbox.extent(), [0.0; 3]);
    }

    #[test]
    fn labels_are_contiguous() {
        let pts = [[0.0; 3], [1.0; 3], [2.0; 3]];
        let objects = compute_objects(&pts, &[vec![0], vec![1, 2]]);
        let labels: Vec<u32> = objects.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec![1, 2]);
        assert_eq!(objects[1].num_points, 2);
        assert_eq!(objects[1].indices, vec![1, 2]);
    }
}
