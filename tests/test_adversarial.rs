//! Degenerate and hostile inputs: nothing here may panic, and segmentation
//! always produces a structurally valid result.

use rangescan::core::{PointCloud, Sample, ValidationError};
use rangescan::io::{parse_ply, read_ply, PlyError};
use rangescan::segmentation::{
    ClusterParams, ObjectClusterer, PlaneFitter, Segmentation, SegmentationError, Segmenter,
};
use rangescan::service::{ScanService, ServiceError};
use rangescan::spatial::KdTree;

// ────────────────── PointCloud core ──────────────────

#[test]
fn empty_cloud_operations() {
    let cloud = PointCloud::new();
    assert_eq!(cloud.len(), 0);
    assert!(cloud.positions().is_empty());
    assert_eq!(cloud.iter_samples().count(), 0);
}

#[test]
fn non_finite_samples_never_enter() {
    let mut cloud = PointCloud::new();
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(cloud.push(Sample::new(bad, 0.0, 0.0, 1.0)).is_err());
        assert!(cloud.push(Sample::new(0.0, bad, 0.0, 1.0)).is_err());
        assert!(cloud.push(Sample::new(0.0, 0.0, bad, 1.0)).is_err());
        assert!(cloud.push(Sample::new(0.0, 0.0, 0.0, bad)).is_err());
    }
    assert!(cloud.is_empty());
}

#[test]
fn batch_error_names_the_sample() {
    let service = ScanService::default();
    let mut batch: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 0.0, 0.0, 1.0)).collect();
    batch[7].distance = f64::NAN;
    match service.add_samples(&batch) {
        Err(ServiceError::Validation(ValidationError::InBatch { index, field, .. })) => {
            assert_eq!(index, 7);
            assert_eq!(field, "distance");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(service.is_empty());
}

// ────────────────── KdTree ──────────────────

#[test]
fn kdtree_single_point() {
    let tree = KdTree::from_points(&[[1.0, 2.0, 3.0]]);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.neighbors_within(&[1.0, 2.0, 3.0], 1e-12), vec![0]);
}

#[test]
fn kdtree_non_finite_queries() {
    let tree = KdTree::from_points(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    assert!(tree.neighbors_within(&[f64::INFINITY, 0.0, 0.0], 1.0).is_empty());
    assert!(tree.neighbors_within(&[0.0, 0.0, 0.0], f64::INFINITY).is_empty());
    assert!(tree.neighbors_within(&[0.0, f64::NAN, 0.0], 1.0).is_empty());
    assert!(tree.neighbors_within(&[0.0, 0.0, 0.0], 0.0).is_empty());
}

// ────────────────── Segmentation ──────────────────

#[test]
fn plane_fit_on_fewer_than_three_points() {
    for n in 0..3 {
        let points: Vec<[f64; 3]> = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
        let err = PlaneFitter::default().fit_seeded(&points, 1).unwrap_err();
        assert_eq!(err, SegmentationError::InsufficientData { found: n, required: 3 });
    }
}

#[test]
fn plane_fit_on_identical_points() {
    let points = vec![[0.5, 0.5, 0.5]; 20];
    let fit = PlaneFitter::default().fit_seeded(&points, 3).unwrap();
    assert!(fit.plane.is_none());
    assert!(fit.inliers.is_empty());
}

#[test]
fn zero_trials_finds_nothing() {
    let mut params = PlaneFitter::default().params().clone();
    params.max_trials = 0;
    let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    let fit = PlaneFitter::new(params).fit_seeded(&points, 3).unwrap();
    assert!(fit.plane.is_none());
}

#[test]
fn clustering_identical_points() {
    let points = vec![[1.0, 2.0, 3.0]; 20];
    let params = ClusterParams { radius: 0.5, min_points: 1 };
    let result = ObjectClusterer::new(params).cluster(&points);
    assert_eq!(result.len(), 1);
    assert_eq!(result.clusters[0].len(), 20);
}

#[test]
fn clustering_min_points_larger_than_cloud() {
    let points = [[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]];
    let params = ClusterParams { radius: 0.5, min_points: 100 };
    let result = ObjectClusterer::new(params).cluster(&points);
    assert!(result.is_empty());
    assert_eq!(result.labels, vec![0, 0]);
}

#[test]
fn segmenting_collinear_cloud_yields_nothing() {
    let samples: Vec<Sample> = (0..25)
        .map(|i| Sample::from_position([0.1 * i as f64, 0.2 * i as f64, -0.05 * i as f64]))
        .collect();
    let cloud = PointCloud::from_samples(&samples).unwrap();
    let result = Segmenter::default().segment(&cloud);
    assert_eq!(result, Segmentation::unsegmented(25));
}

#[test]
fn segmenting_three_points() {
    let samples = [
        Sample::new(0.0, 0.0, 0.0, 1.0),
        Sample::new(1.0, 0.0, 0.0, 1.0),
        Sample::new(0.5, 1.0, 0.0, 1.0),
    ];
    let cloud = PointCloud::from_samples(&samples).unwrap();
    let result = Segmenter::default().segment(&cloud);
    let plane = result.plane.unwrap();
    assert!(plane.normal.iter().all(|v| v.is_finite()));
    assert_eq!(result.plane_inliers, vec![0, 1, 2]);
    assert!(result.objects.is_empty());
}

#[test]
fn huge_coordinates_do_not_panic() {
    let samples: Vec<Sample> = (0..30)
        .map(|i| {
            let f = i as f64;
            Sample::new(1e150 * (f + 1.0), -1e150 * f, 1e149 * (f * f), 1.0)
        })
        .collect();
    let cloud = PointCloud::from_samples(&samples).unwrap();
    let result = Segmenter::default().segment(&cloud);
    assert_eq!(result.labels.len(), 30);
    let objects: usize = result.objects.iter().map(|o| o.num_points).sum();
    assert_eq!(objects + result.base_count(), 30);
}

// ────────────────── IO ──────────────────

#[test]
fn read_ply_corrupted_header() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "not_a_ply_file\ngarbage data here\n").unwrap();
    tmp.flush().unwrap();

    assert!(read_ply(tmp.path()).is_err());
}

#[test]
fn read_ply_truncated_binary() {
    let header = "ply\nformat binary_little_endian 1.0\nelement vertex 100\n\
                  property float x\nproperty float y\nproperty float z\nend_header\n";
    assert!(matches!(parse_ply(header.as_bytes()), Err(PlyError::Body(_))));
}

#[test]
fn read_ply_absurd_vertex_count() {
    let header = format!(
        "ply\nformat binary_little_endian 1.0\nelement vertex {}\n\
         property double x\nproperty double y\nproperty double z\nend_header\n",
        usize::MAX
    );
    assert!(parse_ply(header.as_bytes()).is_err());
}
