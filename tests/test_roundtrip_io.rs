use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangescan::core::{PointCloud, Sample};
use rangescan::io::{read_cloud_json, read_ply, save_ply, PlyFormat};
use rangescan::service::{ScanService, ServiceConfig, ServiceError};
use std::fs;
use tempfile::tempdir;

fn random_samples(n: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Sample::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(0.0..3.0),
                rng.gen_range(0.1..4.0),
            )
        })
        .collect()
}

fn empty_service() -> ScanService {
    ScanService::new(ServiceConfig {
        with_default_scene: false,
        ..ServiceConfig::default()
    })
}

#[test]
fn ply_export_then_load_into_another_service() {
    let dir = tempdir().unwrap();
    let samples = random_samples(250, 1);

    for format in [PlyFormat::Ascii, PlyFormat::BinaryLittleEndian] {
        let source = empty_service();
        source.add_samples(&samples).unwrap();

        let path = dir.path().join(format!("{format:?}.ply"));
        fs::write(&path, source.export_ply(format)).unwrap();

        let target = empty_service();
        assert_eq!(target.load_ply(&path).unwrap(), 250);
        assert_eq!(target.export_json(), source.export_json());
    }
}

#[test]
fn ply_file_appends_to_existing_points() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("more.ply");
    let extra = PointCloud::from_samples(&random_samples(10, 2)).unwrap();
    save_ply(&path, &extra, PlyFormat::Ascii).unwrap();

    let service = empty_service();
    service.add_sample(Sample::new(0.0, 0.0, 0.0, 1.0)).unwrap();
    service.load_ply(&path).unwrap();

    let points = service.export_json().points;
    assert_eq!(points.len(), 11);
    assert_eq!(points[0], Sample::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(&points[1..], extra.iter_samples().collect::<Vec<_>>().as_slice());
}

#[test]
fn ply_empty_cloud_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.ply");
    save_ply(&path, &PointCloud::new(), PlyFormat::BinaryLittleEndian).unwrap();

    let loaded = read_ply(&path).unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.units(), "meters");
}

#[test]
fn ply_keeps_unit_label() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("feet.ply");
    let mut cloud = PointCloud::with_units("feet");
    cloud.push(Sample::new(1.0, 2.0, 3.0, 4.0)).unwrap();
    save_ply(&path, &cloud, PlyFormat::Ascii).unwrap();

    let loaded = read_ply(&path).unwrap();
    assert_eq!(loaded.units(), "feet");
    assert_eq!(loaded.sample(0), Sample::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn json_export_reads_back_as_cloud() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cloud.json");

    let service = empty_service();
    service.add_samples(&random_samples(40, 3)).unwrap();
    fs::write(&path, serde_json::to_vec(&service.export_json()).unwrap()).unwrap();

    let cloud = read_cloud_json(&path).unwrap();
    assert_eq!(cloud, *service.snapshot());
}

#[test]
fn json_sample_batch_loads_atomically() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.json");
    fs::write(
        &good,
        r#"[{"x": 0.0, "y": 0.0, "z": 0.0, "distance": 2.0},
            {"x": 1.0, "y": 0.5, "z": 0.0, "distance": 1.5}]"#,
    )
    .unwrap();

    let service = empty_service();
    assert_eq!(service.load_samples_json(&good).unwrap(), 2);

    // serde_json cannot express NaN, so a malformed value stands in for a bad point.
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"[{"x": 3.0, "y": 0.0, "z": 0.0, "distance": 1.0}, {"x": "oops"}]"#)
        .unwrap();
    assert!(matches!(service.load_samples_json(&bad), Err(ServiceError::Json(_))));
    assert_eq!(service.len(), 2);
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempdir().unwrap();
    let service = empty_service();
    assert!(matches!(
        service.load_ply(dir.path().join("nope.ply")),
        Err(ServiceError::Ply(_))
    ));
    assert!(matches!(
        service.load_samples_json(dir.path().join("nope.json")),
        Err(ServiceError::Json(_))
    ));
    assert!(service.is_empty());
}

#[test]
fn segmentation_export_serialises_plane_and_labels() {
    let service = ScanService::default();
    service.scan_scene().unwrap();
    let value = serde_json::to_value(service.segment()).unwrap();

    assert_eq!(value["units"], "meters");
    let points = value["points"].as_array().unwrap();
    assert_eq!(points.len(), service.len());
    assert!(points[0].get("label").is_some());
    assert!(value["plane"]["normal"].as_array().unwrap().len() == 3);
    for object in value["objects"].as_array().unwrap() {
        assert!(object["num_points"].as_u64().unwrap() > 0);
        assert_eq!(object["bbox_min"].as_array().unwrap().len(), 3);
    }
}
