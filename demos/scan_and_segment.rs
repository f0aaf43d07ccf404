use rangescan::service::{ScanService, SceneShape};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = ScanService::default();

    // One more box on top of the default scene
    service.add_scene_object(SceneShape::cuboid([-0.5, 0.25, 0.5], [0.2, 0.5, 0.2], "#f59e0b"));
    println!("Scene: {} shapes", service.scene_objects().len());

    let scanned = service.scan_scene()?;
    println!("Scanned {scanned} samples");

    let (cloud, result) = service.segmentation();
    match &result.plane {
        Some(plane) => println!(
            "Base plane: normal=[{:.4}, {:.4}, {:.4}], d={:.4}, {} inliers",
            plane.normal[0],
            plane.normal[1],
            plane.normal[2],
            plane.d,
            result.plane_inliers.len()
        ),
        None => println!("No base plane found"),
    }

    println!("Objects: {}", result.num_objects());
    for object in &result.objects {
        println!(
            "  #{}: {} points, min={:?}, max={:?}",
            object.label, object.num_points, object.bbox.min, object.bbox.max
        );
    }
    println!("Unlabelled: {} of {} points", result.base_count(), cloud.len());

    Ok(())
}
