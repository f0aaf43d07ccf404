use crate::config::ServiceConfig;
use crate::store::PointCloudStore;
use crate::synthetic::{generate_random, Scene, SceneObject, SceneShape, SweepScanner};
use crate::ServiceError;
use rand::Rng;
use rangescan_core::{PointCloud, Sample};
use rangescan_io::{
    read_ply, read_samples_json, ClearStatus, CloudExport, PlyFormat, SegmentationExport,
};
use rangescan_segmentation::{Segmentation, Segmenter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task;
use tracing::{debug, info};

/// Accumulates rangefinder samples and answers export and segmentation
/// requests over them.
///
/// One instance is built at start-up and shared (typically behind an
/// `Arc`) by everything that ingests or queries the cloud. All methods take
/// `&self`.
#[derive(Debug)]
pub struct ScanService {
    config: ServiceConfig,
    store: PointCloudStore,
    segmenter: Segmenter,
    scene: Mutex<Scene>,
}

impl ScanService {
    pub fn new(config: ServiceConfig) -> Self {
        let scene = if config.with_default_scene {
            Scene::with_default_shapes()
        } else {
            Scene::empty()
        };
        info!(units = %config.units, shapes = scene.objects().len(), "scan service started");

        Self {
            store: PointCloudStore::new(config.units.clone()),
            segmenter: Segmenter::new(config.segmenter_params()),
            scene: Mutex::new(scene),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &PointCloudStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // --- ingestion ---

    /// Appends one sample and echoes it back.
    pub fn add_sample(&self, sample: Sample) -> Result<Sample, ServiceError> {
        self.store.append(sample)?;
        Ok(sample)
    }

    /// Appends a batch atomically and returns the resulting cloud.
    pub fn add_samples(&self, samples: &[Sample]) -> Result<CloudExport, ServiceError> {
        let len = self.store.append_batch(samples)?;
        debug!(added = samples.len(), total = len, "batch appended");
        Ok(self.export_json())
    }

    pub fn clear(&self) -> ClearStatus {
        self.store.clear();
        info!("point cloud cleared");
        ClearStatus::cleared()
    }

    /// Appends every vertex of a PLY file. Returns how many were added.
    pub fn load_ply(&self, path: impl AsRef<Path>) -> Result<usize, ServiceError> {
        let cloud = read_ply(path)?;
        let samples: Vec<Sample> = cloud.iter_samples().collect();
        self.store.append_batch(&samples)?;
        Ok(samples.len())
    }

    /// Appends a JSON sample list. Returns how many were added.
    pub fn load_samples_json(&self, path: impl AsRef<Path>) -> Result<usize, ServiceError> {
        let samples = read_samples_json(path)?;
        self.store.append_batch(&samples)?;
        Ok(samples.len())
    }

    // --- export ---

    pub fn snapshot(&self) -> Arc<PointCloud> {
        self.store.snapshot()
    }

    pub fn export_json(&self) -> CloudExport {
        self.store.export_json()
    }

    pub fn export_ply(&self, format: PlyFormat) -> Vec<u8> {
        self.store.export_ply(format)
    }

    // --- segmentation ---

    /// Segments the current cloud and returns the snapshot it worked on.
    pub fn segmentation(&self) -> (Arc<PointCloud>, Segmentation) {
        let cloud = self.store.snapshot();
        let result = self.segmenter.segment(&cloud);
        (cloud, result)
    }

    pub fn segment(&self) -> SegmentationExport {
        let (cloud, result) = self.segmentation();
        SegmentationExport::new(&cloud, &result)
    }

    /// [`segment`](Self::segment) on tokio's blocking pool.
    ///
    /// The snapshot is taken on the first poll; samples appended while the
    /// task runs are not included.
    pub async fn segment_async(&self) -> Result<SegmentationExport, ServiceError> {
        let cloud = self.store.snapshot();
        let segmenter = self.segmenter.clone();
        let export = task::spawn_blocking(move || {
            let result = segmenter.segment(&cloud);
            SegmentationExport::new(&cloud, &result)
        })
        .await?;
        Ok(export)
    }

    // --- synthetic data ---

    /// Replaces the cloud with `n` random points in `[-1, 1]^3`.
    pub fn demo_random_cloud(&self, n: usize) -> Result<CloudExport, ServiceError> {
        self.demo_random_cloud_with_rng(n, &mut rand::thread_rng())
    }

    pub fn demo_random_cloud_with_rng<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<CloudExport, ServiceError> {
        let samples = generate_random(n, rng);
        self.store.replace(&samples)?;
        info!(points = n, "random demo cloud generated");
        Ok(self.export_json())
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scene_objects(&self) -> Vec<SceneObject> {
        self.scene().objects().to_vec()
    }

    pub fn add_scene_object(&self, shape: SceneShape) -> SceneObject {
        self.scene().add(shape)
    }

    pub fn update_scene_object(
        &self,
        id: u32,
        shape: SceneShape,
    ) -> Result<SceneObject, ServiceError> {
        self.scene()
            .update(id, shape)
            .ok_or(ServiceError::UnknownObject(id))
    }

    pub fn remove_scene_object(&self, id: u32) -> Result<SceneObject, ServiceError> {
        self.scene().remove(id).ok_or(ServiceError::UnknownObject(id))
    }

    /// Restores the default shapes. The cloud is left alone.
    pub fn reset_scene(&self) {
        self.scene().reset();
    }

    pub fn reset_scene_and_cloud(&self) {
        self.reset_scene();
        self.store.clear();
    }

    /// Sweeps the simulated rangefinder over the current scene and appends
    /// the readings. Returns how many were added.
    pub fn scan_scene(&self) -> Result<usize, ServiceError> {
        let shapes = self.scene().shapes();
        let samples = SweepScanner::new(self.config.scanner.clone()).scan(&shapes);
        self.store.append_batch(&samples)?;
        info!(readings = samples.len(), shapes = shapes.len(), "scene scanned");
        Ok(samples.len())
    }
}

impl Default for ScanService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}
