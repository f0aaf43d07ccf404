use rangescan_core::{PointCloud, Sample, ValidationError};
use rangescan_io::{ply_bytes, CloudExport, PlyFormat};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Shared, append-only point cloud.
///
/// Writers take an exclusive lock; [`snapshot`](Self::snapshot) hands out
/// the current `Arc` so readers never hold the lock while they compute. A
/// write while snapshots are outstanding copies the cloud first, leaving
/// every snapshot exactly as it was taken.
///
/// Input is validated before the lock is taken, so a panic can never leave
/// a half-applied batch behind and a poisoned lock is safe to reuse.
#[derive(Debug)]
pub struct PointCloudStore {
    cloud: RwLock<Arc<PointCloud>>,
}

impl PointCloudStore {
    pub fn new(units: impl Into<String>) -> Self {
        Self {
            cloud: RwLock::new(Arc::new(PointCloud::with_units(units))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<PointCloud>> {
        self.cloud.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<PointCloud>> {
        self.cloud.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, sample: Sample) -> Result<(), ValidationError> {
        if let Err(err) = sample.validate() {
            warn!(%err, "rejected sample");
            return Err(err);
        }
        let mut guard = self.write();
        Arc::make_mut(&mut guard).push(sample)
    }

    /// Appends every sample in order, or none of them. Returns the new size.
    pub fn append_batch(&self, samples: &[Sample]) -> Result<usize, ValidationError> {
        for (index, sample) in samples.iter().enumerate() {
            if let Err(err) = sample.validate() {
                let err = err.in_batch(index);
                warn!(%err, batch = samples.len(), "rejected batch");
                return Err(err);
            }
        }
        let mut guard = self.write();
        let cloud = Arc::make_mut(&mut guard);
        cloud.extend(samples)?;
        Ok(cloud.len())
    }

    /// Empties the store and then appends `samples`, as one step.
    pub fn replace(&self, samples: &[Sample]) -> Result<usize, ValidationError> {
        let mut fresh = PointCloud::with_units(self.units());
        fresh.extend(samples)?;
        let len = fresh.len();
        *self.write() = Arc::new(fresh);
        Ok(len)
    }

    pub fn clear(&self) {
        let mut guard = self.write();
        if Arc::strong_count(&guard) == 1 {
            Arc::make_mut(&mut guard).clear();
        } else {
            // Outstanding snapshots keep the old points; start a new cloud
            // rather than copying them just to drop them.
            let units = guard.units().to_string();
            *guard = Arc::new(PointCloud::with_units(units));
        }
    }

    /// The cloud as it is now, unaffected by later writes.
    pub fn snapshot(&self) -> Arc<PointCloud> {
        Arc::clone(&self.read())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn units(&self) -> String {
        self.read().units().to_string()
    }

    pub fn export_json(&self) -> CloudExport {
        CloudExport::from_cloud(&self.snapshot())
    }

    pub fn export_ply(&self, format: PlyFormat) -> Vec<u8> {
        ply_bytes(&self.snapshot(), format)
    }
}

impl Default for PointCloudStore {
    fn default() -> Self {
        Self::new(rangescan_core::DEFAULT_UNITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn s(i: usize) -> Sample {
        Sample::new(i as f64, 0.5 * i as f64, -(i as f64), 1.0)
    }

    #[test]
    fn append_and_len() {
        let store = PointCloudStore::default();
        assert!(store.is_empty());
        store.append(s(0)).unwrap();
        assert_eq!(store.append_batch(&[s(1), s(2)]).unwrap(), 3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.units(), "meters");
    }

    #[test]
    fn invalid_batch_changes_nothing() {
        let store = PointCloudStore::default();
        store.append(s(0)).unwrap();
        let err = store
            .append_batch(&[s(1), Sample::new(0.0, 0.0, f64::NAN, 1.0)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::InBatch { index: 1, field: "z", .. }));
        assert_eq!(store.len(), 1);
        assert!(store.append(Sample::new(0.0, 0.0, 0.0, f64::NEG_INFINITY)).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let store = PointCloudStore::default();
        store.append_batch(&[s(0), s(1), s(2)]).unwrap();
        let snap = store.snapshot();

        store.append(s(3)).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(store.len(), 4);

        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.point(2), s(2).position());
    }

    #[test]
    fn clear_keeps_units_and_restarts() {
        let store = PointCloudStore::new("millimeters");
        store.append_batch(&[s(0), s(1)]).unwrap();
        store.clear();
        assert!(store.is_empty());
        store.append(s(7)).unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.units(), "millimeters");
        assert_eq!(snap.point(0), s(7).position());
    }

    #[test]
    fn replace_swaps_contents() {
        let store = PointCloudStore::default();
        store.append_batch(&[s(0), s(1), s(2)]).unwrap();
        assert_eq!(store.replace(&[s(9)]).unwrap(), 1);
        assert_eq!(store.snapshot().point(0), s(9).position());
        assert!(store.replace(&[Sample::new(f64::NAN, 0.0, 0.0, 0.0)]).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn exports_follow_insertion_order() {
        let store = PointCloudStore::default();
        store.append_batch(&[s(2), s(0), s(1)]).unwrap();
        let json = store.export_json();
        let xs: Vec<f64> = json.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 0.0, 1.0]);

        let ply = String::from_utf8(store.export_ply(PlyFormat::Ascii)).unwrap();
        assert!(ply.contains("element vertex 3\n"));
        assert!(ply.ends_with("2 1 -2 1\n0 0 -0 1\n1 0.5 -1 1\n"));
    }

    #[test]
    fn snapshots_never_see_partial_batches() {
        let store = Arc::new(PointCloudStore::default());
        let batch: Vec<Sample> = (0..64).map(s).collect();

        let writer = {
            let store = Arc::clone(&store);
            let batch = batch.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    store.append_batch(&batch).unwrap();
                }
            })
        };

        for _ in 0..200 {
            assert_eq!(store.snapshot().len() % batch.len(), 0);
        }
        writer.join().unwrap();
        assert_eq!(store.len(), 200 * 64);
    }
}
