//! Synthetic clouds for demos and tests: a random cube and a simulated
//! downward rangefinder sweeping a scene of boxes and spheres on a floor.
//!
//! Scenes are Y-up with the floor at `y = 0`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangescan_core::Sample;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `n` points uniform in `[-1, 1]^3`, each with its range from the origin.
pub fn generate_random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Sample> {
    (0..n)
        .map(|_| {
            let p = [
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ];
            Sample::from_position(p)
        })
        .collect()
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

/// Shape-specific parameters of a [`SceneShape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned box; `size` is the full edge length per axis.
    Box { size: [f64; 3] },
    Sphere { radius: f64 },
}

/// A solid resting in the scene, centred on `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneShape {
    pub position: [f64; 3],
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl SceneShape {
    pub fn cuboid(position: [f64; 3], size: [f64; 3], color: &str) -> Self {
        Self {
            position,
            color: color.to_string(),
            kind: ShapeKind::Box { size },
        }
    }

    pub fn sphere(position: [f64; 3], radius: f64, color: &str) -> Self {
        Self {
            position,
            color: color.to_string(),
            kind: ShapeKind::Sphere { radius },
        }
    }

    /// Height of the upper surface above the column at `(x, z)`, if the
    /// column passes through the shape.
    pub fn top_at(&self, x: f64, z: f64) -> Option<f64> {
        let [px, py, pz] = self.position;
        let (dx, dz) = (x - px, z - pz);
        match self.kind {
            ShapeKind::Box { size: [sx, sy, sz] } => {
                (dx.abs() <= sx / 2.0 && dz.abs() <= sz / 2.0).then_some(py + sy / 2.0)
            }
            ShapeKind::Sphere { radius } => {
                let h2 = radius * radius - dx * dx - dz * dz;
                (h2 >= 0.0).then(|| py + h2.sqrt())
            }
        }
    }
}

/// Two boxes and a sphere standing on the floor.
pub fn default_scene() -> Vec<SceneShape> {
    vec![
        SceneShape::cuboid([0.8, 0.3, 0.2], [0.8, 0.6, 0.8], "#3b82f6"),
        SceneShape::cuboid([-0.7, 0.45, -0.9], [0.5, 0.9, 0.5], "#f97316"),
        SceneShape::sphere([0.0, 0.4, 1.0], 0.4, "#22c55e"),
    ]
}

/// A [`SceneShape`] with the identifier the scene assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: u32,
    #[serde(flatten)]
    pub shape: SceneShape,
}

/// Editable list of scene objects. Ids start at 1 and are never reused
/// until [`Scene::reset`].
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
}

impl Scene {
    pub fn empty() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_default_shapes() -> Self {
        let mut scene = Self::empty();
        for shape in default_scene() {
            scene.add(shape);
        }
        scene
    }

    /// Replace the contents with the default shapes and restart ids at 1.
    pub fn reset(&mut self) {
        *self = Self::with_default_shapes();
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn shapes(&self) -> Vec<SceneShape> {
        self.objects.iter().map(|o| o.shape.clone()).collect()
    }

    pub fn add(&mut self, shape: SceneShape) -> SceneObject {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let object = SceneObject { id, shape };
        self.objects.push(object.clone());
        object
    }

    pub fn update(&mut self, id: u32, shape: SceneShape) -> Option<SceneObject> {
        let slot = self.objects.iter_mut().find(|o| o.id == id)?;
        slot.shape = shape;
        Some(slot.clone())
    }

    pub fn remove(&mut self, id: u32) -> Option<SceneObject> {
        let pos = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(pos))
    }
}

/// Placement and noise of the simulated rangefinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Height of the sensor above the floor.
    #[serde(default = "default_sensor_height")]
    pub sensor_height: f64,

    /// Half-width of the square swept on the floor.
    #[serde(default = "default_extent")]
    pub extent: f64,

    /// Grid spacing between readings.
    #[serde(default = "default_step")]
    pub step: f64,

    /// Amplitude of uniform noise added to every coordinate.
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    #[serde(default = "default_scanner_seed")]
    pub seed: u64,
}

fn default_sensor_height() -> f64 {
    2.0
}

fn default_extent() -> f64 {
    2.0
}

fn default_step() -> f64 {
    0.04
}

fn default_jitter() -> f64 {
    0.001
}

fn default_scanner_seed() -> u64 {
    7
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            sensor_height: default_sensor_height(),
            extent: default_extent(),
            step: default_step(),
            jitter: default_jitter(),
            seed: default_scanner_seed(),
        }
    }
}

/// Raster sweep of a downward-looking rangefinder over the XZ plane.
#[derive(Debug, Clone, Default)]
pub struct SweepScanner {
    config: ScannerConfig,
}

impl SweepScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Readings per axis of the sweep; 0 for an unusable configuration.
    pub fn cells_per_axis(&self) -> usize {
        let ScannerConfig { extent, step, .. } = self.config;
        if !(step > 0.0 && step.is_finite() && extent >= 0.0 && extent.is_finite()) {
            return 0;
        }
        ((2.0 * extent) / step + 1e-9).floor() as usize + 1
    }

    /// One reading per grid cell, row by row along x then z.
    ///
    /// Each reading is the highest surface under the sensor: the floor or
    /// the top of a shape. Shapes above the sensor are ignored.
    pub fn scan(&self, shapes: &[SceneShape]) -> Vec<Sample> {
        let cfg = &self.config;
        let cells = self.cells_per_axis();
        let jitter = if cfg.jitter.is_finite() { cfg.jitter.abs() } else { 0.0 };
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut noise = move || {
            if jitter > 0.0 {
                rng.gen_range(-jitter..=jitter)
            } else {
                0.0
            }
        };

        let mut samples = Vec::with_capacity(cells * cells);
        for iz in 0..cells {
            let z = -cfg.extent + iz as f64 * cfg.step;
            for ix in 0..cells {
                let x = -cfg.extent + ix as f64 * cfg.step;
                let (x, z) = (x + noise(), z + noise());

                let surface = shapes
                    .iter()
                    .filter_map(|s| s.top_at(x, z))
                    .filter(|&h| h <= cfg.sensor_height)
                    .fold(0.0f64, f64::max);
                let y = surface + noise();

                samples.push(Sample::new(x, y, z, cfg.sensor_height - y));
            }
        }

        debug!(cells, readings = samples.len(), shapes = shapes.len(), "sweep complete");
        samples
    }
}
