use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use counter::{
    BoundingBox, CountDb, CountRepository, DetectionError, InMemoryCountRepo, ObjectCount,
    ObjectDetector, Prediction, StoreError,
};
use image::{ImageBuffer, Rgb};
use tempfile::NamedTempFile;

/// Creates a prediction with a fixed box covering the image centre.
pub fn generate_prediction(class_name: &str, score: f32) -> Prediction {
    Prediction {
        class_name: class_name.to_string(),
        score,
        bbox: BoundingBox {
            xmin: 0.25,
            ymin: 0.25,
            xmax: 0.75,
            ymax: 0.75,
        },
    }
}

/// The detector output shared by the counting scenarios.
pub fn mixed_predictions() -> Vec<Prediction> {
    vec![
        generate_prediction("cat", 0.9),
        generate_prediction("cat", 0.8),
        generate_prediction("dog", 0.8),
        generate_prediction("dog", 0.1),
        generate_prediction("rabbit", 0.9),
    ]
}

pub fn sorted(mut counts: Vec<ObjectCount>) -> Vec<ObjectCount> {
    counts.sort_by(|a, b| a.object_class.cmp(&b.object_class));
    counts
}

/// Encodes a 100x100 red JPEG in memory.
pub fn test_image_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_fn(100, 100, |_, _| Rgb([255u8, 0u8, 0u8]));
    let mut encoded = std::io::Cursor::new(Vec::new());
    img.write_to(&mut encoded, image::ImageFormat::Jpeg)
        .expect("Failed to encode test image");
    encoded.into_inner()
}

/// Creates a 100x100 red test image and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".jpg")
        .tempfile()
        .expect("Failed to create temp image file");
    std::fs::write(file.path(), test_image_bytes()).expect("Failed to save test image");
    file
}

/// Creates a CountDb backed by a SQLite file in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_db() -> (CountDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("counter.db").display());
    let db = CountDb::new(&url).await.expect("Failed to create test database");
    (db, dir)
}

/// Detector returning a fixed list of predictions.
pub struct StaticDetector {
    pub predictions: Vec<Prediction>,
    pub calls: AtomicUsize,
}

impl StaticDetector {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ObjectDetector for StaticDetector {
    async fn predict(&self, _image: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.predictions.clone())
    }
}

/// Detector that always fails as if the inference service were unreachable.
pub struct UnreachableDetector;

impl ObjectDetector for UnreachableDetector {
    async fn predict(&self, _image: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        Err(DetectionError::Request("connection refused".to_string()))
    }
}

/// Count store that records every call and can be told to fail updates.
#[derive(Default)]
pub struct RecordingRepo {
    inner: InMemoryCountRepo,
    pub updates: Mutex<Vec<Vec<ObjectCount>>>,
    pub reads: AtomicUsize,
    pub fail_updates: bool,
}

impl RecordingRepo {
    pub fn failing() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn update_calls(&self) -> Vec<Vec<ObjectCount>> {
        self.updates.lock().unwrap().clone()
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CountRepository for RecordingRepo {
    async fn read_values(&self, classes: Option<&[String]>) -> Result<Vec<ObjectCount>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_values(classes).await
    }

    async fn update_values(&self, deltas: &[ObjectCount]) -> Result<(), StoreError> {
        self.updates.lock().unwrap().push(deltas.to_vec());
        if self.fail_updates {
            return Err(StoreError::Poisoned);
        }
        self.inner.update_values(deltas).await
    }
}
