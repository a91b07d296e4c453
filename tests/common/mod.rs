#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from counter for tests
pub use counter::{
    BoundingBox, CountDb, CountDetectedObjects, CountError, CountRepository, CountResponse,
    DetectionError, InMemoryCountRepo, ObjectCount, ObjectDetector, Prediction, StoreError,
};
