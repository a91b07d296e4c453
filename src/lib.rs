pub mod actions;
pub mod api;
pub mod config;
pub mod core;
pub mod debug;
pub mod detection;
pub mod error;
pub mod models;
pub mod predictions;

pub use actions::CountDetectedObjects;
pub use config::{AppContext, Environment, Settings};
pub use crate::core::db::{CountDb, CountRepository, InMemoryCountRepo};
pub use detection::{Detector, FakeObjectDetector, ObjectDetector, TfServingDetector};
pub use error::{CountError, DetectionError, StoreError, ValidationError};
pub use models::{BoundingBox, CountResponse, ObjectCount, Prediction};
pub use predictions::{count, over_threshold};
