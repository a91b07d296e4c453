pub mod fake;
pub mod labels;
pub mod tf_serving;

use std::future::Future;

use crate::error::DetectionError;
use crate::models::Prediction;

pub use fake::FakeObjectDetector;
pub use labels::LabelMap;
pub use tf_serving::TfServingDetector;

/// Source of predictions for an encoded image.
pub trait ObjectDetector {
    /// Run inference on the full image. Boxes come back normalized as
    /// `(xmin, ymin, xmax, ymax)`; a failure never yields partial output.
    fn predict(
        &self,
        image: &[u8],
    ) -> impl Future<Output = Result<Vec<Prediction>, DetectionError>>;
}

/// Detector selected at startup.
#[derive(Debug)]
pub enum Detector {
    Fake(FakeObjectDetector),
    TfServing(TfServingDetector),
}

impl ObjectDetector for Detector {
    async fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        match self {
            Detector::Fake(detector) => detector.predict(image).await,
            Detector::TfServing(detector) => detector.predict(image).await,
        }
    }
}
