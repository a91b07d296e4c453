use tracing::info;

use super::ObjectDetector;
use crate::error::DetectionError;
use crate::models::{BoundingBox, Prediction};

/// Always reports the same cat, whatever the image. Used for local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeObjectDetector;

impl ObjectDetector for FakeObjectDetector {
    async fn predict(&self, _image: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        info!("generating fake prediction");
        Ok(vec![Prediction {
            class_name: "cat".to_string(),
            score: 0.999190748,
            bbox: BoundingBox {
                xmin: 0.367288858,
                ymin: 0.278333426,
                xmax: 0.735821366,
                ymax: 0.6988855,
            },
        }])
    }
}
