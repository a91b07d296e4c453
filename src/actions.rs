use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::core::db::CountRepository;
use crate::debug::DebugRenderer;
use crate::detection::ObjectDetector;
use crate::error::CountError;
use crate::models::{CountResponse, Prediction};
use crate::predictions::{count, over_threshold};

/// Counts the objects in one image and folds them into the running totals.
#[derive(Debug)]
pub struct CountDetectedObjects<D, R> {
    object_detector: D,
    count_repo: R,
    debug_renderer: Option<DebugRenderer>,
}

impl<D: ObjectDetector, R: CountRepository> CountDetectedObjects<D, R> {
    pub fn new(object_detector: D, count_repo: R) -> Self {
        Self {
            object_detector,
            count_repo,
            debug_renderer: None,
        }
    }

    /// Save annotated copies of each request's image. Rendering failures are
    /// logged and never fail the request.
    pub fn with_debug_renderer(mut self, renderer: DebugRenderer) -> Self {
        self.debug_renderer = Some(renderer);
        self
    }

    pub fn count_repo(&self) -> &R {
        &self.count_repo
    }

    pub async fn execute(&self, image: &[u8], threshold: f32) -> Result<CountResponse, CountError> {
        info!(threshold, "executing object count");

        let predictions = self
            .object_detector
            .predict(image)
            .await
            .inspect_err(|e| error!(error = %e, "object detection failed"))?;
        debug!(predictions = predictions.len(), "predictions received");

        let debug_image = self.decode_for_debug(image);
        self.debug_image(debug_image.as_ref(), &predictions, "all_predictions.jpg");

        let valid_predictions: Vec<&Prediction> = over_threshold(&predictions, threshold).collect();
        debug!(valid = valid_predictions.len(), "applied threshold");
        self.debug_image(
            debug_image.as_ref(),
            valid_predictions.iter().copied(),
            &format!("valid_predictions_with_threshold_{threshold}.jpg"),
        );

        let current_objects = count(valid_predictions.iter().copied());
        debug!(?current_objects, "object counts");

        self.count_repo
            .update_values(&current_objects)
            .await
            .inspect_err(|e| error!(error = %e, "updating object counts failed"))?;
        info!("updated object counts in the repository");

        let total_objects = self
            .count_repo
            .read_values(None)
            .await
            .inspect_err(|e| error!(error = %e, "reading object counts failed"))?;
        debug!(?total_objects, "total objects from repository");

        Ok(CountResponse {
            current_objects,
            total_objects,
        })
    }

    fn decode_for_debug(&self, image: &[u8]) -> Option<DynamicImage> {
        self.debug_renderer.as_ref()?;
        match image::load_from_memory(image) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(error = %e, "skipping debug images, input could not be decoded");
                None
            }
        }
    }

    fn debug_image<'a>(
        &self,
        image: Option<&DynamicImage>,
        predictions: impl IntoIterator<Item = &'a Prediction>,
        file_name: &str,
    ) {
        let (Some(renderer), Some(image)) = (&self.debug_renderer, image) else {
            return;
        };
        if let Err(e) = renderer.render(image, predictions, file_name) {
            warn!(error = %e, file_name, "failed to render debug image");
        }
    }
}
