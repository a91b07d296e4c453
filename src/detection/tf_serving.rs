use std::time::Duration;

use serde::{Deserialize, Serialize};
use surf::{Client, Config, Url};
use tracing::{debug, info};

use super::{LabelMap, ObjectDetector};
use crate::error::DetectionError;
use crate::models::{BoundingBox, Prediction};

/// Object detector backed by a TensorFlow Serving REST endpoint.
#[derive(Debug)]
pub struct TfServingDetector {
    client: Client,
    url: Url,
    labels: LabelMap,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<[u8; 3]>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<RawDetections>,
}

/// One image's output from an object-detection signature.
/// Boxes are `[ymin, xmin, ymax, xmax]`; counts and class ids arrive as floats.
#[derive(Debug, Deserialize)]
struct RawDetections {
    num_detections: f64,
    detection_boxes: Vec<[f32; 4]>,
    detection_scores: Vec<f32>,
    detection_classes: Vec<f64>,
}

impl TfServingDetector {
    pub fn new(
        host: &str,
        port: u16,
        model: &str,
        labels: LabelMap,
        timeout: Duration,
    ) -> Result<Self, DetectionError> {
        let url = format!("http://{host}:{port}/v1/models/{model}:predict");
        let url = Url::parse(&url)
            .map_err(|e| DetectionError::Request(format!("invalid endpoint {url}: {e}")))?;
        let client: Client = Config::new()
            .set_timeout(Some(timeout))
            .try_into()
            .map_err(|e| DetectionError::Request(format!("failed to build http client: {e}")))?;
        info!(%url, "tensorflow serving detector initialized");
        Ok(Self {
            client,
            url,
            labels,
        })
    }
}

impl ObjectDetector for TfServingDetector {
    async fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>, DetectionError> {
        let request = to_predict_request(image)?;
        debug!(url = %self.url, "sending prediction request");

        let mut response = self
            .client
            .post(self.url.as_str())
            .body_json(&request)
            .map_err(|e| DetectionError::Request(e.to_string()))?
            .await
            .map_err(|e| DetectionError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DetectionError::Status(u16::from(response.status())));
        }

        let body: PredictResponse = response
            .body_json()
            .await
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;
        let raw = body.predictions.into_iter().next().ok_or_else(|| {
            DetectionError::MalformedResponse("response has no predictions".to_string())
        })?;
        let predictions = to_predictions(raw, &self.labels)?;
        info!(count = predictions.len(), "prediction response parsed");
        Ok(predictions)
    }
}

fn to_predict_request(image: &[u8]) -> Result<PredictRequest, DetectionError> {
    let rgb = image::load_from_memory(image)?.to_rgb8();
    debug!(width = rgb.width(), height = rgb.height(), "decoded image");
    let rows = rgb
        .rows()
        .map(|row| row.map(|pixel| pixel.0).collect())
        .collect();
    Ok(PredictRequest {
        instances: vec![rows],
    })
}

fn as_index(value: f64, what: &str) -> Result<i64, DetectionError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(DetectionError::MalformedResponse(format!(
            "{what} is not a non-negative integer: {value}"
        )))
    }
}

fn to_predictions(raw: RawDetections, labels: &LabelMap) -> Result<Vec<Prediction>, DetectionError> {
    let n = as_index(raw.num_detections, "num_detections")? as usize;
    if raw.detection_boxes.len() < n
        || raw.detection_scores.len() < n
        || raw.detection_classes.len() < n
    {
        return Err(DetectionError::MalformedResponse(format!(
            "expected {n} detections, got {} boxes, {} scores, {} classes",
            raw.detection_boxes.len(),
            raw.detection_scores.len(),
            raw.detection_classes.len()
        )));
    }

    let mut predictions = Vec::with_capacity(n);
    for i in 0..n {
        let [ymin, xmin, ymax, xmax] = raw.detection_boxes[i];
        let class_id = as_index(raw.detection_classes[i], "detection class")?;
        let class_name = labels
            .name(class_id)
            .ok_or(DetectionError::UnknownClass(class_id))?;
        predictions.push(Prediction {
            class_name: class_name.to_string(),
            score: raw.detection_scores[i],
            bbox: BoundingBox {
                xmin,
                ymin,
                xmax,
                ymax,
            },
        });
    }
    Ok(predictions)
}
