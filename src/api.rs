use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, get, post, web};
use futures::TryStreamExt;
use serde_json::json;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::AppContext;
use crate::error::{CountError, ValidationError};

const DEFAULT_THRESHOLD: f32 = 0.5;

/// Error returned by request handlers, rendered as `{"error": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Count(#[from] CountError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Count(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Validation(ValidationError::MissingFile) => "No file uploaded",
            ApiError::Validation(ValidationError::InvalidThreshold(_)) => "Invalid threshold value",
            ApiError::Validation(ValidationError::MalformedRequest(_)) => {
                "Missing or incorrect input parameters"
            }
            ApiError::Count(_) => "An unexpected error occurred",
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(health_check)
        .service(web::scope("/api/v1").service(object_detect_count));
}

#[get("/")]
async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body("Welcome to Objection detection and counting project!")
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

#[post("/object-detect-count")]
async fn object_detect_count(
    context: web::Data<AppContext>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    count_objects(&context, payload)
        .instrument(info_span!("object_detect_count", %request_id))
        .await
}

async fn count_objects(context: &AppContext, payload: Multipart) -> Result<HttpResponse, ApiError> {
    info!("received a request for object detection");
    let form = read_form(payload)
        .await
        .inspect_err(|e| warn!(error = %e, "rejected request"))?;
    info!(threshold = form.threshold, bytes = form.file.len(), "executing count action");

    let response = context
        .count_action()
        .execute(&form.file, form.threshold)
        .await
        .inspect_err(|e| error!(error = %e, "count action failed"))?;
    info!(?response, "count action executed successfully");
    Ok(HttpResponse::Ok().json(response))
}

struct CountForm {
    file: Vec<u8>,
    threshold: f32,
}

async fn read_form(mut payload: Multipart) -> Result<CountForm, ValidationError> {
    let mut file: Option<Vec<u8>> = None;
    let mut threshold: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ValidationError::MalformedRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ValidationError::MalformedRequest(e.to_string()))?
        {
            data.extend_from_slice(&chunk);
        }
        match name.as_deref() {
            Some("file") => file = Some(data),
            Some("threshold") => threshold = Some(String::from_utf8_lossy(&data).into_owned()),
            _ => {}
        }
    }

    let threshold = match threshold {
        Some(raw) => parse_threshold(&raw)?,
        None => DEFAULT_THRESHOLD,
    };
    let file = file
        .filter(|data| !data.is_empty())
        .ok_or(ValidationError::MissingFile)?;
    Ok(CountForm { file, threshold })
}

fn parse_threshold(raw: &str) -> Result<f32, ValidationError> {
    match raw.trim().parse::<f32>() {
        Ok(threshold) if !threshold.is_nan() => Ok(threshold),
        _ => Err(ValidationError::InvalidThreshold(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0.9").unwrap(), 0.9);
        assert_eq!(parse_threshold(" 0 ").unwrap(), 0.0);
        assert_eq!(parse_threshold("1.5").unwrap(), 1.5);
        assert!(parse_threshold("not-a-number").is_err());
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("").is_err());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(ValidationError::MissingFile).status_code(),
            StatusCode::BAD_REQUEST
        );
        let store_failure = CountError::Store(crate::error::StoreError::Poisoned);
        assert_eq!(
            ApiError::from(store_failure).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
