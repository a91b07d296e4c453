use thiserror::Error;

/// Caller-correctable problems with a counting request.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Invalid threshold value: {0:?}")]
    InvalidThreshold(String),
    #[error("Missing or incorrect input parameters: {0}")]
    MalformedRequest(String),
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Inference request failed: {0}")]
    Request(String),
    #[error("Inference service returned status {0}")]
    Status(u16),
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),
    #[error("Unknown class id {0}")]
    UnknownClass(i64),
    #[error("Invalid label map: {0}")]
    LabelMap(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Count for {object_class:?} out of range")]
    CountOutOfRange { object_class: String },
    #[error("Unsupported database url {0:?}")]
    UnsupportedUrl(String),
    #[error("Count store lock poisoned")]
    Poisoned,
}

/// Failure of a counting request. Collaborator errors pass through unchanged.
#[derive(Error, Debug)]
pub enum CountError {
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
