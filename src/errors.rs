// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchScanError {
    #[error("Failed to read image: {0}")]
    Read(String),

    #[error("No response from AI")]
    NoResponse,

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("Analysis request failed: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ResponseError for StitchScanError {
    fn error_response(&self) -> HttpResponse {
        match self {
            StitchScanError::Read(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Image read error",
                "message": self.to_string()
            })),
            StitchScanError::NoResponse | StitchScanError::MalformedResponse(_) => {
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "AI service error",
                    "message": self.to_string()
                }))
            }
            StitchScanError::Transport(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "AI service error",
                    "message": self.to_string()
                }))
            }
            StitchScanError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
        }
    }
}
