//! Error handling for the advisory server
//!
//! Provides consistent error responses in English and Hindi. Every error
//! body still carries a confidence value and the telemetry-integration flag.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{Domain, ModelError, ResponseStatus};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Classification errors
    #[error("Ambiguous classification between {candidates:?}")]
    ClassificationAmbiguous { candidates: Vec<Domain> },

    // Telemetry errors
    #[error("Telemetry unavailable: {0}")]
    TelemetryUnavailable(String),

    #[error("Location {location} is {nearest_km:.1} km from the nearest monitoring point")]
    InvalidLocation { location: String, nearest_km: f64 },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    // Generation errors
    #[error("Text generation timed out after {0} ms")]
    GenerationTimeout(u64),

    #[error("Text generation failed: {0}")]
    GenerationFailed(String),

    // Computation errors
    #[error("Internal computation error: {0}")]
    InternalComputation(String),

    #[error("Invalid model value: {0}")]
    Model(#[from] ModelError),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_hi: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ClassificationAmbiguous { .. } => "CLASSIFICATION_AMBIGUOUS",
            AppError::TelemetryUnavailable(_) => "TELEMETRY_UNAVAILABLE",
            AppError::InvalidLocation { .. } => "INVALID_LOCATION",
            AppError::UnknownLocation(_) => "UNKNOWN_LOCATION",
            AppError::GenerationTimeout(_) => "GENERATION_TIMEOUT",
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::InternalComputation(_) => "INTERNAL_COMPUTATION_ERROR",
            AppError::Model(_) => "INTERNAL_COMPUTATION_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: &str, message: &str, message_hi: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_hi: message_hi.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub error: ErrorDetail,
    pub confidence_level: f64,
    pub satellite_data_integrated: bool,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_hi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Domain>>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_hi: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_hi,
            field: None,
            candidates: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, response_status, error_detail) = match &self {
            AppError::ClassificationAmbiguous { candidates } => (
                StatusCode::OK,
                ResponseStatus::ClarificationNeeded,
                ErrorDetail {
                    candidates: Some(candidates.clone()),
                    ..ErrorDetail::new(
                        code,
                        "Please tell us more about your question".to_string(),
                        "कृपया अपने सवाल के बारे में थोड़ा और बताइए".to_string(),
                    )
                },
            ),
            AppError::InvalidLocation { location, nearest_km } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ResponseStatus::Error,
                ErrorDetail {
                    field: Some("location".to_string()),
                    ..ErrorDetail::new(
                        code,
                        format!(
                            "Location {} is {:.0} km from the nearest monitoring point",
                            location, nearest_km
                        ),
                        format!(
                            "स्थान {} निकटतम निगरानी केंद्र से {:.0} किमी दूर है",
                            location, nearest_km
                        ),
                    )
                },
            ),
            AppError::UnknownLocation(location) => (
                StatusCode::NOT_FOUND,
                ResponseStatus::Error,
                ErrorDetail {
                    field: Some("location".to_string()),
                    ..ErrorDetail::new(
                        code,
                        format!("Location {} is not a registered monitoring point", location),
                        format!("स्थान {} पंजीकृत निगरानी केंद्र नहीं है", location),
                    )
                },
            ),
            AppError::Validation { field, message, message_hi } => (
                StatusCode::BAD_REQUEST,
                ResponseStatus::Error,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new(code, message.clone(), message_hi.clone())
                },
            ),
            AppError::TelemetryUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ResponseStatus::Error,
                ErrorDetail::new(
                    code,
                    format!("Telemetry is temporarily unavailable: {}", msg),
                    "उपग्रह डेटा अस्थायी रूप से उपलब्ध नहीं है".to_string(),
                ),
            ),
            AppError::GenerationTimeout(_) | AppError::GenerationFailed(_) => (
                StatusCode::BAD_GATEWAY,
                ResponseStatus::Error,
                ErrorDetail::new(
                    code,
                    "Advisory text service error".to_string(),
                    "सलाह सेवा में त्रुटि".to_string(),
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseStatus::Error,
                ErrorDetail::new(
                    code,
                    format!("Configuration error: {}", msg),
                    "सर्वर कॉन्फ़िगरेशन में त्रुटि".to_string(),
                ),
            ),
            AppError::InternalComputation(_)
            | AppError::Model(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseStatus::Error,
                ErrorDetail::new(
                    code,
                    "An internal server error occurred".to_string(),
                    "सर्वर में आंतरिक त्रुटि हुई".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorResponse {
            status: response_status,
            error: error_detail,
            confidence_level: 0.0,
            satellite_data_integrated: false,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
