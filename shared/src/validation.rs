//! Validation utilities for advisory inputs and telemetry values

use crate::types::GpsCoordinates;

// ============================================================================
// Telemetry Validations
// ============================================================================

/// Validate NDVI is within [-1, 1]
pub fn validate_ndvi(ndvi: f64) -> Result<(), &'static str> {
    if !ndvi.is_finite() || !(-1.0..=1.0).contains(&ndvi) {
        return Err("NDVI must be between -1 and 1");
    }
    Ok(())
}

/// Validate a percentage (soil moisture, cloud cover, humidity)
pub fn validate_percentage(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a confidence value is within [0, 1]
pub fn validate_confidence(confidence: f64) -> Result<(), &'static str> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err("Confidence must be between 0 and 1");
    }
    Ok(())
}

/// Check if soil moisture is below the wilting threshold for field crops
pub fn is_drought_moisture(soil_moisture: f64) -> bool {
    soil_moisture < 20.0
}

// ============================================================================
// Request Validations
// ============================================================================

/// Validate query text is not blank and not overly long
pub fn validate_query_text(text: &str) -> Result<(), &'static str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("Query text must not be empty");
    }
    if trimmed.chars().count() > 2000 {
        return Err("Query text must be at most 2000 characters");
    }
    Ok(())
}

/// Validate coordinates are on the globe
pub fn validate_coordinates(coordinates: &GpsCoordinates) -> Result<(), &'static str> {
    if !coordinates.is_valid() {
        return Err("Latitude must be within ±90 and longitude within ±180");
    }
    Ok(())
}

/// Check whether coordinates fall inside the Indian subcontinent bounding box
pub fn is_in_india(coordinates: &GpsCoordinates) -> bool {
    (6.0..=37.5).contains(&coordinates.latitude) && (68.0..=97.5).contains(&coordinates.longitude)
}
