//! HTTP handlers for telemetry and monitoring locations

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    CropType, GpsCoordinates, Location, LocationInput, RiskAssessment, TelemetrySnapshot,
    VegetationHealth,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Query parameters for a telemetry lookup
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<NaiveDate>,
    pub crop: Option<String>,
}

impl TelemetryQuery {
    fn location_input(&self) -> AppResult<Option<LocationInput>> {
        match (&self.location, self.latitude, self.longitude) {
            (Some(name), _, _) => Ok(Some(LocationInput::Named(name.clone()))),
            (None, Some(lat), Some(lon)) => {
                Ok(Some(LocationInput::Coordinates(GpsCoordinates::new(lat, lon))))
            }
            (None, None, None) => Ok(None),
            _ => Err(AppError::validation(
                "latitude",
                "latitude and longitude must be given together",
                "अक्षांश और देशांतर दोनों देना ज़रूरी है",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TelemetryResponse {
    pub location: Location,
    pub distance_km: f64,
    pub snapshot: Arc<TelemetrySnapshot>,
    pub environmental_score: f64,
    pub risk: RiskAssessment,
    pub vegetation_health: VegetationHealth,
}

/// Get the (cached) telemetry snapshot for a location and date
pub async fn get_telemetry(
    State(state): State<AppState>,
    Query(query): Query<TelemetryQuery>,
) -> AppResult<Json<TelemetryResponse>> {
    let telemetry = state.advisory.telemetry();
    let input = query.location_input()?;
    let resolved = telemetry.resolve(input.as_ref(), None)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let snapshot = telemetry.snapshot(&resolved, date).await?;
    let crop = query.crop.as_deref().and_then(CropType::parse);
    let enrichment = state.advisory.enrichment().enrich(&snapshot, crop);

    Ok(Json(TelemetryResponse {
        location: resolved.location,
        distance_km: resolved.distance_km,
        vegetation_health: snapshot.vegetation_health(),
        snapshot,
        environmental_score: enrichment.environmental_score,
        risk: enrichment.risk,
    }))
}

/// List the registered monitoring points
pub async fn list_locations(State(state): State<AppState>) -> Json<Vec<Location>> {
    Json(state.advisory.telemetry().registry().all().to_vec())
}
