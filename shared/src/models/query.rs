//! Query and classification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CropType, Domain};
use crate::types::{GpsCoordinates, Language};

/// Where the caller says the query is about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LocationInput {
    Coordinates(GpsCoordinates),
    Named(String),
}

/// One incoming question; created per request and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: Uuid,
    pub text: String,
    /// Caller-declared language, if any
    pub language: Option<Language>,
    pub location: Option<LocationInput>,
    pub user_id: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            language: None,
            location: None,
            user_id: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: Option<LocationInput>) -> Self {
        self.location = location;
        self
    }

    /// Language hint from the caller; `None` leaves detection to the classifier
    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Which tier produced the classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Pattern,
    Semantic,
    /// Neither tier produced a confident answer
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainClassification {
    pub domain: Domain,
    /// In [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub language: Language,
    pub source: ClassificationSource,
    pub requires_clarification: bool,
    /// Competing domains when the answer is ambiguous
    pub candidates: Vec<Domain>,
    pub crop: Option<CropType>,
    pub keyword_hits: u32,
}

impl DomainClassification {
    pub fn new(
        domain: Domain,
        confidence: f64,
        reasoning: impl Into<String>,
        language: Language,
        source: ClassificationSource,
    ) -> Self {
        Self {
            domain,
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
            language,
            source,
            requires_clarification: false,
            candidates: Vec::new(),
            crop: None,
            keyword_hits: 0,
        }
    }

    /// Low-confidence `general` answer that asks the farmer to clarify
    pub fn needs_clarification(
        language: Language,
        confidence: f64,
        candidates: Vec<Domain>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            requires_clarification: true,
            candidates,
            ..Self::new(
                Domain::General,
                confidence,
                reasoning,
                language,
                ClassificationSource::Fallback,
            )
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
