use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{FieldError, ItineraryError, Result, ValidationErrors},
    types::itinerary::{Itinerary, ItineraryDocument, Metadata},
};

/// Model output that passed the structural check, before metadata is stamped.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateDocument {
    pub itineraries: Vec<Itinerary>,
    #[serde(default)]
    pub metadata: CandidateMetadata,
}

/// The only metadata the model is trusted to contribute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateMetadata {
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl CandidateDocument {
    /// Model confidence, kept only when it is a usable probability.
    pub fn confidence_score(&self) -> Option<f64> {
        self.metadata
            .confidence_score
            .filter(|score| (0.0..=1.0).contains(score))
    }

    pub fn into_document(self, metadata: Metadata) -> ItineraryDocument {
        ItineraryDocument {
            itineraries: self.itineraries,
            metadata,
        }
    }
}

/// Decode a schema-checked payload into typed itineraries.
///
/// A decoding failure is reported as a schema failure so the caller can retry.
pub fn decode_candidate(payload: &Value) -> Result<CandidateDocument> {
    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path == "." { String::new() } else { path };
        ItineraryError::SchemaValidation(ValidationErrors(vec![FieldError::new(
            location,
            err.inner().to_string(),
        )]))
    })
}
