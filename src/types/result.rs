use serde::{Deserialize, Serialize};

use crate::{error::FailureKind, types::itinerary::ItineraryDocument};

/// Why the synthesizer produced the document instead of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No model credential configured; expected offline mode.
    NoCredential,
    /// The model path failed with this kind on its final attempt.
    Failure(FailureKind),
}

/// Which route produced a document. Diagnostic only; every route succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum GenerationPath {
    /// First model attempt passed validation.
    Model,
    /// The corrective retry passed validation.
    RetriedModel,
    /// The synthesizer produced the document.
    Fallback { cause: FallbackReason },
}

impl GenerationPath {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationPath::Fallback { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            GenerationPath::Model => "model".to_string(),
            GenerationPath::RetriedModel => "model (after corrective retry)".to_string(),
            GenerationPath::Fallback {
                cause: FallbackReason::NoCredential,
            } => "synthesizer (no model credential)".to_string(),
            GenerationPath::Fallback {
                cause: FallbackReason::Failure(kind),
            } => format!("synthesizer (model failed: {kind})"),
        }
    }
}

/// Outcome of a generation call. There is no failure variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub document: ItineraryDocument,
    pub path: GenerationPath,
}

impl GenerationResult {
    pub fn new(document: ItineraryDocument, path: GenerationPath) -> Self {
        Self { document, path }
    }

    pub fn document(&self) -> &ItineraryDocument {
        &self.document
    }

    pub fn path(&self) -> GenerationPath {
        self.path
    }

    /// Always true; kept for callers that mirror the `{success, data}` envelope.
    pub fn success(&self) -> bool {
        true
    }

    pub fn into_response(self) -> ApiResponse {
        ApiResponse {
            success: true,
            data: self.document,
        }
    }
}

/// The `{success, data}` envelope handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: ItineraryDocument,
}
