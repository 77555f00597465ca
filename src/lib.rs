//! itinerary-gen-rs: three-tier travel itinerary generation with a model-backed
//! path and a deterministic offline fallback.
//!
//! A trip request is validated, turned into a prompt, and sent to an
//! OpenAI-compatible model. Output that fails the structural contract is retried
//! once at a lower temperature. Output with no recoverable JSON, a failed call,
//! or a second contract failure is replaced by locally synthesized itineraries.
//! Callers always get a document back.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use itinerary_gen_rs::ItineraryGenerator;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = ItineraryGenerator::from_env()?;
//!
//!     let result = generator
//!         .plan(&json!({
//!             "origin": "New York, USA",
//!             "destination": "Paris, France",
//!             "start_date": "2025-10-05",
//!             "end_date": "2025-10-08",
//!             "budget_total": 2000,
//!             "currency": "USD",
//!             "preferred_themes": ["culture", "food"],
//!             "num_travelers": 2
//!         }))
//!         .await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&result.into_response())?);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod types;

pub use crate::core::{GenerationSettings, GeneratorConfig, ItineraryGenerator};
pub use error::{FailureKind, FieldError, ItineraryError, Result, ValidationErrors};
pub use schemas::{document_contract, validate_itinerary_document, validate_trip_request};
pub use services::{
    build_fixup_prompt, build_prompt, synthesize, Entropy, ItineraryModel, ModelRequest,
    ModelResponse, OpenAIClient, SeededEntropy, SystemEntropy,
};
pub use types::{
    ApiResponse, Currency, FallbackReason, GenerationPath, GenerationResult, Itinerary,
    ItineraryDocument, ItineraryType, Metadata, Money, TripRequest,
};

#[cfg(feature = "cli")]
pub mod cli;
