pub mod config;
pub mod orchestrator;

pub use config::{GenerationSettings, GeneratorConfig};
pub use orchestrator::{ItineraryGenerator, MODEL_CONFIDENCE};
