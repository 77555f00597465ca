pub mod entropy;
pub mod extraction;
pub mod model;
pub mod openai_client;
pub mod prompt;
pub mod synthesizer;

pub use entropy::{Entropy, SeededEntropy, SystemEntropy};
pub use extraction::extract_json_object;
pub use model::{ItineraryModel, ModelRequest, ModelResponse, ResponseFormat};
pub use openai_client::OpenAIClient;
pub use prompt::{build_fixup_prompt, build_prompt};
pub use synthesizer::{synthesize, MOCK_CONFIDENCE, MOCK_MODEL_VERSION};
