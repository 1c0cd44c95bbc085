pub mod anthropic;
pub mod custom;
pub mod gateway;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

pub use gateway::{LLMGateway, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use provider::ChatProvider;
pub use types::{ChatRequest, FaultKind, GenerationOutcome, Message, ProviderFault};
