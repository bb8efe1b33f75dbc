//! Model server backends.

mod ollama;

pub use ollama::{ModelInfo, ModelSummary, OllamaBackend, OllamaBackendBuilder};
