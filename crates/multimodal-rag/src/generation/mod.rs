//! Answer generation with the LLM

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::QueryHandler;
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
