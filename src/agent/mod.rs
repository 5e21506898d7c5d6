//! LLM back-end for screening and scoring.
//!
//! Talks to a local Ollama server. Every evaluator and the eligibility screen
//! share one [`OllamaClient`] through the [`ChatBackend`] trait.

pub mod llm_evaluator;
pub mod llm_screen;
pub mod ollama;
pub mod prompts;
pub mod scoring;

pub use llm_evaluator::LlmEvaluator;
pub use llm_screen::LlmScreen;
pub use ollama::{ChatBackend, OllamaClient, OllamaConfig};
