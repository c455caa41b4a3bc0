//! HTTP client for an Ollama-compatible text-generation endpoint.

mod client;

pub use client::{OllamaClient, OllamaClientBuilder, OllamaClientTrait, OllamaError};
