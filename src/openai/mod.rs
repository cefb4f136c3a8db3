//! OpenAI Responses API: request/response types and HTTP client.

pub mod client;
pub mod text;
pub mod types;

pub use client::{CompletionClient, OpenAiClient, OpenAiError};
