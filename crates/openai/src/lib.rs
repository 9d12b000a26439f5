//! OpenAI chat-completions backend for the generation-service interface.

pub mod client;

pub use client::OpenAiClient;
