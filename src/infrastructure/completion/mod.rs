//! Completion service adapter.

pub mod client;
pub mod error;
pub mod streaming;

pub use client::HttpCompletionClient;
pub use error::CompletionApiError;
pub use streaming::SseChunkStream;
