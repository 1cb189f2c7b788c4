//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces that infrastructure
//! adapters must implement:
//! - `CompletionClient`: hosted completion service operations
//! - `SearchProvider`: external web-search operations
//!
//! These traits are the contracts that keep the research loop independent
//! of specific provider implementations, and stubbable in tests.

pub mod completion;
pub mod search;

pub use completion::{
    ChunkStream, CompletionChunk, CompletionClient, CompletionRequest, CompletionResponse, Usage,
};
pub use search::{SearchHit, SearchProvider};
