//! Search provider adapter.

pub mod client;
pub mod error;

pub use client::HttpSearchProvider;
pub use error::SearchApiError;
