use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Result type for completion client operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Request for one text completion.
///
/// Prompts are self-contained: the research components build the full
/// instruction text themselves, and the session-scoped context travels in
/// the prompt rather than in accumulated conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Instruction text for this call
    pub prompt: String,

    /// Optional system prompt framing the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Sampling temperature (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Complete (non-streaming) response from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,

    /// Reason generation stopped (e.g., "end_turn", "max_tokens")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// Token usage for this request
    pub usage: Usage,
}

/// Token usage statistics for a request/response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Chunk of an incrementally delivered completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Incremental text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,

    /// Stop reason, present in the final chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Pinned, boxed stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk>> + Send>>;

/// Port trait for the hosted completion service.
///
/// The domain depends on this trait, never on a concrete HTTP client, so
/// tests script the collaborator with canned responses and adapters own
/// rate limiting and retry internally. Implementations must be `Send +
/// Sync`; methods take `&self` so concurrent sessions can share one client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion and wait for the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Request a completion delivered as an incremental chunk sequence.
    ///
    /// Errors can occur both when initiating the stream (returned as `Err`)
    /// and mid-stream (yielded as an `Err` item).
    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream>;
}
