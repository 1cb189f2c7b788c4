pub mod controller;
pub mod orchestrator;

pub use controller::LoopController;
pub use orchestrator::{ResearchOrchestrator, SessionHandle, SessionOptions};
