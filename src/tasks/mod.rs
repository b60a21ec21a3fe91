//! Routing of free-text instructions to an execution path.

pub mod classifier;
pub mod envelope;
pub mod file_creation;
pub mod filename;
pub mod orchestrator;

pub use classifier::{classify, ClassificationResult, TaskKind};
pub use envelope::{TaskPayload, TaskResponse};
pub use filename::Filename;
pub use orchestrator::{TaskHandler, TaskOrchestrator, TaskRequest};
