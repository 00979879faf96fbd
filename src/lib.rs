pub mod audit;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod validators;
pub mod verdict;

// Re-export commonly used types for convenience
pub use config::{Config, EnforcementMode};
pub use error::{GuardError, GuardResult};
pub use orchestrator::{Decision, Orchestrator, Outcome};
pub use request::{OperationRequest, ToolKind};
pub use verdict::{Severity, Verdict};
