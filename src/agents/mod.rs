pub mod orchestrator;
pub mod revision_patcher;
pub mod version_control;

pub use orchestrator::{UpdateOrchestrator, UpdateOutcome, UpdateRequest, UpdateState};
pub use revision_patcher::PatchReport;
