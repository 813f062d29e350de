pub mod orchestrator;
pub mod stats;
pub mod traits;
