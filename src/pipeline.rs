/// Orchestration of one synthesis request.
pub mod orchestrator;
/// Request state machine and generation modes.
pub mod state;
