//! The request-scoped session orchestrator and its backing store.

mod orchestrator;
mod store;

pub use orchestrator::{
    CreateSessionRequest, EngageRequest, ScoringWeightsDebug, SessionConfig, SessionDebugInfo,
    SessionOrchestrator, SessionResponse,
};
pub use store::{Session, SessionId, SessionStore};
