//! The algorithmic core of Lyceum: course compilation, mastery tracing,
//! spaced repetition, the next-unit policy, evidence assessment, and the
//! session runner state machine.
//!
//! Everything here is generic over [`lyceum_core::store::LearningStore`] and
//! takes the store as an explicit argument — no process-wide singletons. The
//! runner is transport-free; the API layer owns the actual WebSocket.

pub mod assess;
pub mod compiler;
pub mod error;
pub mod intent;
pub mod policy;
pub mod runner;
pub mod srs;
pub mod tracer;

pub use error::{EngineError, Result};

#[cfg(test)]
pub(crate) mod testutil;
