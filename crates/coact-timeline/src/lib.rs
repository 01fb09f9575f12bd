//! Co-active medication timeline engine.
//!
//! Splits a case's medication list into maximal windows of concurrent use
//! and decides, pair by pair, whether a claimed interaction describes real
//! co-administration or a sequential switch between related drugs.
//!
//! Everything here is a pure, synchronous function of its inputs. Nothing is
//! cached between calls, so an [`Engine`] can be shared across threads.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod segment;

pub use classify::{
  ClaimReview, Classifier, InteractionCheck, InteractionClaim,
  RelationshipVerdict, VerdictReason, overlaps,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use segment::{Segment, segment, segments_with_pair};

#[cfg(test)]
mod tests;
