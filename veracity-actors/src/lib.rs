//! Orchestration layer: the actor runtime, the fact-check pipeline, and the
//! per-chat session actors that own conversation history.
//!
//! - [`pipeline::FactChecker`]: stateless extract → split → search → verdict
//! - [`session::SessionActor`]: single writer of one chat's history
//! - [`registry::ChatSessions`]: lazily spawned sessions keyed by chat id
//! - [`format`]: plain-text rendering for messaging transports

pub mod actor;
pub mod format;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod splitter;

pub use pipeline::{FactChecker, TurnOutcome, UrlReport};
pub use registry::{ChatReply, ChatSessions};
