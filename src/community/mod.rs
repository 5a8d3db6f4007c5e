//! Anonymous community forum
//!
//! Posts and comments are stored through an [`EntityStore`](crate::store::EntityStore);
//! authors are shown under a randomly assigned name from a fixed pool.
//! Reaction counters only ever grow: the orchestrator uses the store's atomic
//! increment when it has one and a version-checked retry loop otherwise.

pub mod names;
pub mod orchestrator;

pub use names::{ANONYMOUS_NAMES, AnonymousNamer};
pub use orchestrator::{CategoryInfo, CommunityOrchestrator, search_posts};
