//! Companion chat
//!
//! - [`session`] - per-session transcript, request state and crisis flag
//! - [`orchestrator`] - submit flow: crisis check, prompt, inference
//! - [`prompt`] - system instruction, greeting and prompt layout
//! - [`registry`] - live sessions for the HTTP layer, with idle eviction
//!
//! # Example
//!
//! ```rust,ignore
//! use mindful::chat::{ChatOrchestrator, ChatSession, SubmitOutcome};
//!
//! let chat = ChatOrchestrator::new(inference).with_timeout(Duration::from_secs(30));
//! let session = ChatSession::new();
//! if let SubmitOutcome::Replied { reply, .. } = chat.submit(&session, "I'm stressed").await? {
//!     println!("{}", reply);
//! }
//! ```

pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod session;

pub use orchestrator::{ChatOrchestrator, SubmitOutcome};
pub use registry::SessionRegistry;
pub use session::{ChatSession, ChatState, RejectReason, SessionSnapshot};
