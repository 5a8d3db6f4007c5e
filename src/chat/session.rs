//! Per-session conversation state.
//!
//! A [`ChatSession`] owns the ordered message list, the request state
//! machine and the crisis-banner flag. All mutation goes through short
//! critical sections on a `parking_lot::Mutex`; the lock is never held
//! while inference is awaited.

use super::prompt::GREETING;
use crate::types::Message;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Error text recorded when a caller stops waiting for its reply.
pub const ABANDONED: &str = "request abandoned";

/// Request state: Idle → Pending → (Idle | Failed). Failed accepts a new
/// submit or an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChatState {
    Idle,
    Pending,
    Failed { error: String },
}

impl ChatState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ChatState::Pending)
    }
}

/// Why a submit was refused without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectReason {
    /// Blank after trimming.
    Empty,
    /// A reply is still pending.
    Busy,
    /// The session has ended.
    Closed,
}

/// Point-in-time copy of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub messages: Vec<Message>,
    pub state: ChatState,
    pub crisis: bool,
    pub created_at: DateTime<Utc>,
}

/// Handed to the orchestrator when a request starts.
pub(crate) struct RequestTicket {
    /// Conversation before the new user message.
    pub history: Vec<Message>,
    pub token: CancellationToken,
}

struct Inner {
    messages: Vec<Message>,
    state: ChatState,
    crisis_banner: bool,
    last_active: Instant,
    request: Option<CancellationToken>,
    ended: bool,
}

pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    root: CancellationToken,
    inner: Mutex<Inner>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A fresh session holding only the greeting.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            root: CancellationToken::new(),
            inner: Mutex::new(Inner {
                messages: vec![Message::assistant(GREETING)],
                state: ChatState::Idle,
                crisis_banner: false,
                last_active: Instant::now(),
                request: None,
                ended: false,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().messages.clone()
    }

    pub fn state(&self) -> ChatState {
        self.inner.lock().state.clone()
    }

    pub fn crisis_banner(&self) -> bool {
        self.inner.lock().crisis_banner
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().ended
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            id: self.id.clone(),
            messages: inner.messages.clone(),
            state: inner.state.clone(),
            crisis: inner.crisis_banner,
            created_at: self.created_at,
        }
    }

    /// Time since the last submit, reply or user action.
    pub fn idle_for(&self) -> Duration {
        self.inner.lock().last_active.elapsed()
    }

    /// Hides the crisis banner. A later detection raises it again.
    pub fn dismiss_crisis(&self) {
        let mut inner = self.inner.lock();
        inner.crisis_banner = false;
        inner.last_active = Instant::now();
    }

    /// Cancels the in-flight request, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let inner = self.inner.lock();
        match (&inner.state, &inner.request) {
            (ChatState::Pending, Some(token)) => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Failed → Idle. Returns false if the session was not in Failed.
    pub fn acknowledge_failure(&self) -> bool {
        let mut inner = self.inner.lock();
        if matches!(inner.state, ChatState::Failed { .. }) {
            inner.state = ChatState::Idle;
            inner.last_active = Instant::now();
            true
        } else {
            false
        }
    }

    /// Ends the session and cancels anything in flight.
    pub fn end(&self) {
        self.inner.lock().ended = true;
        self.root.cancel();
    }

    pub(crate) fn raise_crisis(&self) {
        self.inner.lock().crisis_banner = true;
    }

    /// Appends the user message and enters Pending, or refuses untouched.
    pub(crate) fn begin_request(
        &self,
        content: &str,
    ) -> std::result::Result<RequestTicket, RejectReason> {
        let mut inner = self.inner.lock();
        if inner.ended {
            return Err(RejectReason::Closed);
        }
        if inner.state.is_pending() {
            return Err(RejectReason::Busy);
        }

        let history = inner.messages.clone();
        let token = self.root.child_token();

        inner.messages.push(Message::user(content));
        inner.state = ChatState::Pending;
        inner.request = Some(token.clone());
        inner.last_active = Instant::now();

        Ok(RequestTicket { history, token })
    }

    pub(crate) fn complete_request(&self, reply: String) {
        let mut inner = self.inner.lock();
        inner.messages.push(Message::assistant(reply));
        inner.state = ChatState::Idle;
        inner.request = None;
        inner.last_active = Instant::now();
    }

    pub(crate) fn fail_request(&self, error: String) {
        let mut inner = self.inner.lock();
        inner.state = ChatState::Failed { error };
        inner.request = None;
        inner.last_active = Instant::now();
    }

    pub(crate) fn reset_request(&self) {
        let mut inner = self.inner.lock();
        inner.state = ChatState::Idle;
        inner.request = None;
        inner.last_active = Instant::now();
    }

    /// Called from the drop guard; only acts if the request never resolved.
    pub(crate) fn abandon_request(&self) {
        let mut inner = self.inner.lock();
        if inner.state.is_pending() {
            inner.state = ChatState::Failed {
                error: ABANDONED.to_string(),
            };
            inner.request = None;
        }
    }
}
