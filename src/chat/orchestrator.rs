use super::prompt::build_prompt;
use super::session::{ChatSession, RejectReason};
use crate::crisis::CrisisDetector;
use crate::llm::InferenceService;
use crate::types::{AppError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default bound on a single inference call.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a submit that did not hit a collaborator error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Replied { reply: String, crisis_detected: bool },
    Rejected { reason: RejectReason },
}

/// Marks the session Failed if the submit future is dropped mid-flight.
struct PendingGuard<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(session: &'a ChatSession) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(session_id = %self.session.id(), "Chat request abandoned while pending");
            self.session.abandon_request();
        }
    }
}

/// Drives one turn of the companion chat: crisis check, prompt, inference.
pub struct ChatOrchestrator {
    inference: Arc<dyn InferenceService>,
    detector: CrisisDetector,
    timeout: Duration,
    history_window: Option<usize>,
}

impl ChatOrchestrator {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self {
            inference,
            detector: CrisisDetector::new(),
            timeout: DEFAULT_INFERENCE_TIMEOUT,
            history_window: None,
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: CrisisDetector) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, window: Option<usize>) -> Self {
        self.history_window = window;
        self
    }

    pub fn detector(&self) -> &CrisisDetector {
        &self.detector
    }

    pub fn model_name(&self) -> &str {
        self.inference.model_name()
    }

    /// Sends `text` as the next user message.
    ///
    /// Blank text and submits while a reply is pending are rejected without
    /// touching the session. Otherwise the message is appended, the crisis
    /// banner raised if needed, and inference awaited under the timeout and
    /// the session's cancellation token.
    ///
    /// # Errors
    ///
    /// - `AppError::Cancelled` when the request was cancelled; the session is Idle.
    /// - `AppError::Timeout` or the collaborator's error otherwise; the session
    ///   is Failed and accepts a new submit immediately.
    #[instrument(skip(self, session, text), fields(session_id = %session.id()))]
    pub async fn submit(&self, session: &ChatSession, text: &str) -> Result<SubmitOutcome> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(SubmitOutcome::Rejected {
                reason: RejectReason::Empty,
            });
        }

        let ticket = match session.begin_request(content) {
            Ok(ticket) => ticket,
            Err(reason) => {
                debug!(?reason, "Submit rejected");
                return Ok(SubmitOutcome::Rejected { reason });
            }
        };

        let crisis_detected = self.detector.detect(content);
        if crisis_detected {
            info!("Crisis language detected, showing resources");
            session.raise_crisis();
        }

        let prompt = build_prompt(&ticket.history, content, self.history_window);
        let mut guard = PendingGuard::new(session);

        let result = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => Err(AppError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.inference.invoke(&prompt)) => {
                match outcome {
                    Ok(reply) => reply,
                    Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
                }
            }
        };
        guard.disarm();

        match result {
            Ok(reply) => {
                debug!(reply_len = reply.len(), "Reply received");
                session.complete_request(reply.clone());
                Ok(SubmitOutcome::Replied {
                    reply,
                    crisis_detected,
                })
            }
            Err(AppError::Cancelled) => {
                info!("Chat request cancelled");
                session.reset_request();
                Err(AppError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                session.fail_request(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::ChatState;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Echo {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InferenceService for Echo {
        async fn invoke(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok("I'm listening.".to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct Broken;

    #[async_trait]
    impl InferenceService for Broken {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Inference("upstream down".to_string()))
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    fn echo() -> Arc<Echo> {
        Arc::new(Echo {
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_blank_submit_is_rejected() {
        let inference = echo();
        let chat = ChatOrchestrator::new(inference.clone());
        let session = ChatSession::new();

        let outcome = chat.submit(&session, "   \n\t").await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                reason: RejectReason::Empty
            }
        );
        assert_eq!(session.messages().len(), 1);
        assert!(inference.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_reply_is_appended() {
        let inference = echo();
        let chat = ChatOrchestrator::new(inference.clone());
        let session = ChatSession::new();

        let outcome = chat.submit(&session, "  rough day  ").await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Replied {
                reply: "I'm listening.".to_string(),
                crisis_detected: false
            }
        );

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "rough day");
        assert_eq!(session.state(), ChatState::Idle);
        assert!(inference.prompts.lock()[0].contains("User: rough day"));
    }

    #[tokio::test]
    async fn test_crisis_raises_banner() {
        let chat = ChatOrchestrator::new(echo());
        let session = ChatSession::new();

        let outcome = chat.submit(&session, "I feel worthless").await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Replied {
                crisis_detected: true,
                ..
            }
        ));
        assert!(session.crisis_banner());
    }

    #[tokio::test]
    async fn test_failure_leaves_session_failed() {
        let chat = ChatOrchestrator::new(Arc::new(Broken));
        let session = ChatSession::new();

        let err = chat.submit(&session, "hello").await.unwrap_err();
        assert!(matches!(err, AppError::Inference(_)));
        assert!(matches!(session.state(), ChatState::Failed { .. }));
        // The user's message stays in the transcript.
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_history_window_limits_prompt() {
        let inference = echo();
        let chat = ChatOrchestrator::new(inference.clone()).with_history_window(Some(1));
        let session = ChatSession::new();

        chat.submit(&session, "first").await.unwrap();
        chat.submit(&session, "second").await.unwrap();

        let prompts = inference.prompts.lock();
        assert!(!prompts[1].contains("User: first"));
        assert!(prompts[1].contains("Assistant: I'm listening."));
    }
}
