use super::session::ChatSession;
use crate::types::{AppError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Live chat sessions, keyed by id.
///
/// Sessions are never persisted: ending one (explicitly or through idle
/// eviction) drops its transcript.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new());
        self.sessions
            .write()
            .insert(session.id().to_string(), session.clone());
        debug!(session_id = %session.id(), "Chat session created");
        session
    }

    pub fn get(&self, id: &str) -> Result<Arc<ChatSession>> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Chat session {}", id)))
    }

    /// Cancels anything in flight and forgets the session.
    pub fn end(&self, id: &str) -> Result<()> {
        let session = self
            .sessions
            .write()
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("Chat session {}", id)))?;
        session.end();
        debug!(session_id = %id, "Chat session ended");
        Ok(())
    }

    /// Ends sessions idle for longer than `max_idle`. Sessions waiting on a
    /// reply are kept. Returns how many were evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<Arc<ChatSession>> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<String> = sessions
                .values()
                .filter(|s| !s.state().is_pending() && s.idle_for() >= max_idle)
                .map(|s| s.id().to_string())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &expired {
            session.end();
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `interval` until `shutdown` fires.
    pub fn spawn_eviction(
        self: Arc<Self>,
        max_idle: Duration,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = self.evict_idle(max_idle);
                        if evicted > 0 {
                            info!(evicted, remaining = self.len(), "Evicted idle chat sessions");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_end() {
        let registry = SessionRegistry::new();
        let session = registry.create();
        let id = session.id().to_string();

        assert!(registry.get(&id).is_ok());
        registry.end(&id).unwrap();
        assert!(session.is_ended());
        assert!(matches!(registry.get(&id), Err(AppError::NotFound(_))));
        assert!(matches!(registry.end(&id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_evict_idle_skips_pending() {
        let registry = SessionRegistry::new();
        let idle = registry.create();
        let busy = registry.create();
        busy.begin_request("still typing").unwrap();

        assert_eq!(registry.evict_idle(Duration::ZERO), 1);
        assert!(idle.is_ended());
        assert!(registry.get(busy.id()).is_ok());
    }

    #[test]
    fn test_evict_idle_keeps_recent() {
        let registry = SessionRegistry::new();
        registry.create();
        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_eviction_task_stops_on_shutdown() {
        let registry = Arc::new(SessionRegistry::new());
        registry.create();
        let shutdown = CancellationToken::new();

        let handle = registry.clone().spawn_eviction(
            Duration::ZERO,
            Duration::from_millis(10),
            shutdown.clone(),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert!(registry.is_empty());
    }
}
