//! Mock implementations for testing.
//!
//! Inference services and stores that can be shared across the integration
//! test files without duplication.

#![allow(dead_code)]

use async_trait::async_trait;
use mindful::llm::InferenceService;
use mindful::store::{EntityKind, EntityStore, Filter, InMemoryEntityStore, OrderSpec, Record};
use mindful::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Mock inference service with a fixed reply.
///
/// Every prompt it receives is recorded so tests can assert on what the chat
/// core actually sent.
///
/// # Examples
///
/// ```ignore
/// let inference = MockInference::new("I hear you.");
/// let failing = MockInference::failing();
/// ```
pub struct MockInference {
    reply: String,
    should_fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockInference {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            should_fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A service that always returns an inference error.
    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            should_fail: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::Inference("Mock inference failure".to_string()));
        }
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Inference that holds every call until released.
///
/// `started` is notified when a call begins, so tests can act while the
/// session is known to be Pending.
pub struct GatedInference {
    reply: String,
    gate: Notify,
    pub started: Notify,
    calls: AtomicUsize,
}

impl GatedInference {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            gate: Notify::new(),
            started: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Let the waiting call finish.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceService for GatedInference {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "gated"
    }
}

/// Inference that never answers.
pub struct HangingInference;

#[async_trait]
impl InferenceService for HangingInference {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        std::future::pending::<()>().await;
        Ok(String::new())
    }

    fn model_name(&self) -> &str {
        "hanging"
    }
}

/// In-memory store without atomic increments that loses the first
/// `conflicts` version-checked writes, as if another writer got there first.
pub struct ConflictingStore {
    inner: InMemoryEntityStore,
    conflicts: AtomicU32,
    versioned_updates: AtomicU32,
}

impl ConflictingStore {
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryEntityStore::without_atomic_increment(),
            conflicts: AtomicU32::new(conflicts),
            versioned_updates: AtomicU32::new(0),
        }
    }

    pub fn inner(&self) -> &InMemoryEntityStore {
        &self.inner
    }

    /// Number of version-checked updates attempted so far.
    pub fn versioned_updates(&self) -> u32 {
        self.versioned_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for ConflictingStore {
    async fn list(&self, kind: EntityKind, order: &OrderSpec) -> Result<Vec<Record>> {
        self.inner.list(kind, order).await
    }

    async fn filter(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: &OrderSpec,
    ) -> Result<Vec<Record>> {
        self.inner.filter(kind, filter, order).await
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Record> {
        self.inner.get(kind, id).await
    }

    async fn create(&self, kind: EntityKind, fields: Record) -> Result<Record> {
        self.inner.create(kind, fields).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<Record> {
        if expected_version.is_some() {
            self.versioned_updates.fetch_add(1, Ordering::SeqCst);
            let lost = self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if lost {
                return Err(AppError::Conflict(format!("{} {} changed", kind, id)));
            }
        }
        self.inner.update(kind, id, fields, expected_version).await
    }

    async fn increment_field(
        &self,
        kind: EntityKind,
        id: &str,
        field: &str,
        delta: u64,
    ) -> Result<Record> {
        self.inner.increment_field(kind, id, field, delta).await
    }
}
