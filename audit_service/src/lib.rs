// audit_service/src/lib.rs
//
// Append-only audit recording. Every component writes here; a sink failure is
// logged and swallowed so it can never block the primary emergency operation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use models::audit::AuditEvent;
use models::errors::Result;

/// Append-only audit sink. Events are never mutated or deleted by this core;
/// retention cleanup is an external concern.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Records an event, downgrading any sink failure to a WARN log.
pub async fn record_or_log(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action.clone();
    if let Err(e) = sink.record(event).await {
        warn!(action = %action, error = %e, "audit write failed; continuing");
    }
}

/// In-memory append-only log. The default sink for tests and embeddings that
/// forward events to an external store themselves.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        let mut events = self.events.write().await;
        events.push(event);
        Ok(())
    }
}
