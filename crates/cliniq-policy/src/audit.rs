//! Deferred audit trail recording.
//!
//! Services record audit entries through an in-process outbox: `record`
//! pushes onto an unbounded channel and returns immediately, so the
//! write path never waits on the audit store and never fails because of
//! it. A separate drain task appends the queued entries through the
//! audit repository in its own storage context. Entries are therefore
//! durable only after the drain catches up; on a crash, queued entries
//! are lost, and the triggering writes stand.

use cliniq_core::context::ActorContext;
use cliniq_core::models::audit::{AuditAction, CreateAuditLogEntry};
use cliniq_core::repository::AuditLogRepository;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Sending half of the audit outbox; cheap to clone, one per service.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    tx: mpsc::UnboundedSender<CreateAuditLogEntry>,
}

impl AuditRecorder {
    /// Queue an audit entry.
    ///
    /// Infallible by contract: if the outbox has shut down, the entry is
    /// dropped with a warning rather than failing the operation that
    /// produced it.
    pub fn record(&self, entry: CreateAuditLogEntry) {
        if self.tx.send(entry).is_err() {
            tracing::warn!("audit outbox is closed, dropping audit entry");
        }
    }

    /// Build and queue an entry for an actor-driven change.
    pub fn record_change(
        &self,
        actor: &ActorContext,
        cabinet_id: Uuid,
        action: AuditAction,
        entity_type: &str,
        entity_id: impl ToString,
        old_state: Option<serde_json::Value>,
        new_state: Option<serde_json::Value>,
    ) {
        self.record(CreateAuditLogEntry {
            cabinet_id: Some(cabinet_id),
            actor_id: Some(actor.actor_id),
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
            old_state,
            new_state,
            ip_address: actor.ip_address.clone(),
        });
    }
}

/// Receiving half of the audit outbox, bound to the audit repository
/// that persists drained entries.
pub struct AuditOutbox<R: AuditLogRepository> {
    repo: R,
    rx: mpsc::UnboundedReceiver<CreateAuditLogEntry>,
}

/// Create a connected recorder/outbox pair.
pub fn channel<R: AuditLogRepository>(repo: R) -> (AuditRecorder, AuditOutbox<R>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AuditRecorder { tx }, AuditOutbox { repo, rx })
}

impl<R: AuditLogRepository> AuditOutbox<R> {
    /// Drain entries until every recorder handle has been dropped.
    ///
    /// Runs as a background task for the life of the process.
    pub async fn run(mut self) {
        while let Some(entry) = self.rx.recv().await {
            self.append(entry).await;
        }
        tracing::debug!("audit outbox channel closed, drain task exiting");
    }

    /// Synchronously drain everything queued right now.
    ///
    /// Used at shutdown to flush, and by tests to force deferred entries
    /// through without a background task. Returns the number of entries
    /// processed.
    pub async fn process_available(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(entry) = self.rx.try_recv() {
            self.append(entry).await;
            processed += 1;
        }
        processed
    }

    async fn append(&self, entry: CreateAuditLogEntry) {
        // Audit persistence failures never propagate to the write path;
        // the entry is logged locally as the fallback trail.
        if let Err(e) = self.repo.append(entry).await {
            tracing::error!(error = %e, "failed to persist audit entry");
        }
    }
}
