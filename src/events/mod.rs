use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::models::status::{JobStatus, WorkOrderStatus};

/// Domain events emitted by the core for an external notification
/// dispatcher. Emission is best-effort and happens after the state change
/// has committed; a dropped event never rolls an operation back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Job events
    JobCreated(Uuid),
    JobUpdated(Uuid),
    JobDeleted(Uuid),
    JobStatusChanged {
        job_id: Uuid,
        old_status: JobStatus,
        new_status: JobStatus,
    },

    // Work order events
    WorkOrderCreated {
        job_id: Uuid,
        work_order_id: Uuid,
    },
    WorkOrderStatusChanged {
        work_order_id: Uuid,
        old_status: WorkOrderStatus,
        new_status: WorkOrderStatus,
    },
    WorkOrderCompleted(Uuid),
    WorkOrderDeleted(Uuid),
    TechnicianAssigned {
        work_order_id: Uuid,
        technician_id: Uuid,
    },

    // Checklist events
    ChecklistInstantiated {
        work_order_id: Uuid,
        instance_id: Uuid,
    },
    ChecklistItemCompleted {
        instance_id: Uuid,
        item_id: Uuid,
        completed_by: Uuid,
    },
    ChecklistCompleted {
        work_order_id: Uuid,
        instance_id: Uuid,
    },

    // Time tracking events
    TechnicianClockedIn {
        entry_id: Uuid,
        technician_id: Uuid,
        work_order_id: Option<Uuid>,
    },
    TimeEntryPendingApproval {
        entry_id: Uuid,
        technician_id: Uuid,
        duration_minutes: i64,
    },
    TimeEntryApproved {
        entry_id: Uuid,
        approved_by: Uuid,
        approved_at: DateTime<Utc>,
    },
    TimeEntryRejected {
        entry_id: Uuid,
        rejected_by: Uuid,
        reason: String,
    },
}

/// Sends domain events to the notification channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving half.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    /// Sends an event, waiting for channel capacity.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Best-effort emission used after a committed state change. A full or
    /// closed channel logs a warning and drops the event.
    pub fn emit(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!(error = %e, "dropping domain event");
        }
    }
}

/// Convenience for services holding an optional sender.
pub fn emit(sender: &Option<EventSender>, event: Event) {
    if let Some(sender) = sender {
        sender.emit(event);
    }
}
