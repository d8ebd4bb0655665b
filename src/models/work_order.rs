use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

use super::checklist::ChecklistInstance;
use super::evidence::Evidence;
use super::status::{Priority, WorkOrderStatus};

/// A schedulable unit of work under a job, assigned to a technician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub job_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub work_order_type: String,
    pub priority: Priority,
    pub status: WorkOrderStatus,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub estimated_minutes: Option<i64>,
    /// Sum of approved-or-pending clocked time against this order.
    pub actual_minutes: i64,
    pub primary_technician: Option<Uuid>,
    /// Additional crew; set semantics, no duplicates.
    pub additional_technicians: BTreeSet<Uuid>,
    pub time_entry_ids: Vec<Uuid>,
    pub checklist: Option<ChecklistInstance>,
    /// Evidence log mirrored from checklist execution, newest last.
    pub evidence: Vec<Evidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// True when the checklist requirement does not block completion:
    /// either there is no checklist, or it has completed.
    pub fn checklist_satisfied(&self) -> bool {
        self.checklist
            .as_ref()
            .map(|c| c.is_completed())
            .unwrap_or(true)
    }

    /// Closed-open interval intersection with another order's schedule.
    /// Back-to-back orders (end == next start) do not overlap.
    pub fn overlaps(&self, other: &WorkOrder) -> bool {
        self.scheduled_start < other.scheduled_end && other.scheduled_start < self.scheduled_end
    }

    /// All technicians attached to this order, primary first.
    pub fn technicians(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.primary_technician
            .into_iter()
            .chain(self.additional_technicians.iter().copied())
    }
}

/// Input for creating a work order under a job.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWorkOrder {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub work_order_type: String,
    /// Free-form priority, normalized at the boundary.
    #[serde(default)]
    pub priority: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub estimated_minutes: Option<i64>,
    pub primary_technician: Option<Uuid>,
}
