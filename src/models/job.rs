use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::checklist::ChecklistTemplate;
use super::status::{JobStatus, Priority};
use super::work_order::WorkOrder;

/// Top-level unit of client work, containing zero or more work orders.
///
/// `stored_status` / `stored_priority` are only authoritative while the
/// job has no work orders; once any exist, status and priority are derived
/// from the children on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub job_type: String,
    pub client_name: String,
    pub client_contact: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Decimal,
    pub location: String,
    /// Ordered child work orders.
    pub work_order_ids: Vec<Uuid>,
    pub checklist_templates: Vec<ChecklistTemplate>,
    pub stored_status: JobStatus,
    pub stored_priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a job. Free-form status/priority strings are
/// normalized at this boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewJob {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub job_type: String,
    #[validate(length(min = 1))]
    pub client_name: String,
    pub client_contact: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Decimal,
    #[validate(length(min = 1))]
    pub location: String,
    /// Free-form status as received from the boundary (e.g. "In Progress").
    #[serde(default)]
    pub status: Option<String>,
    /// Free-form priority as received from the boundary (e.g. "High").
    #[serde(default)]
    pub priority: Option<String>,
}

/// Partial update of a job's client-facing fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    pub name: Option<String>,
    pub job_type: Option<String>,
    pub client_name: Option<String>,
    pub client_contact: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<Decimal>,
    pub location: Option<String>,
}

/// A job together with a snapshot of its work order tree (the
/// hierarchical query shape).
#[derive(Debug, Clone, Serialize)]
pub struct JobTree {
    pub job: Job,
    pub work_orders: Vec<WorkOrder>,
    pub derived_status: JobStatus,
    pub derived_priority: Priority,
}

/// Flat listing row for a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub name: String,
    pub client_name: String,
    pub location: String,
    pub status: JobStatus,
    pub priority: Priority,
    pub work_order_count: usize,
    pub created_at: DateTime<Utc>,
}
