use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Lifecycle state of a time entry: `Active -> Pending -> {Approved,
/// Rejected}`. No transition skips a state; approved and rejected are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeEntryStatus {
    Active,
    Pending,
    Approved,
    Rejected,
}

impl TimeEntryStatus {
    /// Non-terminal entries block non-cascade job deletion: an unapproved
    /// pending entry still carries payroll data.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimeEntryStatus::Approved | TimeEntryStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A technician's clock-in/clock-out session, subject to administrator
/// approval. `work_order_id == None` is an HQ session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub work_order_id: Option<Uuid>,
    pub technician_id: Uuid,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    /// Defined iff `clock_out` is set; whole minutes, rounded.
    pub duration_minutes: Option<i64>,
    pub status: TimeEntryStatus,
    pub notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub geolocation: Option<GeoPoint>,
}

impl TimeEntry {
    pub fn is_active(&self) -> bool {
        self.status == TimeEntryStatus::Active
    }
}

/// Rounds a clock-in/clock-out pair to whole minutes.
///
/// Returns `None` when the rounded duration is not positive; callers
/// reject such pairs rather than clamping them.
pub fn rounded_duration_minutes(
    clock_in: DateTime<Utc>,
    clock_out: DateTime<Utc>,
) -> Option<i64> {
    let seconds = (clock_out - clock_in).num_seconds();
    // Round half-up at the 30s boundary.
    let minutes = (seconds + 30).div_euclid(60);
    (minutes > 0).then_some(minutes)
}
