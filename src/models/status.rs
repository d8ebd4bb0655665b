use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Canonical work order / job priority. The derive order gives the total
/// order `Low < Medium < High < Urgent` used to derive job priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Canonical status at job granularity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    ToDo,
    InProgress,
    Completed,
    OnHold,
}

/// Canonical status at work order granularity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderStatus {
    ToDo,
    InProgress,
    Done,
}

/// Canonicalizes a free-form priority string.
///
/// Pure, total and idempotent: any input yields a priority, unrecognized
/// input defaults to `Medium`, and re-normalizing a canonical form is a
/// fixed point. Matching is case-insensitive substring containment so the
/// mixed vocabularies seen at external boundaries ("High", "urgent",
/// "priority_low") all land on one enum.
pub fn normalize_priority(raw: &str) -> Priority {
    let lowered = raw.to_lowercase();
    if lowered.contains("urgent") {
        Priority::Urgent
    } else if lowered.contains("high") {
        Priority::High
    } else if lowered.contains("low") {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Canonicalizes a free-form status string at job granularity.
///
/// Same contract as [`normalize_priority`]; unrecognized input defaults to
/// `ToDo`. "in progress" is checked before "completed" only in the sense
/// that each branch is disjoint by substring; `done` and `completed` both
/// map to `Completed`.
pub fn normalize_status(raw: &str) -> JobStatus {
    let lowered = raw.to_lowercase();
    if lowered.contains("in_progress") || lowered.contains("in progress") {
        JobStatus::InProgress
    } else if lowered.contains("completed") || lowered.contains("done") {
        JobStatus::Completed
    } else if lowered.contains("hold") {
        JobStatus::OnHold
    } else {
        JobStatus::ToDo
    }
}

impl WorkOrderStatus {
    /// Canonicalizes a free-form status string at work order granularity.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("in_progress") || lowered.contains("in progress") {
            WorkOrderStatus::InProgress
        } else if lowered.contains("done") || lowered.contains("completed") {
            WorkOrderStatus::Done
        } else {
            WorkOrderStatus::ToDo
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Done)
    }
}
