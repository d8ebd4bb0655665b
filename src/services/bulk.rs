use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::errors::ServiceError;
use crate::models::{Priority, WorkOrderStatus};

use super::hierarchy::HierarchyService;
use super::time_tracking::TimeTrackingService;

/// Granularity of a bulk selection: flat ids are work orders, hierarchical
/// ids are jobs whose actions cascade to every child work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Flat,
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSelection {
    pub ids: Vec<Uuid>,
    pub view_mode: ViewMode,
}

/// One action applied across the whole selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum BulkAction {
    Assign { technician_id: Uuid },
    SetStatus { status: WorkOrderStatus },
    SetPriority { priority: Priority },
    Reschedule {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Delete,
    ApproveTime,
    RejectTime { reason: String },
}

impl BulkAction {
    fn requires_admin(&self) -> bool {
        matches!(
            self,
            BulkAction::Delete | BulkAction::ApproveTime | BulkAction::RejectTime { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            BulkAction::Assign { .. } => "assign",
            BulkAction::SetStatus { .. } => "set_status",
            BulkAction::SetPriority { .. } => "set_priority",
            BulkAction::Reschedule { .. } => "reschedule",
            BulkAction::Delete => "delete",
            BulkAction::ApproveTime => "approve_time",
            BulkAction::RejectTime { .. } => "reject_time",
        }
    }
}

/// Outcome of the action for one selection id. Errors are carried
/// verbatim so the caller can surface them per item.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub id: Uuid,
    pub result: Result<BulkSuccess, ServiceError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkSuccess {
    /// Entities the action ultimately touched under this selection id
    /// (child work orders in hierarchical mode, resolved time entries for
    /// approve/reject).
    pub affected: usize,
}

/// Per-item report for a bulk action; the full selection is always
/// processed, successes commit regardless of other rows' failures.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub action: String,
    pub outcomes: Vec<BulkOutcome>,
}

impl BulkReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn outcome_for(&self, id: Uuid) -> Option<&BulkOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Applies one action across a flat or hierarchical selection with
/// partial-failure semantics. Per-item locks are taken one at a time and
/// released between items, so one failed or slow item never blocks the
/// rest.
#[derive(Clone)]
pub struct BulkCoordinator {
    hierarchy: Arc<HierarchyService>,
    time_tracking: Arc<TimeTrackingService>,
}

impl BulkCoordinator {
    pub fn new(hierarchy: Arc<HierarchyService>, time_tracking: Arc<TimeTrackingService>) -> Self {
        Self {
            hierarchy,
            time_tracking,
        }
    }

    /// Applies `action` to every id in the selection and reports per-item
    /// outcomes. Never aborts on the first error.
    #[instrument(skip(self, selection, action, actor), fields(action = action.name(), items = selection.ids.len()))]
    pub async fn apply(
        &self,
        selection: &BulkSelection,
        action: &BulkAction,
        actor: &Actor,
    ) -> BulkReport {
        let mut outcomes = Vec::with_capacity(selection.ids.len());

        for &id in &selection.ids {
            let result = if action.requires_admin() && !actor.is_admin() {
                Err(ServiceError::Forbidden(format!(
                    "{} requires an admin role",
                    action.name()
                )))
            } else {
                match selection.view_mode {
                    ViewMode::Flat => self.apply_to_work_order(id, action, actor).await,
                    ViewMode::Hierarchical => self.apply_to_job(id, action, actor).await,
                }
            };
            outcomes.push(BulkOutcome { id, result });
        }

        let report = BulkReport {
            action: action.name().to_string(),
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "bulk action applied"
        );
        report
    }

    async fn apply_to_work_order(
        &self,
        wo_id: Uuid,
        action: &BulkAction,
        actor: &Actor,
    ) -> Result<BulkSuccess, ServiceError> {
        match action {
            BulkAction::Assign { technician_id } => {
                self.hierarchy
                    .reassign_technician(wo_id, *technician_id)
                    .await?;
                Ok(BulkSuccess { affected: 1 })
            }
            BulkAction::SetStatus { status } => {
                self.hierarchy.set_work_order_status(wo_id, *status).await?;
                Ok(BulkSuccess { affected: 1 })
            }
            BulkAction::SetPriority { priority } => {
                self.hierarchy
                    .set_work_order_priority(wo_id, *priority)
                    .await?;
                Ok(BulkSuccess { affected: 1 })
            }
            BulkAction::Reschedule { start, end } => {
                self.hierarchy
                    .reschedule_work_order(wo_id, *start, *end)
                    .await?;
                Ok(BulkSuccess { affected: 1 })
            }
            BulkAction::Delete => {
                self.hierarchy.delete_work_order(wo_id, actor).await?;
                Ok(BulkSuccess { affected: 1 })
            }
            BulkAction::ApproveTime => self.resolve_pending(wo_id, actor, None).await,
            BulkAction::RejectTime { reason } => {
                self.resolve_pending(wo_id, actor, Some(reason.clone())).await
            }
        }
    }

    async fn apply_to_job(
        &self,
        job_id: Uuid,
        action: &BulkAction,
        actor: &Actor,
    ) -> Result<BulkSuccess, ServiceError> {
        // Delete targets the job itself, with the non-cascade guard.
        if matches!(action, BulkAction::Delete) {
            self.hierarchy.delete_job(job_id, false, actor).await?;
            return Ok(BulkSuccess { affected: 1 });
        }

        let work_order_ids = self.hierarchy.get_job(job_id)?.work_order_ids;
        let mut affected = 0;
        for wo_id in work_order_ids {
            // A child failure fails the whole selection id; earlier
            // children stay committed (the report row explains why).
            let child = self.apply_to_work_order(wo_id, action, actor).await?;
            affected += child.affected;
        }
        Ok(BulkSuccess { affected })
    }

    /// Resolves every pending time entry under a work order. A reason
    /// rejects; no reason approves. Zero pending entries is a success with
    /// nothing affected.
    async fn resolve_pending(
        &self,
        wo_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<BulkSuccess, ServiceError> {
        // Surface NotFound for dangling selection ids.
        self.hierarchy.work_order_handle(wo_id)?;

        let pending = self.time_tracking.pending_entries_for(wo_id);
        let mut affected = 0;
        for entry_id in pending {
            match &reason {
                Some(reason) => {
                    self.time_tracking
                        .reject(entry_id, actor, reason.clone())
                        .await?;
                }
                None => {
                    self.time_tracking.approve(entry_id, actor).await?;
                }
            }
            affected += 1;
        }
        Ok(BulkSuccess { affected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_use_tagged_wire_shape() {
        let tech = Uuid::new_v4();
        assert_eq!(
            serde_json::to_value(BulkAction::Assign { technician_id: tech }).unwrap(),
            json!({ "action": "assign", "technician_id": tech })
        );
        assert_eq!(
            serde_json::to_value(BulkAction::SetStatus {
                status: WorkOrderStatus::InProgress,
            })
            .unwrap(),
            json!({ "action": "set_status", "status": "in_progress" })
        );
        assert_eq!(
            serde_json::to_value(BulkAction::Delete).unwrap(),
            json!({ "action": "delete" })
        );

        let parsed: BulkAction = serde_json::from_value(json!({
            "action": "reject_time",
            "reason": "no matching work order",
        }))
        .unwrap();
        assert_matches::assert_matches!(parsed, BulkAction::RejectTime { .. });
    }

    #[test]
    fn reports_carry_errors_verbatim() {
        let id = Uuid::new_v4();
        let report = BulkReport {
            action: "delete".to_string(),
            outcomes: vec![BulkOutcome {
                id,
                result: Err(ServiceError::Forbidden(
                    "delete requires an admin role".to_string(),
                )),
            }],
        };
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["outcomes"][0]["result"]["Err"]["Forbidden"],
            json!("delete requires an admin role")
        );
    }
}
