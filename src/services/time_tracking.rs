use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::errors::ServiceError;
use crate::events::{emit, Event, EventSender};
use crate::models::{rounded_duration_minutes, GeoPoint, TimeEntry, TimeEntryStatus};

/// In-memory store of time entries plus the technician -> active-entry
/// index that enforces the one-session-per-technician rule.
#[derive(Default)]
pub struct TimeLog {
    entries: DashMap<Uuid, TimeEntry>,
    active_by_technician: DashMap<Uuid, Uuid>,
}

impl TimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entry_id: Uuid) -> Option<TimeEntry> {
        self.entries.get(&entry_id).map(|e| e.clone())
    }

    /// True when the work order has any non-terminal entry (active or
    /// pending). Such entries block non-cascade job deletion.
    pub fn has_open_entry_for(&self, work_order_id: Uuid) -> bool {
        self.entries.iter().any(|entry| {
            entry.work_order_id == Some(work_order_id) && !entry.status.is_terminal()
        })
    }

    /// Cascade-deletes every entry recorded against a work order.
    pub fn remove_entries_for(&self, work_order_id: Uuid) -> usize {
        let ids: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|entry| entry.work_order_id == Some(work_order_id))
            .map(|entry| entry.id)
            .collect();
        for id in &ids {
            if let Some((_, removed)) = self.entries.remove(id) {
                if removed.is_active() {
                    self.active_by_technician.remove(&removed.technician_id);
                }
            }
        }
        ids.len()
    }

    /// Atomically claims the technician's single active slot. The vacant
    /// check and the insert happen under one index entry, so two racing
    /// clock-ins cannot both succeed.
    fn claim_active_slot(&self, technician_id: Uuid, entry_id: Uuid) -> Result<(), ServiceError> {
        match self.active_by_technician.entry(technician_id) {
            dashmap::mapref::entry::Entry::Occupied(existing) => Err(ServiceError::Conflict(
                format!(
                    "Technician {} already has an active time entry ({})",
                    technician_id,
                    existing.get()
                ),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entry_id);
                Ok(())
            }
        }
    }

    fn release_active_slot(&self, technician_id: Uuid) {
        self.active_by_technician.remove(&technician_id);
    }
}

/// Filter for the approval queue.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryFilter {
    pub status: Option<TimeEntryStatus>,
    pub technician: Option<Uuid>,
    pub work_order_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Owns the time entry lifecycle: `Active -> Pending -> {Approved,
/// Rejected}`. No transition skips a state; the terminal transitions are
/// admin-only.
#[derive(Clone)]
pub struct TimeTrackingService {
    time_log: Arc<TimeLog>,
    hierarchy: Arc<super::hierarchy::HierarchyService>,
    event_sender: Option<EventSender>,
}

impl TimeTrackingService {
    pub fn new(
        time_log: Arc<TimeLog>,
        hierarchy: Arc<super::hierarchy::HierarchyService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            time_log,
            hierarchy,
            event_sender,
        }
    }

    /// Starts a session for a technician, against a work order or HQ
    /// (`work_order_id == None`).
    ///
    /// A technician holds at most one active session at a time; a second
    /// clock-in fails with Conflict.
    #[instrument(skip(self))]
    pub async fn clock_in(
        &self,
        technician_id: Uuid,
        work_order_id: Option<Uuid>,
        geolocation: Option<GeoPoint>,
    ) -> Result<TimeEntry, ServiceError> {
        // Validate the target before claiming the active slot.
        let wo_handle = match work_order_id {
            Some(wo_id) => Some(self.hierarchy.work_order_handle(wo_id)?),
            None => None,
        };

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            work_order_id,
            technician_id,
            clock_in: Utc::now(),
            clock_out: None,
            duration_minutes: None,
            status: TimeEntryStatus::Active,
            notes: None,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            geolocation,
        };

        self.time_log.claim_active_slot(technician_id, entry.id)?;
        self.time_log.entries.insert(entry.id, entry.clone());

        if let Some(handle) = wo_handle {
            let mut order = handle.write().await;
            order.time_entry_ids.push(entry.id);
            order.updated_at = Utc::now();
        }

        info!(
            entry_id = %entry.id,
            %technician_id,
            work_order = ?work_order_id,
            "technician clocked in"
        );
        emit(
            &self.event_sender,
            Event::TechnicianClockedIn {
                entry_id: entry.id,
                technician_id,
                work_order_id,
            },
        );
        Ok(entry)
    }

    /// Ends an active session now.
    pub async fn clock_out(&self, entry_id: Uuid) -> Result<TimeEntry, ServiceError> {
        self.clock_out_at(entry_id, Utc::now()).await
    }

    /// Ends an active session at an explicit timestamp.
    ///
    /// The duration is `clock_out - clock_in` rounded to whole minutes; a
    /// non-positive duration is a validation error, never clamped.
    #[instrument(skip(self))]
    pub async fn clock_out_at(
        &self,
        entry_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<TimeEntry, ServiceError> {
        let mut entry_ref = self
            .time_log
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| Self::entry_not_found(entry_id))?;
        let entry = entry_ref.value_mut();

        if entry.status != TimeEntryStatus::Active {
            return Err(ServiceError::InvalidState(format!(
                "Time entry {} is {}; only active entries can be clocked out",
                entry_id, entry.status
            )));
        }

        let duration = rounded_duration_minutes(entry.clock_in, at).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Clock-out at {} yields a non-positive duration for entry {}",
                at, entry_id
            ))
        })?;

        entry.clock_out = Some(at);
        entry.duration_minutes = Some(duration);
        entry.status = TimeEntryStatus::Pending;
        let updated = entry.clone();
        drop(entry_ref);

        self.time_log.release_active_slot(updated.technician_id);

        if let Some(wo_id) = updated.work_order_id {
            if let Ok(handle) = self.hierarchy.work_order_handle(wo_id) {
                let mut order = handle.write().await;
                order.actual_minutes += duration;
                order.updated_at = Utc::now();
            }
        }

        info!(%entry_id, duration_minutes = duration, "time entry pending approval");
        emit(
            &self.event_sender,
            Event::TimeEntryPendingApproval {
                entry_id,
                technician_id: updated.technician_id,
                duration_minutes: duration,
            },
        );
        Ok(updated)
    }

    /// Approves a pending entry. Terminal; admin only.
    #[instrument(skip(self, actor))]
    pub async fn approve(&self, entry_id: Uuid, actor: &Actor) -> Result<TimeEntry, ServiceError> {
        actor.require_admin("approve")?;

        let mut entry_ref = self
            .time_log
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| Self::entry_not_found(entry_id))?;
        let entry = entry_ref.value_mut();
        Self::require_pending(entry, "approved")?;

        let now = Utc::now();
        entry.status = TimeEntryStatus::Approved;
        entry.approved_by = Some(actor.id);
        entry.approved_at = Some(now);
        let updated = entry.clone();
        drop(entry_ref);

        info!(%entry_id, approved_by = %actor.id, "time entry approved");
        emit(
            &self.event_sender,
            Event::TimeEntryApproved {
                entry_id,
                approved_by: actor.id,
                approved_at: now,
            },
        );
        Ok(updated)
    }

    /// Rejects a pending entry with a reason. Terminal; admin only.
    #[instrument(skip(self, actor, reason))]
    pub async fn reject(
        &self,
        entry_id: Uuid,
        actor: &Actor,
        reason: impl Into<String>,
    ) -> Result<TimeEntry, ServiceError> {
        actor.require_admin("reject")?;
        let reason = reason.into();

        let mut entry_ref = self
            .time_log
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| Self::entry_not_found(entry_id))?;
        let entry = entry_ref.value_mut();
        Self::require_pending(entry, "rejected")?;

        entry.status = TimeEntryStatus::Rejected;
        entry.approved_by = Some(actor.id);
        entry.approved_at = Some(Utc::now());
        entry.rejection_reason = Some(reason.clone());
        let updated = entry.clone();
        drop(entry_ref);

        info!(%entry_id, rejected_by = %actor.id, "time entry rejected");
        emit(
            &self.event_sender,
            Event::TimeEntryRejected {
                entry_id,
                rejected_by: actor.id,
                reason,
            },
        );
        Ok(updated)
    }

    /// Fetches one entry.
    pub fn get_entry(&self, entry_id: Uuid) -> Result<TimeEntry, ServiceError> {
        self.time_log
            .get(entry_id)
            .ok_or_else(|| Self::entry_not_found(entry_id))
    }

    /// The technician's current active session, if any.
    pub fn active_entry(&self, technician_id: Uuid) -> Option<TimeEntry> {
        let entry_id = self
            .time_log
            .active_by_technician
            .get(&technician_id)
            .map(|e| *e.value())?;
        self.time_log.get(entry_id)
    }

    /// Lists entries for the approval queue, newest first.
    #[instrument(skip(self, filter))]
    pub fn list_entries(&self, filter: &TimeEntryFilter) -> Vec<TimeEntry> {
        let mut entries: Vec<TimeEntry> = self
            .time_log
            .entries
            .iter()
            .filter(|entry| {
                filter.status.map_or(true, |s| s == entry.status)
                    && filter.technician.map_or(true, |t| t == entry.technician_id)
                    && filter
                        .work_order_id
                        .map_or(true, |w| entry.work_order_id == Some(w))
                    && filter.from.map_or(true, |f| entry.clock_in >= f)
                    && filter.to.map_or(true, |t| entry.clock_in <= t)
            })
            .map(|entry| entry.clone())
            .collect();
        entries.sort_by(|a, b| b.clock_in.cmp(&a.clock_in));
        entries
    }

    /// Pending entry ids recorded against a work order, used by bulk
    /// approve/reject.
    pub(crate) fn pending_entries_for(&self, work_order_id: Uuid) -> Vec<Uuid> {
        self.time_log
            .entries
            .iter()
            .filter(|entry| {
                entry.work_order_id == Some(work_order_id)
                    && entry.status == TimeEntryStatus::Pending
            })
            .map(|entry| entry.id)
            .collect()
    }

    fn require_pending(entry: &TimeEntry, action: &str) -> Result<(), ServiceError> {
        if entry.status == TimeEntryStatus::Pending {
            Ok(())
        } else {
            Err(ServiceError::InvalidState(format!(
                "Time entry {} is {}; only pending entries can be {}",
                entry.id, entry.status, action
            )))
        }
    }

    fn entry_not_found(entry_id: Uuid) -> ServiceError {
        ServiceError::NotFound(format!("Time entry {} not found", entry_id))
    }
}
