use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{emit, Event, EventSender};
use crate::models::{
    normalize_priority, normalize_status, ChecklistTemplate, Job, JobStatus, JobSummary, JobTree,
    JobUpdate, NewJob, NewWorkOrder, Priority, WorkOrder, WorkOrderStatus,
};

use super::time_tracking::TimeLog;

/// Filter for the work order query surface.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub job_id: Option<Uuid>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    pub technician: Option<Uuid>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Filter for the job query surface. Status and priority match the
/// derived values, not the stored ones.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub priority: Option<Priority>,
    pub technician: Option<Uuid>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Owns the job -> work order hierarchy.
///
/// Work orders live behind one `RwLock` each, giving single-writer
/// semantics per order while keeping unrelated orders independent.
/// Aggregate reads (status/priority derivation, job trees) take the
/// job's work order read locks in id order so they observe a single
/// point-in-time snapshot.
#[derive(Clone)]
pub struct HierarchyService {
    jobs: Arc<DashMap<Uuid, Job>>,
    work_orders: Arc<DashMap<Uuid, Arc<RwLock<WorkOrder>>>>,
    time_log: Arc<TimeLog>,
    /// Serializes technician (re)assignment so the overlap check and the
    /// assignment commit are one atomic step.
    assign_guard: Arc<Mutex<()>>,
    event_sender: Option<EventSender>,
    default_page_size: u64,
}

impl HierarchyService {
    pub fn new(
        time_log: Arc<TimeLog>,
        event_sender: Option<EventSender>,
        default_page_size: u64,
    ) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            work_orders: Arc::new(DashMap::new()),
            time_log,
            assign_guard: Arc::new(Mutex::new(())),
            event_sender,
            default_page_size,
        }
    }

    // ---- Jobs -------------------------------------------------------------

    /// Creates a new job.
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn create_job(&self, spec: NewJob) -> Result<Job, ServiceError> {
        spec.validate()?;

        if spec.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Job name cannot be blank".to_string(),
            ));
        }
        if spec.client_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Client name cannot be blank".to_string(),
            ));
        }
        if spec.location.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Location cannot be blank".to_string(),
            ));
        }
        if spec.budget <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Budget must be positive, got: {}",
                spec.budget
            )));
        }

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            name: spec.name,
            job_type: spec.job_type,
            client_name: spec.client_name,
            client_contact: spec.client_contact,
            start_date: spec.start_date,
            end_date: spec.end_date,
            budget: spec.budget,
            location: spec.location,
            work_order_ids: Vec::new(),
            checklist_templates: Vec::new(),
            stored_status: spec
                .status
                .as_deref()
                .map(normalize_status)
                .unwrap_or(JobStatus::ToDo),
            stored_priority: spec
                .priority
                .as_deref()
                .map(normalize_priority)
                .unwrap_or(Priority::Medium),
            created_at: now,
            updated_at: now,
        };

        let job_id = job.id;
        self.jobs.insert(job_id, job.clone());
        info!(%job_id, client = %job.client_name, "job created");
        emit(&self.event_sender, Event::JobCreated(job_id));
        Ok(job)
    }

    /// Updates a job's client-facing fields.
    #[instrument(skip(self, update))]
    pub async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Job, ServiceError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Job name cannot be blank".to_string(),
                ));
            }
        }
        if let Some(client) = &update.client_name {
            if client.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Client name cannot be blank".to_string(),
                ));
            }
        }
        if let Some(location) = &update.location {
            if location.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Location cannot be blank".to_string(),
                ));
            }
        }
        if let Some(budget) = update.budget {
            if budget <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Budget must be positive, got: {}",
                    budget
                )));
            }
        }

        let mut entry = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| Self::job_not_found(job_id))?;
        let job = entry.value_mut();
        if let Some(name) = update.name {
            job.name = name;
        }
        if let Some(job_type) = update.job_type {
            job.job_type = job_type;
        }
        if let Some(client_name) = update.client_name {
            job.client_name = client_name;
        }
        if let Some(client_contact) = update.client_contact {
            job.client_contact = Some(client_contact);
        }
        if let Some(start_date) = update.start_date {
            job.start_date = Some(start_date);
        }
        if let Some(end_date) = update.end_date {
            job.end_date = Some(end_date);
        }
        if let Some(budget) = update.budget {
            job.budget = budget;
        }
        if let Some(location) = update.location {
            job.location = location;
        }
        job.updated_at = Utc::now();
        let updated = job.clone();
        drop(entry);

        emit(&self.event_sender, Event::JobUpdated(job_id));
        Ok(updated)
    }

    pub fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.jobs
            .get(&job_id)
            .map(|j| j.clone())
            .ok_or_else(|| Self::job_not_found(job_id))
    }

    /// Fetches a job with a point-in-time snapshot of its work order tree.
    #[instrument(skip(self))]
    pub async fn job_tree(&self, job_id: Uuid) -> Result<JobTree, ServiceError> {
        let job = self.get_job(job_id)?;
        let work_orders = self.snapshot_job_orders(&job).await;
        let statuses: Vec<_> = work_orders.iter().map(|w| w.status).collect();
        let priorities: Vec<_> = work_orders.iter().map(|w| w.priority).collect();
        Ok(JobTree {
            derived_status: derive_status(job.stored_status, &statuses),
            derived_priority: derive_priority(job.stored_priority, &priorities),
            job,
            work_orders,
        })
    }

    /// Deletes a job.
    ///
    /// With `cascade == false` the delete is refused while any child work
    /// order still has a non-terminal time entry; with `cascade == true`
    /// the job, its work orders, their checklist instances, evidence and
    /// time entries are all removed.
    #[instrument(skip(self, actor))]
    pub async fn delete_job(
        &self,
        job_id: Uuid,
        cascade: bool,
        actor: &crate::auth::Actor,
    ) -> Result<(), ServiceError> {
        actor.require_admin("delete_job")?;

        let work_order_ids = {
            let job = self
                .jobs
                .get(&job_id)
                .ok_or_else(|| Self::job_not_found(job_id))?;
            job.work_order_ids.clone()
        };

        if !cascade {
            for wo_id in &work_order_ids {
                if self.time_log.has_open_entry_for(*wo_id) {
                    return Err(ServiceError::Conflict(format!(
                        "Job {} has a work order with an active time entry; \
                         delete requires cascade",
                        job_id
                    )));
                }
            }
        }

        for wo_id in &work_order_ids {
            self.work_orders.remove(wo_id);
            let removed = self.time_log.remove_entries_for(*wo_id);
            if removed > 0 {
                warn!(work_order_id = %wo_id, removed, "cascade-deleted time entries");
            }
        }
        self.jobs.remove(&job_id);

        info!(%job_id, orders = work_order_ids.len(), "job deleted");
        emit(&self.event_sender, Event::JobDeleted(job_id));
        Ok(())
    }

    // ---- Work orders ------------------------------------------------------

    /// Creates a work order under a job.
    #[instrument(skip(self, spec), fields(title = %spec.title))]
    pub async fn add_work_order(
        &self,
        job_id: Uuid,
        spec: NewWorkOrder,
    ) -> Result<WorkOrder, ServiceError> {
        spec.validate()?;

        if spec.title.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Work order title cannot be blank".to_string(),
            ));
        }
        if spec.scheduled_end < spec.scheduled_start {
            return Err(ServiceError::ValidationError(format!(
                "Scheduled end ({}) cannot be before scheduled start ({})",
                spec.scheduled_end, spec.scheduled_start
            )));
        }
        if !self.jobs.contains_key(&job_id) {
            return Err(Self::job_not_found(job_id));
        }

        let now = Utc::now();
        let order = WorkOrder {
            id: Uuid::new_v4(),
            job_id,
            title: spec.title,
            description: spec.description,
            work_order_type: spec.work_order_type,
            priority: spec
                .priority
                .as_deref()
                .map(normalize_priority)
                .unwrap_or(Priority::Medium),
            status: WorkOrderStatus::ToDo,
            scheduled_start: spec.scheduled_start,
            scheduled_end: spec.scheduled_end,
            estimated_minutes: spec.estimated_minutes,
            actual_minutes: 0,
            primary_technician: spec.primary_technician,
            additional_technicians: BTreeSet::new(),
            time_entry_ids: Vec::new(),
            checklist: None,
            evidence: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let order_id = order.id;
        self.work_orders
            .insert(order_id, Arc::new(RwLock::new(order.clone())));

        // The job was checked above; it can only vanish here through a
        // concurrent delete, in which case the orphan order is removed too.
        match self.jobs.get_mut(&job_id) {
            Some(mut job) => {
                job.work_order_ids.push(order_id);
                job.updated_at = now;
            }
            None => {
                self.work_orders.remove(&order_id);
                return Err(Self::job_not_found(job_id));
            }
        }

        info!(%job_id, work_order_id = %order_id, "work order created");
        emit(
            &self.event_sender,
            Event::WorkOrderCreated {
                job_id,
                work_order_id: order_id,
            },
        );
        Ok(order)
    }

    /// Returns a snapshot of a single work order.
    pub async fn get_work_order(&self, wo_id: Uuid) -> Result<WorkOrder, ServiceError> {
        let handle = self.work_order_handle(wo_id)?;
        let order = handle.read().await;
        Ok(order.clone())
    }

    /// Changes a work order's status.
    ///
    /// Transitioning to `Done` is refused while the order carries an
    /// incomplete checklist instance.
    #[instrument(skip(self))]
    pub async fn set_work_order_status(
        &self,
        wo_id: Uuid,
        new_status: WorkOrderStatus,
    ) -> Result<WorkOrder, ServiceError> {
        let handle = self.work_order_handle(wo_id)?;

        let (job_id, old_status) = {
            let order = handle.read().await;
            (order.job_id, order.status)
        };
        if old_status == new_status {
            return self.get_work_order(wo_id).await;
        }
        let old_derived = self.derive_job_status(job_id).await.ok();

        let updated = {
            let mut order = handle.write().await;
            if new_status == WorkOrderStatus::Done && !order.checklist_satisfied() {
                return Err(ServiceError::Conflict(format!(
                    "Work order {} cannot be completed: checklist is incomplete",
                    wo_id
                )));
            }
            order.status = new_status;
            order.updated_at = Utc::now();
            order.clone()
        };

        info!(
            work_order_id = %wo_id,
            from = %old_status,
            to = %new_status,
            "work order status changed"
        );
        emit(
            &self.event_sender,
            Event::WorkOrderStatusChanged {
                work_order_id: wo_id,
                old_status,
                new_status,
            },
        );
        if new_status == WorkOrderStatus::Done {
            emit(&self.event_sender, Event::WorkOrderCompleted(wo_id));
        }
        self.emit_job_status_change(job_id, old_derived).await;
        Ok(updated)
    }

    /// Changes a work order's priority.
    #[instrument(skip(self))]
    pub async fn set_work_order_priority(
        &self,
        wo_id: Uuid,
        priority: Priority,
    ) -> Result<WorkOrder, ServiceError> {
        let handle = self.work_order_handle(wo_id)?;
        let mut order = handle.write().await;
        order.priority = priority;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    /// Moves a work order's scheduled window.
    #[instrument(skip(self))]
    pub async fn reschedule_work_order(
        &self,
        wo_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WorkOrder, ServiceError> {
        if end < start {
            return Err(ServiceError::ValidationError(format!(
                "Scheduled end ({}) cannot be before scheduled start ({})",
                end, start
            )));
        }
        let handle = self.work_order_handle(wo_id)?;
        let mut order = handle.write().await;
        order.scheduled_start = start;
        order.scheduled_end = end;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    /// Replaces the primary technician on a work order.
    ///
    /// Fails with Conflict when the technician already holds a work order
    /// whose scheduled interval intersects this one, anywhere in the
    /// store.
    #[instrument(skip(self))]
    pub async fn reassign_technician(
        &self,
        wo_id: Uuid,
        technician_id: Uuid,
    ) -> Result<WorkOrder, ServiceError> {
        let _guard = self.assign_guard.lock().await;

        let handle = self.work_order_handle(wo_id)?;
        let (start, end) = {
            let order = handle.read().await;
            (order.scheduled_start, order.scheduled_end)
        };

        if let Some(conflicting) = self
            .find_schedule_conflict(technician_id, wo_id, start, end)
            .await
        {
            return Err(ServiceError::Conflict(format!(
                "Technician {} already holds overlapping work order {}",
                technician_id, conflicting
            )));
        }

        let updated = {
            let mut order = handle.write().await;
            order.primary_technician = Some(technician_id);
            order.updated_at = Utc::now();
            order.clone()
        };

        info!(work_order_id = %wo_id, %technician_id, "technician reassigned");
        emit(
            &self.event_sender,
            Event::TechnicianAssigned {
                work_order_id: wo_id,
                technician_id,
            },
        );
        Ok(updated)
    }

    /// Adds a technician to the order's additional crew (set semantics).
    #[instrument(skip(self))]
    pub async fn add_additional_technician(
        &self,
        wo_id: Uuid,
        technician_id: Uuid,
    ) -> Result<WorkOrder, ServiceError> {
        let handle = self.work_order_handle(wo_id)?;
        let mut order = handle.write().await;
        if order.primary_technician != Some(technician_id) {
            order.additional_technicians.insert(technician_id);
            order.updated_at = Utc::now();
        }
        Ok(order.clone())
    }

    /// Deletes a work order, cascading its time entries and evidence.
    #[instrument(skip(self, actor))]
    pub async fn delete_work_order(
        &self,
        wo_id: Uuid,
        actor: &crate::auth::Actor,
    ) -> Result<(), ServiceError> {
        actor.require_admin("delete_work_order")?;

        let handle = self.work_order_handle(wo_id)?;
        let job_id = {
            let order = handle.read().await;
            order.job_id
        };

        self.work_orders.remove(&wo_id);
        self.time_log.remove_entries_for(wo_id);
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.work_order_ids.retain(|id| *id != wo_id);
            job.updated_at = Utc::now();
        }

        info!(work_order_id = %wo_id, %job_id, "work order deleted");
        emit(&self.event_sender, Event::WorkOrderDeleted(wo_id));
        Ok(())
    }

    // ---- Derivation -------------------------------------------------------

    /// Derives the job's status from its work orders.
    ///
    /// A job with no work orders keeps its stored status; otherwise the
    /// strict chain Completed > InProgress > ToDo is evaluated over the
    /// full set on every query.
    pub async fn derive_job_status(&self, job_id: Uuid) -> Result<JobStatus, ServiceError> {
        let job = self.get_job(job_id)?;
        let orders = self.snapshot_job_orders(&job).await;
        let statuses: Vec<_> = orders.iter().map(|w| w.status).collect();
        Ok(derive_status(job.stored_status, &statuses))
    }

    /// Derives the job's priority as the maximum of its work orders'.
    pub async fn derive_job_priority(&self, job_id: Uuid) -> Result<Priority, ServiceError> {
        let job = self.get_job(job_id)?;
        let orders = self.snapshot_job_orders(&job).await;
        let priorities: Vec<_> = orders.iter().map(|w| w.priority).collect();
        Ok(derive_priority(job.stored_priority, &priorities))
    }

    // ---- Queries ----------------------------------------------------------

    /// Lists work orders matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_work_orders(
        &self,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, ServiceError> {
        let handles: Vec<_> = self
            .work_orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut orders = Vec::with_capacity(handles.len());
        for handle in handles {
            let order = handle.read().await;
            if Self::matches_work_order(&order, filter) {
                orders.push(order.clone());
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.paginate(orders, filter.page, filter.limit))
    }

    /// Lists jobs matching the filter, newest first, with derived status
    /// and priority.
    #[instrument(skip(self, filter))]
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>, ServiceError> {
        let job_ids: Vec<Uuid> = self.jobs.iter().map(|entry| *entry.key()).collect();

        let mut summaries = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            let Ok(job) = self.get_job(job_id) else {
                continue;
            };
            let orders = self.snapshot_job_orders(&job).await;
            let status =
                derive_status(job.stored_status, &orders.iter().map(|w| w.status).collect::<Vec<_>>());
            let priority = derive_priority(
                job.stored_priority,
                &orders.iter().map(|w| w.priority).collect::<Vec<_>>(),
            );

            if filter.status.map_or(false, |s| s != status) {
                continue;
            }
            if filter.priority.map_or(false, |p| p != priority) {
                continue;
            }
            if let Some(tech) = filter.technician {
                if !orders.iter().any(|w| w.technicians().any(|t| t == tech)) {
                    continue;
                }
            }
            if let Some(from) = filter.scheduled_from {
                if !orders.iter().any(|w| w.scheduled_end >= from) {
                    continue;
                }
            }
            if let Some(to) = filter.scheduled_to {
                if !orders.iter().any(|w| w.scheduled_start <= to) {
                    continue;
                }
            }

            summaries.push(JobSummary {
                id: job.id,
                name: job.name.clone(),
                client_name: job.client_name.clone(),
                location: job.location.clone(),
                status,
                priority,
                work_order_count: orders.len(),
                created_at: job.created_at,
            });
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.paginate(summaries, filter.page, filter.limit))
    }

    // ---- Internal ---------------------------------------------------------

    pub(crate) fn work_order_handle(
        &self,
        wo_id: Uuid,
    ) -> Result<Arc<RwLock<WorkOrder>>, ServiceError> {
        self.work_orders
            .get(&wo_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Work order {} not found", wo_id)))
    }

    /// Stores a checklist template on its job.
    pub(crate) fn insert_template(
        &self,
        job_id: Uuid,
        template: ChecklistTemplate,
    ) -> Result<(), ServiceError> {
        let mut job = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| Self::job_not_found(job_id))?;
        job.checklist_templates.push(template);
        job.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn clone_template(
        &self,
        job_id: Uuid,
        template_id: Uuid,
    ) -> Result<ChecklistTemplate, ServiceError> {
        let job = self
            .jobs
            .get(&job_id)
            .ok_or_else(|| Self::job_not_found(job_id))?;
        job.checklist_templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Checklist template {} not found on job {}",
                    template_id, job_id
                ))
            })
    }

    /// Point-in-time snapshot of a job's work orders, in job order.
    ///
    /// Read locks are acquired in id order and held together until every
    /// order is read, so the snapshot never interleaves with a mutation.
    async fn snapshot_job_orders(&self, job: &Job) -> Vec<WorkOrder> {
        let mut handles: Vec<(Uuid, Arc<RwLock<WorkOrder>>)> = job
            .work_order_ids
            .iter()
            .filter_map(|id| self.work_orders.get(id).map(|e| (*id, e.value().clone())))
            .collect();
        handles.sort_by_key(|(id, _)| *id);

        let mut guards = Vec::with_capacity(handles.len());
        for (_, handle) in &handles {
            guards.push(handle.read().await);
        }

        let mut by_id: std::collections::HashMap<Uuid, WorkOrder> = guards
            .iter()
            .map(|guard| (guard.id, (**guard).clone()))
            .collect();
        job.work_order_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect()
    }

    async fn find_schedule_conflict(
        &self,
        technician_id: Uuid,
        exclude: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Uuid> {
        let handles: Vec<_> = self
            .work_orders
            .iter()
            .filter(|entry| *entry.key() != exclude)
            .map(|entry| entry.value().clone())
            .collect();

        for handle in handles {
            let order = handle.read().await;
            if order.primary_technician == Some(technician_id)
                && order.scheduled_start < end
                && start < order.scheduled_end
            {
                return Some(order.id);
            }
        }
        None
    }

    async fn emit_job_status_change(&self, job_id: Uuid, old_derived: Option<JobStatus>) {
        let Some(old_status) = old_derived else {
            return;
        };
        let Ok(new_status) = self.derive_job_status(job_id).await else {
            return;
        };
        if old_status != new_status {
            emit(
                &self.event_sender,
                Event::JobStatusChanged {
                    job_id,
                    old_status,
                    new_status,
                },
            );
        }
    }

    fn matches_work_order(order: &WorkOrder, filter: &WorkOrderFilter) -> bool {
        if filter.job_id.map_or(false, |id| id != order.job_id) {
            return false;
        }
        if filter.status.map_or(false, |s| s != order.status) {
            return false;
        }
        if filter.priority.map_or(false, |p| p != order.priority) {
            return false;
        }
        if let Some(tech) = filter.technician {
            if !order.technicians().any(|t| t == tech) {
                return false;
            }
        }
        if let Some(from) = filter.scheduled_from {
            if order.scheduled_end < from {
                return false;
            }
        }
        if let Some(to) = filter.scheduled_to {
            if order.scheduled_start > to {
                return false;
            }
        }
        true
    }

    fn paginate<T>(&self, rows: Vec<T>, page: Option<u64>, limit: Option<u64>) -> Vec<T> {
        let limit = limit.unwrap_or(self.default_page_size).max(1) as usize;
        let page = page.unwrap_or(1).max(1) as usize;
        rows.into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect()
    }

    fn job_not_found(job_id: Uuid) -> ServiceError {
        ServiceError::NotFound(format!("Job {} not found", job_id))
    }
}

/// Strict derivation chain over a work order status set: Completed iff all
/// done; InProgress iff any in progress or done (but not all done);
/// otherwise ToDo. An empty set falls back to the job's stored status.
pub fn derive_status(stored: JobStatus, statuses: &[WorkOrderStatus]) -> JobStatus {
    if statuses.is_empty() {
        return stored;
    }
    if statuses.iter().all(|s| *s == WorkOrderStatus::Done) {
        JobStatus::Completed
    } else if statuses
        .iter()
        .any(|s| matches!(s, WorkOrderStatus::InProgress | WorkOrderStatus::Done))
    {
        JobStatus::InProgress
    } else {
        JobStatus::ToDo
    }
}

/// Max-priority derivation; an empty set falls back to the stored value.
pub fn derive_priority(stored: Priority, priorities: &[Priority]) -> Priority {
    priorities.iter().copied().max().unwrap_or(stored)
}
