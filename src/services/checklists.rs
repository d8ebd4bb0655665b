use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{emit, Event, EventSender};
use crate::models::{
    ChecklistInstance, ChecklistTemplate, ChecklistTemplateItem, Evidence, EvidenceKind,
    NewChecklistTemplate, NewEvidence,
};

/// Executes checklist templates as stateful instances on work orders.
///
/// Instances live inside their work order (under its lock); this service
/// keeps an instance -> work order index so callers can address items by
/// instance id.
#[derive(Clone)]
pub struct ChecklistService {
    hierarchy: Arc<super::hierarchy::HierarchyService>,
    instance_index: Arc<DashMap<Uuid, Uuid>>,
    event_sender: Option<EventSender>,
}

impl ChecklistService {
    pub fn new(
        hierarchy: Arc<super::hierarchy::HierarchyService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            hierarchy,
            instance_index: Arc::new(DashMap::new()),
            event_sender,
        }
    }

    /// Creates a reusable checklist template on a job.
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn create_template(
        &self,
        job_id: Uuid,
        spec: NewChecklistTemplate,
    ) -> Result<ChecklistTemplate, ServiceError> {
        if spec.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Template name cannot be blank".to_string(),
            ));
        }
        if spec.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Template must have at least one item".to_string(),
            ));
        }
        if spec.items.iter().any(|i| i.description.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Template items cannot have blank descriptions".to_string(),
            ));
        }

        let template = ChecklistTemplate {
            id: Uuid::new_v4(),
            job_id,
            name: spec.name,
            items: spec
                .items
                .into_iter()
                .map(|item| ChecklistTemplateItem {
                    id: Uuid::new_v4(),
                    description: item.description,
                    required_evidence: item.required_evidence,
                })
                .collect(),
            created_at: Utc::now(),
        };

        self.hierarchy.insert_template(job_id, template.clone())?;
        info!(%job_id, template_id = %template.id, "checklist template created");
        Ok(template)
    }

    /// Instantiates a job's template onto one of its work orders.
    ///
    /// The instance is a deep copy of the template, preserving item order
    /// and evidence requirements. A work order carries at most one
    /// instance.
    #[instrument(skip(self))]
    pub async fn instantiate(
        &self,
        job_id: Uuid,
        template_id: Uuid,
        work_order_id: Uuid,
    ) -> Result<ChecklistInstance, ServiceError> {
        let template = self.hierarchy.clone_template(job_id, template_id)?;
        let handle = self.hierarchy.work_order_handle(work_order_id)?;

        let instance = {
            let mut order = handle.write().await;
            if order.job_id != job_id {
                return Err(ServiceError::ValidationError(format!(
                    "Work order {} does not belong to job {}",
                    work_order_id, job_id
                )));
            }
            if order.checklist.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Work order {} already has a checklist instance",
                    work_order_id
                )));
            }
            let instance = ChecklistInstance::from_template(&template, work_order_id);
            order.checklist = Some(instance.clone());
            order.updated_at = Utc::now();
            instance
        };

        self.instance_index.insert(instance.id, work_order_id);
        info!(
            %work_order_id,
            instance_id = %instance.id,
            items = instance.items.len(),
            "checklist instantiated"
        );
        emit(
            &self.event_sender,
            Event::ChecklistInstantiated {
                work_order_id,
                instance_id: instance.id,
            },
        );
        Ok(instance)
    }

    /// Marks an item completed, attaching its evidence.
    ///
    /// Every evidence kind the template item requires must be present in
    /// the supplied set; items are not re-completable. When the last item
    /// completes, the instance flips to Completed automatically.
    #[instrument(skip(self, evidence))]
    pub async fn complete_item(
        &self,
        instance_id: Uuid,
        item_id: Uuid,
        completed_by: Uuid,
        evidence: Vec<NewEvidence>,
    ) -> Result<ChecklistInstance, ServiceError> {
        let work_order_id = self.work_order_for(instance_id)?;
        let handle = self.hierarchy.work_order_handle(work_order_id)?;
        let mut order = handle.write().await;

        let checklist = order.checklist.as_mut().ok_or_else(|| {
            ServiceError::NotFound(format!("Checklist instance {} not found", instance_id))
        })?;
        let item = checklist
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Item {} not found on checklist instance {}",
                    item_id, instance_id
                ))
            })?;

        if item.completed {
            return Err(ServiceError::Conflict(format!(
                "Checklist item {} is already completed",
                item_id
            )));
        }

        let supplied: Vec<EvidenceKind> = evidence.iter().map(|e| e.kind).collect();
        let missing = item.missing_kinds(&supplied);
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
            return Err(ServiceError::ValidationError(format!(
                "Missing required evidence for item {}: {}",
                item_id,
                names.join(", ")
            )));
        }

        let records: Vec<Evidence> = evidence
            .into_iter()
            .map(|e| e.into_evidence(item_id, completed_by))
            .collect();
        item.completed = true;
        item.completed_by = Some(completed_by);
        item.completed_at = Some(Utc::now());
        item.evidence.extend(records.iter().cloned());

        let became_completed = checklist.recompute_status();
        let snapshot = checklist.clone();
        order.evidence.extend(records);
        order.updated_at = Utc::now();
        drop(order);

        info!(%instance_id, %item_id, "checklist item completed");
        emit(
            &self.event_sender,
            Event::ChecklistItemCompleted {
                instance_id,
                item_id,
                completed_by,
            },
        );
        if became_completed {
            info!(%instance_id, %work_order_id, "checklist completed");
            emit(
                &self.event_sender,
                Event::ChecklistCompleted {
                    work_order_id,
                    instance_id,
                },
            );
        }
        Ok(snapshot)
    }

    /// Attaches additional documentation to an already-completed item.
    ///
    /// Allowed only while the instance is still in progress; evidence is
    /// append-only either way.
    #[instrument(skip(self, evidence))]
    pub async fn add_evidence(
        &self,
        instance_id: Uuid,
        item_id: Uuid,
        author: Uuid,
        evidence: NewEvidence,
    ) -> Result<Evidence, ServiceError> {
        let work_order_id = self.work_order_for(instance_id)?;
        let handle = self.hierarchy.work_order_handle(work_order_id)?;
        let mut order = handle.write().await;

        let checklist = order.checklist.as_mut().ok_or_else(|| {
            ServiceError::NotFound(format!("Checklist instance {} not found", instance_id))
        })?;
        if checklist.is_completed() {
            return Err(ServiceError::InvalidState(format!(
                "Checklist instance {} is completed; evidence can no longer be added",
                instance_id
            )));
        }
        let item = checklist
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Item {} not found on checklist instance {}",
                    item_id, instance_id
                ))
            })?;

        let record = evidence.into_evidence(item_id, author);
        item.evidence.push(record.clone());
        order.evidence.push(record.clone());
        order.updated_at = Utc::now();
        Ok(record)
    }

    /// Returns a snapshot of a checklist instance.
    pub async fn get_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<ChecklistInstance, ServiceError> {
        let work_order_id = self.work_order_for(instance_id)?;
        let handle = self.hierarchy.work_order_handle(work_order_id)?;
        let order = handle.read().await;
        order
            .checklist
            .as_ref()
            .filter(|c| c.id == instance_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Checklist instance {} not found", instance_id))
            })
    }

    fn work_order_for(&self, instance_id: Uuid) -> Result<Uuid, ServiceError> {
        self.instance_index
            .get(&instance_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Checklist instance {} not found", instance_id))
            })
    }
}
