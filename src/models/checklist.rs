use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::evidence::{Evidence, EvidenceKind};

/// Reusable, job-level list of required steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub items: Vec<ChecklistTemplateItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplateItem {
    pub id: Uuid,
    pub description: String,
    /// Evidence kinds that must accompany completion of this step.
    pub required_evidence: Vec<EvidenceKind>,
}

/// Input for creating a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChecklistTemplate {
    pub name: String,
    pub items: Vec<NewChecklistTemplateItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChecklistTemplateItem {
    pub description: String,
    #[serde(default)]
    pub required_evidence: Vec<EvidenceKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChecklistStatus {
    InProgress,
    Completed,
}

/// Execution-time copy of a template, bound to one work order.
///
/// Completion is derived, never commanded: the instance flips to
/// `Completed` the moment every item is completed, recomputed after each
/// item mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistInstance {
    pub id: Uuid,
    pub template_id: Uuid,
    pub work_order_id: Uuid,
    pub name: String,
    pub status: ChecklistStatus,
    pub items: Vec<ChecklistInstanceItem>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistInstanceItem {
    pub id: Uuid,
    pub template_item_id: Uuid,
    pub description: String,
    pub required_evidence: Vec<EvidenceKind>,
    pub completed: bool,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub evidence: Vec<Evidence>,
}

impl ChecklistInstance {
    /// Deep-copies a template, preserving item order and evidence
    /// requirements.
    pub fn from_template(template: &ChecklistTemplate, work_order_id: Uuid) -> Self {
        let items = template
            .items
            .iter()
            .map(|item| ChecklistInstanceItem {
                id: Uuid::new_v4(),
                template_item_id: item.id,
                description: item.description.clone(),
                required_evidence: item.required_evidence.clone(),
                completed: false,
                completed_by: None,
                completed_at: None,
                evidence: Vec::new(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            template_id: template.id,
            work_order_id,
            name: template.name.clone(),
            status: ChecklistStatus::InProgress,
            items,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChecklistStatus::Completed
    }

    /// Recomputes the derived status after an item mutation. Returns true
    /// if this call flipped the instance to `Completed`.
    pub fn recompute_status(&mut self) -> bool {
        if self.status == ChecklistStatus::InProgress && self.items.iter().all(|i| i.completed) {
            self.status = ChecklistStatus::Completed;
            self.completed_at = Some(Utc::now());
            true
        } else {
            false
        }
    }
}

impl ChecklistInstanceItem {
    /// Evidence kinds required by the template item but absent from the
    /// supplied set.
    pub fn missing_kinds(&self, supplied: &[EvidenceKind]) -> Vec<EvidenceKind> {
        self.required_evidence
            .iter()
            .filter(|required| !supplied.contains(required))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_items(items: Vec<ChecklistTemplateItem>) -> ChecklistTemplate {
        ChecklistTemplate {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            name: "Safety inspection".to_string(),
            items,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn instantiation_preserves_order_and_requirements() {
        let template = template_with_items(vec![
            ChecklistTemplateItem {
                id: Uuid::new_v4(),
                description: "Check breaker panel".to_string(),
                required_evidence: vec![EvidenceKind::Photo],
            },
            ChecklistTemplateItem {
                id: Uuid::new_v4(),
                description: "Customer sign-off".to_string(),
                required_evidence: vec![EvidenceKind::Signature, EvidenceKind::Note],
            },
        ]);

        let instance = ChecklistInstance::from_template(&template, Uuid::new_v4());
        assert_eq!(instance.status, ChecklistStatus::InProgress);
        assert_eq!(instance.items.len(), 2);
        assert_eq!(instance.items[0].description, "Check breaker panel");
        assert_eq!(instance.items[0].required_evidence, vec![EvidenceKind::Photo]);
        assert_eq!(
            instance.items[1].required_evidence,
            vec![EvidenceKind::Signature, EvidenceKind::Note]
        );
        assert!(instance.items.iter().all(|i| !i.completed));
    }

    #[test]
    fn empty_instance_completes_on_first_recompute() {
        let template = template_with_items(vec![]);
        let mut instance = ChecklistInstance::from_template(&template, Uuid::new_v4());
        assert!(instance.recompute_status());
        assert!(instance.is_completed());
        // Already completed; a second recompute reports no transition.
        assert!(!instance.recompute_status());
    }

    #[test]
    fn missing_kinds_reports_gaps() {
        let item = ChecklistInstanceItem {
            id: Uuid::new_v4(),
            template_item_id: Uuid::new_v4(),
            description: "x".to_string(),
            required_evidence: vec![EvidenceKind::Photo, EvidenceKind::Signature],
            completed: false,
            completed_by: None,
            completed_at: None,
            evidence: Vec::new(),
        };
        assert_eq!(
            item.missing_kinds(&[EvidenceKind::Photo]),
            vec![EvidenceKind::Signature]
        );
        assert!(item
            .missing_kinds(&[EvidenceKind::Photo, EvidenceKind::Signature, EvidenceKind::Note])
            .is_empty());
    }
}
