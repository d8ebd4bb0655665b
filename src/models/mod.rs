pub mod checklist;
pub mod evidence;
pub mod job;
pub mod status;
pub mod time_entry;
pub mod work_order;

pub use checklist::{
    ChecklistInstance, ChecklistInstanceItem, ChecklistStatus, ChecklistTemplate,
    ChecklistTemplateItem, NewChecklistTemplate, NewChecklistTemplateItem,
};
pub use evidence::{Evidence, EvidenceKind, NewEvidence};
pub use job::{Job, JobSummary, JobTree, JobUpdate, NewJob};
pub use status::{normalize_priority, normalize_status, JobStatus, Priority, WorkOrderStatus};
pub use time_entry::{rounded_duration_minutes, GeoPoint, TimeEntry, TimeEntryStatus};
pub use work_order::{NewWorkOrder, WorkOrder};
