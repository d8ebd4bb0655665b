pub mod bulk;
pub mod checklists;
pub mod hierarchy;
pub mod time_tracking;

pub use bulk::{BulkAction, BulkCoordinator, BulkReport, BulkSelection, ViewMode};
pub use checklists::ChecklistService;
pub use hierarchy::{HierarchyService, JobFilter, WorkOrderFilter};
pub use time_tracking::{TimeEntryFilter, TimeLog, TimeTrackingService};
