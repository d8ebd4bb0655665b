//! Field-service operations core.
//!
//! Domain model and business rules for assigning and tracking work across
//! clients, technicians and checklists: the job -> work order hierarchy,
//! checklist execution with required evidence, the time entry
//! clock-in/clock-out/approval lifecycle, and bulk actions over flat or
//! hierarchical selections. Rendering, routing, persistence and transport
//! are external collaborators; this crate owns the invariants.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;

use std::sync::Arc;
use tokio::sync::mpsc;

use config::AppConfig;
use events::{Event, EventSender};
use services::{
    BulkCoordinator, ChecklistService, HierarchyService, TimeLog, TimeTrackingService,
};

/// Wires the shared stores, the event channel and every service.
#[derive(Clone)]
pub struct AppCore {
    pub config: AppConfig,
    hierarchy: Arc<HierarchyService>,
    checklists: Arc<ChecklistService>,
    time_tracking: Arc<TimeTrackingService>,
    bulk: Arc<BulkCoordinator>,
}

impl AppCore {
    /// Builds the core and returns the receiving half of the domain event
    /// channel for an external notification dispatcher.
    pub fn new(config: AppConfig) -> (Self, mpsc::Receiver<Event>) {
        let (event_sender, event_receiver) = EventSender::channel(config.event_buffer);

        let time_log = Arc::new(TimeLog::new());
        let hierarchy = Arc::new(HierarchyService::new(
            time_log.clone(),
            Some(event_sender.clone()),
            config.default_page_size,
        ));
        let checklists = Arc::new(ChecklistService::new(
            hierarchy.clone(),
            Some(event_sender.clone()),
        ));
        let time_tracking = Arc::new(TimeTrackingService::new(
            time_log,
            hierarchy.clone(),
            Some(event_sender),
        ));
        let bulk = Arc::new(BulkCoordinator::new(
            hierarchy.clone(),
            time_tracking.clone(),
        ));

        (
            Self {
                config,
                hierarchy,
                checklists,
                time_tracking,
                bulk,
            },
            event_receiver,
        )
    }

    pub fn hierarchy(&self) -> Arc<HierarchyService> {
        self.hierarchy.clone()
    }

    pub fn checklists(&self) -> Arc<ChecklistService> {
        self.checklists.clone()
    }

    pub fn time_tracking(&self) -> Arc<TimeTrackingService> {
        self.time_tracking.clone()
    }

    pub fn bulk(&self) -> Arc<BulkCoordinator> {
        self.bulk.clone()
    }
}
