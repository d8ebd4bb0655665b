#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use fieldops_core::{
    auth::Actor,
    config::AppConfig,
    events::Event,
    models::{NewJob, NewWorkOrder},
    AppCore,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Builds a core with a live event receiver.
pub fn test_core() -> (AppCore, mpsc::Receiver<Event>) {
    AppCore::new(AppConfig::default())
}

pub fn admin() -> Actor {
    Actor::admin(Uuid::new_v4())
}

pub fn technician() -> Actor {
    Actor::technician(Uuid::new_v4())
}

/// A fixed reference day so scheduling windows are deterministic.
pub fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
}

pub fn sample_job() -> NewJob {
    NewJob {
        name: "HVAC retrofit".to_string(),
        job_type: "installation".to_string(),
        client_name: "Acme Facilities".to_string(),
        client_contact: Some("ops@acme.example".to_string()),
        start_date: Some(at_hour(8)),
        end_date: Some(at_hour(18)),
        budget: Decimal::new(12_500, 0),
        location: "12 Harbor Way".to_string(),
        status: None,
        priority: Some("High".to_string()),
    }
}

pub fn sample_work_order(start_hour: u32, end_hour: u32) -> NewWorkOrder {
    NewWorkOrder {
        title: format!("Unit swap {}-{}", start_hour, end_hour),
        description: None,
        work_order_type: "maintenance".to_string(),
        priority: None,
        scheduled_start: at_hour(start_hour),
        scheduled_end: at_hour(end_hour),
        estimated_minutes: Some(120),
        primary_technician: None,
    }
}
