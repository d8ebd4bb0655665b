//! Integration tests for the job -> work order hierarchy: creation
//! validation, derived status, technician assignment conflicts, and
//! cascade deletion.

mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use fieldops_core::{
    errors::ServiceError,
    models::{JobStatus, Priority, WorkOrderStatus},
    services::WorkOrderFilter,
};
use uuid::Uuid;

use common::{admin, at_hour, sample_job, sample_work_order, technician, test_core};

#[tokio::test]
async fn create_job_rejects_blank_and_non_positive_fields() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();

    let mut blank_name = sample_job();
    blank_name.name = "   ".to_string();
    assert_matches!(
        hierarchy.create_job(blank_name).await,
        Err(ServiceError::ValidationError(_))
    );

    let mut blank_client = sample_job();
    blank_client.client_name = "".to_string();
    assert_matches!(
        hierarchy.create_job(blank_client).await,
        Err(ServiceError::ValidationError(_))
    );

    let mut zero_budget = sample_job();
    zero_budget.budget = Decimal::ZERO;
    assert_matches!(
        hierarchy.create_job(zero_budget).await,
        Err(ServiceError::ValidationError(_))
    );

    let job = hierarchy.create_job(sample_job()).await.unwrap();
    assert_eq!(job.client_name, "Acme Facilities");
    // "High" from the boundary lands on the canonical enum.
    assert_eq!(job.stored_priority, Priority::High);
}

#[tokio::test]
async fn add_work_order_validates_schedule_and_job() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let job = hierarchy.create_job(sample_job()).await.unwrap();

    assert_matches!(
        hierarchy
            .add_work_order(Uuid::new_v4(), sample_work_order(9, 12))
            .await,
        Err(ServiceError::NotFound(_))
    );

    let mut backwards = sample_work_order(12, 9);
    backwards.title = "backwards".to_string();
    assert_matches!(
        hierarchy.add_work_order(job.id, backwards).await,
        Err(ServiceError::ValidationError(_))
    );

    let order = hierarchy
        .add_work_order(job.id, sample_work_order(9, 12))
        .await
        .unwrap();
    assert_eq!(order.job_id, job.id);
    assert_eq!(order.status, WorkOrderStatus::ToDo);

    let refreshed = hierarchy.get_job(job.id).unwrap();
    assert_eq!(refreshed.work_order_ids, vec![order.id]);
}

#[tokio::test]
async fn job_status_derives_from_work_orders() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let job = hierarchy.create_job(sample_job()).await.unwrap();

    // No work orders: the stored status is authoritative.
    assert_eq!(
        hierarchy.derive_job_status(job.id).await.unwrap(),
        JobStatus::ToDo
    );

    let wo1 = hierarchy
        .add_work_order(job.id, sample_work_order(8, 10))
        .await
        .unwrap();
    let wo2 = hierarchy
        .add_work_order(job.id, sample_work_order(10, 12))
        .await
        .unwrap();
    assert_eq!(
        hierarchy.derive_job_status(job.id).await.unwrap(),
        JobStatus::ToDo
    );

    // WO1 done + WO2 in progress => InProgress.
    hierarchy
        .set_work_order_status(wo1.id, WorkOrderStatus::Done)
        .await
        .unwrap();
    hierarchy
        .set_work_order_status(wo2.id, WorkOrderStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(
        hierarchy.derive_job_status(job.id).await.unwrap(),
        JobStatus::InProgress
    );

    hierarchy
        .set_work_order_status(wo2.id, WorkOrderStatus::Done)
        .await
        .unwrap();
    assert_eq!(
        hierarchy.derive_job_status(job.id).await.unwrap(),
        JobStatus::Completed
    );
}

#[tokio::test]
async fn job_priority_derives_as_max_of_children() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let job = hierarchy.create_job(sample_job()).await.unwrap();

    // Stored priority (High) applies while the job is empty.
    assert_eq!(
        hierarchy.derive_job_priority(job.id).await.unwrap(),
        Priority::High
    );

    let wo = hierarchy
        .add_work_order(job.id, sample_work_order(9, 11))
        .await
        .unwrap();
    assert_eq!(
        hierarchy.derive_job_priority(job.id).await.unwrap(),
        Priority::Medium
    );

    hierarchy
        .set_work_order_priority(wo.id, Priority::Urgent)
        .await
        .unwrap();
    assert_eq!(
        hierarchy.derive_job_priority(job.id).await.unwrap(),
        Priority::Urgent
    );
}

#[tokio::test]
async fn reassignment_rejects_overlapping_schedules() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let tech = Uuid::new_v4();

    let job = hierarchy.create_job(sample_job()).await.unwrap();
    let order_a = hierarchy
        .add_work_order(job.id, sample_work_order(9, 12))
        .await
        .unwrap();
    let order_b = hierarchy
        .add_work_order(job.id, sample_work_order(11, 14))
        .await
        .unwrap();
    let order_c = hierarchy
        .add_work_order(job.id, sample_work_order(12, 15))
        .await
        .unwrap();

    hierarchy
        .reassign_technician(order_a.id, tech)
        .await
        .unwrap();

    // 11:00-14:00 intersects 9:00-12:00.
    assert_matches!(
        hierarchy.reassign_technician(order_b.id, tech).await,
        Err(ServiceError::Conflict(_))
    );

    // Back-to-back (12:00 start against a 12:00 end) is allowed.
    let updated = hierarchy
        .reassign_technician(order_c.id, tech)
        .await
        .unwrap();
    assert_eq!(updated.primary_technician, Some(tech));

    // The conflicting order keeps its previous assignee state.
    let untouched = hierarchy.get_work_order(order_b.id).await.unwrap();
    assert_eq!(untouched.primary_technician, None);
}

#[tokio::test]
async fn conflict_check_spans_jobs() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let tech = Uuid::new_v4();

    let job_a = hierarchy.create_job(sample_job()).await.unwrap();
    let mut other = sample_job();
    other.name = "Warehouse lighting".to_string();
    let job_b = hierarchy.create_job(other).await.unwrap();

    let order_a = hierarchy
        .add_work_order(job_a.id, sample_work_order(9, 12))
        .await
        .unwrap();
    let order_b = hierarchy
        .add_work_order(job_b.id, sample_work_order(10, 11))
        .await
        .unwrap();

    hierarchy
        .reassign_technician(order_a.id, tech)
        .await
        .unwrap();
    assert_matches!(
        hierarchy.reassign_technician(order_b.id, tech).await,
        Err(ServiceError::Conflict(_))
    );
}

#[tokio::test]
async fn additional_technicians_have_set_semantics() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let job = hierarchy.create_job(sample_job()).await.unwrap();
    let order = hierarchy
        .add_work_order(job.id, sample_work_order(9, 12))
        .await
        .unwrap();
    let helper = Uuid::new_v4();

    hierarchy
        .add_additional_technician(order.id, helper)
        .await
        .unwrap();
    let updated = hierarchy
        .add_additional_technician(order.id, helper)
        .await
        .unwrap();
    assert_eq!(updated.additional_technicians.len(), 1);
}

#[tokio::test]
async fn delete_job_requires_admin_and_blocks_on_open_time_entries() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let time = core.time_tracking();
    let tech = technician();

    let job = hierarchy.create_job(sample_job()).await.unwrap();
    let order = hierarchy
        .add_work_order(job.id, sample_work_order(9, 12))
        .await
        .unwrap();

    assert_matches!(
        hierarchy.delete_job(job.id, false, &tech).await,
        Err(ServiceError::Forbidden(_))
    );

    let entry = time
        .clock_in(tech.id, Some(order.id), None)
        .await
        .unwrap();

    assert_matches!(
        hierarchy.delete_job(job.id, false, &admin()).await,
        Err(ServiceError::Conflict(_))
    );
    // The job survived the refused delete.
    assert!(hierarchy.get_job(job.id).is_ok());

    // Cascade removes the job, the orders and their entries.
    hierarchy.delete_job(job.id, true, &admin()).await.unwrap();
    assert_matches!(
        hierarchy.get_job(job.id),
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        hierarchy.get_work_order(order.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(time.get_entry(entry.id), Err(ServiceError::NotFound(_)));

    // The cascade also released the technician's active slot.
    let again = time.clock_in(tech.id, None, None).await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn work_order_queries_filter_and_shape() {
    let (core, _events) = test_core();
    let hierarchy = core.hierarchy();
    let tech = Uuid::new_v4();

    let job = hierarchy.create_job(sample_job()).await.unwrap();
    let order_a = hierarchy
        .add_work_order(job.id, sample_work_order(8, 10))
        .await
        .unwrap();
    let order_b = hierarchy
        .add_work_order(job.id, sample_work_order(13, 15))
        .await
        .unwrap();
    hierarchy
        .reassign_technician(order_a.id, tech)
        .await
        .unwrap();
    hierarchy
        .set_work_order_status(order_b.id, WorkOrderStatus::InProgress)
        .await
        .unwrap();

    let by_status = hierarchy
        .list_work_orders(&WorkOrderFilter {
            status: Some(WorkOrderStatus::InProgress),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, order_b.id);

    let by_tech = hierarchy
        .list_work_orders(&WorkOrderFilter {
            technician: Some(tech),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_tech.len(), 1);
    assert_eq!(by_tech[0].id, order_a.id);

    let in_morning = hierarchy
        .list_work_orders(&WorkOrderFilter {
            scheduled_to: Some(at_hour(11)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_morning.len(), 1);
    assert_eq!(in_morning[0].id, order_a.id);

    let tree = hierarchy.job_tree(job.id).await.unwrap();
    assert_eq!(tree.work_orders.len(), 2);
    assert_eq!(tree.derived_status, JobStatus::InProgress);
    // Tree preserves the job's insertion order.
    assert_eq!(tree.work_orders[0].id, order_a.id);
    assert_eq!(tree.work_orders[1].id, order_b.id);
}
