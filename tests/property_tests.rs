//! Property-based tests for the core's pure rules: status/priority
//! normalization, job status derivation, and duration rounding.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use fieldops_core::models::{
    normalize_priority, normalize_status, rounded_duration_minutes, JobStatus, Priority,
    WorkOrderStatus,
};
use fieldops_core::services::hierarchy::{derive_priority, derive_status};

fn work_order_status_strategy() -> impl Strategy<Value = WorkOrderStatus> {
    prop_oneof![
        Just(WorkOrderStatus::ToDo),
        Just(WorkOrderStatus::InProgress),
        Just(WorkOrderStatus::Done),
    ]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// normalize(normalize(x)) == normalize(x) for any string: the
    /// canonical display form of the result is a fixed point.
    #[test]
    fn priority_normalization_is_idempotent(raw in ".*") {
        let once = normalize_priority(&raw);
        prop_assert_eq!(normalize_priority(&once.to_string()), once);
    }

    #[test]
    fn status_normalization_is_idempotent(raw in ".*") {
        let once = normalize_status(&raw);
        prop_assert_eq!(normalize_status(&once.to_string()), once);
    }

    #[test]
    fn work_order_status_normalization_is_idempotent(raw in ".*") {
        let once = WorkOrderStatus::normalize(&raw);
        prop_assert_eq!(WorkOrderStatus::normalize(&once.to_string()), once);
    }

    /// Normalization is total: it never panics and always lands on the
    /// canonical set, defaulting to Medium.
    #[test]
    fn priority_normalization_is_total(raw in ".*") {
        let p = normalize_priority(&raw);
        let lowered = raw.to_lowercase();
        if !lowered.contains("urgent") && !lowered.contains("high") && !lowered.contains("low") {
            prop_assert_eq!(p, Priority::Medium);
        }
    }
}

proptest! {
    /// Completed iff every order is done; ToDo iff every order is to-do;
    /// anything else is InProgress.
    #[test]
    fn job_status_derivation_matches_quantifiers(
        statuses in prop::collection::vec(work_order_status_strategy(), 1..20)
    ) {
        let derived = derive_status(JobStatus::OnHold, &statuses);
        let all_done = statuses.iter().all(|s| *s == WorkOrderStatus::Done);
        let all_todo = statuses.iter().all(|s| *s == WorkOrderStatus::ToDo);

        if all_done {
            prop_assert_eq!(derived, JobStatus::Completed);
        } else if all_todo {
            prop_assert_eq!(derived, JobStatus::ToDo);
        } else {
            prop_assert_eq!(derived, JobStatus::InProgress);
        }
    }

    /// An empty set always falls back to the stored status.
    #[test]
    fn empty_job_keeps_stored_status(
        stored in prop_oneof![
            Just(JobStatus::ToDo),
            Just(JobStatus::InProgress),
            Just(JobStatus::Completed),
            Just(JobStatus::OnHold),
        ]
    ) {
        prop_assert_eq!(derive_status(stored, &[]), stored);
    }

    #[test]
    fn derived_priority_is_an_upper_bound(
        priorities in prop::collection::vec(priority_strategy(), 1..20)
    ) {
        let derived = derive_priority(Priority::Low, &priorities);
        prop_assert!(priorities.iter().all(|p| *p <= derived));
        prop_assert!(priorities.contains(&derived));
    }
}

proptest! {
    /// duration == round_minutes(t2 - t1) for t2 > t1; non-positive spans
    /// are rejected rather than clamped.
    #[test]
    fn durations_round_to_whole_minutes(
        start_offset in 0i64..1_000_000,
        span_seconds in 31i64..(14 * 24 * 60 * 60),
    ) {
        let t1 = Utc.timestamp_opt(1_700_000_000 + start_offset, 0).unwrap();
        let t2 = t1 + Duration::seconds(span_seconds);
        let expected = (span_seconds + 30) / 60;
        if expected > 0 {
            prop_assert_eq!(rounded_duration_minutes(t1, t2), Some(expected));
        } else {
            prop_assert_eq!(rounded_duration_minutes(t1, t2), None);
        }
    }

    #[test]
    fn non_positive_spans_are_rejected(
        span_seconds in -100_000i64..=0,
    ) {
        let t1 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t2 = t1 + Duration::seconds(span_seconds);
        prop_assert_eq!(rounded_duration_minutes(t1, t2), None);
    }
}
