//! Integration tests for the follow-up reminder job.
//!
//! Tests cover:
//! - Reminder creation for overdue, owned leads
//! - Repeated runs never stacking a second outstanding reminder
//! - Logging a follow-up dismissing the outstanding reminder
//! - Successful emails marking the reminder sent
//!
//! These tests need a PostgreSQL database at `TEST_DATABASE_URL`.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{
    cleanup_user, cleanup_year, create_test_app, create_test_pool, has_outstanding_reminder,
    insert_user, request, run_migrations, send, test_config, unique_academic_year,
};
use domain::services::notification::MockNotificationService;
use leads_api::jobs::FollowupReminderJob;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_reminders_are_not_duplicated() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut config = test_config();
    config.crm.default_academic_year = year.clone();
    let app = create_test_app(config, pool.clone());

    let owner = insert_user(&pool, "staff").await;
    let (status, lead) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/leads",
            Some(&owner.token),
            Some(json!({
                "full_name": "Grace Hopper",
                "email": "grace@example.com",
                "source": "walk_in",
                "assigned_to": owner.id,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let lead_id: Uuid = lead["id"].as_str().unwrap().parse().unwrap();

    // Failed emails leave the reminder outstanding
    let job = FollowupReminderJob::new(
        pool.clone(),
        Arc::new(MockNotificationService::failing()),
        year.clone(),
        60,
    );
    let later = Utc::now() + Duration::days(5);

    let first = job.run(later).await.unwrap();
    assert_eq!(first.overdue, 1);
    assert_eq!(first.created, 1);
    assert_eq!(first.emailed, 0);

    let second = job.run(later + Duration::minutes(60)).await.unwrap();
    assert_eq!(second.overdue, 1);
    assert_eq!(second.created, 0);

    assert!(has_outstanding_reminder(&pool, lead_id).await);

    let (status, notifications) = send(
        &app,
        request(Method::GET, "/api/v1/notifications", Some(&owner.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reminder_count = notifications["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["notification_type"] == "followup_reminder")
        .count();
    assert_eq!(reminder_count, 1);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/leads/{}/followups", lead_id),
            Some(&owner.token),
            Some(json!({"followup_type": "call", "outcome": "contacted"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!has_outstanding_reminder(&pool, lead_id).await);

    cleanup_year(&pool, &year).await;
    cleanup_user(&pool, &owner).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_sent_reminder_is_marked() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut config = test_config();
    config.crm.default_academic_year = year.clone();
    let app = create_test_app(config, pool.clone());

    let owner = insert_user(&pool, "staff").await;
    let unowned_creator = insert_user(&pool, "staff").await;

    for (name, assigned_to) in [("Owned Lead", Some(owner.id)), ("Unowned Lead", None)] {
        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/leads",
                Some(&unowned_creator.token),
                Some(json!({
                    "full_name": name,
                    "email": "lead@example.com",
                    "source": "walk_in",
                    "assigned_to": assigned_to,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let job = FollowupReminderJob::new(
        pool.clone(),
        Arc::new(MockNotificationService::new()),
        year.clone(),
        60,
    );
    let summary = job.run(Utc::now() + Duration::days(2)).await.unwrap();

    // Unassigned leads are overdue but have nobody to remind
    assert_eq!(summary.overdue, 2);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.emailed, 1);

    cleanup_year(&pool, &year).await;
    cleanup_user(&pool, &owner).await;
    cleanup_user(&pool, &unowned_creator).await;
}
