//! Integration tests for website form ingestion.
//!
//! Tests cover:
//! - POST /api/v1/webhooks/forms with JSON and URL-encoded bodies
//! - Ingestion note and calendar slot for booking forms
//! - New lead notifications for admins and managers
//! - Deposit forms arriving converted and hot
//! - Failing notes and alerts leaving the stored lead in place
//!
//! These tests need a PostgreSQL database at `TEST_DATABASE_URL`.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    cleanup_user, cleanup_year, create_test_app, create_test_pool, insert_user, request,
    run_migrations, send, test_config, unique_academic_year, webhook_request,
    TEST_WEBHOOK_SECRET,
};
use domain::models::form_submission::FormPayload;
use domain::services::notification::MockNotificationService;
use leads_api::app::create_app_with_notifier;
use leads_api::services::lead_ingestion::LeadIngestionService;
use persistence::repositories::{CalendarEventRepository, LeadNoteRepository, LeadRepository};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Makes note inserts whose body contains `marker` violate a constraint.
async fn reject_notes_containing(pool: &PgPool, marker: &str) -> String {
    let constraint = format!("reject_note_{}", Uuid::new_v4().simple());
    sqlx::query(&format!(
        "ALTER TABLE lead_notes ADD CONSTRAINT {} CHECK (body NOT LIKE '%{}%') NOT VALID",
        constraint, marker
    ))
    .execute(pool)
    .await
    .expect("Failed to add note constraint");
    constraint
}

async fn drop_note_constraint(pool: &PgPool, constraint: &str) {
    sqlx::query(&format!(
        "ALTER TABLE lead_notes DROP CONSTRAINT IF EXISTS {}",
        constraint
    ))
    .execute(pool)
    .await
    .expect("Failed to drop note constraint");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_booking_form_creates_lead_note_and_slot() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut config = test_config();
    config.crm.default_academic_year = year.clone();
    let app = create_test_app(config, pool.clone());
    let manager = insert_user(&pool, "manager").await;

    let body = json!({
        "form_name": "Book a Viewing - Riverside",
        "Full Name": "Katherine Johnson",
        "Email Address": "Katherine@Example.com",
        "room_choice": "Gold Suite",
        "stay_duration": "45 weeks",
        "preferred_date": "2026-03-02",
        "preferred_time": "14:30",
        "message": "Can I bring a parent?"
    })
    .to_string();

    let (status, accepted) = send(
        &app,
        webhook_request(Some(TEST_WEBHOOK_SECRET), "application/json", body),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "webhook failed: {}", accepted);
    assert_eq!(accepted["success"], true);
    let lead_id: Uuid = accepted["leadId"].as_str().unwrap().parse().unwrap();

    let (status, detail) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/leads/{}", lead_id),
            Some(&manager.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lead = &detail;
    assert_eq!(lead["email"], "katherine@example.com");
    assert_eq!(lead["full_name"], "Katherine Johnson");
    assert_eq!(lead["source"], "web_booking");
    assert_eq!(lead["room_choice"], "gold");
    assert_eq!(lead["stay_duration"], "45_weeks");
    assert_eq!(lead["lead_status"], "new");
    assert_eq!(lead["academic_year"], year.as_str());

    let notes = LeadNoteRepository::new(pool.clone())
        .list_for_lead(lead_id)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].body.contains("Book a Viewing - Riverside"));
    assert!(notes[0].body.contains("Can I bring a parent?"));

    let events = CalendarEventRepository::new(pool.clone())
        .list_for_lead(lead_id)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "viewing");

    let (status, notifications) = send(
        &app,
        request(Method::GET, "/api/v1/notifications", Some(&manager.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alerted = notifications["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["notification_type"] == "new_lead" && n["lead_id"] == lead_id.to_string());
    assert!(alerted);

    cleanup_year(&pool, &year).await;
    cleanup_user(&pool, &manager).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_urlencoded_deposit_form() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut config = test_config();
    config.crm.default_academic_year = year.clone();
    let app = create_test_app(config, pool.clone());
    let admin = insert_user(&pool, "admin").await;

    let body = "form_type=deposit&email=payer%40example.com&room_choice=platinum&stay_duration=51+weeks";
    let (status, accepted) = send(
        &app,
        webhook_request(
            Some(TEST_WEBHOOK_SECRET),
            "application/x-www-form-urlencoded",
            body,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lead_id = accepted["leadId"].as_str().unwrap().to_string();

    let (status, detail) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/leads/{}", lead_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["lead_status"], "converted");
    assert_eq!(detail["is_hot"], true);
    // No name on the form
    assert_eq!(detail["full_name"], "payer@example.com");
    assert!(detail["potential_revenue"].as_f64().unwrap() > 0.0);

    cleanup_year(&pool, &year).await;
    cleanup_user(&pool, &admin).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_failing_alerts_still_accept_submission() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut config = test_config();
    config.crm.default_academic_year = year.clone();
    let app = create_app_with_notifier(
        config,
        pool.clone(),
        Arc::new(MockNotificationService::failing()),
    );

    let body = json!({
        "form_type": "contact",
        "name": "Alan Turing",
        "email": "alan@example.com",
        "message": "Do you have parking?"
    })
    .to_string();
    let (status, accepted) = send(
        &app,
        webhook_request(Some(TEST_WEBHOOK_SECRET), "application/json", body),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "webhook failed: {}", accepted);
    assert_eq!(accepted["success"], true);
    let lead_id: Uuid = accepted["leadId"].as_str().unwrap().parse().unwrap();

    let stored = LeadRepository::new(pool.clone())
        .find_by_id(lead_id)
        .await
        .unwrap()
        .expect("lead should be stored");
    assert_eq!(stored.email, "alan@example.com");

    cleanup_year(&pool, &year).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_note_insert_failure_keeps_lead() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let year = unique_academic_year();
    let mut crm = test_config().crm;
    crm.default_academic_year = year.clone();

    let marker = format!("note-marker-{}", Uuid::new_v4().simple());
    let constraint = reject_notes_containing(&pool, &marker).await;

    let service = LeadIngestionService::new(
        pool.clone(),
        crm,
        Arc::new(MockNotificationService::failing()),
    );
    let payload = FormPayload::from_json(&json!({
        "form_name": "Book a Viewing",
        "email": "grace@example.com",
        "name": "Grace Hopper",
        "preferred_date": "2026-04-10",
        "preferred_time": "11:00",
        "message": marker,
    }));

    let result = service.ingest(&payload).await;
    drop_note_constraint(&pool, &constraint).await;

    let lead = result.expect("ingestion should succeed when the note fails");
    assert!(LeadRepository::new(pool.clone())
        .find_by_id(lead.id)
        .await
        .unwrap()
        .is_some());

    let notes = LeadNoteRepository::new(pool.clone())
        .list_for_lead(lead.id)
        .await
        .unwrap();
    assert!(notes.is_empty());

    let events = CalendarEventRepository::new(pool.clone())
        .list_for_lead(lead.id)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);

    cleanup_year(&pool, &year).await;
}
