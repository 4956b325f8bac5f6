//! Repository contract tests.
//!
//! Every check runs against the in-memory repository. The same checks run
//! against PostgreSQL when invoked with `--ignored` and a `DATABASE_URL`.

use super::{create_memory_repository, create_postgres_repository, init_database_with_retry};
use crate::config::DatabaseConfig;
use crate::domain::{
    EventFilters, EventStatus, EventType, NewEvent, NewRsvp, Pagination, RepositoryPtr,
    RsvpStatus, StatusFilter,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use tokio::runtime::Runtime;
use uuid::Uuid;

// One runtime to rule them all...
/// Shared tokio runtime for all repository tests.
///
/// The PostgreSQL pool must outlive individual tests; a per-test runtime
/// would close its connections when it drops.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    // ---
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create TOKIO runtime")
});

// Initialize tracing once for all tests
static TRACING_INIT: std::sync::Once = std::sync::Once::new();

fn init_tracing() {
    // ---
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_ansi(false) // No colorization, makes logs easier to read.
            .with_test_writer()
            .try_init();
    });
}

async fn postgres_repo() -> RepositoryPtr {
    // ---
    init_tracing();
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let pool = init_database_with_retry(&config)
        .await
        .expect("database init failed");
    create_postgres_repository(pool)
}

fn memory_repo() -> RepositoryPtr {
    // ---
    init_tracing();
    create_memory_repository()
}

/// Unique name so checks can share one database without truncating it.
fn unique(name: &str) -> String {
    format!("{name} {}", Uuid::new_v4().simple())
}

fn new_event(name: &str, date: (i32, u32, u32), event_type: EventType) -> NewEvent {
    // ---
    NewEvent {
        name: name.to_string(),
        description: Some("Build an escape room in Godot".to_string()),
        image_url: None,
        location: "ECSS 2.415".to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        start_time: NaiveTime::from_hms_opt(19, 0, 0).expect("valid time"),
        end_time: NaiveTime::from_hms_opt(20, 0, 0),
        max_capacity: 40,
        event_type,
        allow_anonymous_rsvp: true,
        rsvp_limit_per_ip: 1,
    }
}

fn new_rsvp(event_id: Uuid, fingerprint: &str) -> NewRsvp {
    // ---
    NewRsvp {
        event_id,
        browser_fingerprint: fingerprint.to_string(),
        ip_address: Some("192.0.2.1".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
    }
}

async fn check_rsvp_lifecycle(repo: RepositoryPtr) {
    // ---
    let event = repo
        .create_event(new_event(&unique("Workshop"), (2025, 4, 15), EventType::Workshop))
        .await
        .expect("Failed to create event");
    assert_eq!(event.status, EventStatus::Upcoming);
    assert!(repo.event_exists(event.id).await.expect("exists query"));

    let fingerprint = "0123456789abcdef0123456789abcdef";
    assert!(repo
        .find_rsvp(event.id, fingerprint)
        .await
        .expect("find query")
        .is_none());

    let inserted = repo
        .insert_rsvp(new_rsvp(event.id, fingerprint))
        .await
        .expect("Failed to insert RSVP");
    assert_eq!(inserted.status, RsvpStatus::Attending);
    assert_eq!(repo.count_attending(event.id).await.expect("count"), 1);

    repo.update_rsvp_status(inserted.id, RsvpStatus::Cancelled, Utc::now())
        .await
        .expect("Failed to update RSVP");

    let found = repo
        .find_rsvp(event.id, fingerprint)
        .await
        .expect("find query")
        .expect("RSVP not found");
    assert_eq!(found.id, inserted.id);
    assert_eq!(found.status, RsvpStatus::Cancelled);
    assert_eq!(found.ip_address.as_deref(), Some("192.0.2.1"));
    assert_eq!(repo.count_attending(event.id).await.expect("count"), 0);
}

async fn check_rsvp_constraints(repo: RepositoryPtr) {
    // ---
    let orphan = repo.insert_rsvp(new_rsvp(Uuid::new_v4(), "orphan")).await;
    assert!(orphan.is_err(), "RSVP for a missing event should fail");

    let event = repo
        .create_event(new_event(&unique("Talk"), (2025, 5, 1), EventType::TechTalk))
        .await
        .expect("Failed to create event");

    repo.insert_rsvp(new_rsvp(event.id, "same-browser"))
        .await
        .expect("first RSVP should succeed");
    let duplicate = repo.insert_rsvp(new_rsvp(event.id, "same-browser")).await;
    assert!(duplicate.is_err(), "Duplicate (event, fingerprint) should fail");

    let missing = repo
        .update_rsvp_status(Uuid::new_v4(), RsvpStatus::Attending, Utc::now())
        .await;
    assert!(missing.is_err());
}

async fn check_listing_and_details(repo: RepositoryPtr) {
    // ---
    let tag = Uuid::new_v4().simple().to_string();
    let early = repo
        .create_event(new_event(&format!("Early {tag}"), (2025, 1, 10), EventType::Workshop))
        .await
        .expect("create");
    let late = repo
        .create_event(new_event(&format!("Late {tag}"), (2025, 3, 10), EventType::Workshop))
        .await
        .expect("create");
    repo.create_event(new_event(&format!("Mixer {tag}"), (2025, 2, 10), EventType::Networking))
        .await
        .expect("create");

    repo.insert_rsvp(new_rsvp(late.id, "a")).await.expect("rsvp");
    repo.insert_rsvp(new_rsvp(late.id, "b")).await.expect("rsvp");

    let filters = EventFilters {
        status: StatusFilter::All,
        event_type: Some(EventType::Workshop),
        search: Some(tag.to_uppercase()),
    };
    let page = repo
        .list_events(&filters, Pagination { page: 1, limit: 1 })
        .await
        .expect("list");
    assert_eq!(page.total_count, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].event.id, early.id);

    let second = repo
        .list_events(&filters, Pagination { page: 2, limit: 1 })
        .await
        .expect("list");
    assert_eq!(second.events[0].event.id, late.id);
    assert_eq!(second.events[0].rsvp_count, 2);

    let beyond = repo
        .list_events(
            &filters,
            Pagination {
                page: u32::MAX,
                limit: u32::MAX,
            },
        )
        .await
        .expect("out-of-range page is empty, not an error");
    assert!(beyond.events.is_empty());
    assert_eq!(beyond.total_count, 2);

    let past_only = EventFilters {
        status: StatusFilter::Past,
        ..filters
    };
    let page = repo
        .list_events(&past_only, Pagination::default())
        .await
        .expect("list");
    assert_eq!(page.total_count, 0);

    let details = repo
        .get_event(late.id)
        .await
        .expect("details")
        .expect("event should exist");
    assert_eq!(details.rsvp_count, 2);
    assert!(repo.get_event(Uuid::new_v4()).await.expect("details").is_none());

    let all = repo.all_events().await.expect("all events");
    assert!(all.iter().any(|e| e.event.id == early.id));
}

async fn check_delete_cascades(repo: RepositoryPtr) {
    // ---
    let event = repo
        .create_event(new_event(&unique("Hack Night"), (2025, 6, 1), EventType::Hackathon))
        .await
        .expect("create");
    repo.insert_rsvp(new_rsvp(event.id, "gone-soon"))
        .await
        .expect("rsvp");

    assert!(repo.delete_event(event.id).await.expect("delete"));
    assert!(!repo.event_exists(event.id).await.expect("exists"));
    assert!(repo
        .find_rsvp(event.id, "gone-soon")
        .await
        .expect("find")
        .is_none());
    assert_eq!(repo.count_attending(event.id).await.expect("count"), 0);

    assert!(!repo.delete_event(event.id).await.expect("second delete"));
}

#[test]
fn memory_rsvp_lifecycle() {
    RUNTIME.block_on(check_rsvp_lifecycle(memory_repo()));
}

#[test]
fn memory_rsvp_constraints() {
    RUNTIME.block_on(check_rsvp_constraints(memory_repo()));
}

#[test]
fn memory_listing_and_details() {
    RUNTIME.block_on(check_listing_and_details(memory_repo()));
}

#[test]
fn memory_delete_cascades() {
    RUNTIME.block_on(check_delete_cascades(memory_repo()));
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
fn postgres_rsvp_lifecycle() {
    RUNTIME.block_on(async { check_rsvp_lifecycle(postgres_repo().await).await });
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
fn postgres_rsvp_constraints() {
    RUNTIME.block_on(async { check_rsvp_constraints(postgres_repo().await).await });
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
fn postgres_listing_and_details() {
    RUNTIME.block_on(async { check_listing_and_details(postgres_repo().await).await });
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
fn postgres_delete_cascades() {
    RUNTIME.block_on(async { check_delete_cascades(postgres_repo().await).await });
}
