use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{
    Event, EventFilters, EventPage, EventWithRsvpCount, NewEvent, NewRsvp, Pagination,
    Repository, RepositoryPtr, RsvpRecord, RsvpStatus,
};

const EVENT_COLUMNS: &str = "e.id, e.name, e.description, e.image_url, e.location, e.date, \
     e.start_time, e.end_time, e.max_capacity, e.status, e.event_type, \
     e.allow_anonymous_rsvp, e.rsvp_limit_per_ip, e.created_at, e.updated_at";

const RSVP_COUNT: &str = "(SELECT COUNT(*) FROM event_rsvps r \
     WHERE r.event_id = e.id AND r.status = 'attending') AS rsvp_count";

#[derive(sqlx::FromRow)]
struct RsvpRow {
    id: Uuid,
    event_id: Uuid,
    browser_fingerprint: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: String,
    rsvp_date: DateTime<Utc>,
}

impl TryFrom<RsvpRow> for RsvpRecord {
    type Error = anyhow::Error;

    fn try_from(r: RsvpRow) -> Result<Self> {
        // ---
        Ok(RsvpRecord {
            id: r.id,
            event_id: r.event_id,
            browser_fingerprint: r.browser_fingerprint,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            status: r.status.parse()?,
            rsvp_date: r.rsvp_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    location: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    max_capacity: i32,
    status: String,
    event_type: String,
    allow_anonymous_rsvp: bool,
    rsvp_limit_per_ip: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    rsvp_count: i64,
}

impl TryFrom<EventRow> for EventWithRsvpCount {
    type Error = anyhow::Error;

    fn try_from(r: EventRow) -> Result<Self> {
        // ---
        Ok(EventWithRsvpCount {
            event: Event {
                id: r.id,
                name: r.name,
                description: r.description,
                image_url: r.image_url,
                location: r.location,
                date: r.date,
                start_time: r.start_time,
                end_time: r.end_time,
                max_capacity: r.max_capacity,
                status: r.status.parse()?,
                event_type: r.event_type.parse()?,
                allow_anonymous_rsvp: r.allow_anonymous_rsvp,
                rsvp_limit_per_ip: r.rsvp_limit_per_ip,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            rsvp_count: r.rsvp_count,
        })
    }
}

/// Connect to PostgreSQL, retrying while the server comes up, then apply migrations.
///
/// Retries `config.retry_count` times, one second apart.
pub async fn init_database_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let options = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    let mut attempt = 0;
    let pool = loop {
        attempt += 1;
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => break pool,
            Err(err) if attempt < config.retry_count.max(1) => {
                tracing::warn!(
                    "Database not ready (attempt {attempt}/{}): {err}",
                    config.retry_count
                );
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(err) => {
                return Err(err).context(format!("failed to connect after {attempt} attempts"))
            }
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("Database ready after {attempt} attempt(s)");
    Ok(pool)
}

pub fn create_postgres_repository(pool: PgPool) -> RepositoryPtr {
    // ---
    Arc::new(PostgresRepository::new(pool))
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    // ---
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &EventFilters) {
    // ---
    builder.push(" WHERE TRUE");

    if let Some(status) = filters.status.status() {
        builder.push(" AND e.status = ").push_bind(status.as_str());
    }

    if let Some(event_type) = filters.event_type {
        builder.push(" AND e.event_type = ").push_bind(event_type.as_str());
    }

    if let Some(term) = filters.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (e.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    // ---
    async fn find_rsvp(&self, event_id: Uuid, fingerprint: &str) -> Result<Option<RsvpRecord>> {
        // ---
        let row = sqlx::query_as::<_, RsvpRow>(
            "SELECT id, event_id, browser_fingerprint, ip_address, user_agent, status, rsvp_date
             FROM event_rsvps WHERE event_id = $1 AND browser_fingerprint = $2",
        )
        .bind(event_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RsvpRecord::try_from).transpose()
    }

    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord> {
        // ---
        let record = rsvp.into_record();

        sqlx::query(
            "INSERT INTO event_rsvps
               (id, event_id, browser_fingerprint, ip_address, user_agent, status, rsvp_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(record.event_id)
        .bind(&record.browser_fingerprint)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.status.as_str())
        .bind(record.rsvp_date)
        .execute(&self.pool)
        .await
        .context("Failed to create RSVP")?;

        Ok(record)
    }

    async fn update_rsvp_status(
        &self,
        rsvp_id: Uuid,
        status: RsvpStatus,
        rsvp_date: DateTime<Utc>,
    ) -> Result<()> {
        // ---
        let result = sqlx::query("UPDATE event_rsvps SET status = $1, rsvp_date = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(rsvp_date)
            .bind(rsvp_id)
            .execute(&self.pool)
            .await
            .context("Failed to update RSVP")?;

        if result.rows_affected() == 0 {
            bail!("Failed to update RSVP: {rsvp_id} no longer exists");
        }

        Ok(())
    }

    async fn count_attending(&self, event_id: Uuid) -> Result<i64> {
        // ---
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1 AND status = 'attending'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn event_exists(&self, event_id: Uuid) -> Result<bool> {
        // ---
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        // ---
        let event = event.into_event();

        sqlx::query(
            "INSERT INTO events
               (id, name, description, image_url, location, date, start_time, end_time,
                max_capacity, status, event_type, allow_anonymous_rsvp, rsvp_limit_per_ip,
                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.image_url)
        .bind(&event.location)
        .bind(event.date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.max_capacity)
        .bind(event.status.as_str())
        .bind(event.event_type.as_str())
        .bind(event.allow_anonymous_rsvp)
        .bind(event.rsvp_limit_per_ip)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create event")?;

        Ok(event)
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventWithRsvpCount>> {
        // ---
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS}, {RSVP_COUNT} FROM events e WHERE e.id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EventWithRsvpCount::try_from).transpose()
    }

    async fn list_events(
        &self,
        filters: &EventFilters,
        pagination: Pagination,
    ) -> Result<EventPage> {
        // ---
        let pagination = pagination.normalized();

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e");
        push_filters(&mut count_query, filters);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to fetch events")?;

        let direction = if filters.ascending() { "ASC" } else { "DESC" };
        let mut list_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS}, {RSVP_COUNT} FROM events e"
        ));
        push_filters(&mut list_query, filters);
        list_query
            .push(format!(
                " ORDER BY e.date {direction}, e.start_time {direction} LIMIT "
            ))
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(pagination.offset()).context("Page offset out of range")?);

        let rows = list_query
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch events")?;

        let events = rows
            .into_iter()
            .map(EventWithRsvpCount::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(EventPage::new(events, total.max(0) as u64, pagination))
    }

    async fn all_events(&self) -> Result<Vec<EventWithRsvpCount>> {
        // ---
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS}, {RSVP_COUNT} FROM events e"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch events by status")?;

        rows.into_iter().map(EventWithRsvpCount::try_from).collect()
    }

    async fn delete_event(&self, event_id: Uuid) -> Result<bool> {
        // ---
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete event RSVPs")?;

        let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete event")?;

        tx.commit().await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
