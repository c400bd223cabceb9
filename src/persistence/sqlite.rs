use super::traits::Persistence;
use crate::error::{ConcurrencyError, ReferentialError, Result, StorageError, VoiceError};
use crate::feedback::{ArtifactKind, EventPage, FeedbackEvent, GeneratedArtifact};
use crate::rules::CorrectionApplied;
use crate::style::{Category, StyleProfile};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

const SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS brandvoice_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const SCHEMA_VERSION_KEY: &str = "schema_version";
const SCHEMA_VERSION: u32 = 1;

const SCHEMA: [&str; 9] = [
    "CREATE TABLE IF NOT EXISTS style_profiles (
        version      INTEGER PRIMARY KEY,
        profile_json TEXT NOT NULL,
        saved_at     TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS artifacts (
        artifact_id      TEXT PRIMARY KEY,
        category         TEXT NOT NULL,
        kind             TEXT NOT NULL,
        source_id        TEXT REFERENCES artifacts(artifact_id),
        input            TEXT NOT NULL,
        raw_text         TEXT NOT NULL,
        final_text       TEXT NOT NULL,
        corrections_json TEXT NOT NULL,
        profile_version  INTEGER NOT NULL,
        backend          TEXT NOT NULL,
        option_label     TEXT,
        created_at       TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS feedback_events (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id         TEXT NOT NULL UNIQUE,
        artifact_id      TEXT NOT NULL REFERENCES artifacts(artifact_id),
        category         TEXT NOT NULL,
        rating           INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        comment          TEXT,
        corrections_json TEXT NOT NULL,
        created_at       TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_feedback_category ON feedback_events(category, seq)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_artifact ON feedback_events(artifact_id, seq)",
    "CREATE TRIGGER IF NOT EXISTS feedback_events_append_only_update
        BEFORE UPDATE ON feedback_events
        BEGIN SELECT RAISE(ABORT, 'feedback events are append-only'); END",
    "CREATE TRIGGER IF NOT EXISTS feedback_events_append_only_delete
        BEFORE DELETE ON feedback_events
        BEGIN SELECT RAISE(ABORT, 'feedback events are append-only'); END",
    "CREATE TRIGGER IF NOT EXISTS artifacts_immutable
        BEFORE UPDATE ON artifacts
        BEGIN SELECT RAISE(ABORT, 'artifacts are immutable'); END",
    "CREATE TRIGGER IF NOT EXISTS style_profiles_immutable
        BEFORE UPDATE ON style_profiles
        BEGIN SELECT RAISE(ABORT, 'profile snapshots are immutable'); END",
];

const ARTIFACT_COLUMNS: &str = "artifact_id, category, kind, source_id, input, raw_text, \
     final_text, corrections_json, profile_version, backend, option_label, created_at";
const EVENT_COLUMNS: &str =
    "seq, event_id, artifact_id, category, rating, comment, corrections_json, created_at";

async fn ensure_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(SCHEMA_META_TABLE)
        .execute(pool)
        .await
        .context("create brandvoice_schema_meta table")?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM brandvoice_schema_meta WHERE key = $1")
            .bind(SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await
            .context("load schema version")?;

    if let Some((value,)) = stored_version {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("invalid schema version value: {value}"))?;
        anyhow::ensure!(
            parsed == SCHEMA_VERSION,
            "incompatible schema version: stored={parsed}, expected={SCHEMA_VERSION}. \
remove the database and run `brandvoice init` again."
        );
    }

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("apply brandvoice schema")?;
    }

    sqlx::query("INSERT OR IGNORE INTO brandvoice_schema_meta (key, value) VALUES ($1, $2)")
        .bind(SCHEMA_VERSION_KEY)
        .bind(SCHEMA_VERSION.to_string())
        .execute(pool)
        .await
        .context("persist schema version")?;

    Ok(())
}

const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// SQLite-backed store using an sqlx async pool.
pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    pub async fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn open_with(path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Schema(format!("create {}: {e}", parent.display())))?;
        }
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(&url)
            .await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool)
            .await
            .map_err(|e| StorageError::Schema(format!("{e:#}")))?;
        Ok(Self { pool })
    }
}

fn to_i64(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        StorageError::Corrupt {
            what: what.to_string(),
            message: format!("{value} does not fit in a SQLite integer"),
        }
        .into()
    })
}

fn corrupt(what: &str, message: impl std::fmt::Display) -> VoiceError {
    StorageError::Corrupt {
        what: what.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn parse_timestamp(raw: &str, what: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| corrupt(what, format!("bad timestamp '{raw}': {e}")))
}

fn parse_category(raw: &str, what: &str) -> Result<Category> {
    raw.parse::<Category>().map_err(|e| corrupt(what, e))
}

fn parse_corrections(raw: &str, what: &str) -> Result<Vec<CorrectionApplied>> {
    serde_json::from_str(raw).map_err(|e| corrupt(what, e))
}

fn row_to_artifact(row: &SqliteRow) -> Result<GeneratedArtifact> {
    const WHAT: &str = "artifact";
    let kind: String = row.try_get("kind")?;
    let kind = match kind.as_str() {
        "generated" => ArtifactKind::Generated,
        "corrected" => ArtifactKind::Corrected,
        other => return Err(corrupt(WHAT, format!("unknown kind '{other}'"))),
    };
    let version: i64 = row.try_get("profile_version")?;
    Ok(GeneratedArtifact {
        artifact_id: row.try_get("artifact_id")?,
        category: parse_category(&row.try_get::<String, _>("category")?, WHAT)?,
        kind,
        source_id: row.try_get("source_id")?,
        input: row.try_get("input")?,
        raw_text: row.try_get("raw_text")?,
        final_text: row.try_get("final_text")?,
        corrections: parse_corrections(&row.try_get::<String, _>("corrections_json")?, WHAT)?,
        style_profile_version: u64::try_from(version)
            .map_err(|_| corrupt(WHAT, format!("negative profile version {version}")))?,
        backend: row.try_get("backend")?,
        option_label: row.try_get("option_label")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, WHAT)?,
    })
}

fn row_to_event(row: &SqliteRow) -> Result<FeedbackEvent> {
    const WHAT: &str = "feedback event";
    let rating: i64 = row.try_get("rating")?;
    Ok(FeedbackEvent {
        event_id: row.try_get("event_id")?,
        seq: Some(row.try_get("seq")?),
        artifact_id: row.try_get("artifact_id")?,
        category: parse_category(&row.try_get::<String, _>("category")?, WHAT)?,
        rating: u8::try_from(rating).map_err(|_| corrupt(WHAT, format!("rating {rating}")))?,
        comment: row.try_get("comment")?,
        timestamp: parse_timestamp(&row.try_get::<String, _>("created_at")?, WHAT)?,
        applied_corrections: parse_corrections(
            &row.try_get::<String, _>("corrections_json")?,
            WHAT,
        )?,
    })
}

impl Persistence for SqlitePersistence {
    fn load_profile(&self) -> Pin<Box<dyn Future<Output = Result<Option<StyleProfile>>> + Send + '_>> {
        Box::pin(async move {
            const WHAT: &str = "style profile";
            let row: Option<(i64, String)> = sqlx::query_as(
                "SELECT version, profile_json FROM style_profiles ORDER BY version DESC LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await?;

            let Some((version, json)) = row else {
                return Ok(None);
            };
            let profile: StyleProfile =
                serde_json::from_str(&json).map_err(|e| corrupt(WHAT, e))?;
            if i64::try_from(profile.version).ok() != Some(version) {
                return Err(corrupt(
                    WHAT,
                    format!(
                        "row version {version} disagrees with snapshot version {}",
                        profile.version
                    ),
                ));
            }
            profile.validate().map_err(|e| corrupt(WHAT, e))?;
            Ok(Some(profile))
        })
    }

    fn save_profile<'a>(
        &'a self,
        profile: &'a StyleProfile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let json = serde_json::to_string(profile)?;
            let version = to_i64(profile.version, "style profile")?;

            let mut tx = self.pool.begin().await?;
            let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM style_profiles")
                .fetch_one(&mut *tx)
                .await?;
            let mismatch = |current: i64| -> VoiceError {
                ConcurrencyError::ProfileVersionMismatch {
                    supplied: profile.version.saturating_sub(1),
                    current: u64::try_from(current).unwrap_or_default(),
                }
                .into()
            };
            if let Some(latest) = latest
                && version != latest + 1
            {
                return Err(mismatch(latest));
            }

            let inserted = sqlx::query(
                "INSERT INTO style_profiles (version, profile_json, saved_at) VALUES ($1, $2, $3)",
            )
            .bind(version)
            .bind(json)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await;
            match inserted {
                Ok(_) => {}
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    return Err(mismatch(version));
                }
                Err(e) => return Err(e.into()),
            }
            tx.commit().await?;
            Ok(())
        })
    }

    fn append_event<'a>(
        &'a self,
        event: &'a FeedbackEvent,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + 'a>> {
        Box::pin(async move {
            let corrections = serde_json::to_string(&event.applied_corrections)?;
            let inserted = sqlx::query(
                "INSERT INTO feedback_events
                    (event_id, artifact_id, category, rating, comment, corrections_json, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&event.event_id)
            .bind(&event.artifact_id)
            .bind(event.category.to_string())
            .bind(i64::from(event.rating))
            .bind(event.comment.as_deref())
            .bind(corrections)
            .bind(event.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await;
            match inserted {
                Ok(done) => Ok(done.last_insert_rowid()),
                Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                    Err(ReferentialError::UnknownArtifact {
                        artifact_id: event.artifact_id.clone(),
                    }
                    .into())
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn append_artifact<'a>(
        &'a self,
        artifact: &'a GeneratedArtifact,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let corrections = serde_json::to_string(&artifact.corrections)?;
            let version = to_i64(artifact.style_profile_version, "artifact")?;
            let inserted = sqlx::query(&format!(
                "INSERT INTO artifacts ({ARTIFACT_COLUMNS})
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
            ))
            .bind(&artifact.artifact_id)
            .bind(artifact.category.to_string())
            .bind(artifact.kind.to_string())
            .bind(artifact.source_id.as_deref())
            .bind(&artifact.input)
            .bind(&artifact.raw_text)
            .bind(&artifact.final_text)
            .bind(corrections)
            .bind(version)
            .bind(&artifact.backend)
            .bind(artifact.option_label.as_deref())
            .bind(artifact.created_at.to_rfc3339())
            .execute(&self.pool)
            .await;
            match inserted {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                    Err(ReferentialError::UnknownArtifact {
                        artifact_id: artifact.source_id.clone().unwrap_or_default(),
                    }
                    .into())
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn load_artifact<'a>(
        &'a self,
        artifact_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeneratedArtifact>>> + Send + 'a>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE artifact_id = $1"
            ))
            .bind(artifact_id)
            .fetch_optional(&self.pool)
            .await?;
            row.as_ref().map(row_to_artifact).transpose()
        })
    }

    fn list_events_page(
        &self,
        category: Option<Category>,
        before_seq: Option<i64>,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<EventPage>> + Send + '_>> {
        Box::pin(async move {
            let limit = limit.max(1);
            let fetch = i64::try_from(limit + 1).unwrap_or(i64::MAX);
            let rows = sqlx::query(&format!(
                "SELECT {EVENT_COLUMNS} FROM feedback_events
                 WHERE ($1 IS NULL OR category = $1)
                   AND ($2 IS NULL OR seq < $2)
                 ORDER BY seq DESC
                 LIMIT $3"
            ))
            .bind(category.map(|c| c.to_string()))
            .bind(before_seq)
            .bind(fetch)
            .fetch_all(&self.pool)
            .await?;

            let has_more = rows.len() > limit;
            let mut events = Vec::with_capacity(limit);
            let mut last_seq = None;
            for row in rows.iter().take(limit) {
                last_seq = Some(row.try_get::<i64, _>("seq")?);
                events.push(row_to_event(row)?);
            }
            Ok(EventPage {
                events,
                next_before: if has_more { last_seq } else { None },
            })
        })
    }

    fn events_for_artifact<'a>(
        &'a self,
        artifact_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FeedbackEvent>>> + Send + 'a>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {EVENT_COLUMNS} FROM feedback_events WHERE artifact_id = $1 ORDER BY seq ASC"
            ))
            .bind(artifact_id)
            .fetch_all(&self.pool)
            .await?;
            rows.iter().map(row_to_event).collect()
        })
    }

    fn profile_versions(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<(u64, DateTime<Utc>)>>> + Send + '_>> {
        Box::pin(async move {
            let rows: Vec<(i64, String)> =
                sqlx::query_as("SELECT version, saved_at FROM style_profiles ORDER BY version DESC")
                    .fetch_all(&self.pool)
                    .await?;
            rows.into_iter()
                .map(|(version, saved_at)| {
                    let version = u64::try_from(version)
                        .map_err(|_| corrupt("style profile", format!("version {version}")))?;
                    Ok((version, parse_timestamp(&saved_at, "style profile")?))
                })
                .collect()
        })
    }

    fn count_events(&self) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + '_>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback_events")
                .fetch_one(&self.pool)
                .await?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            artifact_id: id.into(),
            category: Category::Recognition,
            kind: ArtifactKind::Generated,
            source_id: None,
            input: "Día del Operario".into(),
            raw_text: "raw".into(),
            final_text: "final".into(),
            corrections: Vec::new(),
            style_profile_version: 1,
            backend: "simulator".into(),
            option_label: None,
            created_at: Utc::now(),
        }
    }

    fn event(id: &str, artifact_id: &str, rating: u8) -> FeedbackEvent {
        FeedbackEvent {
            event_id: id.into(),
            seq: None,
            artifact_id: artifact_id.into(),
            category: Category::Recognition,
            rating,
            comment: None,
            timestamp: Utc::now(),
            applied_corrections: Vec::new(),
        }
    }

    #[tokio::test]
    async fn fresh_store_has_no_profile() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        assert!(store.load_profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_versions_must_be_contiguous() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        let mut profile = StyleProfile::seed();
        store.save_profile(&profile).await.unwrap();

        profile.version = 3;
        let err = store.save_profile(&profile).await.unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Concurrency(ConcurrencyError::ProfileVersionMismatch { current: 1, .. })
        ));

        profile.version = 2;
        store.save_profile(&profile).await.unwrap();
        assert_eq!(store.load_profile().await.unwrap().unwrap().version, 2);
        assert_eq!(store.profile_versions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn artifact_round_trip() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        let original = artifact("a1");
        store.append_artifact(&original).await.unwrap();
        let loaded = store.load_artifact("a1").await.unwrap().unwrap();
        assert_eq!(loaded.final_text, "final");
        assert_eq!(loaded.kind, ArtifactKind::Generated);
        assert!(store.load_artifact("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn event_for_missing_artifact_is_referential_error() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        let err = store.append_event(&event("e1", "ghost", 3)).await.unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Referential(ReferentialError::UnknownArtifact { .. })
        ));
        assert_eq!(store.count_events().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pages_walk_history_newest_first() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        store.append_artifact(&artifact("a1")).await.unwrap();
        for i in 0..5 {
            store
                .append_event(&event(&format!("e{i}"), "a1", 4))
                .await
                .unwrap();
        }

        let first = store.list_events_page(None, None, 2).await.unwrap();
        let ids: Vec<_> = first.events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["e4", "e3"]);

        let second = store
            .list_events_page(None, first.next_before, 2)
            .await
            .unwrap();
        let third = store
            .list_events_page(None, second.next_before, 2)
            .await
            .unwrap();
        assert_eq!(third.events.len(), 1);
        assert_eq!(third.events[0].event_id, "e0");
        assert!(third.next_before.is_none());
    }

    #[tokio::test]
    async fn events_cannot_be_rewritten() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        store.append_artifact(&artifact("a1")).await.unwrap();
        store.append_event(&event("e1", "a1", 2)).await.unwrap();

        let result = sqlx::query("UPDATE feedback_events SET rating = 5")
            .execute(&store.pool)
            .await;
        assert!(result.is_err());
        let result = sqlx::query("DELETE FROM feedback_events")
            .execute(&store.pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_fatal() {
        let store = SqlitePersistence::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO style_profiles (version, profile_json, saved_at) VALUES (1, '{oops', $1)")
            .bind(Utc::now().to_rfc3339())
            .execute(&store.pool)
            .await
            .unwrap();
        let err = store.load_profile().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
