use crate::{error::RepoError, models::RecordKind};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored record: a JSON object whose `id` field matches its key.
pub type Document = Value;

/// SortOrder
///
/// Orderings the store knows how to apply. Content is listed by its
/// `display_order` field (ties broken by creation order); inbox-style
/// collections newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DisplayOrder,
    NewestFirst,
}

/// ListQuery
///
/// Filter and ordering for `Repository::list` and `Repository::count`.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Only records whose `is_active` field is true (records without the field count as active).
    pub active_only: bool,
    /// Top-level field equality, compared on the field's text form.
    pub field_eq: Option<(&'static str, String)>,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    pub fn newest_first() -> Self {
        Self {
            sort: SortOrder::NewestFirst,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.field_eq = Some((field, value.into()));
        self
    }
}

/// Repository Trait
///
/// The abstract record store. Every typed collection (content kinds,
/// enquiries, users) is persisted through this one contract, so handlers never
/// know which backend is in use.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Document, RepoError>;
    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<Document>, RepoError>;
    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Document>, RepoError>;
    async fn count(&self, kind: RecordKind, query: &ListQuery) -> Result<u64, RepoError>;
    // Replaces the whole document. Returns None when the record does not exist.
    async fn update(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Option<Document>, RepoError>;
    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<bool, RepoError>;
    async fn delete_many(&self, kind: RecordKind, ids: &[Uuid]) -> Result<u64, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the record store across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres ---

/// PostgresRepository
///
/// Record store backed by a single `records` table of JSONB documents.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, kind: RecordKind, query: &ListQuery) {
        builder.push(" WHERE kind = ");
        builder.push_bind(kind.as_str());
        if query.active_only {
            builder.push(" AND COALESCE((data->>'is_active')::boolean, true)");
        }
        if let Some((field, value)) = &query.field_eq {
            // The key is bound, not interpolated.
            builder.push(" AND data->>");
            builder.push_bind(*field);
            builder.push(" = ");
            builder.push_bind(value.clone());
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Document, RepoError> {
        let stored = sqlx::query_scalar::<_, Value>(
            "INSERT INTO records (id, kind, data) VALUES ($1, $2, $3) RETURNING data",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(doc)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<Document>, RepoError> {
        let doc = sqlx::query_scalar::<_, Value>(
            "SELECT data FROM records WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    /// list
    ///
    /// Built with QueryBuilder so every caller-supplied value is a bind parameter.
    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Document>, RepoError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT data FROM records");
        Self::push_filters(&mut builder, kind, query);
        match query.sort {
            SortOrder::DisplayOrder => builder.push(
                " ORDER BY COALESCE((data->>'display_order')::int, 0) ASC, created_at ASC, id ASC",
            ),
            SortOrder::NewestFirst => builder.push(" ORDER BY created_at DESC, id DESC"),
        };

        let docs = builder
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    async fn count(&self, kind: RecordKind, query: &ListQuery) -> Result<u64, RepoError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM records");
        Self::push_filters(&mut builder, kind, query);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn update(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Option<Document>, RepoError> {
        let stored = sqlx::query_scalar::<_, Value>(
            "UPDATE records SET data = $3, updated_at = NOW() WHERE kind = $1 AND id = $2 RETURNING data",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(doc)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, kind: RecordKind, ids: &[Uuid]) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM records WHERE kind = $1 AND id = ANY($2)")
            .bind(kind.as_str())
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// --- In-Memory ---

struct StoredRecord {
    doc: Document,
    // Insertion sequence, standing in for the `created_at` column.
    seq: u64,
}

#[derive(Default)]
struct MemoryState {
    next_seq: u64,
    collections: HashMap<RecordKind, HashMap<Uuid, StoredRecord>>,
}

/// InMemoryRepository
///
/// Process-local record store with the same ordering and filtering semantics
/// as `PostgresRepository`. Used by the test-suite and by local runs without a
/// `DATABASE_URL`.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn field_text(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(doc: &Document, query: &ListQuery) -> bool {
    if query.active_only && !doc.get("is_active").and_then(Value::as_bool).unwrap_or(true) {
        return false;
    }
    match &query.field_eq {
        Some((field, value)) => field_text(doc, field).as_deref() == Some(value.as_str()),
        None => true,
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Document, RepoError> {
        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .collections
            .entry(kind)
            .or_default()
            .insert(id, StoredRecord { doc: doc.clone(), seq });
        Ok(doc)
    }

    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<Document>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&kind)
            .and_then(|records| records.get(&id))
            .map(|record| record.doc.clone()))
    }

    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Document>, RepoError> {
        let state = self.state.read().await;
        let Some(records) = state.collections.get(&kind) else {
            return Ok(vec![]);
        };

        let mut selected: Vec<&StoredRecord> =
            records.values().filter(|r| matches(&r.doc, query)).collect();
        match query.sort {
            SortOrder::DisplayOrder => selected.sort_by_key(|r| {
                let order = r.doc.get("display_order").and_then(Value::as_i64).unwrap_or(0);
                (order, r.seq)
            }),
            SortOrder::NewestFirst => selected.sort_by(|a, b| b.seq.cmp(&a.seq)),
        }
        Ok(selected.into_iter().map(|r| r.doc.clone()).collect())
    }

    async fn count(&self, kind: RecordKind, query: &ListQuery) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&kind)
            .map(|records| records.values().filter(|r| matches(&r.doc, query)).count() as u64)
            .unwrap_or(0))
    }

    async fn update(&self, kind: RecordKind, id: Uuid, doc: Document) -> Result<Option<Document>, RepoError> {
        let mut state = self.state.write().await;
        match state.collections.get_mut(&kind).and_then(|records| records.get_mut(&id)) {
            Some(record) => {
                record.doc = doc.clone();
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        Ok(state
            .collections
            .get_mut(&kind)
            .map(|records| records.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn delete_many(&self, kind: RecordKind, ids: &[Uuid]) -> Result<u64, RepoError> {
        let mut state = self.state.write().await;
        let Some(records) = state.collections.get_mut(&kind) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| records.remove(*id).is_some()).count() as u64)
    }
}
