//! Async facade over the synchronous graph operations.
//!
//! Every operation follows the same unit of work: validate the input, embed
//! any text on a blocking task, then lock the shared connection on another
//! blocking task for exactly one store call. The guard is dropped on every
//! path, and an uncommitted transaction rolls back when it goes out of scope.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::HippoConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::memory::bonds::{self, Bond, BondResult, EvolveBondInput};
use crate::memory::capture::{self, Capture, CaptureInput};
use crate::memory::encode::{
    self, EncodeMemoryInput, EncodedMemory, Reflection, WriteEventInput, WriteReflectionInput,
    WrittenEvent,
};
use crate::memory::episodes::{self, Episode, SearchEventsRequest, SearchEventsResponse};
use crate::memory::recall::{self, RecallRequest, RecallResponse};
use crate::memory::stats::{self, GraphStats};
use crate::memory::{MemoryError, MemoryResult};

#[derive(Clone)]
pub struct MemoryEngine {
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
    config: Arc<HippoConfig>,
}

impl MemoryEngine {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedding: Arc<dyn EmbeddingProvider>,
        config: Arc<HippoConfig>,
    ) -> Self {
        Self {
            db,
            embedding,
            config,
        }
    }

    /// Open the configured database and embedding provider.
    ///
    /// Stamps the embedding model on a fresh store and warns when the stored
    /// model differs from the configured one.
    pub fn open(config: HippoConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;

        let provider: Arc<dyn EmbeddingProvider> =
            Arc::from(embedding::create_provider(&config.embedding)?);

        match db::migrations::get_embedding_model(&conn)? {
            Some(stored) if stored != provider.model_id() => {
                tracing::warn!(
                    stored = %stored,
                    configured = %provider.model_id(),
                    "embedding model changed; vectors from different models are not comparable"
                );
            }
            Some(_) => {}
            None => db::migrations::set_embedding_model(&conn, provider.model_id())?,
        }

        tracing::info!(
            db = %db_path.display(),
            model = %provider.model_id(),
            "memory engine ready"
        );
        Ok(Self::new(
            Arc::new(Mutex::new(conn)),
            provider,
            Arc::new(config),
        ))
    }

    pub fn config(&self) -> &HippoConfig {
        &self.config
    }

    async fn embed(&self, text: String) -> MemoryResult<Vec<f32>> {
        let provider = Arc::clone(&self.embedding);
        let vector = tokio::task::spawn_blocking(move || provider.embed(&text))
            .await
            .map_err(|e| MemoryError::Internal(format!("embedding task failed: {e}")))?
            .map_err(|e| MemoryError::Embedding(format!("{e:#}")))?;
        crate::memory::check_embedding(&vector)?;
        Ok(vector)
    }

    async fn with_db<T, F>(&self, f: F) -> MemoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> MemoryResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| MemoryError::Internal(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| MemoryError::Internal(format!("db task failed: {e}")))?
    }

    pub async fn encode_memory(&self, input: EncodeMemoryInput) -> MemoryResult<EncodedMemory> {
        input.validate()?;
        let vector = self.embed(input.embedding_text()).await?;
        let model = self.embedding.model_id().to_string();
        self.with_db(move |conn| encode::encode_memory(conn, &input, &vector, &model))
            .await
    }

    pub async fn write_event(&self, input: WriteEventInput) -> MemoryResult<WrittenEvent> {
        input.validate()?;
        let vector = self.embed(input.embedding_text()).await?;
        let model = self.embedding.model_id().to_string();
        self.with_db(move |conn| encode::write_event(conn, &input, &vector, &model))
            .await
    }

    pub async fn write_reflection(&self, input: WriteReflectionInput) -> MemoryResult<Reflection> {
        input.validate()?;
        self.with_db(move |conn| encode::write_reflection(conn, &input))
            .await
    }

    pub async fn recall_memory(&self, req: RecallRequest) -> MemoryResult<RecallResponse> {
        req.validate()?;
        let vector = match req.query_text() {
            Some(q) => Some(self.embed(q.to_string()).await?),
            None => None,
        };
        let retrieval = self.config.retrieval.clone();
        self.with_db(move |conn| recall::recall_memory(conn, &req, vector.as_deref(), &retrieval))
            .await
    }

    pub async fn search_events(
        &self,
        req: SearchEventsRequest,
    ) -> MemoryResult<SearchEventsResponse> {
        req.validate()?;
        let vector = match req.query_text() {
            Some(q) => Some(self.embed(q.to_string()).await?),
            None => None,
        };
        let retrieval = self.config.retrieval.clone();
        self.with_db(move |conn| {
            episodes::search_events(conn, &req, vector.as_deref(), &retrieval)
        })
        .await
    }

    pub async fn get_episode(&self, event_id: String) -> MemoryResult<Option<Episode>> {
        self.with_db(move |conn| episodes::get_episode(conn, &event_id))
            .await
    }

    pub async fn evolve_bond(&self, input: EvolveBondInput) -> MemoryResult<BondResult> {
        input.validate()?;
        self.with_db(move |conn| bonds::evolve_bond(conn, &input))
            .await
    }

    pub async fn get_bond(&self, from: String, to: String) -> MemoryResult<Option<Bond>> {
        self.with_db(move |conn| bonds::get_bond(conn, &from, &to))
            .await
    }

    pub async fn write_capture(&self, input: CaptureInput) -> MemoryResult<Capture> {
        input.validate()?;
        self.with_db(move |conn| capture::write_capture(conn, &input))
            .await
    }

    pub async fn graph_stats(&self) -> MemoryResult<GraphStats> {
        let db_path = self.config.resolved_db_path();
        self.with_db(move |conn| stats::graph_stats(conn, Some(&db_path)))
            .await
    }
}

/// Wrap an operation outcome in the structured result object.
///
/// Success: `{"success": true, "elapsed_ms": n, ...payload}`.
/// Failure: `{"success": false, "error": msg, "error_kind": kind, "elapsed_ms": n}`.
pub fn envelope<T: Serialize>(started: Instant, result: MemoryResult<T>) -> Value {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let payload = result.and_then(|v| serde_json::to_value(v).map_err(MemoryError::from));
    match payload {
        Ok(Value::Object(mut fields)) => {
            fields.insert("success".into(), Value::Bool(true));
            fields.insert("elapsed_ms".into(), json!(elapsed_ms));
            Value::Object(fields)
        }
        Ok(other) => json!({ "success": true, "elapsed_ms": elapsed_ms, "result": other }),
        Err(e) => {
            tracing::warn!(error_kind = e.kind(), error = %e, "operation failed");
            json!({
                "success": false,
                "error": e.to_string(),
                "error_kind": e.kind(),
                "elapsed_ms": elapsed_ms,
            })
        }
    }
}
