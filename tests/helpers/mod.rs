#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hippograph::config::HippoConfig;
use hippograph::db;
use hippograph::embedding::hashed::HashedEmbeddingProvider;
use hippograph::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use hippograph::engine::MemoryEngine;
use hippograph::memory::encode::{EncodeMemoryInput, EventPayload, WriteEventInput};
use hippograph::memory::types::{EventType, ParticipantKind, ParticipantRef};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed % EMBEDDING_DIM] = 1.0;
    v
}

/// An engine over a fresh in-memory store, embedding with the hashed provider.
pub fn test_engine() -> MemoryEngine {
    MemoryEngine::new(
        Arc::new(Mutex::new(test_db())),
        Arc::new(HashedEmbeddingProvider::new()),
        Arc::new(HippoConfig::default()),
    )
}

/// A provider whose every call fails, as an unloadable model would.
pub struct FailingEmbeddingProvider;

impl EmbeddingProvider for FailingEmbeddingProvider {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("model session unavailable")
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// An engine whose embedding step always fails, plus a handle on its store.
pub fn failing_engine() -> (MemoryEngine, Arc<Mutex<Connection>>) {
    let db = Arc::new(Mutex::new(test_db()));
    let engine = MemoryEngine::new(
        Arc::clone(&db),
        Arc::new(FailingEmbeddingProvider),
        Arc::new(HippoConfig::default()),
    );
    (engine, db)
}

/// A minimal valid `encode_memory` payload.
pub fn memory(summary: &str, significance: f64) -> EncodeMemoryInput {
    EncodeMemoryInput {
        event: EventPayload {
            event_type: EventType::Conversation,
            context_summary: summary.into(),
            full_content: None,
            emotional_valence: 0.0,
            significance,
            timestamp: None,
            place: None,
            participants: vec![],
            catalysts: vec![],
        },
        involves: vec![],
        precedes: vec![],
        consolidates_to: vec![],
    }
}

/// A minimal valid biomimetic event.
pub fn event(title: &str, happened_at: &str) -> WriteEventInput {
    WriteEventInput {
        title: title.into(),
        description: format!("{title}: what happened"),
        happened_at: Some(happened_at.into()),
        event_type: None,
        significance: None,
        emotional_valence: None,
        who: vec![],
        why: vec![],
        what_entities: vec![],
        what_produced: vec![],
        place: None,
        effects: vec![],
    }
}

pub fn person(name: &str, role: Option<&str>) -> ParticipantRef {
    ParticipantRef {
        id: name.into(),
        kind: ParticipantKind::Person,
        role: role.map(Into::into),
    }
}

/// Total rows across every node and edge table.
pub fn total_rows(conn: &Connection) -> i64 {
    [
        "events",
        "events_vec",
        "persons",
        "agents",
        "entities",
        "places",
        "catalysts",
        "targets",
        "concepts",
        "projects",
        "effects",
        "reflections",
        "participated_in",
        "involved_in",
        "catalyzed_by",
        "event_outputs",
        "preceded",
        "consolidated_to",
        "bonds",
        "bond_milestones",
        "bond_trajectory",
    ]
    .iter()
    .map(|t| {
        conn.query_row(&format!("SELECT COUNT(*) FROM {t}"), [], |row| row.get::<_, i64>(0))
            .unwrap()
    })
    .sum()
}
