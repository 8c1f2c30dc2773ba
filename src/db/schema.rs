//! SQL DDL for the memory graph.
//!
//! Node kinds are tables keyed by their identifier (`events`, `persons`, `agents`,
//! `entities`, `places`, `catalysts`, `targets`, `concepts`, `projects`,
//! `effects`, `reflections`, `captures`). Relationship kinds are edge tables
//! with foreign keys (`participated_in`, `involved_in`, `catalyzed_by`,
//! `event_outputs`, `preceded`, `consolidated_to`, `bonds`). The Event
//! embedding index is the `events_vec` vec0 table. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for the graph's node and edge tables.
const SCHEMA_SQL: &str = r#"
-- Reference nodes, upserted by identifier
CREATE TABLE IF NOT EXISTS persons (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entities (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    scale TEXT CHECK(scale IS NULL OR scale IN ('micro','meso','macro')),
    metadata TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS places (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS catalysts (
    description TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS targets (
    id TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (id, kind)
);

CREATE TABLE IF NOT EXISTS concepts (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Episodes: write-once binding hubs
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    event_type TEXT CHECK(event_type IS NULL OR event_type IN ('conversation','realization','correction','collaboration','genesis')),
    happened_at TEXT NOT NULL,
    emotional_valence REAL NOT NULL CHECK(emotional_valence >= -1.0 AND emotional_valence <= 1.0),
    significance REAL NOT NULL CHECK(significance >= 0.0 AND significance <= 1.0),
    context_summary TEXT NOT NULL,
    full_content TEXT,
    title TEXT,
    description TEXT,
    place TEXT REFERENCES places(name),
    embedding_model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_happened_at ON events(happened_at);
CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
CREATE INDEX IF NOT EXISTS idx_events_significance ON events(significance);
CREATE INDEX IF NOT EXISTS idx_events_place ON events(place);

CREATE TABLE IF NOT EXISTS effects (
    id TEXT PRIMARY KEY,
    event_id TEXT NOT NULL REFERENCES events(id),
    summary TEXT NOT NULL,
    valence TEXT NOT NULL CHECK(valence IN ('positive','negative','neutral','mixed')),
    intensity REAL NOT NULL CHECK(intensity >= 0.0 AND intensity <= 1.0),
    target_id TEXT,
    target_kind TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (target_id, target_kind) REFERENCES targets(id, kind)
);

CREATE INDEX IF NOT EXISTS idx_effects_event ON effects(event_id);
CREATE INDEX IF NOT EXISTS idx_effects_target ON effects(target_id);

CREATE TABLE IF NOT EXISTS reflections (
    id TEXT PRIMARY KEY,
    event_id TEXT NOT NULL REFERENCES events(id),
    agent_id TEXT NOT NULL REFERENCES agents(id),
    summary TEXT NOT NULL,
    valence REAL NOT NULL CHECK(valence >= -1.0 AND valence <= 1.0),
    entry_date TEXT NOT NULL,
    who_context TEXT NOT NULL,
    where_context TEXT,
    how_context TEXT,
    considered_targets TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reflections_event ON reflections(event_id);
CREATE INDEX IF NOT EXISTS idx_reflections_agent ON reflections(agent_id);

-- Pre-filtering intake records
CREATE TABLE IF NOT EXISTS captures (
    capture_id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    description TEXT NOT NULL,
    significance REAL NOT NULL CHECK(significance >= 0.0 AND significance <= 1.0),
    emotional_intensity REAL NOT NULL CHECK(emotional_intensity >= 0.0 AND emotional_intensity <= 1.0),
    project TEXT,
    modality TEXT,
    location TEXT,
    affect TEXT,
    tags TEXT NOT NULL,
    source TEXT,
    deadline TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Edges
CREATE TABLE IF NOT EXISTS participated_in (
    event_id TEXT NOT NULL REFERENCES events(id),
    participant_kind TEXT NOT NULL CHECK(participant_kind IN ('person','agent')),
    participant_id TEXT NOT NULL,
    role TEXT,
    PRIMARY KEY (event_id, participant_kind, participant_id)
);

CREATE INDEX IF NOT EXISTS idx_participated_participant ON participated_in(participant_id);

CREATE TABLE IF NOT EXISTS involved_in (
    event_id TEXT NOT NULL REFERENCES events(id),
    entity_id TEXT NOT NULL REFERENCES entities(id),
    role TEXT,
    salience REAL CHECK(salience IS NULL OR (salience >= 0.0 AND salience <= 1.0)),
    PRIMARY KEY (event_id, entity_id)
);

CREATE INDEX IF NOT EXISTS idx_involved_entity ON involved_in(entity_id);

CREATE TABLE IF NOT EXISTS catalyzed_by (
    event_id TEXT NOT NULL REFERENCES events(id),
    catalyst TEXT NOT NULL REFERENCES catalysts(description),
    PRIMARY KEY (event_id, catalyst)
);

CREATE TABLE IF NOT EXISTS event_outputs (
    event_id TEXT NOT NULL REFERENCES events(id),
    entity_id TEXT NOT NULL REFERENCES entities(id),
    relation TEXT NOT NULL CHECK(relation IN ('produced','modified')),
    PRIMARY KEY (event_id, entity_id, relation)
);

CREATE INDEX IF NOT EXISTS idx_outputs_entity ON event_outputs(entity_id);

CREATE TABLE IF NOT EXISTS preceded (
    from_event TEXT NOT NULL REFERENCES events(id),
    to_event TEXT NOT NULL REFERENCES events(id),
    causal_strength REAL CHECK(causal_strength IS NULL OR (causal_strength >= 0.0 AND causal_strength <= 1.0)),
    PRIMARY KEY (from_event, to_event),
    CHECK(from_event <> to_event)
);

CREATE TABLE IF NOT EXISTS consolidated_to (
    event_id TEXT NOT NULL REFERENCES events(id),
    target_kind TEXT NOT NULL CHECK(target_kind IN ('concept','person','project')),
    target_name TEXT NOT NULL,
    strength REAL NOT NULL CHECK(strength >= 0.0 AND strength <= 1.0),
    consolidation_type TEXT NOT NULL,
    rehearsal_count INTEGER NOT NULL DEFAULT 0 CHECK(rehearsal_count >= 0),
    PRIMARY KEY (event_id, target_kind, target_name)
);

-- Evolving bonds: one live aggregate per ordered pair, plus append-only logs
CREATE TABLE IF NOT EXISTS bonds (
    source_id TEXT NOT NULL REFERENCES entities(id),
    target_id TEXT NOT NULL REFERENCES entities(id),
    strength REAL NOT NULL CHECK(strength >= 0.0 AND strength <= 1.0),
    emotional_resonance REAL NOT NULL CHECK(emotional_resonance >= -1.0 AND emotional_resonance <= 1.0),
    interaction_count INTEGER NOT NULL,
    first_interaction TEXT NOT NULL,
    last_interaction TEXT NOT NULL,
    PRIMARY KEY (source_id, target_id)
);

CREATE TABLE IF NOT EXISTS bond_milestones (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    milestone TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    FOREIGN KEY (source_id, target_id) REFERENCES bonds(source_id, target_id)
);

CREATE TABLE IF NOT EXISTS bond_trajectory (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    strength REAL NOT NULL,
    emotional_resonance REAL NOT NULL,
    context TEXT,
    FOREIGN KEY (source_id, target_id) REFERENCES bonds(source_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_trajectory_pair ON bond_trajectory(source_id, target_id);
CREATE INDEX IF NOT EXISTS idx_milestones_pair ON bond_milestones(source_id, target_id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS events_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
