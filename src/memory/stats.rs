use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::error::MemoryResult;
use super::types::EventType;

/// Response from graph_stats.
#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub events: u64,
    /// Biomimetic events written without a type are counted under `"untyped"`.
    pub by_event_type: BTreeMap<String, u64>,
    pub nodes: BTreeMap<String, u64>,
    pub edges: BTreeMap<String, u64>,
    pub bonds: u64,
    pub trajectory_snapshots: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_event: Option<String>,
}

const NODE_TABLES: &[&str] = &[
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
    "captures",
];

const EDGE_TABLES: &[&str] = &[
    "participated_in",
    "involved_in",
    "catalyzed_by",
    "event_outputs",
    "preceded",
    "consolidated_to",
];

/// Count nodes and edges by kind.
///
/// `db_path` is used for file size; pass None for in-memory databases.
pub fn graph_stats(conn: &Connection, db_path: Option<&Path>) -> MemoryResult<GraphStats> {
    let mut nodes = BTreeMap::new();
    for table in NODE_TABLES {
        nodes.insert(table.to_string(), count_rows(conn, table)?);
    }
    let mut edges = BTreeMap::new();
    for table in EDGE_TABLES {
        edges.insert(table.to_string(), count_rows(conn, table)?);
    }

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(happened_at), MAX(happened_at) FROM events",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(GraphStats {
        events: count_rows(conn, "events")?,
        by_event_type: count_by_event_type(conn)?,
        nodes,
        edges,
        bonds: count_rows(conn, "bonds")?,
        trajectory_snapshots: count_rows(conn, "bond_trajectory")?,
        db_size_bytes,
        oldest_event: oldest,
        newest_event: newest,
    })
}

fn count_rows(conn: &Connection, table: &str) -> MemoryResult<u64> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(n as u64)
}

fn count_by_event_type(conn: &Connection) -> MemoryResult<BTreeMap<String, u64>> {
    let mut map = BTreeMap::new();
    for t in [
        EventType::Conversation,
        EventType::Realization,
        EventType::Correction,
        EventType::Collaboration,
        EventType::Genesis,
    ] {
        map.insert(t.to_string(), 0);
    }

    let mut stmt = conn.prepare(
        "SELECT COALESCE(event_type, 'untyped'), COUNT(*) FROM events GROUP BY 1",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (t, count) in rows {
        map.insert(t, count as u64);
    }
    Ok(map)
}
