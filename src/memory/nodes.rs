//! Create-if-absent, reuse-if-present writes for identifier-keyed nodes.
//!
//! Person, Agent, Entity, Place, Catalyst, Target, Concept, and Project nodes
//! are only ever upserted by their identifier, so two Events that mention
//! "Alice" share one Person node. Referencing an identifier for the first time
//! creates a minimal placeholder; an Entity placeholder takes its id as name
//! and `"unknown"` as kind until a later reference describes it.

use rusqlite::{params, Connection};

use super::error::MemoryResult;
use super::types::{ConsolidationKind, EntityRef, ParticipantKind, TargetRef};

pub const PLACEHOLDER_ENTITY_KIND: &str = "unknown";

pub fn upsert_person(conn: &Connection, name: &str, now: &str) -> MemoryResult<()> {
    conn.execute(
        "INSERT INTO persons (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    Ok(())
}

pub fn upsert_agent(conn: &Connection, id: &str, now: &str) -> MemoryResult<()> {
    conn.execute(
        "INSERT INTO agents (id, created_at) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
        params![id, now],
    )?;
    Ok(())
}

pub fn upsert_participant(
    conn: &Connection,
    kind: ParticipantKind,
    id: &str,
    now: &str,
) -> MemoryResult<()> {
    match kind {
        ParticipantKind::Person => upsert_person(conn, id, now),
        ParticipantKind::Agent => upsert_agent(conn, id, now),
    }
}

/// Upsert an Entity. Supplied descriptive fields overwrite stored ones; absent
/// fields leave them untouched.
pub fn upsert_entity(conn: &Connection, entity: &EntityRef, now: &str) -> MemoryResult<()> {
    let metadata = entity
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO entities (id, name, kind, scale, metadata, created_at) \
         VALUES (?1, COALESCE(?2, ?1), COALESCE(?3, ?7), ?4, ?5, ?6) \
         ON CONFLICT(id) DO UPDATE SET \
             name = COALESCE(?2, name), \
             kind = COALESCE(?3, kind), \
             scale = COALESCE(?4, scale), \
             metadata = COALESCE(?5, metadata)",
        params![
            entity.id,
            entity.name,
            entity.kind,
            entity.scale.map(|s| s.as_str()),
            metadata,
            now,
            PLACEHOLDER_ENTITY_KIND,
        ],
    )?;
    Ok(())
}

/// Upsert an Entity known only by id.
pub fn ensure_entity(conn: &Connection, id: &str, now: &str) -> MemoryResult<()> {
    upsert_entity(conn, &EntityRef::new(id), now)
}

pub fn upsert_place(conn: &Connection, name: &str, now: &str) -> MemoryResult<()> {
    conn.execute(
        "INSERT INTO places (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    Ok(())
}

/// Catalysts are de-duplicated by exact description text.
pub fn upsert_catalyst(conn: &Connection, description: &str, now: &str) -> MemoryResult<()> {
    conn.execute(
        "INSERT INTO catalysts (description, created_at) VALUES (?1, ?2) \
         ON CONFLICT(description) DO NOTHING",
        params![description, now],
    )?;
    Ok(())
}

pub fn upsert_target(conn: &Connection, target: &TargetRef, now: &str) -> MemoryResult<()> {
    conn.execute(
        "INSERT INTO targets (id, kind, created_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(id, kind) DO NOTHING",
        params![target.id, target.kind, now],
    )?;
    Ok(())
}

pub fn upsert_consolidation_target(
    conn: &Connection,
    kind: ConsolidationKind,
    name: &str,
    now: &str,
) -> MemoryResult<()> {
    let table = match kind {
        ConsolidationKind::Person => return upsert_person(conn, name, now),
        ConsolidationKind::Concept => "concepts",
        ConsolidationKind::Project => "projects",
    };
    conn.execute(
        &format!(
            "INSERT INTO {table} (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING"
        ),
        params![name, now],
    )?;
    Ok(())
}

/// Whether an Event with this id exists. Events are never upserted.
pub fn event_exists(conn: &Connection, event_id: &str) -> MemoryResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM events WHERE id = ?1",
        params![event_id],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::memory::types::EntityScale;

    const NOW: &str = "2026-03-01T12:00:00.000000Z";

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn person_upsert_is_idempotent() {
        let conn = db::open_memory_database().unwrap();
        upsert_person(&conn, "Alice", NOW).unwrap();
        upsert_person(&conn, "Alice", NOW).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM persons"), 1);
    }

    #[test]
    fn entity_placeholder_then_described() {
        let conn = db::open_memory_database().unwrap();
        ensure_entity(&conn, "ent-tokio", NOW).unwrap();

        let (name, kind): (String, String) = conn
            .query_row(
                "SELECT name, kind FROM entities WHERE id = 'ent-tokio'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "ent-tokio");
        assert_eq!(kind, PLACEHOLDER_ENTITY_KIND);

        let mut described = EntityRef::new("ent-tokio");
        described.name = Some("tokio".into());
        described.kind = Some("framework".into());
        described.scale = Some(EntityScale::Macro);
        upsert_entity(&conn, &described, NOW).unwrap();

        // a later bare reference does not erase the description
        ensure_entity(&conn, "ent-tokio", NOW).unwrap();

        let (name, kind, scale): (String, String, Option<String>) = conn
            .query_row(
                "SELECT name, kind, scale FROM entities WHERE id = 'ent-tokio'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(name, "tokio");
        assert_eq!(kind, "framework");
        assert_eq!(scale.as_deref(), Some("macro"));
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM entities"), 1);
    }

    #[test]
    fn targets_dedup_on_id_and_kind() {
        let conn = db::open_memory_database().unwrap();
        let a = TargetRef { id: "hippograph".into(), kind: "project".into() };
        let b = TargetRef { id: "hippograph".into(), kind: "entity".into() };
        upsert_target(&conn, &a, NOW).unwrap();
        upsert_target(&conn, &a, NOW).unwrap();
        upsert_target(&conn, &b, NOW).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM targets"), 2);
    }

    #[test]
    fn consolidation_person_lands_in_persons() {
        let conn = db::open_memory_database().unwrap();
        upsert_consolidation_target(&conn, ConsolidationKind::Person, "Alice", NOW).unwrap();
        upsert_consolidation_target(&conn, ConsolidationKind::Concept, "ownership", NOW).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM persons"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM concepts"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM projects"), 0);
    }
}
