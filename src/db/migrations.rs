//! Forward-only schema migrations.
//!
//! The schema version lives in `schema_meta`; [`run_migrations`] walks it up to
//! [`CURRENT_SCHEMA_VERSION`] one step at a time. The same table records which
//! embedding model produced the vectors in `events_vec`, so a model swap can be
//! detected before mixed vectors are compared.

use rusqlite::{Connection, OptionalExtension};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Record the embedding model identifier the index was built with.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each step runs in its own transaction.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(
        schema_version = version,
        target = CURRENT_SCHEMA_VERSION,
        "checking migrations"
    );

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// v1 → v2: index consolidation targets for reverse lookups. Stores that
/// already hold vectors predate model tracking and were built with the
/// default local model; empty stores are stamped on first open instead.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_consolidated_target ON consolidated_to(target_kind, target_name);",
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) \
         SELECT 'embedding_model', 'all-MiniLM-L6-v2' WHERE EXISTS (SELECT 1 FROM events)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn fresh_db_starts_at_version_1() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
        assert!(get_embedding_model(&conn).unwrap().is_none());
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        // empty store: left for the first writer to stamp
        assert!(get_embedding_model(&conn).unwrap().is_none());

        let index_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'index' AND name = 'idx_consolidated_target'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(index_exists);
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn populated_v1_store_gets_default_stamp() {
        let mut conn = test_db();
        conn.execute(
            "INSERT INTO events (id, happened_at, emotional_valence, significance, context_summary, embedding_model, created_at) \
             VALUES ('e1', '2026-01-01T00:00:00Z', 0.0, 0.5, 'x', 'all-MiniLM-L6-v2', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(
            get_embedding_model(&conn).unwrap().as_deref(),
            Some("all-MiniLM-L6-v2")
        );
    }

    #[test]
    fn set_model_overrides_stamp() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        set_embedding_model(&conn, "nomic-embed-v2").unwrap();
        assert_eq!(
            get_embedding_model(&conn).unwrap().as_deref(),
            Some("nomic-embed-v2")
        );
    }
}
