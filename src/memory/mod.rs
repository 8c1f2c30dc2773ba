//! The memory graph engine.
//!
//! - [`encode`]: atomic episode writes (`encode_memory`, `write_event`, `write_reflection`)
//! - [`recall`]: hybrid vector + significance ranking
//! - [`query`] / [`episodes`]: pattern completion over sparse cues
//! - [`bonds`]: evolving, historied relationship strength between entities
//! - [`capture`]: pre-filtering intake records
//! - [`nodes`]: upserts for identifier-keyed reference nodes

pub mod bonds;
pub mod capture;
pub mod encode;
pub mod episodes;
pub mod error;
pub mod nodes;
pub mod query;
pub mod recall;
pub mod stats;
pub mod types;
pub mod validate;

pub use error::{MemoryError, MemoryResult};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Stored timestamp format: UTC, microseconds, `Z` suffix. Lexical order is
/// chronological order, which the range filters rely on.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Cosine similarity of two unit vectors from their L2 distance, clamped to `[0, 1]`.
pub fn l2_to_similarity(distance: f64) -> f64 {
    (1.0 - distance * distance / 2.0).clamp(0.0, 1.0)
}

/// KNN over the Event embedding index. Returns `(event_id, similarity)` pairs,
/// most similar first.
pub fn nearest_events(
    conn: &Connection,
    embedding: &[f32],
    k: usize,
) -> MemoryResult<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT id, distance FROM events_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![embedding_to_bytes(embedding), k as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(id, distance)| (id, l2_to_similarity(distance)))
        .collect())
}

/// Reject vectors the index cannot hold before a transaction is opened.
pub(crate) fn check_embedding(embedding: &[f32]) -> MemoryResult<()> {
    let expected = crate::embedding::EMBEDDING_DIM;
    if embedding.len() != expected {
        return Err(MemoryError::Embedding(format!(
            "expected a {expected}-dimension vector, got {}",
            embedding.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_from_distance() {
        assert!((l2_to_similarity(0.0) - 1.0).abs() < 1e-12);
        // orthogonal unit vectors are sqrt(2) apart
        assert!(l2_to_similarity(2f64.sqrt()).abs() < 1e-12);
        // opposite vectors clamp to zero
        assert_eq!(l2_to_similarity(2.0), 0.0);
    }

    #[test]
    fn timestamps_sort_lexically() {
        let a = format_timestamp("2026-01-01T00:00:00Z".parse().unwrap());
        let b = format_timestamp("2026-01-01T00:00:00.5Z".parse().unwrap());
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn wrong_dimension_is_embedding_error() {
        assert!(matches!(
            check_embedding(&[0.0; 3]),
            Err(MemoryError::Embedding(_))
        ));
        assert!(check_embedding(&vec![0.0; crate::embedding::EMBEDDING_DIM]).is_ok());
    }
}
