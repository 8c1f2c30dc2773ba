//! Hybrid recall: vector similarity blended with stored significance.
//!
//! With a query, the top `CANDIDATE_MULTIPLIER × limit` Events by vector
//! distance are fetched first and the structured filters narrow that set.
//! Without one, every Event is a candidate and its significance stands in for
//! similarity, so the ranking degenerates to significance order.

use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::encode::consolidations_of;
use super::error::MemoryResult;
use super::query::EventQuery;
use super::types::{Consolidation, EventType};
use super::validate::{check_optional_unit, numeric_interval, time_interval};
use crate::config::{
    RetrievalConfig, CANDIDATE_MULTIPLIER, SIGNIFICANCE_WEIGHT, SIMILARITY_WEIGHT,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecallRequest {
    #[schemars(description = "Natural-language query. Omit to rank by significance alone.")]
    pub query: Option<String>,

    #[schemars(description = "Closed valence interval [min, max] within [-1, 1]")]
    pub emotional_range: Option<Vec<f64>>,

    #[schemars(description = "Closed RFC 3339 interval [start, end]")]
    pub temporal_range: Option<Vec<String>>,

    #[schemars(description = "Minimum significance, 0.0-1.0")]
    pub significance_threshold: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Entity ids; an event matches if it involves any of them")]
    pub involves_entities: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Event types; an event matches if it has any of them")]
    pub event_types: Vec<EventType>,

    #[schemars(description = "Maximum results (default 10, clamped to 1-100)")]
    pub limit: Option<usize>,

    #[serde(default)]
    #[schemars(description = "Attach consolidation targets to each result")]
    pub include_consolidations: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecalledMemory {
    pub event_id: String,
    pub timestamp: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub context_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub valence: f64,
    pub significance: f64,
    pub similarity: f64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidations: Option<Vec<Consolidation>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecallResponse {
    pub memories: Vec<RecalledMemory>,
    pub count: usize,
}

/// Checked form of a [`RecallRequest`].
struct RecallFilters {
    emotional_range: Option<(f64, f64)>,
    temporal_range: Option<(String, String)>,
    significance_threshold: Option<f64>,
}

impl RecallRequest {
    fn checked(&self) -> MemoryResult<RecallFilters> {
        check_optional_unit("significance_threshold", self.significance_threshold)?;
        Ok(RecallFilters {
            emotional_range: self
                .emotional_range
                .as_deref()
                .map(|r| numeric_interval("emotional_range", r, -1.0, 1.0))
                .transpose()?,
            temporal_range: self
                .temporal_range
                .as_deref()
                .map(|r| time_interval("temporal_range", r))
                .transpose()?,
            significance_threshold: self.significance_threshold,
        })
    }

    pub fn validate(&self) -> MemoryResult<()> {
        self.checked().map(|_| ())
    }

    /// Whether the request carries a non-blank query worth embedding.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

const SELECT_EVENTS: &str = "SELECT e.id, e.happened_at, e.event_type, e.context_summary, \
     e.full_content, e.title, e.emotional_valence, e.significance FROM events e";

pub fn recall_memory(
    conn: &Connection,
    req: &RecallRequest,
    query_embedding: Option<&[f32]>,
    config: &RetrievalConfig,
) -> MemoryResult<RecallResponse> {
    let filters = req.checked()?;
    let limit = config.clamp_limit(req.limit);
    let event_types: Vec<String> = req.event_types.iter().map(|t| t.to_string()).collect();

    let mut similarities: HashMap<String, f64> = HashMap::new();
    let mut query = EventQuery::new();
    if let Some(embedding) = query_embedding {
        super::check_embedding(embedding)?;
        let k = limit * CANDIDATE_MULTIPLIER;
        similarities = super::nearest_events(conn, embedding, k)?.into_iter().collect();
        let ids: Vec<String> = similarities.keys().cloned().collect();
        query = query.ids_in(&ids);
    }

    let query = query
        .valence_between(filters.emotional_range)
        .happened_between(filters.temporal_range)
        .min_significance(filters.significance_threshold)
        .event_type_in(&event_types)
        .involving_entity_in(&req.involves_entities);

    // Without a query the score is significance alone, so the store can rank
    // and truncate directly.
    let (sql, params) = if query_embedding.is_some() {
        query.build(SELECT_EVENTS, "", vec![])
    } else {
        query.build(
            SELECT_EVENTS,
            "ORDER BY e.significance DESC, e.happened_at DESC, e.id ASC LIMIT ?",
            vec![Value::Integer(limit as i64)],
        )
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut memories = stmt
        .query_map(params_from_iter(params), |row| {
            Ok(RecalledMemory {
                event_id: row.get(0)?,
                timestamp: row.get(1)?,
                event_type: row.get(2)?,
                context_summary: row.get(3)?,
                full_content: row.get(4)?,
                title: row.get(5)?,
                valence: row.get(6)?,
                significance: row.get(7)?,
                similarity: 0.0,
                score: 0.0,
                consolidations: None,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for m in &mut memories {
        m.similarity = similarities
            .get(&m.event_id)
            .copied()
            .unwrap_or(m.significance);
        m.score = SIMILARITY_WEIGHT * m.similarity + SIGNIFICANCE_WEIGHT * m.significance;
    }

    memories.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    memories.truncate(limit);

    if req.include_consolidations {
        for m in &mut memories {
            m.consolidations = Some(consolidations_of(conn, &m.event_id)?);
        }
    }

    tracing::info!(
        semantic = query_embedding.is_some(),
        limit,
        returned = memories.len(),
        "recall completed"
    );

    let count = memories.len();
    Ok(RecallResponse { memories, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::EMBEDDING_DIM;
    use crate::memory::encode::{encode_memory, EncodeMemoryInput, EventPayload};
    use crate::memory::types::{ConsolidationKind, ConsolidationRef, EntityRef};
    use crate::memory::MemoryError;

    fn spike(i: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[i % EMBEDDING_DIM] = 1.0;
        v
    }

    fn encode(
        conn: &mut Connection,
        summary: &str,
        significance: f64,
        valence: f64,
        timestamp: &str,
        embedding: &[f32],
    ) -> String {
        let input = EncodeMemoryInput {
            event: EventPayload {
                event_type: EventType::Conversation,
                context_summary: summary.into(),
                full_content: None,
                emotional_valence: valence,
                significance,
                timestamp: Some(timestamp.into()),
                place: None,
                participants: vec![],
                catalysts: vec![],
            },
            involves: vec![],
            precedes: vec![],
            consolidates_to: vec![],
        };
        encode_memory(conn, &input, embedding, "m").unwrap().event_id
    }

    fn config() -> RetrievalConfig {
        RetrievalConfig::default()
    }

    #[test]
    fn no_query_ranks_by_significance() {
        let mut conn = db::open_memory_database().unwrap();
        let low = encode(&mut conn, "low", 0.2, 0.0, "2026-01-01T00:00:00Z", &spike(1));
        let high = encode(&mut conn, "high", 0.9, 0.0, "2026-01-02T00:00:00Z", &spike(2));
        let mid = encode(&mut conn, "mid", 0.5, 0.0, "2026-01-03T00:00:00Z", &spike(3));

        let resp = recall_memory(&conn, &RecallRequest::default(), None, &config()).unwrap();
        let ids: Vec<_> = resp.memories.iter().map(|m| m.event_id.clone()).collect();
        assert_eq!(ids, vec![high, mid, low]);
        assert_eq!(resp.count, 3);
        assert!((resp.memories[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn threshold_and_valence_filters_compose() {
        let mut conn = db::open_memory_database().unwrap();
        encode(&mut conn, "sad", 0.8, -0.7, "2026-01-01T00:00:00Z", &spike(1));
        let keep = encode(&mut conn, "glad", 0.8, 0.6, "2026-01-02T00:00:00Z", &spike(2));
        encode(&mut conn, "minor", 0.1, 0.6, "2026-01-03T00:00:00Z", &spike(3));

        let req = RecallRequest {
            significance_threshold: Some(0.5),
            emotional_range: Some(vec![0.0, 1.0]),
            ..Default::default()
        };
        let resp = recall_memory(&conn, &req, None, &config()).unwrap();
        assert_eq!(resp.count, 1);
        assert_eq!(resp.memories[0].event_id, keep);
    }

    #[test]
    fn temporal_range_bounds_are_inclusive() {
        let mut conn = db::open_memory_database().unwrap();
        encode(&mut conn, "before", 0.5, 0.0, "2026-02-28T23:59:59Z", &spike(1));
        let start = encode(&mut conn, "start", 0.5, 0.0, "2026-03-01T00:00:00Z", &spike(2));
        let inside = encode(&mut conn, "inside", 0.6, 0.0, "2026-03-15T12:00:00Z", &spike(3));
        let end = encode(&mut conn, "end", 0.7, 0.0, "2026-03-31T00:00:00Z", &spike(4));
        encode(&mut conn, "after", 0.9, 0.0, "2026-03-31T00:00:01Z", &spike(5));

        let req = RecallRequest {
            // the end bound is written with an offset and still matches
            temporal_range: Some(vec![
                "2026-03-01T00:00:00Z".into(),
                "2026-03-31T02:00:00+02:00".into(),
            ]),
            ..Default::default()
        };
        let resp = recall_memory(&conn, &req, None, &config()).unwrap();
        let ids: Vec<_> = resp.memories.iter().map(|m| m.event_id.clone()).collect();
        assert_eq!(ids, vec![end, inside, start]);
    }

    #[test]
    fn temporal_range_applies_to_semantic_candidates() {
        let mut conn = db::open_memory_database().unwrap();
        let shared = spike(7);
        encode(&mut conn, "old", 0.9, 0.0, "2025-06-01T00:00:00Z", &shared);
        let recent = encode(&mut conn, "recent", 0.2, 0.0, "2026-06-01T00:00:00Z", &shared);

        let req = RecallRequest {
            temporal_range: Some(vec![
                "2026-01-01T00:00:00Z".into(),
                "2026-12-31T23:59:59Z".into(),
            ]),
            ..Default::default()
        };
        let resp = recall_memory(&conn, &req, Some(&shared), &config()).unwrap();
        assert_eq!(resp.count, 1);
        assert_eq!(resp.memories[0].event_id, recent);
    }

    #[test]
    fn semantic_query_prefers_similar_events() {
        let mut conn = db::open_memory_database().unwrap();
        let near = encode(&mut conn, "near", 0.3, 0.0, "2026-01-01T00:00:00Z", &spike(10));
        encode(&mut conn, "far", 0.9, 0.0, "2026-01-02T00:00:00Z", &spike(20));

        let resp =
            recall_memory(&conn, &RecallRequest::default(), Some(&spike(10)), &config()).unwrap();
        assert_eq!(resp.memories[0].event_id, near);
        assert!((resp.memories[0].similarity - 1.0).abs() < 1e-6);
        // 0.7 * 1.0 + 0.3 * 0.3
        assert!((resp.memories[0].score - 0.79).abs() < 1e-6);
    }

    #[test]
    fn equal_similarity_breaks_on_significance() {
        let mut conn = db::open_memory_database().unwrap();
        let same = spike(5);
        let weak = encode(&mut conn, "weak", 0.4, 0.0, "2026-01-01T00:00:00Z", &same);
        let strong = encode(&mut conn, "strong", 0.6, 0.0, "2026-01-01T00:00:00Z", &same);

        let resp =
            recall_memory(&conn, &RecallRequest::default(), Some(&same), &config()).unwrap();
        let ids: Vec<_> = resp.memories.iter().map(|m| m.event_id.clone()).collect();
        assert_eq!(ids, vec![strong, weak]);
    }

    #[test]
    fn entity_filter_matches_involvement() {
        let mut conn = db::open_memory_database().unwrap();
        encode(&mut conn, "unrelated", 0.9, 0.0, "2026-01-01T00:00:00Z", &spike(1));
        let input = EncodeMemoryInput {
            event: EventPayload {
                event_type: EventType::Collaboration,
                context_summary: "pairing on tokio".into(),
                full_content: None,
                emotional_valence: 0.0,
                significance: 0.2,
                timestamp: None,
                place: None,
                participants: vec![],
                catalysts: vec![],
            },
            involves: vec![EntityRef::new("tokio")],
            precedes: vec![],
            consolidates_to: vec![ConsolidationRef {
                target_kind: ConsolidationKind::Concept,
                target_name: "async".into(),
                strength: Some(0.8),
                consolidation_type: None,
                rehearsal_count: Some(2),
            }],
        };
        let id = encode_memory(&mut conn, &input, &spike(2), "m").unwrap().event_id;

        let req = RecallRequest {
            involves_entities: vec!["tokio".into(), "serde".into()],
            event_types: vec![EventType::Collaboration],
            include_consolidations: true,
            ..Default::default()
        };
        let resp = recall_memory(&conn, &req, None, &config()).unwrap();
        assert_eq!(resp.count, 1);
        assert_eq!(resp.memories[0].event_id, id);
        let consolidations = resp.memories[0].consolidations.as_ref().unwrap();
        assert_eq!(consolidations.len(), 1);
        assert_eq!(consolidations[0].rehearsal_count, 2);
    }

    #[test]
    fn limit_is_clamped_not_rejected() {
        let mut conn = db::open_memory_database().unwrap();
        for i in 0..3 {
            encode(&mut conn, "e", 0.5, 0.0, "2026-01-01T00:00:00Z", &spike(i));
        }
        let req = RecallRequest {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(recall_memory(&conn, &req, None, &config()).unwrap().count, 1);

        let req = RecallRequest {
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(recall_memory(&conn, &req, None, &config()).unwrap().count, 3);
    }

    #[test]
    fn malformed_ranges_fail_validation() {
        let conn = db::open_memory_database().unwrap();
        let req = RecallRequest {
            emotional_range: Some(vec![0.5, -0.5]),
            ..Default::default()
        };
        assert!(matches!(
            recall_memory(&conn, &req, None, &config()),
            Err(MemoryError::Validation(_))
        ));

        let req = RecallRequest {
            significance_threshold: Some(1.2),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_store_is_not_an_error() {
        let conn = db::open_memory_database().unwrap();
        let resp =
            recall_memory(&conn, &RecallRequest::default(), Some(&spike(0)), &config()).unwrap();
        assert_eq!(resp.count, 0);
        assert!(resp.memories.is_empty());
    }
}
