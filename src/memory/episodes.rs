//! Pattern completion: recover whole episodes from partial cues.
//!
//! [`search_events`] narrows the Event set with whichever cues were supplied
//! (see [`EventQuery`]), orders the survivors most-recent-first, and then
//! reconstructs every structural block of each one.

use std::collections::HashSet;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::encode::{
    bound_entities, consolidations_of, preceding_events, reflections_on, Reflection,
};
use super::error::MemoryResult;
use super::query::EventQuery;
use super::types::{BoundEntity, Consolidation, PrecedingEvent, TargetRef};
use super::validate::{check_optional_unit, time_interval};
use crate::config::RetrievalConfig;

/// Floor on vector candidates considered by a semantic cue.
const MIN_SEMANTIC_CANDIDATES: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchEventsRequest {
    #[schemars(description = "Natural-language cue matched against event embeddings")]
    pub semantic_query: Option<String>,

    #[schemars(description = "Closed RFC 3339 interval [start, end]")]
    pub time_range: Option<Vec<String>>,

    #[serde(default)]
    #[schemars(description = "Person names or agent ids; any of them took part")]
    pub participants: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Entity ids; any of them was involved or produced")]
    pub entities: Vec<String>,

    #[schemars(description = "Place the event was held at")]
    pub place: Option<String>,

    #[schemars(description = "Target id an effect of the event was with respect to")]
    pub effects_on: Option<String>,

    #[schemars(description = "Minimum effect intensity, 0.0-1.0")]
    pub min_effect_intensity: Option<f64>,

    #[schemars(description = "Maximum results (default 10, clamped to 1-100)")]
    pub limit: Option<usize>,
}

impl SearchEventsRequest {
    pub fn validate(&self) -> MemoryResult<()> {
        check_optional_unit("min_effect_intensity", self.min_effect_intensity)?;
        if let Some(range) = &self.time_range {
            time_interval("time_range", range)?;
        }
        Ok(())
    }

    pub fn query_text(&self) -> Option<&str> {
        self.semantic_query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Who {
    pub persons: Vec<ParticipantView>,
    pub agents: Vec<ParticipantView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct What {
    pub involved: Vec<BoundEntity>,
    /// Produced and modified outputs.
    pub produced: Vec<BoundEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectView {
    pub effect_id: String,
    pub summary: String,
    pub valence: String,
    pub intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
}

/// A fully reconstructed Event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub event_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub context_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    pub happened_at: String,
    pub emotional_valence: f64,
    pub significance: f64,
    pub who: Who,
    pub what: What,
    #[serde(rename = "where")]
    pub place: Option<String>,
    pub why: Vec<String>,
    pub effects: Vec<EffectView>,
    pub preceded_by: Vec<PrecedingEvent>,
    pub consolidations: Vec<Consolidation>,
    pub reflections: Vec<Reflection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchEventsResponse {
    pub events: Vec<Episode>,
    pub count: usize,
}

pub fn search_events(
    conn: &Connection,
    req: &SearchEventsRequest,
    query_embedding: Option<&[f32]>,
    config: &RetrievalConfig,
) -> MemoryResult<SearchEventsResponse> {
    check_optional_unit("min_effect_intensity", req.min_effect_intensity)?;
    let time_range = req
        .time_range
        .as_deref()
        .map(|r| time_interval("time_range", r))
        .transpose()?;
    let limit = config.clamp_limit(req.limit);

    let mut query = EventQuery::new();
    if let Some(embedding) = query_embedding {
        super::check_embedding(embedding)?;
        let k = (4 * limit).max(MIN_SEMANTIC_CANDIDATES);
        let ids: Vec<String> = super::nearest_events(conn, embedding, k)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        query = query.ids_in(&ids);
    }

    let (sql, params) = query
        .happened_between(time_range)
        .with_participant_in(&req.participants)
        .involving_entity_in(&req.entities)
        .held_at(req.place.as_deref())
        .with_effect(req.effects_on.as_deref(), req.min_effect_intensity)
        .build(
            "SELECT e.id FROM events e",
            "ORDER BY e.happened_at DESC, e.created_at DESC, e.id ASC LIMIT ?",
            vec![Value::Integer(limit as i64)],
        );

    let ids = conn
        .prepare(&sql)?
        .query_map(params_from_iter(params), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let mut events = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.clone()) {
            continue;
        }
        if let Some(episode) = get_episode(conn, &id)? {
            events.push(episode);
        }
    }

    tracing::info!(
        semantic = query_embedding.is_some(),
        participants = req.participants.len(),
        entities = req.entities.len(),
        returned = events.len(),
        "event search completed"
    );

    let count = events.len();
    Ok(SearchEventsResponse { events, count })
}

/// Reconstruct one Event with every bound block, or `None` if it does not exist.
pub fn get_episode(conn: &Connection, event_id: &str) -> MemoryResult<Option<Episode>> {
    let core = conn
        .query_row(
            "SELECT id, event_type, title, description, context_summary, full_content, \
             happened_at, emotional_valence, significance, place FROM events WHERE id = ?1",
            params![event_id],
            |row| {
                Ok(Episode {
                    event_id: row.get(0)?,
                    event_type: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    context_summary: row.get(4)?,
                    full_content: row.get(5)?,
                    happened_at: row.get(6)?,
                    emotional_valence: row.get(7)?,
                    significance: row.get(8)?,
                    place: row.get(9)?,
                    who: Who::default(),
                    what: What::default(),
                    why: Vec::new(),
                    effects: Vec::new(),
                    preceded_by: Vec::new(),
                    consolidations: Vec::new(),
                    reflections: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut episode) = core else {
        return Ok(None);
    };

    episode.who = participants_of(conn, event_id)?;
    let (involved, produced): (Vec<_>, Vec<_>) = bound_entities(conn, event_id)?
        .into_iter()
        .partition(|e| e.relation == "involved");
    episode.what = What { involved, produced };
    episode.why = catalysts_of(conn, event_id)?;
    episode.effects = effects_of(conn, event_id)?;
    episode.preceded_by = preceding_events(conn, event_id)?;
    episode.consolidations = consolidations_of(conn, event_id)?;
    episode.reflections = reflections_on(conn, event_id)?;

    Ok(Some(episode))
}

fn participants_of(conn: &Connection, event_id: &str) -> MemoryResult<Who> {
    let mut stmt = conn.prepare_cached(
        "SELECT participant_kind, participant_id, role FROM participated_in \
         WHERE event_id = ?1 ORDER BY participant_kind, participant_id",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ParticipantView {
                    id: row.get(1)?,
                    role: row.get(2)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut who = Who::default();
    for (kind, participant) in rows {
        match kind.as_str() {
            "agent" => who.agents.push(participant),
            _ => who.persons.push(participant),
        }
    }
    Ok(who)
}

fn catalysts_of(conn: &Connection, event_id: &str) -> MemoryResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT catalyst FROM catalyzed_by WHERE event_id = ?1 ORDER BY catalyst",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn effects_of(conn: &Connection, event_id: &str) -> MemoryResult<Vec<EffectView>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, summary, valence, intensity, target_id, target_kind FROM effects \
         WHERE event_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            let target_id: Option<String> = row.get(4)?;
            let target_kind: Option<String> = row.get(5)?;
            Ok(EffectView {
                effect_id: row.get(0)?,
                summary: row.get(1)?,
                valence: row.get(2)?,
                intensity: row.get(3)?,
                target: target_id
                    .zip(target_kind)
                    .map(|(id, kind)| TargetRef { id, kind }),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
