//! Dynamic predicate assembly over the `events` table.
//!
//! Each optional filter contributes one fragment (a SQL condition plus its
//! bound values). Omitted filters contribute nothing, so an empty builder
//! matches every Event. Set-valued filters use any-of semantics and an empty
//! set is treated as omitted. Relationship filters are `EXISTS` subqueries,
//! so an Event that matches through several edges is still selected once.

use rusqlite::types::Value;

struct Fragment {
    sql: String,
    params: Vec<Value>,
}

#[derive(Default)]
pub struct EventQuery {
    fragments: Vec<Fragment>,
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn text_values(values: &[String]) -> Vec<Value> {
    values.iter().map(|v| Value::Text(v.clone())).collect()
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, sql: impl Into<String>, params: Vec<Value>) {
        self.fragments.push(Fragment {
            sql: sql.into(),
            params,
        });
    }

    /// Restrict to a candidate id set, typically the vector-index hits.
    /// An empty set here means "no candidates", not "no constraint".
    pub fn ids_in(mut self, ids: &[String]) -> Self {
        if ids.is_empty() {
            self.push("0", vec![]);
        } else {
            self.push(
                format!("e.id IN ({})", placeholders(ids.len())),
                text_values(ids),
            );
        }
        self
    }

    /// Closed interval over stored-format timestamps.
    pub fn happened_between(mut self, range: Option<(String, String)>) -> Self {
        if let Some((start, end)) = range {
            self.push(
                "e.happened_at BETWEEN ? AND ?",
                vec![Value::Text(start), Value::Text(end)],
            );
        }
        self
    }

    pub fn valence_between(mut self, range: Option<(f64, f64)>) -> Self {
        if let Some((min, max)) = range {
            self.push(
                "e.emotional_valence BETWEEN ? AND ?",
                vec![Value::Real(min), Value::Real(max)],
            );
        }
        self
    }

    pub fn min_significance(mut self, threshold: Option<f64>) -> Self {
        if let Some(t) = threshold {
            self.push("e.significance >= ?", vec![Value::Real(t)]);
        }
        self
    }

    pub fn event_type_in(mut self, types: &[String]) -> Self {
        if !types.is_empty() {
            self.push(
                format!("e.event_type IN ({})", placeholders(types.len())),
                text_values(types),
            );
        }
        self
    }

    /// Any listed Person name or Agent id took part.
    pub fn with_participant_in(mut self, ids: &[String]) -> Self {
        if !ids.is_empty() {
            self.push(
                format!(
                    "EXISTS (SELECT 1 FROM participated_in p \
                     WHERE p.event_id = e.id AND p.participant_id IN ({}))",
                    placeholders(ids.len())
                ),
                text_values(ids),
            );
        }
        self
    }

    /// Any listed Entity was involved in or produced by the Event.
    pub fn involving_entity_in(mut self, ids: &[String]) -> Self {
        if !ids.is_empty() {
            let ph = placeholders(ids.len());
            let mut params = text_values(ids);
            params.extend(text_values(ids));
            self.push(
                format!(
                    "(EXISTS (SELECT 1 FROM involved_in i \
                      WHERE i.event_id = e.id AND i.entity_id IN ({ph})) \
                     OR EXISTS (SELECT 1 FROM event_outputs o \
                      WHERE o.event_id = e.id AND o.entity_id IN ({ph})))"
                ),
                params,
            );
        }
        self
    }

    pub fn held_at(mut self, place: Option<&str>) -> Self {
        if let Some(place) = place {
            self.push("e.place = ?", vec![Value::Text(place.to_string())]);
        }
        self
    }

    /// At least one Effect satisfies both the target and intensity conditions.
    /// The two are checked against the same Effect row.
    pub fn with_effect(mut self, target_id: Option<&str>, min_intensity: Option<f64>) -> Self {
        if target_id.is_none() && min_intensity.is_none() {
            return self;
        }
        let mut sql = String::from("EXISTS (SELECT 1 FROM effects f WHERE f.event_id = e.id");
        let mut params = Vec::new();
        if let Some(target) = target_id {
            sql.push_str(" AND f.target_id = ?");
            params.push(Value::Text(target.to_string()));
        }
        if let Some(min) = min_intensity {
            sql.push_str(" AND f.intensity >= ?");
            params.push(Value::Real(min));
        }
        sql.push(')');
        self.push(sql, params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fold fragments into `"{select} WHERE ... {tail}"`. `select` must alias
    /// `events` as `e`. `tail_params` bind placeholders in `tail`.
    pub fn build(self, select: &str, tail: &str, tail_params: Vec<Value>) -> (String, Vec<Value>) {
        let mut sql = select.to_string();
        let mut params = Vec::new();
        if !self.fragments.is_empty() {
            let clauses: Vec<String> = self
                .fragments
                .into_iter()
                .map(|f| {
                    params.extend(f.params);
                    f.sql
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(tail);
        }
        params.extend(tail_params);
        tracing::debug!(sql = %sql, params = params.len(), "event query assembled");
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECT: &str = "SELECT e.id FROM events e";

    #[test]
    fn empty_query_has_no_where_clause() {
        let (sql, params) = EventQuery::new()
            .event_type_in(&[])
            .with_participant_in(&[])
            .held_at(None)
            .with_effect(None, None)
            .build(SELECT, "", vec![]);
        assert_eq!(sql, SELECT);
        assert!(params.is_empty());
    }

    #[test]
    fn fragments_join_with_and_in_order() {
        let (sql, params) = EventQuery::new()
            .min_significance(Some(0.4))
            .held_at(Some("HQ"))
            .build(SELECT, "LIMIT ?", vec![Value::Integer(5)]);
        assert_eq!(
            sql,
            "SELECT e.id FROM events e WHERE e.significance >= ? AND e.place = ? LIMIT ?"
        );
        assert_eq!(
            params,
            vec![
                Value::Real(0.4),
                Value::Text("HQ".into()),
                Value::Integer(5)
            ]
        );
    }

    #[test]
    fn entity_filter_binds_ids_for_both_edges() {
        let (sql, params) = EventQuery::new()
            .involving_entity_in(&["a".into(), "b".into()])
            .build(SELECT, "", vec![]);
        assert!(sql.contains("involved_in"));
        assert!(sql.contains("event_outputs"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn effect_conditions_share_one_subquery() {
        let (sql, params) = EventQuery::new()
            .with_effect(Some("team"), Some(0.5))
            .build(SELECT, "", vec![]);
        assert_eq!(sql.matches("EXISTS").count(), 1);
        assert!(sql.contains("f.target_id = ? AND f.intensity >= ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_candidate_set_matches_nothing() {
        let query = EventQuery::new().ids_in(&[]);
        assert!(!query.is_empty());
        let (sql, _) = query.build(SELECT, "", vec![]);
        assert!(sql.ends_with("WHERE 0"));
    }
}
