mod helpers;

use hippograph::config::RetrievalConfig;
use hippograph::memory::bonds::{evolve_bond, get_bond, EvolveBondInput};
use hippograph::memory::encode::{encode_memory, write_event, EffectInput};
use hippograph::memory::episodes::{search_events, SearchEventsRequest};
use hippograph::memory::recall::{recall_memory, RecallRequest};
use hippograph::memory::types::{EffectValence, EntityRef, PrecedesRef, TargetRef};
use hippograph::memory::MemoryError;

fn config() -> RetrievalConfig {
    RetrievalConfig::default()
}

#[test]
fn encoded_event_is_recalled_at_its_threshold() {
    let mut conn = helpers::test_db();
    for (i, significance) in [0.3, 0.55, 0.8].into_iter().enumerate() {
        let encoded = encode_memory(
            &mut conn,
            &helpers::memory(&format!("memory {i}"), significance),
            &helpers::test_embedding(i),
            "m",
        )
        .unwrap();

        let req = RecallRequest {
            significance_threshold: Some(significance),
            ..Default::default()
        };
        let resp = recall_memory(&conn, &req, None, &config()).unwrap();
        assert!(resp.memories.iter().any(|m| m.event_id == encoded.event_id));
        assert!(resp.memories.iter().all(|m| m.significance >= significance));
        // pure significance order
        assert!(resp
            .memories
            .windows(2)
            .all(|w| w[0].significance >= w[1].significance));
    }
}

#[test]
fn two_events_share_one_alice() {
    let mut conn = helpers::test_db();
    for seed in 0..2 {
        let mut input = helpers::memory("standup", 0.5);
        input.event.participants = vec![helpers::person("Alice", None)];
        encode_memory(&mut conn, &input, &helpers::test_embedding(seed), "m").unwrap();
    }

    let alices: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM persons WHERE name = 'Alice'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(alices, 1);
    let edges: i64 = conn
        .query_row("SELECT COUNT(*) FROM participated_in", [], |row| row.get(0))
        .unwrap();
    assert_eq!(edges, 2);
}

#[test]
fn out_of_range_valence_creates_zero_nodes() {
    let mut conn = helpers::test_db();
    let before = helpers::total_rows(&conn);

    let mut input = helpers::memory("elated", 0.5);
    input.event.emotional_valence = 1.5;
    input.event.participants = vec![helpers::person("Alice", None)];
    input.event.place = Some("HQ".into());
    input.involves = vec![EntityRef::new("tokio")];

    let err = encode_memory(&mut conn, &input, &helpers::test_embedding(0), "m").unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));
    assert_eq!(helpers::total_rows(&conn), before);
}

#[test]
fn bond_identity_is_stable_across_updates() {
    let mut conn = helpers::test_db();
    let evolve = |strength| EvolveBondInput {
        from_entity_id: "A".into(),
        to_entity_id: "B".into(),
        new_strength: strength,
        emotional_resonance: None,
        milestone: None,
        interaction_context: None,
    };

    evolve_bond(&mut conn, &evolve(0.3)).unwrap();
    let result = evolve_bond(&mut conn, &evolve(0.6)).unwrap();

    assert_eq!(result.bond.strength, 0.6);
    assert_eq!(result.bond.interaction_count, 2);
    assert_eq!(result.bond.trajectory_length, 2);

    let edges: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bonds WHERE source_id = 'A' AND target_id = 'B'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(edges, 1);

    let bond = get_bond(&conn, "A", "B").unwrap().unwrap();
    let strengths: Vec<f64> = bond.trajectory.iter().map(|p| p.strength).collect();
    assert_eq!(strengths, vec![0.3, 0.6]);
}

#[test]
fn equal_similarity_ranks_by_significance() {
    let mut conn = helpers::test_db();
    let shared = helpers::test_embedding(9);
    let lower = encode_memory(&mut conn, &helpers::memory("twin a", 0.41), &shared, "m")
        .unwrap()
        .event_id;
    let higher = encode_memory(&mut conn, &helpers::memory("twin b", 0.42), &shared, "m")
        .unwrap()
        .event_id;

    let resp = recall_memory(&conn, &RecallRequest::default(), Some(&shared), &config()).unwrap();
    assert_eq!(resp.memories[0].event_id, higher);
    assert_eq!(resp.memories[1].event_id, lower);
    assert!(resp.memories[0].score > resp.memories[1].score);
}

#[test]
fn zero_filter_search_is_recent_first_and_complete() {
    let mut conn = helpers::test_db();
    let times = [
        "2026-01-10T00:00:00Z",
        "2026-03-10T00:00:00Z",
        "2026-02-10T00:00:00Z",
    ];
    for (i, at) in times.iter().enumerate() {
        let mut input = helpers::event(&format!("event {i}"), at);
        input.who = vec![helpers::person("Alice", Some("subject"))];
        input.why = vec!["quarterly planning".into()];
        input.what_entities = vec![EntityRef::new("roadmap")];
        input.place = Some("HQ".into());
        input.effects = vec![EffectInput {
            summary: "aligned the team".into(),
            valence: EffectValence::Positive,
            intensity: 0.6,
            target: Some(TargetRef {
                id: "team".into(),
                kind: "group".into(),
            }),
        }];
        write_event(&mut conn, &input, &helpers::test_embedding(i), "m").unwrap();
    }

    let resp = search_events(&conn, &SearchEventsRequest::default(), None, &config()).unwrap();
    assert_eq!(resp.count, 3);
    assert!(resp
        .events
        .windows(2)
        .all(|w| w[0].happened_at >= w[1].happened_at));
    for ep in &resp.events {
        assert!(!ep.who.persons.is_empty());
        assert!(!ep.what.involved.is_empty());
        assert_eq!(ep.place.as_deref(), Some("HQ"));
        assert!(!ep.why.is_empty());
        assert!(!ep.effects.is_empty());
    }
}

#[test]
fn kickoff_with_alice_at_hq() {
    let mut conn = helpers::test_db();
    let mut kickoff = helpers::memory("kickoff", 0.7);
    kickoff.event.participants = vec![helpers::person("Alice", Some("subject"))];
    kickoff.event.place = Some("HQ".into());
    encode_memory(&mut conn, &kickoff, &helpers::test_embedding(1), "m").unwrap();

    let mut unrelated = helpers::memory("retro", 0.4);
    unrelated.event.participants = vec![helpers::person("Bob", None)];
    unrelated.event.place = Some("Remote".into());
    encode_memory(&mut conn, &unrelated, &helpers::test_embedding(2), "m").unwrap();

    let req = SearchEventsRequest {
        participants: vec!["Alice".into()],
        ..Default::default()
    };
    let resp = search_events(&conn, &req, None, &config()).unwrap();
    assert_eq!(resp.count, 1);
    assert_eq!(resp.events[0].place.as_deref(), Some("HQ"));
    assert_eq!(resp.events[0].who.persons[0].role.as_deref(), Some("subject"));
}

#[test]
fn precedes_links_existing_event_to_new_one() {
    let mut conn = helpers::test_db();
    let earlier = encode_memory(
        &mut conn,
        &helpers::memory("design", 0.5),
        &helpers::test_embedding(1),
        "m",
    )
    .unwrap()
    .event_id;

    let mut later = helpers::memory("implementation", 0.5);
    later.precedes = vec![PrecedesRef {
        event_id: earlier.clone(),
        causal_strength: Some(0.7),
    }];
    let later = encode_memory(&mut conn, &later, &helpers::test_embedding(2), "m").unwrap();
    assert_eq!(later.preceded_by[0].event_id, earlier);

    let (from, to): (String, String) = conn
        .query_row("SELECT from_event, to_event FROM preceded", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(from, earlier);
    assert_eq!(to, later.event_id);
}
