mod helpers;

use hippograph::embedding::hashed::HashedEmbeddingProvider;
use hippograph::embedding::EmbeddingProvider;
use hippograph::memory::encode::encode_memory;
use hippograph::memory::{embedding_to_bytes, nearest_events};

#[test]
fn knn_returns_self_first_with_full_similarity() {
    let mut conn = helpers::test_db();
    let mut ids = Vec::new();
    for seed in 0..5 {
        let id = encode_memory(
            &mut conn,
            &helpers::memory(&format!("event {seed}"), 0.5),
            &helpers::test_embedding(seed),
            "m",
        )
        .unwrap()
        .event_id;
        ids.push(id);
    }

    let hits = nearest_events(&conn, &helpers::test_embedding(2), 3).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].0, ids[2]);
    assert!((hits[0].1 - 1.0).abs() < 1e-6);
    // orthogonal spikes have zero similarity
    assert!(hits[1].1.abs() < 1e-6);
}

#[test]
fn stored_vector_matches_embedding_bytes() {
    let mut conn = helpers::test_db();
    let embedding = helpers::test_embedding(42);
    let id = encode_memory(&mut conn, &helpers::memory("bytes", 0.5), &embedding, "m")
        .unwrap()
        .event_id;

    let stored: Vec<u8> = conn
        .query_row(
            "SELECT embedding FROM events_vec WHERE id = ?1",
            [&id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored.as_slice(), embedding_to_bytes(&embedding));
}

#[test]
fn hashed_embeddings_rank_shared_vocabulary_higher() {
    let provider = HashedEmbeddingProvider::new();
    let mut conn = helpers::test_db();

    let texts = [
        "kickoff meeting at headquarters with alice",
        "grocery list: eggs, milk, flour",
    ];
    let mut ids = Vec::new();
    for text in texts {
        let v = provider.embed(text).unwrap();
        ids.push(
            encode_memory(&mut conn, &helpers::memory(text, 0.5), &v, provider.model_id())
                .unwrap()
                .event_id,
        );
    }

    let query = provider.embed("alice kickoff meeting").unwrap();
    let hits = nearest_events(&conn, &query, 2).unwrap();
    assert_eq!(hits[0].0, ids[0]);
    assert!(hits[0].1 > hits[1].1);
}
