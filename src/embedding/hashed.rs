//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256; the first eight
//! digest bytes (little-endian) pick one of [`EMBEDDING_DIM`] buckets and a
//! sign bit, and the bucket counts are L2-normalized. Texts that
//! share vocabulary land close together, which is enough for offline runs and
//! for exercising the vector index without model files.

use anyhow::Result;
use sha2::{Digest, Sha256};

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};

/// Names the hash scheme; vectors from a different scheme are not comparable.
pub const HASHED_MODEL_ID: &str = "hashed-sha256-bow-384";

#[derive(Debug, Default, Clone)]
pub struct HashedEmbeddingProvider;

impl HashedEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingProvider for HashedEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&digest[..8]);
            let h = u64::from_le_bytes(prefix);
            let bucket = (h % EMBEDDING_DIM as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        Ok(l2_normalize(&v))
    }

    fn model_id(&self) -> &str {
        HASHED_MODEL_ID
    }
}
