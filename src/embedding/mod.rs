//! Text-to-vector embedding pipeline.
//!
//! The engine treats embedding as an opaque `text -> Vec<f32>` function behind
//! [`EmbeddingProvider`]. Two implementations ship: [`local`] runs
//! all-MiniLM-L6-v2 through ONNX Runtime, and [`hashed`] is a deterministic
//! feature-hashing embedder for offline use and tests. Both produce
//! L2-normalized vectors of [`EMBEDDING_DIM`] dimensions, matching the
//! `events_vec` index.

pub mod hashed;
pub mod local;

use anyhow::Result;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Identifier stored next to every vector this provider produces.
    fn model_id(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// `"local"` needs the model files on disk; run `hippograph model download` first.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        "hashed" => Ok(Box::new(hashed::HashedEmbeddingProvider::new())),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, hashed"),
    }
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
pub(crate) fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = crate::config::EmbeddingConfig {
            provider: "cloud".into(),
            ..Default::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("unknown embedding provider"));
    }

    #[test]
    fn hashed_provider_from_config() {
        let config = crate::config::EmbeddingConfig {
            provider: "hashed".into(),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_id(), hashed::HASHED_MODEL_ID);
        assert_eq!(provider.embed("hello").unwrap().len(), EMBEDDING_DIM);
    }
}
