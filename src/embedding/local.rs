//! Local ONNX Runtime embedding provider.
//!
//! Runs all-MiniLM-L6-v2 via `ort`: tokenize, infer, mean-pool over the
//! attention mask, L2-normalize.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

/// Paths of the model and tokenizer files inside the configured cache dir.
pub fn model_files(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    (cache_dir.join("model.onnx"), cache_dir.join("tokenizer.json"))
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_files(config);

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `hippograph model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `hippograph model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(
            model = %model_path.display(),
            model_id = %config.model,
            "local embedding model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_id: config.model.clone(),
        })
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .context("embedding batch returned no vectors")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        let shape = vec![batch_size as i64, seq_len as i64];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))?;
        // single-segment input
        let token_type_ids_tensor =
            Tensor::from_array((shape, vec![0i64; batch_size * seq_len].into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        // Output name varies by ONNX export.
        let token_embeddings = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (dims, data) = token_embeddings
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;
        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape: {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );
        let out_seq_len = dims[1] as usize;

        Ok((0..batch_size)
            .map(|b| {
                mean_pool(
                    data,
                    &attention_mask[b * seq_len..(b + 1) * seq_len],
                    b,
                    out_seq_len,
                )
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Attention-masked mean over one sequence of token vectors, then L2-normalized.
fn mean_pool(data: &[f32], mask: &[i64], batch_index: usize, seq_len: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; EMBEDDING_DIM];
    let mut count = 0.0f32;

    for (s, &m) in mask.iter().enumerate().take(seq_len) {
        if m == 0 {
            continue;
        }
        let offset = (batch_index * seq_len + s) * EMBEDDING_DIM;
        for (d, acc) in sum.iter_mut().enumerate() {
            *acc += data[offset + d];
        }
        count += 1.0;
    }

    if count > 0.0 {
        sum.iter_mut().for_each(|x| *x /= count);
    }
    l2_normalize(&sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig::default()
    }

    #[test]
    fn mean_pool_skips_masked_tokens() {
        let mut data = vec![0.0f32; 2 * EMBEDDING_DIM];
        data[0] = 2.0; // token 0, dim 0
        data[EMBEDDING_DIM + 1] = 5.0; // token 1, dim 1 (masked)
        let pooled = mean_pool(&data, &[1, 0], 0, 2);
        assert!((pooled[0] - 1.0).abs() < 1e-6);
        assert_eq!(pooled[1], 0.0);
    }

    #[test]
    fn missing_model_files_error_mentions_download() {
        let config = EmbeddingConfig {
            cache_dir: "/nonexistent/hippograph-models".into(),
            ..Default::default()
        };
        let err = LocalEmbeddingProvider::new(&config).err().unwrap();
        assert!(err.to_string().contains("model download"));
    }

    #[test]
    #[ignore] // Requires model files, run with: cargo test -- --ignored
    fn test_embed_produces_unit_vectors() {
        let provider = LocalEmbeddingProvider::new(&test_config()).unwrap();
        let embedding = provider.embed("Kickoff meeting at HQ").unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIM);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "L2 norm should be ~1.0, got {norm}");
    }

    #[test]
    #[ignore]
    fn test_embed_batch_matches_single() {
        let provider = LocalEmbeddingProvider::new(&test_config()).unwrap();
        let batch = provider.embed_batch(&["first", "second"]).unwrap();
        assert_eq!(batch.len(), 2);
        let single = provider.embed("first").unwrap();
        let dot: f32 = batch[0].iter().zip(&single).map(|(a, b)| a * b).sum();
        assert!(dot > 0.999);
    }
}
