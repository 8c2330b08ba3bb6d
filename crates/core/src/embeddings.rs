use crate::error::RagError;
use std::sync::Arc;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 128;

pub trait Embedder: std::fmt::Debug + Send + Sync {
    /// Display name recorded into the pipeline configuration.
    fn name(&self) -> &str;
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic local embedder: hashes character trigrams into a
/// fixed-size bucket vector and L2-normalizes it.
#[derive(Debug, Clone)]
pub struct NgramHashEmbedder {
    label: String,
    dimensions: usize,
}

impl NgramHashEmbedder {
    pub fn new(label: impl Into<String>, dimensions: usize) -> Self {
        Self {
            label: label.into(),
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for NgramHashEmbedder {
    fn default() -> Self {
        Self::new("local:ngram", DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

impl Embedder for NgramHashEmbedder {
    fn name(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            // fnv-1a
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

/// Resolves an embed-model spec. Only the `local:<label>` scheme is
/// supported; the full spec string becomes the embedder's recorded name.
pub fn resolve_embed_model(spec: &str) -> Result<Arc<dyn Embedder>, RagError> {
    match spec.strip_prefix("local:") {
        Some(label) if !label.is_empty() => Ok(Arc::new(NgramHashEmbedder::new(
            spec,
            DEFAULT_EMBEDDING_DIMENSIONS,
        ))),
        _ => Err(RagError::InvalidInput(format!(
            "unsupported embed model spec: {spec}"
        ))),
    }
}
