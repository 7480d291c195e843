//! Embedding providers that map text to fixed-length vectors.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::{RagError, Result};

/// Inputs are cut to this many tokens unless configured otherwise.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 256;

/// A provider that generates vector embeddings from text input.
///
/// One method serves both index construction (many chunks) and query
/// encoding (a single-element batch). Output order matches input order and
/// every vector has [`dimensions`](Embedder::dimensions) entries.
///
/// Implementations bound overly long inputs by keeping a fixed-length prefix
/// and silently dropping the remainder.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{Embedder, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(384)?;
/// let vectors = embedder.embed(&["first chunk", "second chunk"]).await?;
/// assert_eq!(vectors.len(), 2);
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate one embedding per input text, in input order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identifies the embedding space. Vectors are only comparable when
    /// produced under the same id.
    fn model_id(&self) -> &str;

    /// Encode a single query through [`embed`](Embedder::embed).
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text]).await?.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: self.model_id().to_string(),
            message: "provider returned no embedding for the query".to_string(),
        })
    }
}

/// Embed `texts` in batches of `batch_size`, running the batches concurrently.
///
/// Input order is preserved. The output is checked to contain exactly one
/// vector of [`Embedder::dimensions`] entries per input.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let batches = try_join_all(texts.chunks(batch_size).map(|batch| embedder.embed(batch))).await?;
    let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();

    if vectors.len() != texts.len() {
        return Err(RagError::EmbeddingError {
            provider: embedder.model_id().to_string(),
            message: format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
        });
    }
    let expected = embedder.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(RagError::EmbeddingError {
            provider: embedder.model_id().to_string(),
            message: format!("expected {expected}-dimensional embeddings, got {}", bad.len()),
        });
    }
    Ok(vectors)
}

/// Keep at most `max_tokens` whitespace-delimited tokens of `text`.
///
/// Returns a prefix slice of the input; nothing is copied.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> &str {
    let mut seen = 0;
    let mut prev_whitespace = true;
    for (i, ch) in text.char_indices() {
        let whitespace = ch.is_whitespace();
        if prev_whitespace && !whitespace {
            if seen == max_tokens {
                return text[..i].trim_end();
            }
            seen += 1;
        }
        prev_whitespace = whitespace;
    }
    text
}

/// A deterministic, dependency-free embedder based on feature hashing.
///
/// Each lower-cased alphanumeric token is hashed (FNV-1a) into one of
/// `dimensions` buckets with a hash-derived sign; the resulting bag-of-words
/// vector is L2-normalised. Texts sharing vocabulary land close together,
/// identical texts map to identical vectors. Useful offline and in tests; a
/// neural embedder gives far better semantic recall.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    max_input_tokens: usize,
    model_id: String,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError("embedding dimensions must be non-zero".into()));
        }
        Ok(Self {
            dimensions,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            model_id: format!("hashing-fnv1a-{dimensions}"),
        })
    }

    /// Set the truncation bound in tokens.
    pub fn with_max_input_tokens(mut self, max_tokens: usize) -> Self {
        self.max_input_tokens = max_tokens;
        self
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in truncate_to_tokens(text, self.max_input_tokens).split_whitespace() {
            let normalized: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if normalized.is_empty() {
                continue;
            }
            let hash = fnv1a(normalized.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
