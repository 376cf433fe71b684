//! Offline embedder based on feature hashing

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

/// Deterministic bag-of-words embedder.
///
/// Each lowercase token is hashed into one of `dimensions` buckets with a
/// hashed sign; the result is L2-normalized. Texts sharing vocabulary land
/// close together, which is enough for offline use and tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    seed: u64,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self::with_seed(dimensions, 0)
    }

    pub fn with_seed(dimensions: usize, seed: u64) -> Self {
        Self { dimensions, seed }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        token.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dimensions as u64) as usize;
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(Error::embedding("hashing embedder has zero dimensions"));
        }

        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (idx, sign) = self.bucket(&token.to_lowercase());
            vector[idx] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Mitochondria produce ATP").await.unwrap();
        let b = embedder.embed("mitochondria PRODUCE atp").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed("photosynthesis in plants").await.unwrap();
        let near = embedder.embed("plants perform photosynthesis").await.unwrap();
        let far = embedder.embed("the french revolution began").await.unwrap();
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        let v = embedder.embed("  ,. ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_zero_dimensions_is_an_error() {
        let embedder = HashingEmbedder::with_seed(0, 7);
        let err = embedder.embed("cells divide").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(embedder.embed_all(&["a", "b"]).await.is_err());
    }
}
