//! Embedding backend seam

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Turns chunk and question text into vectors.
///
/// Backends in this crate: `OllamaEmbedder` (`/api/embeddings`) and the
/// offline `HashingEmbedder`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one request at a time unless overridden
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Embed `texts` and reject any answer that is not one vector per text,
    /// all of the same non-zero width.
    async fn embed_all(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embed_batch(texts).await?;

        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} vectors for {} texts",
                self.name(),
                vectors.len(),
                texts.len()
            )));
        }

        if let Some(first) = vectors.first() {
            if first.is_empty() {
                return Err(Error::embedding(format!(
                    "{} returned an empty vector",
                    self.name()
                )));
            }
            if let Some(pos) = vectors.iter().position(|v| v.len() != first.len()) {
                return Err(Error::embedding(format!(
                    "{} returned {} dimensions for text {}, expected {}",
                    self.name(),
                    vectors[pos].len(),
                    pos,
                    first.len()
                )));
            }
        }

        Ok(vectors)
    }

    /// Configured vector width
    fn dimensions(&self) -> usize;

    async fn health_check(&self) -> Result<bool>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a vector as wide as the input text
    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; text.len()])
        }

        fn dimensions(&self) -> usize {
            0
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_embed_all_rejects_mixed_widths() {
        let ok = LengthEmbedder.embed_all(&["abc", "xyz"]).await.unwrap();
        assert_eq!(ok.len(), 2);

        let err = LengthEmbedder.embed_all(&["abc", "wxyz"]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("text 1"));

        let err = LengthEmbedder.embed_all(&[""]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}
