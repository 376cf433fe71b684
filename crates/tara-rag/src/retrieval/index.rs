//! In-memory vector index with exact cosine search

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ChunkKind};

/// An embedded chunk; never mutated once inserted
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity, higher is better
    pub score: f32,
}

/// How an ingest batch merges into a session's index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Build a fresh index, replacing whatever the slot held
    Create,
    /// Append to the existing index
    Extend,
}

impl IndexMode {
    /// `Extend` when the slot is occupied, otherwise `Create`
    pub fn for_slot<T>(slot: &Option<T>) -> Self {
        if slot.is_some() {
            Self::Extend
        } else {
            Self::Create
        }
    }
}

/// Vector index over embedded chunks, searched by brute-force cosine similarity
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed `chunks` and build a fresh index
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let entries = embed_chunks(chunks, embedder).await?;
        let dimensions = entries[0].vector.len();

        tracing::info!(
            "Built vector index: {} chunks, {} dimensions",
            entries.len(),
            dimensions
        );
        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Embed `chunks` and append them; existing entries are untouched.
    /// Nothing is appended if any chunk fails to embed.
    pub async fn extend(
        &mut self,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let new_entries = embed_chunks(chunks, embedder).await?;
        check_dimensions(&new_entries, self.dimensions)?;

        let added = new_entries.len();
        self.entries.extend(new_entries);
        tracing::info!("Extended vector index by {} chunks ({} total)", added, self.entries.len());
        Ok(added)
    }

    /// Top `k` entries by cosine similarity to `query`, highest first.
    /// Equal scores keep insertion order.
    pub async fn search(
        &self,
        query: &str,
        embedder: &dyn EmbeddingProvider,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = embedder.embed(query).await?;
        if query_vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query vector has {} dimensions, index has {}",
                query_vector.len(),
                self.dimensions
            )));
        }
        Ok(self.search_vector(&query_vector, k))
    }

    /// Search with a precomputed query vector
    pub fn search_vector(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_sim(query, &e.vector)))
            .collect();

        // Stable sort keeps earlier entries first on ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchHit {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Whether any extracted document text is indexed
    pub fn has_document_chunks(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.chunk.kind == ChunkKind::Document)
    }

    /// Chunk count per source filename, in first-insertion order
    pub fn source_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter_mut().find(|(name, _)| *name == entry.chunk.source) {
                Some((_, n)) => *n += 1,
                None => counts.push((entry.chunk.source.clone(), 1)),
            }
        }
        counts
    }
}

async fn embed_chunks(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Vec<IndexEntry>> {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let vectors = embedder.embed_all(&texts).await?;

    Ok(chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexEntry { chunk, vector })
        .collect())
}

fn check_dimensions(entries: &[IndexEntry], expected: usize) -> Result<()> {
    match entries.iter().find(|e| e.vector.len() != expected) {
        Some(bad) => Err(Error::embedding(format!(
            "vector for chunk {} of {} has {} dimensions, expected {}",
            bad.chunk.ordinal,
            bad.chunk.source,
            bad.vector.len(),
            expected
        ))),
        None => Ok(()),
    }
}

/// Cosine similarity; zero for empty, mismatched or zero-magnitude vectors
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{HashingEmbedder, SwitchableEmbedder};

    fn doc(source: &str, ordinal: usize, text: &str) -> Chunk {
        Chunk::document(source, ordinal, text.to_string(), 0)
    }

    #[tokio::test]
    async fn test_build_rejects_empty() {
        let embedder = HashingEmbedder::new(32);
        let err = VectorIndex::build(Vec::new(), &embedder).await.unwrap_err();
        assert!(matches!(err, Error::EmptyIndex));
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_chunk_first() {
        let embedder = HashingEmbedder::new(256);
        let index = VectorIndex::build(
            vec![
                doc("bio.pdf", 0, "Mitochondria are the powerhouse of the cell"),
                doc("hist.pdf", 0, "The Treaty of Versailles ended the war"),
            ],
            &embedder,
        )
        .await
        .unwrap();

        let hits = index.search("what do mitochondria do in the cell", &embedder, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.source, "bio.pdf");
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let embedder = HashingEmbedder::new(64);
        let index = VectorIndex::build(
            vec![doc("a.pdf", 0, "same text"), doc("b.pdf", 0, "same text"), doc("c.pdf", 0, "same text")],
            &embedder,
        )
        .await
        .unwrap();

        let hits = index.search("same text", &embedder, 3).await.unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.chunk.source.as_str()).collect();
        assert_eq!(order, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_extend_keeps_old_vectors_bit_identical() {
        let embedder = HashingEmbedder::new(128);
        let mut index = VectorIndex::build(vec![doc("old.pdf", 0, "ancient rome senate")], &embedder)
            .await
            .unwrap();
        let before: Vec<Vec<u32>> = index
            .entries()
            .iter()
            .map(|e| e.vector.iter().map(|v| v.to_bits()).collect())
            .collect();

        for round in 0..3 {
            let added = index
                .extend(vec![doc("new.pdf", round, "quantum entanglement photons")], &embedder)
                .await
                .unwrap();
            assert_eq!(added, 1);
        }

        let after: Vec<u32> = index.entries()[0].vector.iter().map(|v| v.to_bits()).collect();
        assert_eq!(before[0], after);
        assert_eq!(index.len(), 4);

        let hits = index.search("rome senate", &embedder, 4).await.unwrap();
        assert_eq!(hits[0].chunk.source, "old.pdf");
        let hits = index.search("quantum photons", &embedder, 1).await.unwrap();
        assert_eq!(hits[0].chunk.source, "new.pdf");
    }

    #[tokio::test]
    async fn test_failed_extend_leaves_index_unchanged() {
        let embedder = SwitchableEmbedder::new(HashingEmbedder::new(32));
        let mut index = VectorIndex::build(vec![doc("a.pdf", 0, "alpha")], &embedder).await.unwrap();

        embedder.set_failing(true);
        let err = index.extend(vec![doc("b.pdf", 0, "beta")], &embedder).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_source_counts_and_mode() {
        let embedder = HashingEmbedder::new(32);
        let mut slot: Option<VectorIndex> = None;
        assert_eq!(IndexMode::for_slot(&slot), IndexMode::Create);

        let mut index = VectorIndex::build(vec![doc("a.pdf", 0, "a"), doc("a.pdf", 1, "b")], &embedder)
            .await
            .unwrap();
        index.extend(vec![doc("b.pdf", 0, "c")], &embedder).await.unwrap();
        assert_eq!(
            index.source_counts(),
            vec![("a.pdf".to_string(), 2), ("b.pdf".to_string(), 1)]
        );

        slot = Some(index);
        assert_eq!(IndexMode::for_slot(&slot), IndexMode::Extend);
    }

    #[tokio::test]
    async fn test_document_chunk_detection() {
        let embedder = HashingEmbedder::new(32);
        let mut index = VectorIndex::build(
            vec![Chunk::tabular("sales.csv", "tabular data file".to_string())],
            &embedder,
        )
        .await
        .unwrap();
        assert!(!index.has_document_chunks());

        index.extend(vec![doc("notes.pdf", 0, "lecture")], &embedder).await.unwrap();
        assert!(index.has_document_chunks());
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_sim(&[], &[]), 0.0);
        assert_eq!(cosine_sim(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_sim(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_sim(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }
}
