//! Retrieval: embedded chunks and similarity search

mod index;

pub use index::{cosine_sim, IndexEntry, IndexMode, SearchHit, VectorIndex};
