//! Sliding-window text chunking with boundary-aware cuts

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Separator placed between pages before chunking
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be > 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Join pages with a blank line and chunk the result
    pub fn chunk_pages<S: AsRef<str>>(&self, source: &str, pages: &[S]) -> Vec<Chunk> {
        let joined = pages
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        self.chunk_text(source, &joined)
    }

    /// Chunk a single text
    pub fn chunk_text(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, (start, end, slice))| {
                let chunk = Chunk::document(source, ordinal, slice.to_string(), start);
                debug_assert_eq!(chunk.char_end(), end);
                chunk
            })
            .collect()
    }

    /// Split into `(char_start, char_end, slice)` windows
    fn split<'a>(&self, text: &'a str) -> Vec<(usize, usize, &'a str)> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut windows = Vec::new();
        let mut start = 0usize;

        loop {
            if total - start <= self.chunk_size {
                windows.push((start, total, &text[offsets[start]..]));
                break;
            }

            let hard_end = start + self.chunk_size;
            let window = &text[offsets[start]..offsets[hard_end]];
            let end = match self.find_boundary(window) {
                Some(cut) => start + cut,
                None => hard_end,
            };

            windows.push((start, end, &text[offsets[start]..offsets[end]]));
            // end > start + overlap, so this always advances
            start = end - self.overlap;
        }

        windows
    }

    /// Char count of the strongest cut inside `window` that keeps more than
    /// `overlap` characters, trying paragraph, line, sentence, then whitespace.
    fn find_boundary(&self, window: &str) -> Option<usize> {
        let accept = |byte_pos: usize| {
            let chars = window[..byte_pos].chars().count();
            (chars > self.overlap).then_some(chars)
        };

        if let Some(cut) = window.rfind("\n\n").and_then(|p| accept(p + 2)) {
            return Some(cut);
        }
        if let Some(cut) = window.rfind('\n').and_then(|p| accept(p + 1)) {
            return Some(cut);
        }

        // The final segment runs into the window edge and is not a real sentence end
        let sentence_end = window
            .split_sentence_bound_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .last();
        if let Some(cut) = sentence_end.and_then(accept) {
            return Some(cut);
        }

        window
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .and_then(|(p, c)| accept(p + c.len_utf8()))
    }
}

/// Rebuild the chunked text by dropping each later chunk's leading overlap
pub fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            text.push_str(&chunk.text);
        } else {
            text.extend(chunk.text.chars().skip(overlap));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_text(rng: &mut StdRng, len: usize) -> String {
        const ALPHABET: &[&str] = &[
            "a", "b", "c", "word", " ", " ", "\n", "\n\n", ". ", "é", "漢字", "🦀", "ß", "?",
        ];
        let mut text = String::new();
        while text.chars().count() < len {
            text.push_str(ALPHABET[rng.gen_range(0..ALPHABET.len())]);
        }
        text
    }

    #[test]
    fn test_invalid_overlap_is_config_error() {
        assert!(matches!(TextChunker::new(100, 100), Err(Error::Config(_))));
        assert!(matches!(TextChunker::new(100, 150), Err(Error::Config(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(Error::Config(_))));
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        assert!(chunker.chunk_text("empty.pdf", "").is_empty());
        assert!(chunker.chunk_pages::<&str>("empty.pdf", &[]).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk_text("short.pdf", "Photosynthesis converts light.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Photosynthesis converts light.");
        assert_eq!(chunks[0].char_start, 0);
    }

    #[test]
    fn test_pages_joined_with_blank_line() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk_pages("two.pdf", &["Page one.", "Page two."]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Page one.\n\nPage two.");
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let chunker = TextChunker::new(50, 10).unwrap();
        let text = format!("{}\n\n{}", "a".repeat(30), "b ".repeat(40));
        let chunks = chunker.chunk_text("p.pdf", &text);
        assert!(chunks.len() > 1);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(chunks[0].char_len, 32);
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let text = "x".repeat(25);
        let chunks = chunker.chunk_text("dense.pdf", &text);
        assert_eq!(chunks[0].char_len, 10);
        assert_eq!(chunks[1].char_start, 7);
        assert_eq!(reconstruct(&chunks, 3), text);
    }

    #[test]
    fn test_consecutive_chunks_overlap_exactly() {
        let chunker = TextChunker::new(40, 8).unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let chunks = chunker.chunk_text("fox.pdf", &text);

        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end() - 8);
            let tail: String = pair[0].text.chars().skip(pair[0].char_len - 8).collect();
            let head: String = pair[1].text.chars().take(8).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_reconstruction_is_exact_for_random_text() {
        let mut rng = StdRng::seed_from_u64(7);
        for round in 0..200 {
            let chunk_size = rng.gen_range(2..120);
            let overlap = rng.gen_range(0..chunk_size);
            let chunker = TextChunker::new(chunk_size, overlap).unwrap();
            let len = rng.gen_range(0..600);
            let text = random_text(&mut rng, len);

            let chunks = chunker.chunk_text("random.pdf", &text);
            assert_eq!(reconstruct(&chunks, overlap), text, "round {}", round);
            for (i, chunk) in chunks.iter().enumerate() {
                assert!(chunk.char_len <= chunk_size);
                assert_eq!(chunk.ordinal, i);
                assert_eq!(chunk.text.chars().count(), chunk.char_len);
            }
        }
    }
}
