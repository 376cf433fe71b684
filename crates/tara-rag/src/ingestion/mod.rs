//! Document ingestion: staging, PDF parsing and chunking

mod chunker;
mod parser;
mod staging;

pub use chunker::{reconstruct, TextChunker, PAGE_SEPARATOR};
pub use parser::{ParsedPdf, PdfParser};
pub use staging::{StagedFile, Stager};

use std::path::Path;

use crate::error::Result;
use crate::types::Chunk;

/// Parse and chunk a staged PDF.
///
/// A PDF with no extractable text still yields one placeholder chunk so the
/// file registers in the index.
pub fn pdf_chunks(filename: &str, path: &Path, chunker: &TextChunker) -> Result<Vec<Chunk>> {
    let parsed = PdfParser::parse(filename, path)?;

    if !parsed.has_text() {
        tracing::warn!(
            "{} has no extractable text ({} pages), indexing a placeholder",
            filename,
            parsed.page_count()
        );
        return Ok(vec![placeholder_chunk(filename, parsed.page_count())]);
    }

    Ok(chunker.chunk_pages(filename, &parsed.pages))
}

/// Stand-in chunk for a document without extractable text
pub fn placeholder_chunk(filename: &str, page_count: usize) -> Chunk {
    Chunk::document(
        filename,
        0,
        format!(
            "The document {} has {} page(s) but no extractable text. It may be scanned or image-based.",
            filename, page_count
        ),
        0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkKind;

    #[test]
    fn test_placeholder_names_file() {
        let chunk = placeholder_chunk("scan.pdf", 3);
        assert_eq!(chunk.kind, ChunkKind::Document);
        assert!(chunk.text.contains("scan.pdf"));
        assert!(chunk.text.contains("3 page"));
    }
}
