//! PDF page extraction

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound on a single pdf-extract run; some fonts make it spin
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Text extracted from a PDF, one entry per page
#[derive(Debug, Clone, Default)]
pub struct ParsedPdf {
    /// Page texts in document order
    pub pages: Vec<String>,
}

impl ParsedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page carries non-whitespace text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.trim().is_empty())
    }
}

/// PDF parser with a lopdf fallback
pub struct PdfParser;

impl PdfParser {
    /// Extract page texts from a staged PDF
    pub fn parse(filename: &str, path: &Path) -> Result<ParsedPdf> {
        let data = std::fs::read(path)
            .map_err(|e| Error::parse(filename, format!("could not read staged file: {}", e)))?;

        let pages = match Self::extract_with_timeout(&data) {
            Ok(pages) => pages,
            Err(reason) => {
                tracing::warn!("pdf-extract failed on {}: {}, trying lopdf", filename, reason);
                Self::extract_fallback(filename, &data)?
            }
        };

        let pages: Vec<String> = pages.iter().map(|p| cleanup_pdf_text(p)).collect();
        tracing::debug!("Extracted {} pages from {}", pages.len(), filename);

        Ok(ParsedPdf { pages })
    }

    /// Run pdf-extract on a worker thread so a hang or panic cannot take the session down
    fn extract_with_timeout(data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(EXTRACT_TIMEOUT) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(format!(
                "timed out after {}s",
                EXTRACT_TIMEOUT.as_secs()
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("extraction thread panicked".to_string())
            }
        }
    }

    /// Page-by-page extraction using lopdf directly
    fn extract_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::parse(filename, format!("not a readable PDF: {}", e)))?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&page_num| match doc.extract_text(&[page_num]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("No text for page {} of {}: {}", page_num, filename, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

/// Normalize characters that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_garbage_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"this is not a pdf at all").unwrap();

        let err = PdfParser::parse("broken.pdf", file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = PdfParser::parse("gone.pdf", Path::new("/nonexistent/tara/gone.pdf")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_cleanup_expands_ligatures() {
        assert_eq!(cleanup_pdf_text("e\u{FB03}cient\u{00A0}\0x"), "efficient x");
    }

    #[test]
    fn test_has_text() {
        let blank = ParsedPdf {
            pages: vec!["  ".to_string(), "\n".to_string()],
        };
        assert!(!blank.has_text());
        assert_eq!(blank.page_count(), 2);

        let filled = ParsedPdf {
            pages: vec!["".to_string(), "Cell biology".to_string()],
        };
        assert!(filled.has_text());
    }
}
