use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use taskdeck_core::api::{DocumentMetadata, ExtractError, ProcessedDocument, TextExtractor};

use super::document::{count_words, decode_text, describe_csv, describe_json};

/// Upper bound on the size of a file we are willing to read (50 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Pdf,
    Csv,
    Json,
    Other,
}

impl DocumentKind {
    fn from_extension(ext: &str) -> Self {
        match ext {
            "txt" | "md" | "markdown" | "log" => Self::Text,
            "pdf" => Self::Pdf,
            "csv" => Self::Csv,
            "json" => Self::Json,
            _ => Self::Other,
        }
    }

    fn mime(self, ext: &str) -> String {
        match self {
            Self::Text if ext == "md" || ext == "markdown" => "text/markdown".to_string(),
            Self::Text => "text/plain".to_string(),
            Self::Pdf => "application/pdf".to_string(),
            Self::Csv => "text/csv".to_string(),
            Self::Json => "application/json".to_string(),
            Self::Other if ext.is_empty() => "application/octet-stream".to_string(),
            Self::Other => ext.to_string(),
        }
    }
}

/// Reads documents from the local filesystem.
///
/// `~` and environment variables in paths are expanded. Unknown file types
/// are read as text; if the bytes are not valid text a placeholder is
/// returned instead of an error.
#[derive(Debug, Clone)]
pub struct FileTextExtractor {
    max_bytes: u64,
}

impl Default for FileTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTextExtractor {
    pub fn new() -> Self {
        Self {
            max_bytes: MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn resolve(path: &Path) -> PathBuf {
        let raw = path.to_string_lossy();
        match shellexpand::full(&raw) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => path.to_path_buf(),
        }
    }

    async fn read_bytes(&self, path: &Path) -> Result<(Vec<u8>, u64), ExtractError> {
        let display = path.display().to_string();
        let meta = tokio::fs::metadata(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ExtractError::NotFound(display.clone())
            } else {
                ExtractError::Io {
                    path: display.clone(),
                    source,
                }
            }
        })?;
        if meta.len() > self.max_bytes {
            return Err(ExtractError::TooLarge {
                path: display,
                size: meta.len(),
                max: self.max_bytes,
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractError::Io {
                path: display,
                source,
            })?;
        Ok((bytes, meta.len()))
    }
}

/// Text of a PDF with one `\n\n` between pages, plus the page count.
async fn extract_pdf(path: PathBuf) -> Result<(String, usize), String> {
    let joined = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

    // pdf-extract separates pages with form feeds.
    let pages: Vec<&str> = joined.trim_end().split('\x0c').collect();
    let text = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok((text, pages.len()))
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ProcessedDocument, ExtractError> {
        let path = Self::resolve(path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let kind = DocumentKind::from_extension(&ext);

        tracing::debug!(
            target: "taskdeck.extract",
            stage = "extract.in",
            path = %path.display(),
            kind = ?kind
        );

        let (bytes, file_size) = self.read_bytes(&path).await?;
        let mut page_count = None;

        let (content, word_count) = match kind {
            DocumentKind::Text => {
                let (text, _) = decode_text(&bytes);
                let words = count_words(&text);
                (text, words)
            }
            DocumentKind::Csv => {
                let (text, _) = decode_text(&bytes);
                let words = count_words(&text);
                (describe_csv(&text), words)
            }
            DocumentKind::Json => {
                let (text, _) = decode_text(&bytes);
                match describe_json(&text) {
                    Some(pretty) => {
                        let words = count_words(&pretty);
                        (pretty, words)
                    }
                    None => {
                        let words = count_words(&text);
                        (text, words)
                    }
                }
            }
            DocumentKind::Pdf => match extract_pdf(path.clone()).await {
                Ok((text, pages)) => {
                    page_count = Some(pages);
                    let words = count_words(&text);
                    (text, words)
                }
                Err(err) => {
                    tracing::warn!(
                        target: "taskdeck.extract",
                        path = %path.display(),
                        error = %err,
                        "pdf extraction failed"
                    );
                    (format!("[Error extracting PDF content: {}]", err), 0)
                }
            },
            DocumentKind::Other => {
                let (text, lossy) = decode_text(&bytes);
                if lossy {
                    (
                        format!(
                            "[Unable to extract text from {}. File type: {}]",
                            file_name,
                            kind.mime(&ext)
                        ),
                        0,
                    )
                } else {
                    let words = count_words(&text);
                    (text, words)
                }
            }
        };

        tracing::debug!(
            target: "taskdeck.extract",
            stage = "extract.out",
            file = %file_name,
            words = word_count,
            pages = ?page_count
        );

        Ok(ProcessedDocument {
            content,
            word_count,
            page_count,
            metadata: DocumentMetadata {
                file_name,
                file_type: kind.mime(&ext),
                file_size,
                processed_at: Some(Utc::now()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_markdown_read_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# Title\n\nSome body text").unwrap();

        let doc = FileTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(doc.content, "# Title\n\nSome body text");
        assert_eq!(doc.word_count, 5);
        assert_eq!(doc.page_count, None);
        assert_eq!(doc.metadata.file_name, "notes.md");
        assert_eq!(doc.metadata.file_type, "text/markdown");
        assert_eq!(doc.metadata.file_size, 23);
    }

    #[tokio::test]
    async fn test_csv_gets_summary_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.CSV");
        fs::write(&path, "date,amount\n2024-01-01,10\n").unwrap();

        let doc = FileTextExtractor::new().extract(&path).await.unwrap();
        assert!(doc
            .content
            .starts_with("CSV Document with 2 rows and 2 columns."));
        assert_eq!(doc.metadata.file_type, "text/csv");
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not: json").unwrap();

        let doc = FileTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(doc.content, "{ not: json");
    }

    #[tokio::test]
    async fn test_binary_file_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [0x80_u8, 0x81, 0xC3, 0x28]).unwrap();

        let doc = FileTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(
            doc.content,
            "[Unable to extract text from blob.bin. File type: bin]"
        );
        assert_eq!(doc.word_count, 0);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_becomes_inline_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        fs::write(&path, b"not really a pdf").unwrap();

        let doc = FileTextExtractor::new().extract(&path).await.unwrap();
        assert!(doc.content.starts_with("[Error extracting PDF content:"));
        assert_eq!(doc.word_count, 0);
        assert_eq!(doc.metadata.file_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileTextExtractor::new()
            .extract(&dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "0123456789").unwrap();

        let err = FileTextExtractor::new()
            .with_max_bytes(4)
            .extract(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { size: 10, max: 4, .. }));
    }
}
