//! Text extractors and document helpers.

pub mod document;
pub mod file;

pub use document::{
    chunk_document, count_words, decode_text, document_preview, DEFAULT_CHUNK_CHARS,
    DEFAULT_PREVIEW_CHARS,
};
pub use file::{FileTextExtractor, MAX_DOCUMENT_BYTES};
