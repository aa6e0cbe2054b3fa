//! Fixed-size character window chunking.
//!
//! This module provides the [`Chunker`] trait, the [`FixedSizeChunker`]
//! implementation, and the underlying [`chunk_text`] function. Windows are
//! measured in characters (Unicode scalar values), never in bytes or tokens,
//! so a window boundary never splits a UTF-8 code point.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size windows by character count with configurable overlap.
///
/// Each window starts `chunk_size - chunk_overlap` characters after the
/// previous one, and windows are emitted while the start offset is inside
/// the text. Windows that run past the end are cut short.
///
/// # Example
///
/// ```rust
/// use docrag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(5, 2)?;
/// let chunks = chunker.chunk(&Document::new("doc.txt", "AAAAABBBBBCCCCC"));
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["AAAAA", "AABBB", "BBBBC", "BCCCC", "CCC"]);
/// # Ok::<(), docrag::RagError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: number of characters per window
    /// * `chunk_overlap`: number of characters shared by consecutive windows
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Number of characters per window.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive windows.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        windows(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                document_name: document.name.clone(),
                index,
                text: text.to_string(),
            })
            .collect()
    }
}

/// Split `text` into overlapping windows of `chunk_size` characters.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
/// `overlap >= chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate(chunk_size, overlap)?;
    Ok(windows(text, chunk_size, overlap).into_iter().map(str::to_string).collect())
}

fn validate(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::invalid("chunk_size must be greater than zero"));
    }
    if overlap >= chunk_size {
        return Err(RagError::invalid(format!(
            "chunk_overlap ({overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Borrowing window splitter. Callers must have validated the parameters.
fn windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every character, plus the end of the text.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = bounds.len();
    bounds.push(text.len());

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        chunks.push(&text[bounds[start]..bounds[end]]);
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_without_overlap() {
        let chunks = chunk_text("AAAAABBBBBCCCCC", 5, 0).unwrap();
        assert_eq!(chunks, ["AAAAA", "BBBBB", "CCCCC"]);
    }

    #[test]
    fn splits_with_overlap() {
        let chunks = chunk_text("AAAAABBBBBCCCCC", 5, 2).unwrap();
        assert_eq!(chunks, ["AAAAA", "AABBB", "BBBBC", "BCCCC", "CCC"]);
    }

    #[test]
    fn keeps_emitting_until_offset_passes_end() {
        // Offsets 0, 2, 4, 6, 8: the last two windows are both short.
        let chunks = chunk_text("0123456789", 5, 3).unwrap();
        assert_eq!(chunks, ["01234", "23456", "45678", "6789", "89"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 10, 3).unwrap().is_empty());
    }

    #[test]
    fn text_shorter_than_chunk_is_single_chunk() {
        assert_eq!(chunk_text("abc", 300, 40).unwrap(), ["abc"]);
    }

    #[test]
    fn overlap_not_less_than_size_is_rejected() {
        assert!(matches!(chunk_text("abc", 5, 5), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(chunk_text("abc", 5, 9), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(FixedSizeChunker::new(4, 4), Err(RagError::InvalidConfiguration(_))));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(chunk_text("abc", 0, 0), Err(RagError::InvalidConfiguration(_))));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunks = chunk_text("héllo wörld", 4, 1).unwrap();
        assert_eq!(chunks, ["héll", "lo w", "wörl", "ld"]);
    }

    #[test]
    fn chunker_stamps_document_name_and_index() {
        let chunker = FixedSizeChunker::new(5, 0).unwrap();
        let chunks = chunker.chunk(&Document::new("manual.txt", "AAAAABBBBBCC"));
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.document_name, "manual.txt");
        }
        assert_eq!(chunks[2].text, "CC");
    }
}
