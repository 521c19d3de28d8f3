//! Boundary-aware splitting of extracted text blocks into bounded chunks.
//!
//! The splitter works recursively: it prefers paragraph boundaries, then line
//! boundaries, then word boundaries, and only falls back to character-level
//! splitting for unbroken runs. Adjacent chunks of the same block share a
//! sliding character overlap so spans around boundaries remain visible to
//! retrieval.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use super::types::ChunkingError;
use crate::extract::TextBlock;

/// Default fragment size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive fragments of one block, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Ceiling on fragments per ingestion; exceeding it aborts the whole message.
pub const MAX_FRAGMENTS: usize = 2000;

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A bounded slice of one text block, carrying its source metadata.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk text content.
    pub content: String,
    /// Source metadata inherited from the originating block.
    pub source_metadata: Map<String, Value>,
}

/// Split text blocks into bounded chunks, preserving block order.
///
/// Returns [`ChunkingError::TooManyFragments`] when the source would produce
/// more than `max_fragments` chunks; the caller is expected to abort the
/// ingestion rather than upsert a partial batch.
pub fn chunk_blocks(
    blocks: Vec<TextBlock>,
    chunk_size: usize,
    overlap: usize,
    max_fragments: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            overlap,
            chunk_size,
        });
    }

    let mut chunks = Vec::new();
    for block in blocks {
        if block.content.trim().is_empty() {
            continue;
        }
        for content in split_text(&block.content, chunk_size, overlap) {
            chunks.push(Chunk {
                content,
                source_metadata: block.source_metadata.clone(),
            });
        }
        if chunks.len() > max_fragments {
            return Err(ChunkingError::TooManyFragments {
                count: chunks.len(),
                limit: max_fragments,
            });
        }
    }
    Ok(chunks)
}

/// Split a single text into chunks of at most `chunk_size` characters.
pub(crate) fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    split_with(text, chunk_size, overlap, &SEPARATORS)
}

fn split_with(text: &str, chunk_size: usize, overlap: usize, separators: &[&str]) -> Vec<String> {
    let (separator, remaining) = pick_separator(text, separators);
    let pieces: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(str::to_string).collect()
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for piece in pieces {
        if char_len(&piece) > chunk_size {
            if !pending.is_empty() {
                merge_pieces(
                    std::mem::take(&mut pending),
                    separator,
                    chunk_size,
                    overlap,
                    &mut chunks,
                );
            }
            // A piece longer than the budget needs a finer separator.
            chunks.extend(split_with(&piece, chunk_size, overlap, remaining));
        } else {
            pending.push(piece);
        }
    }
    if !pending.is_empty() {
        merge_pieces(pending, separator, chunk_size, overlap, &mut chunks);
    }
    chunks
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (index, separator) in separators.iter().enumerate() {
        if text.contains(separator) {
            return (separator, &separators[index + 1..]);
        }
    }
    ("", &[])
}

/// Merge small pieces back into chunks close to `chunk_size`, retaining a
/// tail of at most `overlap` characters between consecutive chunks.
fn merge_pieces(
    pieces: Vec<String>,
    separator: &str,
    chunk_size: usize,
    overlap: usize,
    out: &mut Vec<String>,
) {
    let sep_len = char_len(separator);
    let mut window: VecDeque<String> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let piece_len = char_len(&piece);
        let joined_len = total + piece_len + if window.is_empty() { 0 } else { sep_len };
        if joined_len > chunk_size && !window.is_empty() {
            push_joined(&window, separator, out);
            // Slide the window until the retained tail fits the overlap
            // budget and leaves room for the incoming piece.
            while total > overlap
                || (total + piece_len + if window.is_empty() { 0 } else { sep_len } > chunk_size
                    && total > 0)
            {
                match window.pop_front() {
                    Some(front) => {
                        total -= char_len(&front) + if window.is_empty() { 0 } else { sep_len };
                    }
                    None => break,
                }
            }
        }
        total += piece_len + if window.is_empty() { 0 } else { sep_len };
        window.push_back(piece);
    }

    if !window.is_empty() {
        push_joined(&window, separator, out);
    }
}

fn push_joined(window: &VecDeque<String>, separator: &str, out: &mut Vec<String>) {
    let joined = window
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
