//! Recursive character text chunker with sliding overlap.
//!
//! Splits document text on a prioritized list of separators (paragraph
//! breaks, line breaks, word boundaries, then a hard character split) so
//! each chunk is as large as possible without exceeding `max_chunk_size`,
//! merging small adjacent pieces back together where they fit. Consecutive
//! chunks from the same document share roughly `overlap_size` characters of
//! boundary text, so a concept cut at a chunk edge still appears whole in at
//! least one chunk.
//!
//! Chunking is deterministic: identical input and parameters always yield
//! identical, order-stable chunk sequences.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, SourceDocument};

/// Separator priority, most semantic first. The empty separator is the hard
/// per-character fallback and always matches.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Chunk every document, tagging each chunk with its source path and its
/// position among that document's chunks.
pub fn chunk_documents(documents: &[SourceDocument], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for doc in documents {
        let pieces = split_text(&doc.content, config.max_chunk_size, config.overlap_size);
        for (i, text) in pieces.into_iter().enumerate() {
            chunks.push(Chunk {
                text,
                source_path: doc.path.clone(),
                sequence_index: i,
            });
        }
    }
    chunks
}

/// Split raw text into overlapping pieces of at most `max_size` characters.
///
/// A single unsplittable run longer than `max_size` is emitted whole rather
/// than truncated; the hard character fallback makes this rare.
pub fn split_text(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    split_recursive(text, SEPARATORS, max_size, overlap)
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn split_recursive(text: &str, separators: &[&str], max_size: usize, overlap: usize) -> Vec<String> {
    // First separator actually present in the text wins; "" always matches.
    let mut separator = *separators.last().unwrap_or(&"");
    let mut next_separators: &[&str] = &[];
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            separator = sep;
            next_separators = &separators[i + 1..];
            break;
        }
    }

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    let mut final_pieces = Vec::new();
    let mut good: Vec<String> = Vec::new();

    for split in splits {
        if split.len() < max_size {
            good.push(split);
        } else {
            // Flush accumulated small pieces before descending.
            if !good.is_empty() {
                final_pieces.extend(merge_pieces(&good, separator, max_size, overlap));
                good.clear();
            }
            if next_separators.is_empty() {
                final_pieces.push(split);
            } else {
                final_pieces.extend(split_recursive(&split, next_separators, max_size, overlap));
            }
        }
    }
    if !good.is_empty() {
        final_pieces.extend(merge_pieces(&good, separator, max_size, overlap));
    }

    final_pieces
}

/// Greedily join small pieces into chunks under `max_size`, carrying a tail
/// of up to `overlap` characters of pieces into the next chunk.
fn merge_pieces(pieces: &[String], separator: &str, max_size: usize, overlap: usize) -> Vec<String> {
    let sep_len = separator.len();
    let mut docs = Vec::new();
    let mut current: VecDeque<&String> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let piece_len = piece.len();
        let joined_len = total + piece_len + if current.is_empty() { 0 } else { sep_len };

        if joined_len > max_size && !current.is_empty() {
            push_joined(&mut docs, &current, separator);

            // Shed leading pieces until the carried tail fits the overlap
            // budget and the incoming piece fits under max_size.
            while total > overlap
                || (total + piece_len + if current.is_empty() { 0 } else { sep_len } > max_size
                    && total > 0)
            {
                let first = current.pop_front().expect("non-empty while total > 0");
                total -= first.len() + if current.is_empty() { 0 } else { sep_len };
            }
        }

        total += piece_len + if current.is_empty() { 0 } else { sep_len };
        current.push_back(piece);
    }

    if !current.is_empty() {
        push_joined(&mut docs, &current, separator);
    }

    docs
}

fn push_joined(docs: &mut Vec<String>, pieces: &VecDeque<&String>, separator: &str) {
    let joined = pieces
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}
