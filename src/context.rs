//! Context assembly: merge retrieved chunks into per-file blocks.
//!
//! Chunks are grouped by source path in the order a file first appears in
//! the retrieval result, and each file's chunk texts are joined in result
//! order (not sequence order) with an explicit separator. Downstream prompt
//! assembly sees only merged text per file.

use std::collections::HashMap;

use crate::models::{FileContext, ScoredChunk};

/// Literal separator between a file's retrieved chunks.
pub const CHUNK_SEPARATOR: &str = "\n...\n";

/// Group a retrieval result by source file, preserving first-seen file order
/// and per-file result order.
pub fn assemble_context(results: &[ScoredChunk]) -> Vec<FileContext> {
    let mut contexts: Vec<FileContext> = Vec::new();
    let mut by_path: HashMap<&str, usize> = HashMap::new();

    for result in results {
        let path = result.chunk.source_path.as_str();
        match by_path.get(path) {
            Some(&i) => {
                contexts[i].merged_text.push_str(CHUNK_SEPARATOR);
                contexts[i].merged_text.push_str(&result.chunk.text);
            }
            None => {
                by_path.insert(path, contexts.len());
                contexts.push(FileContext {
                    path: path.to_string(),
                    merged_text: result.chunk.text.clone(),
                });
            }
        }
    }

    contexts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn scored(text: &str, path: &str, seq: usize, distance: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                source_path: path.to_string(),
                sequence_index: seq,
            },
            distance,
        }
    }

    #[test]
    fn test_empty_result() {
        assert!(assemble_context(&[]).is_empty());
    }

    #[test]
    fn test_single_file_joined_in_result_order() {
        let results = vec![
            scored("second chunk", "a.py", 7, 0.1),
            scored("first chunk", "a.py", 2, 0.2),
        ];
        let contexts = assemble_context(&results);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].path, "a.py");
        // Result order, not sequence_index order.
        assert_eq!(contexts[0].merged_text, "second chunk\n...\nfirst chunk");
    }

    #[test]
    fn test_interleaved_files_keep_first_seen_order() {
        // Ranked x, y, x, y, x: x.py appears first and collects ranks 1,3,5.
        let results = vec![
            scored("x1", "x.py", 0, 0.10),
            scored("y1", "y.py", 0, 0.12),
            scored("x2", "x.py", 3, 0.15),
            scored("y2", "y.py", 1, 0.20),
            scored("x3", "x.py", 1, 0.25),
        ];
        let contexts = assemble_context(&results);
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].path, "x.py");
        assert_eq!(contexts[1].path, "y.py");
        assert_eq!(contexts[0].merged_text, "x1\n...\nx2\n...\nx3");
        assert_eq!(contexts[1].merged_text, "y1\n...\ny2");
    }
}
