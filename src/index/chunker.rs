//! Character-count text splitter.
//!
//! Splits on a separator, then greedily merges pieces into chunks of at most
//! `chunk_size` characters, carrying up to `overlap` characters of trailing
//! pieces into the next chunk. A single piece longer than `chunk_size` becomes
//! its own oversized chunk rather than being cut mid-line.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions<'a> {
    pub separator: &'a str,
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkOptions<'_> {
    fn default() -> Self {
        Self {
            separator: "\n",
            chunk_size: 1600,
            overlap: 100,
        }
    }
}

pub fn split_text(text: &str, opts: &ChunkOptions<'_>) -> Vec<String> {
    let splits: Vec<&str> = if opts.separator.is_empty() {
        vec![text]
    } else {
        text.split(opts.separator).collect()
    };
    let splits = splits.into_iter().map(str::trim).filter(|s| !s.is_empty());

    merge_splits(splits, opts)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn merge_splits<'t>(splits: impl Iterator<Item = &'t str>, opts: &ChunkOptions<'_>) -> Vec<String> {
    let sep_len = char_len(opts.separator);
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in splits {
        let len = char_len(piece);
        let joined_len = |total: usize, current: &VecDeque<&str>| {
            total + len + if current.is_empty() { 0 } else { sep_len }
        };

        if joined_len(total, &current) > opts.chunk_size && !current.is_empty() {
            if total > opts.chunk_size {
                tracing::warn!(
                    chunk_len = total,
                    chunk_size = opts.chunk_size,
                    "created a chunk longer than the configured size"
                );
            }
            push_chunk(&mut chunks, &current, opts.separator);

            // Keep a tail no longer than the overlap that still leaves room for `piece`.
            while total > opts.overlap
                || (joined_len(total, &current) > opts.chunk_size && total > 0)
            {
                let Some(front) = current.pop_front() else {
                    break;
                };
                total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
            }
        }

        total += len + if current.is_empty() { 0 } else { sep_len };
        current.push_back(piece);
    }

    push_chunk(&mut chunks, &current, opts.separator);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let joined = joined.trim();
    if !joined.is_empty() {
        chunks.push(joined.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(chunk_size: usize, overlap: usize) -> ChunkOptions<'static> {
        ChunkOptions {
            separator: "\n",
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("alpha\nbeta", &ChunkOptions::default());
        assert_eq!(chunks, vec!["alpha\nbeta"]);
    }

    #[test]
    fn empty_and_blank_text_produce_no_chunks() {
        assert!(split_text("", &ChunkOptions::default()).is_empty());
        assert!(split_text("\n \n\n", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn lines_are_merged_up_to_chunk_size() {
        // each line is 4 chars; "aaaa\nbbbb" is 9
        let chunks = split_text("aaaa\nbbbb\ncccc\ndddd", &opts(9, 0));
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc\ndddd"]);
    }

    #[test]
    fn overlap_carries_trailing_lines() {
        let chunks = split_text("aaaa\nbbbb\ncccc", &opts(9, 4));
        assert_eq!(chunks, vec!["aaaa\nbbbb", "bbbb\ncccc"]);
    }

    #[test]
    fn oversized_line_is_kept_whole() {
        let long = "x".repeat(20);
        let text = format!("ab\n{long}\ncd");
        let chunks = split_text(&text, &opts(10, 0));
        assert_eq!(chunks, vec!["ab".to_string(), long, "cd".to_string()]);
    }

    #[test]
    fn chunk_length_is_counted_in_characters() {
        // 4 two-byte chars per line; byte length would exceed the limit
        let chunks = split_text("éééé\nüüüü", &opts(9, 0));
        assert_eq!(chunks.len(), 1);
    }
}
