//! Word-boundary chunker with trailing-word overlap.
//!
//! Text is tokenized on whitespace and re-joined with single spaces. A segment
//! grows until the next word would push its rendered size past `chunk_size`;
//! the next segment is then seeded with the last `chunk_overlap` words of the
//! closed one. Words are never split, so a word longer than `chunk_size`
//! becomes a segment of its own.

use crate::traits::TextChunker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn chunk_overlap(&self) -> usize { self.chunk_overlap }

    /// Split `text` into ordered, overlapping segments.
    ///
    /// Empty input yields no segments. Input made only of whitespace is
    /// returned unchanged as a single segment.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return vec![text.to_string()];
        }

        let last = words.len() - 1;
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        // one separator per word, trailing one included
        let mut current_size = 0usize;

        for (i, word) in words.iter().copied().enumerate() {
            let word_size = word.len() + 1;

            if current_size + word_size > self.chunk_size && !current.is_empty() {
                chunks.push(current.join(" "));
                current = self.overlap_words(&current).to_vec();
                current_size = calculate_size(&current);
            }

            current.push(word);
            current_size += word_size;

            if i == last {
                chunks.push(current.join(" "));
            }
        }

        chunks
    }

    /// The last `min(chunk_overlap, words.len())` words, or none when overlap is disabled.
    pub fn overlap_words<'a, 'w>(&self, words: &'a [&'w str]) -> &'a [&'w str] {
        if self.chunk_overlap == 0 {
            return &[];
        }
        let count = self.chunk_overlap.min(words.len());
        &words[words.len() - count..]
    }
}

impl TextChunker for Chunker {
    fn chunk_text(&self, text: &str) -> Vec<String> { Chunker::chunk_text(self, text) }
}

/// Rendered length of `words` joined by single spaces.
pub fn calculate_size(words: &[&str]) -> usize {
    let size: usize = words.iter().map(|w| w.len() + 1).sum();
    size.saturating_sub(1)
}
