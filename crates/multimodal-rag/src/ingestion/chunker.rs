//! Text chunking with position tracking

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap.
///
/// Sizes and offsets count characters of the extracted text; chunk
/// boundaries always fall on sentence or word boundaries.
pub struct TextChunker {
    /// Target chunk size
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

/// Byte offset of every char in a text, plus the text length
struct CharOffsets(Vec<usize>);

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self(offsets)
    }

    /// Char index of a byte offset that lies on a char boundary
    fn char_at(&self, byte: usize) -> usize {
        self.0.binary_search(&byte).unwrap_or_else(|i| i)
    }

    /// Byte offset of a char index, clamped to the end of the text
    fn byte_at(&self, char_index: usize) -> usize {
        self.0[char_index.min(self.0.len() - 1)]
    }

    /// Chars between two byte offsets
    fn span(&self, start: usize, end: usize) -> usize {
        self.char_at(end) - self.char_at(start)
    }
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size: 50,
        }
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_size: config.min_chunk_size,
        }
    }

    /// Split `text` into chunks belonging to `document_id`
    pub fn chunk_text(&self, document_id: Uuid, source: Option<&str>, text: &str) -> Vec<Chunk> {
        let offsets = CharOffsets::new(text);
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut current_start = 0usize;
        let mut current_end = 0usize;

        for (seg_start, segment) in self.segments(text) {
            let seg_end = seg_start + segment.len();

            // If adding this segment exceeds chunk size, save current chunk
            if current_end > current_start && offsets.span(current_start, seg_end) > self.chunk_size {
                spans.push((current_start, current_end));
                current_start = self.overlap_start(text, &offsets, current_start, current_end);
                if offsets.span(current_start, seg_end) > self.chunk_size {
                    current_start = seg_start;
                }
            }

            current_end = seg_end;
        }

        if current_end > current_start {
            spans.push((current_start, current_end));
        }

        let single = spans.len() == 1;
        let mut chunks = Vec::with_capacity(spans.len());

        for (start, end) in spans {
            let content = text[start..end].trim();
            if content.is_empty() || (!single && content.chars().count() < self.min_size) {
                continue;
            }

            chunks.push(Chunk::new(
                document_id,
                content.to_string(),
                source.map(str::to_string),
                offsets.char_at(start),
                offsets.char_at(end),
                chunks.len() as u32,
            ));
        }

        chunks
    }

    /// Sentence segments with their byte offsets; sentences longer than the
    /// chunk size are broken at word boundaries.
    fn segments<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let mut segments = Vec::new();

        for (offset, sentence) in text.split_sentence_bound_indices() {
            if sentence.chars().count() <= self.chunk_size {
                segments.push((offset, sentence));
                continue;
            }

            for (word_offset, word) in sentence.split_word_bound_indices() {
                segments.push((offset + word_offset, word));
            }
        }

        segments
    }

    /// Byte offset where the next chunk starts so that it repeats the tail
    /// of the previous one, preferring a sentence, then a word boundary.
    fn overlap_start(&self, text: &str, offsets: &CharOffsets, start: usize, end: usize) -> usize {
        if self.overlap == 0 {
            return end;
        }

        let first_char = offsets
            .char_at(end)
            .saturating_sub(self.overlap)
            .max(offsets.char_at(start));
        let candidate = offsets.byte_at(first_char);

        let tail = &text[candidate..end];

        if let Some(pos) = tail.find(". ") {
            return candidate + pos + 2;
        }

        if let Some(pos) = tail.find(' ') {
            return candidate + pos + 1;
        }

        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> String {
        (0..40)
            .map(|i| format!("Sentence number {} talks about vector search.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn char_slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let doc_id = Uuid::new_v4();
        let chunks = chunker.chunk_text(doc_id, Some("a.txt"), "Tiny note.");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Tiny note.");
        assert_eq!(chunks[0].source.as_deref(), Some("a.txt"));
        assert_eq!(chunks[0].document_id, doc_id);
    }

    #[test]
    fn test_chunks_respect_size_and_offsets() {
        let text = sample_text();
        let chunker = TextChunker::new(300, 60);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index as usize, i);
            assert!(chunk.char_end - chunk.char_start <= 300);
            assert!(char_slice(&text, chunk.char_start, chunk.char_end).contains(&chunk.content));
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = sample_text();
        let chunker = TextChunker::new(300, 100);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        for pair in chunks.windows(2) {
            assert!(pair[1].char_start < pair[0].char_end);
        }
    }

    #[test]
    fn test_zero_overlap_is_contiguous() {
        let text = sample_text();
        let chunker = TextChunker::new(300, 0);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end);
        }
    }

    #[test]
    fn test_long_sentence_split_at_words() {
        let text = "word ".repeat(400);
        let chunker = TextChunker::new(200, 20);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        assert!(chunks.len() > 5);
        assert!(chunks.iter().all(|c| c.content.len() <= 200));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Über große Straßen fährt ein Bär. ".repeat(30);
        let chunker = TextChunker::new(120, 40);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.content.contains("Bär") || c.content.chars().count() < 40));
        for chunk in &chunks {
            assert!(chunk.char_end - chunk.char_start <= 120);
            assert!(char_slice(&text, chunk.char_start, chunk.char_end).contains(&chunk.content));
        }
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let text = "Ünïcödé wörds här. ".repeat(10);
        let total_chars = text.chars().count();
        let chunker = TextChunker::new(1000, 0);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, total_chars);
        assert_eq!(chunks[0].content, text.trim());
    }

    #[test]
    fn test_chunk_size_counts_chars() {
        // 20 chars but 27 bytes per sentence
        let text = "Ünïcödé wörds härë. ".repeat(10);
        assert_eq!("Ünïcödé wörds härë. ".chars().count(), 20);
        let chunker = TextChunker::new(100, 0);
        let chunks = chunker.chunk_text(Uuid::new_v4(), None, &text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_end, 100);
        assert_eq!(chunks[1].char_start, 100);
    }
}
