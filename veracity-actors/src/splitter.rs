//! Breaks extracted text into checkable statements.

/// Statements shorter than this are dropped as noise.
pub const MIN_STATEMENT_CHARS: usize = 10;

pub trait ClaimSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Greedy sentence packer.
///
/// Sentences (split on `.`) are appended to the current chunk while the chunk
/// stays under `max_len` characters. A sentence longer than `max_len` is kept
/// whole as its own chunk; nothing is ever cut.
///
/// ```
/// use veracity_actors::splitter::{ClaimSplitter, SentenceSplitter};
///
/// let splitter = SentenceSplitter::new(40);
/// let parts = splitter.split("Lemon water cures cancer. Vaccines cause autism. Ok.");
/// assert_eq!(parts, ["Lemon water cures cancer.", "Vaccines cause autism. Ok."]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    max_len: usize,
}

impl SentenceSplitter {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }
}

impl ClaimSplitter for SentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in text.split('.').filter(|s| !s.trim().is_empty()) {
            let len = sentence.chars().count();
            if current_len + len >= self.max_len && !current.is_empty() {
                chunks.push(current.trim().to_string());
                current.clear();
                current_len = 0;
            }
            current.push_str(sentence);
            current.push('.');
            current_len += len + 1;
        }
        if !current.is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks.retain(|c| c.chars().count() >= MIN_STATEMENT_CHARS);
        chunks
    }
}
