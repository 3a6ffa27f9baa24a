//! Injected token counting for the budget selector.
//!
//! The selector measures content cost through this trait so it can be tested
//! without a specific tokenizer. `TiktokenCounter` uses cl100k for accurate
//! counts with a chars/4 estimate as fallback.

use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Measures the token cost of a piece of text.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`. Never zero for non-empty text.
    fn count(&self, text: &str) -> usize;
}

/// Rough estimate: ~4 characters per token.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharEstimateCounter;

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        (text.len() / 4).max(1)
    }
}

/// Accurate counting via tiktoken's cl100k encoding.
///
/// Falls back to the chars/4 estimate if the encoder cannot be constructed.
pub struct TiktokenCounter {
    bpe: Option<CoreBPE>,
}

impl TiktokenCounter {
    /// Build the encoder once; reuse across calls.
    pub fn new() -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!(error = %e, "cl100k encoder unavailable, using estimate");
                None
            }
        };
        Self { bpe }
    }
}

impl Default for TiktokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => CharEstimateCounter.count(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_estimate() {
        assert_eq!(CharEstimateCounter.count(""), 0);
        assert_eq!(CharEstimateCounter.count("abc"), 1);
        assert_eq!(CharEstimateCounter.count(&"x".repeat(40)), 10);
    }

    #[test]
    fn test_tiktoken_counts_nonempty() {
        let counter = TiktokenCounter::new();
        assert_eq!(counter.count(""), 0);
        let n = counter.count("hello world, this is a sentence about memory");
        assert!(n > 0);
        assert!(n < 45);
    }

    #[test]
    fn test_tiktoken_monotonic_in_length() {
        let counter = TiktokenCounter::new();
        let short = counter.count("one two three");
        let long = counter.count("one two three four five six seven eight nine ten");
        assert!(long > short);
    }
}
