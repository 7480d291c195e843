//! Property tests for fixed-size word chunking.

use docchat_rag::chunking::{Chunker, WordChunker};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(("[a-zA-Z0-9.,]{1,8}", "[ \t\n]{1,3}"), 0..120)
        .prop_map(|parts| parts.into_iter().map(|(word, gap)| word + &gap).collect::<String>())
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Concatenating the chunks in order reproduces the document's word
/// sequence, and every window but the last has exactly `size` words.
mod prop_word_windows {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_preserve_every_word_in_order(text in arb_text(), size in 1usize..20) {
            let chunks = WordChunker::new(size).unwrap().chunk(&text);

            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
            let original: Vec<&str> = text.split_whitespace().collect();
            prop_assert_eq!(rejoined, original);

            let total: usize = chunks.iter().map(|c| word_count(c)).sum();
            prop_assert_eq!(total, word_count(&text));
        }

        #[test]
        fn windows_are_full_except_the_last(text in arb_text(), size in 1usize..20) {
            let chunks = WordChunker::new(size).unwrap().chunk(&text);

            prop_assert_eq!(chunks.len(), word_count(&text).div_ceil(size));
            if let Some((last, full)) = chunks.split_last() {
                for chunk in full {
                    prop_assert_eq!(word_count(chunk), size);
                }
                prop_assert!((1..=size).contains(&word_count(last)));
            }
        }

        #[test]
        fn whitespace_only_text_has_no_chunks(text in "[ \t\n]{0,40}", size in 1usize..20) {
            prop_assert!(WordChunker::new(size).unwrap().chunk(&text).is_empty());
        }
    }
}
