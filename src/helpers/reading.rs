//! Reading time estimation

use lazy_static::lazy_static;
use regex::Regex;

use crate::content::richtext;
use crate::content::ContentBlock;

/// Average reading speed behind the `N min` estimate
const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").unwrap();
}

/// Count words in a text fragment
pub fn word_count(text: &str) -> usize {
    NON_WORD.split(text).filter(|w| !w.is_empty()).count()
}

/// Estimated reading time in whole minutes, rounding up
///
/// Counts heading and body words across every content section. Empty
/// content reads in zero minutes.
pub fn reading_time(content: &[ContentBlock]) -> usize {
    let words: usize = content
        .iter()
        .map(|section| {
            word_count(&section.heading) + word_count(&richtext::as_text(&section.body))
        })
        .sum();
    words.div_ceil(WORDS_PER_MINUTE)
}
