//! Reading-time estimation.

/// Assumed reading speed.
const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read `content`: whitespace-separated word count
/// at 200 wpm, rounded up, never less than one minute.
pub fn estimate_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}
