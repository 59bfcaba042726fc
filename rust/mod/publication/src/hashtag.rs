//! Hashtag extraction from free text.

/// Extract hashtags from `text`.
///
/// Words are split on single spaces. A word starting with `#` is a hashtag;
/// every `#` at either end of the word is stripped, so `##tag#` yields `tag`
/// and a lone `#` yields an empty tag. Order is kept and duplicates are not
/// removed.
pub fn extract(text: &str) -> Vec<String> {
    text.split(' ')
        .filter(|word| word.starts_with('#'))
        .map(|word| word.trim_matches('#').to_string())
        .collect()
}
