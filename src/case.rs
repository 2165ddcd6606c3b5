//! Unicode case conversions used by the built-in functions and exposed to
//! scripts.

use unicode_segmentation::UnicodeSegmentation;

// Words kept lower case inside a title unless they open or close it.
const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "en", "for", "if", "in", "of", "on", "or", "the",
    "to", "v", "via", "vs",
];

pub fn upper(text: &str) -> String {
    text.to_uppercase()
}

pub fn lower(text: &str) -> String {
    text.to_lowercase()
}

/// Upper-case the first grapheme and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let mut graphemes = text.graphemes(true);
    match graphemes.next() {
        Some(first) => {
            let mut out = first.to_uppercase();
            out.push_str(&graphemes.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

pub fn swapcase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_lowercase() {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Title-case `text`.
///
/// Every word is capitalized except short connecting words in the middle of
/// the title. Words with inner capitals ("iPhone", "McDonald") are kept as
/// written. Fully upper-case input is treated as lower case first, so
/// "THE WIND" becomes "The Wind".
pub fn titlecase(text: &str) -> String {
    let all_caps = text.chars().any(char::is_alphabetic) && upper(text) == text;
    let source = if all_caps { lower(text) } else { text.to_string() };

    let words: Vec<(usize, &str)> = source
        .split_word_bound_indices()
        .filter(|(_, piece)| piece.chars().any(char::is_alphanumeric))
        .collect();
    let last = words.len().saturating_sub(1);

    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for (position, (offset, word)) in words.into_iter().enumerate() {
        out.push_str(&source[pos..offset]);
        let is_small = SMALL_WORDS.contains(&lower(word).as_str());
        if is_small && position != 0 && position != last {
            out.push_str(&lower(word));
        } else if has_inner_capital(word) {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
        pos = offset + word.len();
    }
    out.push_str(&source[pos..]);
    out
}

fn has_inner_capital(word: &str) -> bool {
    word.chars().skip(1).any(char::is_uppercase)
}
