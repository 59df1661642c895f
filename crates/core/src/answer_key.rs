//! Parsing of correct-answer strings into canonical choice keys.
//!
//! Banks write answers three ways: a single letter (`"B"`), a separated list
//! (`"A, C"` or `"A，C"`), or compact letters (`"ACD"`). All of them reduce to a
//! set of uppercase letters that is compared against the leading letter of
//! each selected option.

use std::collections::BTreeSet;

const FULL_WIDTH_COMMA: char = '，';

/// Canonical set of choice keys.
pub type AnswerKeys = BTreeSet<char>;

fn is_compact(answer: &str) -> bool {
    answer.chars().count() > 1 && answer.chars().all(|c| c.is_ascii_uppercase())
}

fn is_separator(c: char) -> bool {
    c == ',' || c == FULL_WIDTH_COMMA || c.is_whitespace()
}

/// Uppercased first character of a trimmed piece of text, if any.
#[must_use]
pub fn leading_key(text: &str) -> Option<char> {
    text.trim().chars().next().and_then(|c| c.to_uppercase().next())
}

/// Normalize an answer string into its set of keys.
///
/// An empty answer yields an empty set, which never matches a non-empty selection.
#[must_use]
pub fn normalize(answer: &str) -> AnswerKeys {
    if is_compact(answer) {
        return answer.chars().collect();
    }

    answer.split(is_separator)
        .filter(|piece| !piece.is_empty())
        .filter_map(leading_key)
        .collect()
}

/// True when the answer admits more than one selected option.
#[must_use]
pub fn is_multi_select(answer: &str) -> bool {
    answer.contains(',') || answer.contains(FULL_WIDTH_COMMA) || is_compact(answer)
}
