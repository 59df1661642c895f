//! Verdicts for submitted selections.

use std::collections::BTreeSet;

use crate::answer_key::{self, AnswerKeys};
use crate::model::Question;

/// Keys derived from the selected options' own leading characters.
///
/// The key comes from each option's text, not from its position, so a bank
/// must keep each option's label letter at the start of its text.
#[must_use]
pub fn user_keys(question: &Question, selected: &BTreeSet<usize>) -> AnswerKeys {
    selected
        .iter()
        .filter_map(|&i| question.options.get(i))
        .filter_map(|text| answer_key::leading_key(text))
        .collect()
}

/// Set-equality check between the answer key and the derived user keys.
///
/// A question whose correct answer yields no keys is never graded correct.
#[must_use]
pub fn grade(question: &Question, selected: &BTreeSet<usize>) -> bool {
    let correct = answer_key::normalize(&question.correct_answer);
    if correct.is_empty() {
        return false;
    }
    let user = user_keys(question, selected);
    correct.len() == user.len() && correct.is_subset(&user)
}

/// Selected option texts joined for the mistake log, in option order.
#[must_use]
pub fn selected_text(question: &Question, selected: &BTreeSet<usize>) -> String {
    selected
        .iter()
        .filter_map(|&i| question.options.get(i))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}
