//! Text normalization over a [`Dictionary`].
//!
//! [`resolve_abbreviations`] expands shorthand into canonical phrases;
//! [`identify_colloquial_terms`] reports colloquial phrases without touching
//! the text. Both are pure.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::dictionary::Dictionary;

/// Expand every abbreviation in `text` to its canonical phrase.
///
/// Matching is case-insensitive, anchored on word boundaries and prefers the
/// longest key at any position. Substitution is a single pass: replaced spans
/// are never rescanned. Because the dictionary rejects canonical phrases that
/// contain keys, applying this function twice gives the same result as
/// applying it once.
pub fn resolve_abbreviations<'t>(dict: &Dictionary, text: &'t str) -> Cow<'t, str> {
    let Some(matcher) = dict.matcher() else {
        return Cow::Borrowed(text);
    };

    matcher.replace_all(text, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        // Every alternative in the matcher comes from a dictionary key.
        dict.expansion(matched).unwrap_or(matched).to_string()
    })
}

/// Find colloquial phrases in `text`, keyed by the lowercased phrase.
///
/// A case-insensitive substring scan over every colloquial category. The
/// result only informs prompts and diagnostics.
pub fn identify_colloquial_terms(dict: &Dictionary, text: &str) -> BTreeMap<String, String> {
    let lower = text.to_lowercase();
    dict.colloquial_terms()
        .iter()
        .filter(|term| lower.contains(&term.term))
        .map(|term| (term.term.clone(), term.meaning.clone()))
        .collect()
}
