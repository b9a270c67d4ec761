//! Workout shorthand dictionary.
//!
//! A [`Dictionary`] holds the abbreviation tables (movements, equipment,
//! formats, units, intensity) and the colloquial-phrase tables (block types,
//! set types, phrases, timing words). It is built once, validated, and then
//! shared by reference; nothing in it changes after construction.
//!
//! The built-in tables live in `builtin.toml` and are embedded in the binary
//! at compile time. Callers with their own vocabulary build a dictionary from
//! TOML text or from [`DictionaryTables`] directly.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Abbreviation domains, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbbreviationDomain {
    Movements,
    Equipment,
    Formats,
    Units,
    Intensity,
}

impl AbbreviationDomain {
    pub const ALL: [Self; 5] = [
        Self::Movements,
        Self::Equipment,
        Self::Formats,
        Self::Units,
        Self::Intensity,
    ];
}

impl fmt::Display for AbbreviationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Movements => "movements",
            Self::Equipment => "equipment",
            Self::Formats => "formats",
            Self::Units => "units",
            Self::Intensity => "intensity",
        };
        f.write_str(s)
    }
}

/// Colloquial-phrase categories, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColloquialCategory {
    BlockTypes,
    SetTypes,
    Phrases,
    Timing,
}

impl fmt::Display for ColloquialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BlockTypes => "block_types",
            Self::SetTypes => "set_types",
            Self::Phrases => "phrases",
            Self::Timing => "timing",
        };
        f.write_str(s)
    }
}

/// Raw tables as written in TOML. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DictionaryTables {
    #[serde(default)]
    pub movements: BTreeMap<String, String>,
    #[serde(default)]
    pub equipment: BTreeMap<String, String>,
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    #[serde(default)]
    pub units: BTreeMap<String, String>,
    #[serde(default)]
    pub intensity: BTreeMap<String, String>,
    #[serde(default)]
    pub colloquial: ColloquialTables,
}

/// Colloquial phrase -> semantic tag tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColloquialTables {
    #[serde(default)]
    pub block_types: BTreeMap<String, String>,
    #[serde(default)]
    pub set_types: BTreeMap<String, String>,
    #[serde(default)]
    pub phrases: BTreeMap<String, String>,
    #[serde(default)]
    pub timing: BTreeMap<String, String>,
}

impl DictionaryTables {
    fn domain(&self, domain: AbbreviationDomain) -> &BTreeMap<String, String> {
        match domain {
            AbbreviationDomain::Movements => &self.movements,
            AbbreviationDomain::Equipment => &self.equipment,
            AbbreviationDomain::Formats => &self.formats,
            AbbreviationDomain::Units => &self.units,
            AbbreviationDomain::Intensity => &self.intensity,
        }
    }
}

impl ColloquialTables {
    fn categories(&self) -> [(ColloquialCategory, &BTreeMap<String, String>); 4] {
        [
            (ColloquialCategory::BlockTypes, &self.block_types),
            (ColloquialCategory::SetTypes, &self.set_types),
            (ColloquialCategory::Phrases, &self.phrases),
            (ColloquialCategory::Timing, &self.timing),
        ]
    }
}

/// Errors that can occur while building a [`Dictionary`].
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("empty key in {domain} table")]
    EmptyKey { domain: String },

    #[error("keys {first:?} and {second:?} collide case-insensitively in {domain}")]
    DuplicateKey {
        domain: String,
        first: String,
        second: String,
    },

    #[error(
        "canonical phrase {phrase:?} for {key:?} contains abbreviation {collides_with:?}; \
         expansion would not be idempotent"
    )]
    PhraseCollidesWithKey {
        key: String,
        phrase: String,
        collides_with: String,
    },

    #[error("failed to compile abbreviation matcher: {0}")]
    Matcher(#[from] regex::Error),
}

/// One merged abbreviation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    /// The key as written in its table (original casing).
    pub key: String,
    /// Canonical phrase substituted for the key.
    pub expansion: String,
    /// Domain the winning definition came from.
    pub domain: AbbreviationDomain,
}

/// One colloquial phrase and its semantic tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColloquialTerm {
    /// Lowercased phrase.
    pub term: String,
    pub meaning: String,
    pub category: ColloquialCategory,
}

/// Immutable, validated lookup tables plus the compiled abbreviation matcher.
#[derive(Debug, Clone)]
pub struct Dictionary {
    /// Lowercased key -> merged entry.
    abbreviations: HashMap<String, Abbreviation>,
    /// Alternation of every key, longest first. `None` when there are no keys.
    matcher: Option<Regex>,
    colloquial: Vec<ColloquialTerm>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

static BUILTIN_TOML: &str = include_str!("builtin.toml");

static BUILTIN: LazyLock<Dictionary> = LazyLock::new(|| {
    Dictionary::from_toml_str(BUILTIN_TOML).expect("embedded builtin.toml is invalid")
});

impl Dictionary {
    /// The built-in dictionary, constructed on first use.
    ///
    /// # Panics
    ///
    /// Panics if the embedded tables fail validation. The tables are fixed at
    /// compile time and covered by tests.
    pub fn builtin() -> &'static Dictionary {
        &BUILTIN
    }

    /// Parse tables from TOML text and build a dictionary.
    pub fn from_toml_str(content: &str) -> Result<Self, DictionaryError> {
        let tables: DictionaryTables = toml::from_str(content)?;
        Self::from_tables(&tables)
    }

    /// Merge, validate and compile the given tables.
    pub fn from_tables(tables: &DictionaryTables) -> Result<Self, DictionaryError> {
        let mut abbreviations: HashMap<String, Abbreviation> = HashMap::new();

        for domain in AbbreviationDomain::ALL {
            let table = tables.domain(domain);
            check_table_keys(&domain.to_string(), table)?;

            for (key, expansion) in table {
                let entry = Abbreviation {
                    key: key.clone(),
                    expansion: expansion.clone(),
                    domain,
                };
                if let Some(previous) = abbreviations.insert(key.to_lowercase(), entry) {
                    tracing::debug!(
                        key = %key,
                        replaced_domain = %previous.domain,
                        domain = %domain,
                        "abbreviation redefined by later domain"
                    );
                }
            }
        }

        let matcher = build_matcher(abbreviations.values().map(|a| a.key.as_str()))?;

        // Every canonical phrase must survive a second expansion untouched.
        if let Some(matcher) = &matcher {
            let mut entries: Vec<&Abbreviation> = abbreviations.values().collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            for entry in entries {
                if let Some(m) = matcher.find(&entry.expansion) {
                    return Err(DictionaryError::PhraseCollidesWithKey {
                        key: entry.key.clone(),
                        phrase: entry.expansion.clone(),
                        collides_with: m.as_str().to_string(),
                    });
                }
            }
        }

        let mut colloquial: Vec<ColloquialTerm> = Vec::new();
        for (category, table) in tables.colloquial.categories() {
            check_table_keys(&format!("colloquial.{category}"), table)?;
            for (term, meaning) in table {
                let term = term.to_lowercase();
                colloquial.retain(|existing| existing.term != term);
                colloquial.push(ColloquialTerm {
                    term,
                    meaning: meaning.clone(),
                    category,
                });
            }
        }

        Ok(Self {
            abbreviations,
            matcher,
            colloquial,
        })
    }
}

/// Reject empty keys and keys that differ only by case.
fn check_table_keys(domain: &str, table: &BTreeMap<String, String>) -> Result<(), DictionaryError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(table.len());
    for key in table.keys() {
        if key.trim().is_empty() {
            return Err(DictionaryError::EmptyKey {
                domain: domain.to_string(),
            });
        }
        if let Some(first) = seen.insert(key.to_lowercase(), key) {
            return Err(DictionaryError::DuplicateKey {
                domain: domain.to_string(),
                first: first.to_string(),
                second: key.clone(),
            });
        }
    }
    Ok(())
}

/// Compile one case-insensitive alternation over `keys`.
///
/// Longer keys come first so the leftmost-first alternation prefers them.
/// A key containing word characters asserts word boundaries only on its
/// word-character sides, so `RX+` still matches before a space. A purely
/// symbolic key (`@`, `%`, `#`) asserts both boundaries and so only expands
/// between word characters: `@ 80%` is left for the notation scan.
fn build_matcher<'a>(keys: impl Iterator<Item = &'a str>) -> Result<Option<Regex>, regex::Error> {
    let mut keys: Vec<&str> = keys.collect();
    if keys.is_empty() {
        return Ok(None);
    }
    keys.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });

    let alternatives: Vec<String> = keys
        .iter()
        .map(|key| {
            if !key.chars().any(is_word_char) {
                return format!(r"\b{}\b", regex::escape(key));
            }
            let lead = if key.chars().next().is_some_and(is_word_char) {
                r"\b"
            } else {
                ""
            };
            let trail = if key.chars().last().is_some_and(is_word_char) {
                r"\b"
            } else {
                ""
            };
            format!("{lead}{}{trail}", regex::escape(key))
        })
        .collect();

    Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).map(Some)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl Dictionary {
    /// Canonical phrase for `key`, matched case-insensitively.
    pub fn expansion(&self, key: &str) -> Option<&str> {
        self.abbreviations
            .get(&key.to_lowercase())
            .map(|a| a.expansion.as_str())
    }

    /// The merged entry for `key`, including the domain that defined it.
    pub fn abbreviation(&self, key: &str) -> Option<&Abbreviation> {
        self.abbreviations.get(&key.to_lowercase())
    }

    /// Number of distinct abbreviation keys after merging.
    pub fn abbreviation_count(&self) -> usize {
        self.abbreviations.len()
    }

    /// All colloquial terms, one entry per distinct term.
    pub fn colloquial_terms(&self) -> &[ColloquialTerm] {
        &self.colloquial
    }

    pub(crate) fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_validate() {
        let dict = Dictionary::builtin();
        assert!(dict.abbreviation_count() > 100);
        assert!(!dict.colloquial_terms().is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dict = Dictionary::builtin();
        assert_eq!(dict.expansion("emom"), Some("Every Minute on the Minute"));
        assert_eq!(dict.expansion("EMOM"), Some("Every Minute on the Minute"));
        assert_eq!(dict.expansion("metcon"), Some("Metabolic Conditioning"));
        assert_eq!(dict.expansion("nope"), None);
    }

    #[test]
    fn later_domain_wins_on_shared_key() {
        let dict = Dictionary::builtin();
        let wb = dict.abbreviation("WB").unwrap();
        assert_eq!(wb.domain, AbbreviationDomain::Equipment);
        assert_eq!(wb.expansion, "Wall Ball");
    }

    #[test]
    fn rejects_case_insensitive_duplicates_within_domain() {
        let result = Dictionary::from_toml_str(
            r#"
[units]
kg = "kilograms"
KG = "kilos"
"#,
        );
        assert!(
            matches!(result, Err(DictionaryError::DuplicateKey { ref domain, .. }) if domain == "units"),
            "expected DuplicateKey, got: {result:?}"
        );
    }

    #[test]
    fn rejects_phrase_that_reexpands() {
        let result = Dictionary::from_toml_str(
            r#"
[units]
in = "inches"

[intensity]
RIR = "Reps in Reserve"
"#,
        );
        match result {
            Err(DictionaryError::PhraseCollidesWithKey {
                key, collides_with, ..
            }) => {
                assert_eq!(key, "RIR");
                assert_eq!(collides_with, "in");
            }
            other => panic!("expected PhraseCollidesWithKey, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_key() {
        let result = Dictionary::from_toml_str("[movements]\n\"  \" = \"Nothing\"\n");
        assert!(matches!(result, Err(DictionaryError::EmptyKey { .. })));
    }

    #[test]
    fn rejects_unknown_table() {
        let result = Dictionary::from_toml_str("[moves]\nDL = \"Deadlift\"\n");
        assert!(matches!(result, Err(DictionaryError::Toml(_))));
    }

    #[test]
    fn empty_tables_build_without_matcher() {
        let dict = Dictionary::from_tables(&DictionaryTables::default()).unwrap();
        assert_eq!(dict.abbreviation_count(), 0);
        assert!(dict.matcher().is_none());
    }

    #[test]
    fn colloquial_terms_are_lowercased_and_deduplicated() {
        let dict = Dictionary::builtin();
        let terms: Vec<&str> = dict
            .colloquial_terms()
            .iter()
            .map(|t| t.term.as_str())
            .collect();
        assert!(terms.contains(&"ahap"));
        assert_eq!(terms.iter().filter(|t| **t == "paused").count(), 1);
    }

    #[test]
    fn matcher_prefers_longer_keys() {
        let dict = Dictionary::builtin();
        let matcher = dict.matcher().unwrap();
        let m = matcher.find("E3MOM 12").unwrap();
        assert_eq!(m.as_str(), "E3MOM");
        let m = matcher.find("RX+ weights").unwrap();
        assert_eq!(m.as_str(), "RX+");
    }
}
