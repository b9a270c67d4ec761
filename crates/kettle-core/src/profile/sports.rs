//! Embedded sport library.
//!
//! Sports are defined in `sports.toml` and embedded at compile time. Lookups
//! accept direct names, aliases and partial names ("amateur boxing").

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;

/// Training context for one sport.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SportProfile {
    pub display_name: String,
    /// Competition sports ask the generator for every priority exercise, not
    /// just one.
    #[serde(default)]
    pub competition: bool,
    pub focus: String,
    /// snake_case exercise identifiers, e.g. `heavy_bag_work`.
    pub priority_exercises: Vec<String>,
    #[serde(default)]
    pub mobility: Vec<String>,
    #[serde(default)]
    pub conditioning: String,
    #[serde(default)]
    pub avoid: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SportProfile {
    /// Priority exercises as readable names ("heavy bag work").
    pub fn priority_names(&self) -> impl Iterator<Item = String> + '_ {
        self.priority_exercises.iter().map(|id| id.replace('_', " "))
    }
}

#[derive(Debug, Deserialize)]
struct SportLibrary {
    sports: BTreeMap<String, SportProfile>,
}

static SPORTS_TOML: &str = include_str!("sports.toml");

static SPORTS: LazyLock<BTreeMap<String, SportProfile>> = LazyLock::new(|| {
    toml::from_str::<SportLibrary>(SPORTS_TOML)
        .expect("embedded sports.toml is invalid")
        .sports
});

/// All sports keyed by identifier.
///
/// # Panics
///
/// Panics on first use if the embedded TOML is malformed.
pub fn sports() -> &'static BTreeMap<String, SportProfile> {
    &SPORTS
}

/// Resolve a sport by identifier, display name, alias or partial name.
pub fn sport_profile(name: &str) -> Option<&'static SportProfile> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let as_key = wanted.replace([' ', '-'], "_");
    let library = sports();

    if let Some(profile) = library.get(&as_key) {
        return Some(profile);
    }
    if let Some(profile) = library.values().find(|p| {
        p.display_name.to_lowercase() == wanted || p.aliases.iter().any(|a| *a == wanted)
    }) {
        return Some(profile);
    }
    // Very short fragments ("ma") would match almost anything.
    const MIN_FRAGMENT: usize = 4;
    library
        .iter()
        .find(|(key, _)| {
            as_key.contains(key.as_str())
                || (as_key.len() >= MIN_FRAGMENT && key.contains(as_key.as_str()))
        })
        .map(|(_, profile)| profile)
}
