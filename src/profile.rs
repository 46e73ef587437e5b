//! In-memory company profiles and global matching settings.
//!
//! A [`ProfileStore`] is built once from configuration, validated up front,
//! and never mutated afterwards: matching reads it through a shared
//! reference, so the matcher stays pure and safe to call from multiple
//! threads. Reconfiguration means building a new store, never editing one
//! in place.

use std::collections::HashSet;

use crate::config::ConfigError;
use crate::normalizer::{DEFAULT_GENERIC_WORDS, NormalizedText, Normalizer};

/// Configuration entry for one company.
#[derive(Debug, Clone)]
pub struct CompanyProfile {
    /// Canonical display name; unique, never empty.
    pub name: String,
    /// Alternate raw name strings; may be empty (the name itself always
    /// serves as an implicit alias).
    pub aliases: Vec<String>,
    /// Normalized tokens of which at least one must appear in the matched
    /// text for a match to count. Empty set disables the rule.
    pub required_keywords: HashSet<String>,
    /// Normalized tokens that must not carry a match on their own.
    pub excluded_standalone: HashSet<String>,
    /// Per-company minimum adjusted score; `None` falls back to the global
    /// default threshold.
    pub threshold: Option<u8>,
}

impl CompanyProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required_keywords: HashSet::new(),
            excluded_standalone: HashSet::new(),
            threshold: None,
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_required_keywords<I: IntoIterator<Item = String>>(mut self, keywords: I) -> Self {
        self.required_keywords = keywords.into_iter().collect();
        self
    }

    pub fn with_excluded_standalone<I: IntoIterator<Item = String>>(mut self, words: I) -> Self {
        self.excluded_standalone = words.into_iter().collect();
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Global matching knobs shared by every profile.
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    /// Minimum adjusted score for profiles without their own threshold.
    pub default_threshold: u8,
    /// Points added when the best match occurred in the filename.
    pub filename_bonus: u8,
    /// Points subtracted when the match occurred only in path segments.
    pub path_penalty: u8,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            default_threshold: 92,
            filename_bonus: 15,
            path_penalty: 10,
        }
    }
}

/// Immutable snapshot of all configured profiles, their precomputed
/// normalized aliases, the generic-word set and the global settings.
#[derive(Debug)]
pub struct ProfileStore {
    profiles: Vec<CompanyProfile>,
    /// Normalized alias lists, index-aligned with `profiles`. Each list
    /// contains the configured aliases, the automatically generated ones and
    /// the normalized name itself, deduplicated.
    alias_index: Vec<Vec<NormalizedText>>,
    generic_words: HashSet<String>,
    settings: MatchSettings,
    normalizer: Normalizer,
}

impl ProfileStore {
    /// Builds and validates a store.
    ///
    /// `extra_generic_words` extends the built-in generic-word list; words
    /// are normalized before insertion. Fails on an empty or duplicate
    /// company name or an out-of-range threshold.
    pub fn new(
        mut profiles: Vec<CompanyProfile>,
        extra_generic_words: &[String],
        settings: MatchSettings,
    ) -> Result<Self, ConfigError> {
        let normalizer = Normalizer::new();

        // Keyword rules compare against normalized tokens, so normalize them
        // once here rather than on every match.
        for profile in &mut profiles {
            profile.required_keywords = normalize_token_set(&normalizer, &profile.required_keywords);
            profile.excluded_standalone =
                normalize_token_set(&normalizer, &profile.excluded_standalone);
        }

        let mut seen_names = HashSet::new();
        for profile in &profiles {
            if profile.name.trim().is_empty() {
                return Err(ConfigError::EmptyCompanyName);
            }
            if !seen_names.insert(profile.name.clone()) {
                return Err(ConfigError::DuplicateCompany(profile.name.clone()));
            }
            if let Some(t) = profile.threshold
                && t > 100
            {
                return Err(ConfigError::ThresholdOutOfRange {
                    company: profile.name.clone(),
                    value: t,
                });
            }
        }

        let alias_index = profiles
            .iter()
            .map(|profile| {
                let mut aliases: Vec<NormalizedText> = Vec::new();
                let mut push = |text: NormalizedText| {
                    if !text.is_empty() && !aliases.contains(&text) {
                        aliases.push(text);
                    }
                };

                push(normalizer.normalize(&profile.name));
                for auto in normalizer.generate_aliases(&profile.name) {
                    push(normalizer.normalize(&auto));
                }
                for alias in &profile.aliases {
                    push(normalizer.normalize(alias));
                }
                aliases
            })
            .collect();

        let mut generic_words: HashSet<String> = DEFAULT_GENERIC_WORDS
            .iter()
            .map(|w| (*w).to_string())
            .collect();
        for word in extra_generic_words {
            let normalized = normalizer.normalize(word);
            if !normalized.is_empty() {
                generic_words.insert(normalized.as_str().to_string());
            }
        }

        Ok(Self {
            profiles,
            alias_index,
            generic_words,
            settings,
            normalizer,
        })
    }

    /// Profiles in declaration order.
    pub fn profiles(&self) -> &[CompanyProfile] {
        &self.profiles
    }

    /// Precomputed normalized aliases for the profile at `index`.
    pub fn aliases(&self, index: usize) -> &[NormalizedText] {
        &self.alias_index[index]
    }

    /// Effective threshold for the profile at `index`.
    pub fn threshold(&self, index: usize) -> u8 {
        self.profiles[index]
            .threshold
            .unwrap_or(self.settings.default_threshold)
    }

    pub fn is_generic(&self, token: &str) -> bool {
        self.generic_words.contains(token)
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn normalize_token_set(normalizer: &Normalizer, words: &HashSet<String>) -> HashSet<String> {
    words
        .iter()
        .map(|w| normalizer.normalize(w).as_str().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(profiles: Vec<CompanyProfile>) -> ProfileStore {
        ProfileStore::new(profiles, &[], MatchSettings::default()).expect("store should build")
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = ProfileStore::new(
            vec![CompanyProfile::new("  ")],
            &[],
            MatchSettings::default(),
        );
        assert!(matches!(result, Err(ConfigError::EmptyCompanyName)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = ProfileStore::new(
            vec![CompanyProfile::new("Acme"), CompanyProfile::new("Acme")],
            &[],
            MatchSettings::default(),
        );
        assert!(matches!(result, Err(ConfigError::DuplicateCompany(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let result = ProfileStore::new(
            vec![CompanyProfile::new("Acme").with_threshold(101)],
            &[],
            MatchSettings::default(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_name_is_implicit_alias() {
        let store = store_with(vec![CompanyProfile::new("Acme Corporation")]);
        let aliases = store.aliases(0);
        assert!(aliases.iter().any(|a| a.as_str() == "acme corp"));
    }

    #[test]
    fn test_configured_and_auto_aliases_merged() {
        let store = store_with(vec![
            CompanyProfile::new("Area Finanza S.p.A.")
                .with_aliases(vec!["AreaFinanza".to_string()]),
        ]);
        let aliases: Vec<&str> = store.aliases(0).iter().map(|a| a.as_str()).collect();
        assert!(aliases.contains(&"area finanza spa"));
        assert!(aliases.contains(&"area finanza"));
        assert!(aliases.contains(&"areafinanza"));
    }

    #[test]
    fn test_threshold_fallback_to_default() {
        let store = store_with(vec![
            CompanyProfile::new("Acme").with_threshold(85),
            CompanyProfile::new("Globex"),
        ]);
        assert_eq!(store.threshold(0), 85);
        assert_eq!(store.threshold(1), MatchSettings::default().default_threshold);
    }

    #[test]
    fn test_generic_words_extended_from_config() {
        let store = ProfileStore::new(
            vec![CompanyProfile::new("Acme")],
            &["Fattura".to_string()],
            MatchSettings::default(),
        )
        .unwrap();
        assert!(store.is_generic("area"));
        assert!(store.is_generic("fattura"));
        assert!(!store.is_generic("acme"));
    }
}
