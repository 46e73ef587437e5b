//! Company recognition over filesystem paths.
//!
//! The matcher combines the normalizer, the profile store and the fuzzy
//! scorer: for every configured profile it scores the best alias against the
//! filename and against the containing path segments, applies the profile's
//! keyword rules and the global bonus/penalty, and then picks a single
//! deterministic winner. Pure computation: given the same path and the same
//! store snapshot the decision is always identical, so it may be called
//! concurrently without locking.

use std::path::{Component, Path};

use crate::normalizer::NormalizedText;
use crate::profile::ProfileStore;
use crate::scorer;

/// Where the winning alias was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    /// Match occurred in the filename itself.
    Filename,
    /// Match occurred only in the containing directories.
    PathOnly,
}

/// Per-profile scoring outcome for one path; transient.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Index into the store's profile list (declaration order).
    pub profile_index: usize,
    pub company: String,
    pub field: MatchField,
    /// Best raw similarity before bonus/penalty and rule filtering.
    pub raw: u8,
    /// Score after keyword rules, bonus/penalty and clamping; 0 means the
    /// profile did not match at all.
    pub adjusted: u8,
}

/// Terminal output of the matcher for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecision {
    /// Winning company name, or `None` when no profile survived filtering.
    pub company: Option<String>,
    /// Adjusted score of the winner, or the best raw (pre-filter) score for
    /// diagnostics when unrecognized.
    pub confidence: u8,
    pub field: Option<MatchField>,
}

impl MatchDecision {
    pub fn is_recognized(&self) -> bool {
        self.company.is_some()
    }

    /// Display label, substituting the fallback bucket name.
    pub fn company_label(&self) -> &str {
        self.company.as_deref().unwrap_or("Unrecognized")
    }
}

/// Matches paths against an immutable [`ProfileStore`] snapshot.
pub struct CompanyMatcher<'a> {
    store: &'a ProfileStore,
}

impl<'a> CompanyMatcher<'a> {
    pub fn new(store: &'a ProfileStore) -> Self {
        Self { store }
    }

    /// Scores every profile against `path`, one candidate per profile in
    /// declaration order. Never fails: a profile that does not match emits a
    /// candidate with adjusted score 0.
    pub fn candidates(&self, path: &Path) -> Vec<MatchCandidate> {
        let normalizer = self.store.normalizer();
        let settings = self.store.settings();

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename_text = normalizer.normalize(&stem);

        let parent_segments: Vec<String> = path
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(seg) => Some(seg.to_string_lossy().to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let path_text = normalizer.normalize(&parent_segments.join(" "));

        self.store
            .profiles()
            .iter()
            .enumerate()
            .map(|(index, profile)| {
                let filename_field = self.score_field(index, &filename_text);
                let path_field = self.score_field(index, &path_text);

                let adjusted_filename = filename_field
                    .valid
                    .then(|| clamp_add(filename_field.raw, settings.filename_bonus))
                    .unwrap_or(0);
                let adjusted_path = path_field
                    .valid
                    .then(|| clamp_sub(path_field.raw, settings.path_penalty))
                    .unwrap_or(0);

                // Prefer the filename field on equal adjusted scores.
                let (field, raw, adjusted) = if adjusted_filename >= adjusted_path
                    && filename_field.valid
                    && adjusted_filename > 0
                {
                    (MatchField::Filename, filename_field.raw, adjusted_filename)
                } else if path_field.valid && adjusted_path > 0 {
                    (MatchField::PathOnly, path_field.raw, adjusted_path)
                } else {
                    // No valid field: keep the best raw score for diagnostics.
                    (
                        MatchField::Filename,
                        filename_field.raw.max(path_field.raw),
                        0,
                    )
                };

                MatchCandidate {
                    profile_index: index,
                    company: profile.name.clone(),
                    field,
                    raw,
                    adjusted,
                }
            })
            .collect()
    }

    /// Full decision for one path: candidates, threshold filtering and
    /// deterministic tie-breaking.
    pub fn match_path(&self, path: &Path) -> MatchDecision {
        self.decide(self.candidates(path))
    }

    /// Picks the winner among candidates: highest adjusted score at or above
    /// the profile's threshold; ties prefer a filename-field match over a
    /// path-only match, then earlier declaration order.
    pub fn decide(&self, candidates: Vec<MatchCandidate>) -> MatchDecision {
        let best_raw = candidates.iter().map(|c| c.raw).max().unwrap_or(0);

        let mut winner: Option<&MatchCandidate> = None;
        for candidate in &candidates {
            if candidate.adjusted < self.store.threshold(candidate.profile_index)
                || candidate.adjusted == 0
            {
                continue;
            }
            let beats = match winner {
                None => true,
                Some(current) => {
                    candidate.adjusted > current.adjusted
                        || (candidate.adjusted == current.adjusted
                            && candidate.field == MatchField::Filename
                            && current.field == MatchField::PathOnly)
                }
            };
            if beats {
                winner = Some(candidate);
            }
        }

        match winner {
            Some(candidate) => MatchDecision {
                company: Some(candidate.company.clone()),
                confidence: candidate.adjusted,
                field: Some(candidate.field),
            },
            None => MatchDecision {
                company: None,
                confidence: best_raw,
                field: None,
            },
        }
    }

    /// Best alias score for one profile within one text field, with the
    /// profile's keyword rules applied.
    fn score_field(&self, profile_index: usize, text: &NormalizedText) -> FieldScore {
        let profile = &self.store.profiles()[profile_index];

        let mut best_raw = 0u8;
        let mut best_alias: Option<&NormalizedText> = None;
        for alias in self.store.aliases(profile_index) {
            let raw = scorer::alias_score(text, alias);
            if raw > best_raw {
                best_raw = raw;
                best_alias = Some(alias);
            }
        }

        let Some(alias) = best_alias else {
            return FieldScore {
                raw: 0,
                valid: false,
            };
        };

        // Required keywords: at least one must appear as a token of the
        // matched text, regardless of the raw fuzzy score.
        if !profile.required_keywords.is_empty()
            && !profile
                .required_keywords
                .iter()
                .any(|kw| text.contains_token(kw))
        {
            return FieldScore {
                raw: best_raw,
                valid: false,
            };
        }

        // Standalone-word suppression: when every token shared between the
        // text and the winning alias is either excluded-standalone or
        // generic, the overlap carries no company identity.
        let overlap: Vec<&str> = text
            .tokens()
            .filter(|t| alias.contains_token(t))
            .collect();
        if !overlap.is_empty()
            && overlap
                .iter()
                .all(|t| profile.excluded_standalone.contains(*t) || self.store.is_generic(t))
        {
            return FieldScore {
                raw: best_raw,
                valid: false,
            };
        }

        FieldScore {
            raw: best_raw,
            valid: best_raw > 0,
        }
    }
}

struct FieldScore {
    raw: u8,
    valid: bool,
}

fn clamp_add(score: u8, bonus: u8) -> u8 {
    score.saturating_add(bonus).min(100)
}

fn clamp_sub(score: u8, penalty: u8) -> u8 {
    score.saturating_sub(penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CompanyProfile, MatchSettings, ProfileStore};
    use std::path::PathBuf;

    fn store(profiles: Vec<CompanyProfile>) -> ProfileStore {
        ProfileStore::new(profiles, &[], MatchSettings::default()).unwrap()
    }

    fn acme() -> CompanyProfile {
        CompanyProfile::new("ACME Corporation")
            .with_aliases(vec!["acme".to_string()])
            .with_threshold(85)
    }

    fn area_finanza() -> CompanyProfile {
        CompanyProfile::new("Area Finanza Spa")
            .with_aliases(vec![
                "Area Finanza".to_string(),
                "AreaFinanza".to_string(),
            ])
            .with_required_keywords(vec!["finanza".to_string()])
            .with_excluded_standalone(vec![
                "area".to_string(),
                "spa".to_string(),
                "s.p.a".to_string(),
            ])
    }

    #[test]
    fn test_filename_match_end_to_end() {
        let store = store(vec![acme()]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/fattura_acme_2024.pdf"));
        assert_eq!(decision.company.as_deref(), Some("ACME Corporation"));
        assert!(decision.confidence >= 85, "confidence {}", decision.confidence);
        assert_eq!(decision.field, Some(MatchField::Filename));
    }

    #[test]
    fn test_required_keyword_absent_means_unrecognized() {
        let store = store(vec![area_finanza()]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/area_notes.txt"));
        assert!(!decision.is_recognized());
        assert_eq!(decision.company_label(), "Unrecognized");
    }

    #[test]
    fn test_required_keyword_present_matches() {
        let store = store(vec![area_finanza()]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/report_area_finanza_2023.pdf"));
        assert_eq!(decision.company.as_deref(), Some("Area Finanza Spa"));
        assert_eq!(decision.field, Some(MatchField::Filename));
    }

    #[test]
    fn test_excluded_standalone_word_scores_zero() {
        let store = store(vec![
            CompanyProfile::new("Area Finanza Spa")
                .with_aliases(vec!["Area Finanza".to_string()])
                .with_excluded_standalone(vec!["area".to_string(), "spa".to_string()]),
        ]);
        let matcher = CompanyMatcher::new(&store);

        let candidates = matcher.candidates(Path::new("area_report.pdf"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].adjusted, 0);
    }

    #[test]
    fn test_path_only_match_gets_penalty_and_field() {
        let store = store(vec![CompanyProfile::new("Acme")
            .with_aliases(vec!["acme".to_string()])
            .with_threshold(80)]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/archive/acme/scan_0001.pdf"));
        assert_eq!(decision.company.as_deref(), Some("Acme"));
        assert_eq!(decision.field, Some(MatchField::PathOnly));
        // 100 raw, minus the default path penalty.
        assert_eq!(decision.confidence, 90);
    }

    #[test]
    fn test_filename_bonus_beats_path_only_for_equal_raw() {
        let store = store(vec![
            CompanyProfile::new("Acme").with_aliases(vec!["acme".to_string()]),
            CompanyProfile::new("Globex").with_aliases(vec!["globex".to_string()]),
        ]);
        let matcher = CompanyMatcher::new(&store);

        let candidates = matcher.candidates(Path::new("/globex/acme.pdf"));
        let acme = &candidates[0];
        let globex = &candidates[1];
        assert_eq!(acme.field, MatchField::Filename);
        assert_eq!(globex.field, MatchField::PathOnly);
        assert_eq!(acme.raw, globex.raw);
        assert!(acme.adjusted > globex.adjusted);
    }

    #[test]
    fn test_tie_prefers_filename_field() {
        let store = store(vec![
            CompanyProfile::new("First").with_threshold(50),
            CompanyProfile::new("Second").with_threshold(50),
        ]);
        let matcher = CompanyMatcher::new(&store);

        let candidates = vec![
            MatchCandidate {
                profile_index: 0,
                company: "First".to_string(),
                field: MatchField::PathOnly,
                raw: 90,
                adjusted: 80,
            },
            MatchCandidate {
                profile_index: 1,
                company: "Second".to_string(),
                field: MatchField::Filename,
                raw: 70,
                adjusted: 80,
            },
        ];
        let decision = matcher.decide(candidates);
        assert_eq!(decision.company.as_deref(), Some("Second"));
    }

    #[test]
    fn test_full_tie_prefers_declaration_order() {
        let store = store(vec![
            CompanyProfile::new("Acme North")
                .with_aliases(vec!["acme".to_string()])
                .with_threshold(85),
            CompanyProfile::new("Acme South")
                .with_aliases(vec!["acme".to_string()])
                .with_threshold(85),
        ]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/acme.pdf"));
        assert_eq!(decision.company.as_deref(), Some("Acme North"));
    }

    #[test]
    fn test_unrecognized_reports_best_raw_score() {
        let store = store(vec![area_finanza()]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/area_notes.txt"));
        assert!(!decision.is_recognized());
        // Diagnostic confidence comes from the raw pre-filter score, which
        // is nonzero because "area" overlaps an alias.
        assert!(decision.confidence > 0);
    }

    #[test]
    fn test_profile_without_aliases_uses_name() {
        let store = store(vec![CompanyProfile::new("Globex").with_threshold(85)]);
        let matcher = CompanyMatcher::new(&store);

        let decision = matcher.match_path(Path::new("/docs/globex_invoice.pdf"));
        assert_eq!(decision.company.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_same_input_same_decision() {
        let store = store(vec![acme(), area_finanza()]);
        let matcher = CompanyMatcher::new(&store);
        let path = PathBuf::from("/docs/fattura_acme_2024.pdf");

        let first = matcher.match_path(&path);
        for _ in 0..10 {
            assert_eq!(matcher.match_path(&path), first);
        }
    }
}
