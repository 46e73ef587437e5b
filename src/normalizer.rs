//! Text normalization for company-name matching.
//!
//! Raw text (filenames, path segments, configured aliases) is canonicalized
//! into a comparable token form: lowercased, diacritics stripped, corporate
//! legal forms collapsed to a canonical spelling, separators and punctuation
//! replaced by single spaces. The same normalizer also generates automatic
//! aliases for a company name.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Corporate legal forms mapped to a canonical spelling.
///
/// Longer variants must be replaced before their prefixes, so the alternation
/// built from this table is sorted by length at compile time of the pattern.
const COMPANY_FORMS: &[(&str, &str)] = &[
    // Italian
    ("s.p.a.", "spa"),
    ("s.p.a", "spa"),
    ("spa", "spa"),
    ("s.r.l.", "srl"),
    ("s.r.l", "srl"),
    ("srl", "srl"),
    ("s.a.s.", "sas"),
    ("s.a.s", "sas"),
    ("sas", "sas"),
    ("s.n.c.", "snc"),
    ("s.n.c", "snc"),
    ("snc", "snc"),
    ("s.s.", "ss"),
    ("s.s", "ss"),
    ("ss", "ss"),
    // International
    ("ltd.", "ltd"),
    ("ltd", "ltd"),
    ("limited", "ltd"),
    ("inc.", "inc"),
    ("inc", "inc"),
    ("incorporated", "inc"),
    ("corp.", "corp"),
    ("corp", "corp"),
    ("corporation", "corp"),
    ("llc", "llc"),
    ("l.l.c.", "llc"),
    ("l.l.c", "llc"),
    ("gmbh", "gmbh"),
    ("g.m.b.h.", "gmbh"),
    ("ag", "ag"),
    ("a.g.", "ag"),
    ("sa", "sa"),
    ("s.a.", "sa"),
    ("sarl", "sarl"),
    ("s.a.r.l.", "sarl"),
    ("bv", "bv"),
    ("b.v.", "bv"),
    ("nv", "nv"),
    ("n.v.", "nv"),
];

/// Filler words that carry little identity and are dropped when generating
/// reduced aliases for a company name.
const COMMON_WORDS: &[&str] = &[
    "company",
    "co",
    "group",
    "gruppo",
    "holding",
    "international",
    "internazionale",
    "global",
    "worldwide",
    "enterprise",
    "enterprises",
    "business",
    "services",
    "servizi",
    "solutions",
    "soluzioni",
    "consulting",
    "consulenza",
    "technology",
    "tecnologia",
    "tech",
    "systems",
    "sistemi",
    "software",
    "hardware",
    "digital",
    "innovation",
    "innovazione",
    "development",
    "sviluppo",
];

/// Default generic words: tokens too common to identify a company on their
/// own. The configuration may extend this list; see `ProfileStore`.
pub const DEFAULT_GENERIC_WORDS: &[&str] = &[
    "area", "zone", "zona", "region", "regione", "city", "citta", "town", "place", "posto",
    "location", "posizione", "site", "sito", "page", "pagina", "file", "document", "documento",
    "report", "rapporto", "data", "dati", "info", "information", "informazione", "detail",
    "dettaglio", "item", "elemento", "component", "componente", "module", "modulo", "lib",
    "library", "libreria", "util", "utils", "utility", "helper", "support", "supporto", "test",
    "demo", "example", "esempio", "sample", "campione", "template", "modello", "base", "core",
    "main", "index", "home", "root", "src", "source", "dist", "build", "node", "modules",
    "assets", "static", "public", "private", "config", "configurazione", "setting",
    "impostazione", "option", "opzione",
];

/// A canonicalized text fragment ready for fuzzy comparison.
///
/// Produced only by [`Normalizer::normalize`]; derivation is deterministic
/// and idempotent, so two `NormalizedText` values compare meaningfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace-separated tokens of the normalized form.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.tokens().any(|t| t == token)
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes company names and filename fragments for fuzzy matching.
///
/// Compiles its regex patterns once; cheap to share by reference afterwards
/// and never mutated, so it is safe to use from multiple threads.
#[derive(Debug)]
pub struct Normalizer {
    special_chars: Regex,
    multiple_spaces: Regex,
    company_forms: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        // Longest forms first so "s.p.a." wins over "s.p.a" and "spa".
        let mut forms: Vec<&str> = COMPANY_FORMS.iter().map(|(raw, _)| *raw).collect();
        forms.sort_by_key(|f| std::cmp::Reverse(f.len()));
        let alternation = forms
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            // Underscores are listed explicitly: \w treats them as word
            // characters, but in filenames they separate words.
            special_chars: Regex::new(r"[^\w\s]|_").expect("invalid special-chars pattern"),
            multiple_spaces: Regex::new(r"\s+").expect("invalid whitespace pattern"),
            company_forms: Regex::new(&format!(r"\b({alternation})\b"))
                .expect("invalid company-forms pattern"),
        }
    }

    /// Canonicalizes a raw text fragment.
    ///
    /// Lowercases, strips diacritics (NFD decomposition, combining marks
    /// removed), canonicalizes corporate legal forms, replaces separators
    /// and punctuation with spaces, collapses whitespace and trims.
    /// Idempotent; any input (including empty) produces a valid output.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        if text.is_empty() {
            return NormalizedText(String::new());
        }

        let lowered = text.to_lowercase();
        let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
        // Underscores become spaces before the legal-form pass so that \b
        // anchors fire around forms like "corp" in "acme_corp".
        let separated = stripped.replace('_', " ");

        let canonical = self
            .company_forms
            .replace_all(&separated, |caps: &regex::Captures<'_>| {
                let form = caps[1].to_string();
                COMPANY_FORMS
                    .iter()
                    .find(|(raw, _)| *raw == form)
                    .map(|(_, canon)| (*canon).to_string())
                    .unwrap_or(form)
            });

        let spaced = self.special_chars.replace_all(&canonical, " ");
        let collapsed = self.multiple_spaces.replace_all(&spaced, " ");

        NormalizedText(collapsed.trim().to_string())
    }

    /// Generates automatic aliases for a company name: the normalized name,
    /// the name without legal forms, without filler words, both removals
    /// combined, and a multi-word acronym. Duplicates and empties dropped.
    pub fn generate_aliases(&self, company_name: &str) -> Vec<String> {
        let normalized = self.normalize(company_name).0;

        let mut aliases: Vec<String> = vec![normalized.clone()];
        let without_forms = self.remove_company_forms(&normalized);
        if without_forms != normalized {
            aliases.push(without_forms.clone());
        }
        let without_common = self.remove_common_words(&normalized);
        if without_common != normalized {
            aliases.push(without_common);
        }
        let without_both = self.remove_common_words(&without_forms);
        if !aliases.contains(&without_both) {
            aliases.push(without_both);
        }

        let words: Vec<&str> = normalized.split_whitespace().collect();
        if words.len() > 1 {
            let acronym: String = words.iter().filter_map(|w| w.chars().next()).collect();
            // Two-letter acronyms appear as substrings of too many unrelated
            // words to be usable as aliases.
            if acronym.chars().count() > 2 {
                aliases.push(acronym);
            }
        }

        let mut seen = std::collections::HashSet::new();
        aliases
            .into_iter()
            .filter(|a| !a.trim().is_empty() && seen.insert(a.clone()))
            .collect()
    }

    fn remove_company_forms(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|word| !COMPANY_FORMS.iter().any(|(_, canon)| canon == word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn remove_common_words(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|word| !COMMON_WORDS.contains(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("  ACME Corp.  ").as_str(), "acme corp");
    }

    #[test]
    fn test_normalize_case_and_diacritic_insensitive() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("ACME Corp."), n.normalize("acme corp"));
        assert_eq!(n.normalize("Società Générale").as_str(), "societa generale");
    }

    #[test]
    fn test_normalize_idempotent() {
        let n = Normalizer::new();
        for raw in ["Area Finanza S.p.A.", "ACME-Corp_2024", "", "  à  è  "] {
            let once = n.normalize(raw);
            let twice = n.normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_normalize_company_forms() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("Area Finanza S.p.A.").as_str(), "area finanza spa");
        assert_eq!(n.normalize("Acme Limited").as_str(), "acme ltd");
        assert_eq!(n.normalize("Acme Incorporated").as_str(), "acme inc");
    }

    #[test]
    fn test_normalize_collapses_separators() {
        let n = Normalizer::new();
        assert_eq!(
            n.normalize("fattura__acme--2024 .pdf").as_str(),
            "fattura acme 2024 pdf"
        );
    }

    #[test]
    fn test_normalize_underscores_split_tokens() {
        let n = Normalizer::new();
        let t = n.normalize("area_report_finanza");
        assert_eq!(t.tokens().collect::<Vec<_>>(), vec!["area", "report", "finanza"]);
        assert_eq!(n.normalize("acme_corporation").as_str(), "acme corp");
    }

    #[test]
    fn test_normalize_empty_input() {
        let n = Normalizer::new();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("!!!").is_empty());
    }

    #[test]
    fn test_tokens_and_contains_token() {
        let n = Normalizer::new();
        let t = n.normalize("Area Finanza Spa");
        assert_eq!(t.tokens().collect::<Vec<_>>(), vec!["area", "finanza", "spa"]);
        assert!(t.contains_token("finanza"));
        assert!(!t.contains_token("fin"));
    }

    #[test]
    fn test_generate_aliases_includes_reduced_forms() {
        let n = Normalizer::new();
        let aliases = n.generate_aliases("Area Finanza S.p.A.");
        assert!(aliases.contains(&"area finanza spa".to_string()));
        assert!(aliases.contains(&"area finanza".to_string()));
        assert!(aliases.contains(&"afs".to_string()));
    }

    #[test]
    fn test_generate_aliases_drops_duplicates_and_empties() {
        let n = Normalizer::new();
        let aliases = n.generate_aliases("Acme");
        assert_eq!(aliases, vec!["acme".to_string()]);
    }

    #[test]
    fn test_generate_aliases_skips_short_acronyms() {
        let n = Normalizer::new();
        let aliases = n.generate_aliases("ACME Corporation");
        assert!(!aliases.contains(&"ac".to_string()), "aliases: {aliases:?}");
    }

}
