//! Matcher capability
//!
//! Every recognizer the scanner runs implements `Matcher`. The regex-backed
//! `PatternDefinition` is the workhorse; structured-text scans and the
//! lexicon matcher plug in through the same trait, so the scanner and
//! deduplicator never care how a span was found.

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::MatcherError;
use crate::scanner::types::{EntityCategory, GenerationHint};

/// Default compiled-size ceiling for a single pattern
pub const DEFAULT_SIZE_LIMIT: usize = 1 << 20;

// =============================================================================
// Tiers
// =============================================================================

/// Priority tiers, most specific first.
///
/// A span is claimed by its most specific interpretation: when two rules
/// cover the same text, the rule in the earlier tier wins deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTier {
    NamedIndividual,
    Establishment,
    Landmark,
    GenericPlace,
    StructuredList,
    LandmarkSection,
    ItemPhrase,
    Organization,
}

impl PatternTier {
    pub const ALL: [PatternTier; 8] = [
        PatternTier::NamedIndividual,
        PatternTier::Establishment,
        PatternTier::Landmark,
        PatternTier::GenericPlace,
        PatternTier::StructuredList,
        PatternTier::LandmarkSection,
        PatternTier::ItemPhrase,
        PatternTier::Organization,
    ];

    /// First priority value of the tier; rules inside a tier count up from here
    pub fn base_priority(&self) -> u32 {
        (*self as u32) * 1000
    }
}

// =============================================================================
// Matcher trait
// =============================================================================

/// One recognized span, before it becomes a `RawCandidate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

pub trait Matcher: Send + Sync {
    /// Stable rule name, used in logs and fault reports
    fn id(&self) -> &str;

    fn category(&self) -> EntityCategory;

    /// Lower runs earlier
    fn priority(&self) -> u32;

    fn hint(&self) -> Option<&GenerationHint>;

    /// Non-overlapping spans of this rule, left to right.
    fn find(&self, text: &str) -> Result<Vec<MatchSpan>, MatcherError>;
}

/// A rule that failed to compile or to run; skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFault {
    pub rule: String,
    pub message: String,
}

impl From<&MatcherError> for PatternFault {
    fn from(err: &MatcherError) -> Self {
        let rule = match err {
            MatcherError::Compile { rule, .. } | MatcherError::Runtime { rule, .. } => rule.clone(),
        };
        Self {
            rule,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Name extraction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameExtractor {
    WholeMatch,
    Group(usize),
    /// Capture group (0 = whole match) with a leading article removed
    WithoutArticle(usize),
}

/// A name pulled out of one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedName {
    pub name: String,
    /// Where the kept part of the match begins, when leading words were skipped
    pub start: Option<usize>,
}

impl NameExtractor {
    fn group(&self) -> usize {
        match *self {
            NameExtractor::WholeMatch => 0,
            NameExtractor::Group(g) | NameExtractor::WithoutArticle(g) => g,
        }
    }

    pub fn extract(&self, caps: &Captures<'_>) -> Option<String> {
        self.locate(caps, &HashSet::new()).map(|found| found.name)
    }

    /// Extract the name, first dropping leading words found in `non_names`
    /// (lower-cased). A match left with a single word after skipping is
    /// rejected: only the head noun remains.
    pub fn locate(&self, caps: &Captures<'_>, non_names: &HashSet<String>) -> Option<ExtractedName> {
        let source = caps.get(self.group()).or_else(|| caps.get(0))?;
        let raw = source.as_str();
        let strip = matches!(self, NameExtractor::WithoutArticle(_));

        let skip = leading_non_names(raw, non_names);
        let kept = &raw[skip..];
        if skip > 0 && kept.split_whitespace().count() < 2 {
            return None;
        }

        let mut name = normalize_name(kept);
        if strip {
            name = strip_article(&name).to_string();
        }
        if name.is_empty() {
            return None;
        }
        Some(ExtractedName {
            name,
            start: (skip > 0).then(|| source.start() + skip),
        })
    }
}

/// Byte length of the run of leading words that are in `non_names`
fn leading_non_names(raw: &str, non_names: &HashSet<String>) -> usize {
    if non_names.is_empty() {
        return 0;
    }
    let mut offset = 0;
    loop {
        let rest = &raw[offset..];
        let word_start = rest.len() - rest.trim_start().len();
        let word = rest[word_start..].split_whitespace().next().unwrap_or("");
        if word.is_empty() || !non_names.contains(&word.to_lowercase()) {
            return offset + word_start;
        }
        offset += word_start + word.len();
    }
}

/// Collapse internal whitespace, trim surrounding punctuation and drop a
/// trailing possessive ("Varric's" -> "Varric")
pub fn normalize_name(raw: &str) -> String {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed =
        joined.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | '"' | '*'));
    let base = ["'s", "\u{2019}s", "'", "\u{2019}"]
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed);
    base.to_string()
}

pub fn strip_article(name: &str) -> &str {
    for article in ["the ", "The ", "THE "] {
        if let Some(rest) = name.strip_prefix(article) {
            return rest.trim_start();
        }
    }
    name
}

// =============================================================================
// Regex-backed matcher
// =============================================================================

/// A textual recognizer rule: regex + name extractor + category + hint.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    id: String,
    regex: Regex,
    extractor: NameExtractor,
    category: EntityCategory,
    hint: Option<GenerationHint>,
    priority: u32,
    /// Leading words that never start a name ("Then", "Beyond")
    non_names: Arc<HashSet<String>>,
}

impl PatternDefinition {
    pub fn new(
        id: &str,
        pattern: &str,
        extractor: NameExtractor,
        category: EntityCategory,
        hint: Option<GenerationHint>,
    ) -> Result<Self, MatcherError> {
        Self::with_size_limit(id, pattern, extractor, category, hint, DEFAULT_SIZE_LIMIT)
    }

    pub fn with_size_limit(
        id: &str,
        pattern: &str,
        extractor: NameExtractor,
        category: EntityCategory,
        hint: Option<GenerationHint>,
        size_limit: usize,
    ) -> Result<Self, MatcherError> {
        let regex = RegexBuilder::new(pattern)
            .size_limit(size_limit)
            .build()
            .map_err(|e| MatcherError::Compile {
                rule: id.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            id: id.to_string(),
            regex,
            extractor,
            category,
            hint,
            priority: 0,
            non_names: Arc::default(),
        })
    }

    pub fn at_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Lower-cased words skipped at the start of an extracted name
    pub fn skipping(mut self, non_names: Arc<HashSet<String>>) -> Self {
        self.non_names = non_names;
        self
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for PatternDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> EntityCategory {
        self.category
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn hint(&self) -> Option<&GenerationHint> {
        self.hint.as_ref()
    }

    fn find(&self, text: &str) -> Result<Vec<MatchSpan>, MatcherError> {
        let mut spans = Vec::new();
        for caps in self.regex.captures_iter(text) {
            let Some(full) = caps.get(0) else { continue };
            if full.is_empty() {
                continue;
            }
            if let Some(found) = self.extractor.locate(&caps, &self.non_names) {
                spans.push(MatchSpan {
                    start: found.start.unwrap_or(full.start()),
                    end: full.end(),
                    name: found.name,
                });
            }
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupation_rule() -> PatternDefinition {
        PatternDefinition::new(
            "npc.occupation",
            r"\b([A-Z][a-z]+) the (guard|smith)\b",
            NameExtractor::Group(1),
            EntityCategory::Character,
            Some(GenerationHint::new("npc")),
        )
        .unwrap()
    }

    #[test]
    fn test_group_extraction_keeps_full_span() {
        let spans = occupation_rule().find("Ask Gareth the guard.").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Gareth");
        assert_eq!((spans[0].start, spans[0].end), (4, 20));
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let spans = occupation_rule()
            .find("Gareth the guard and Tom the smith")
            .unwrap();
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_without_article() {
        let rule = PatternDefinition::new(
            "inn",
            r"(?i:the)[ \t]+[A-Z][a-z]+ Inn",
            NameExtractor::WithoutArticle(0),
            EntityCategory::Place,
            None,
        )
        .unwrap();
        let spans = rule.find("We slept at The Crooked Inn").unwrap();
        assert_eq!(spans[0].name, "Crooked Inn");
    }

    #[test]
    fn test_invalid_pattern_is_compile_error() {
        let err = PatternDefinition::new(
            "broken",
            r"([A-Z",
            NameExtractor::WholeMatch,
            EntityCategory::Item,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MatcherError::Compile { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_oversized_pattern_is_rejected() {
        let err = PatternDefinition::with_size_limit(
            "huge",
            r"\w{200}[A-Z]{50}",
            NameExtractor::WholeMatch,
            EntityCategory::Item,
            None,
            1024,
        )
        .unwrap_err();
        assert!(matches!(err, MatcherError::Compile { .. }));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Old\n  Mill. "), "Old Mill");
        assert_eq!(strip_article("The Gilded Goose"), "Gilded Goose");
        assert_eq!(strip_article("Theodric"), "Theodric");
        assert_eq!(normalize_name("Lord Varric's"), "Lord Varric");
        assert_eq!(normalize_name("Mirelle\u{2019}s"), "Mirelle");
        assert_eq!(normalize_name("O'Rourke"), "O'Rourke");
    }

    #[test]
    fn test_skipped_leading_words_move_the_span() {
        let non_names: HashSet<String> = ["beyond", "then"].iter().map(|s| s.to_string()).collect();
        let rule = PatternDefinition::new(
            "keep",
            r"((?:[A-Z][a-z]+ ){1,3}Keep)",
            NameExtractor::Group(1),
            EntityCategory::Place,
            None,
        )
        .unwrap()
        .skipping(Arc::new(non_names));

        let spans = rule.find("Beyond Old Keep").unwrap();
        assert_eq!(spans[0].name, "Old Keep");
        assert_eq!((spans[0].start, spans[0].end), (7, 15));

        assert!(rule.find("Then Keep").unwrap().is_empty());
    }

    #[test]
    fn test_tier_priorities_ascend() {
        let bases: Vec<u32> = PatternTier::ALL.iter().map(|t| t.base_priority()).collect();
        assert!(bases.windows(2).all(|w| w[0] < w[1]));
    }
}
