//! LexiconMatcher: known-name matching in plain text
//!
//! Uses Aho-Corasick for O(n) detection of a fixed list of names, e.g. the
//! titles already stored for a campaign. Registered alongside the regex
//! rules, it gives exact recall for names no pattern would recognize
//! ("Vex", "Hollowmere").

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::collections::HashSet;

use crate::error::MatcherError;
use crate::scanner::matcher::{MatchSpan, Matcher};
use crate::scanner::types::{EntityCategory, GenerationHint};

/// Shorter names produce too many false hits inside prose
const MIN_NAME_LEN: usize = 3;

pub struct LexiconMatcher {
    id: String,
    category: EntityCategory,
    hint: GenerationHint,
    priority: u32,
    automaton: Option<AhoCorasick>,
    /// Canonical name per automaton pattern
    names: Vec<String>,
}

impl LexiconMatcher {
    pub fn new(
        id: &str,
        category: EntityCategory,
        names: &[String],
        priority: u32,
    ) -> Result<Self, MatcherError> {
        let mut seen = HashSet::new();
        let canonical: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| n.len() >= MIN_NAME_LEN)
            .filter(|n| seen.insert(n.to_lowercase()))
            .collect();

        let automaton = if canonical.is_empty() {
            None
        } else {
            let built = AhoCorasickBuilder::new()
                .match_kind(MatchKind::LeftmostLongest)
                .ascii_case_insensitive(true)
                .build(&canonical)
                .map_err(|e| MatcherError::Compile {
                    rule: id.to_string(),
                    message: format!("Failed to build automaton: {}", e),
                })?;
            Some(built)
        };

        Ok(Self {
            id: id.to_string(),
            category,
            hint: category.default_hint(),
            priority,
            automaton,
            names: canonical,
        })
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// Reject hits glued to surrounding word characters ("Vexing" for "Vex")
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    !before.map(is_word).unwrap_or(false) && !after.map(is_word).unwrap_or(false)
}

impl Matcher for LexiconMatcher {
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
        Some(&self.hint)
    }

    fn find(&self, text: &str) -> Result<Vec<MatchSpan>, MatcherError> {
        let Some(automaton) = &self.automaton else {
            return Ok(Vec::new());
        };

        let spans = automaton
            .find_iter(text)
            .filter(|m| on_word_boundary(text, m.start(), m.end()))
            .filter_map(|m| {
                self.names.get(m.pattern().as_usize()).map(|name| MatchSpan {
                    start: m.start(),
                    end: m.end(),
                    name: name.clone(),
                })
            })
            .collect();
        Ok(spans)
    }
}
