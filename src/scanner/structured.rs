//! Structured-text scans
//!
//! Generated location write-ups often carry names outside of prose:
//! - short capitalized lines in lists ("Old Mill", "- Whispering Docks")
//! - comma-separated bullets under a "Landmarks:" header
//!
//! Both scans run as ordinary `Matcher`s, slotted into the registry after
//! the regex place patterns and before item/organization patterns.

use regex::Regex;
use std::collections::HashSet;

use crate::error::MatcherError;
use crate::scanner::matcher::{normalize_name, strip_article, MatchSpan, Matcher};
use crate::scanner::types::{EntityCategory, GenerationHint};

/// Lower-case words allowed inside (not at the start of) a list-line name
const CONNECTORS: &[&str] = &["of", "the", "and", "de", "du", "von", "van", "on"];

/// Longest landmark bullet item accepted, in words
const MAX_ITEM_WORDS: usize = 6;

// =============================================================================
// Line iteration
// =============================================================================

/// Lines with their byte offset, line terminators removed
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        (start, line)
    })
}

/// Strip a leading bullet or number marker. Returns (prefix_len, rest).
fn strip_bullet(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();

    for marker in ["- ", "* ", "+ ", "• ", "– "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some((indent + marker.len(), rest));
        }
    }

    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        let after = &trimmed[digits..];
        if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return Some((indent + digits + 2, rest));
        }
    }
    None
}

/// Trim characters matching `pred` from both ends, keeping the offset right
fn trim_span(s: &str, offset: usize, pred: impl Fn(char) -> bool + Copy) -> (usize, &str) {
    let start_trimmed = s.trim_start_matches(pred);
    let lead = s.len() - start_trimmed.len();
    (offset + lead, start_trimmed.trim_end_matches(pred))
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

// =============================================================================
// Structured-list scan
// =============================================================================

/// Treats short, fully capitalized lines as place names.
pub struct StructuredListMatcher {
    stop_words: HashSet<String>,
    min_words: usize,
    max_words: usize,
    priority: u32,
    hint: GenerationHint,
}

impl StructuredListMatcher {
    pub fn new(stop_words: &[String], min_words: usize, max_words: usize, priority: u32) -> Self {
        Self {
            stop_words: stop_words.iter().map(|w| w.to_lowercase()).collect(),
            min_words,
            max_words,
            priority,
            hint: EntityCategory::Place.default_hint(),
        }
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(&word.to_lowercase())
    }

    fn accepts(&self, body: &str) -> bool {
        if body.is_empty() || body.ends_with(':') {
            return false;
        }
        if body.chars().any(|c| matches!(c, '.' | '!' | '?' | ':' | ';' | ',' | '*' | '#' | '(' | ')' | '"')) {
            return false;
        }

        let words: Vec<&str> = body.split_whitespace().collect();
        if words.len() < self.min_words || words.len() > self.max_words {
            return false;
        }
        if self.is_stop_word(words[0]) || self.is_stop_word(body) {
            return false;
        }
        if !is_capitalized(words[0]) || !is_capitalized(words[words.len() - 1]) {
            return false;
        }

        words[1..].iter().all(|w| is_capitalized(w) || CONNECTORS.contains(w))
    }
}

impl Matcher for StructuredListMatcher {
    fn id(&self) -> &str {
        "place.structured_list"
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Place
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn hint(&self) -> Option<&GenerationHint> {
        Some(&self.hint)
    }

    fn find(&self, text: &str) -> Result<Vec<MatchSpan>, MatcherError> {
        let mut spans = Vec::new();

        for (line_start, line) in lines_with_offsets(text) {
            let (prefix, rest) = strip_bullet(line).unwrap_or((0, line));
            let (start, body) = trim_span(rest, line_start + prefix, char::is_whitespace);

            if !self.accepts(body) {
                continue;
            }

            let name = normalize_name(strip_article(body));
            if name.is_empty() {
                continue;
            }
            spans.push(MatchSpan {
                start,
                end: start + body.len(),
                name,
            });
        }

        Ok(spans)
    }
}

// =============================================================================
// Landmark-section scan
// =============================================================================

/// Extracts comma-delimited bullet items from a "Landmarks:" section.
pub struct LandmarkSectionMatcher {
    header_re: Regex,
    priority: u32,
    hint: GenerationHint,
}

impl LandmarkSectionMatcher {
    pub fn new(headers: &[String], priority: u32) -> Result<Self, MatcherError> {
        let alternatives = headers
            .iter()
            .map(|h| regex::escape(h.trim()))
            .filter(|h| !h.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        if alternatives.is_empty() {
            return Err(MatcherError::Compile {
                rule: "place.landmark_section".into(),
                message: "no landmark headers configured".into(),
            });
        }

        // "Landmarks:", "## Landmarks", "**Landmarks:** A, B"
        let header = format!(
            r"^[ \t]*(?:#+[ \t]*)?(?:\*\*|__)?(?i:{alternatives})(?:\*\*|__)?(?:[ \t]*:(?:\*\*|__)?(?P<rest>.*)|[ \t]*$)"
        );
        let header_re = Regex::new(&header).map_err(|e| MatcherError::Compile {
            rule: "place.landmark_section".into(),
            message: e.to_string(),
        })?;

        Ok(Self {
            header_re,
            priority,
            hint: GenerationHint::new("location"),
        })
    }

    /// Split one item line into comma pieces and push the accepted ones
    fn collect_items(&self, body: &str, offset: usize, spans: &mut Vec<MatchSpan>) {
        let mut piece_start = 0;
        for piece in body.split(',') {
            let piece_offset = offset + piece_start;
            piece_start += piece.len() + 1;

            let cut = [" - ", " – ", " — ", ": "]
                .iter()
                .filter_map(|sep| piece.find(sep))
                .min()
                .unwrap_or(piece.len());
            let (start, item) = trim_span(&piece[..cut], piece_offset, |c: char| {
                c.is_whitespace() || matches!(c, '.' | '*' | '_' | ';')
            });

            if item.is_empty() || !is_capitalized(item) {
                continue;
            }
            if item.split_whitespace().count() > MAX_ITEM_WORDS {
                continue;
            }

            let name = normalize_name(strip_article(item));
            if name.is_empty() {
                continue;
            }
            spans.push(MatchSpan {
                start,
                end: start + item.len(),
                name,
            });
        }
    }
}

impl Matcher for LandmarkSectionMatcher {
    fn id(&self) -> &str {
        "place.landmark_section"
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Place
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn hint(&self) -> Option<&GenerationHint> {
        Some(&self.hint)
    }

    fn find(&self, text: &str) -> Result<Vec<MatchSpan>, MatcherError> {
        let mut spans = Vec::new();
        let mut in_section = false;

        for (line_start, line) in lines_with_offsets(text) {
            if let Some(caps) = self.header_re.captures(line) {
                in_section = true;
                if let Some(rest) = caps.name("rest") {
                    self.collect_items(rest.as_str(), line_start + rest.start(), &mut spans);
                }
                continue;
            }

            if !in_section {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            match strip_bullet(line) {
                Some((prefix, rest)) => self.collect_items(rest, line_start + prefix, &mut spans),
                // Any other label or prose closes the section
                None => in_section = false,
            }
        }

        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn list_matcher() -> StructuredListMatcher {
        let config = EngineConfig::default();
        StructuredListMatcher::new(&config.stop_words, 2, 4, 0)
    }

    fn section_matcher() -> LandmarkSectionMatcher {
        LandmarkSectionMatcher::new(&["Landmarks".to_string()], 0).unwrap()
    }

    fn names(spans: &[MatchSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_list_line_is_place() {
        let text = "Nearby:\n- Whispering Docks\nOld Mill\n";
        let spans = list_matcher().find(text).unwrap();
        assert_eq!(names(&spans), vec!["Whispering Docks", "Old Mill"]);
        assert_eq!(&text[spans[0].start..spans[0].end], "Whispering Docks");
        assert_eq!(&text[spans[1].start..spans[1].end], "Old Mill");
    }

    #[test]
    fn test_stop_word_lines_are_skipped() {
        let text = "Secret\nSecret Passage\nRole Model\nQuirk\n";
        assert!(list_matcher().find(text).unwrap().is_empty());
    }

    #[test]
    fn test_prose_lines_are_skipped() {
        let text = "The guard waved us through.\nShe said nothing at all\nTower Of Night Vigil Keepers Hall\n";
        assert!(list_matcher().find(text).unwrap().is_empty());
    }

    #[test]
    fn test_connectors_allowed_inside() {
        let spans = list_matcher().find("Gate of Dawn\n").unwrap();
        assert_eq!(names(&spans), vec!["Gate of Dawn"]);
    }

    #[test]
    fn test_list_line_strips_article() {
        let text = "1. The Salt Market\n";
        let spans = list_matcher().find(text).unwrap();
        assert_eq!(names(&spans), vec!["Salt Market"]);
        assert_eq!(&text[spans[0].start..spans[0].end], "The Salt Market");
    }

    #[test]
    fn test_landmark_bullets_split_on_commas() {
        let text = "Landmarks:\n- The Sunken Temple, Old Mill\n- Cinder Bridge - a narrow crossing\n\nThe town sleeps.\n- Not Included\n";
        let spans = section_matcher().find(text).unwrap();
        assert_eq!(names(&spans), vec!["Sunken Temple", "Old Mill", "Cinder Bridge"]);
        for span in &spans {
            assert!(!text[span.start..span.end].contains(','));
        }
        assert_eq!(&text[spans[2].start..spans[2].end], "Cinder Bridge");
    }

    #[test]
    fn test_landmark_inline_header() {
        let text = "**Landmarks:** Ember Well, the Glass Spire.\n";
        let spans = section_matcher().find(text).unwrap();
        assert_eq!(names(&spans), vec!["Ember Well"]);
    }

    #[test]
    fn test_landmark_section_ends_at_next_label() {
        let text = "## Landmarks\n* Raven Keep\nInhabitants:\n* Mother Hulda\n";
        let spans = section_matcher().find(text).unwrap();
        assert_eq!(names(&spans), vec!["Raven Keep"]);
    }

    #[test]
    fn test_no_section_no_items() {
        let text = "- Raven Keep, Old Mill\n";
        assert!(section_matcher().find(text).unwrap().is_empty());
    }

    #[test]
    fn test_multibyte_bullet_offsets() {
        let text = "• Glimmer Falls\n";
        let spans = list_matcher().find(text).unwrap();
        assert_eq!(&text[spans[0].start..spans[0].end], "Glimmer Falls");
    }
}
