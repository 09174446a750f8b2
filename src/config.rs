//! Engine configuration and defaults

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scanner::{EntityCategory, PatternTier};

/// Section labels that look like names in generated stat blocks
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "Secret", "Secrets", "Role", "Quirk", "Quirks", "Appearance", "Personality",
    "Motivation", "Motivations", "Description", "Background", "History", "Notes",
    "Hook", "Hooks", "Goal", "Goals", "Traits", "Trait", "Flaw", "Flaws", "Ideal",
    "Ideals", "Bond", "Bonds", "Name", "Race", "Class", "Occupation", "Summary",
    "Overview", "Landmarks", "Inhabitants", "Rumors", "Rumours", "Features",
    "Atmosphere", "Population", "Government", "Defenses", "Treasure", "Loot",
    "Stats", "Abilities", "Skills", "Equipment", "Relationships", "Voice",
    "Mannerisms", "Age", "Gender", "Alignment", "Location", "Type", "Size",
];

/// Capitalized words that open sentences or phrases but never start a name
/// ("Then the guard", "Beyond Old Keep")
pub const DEFAULT_NON_NAME_WORDS: &[&str] = &[
    "A", "An", "The", "Then", "When", "While", "After", "Before", "Suddenly",
    "Later", "Soon", "Now", "Once", "Finally", "Meanwhile", "Still", "Only",
    "Even", "Just", "Perhaps", "Maybe", "Also", "Again", "Here", "There",
    "Where", "Why", "How", "What", "Who", "Whom", "Whose", "Which", "This",
    "That", "These", "Those", "He", "She", "It", "They", "We", "You", "I",
    "His", "Her", "Its", "Their", "Our", "Your", "My", "Every", "Each", "All",
    "Some", "Any", "No", "Not", "Never", "Always", "Everyone", "Nobody",
    "Someone", "Anyone", "And", "But", "Or", "So", "Yet", "If", "As",
    "Because", "Since", "Until", "Although", "Though", "Beyond", "Behind",
    "Inside", "Outside", "Near", "Past", "Across", "Through", "Beneath",
    "Under", "Above", "Below", "Within", "Toward", "Towards", "Into", "Onto",
    "From", "With", "Without", "Upon", "At", "In", "On", "By", "To", "Of",
    "For", "Around", "Along", "Against", "Between", "During", "Ask", "Tell",
    "Find", "Meet", "Visit", "Seek", "Let", "Yes",
];

/// A user-supplied recognizer, appended inside its tier after the built-ins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub id: String,
    pub pattern: String,
    pub category: EntityCategory,
    pub tier: PatternTier,
    /// Capture group holding the name; whole match when absent
    #[serde(default)]
    pub name_group: Option<usize>,
    /// Drop a leading "the"/"The" from the extracted name
    #[serde(default)]
    pub strip_article: bool,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Words that disqualify a structured-list line (case-insensitive)
    pub stop_words: Vec<String>,
    /// Header words that open a landmark section ("Landmarks:")
    pub landmark_headers: Vec<String>,
    /// Leading words the built-in rules skip before a name (case-insensitive)
    pub non_name_words: Vec<String>,
    /// Word bounds for a structured-list line to count as a place name
    pub min_list_words: usize,
    pub max_list_words: usize,
    /// Larger inputs are rejected before scanning
    pub max_text_bytes: usize,
    /// Compiled-size ceiling for each regex; larger patterns are skipped
    pub pattern_size_limit: usize,
    pub extra_patterns: Vec<PatternSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            landmark_headers: vec!["Landmarks".to_string()],
            non_name_words: DEFAULT_NON_NAME_WORDS.iter().map(|s| s.to_string()).collect(),
            min_list_words: 2,
            max_list_words: 4,
            max_text_bytes: 1 << 20,
            pattern_size_limit: 1 << 20,
            extra_patterns: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_list_words == 0 {
            return Err(ConfigError::Invalid("min_list_words must be at least 1".into()));
        }
        if self.min_list_words > self.max_list_words {
            return Err(ConfigError::Invalid(format!(
                "min_list_words ({}) exceeds max_list_words ({})",
                self.min_list_words, self.max_list_words
            )));
        }
        if self.max_text_bytes == 0 {
            return Err(ConfigError::Invalid("max_text_bytes must be positive".into()));
        }
        if let Some(spec) = self.extra_patterns.iter().find(|p| p.id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "extra pattern '{}' has no id",
                spec.pattern
            )));
        }
        Ok(())
    }
}
