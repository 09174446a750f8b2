//! Pattern Registry - the ordered recognizer table
//!
//! Tiers run most specific first (see `PatternTier`):
//! 1. Named individuals: "Gareth the guard", "Lord Varric"
//! 2. Establishments: "the Prancing Pony Inn"
//! 3. Landmarks by subtype: library, temple, market, guild hall, keep, ...
//! 4. Generic places: streets, districts, squares, bridges, ...
//! 5. Structured-list lines
//! 6. "Landmarks:" section bullets
//! 7. Item noun phrases: "the Sword of Dawn", "the Ember Crown"
//! 8. Organizations: "the Ashen Council", "the Order of the Veil"
//!
//! Priority note: "the Thieves Guild Hall" is claimed by the guild-hall
//! landmark rule (tier 3) as a Place. The organization rule's overlapping
//! "the Thieves Guild" loses to it during deduplication.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::config::{EngineConfig, PatternSpec};
use crate::error::MatcherError;
use crate::scanner::matcher::{
    Matcher, NameExtractor, PatternDefinition, PatternFault, PatternTier,
};
use crate::scanner::structured::{LandmarkSectionMatcher, StructuredListMatcher};
use crate::scanner::types::{EntityCategory, GenerationHint};

// =============================================================================
// Pattern building blocks
// =============================================================================

/// One capitalized word inside a place or item name ("Dragon's", "Ash-Born")
const WORD: &str = r"[A-Z][a-z'\-]+";

/// A word that can end a name: no possessive tail, so "Varric's" stops at
/// "Varric" ("Gareth", "O'Rourke", "Ash-Born")
const NAME_WORD: &str = r"[A-Z](?:[a-z]+|'[A-Z][a-z]+)(?:-[A-Za-z][a-z]+)*";

/// Optional leading article, kept in the span and stripped from the name
const ARTICLE: &str = r"(?:(?i:the)[ \t]+)?";

const OCCUPATIONS: &[&str] = &[
    "guard", "blacksmith", "smith", "merchant", "innkeeper", "barkeep", "bartender",
    "priest", "priestess", "wizard", "witch", "mage", "bard", "knight", "ranger",
    "thief", "healer", "sage", "scholar", "hunter", "farmer", "baker", "butcher",
    "alchemist", "sailor", "soldier", "noble", "elder", "mayor", "herbalist",
    "cleric", "paladin", "druid", "monk", "rogue", "fighter", "fisherman",
    "miner", "scout", "tailor", "cook", "jeweler", "librarian", "stablehand",
    "apothecary", "captain", "mercenary", "beggar", "oracle", "seer", "hermit",
    "shopkeeper", "tinker", "cartographer", "ferryman", "gravedigger", "watchman",
];

const TITLES: &[&str] = &[
    "Lord", "Lady", "Sir", "Dame", "King", "Queen", "Prince", "Princess",
    "Captain", "Commander", "Master", "Mistress", "Father", "Mother", "Brother",
    "Sister", "Elder", "Archmage", "High Priestess", "High Priest", "Baron",
    "Baroness", "Duke", "Duchess", "Count", "Countess", "Magister", "Warden",
    "Chancellor", "General", "Mayor", "Abbot", "Abbess",
];

const ESTABLISHMENTS: &[&str] = &[
    "Inn", "Tavern", "Alehouse", "Taproom", "Taphouse", "Lodge", "Arms", "Rest",
];

/// (subtype, nouns) for categorized landmarks
const LANDMARKS: &[(&str, &[&str])] = &[
    ("library", &["Library", "Archives", "Archive", "Athenaeum"]),
    ("temple", &["Temple", "Shrine", "Cathedral", "Chapel", "Sanctum", "Monastery", "Abbey"]),
    ("market", &["Marketplace", "Market", "Bazaar", "Emporium"]),
    ("guild_hall", &["Guild Hall", "Guildhall"]),
    ("keep", &["Keep", "Castle", "Citadel", "Fortress", "Stronghold"]),
    ("arena", &["Arena", "Colosseum", "Coliseum"]),
    ("cemetery", &["Cemetery", "Graveyard", "Crypt", "Catacombs", "Necropolis"]),
    ("barracks", &["Barracks", "Garrison", "Armory"]),
    ("theater", &["Theater", "Theatre", "Playhouse", "Opera House"]),
    ("tower", &["Tower", "Spire", "Observatory"]),
];

/// "Guild" is left to the organization tier; only "Guild Hall" is a place
const GENERIC_PLACES: &[&str] = &[
    "Hall", "Street", "Road", "Lane", "Way", "Avenue", "Alley", "District",
    "Quarter", "Ward", "Square", "Plaza", "Bridge", "Gate", "Harbor", "Harbour",
    "Docks", "Wharf", "Village", "Forest", "Woods", "Hills", "Mountains", "Peak",
    "Lake", "River", "Marsh", "Swamp", "Vale", "Valley", "Pass", "Mines", "Mine",
    "Caverns", "Cave", "Ruins",
];

const ITEMS: &[&str] = &[
    "Sword", "Blade", "Amulet", "Ring", "Staff", "Crown", "Tome", "Orb", "Shield",
    "Dagger", "Bow", "Axe", "Hammer", "Chalice", "Cloak", "Gauntlets", "Helm",
    "Wand", "Scepter", "Relic", "Grimoire", "Talisman", "Lantern", "Mirror", "Key",
];

const ORGANIZATIONS: &[&str] = &[
    "Guild", "Council", "Order", "Brotherhood", "Sisterhood", "Circle", "Syndicate",
    "Company", "Cult", "Consortium", "League", "Covenant", "Conclave", "Society",
    "Legion", "Cabal", "Alliance", "Watch", "Clan", "Fellowship",
];

const ORG_HEADS: &[&str] = &[
    "Order", "Brotherhood", "Sisterhood", "Circle", "Council", "Cult", "Knights",
    "Keepers", "Children", "Disciples",
];

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| w.replace(' ', r"[ \t]+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// "<Noun> of [the] <Name> [<Name>]"
fn of_phrase(heads: &str) -> String {
    format!(r"(?:{heads})[ \t]+of[ \t]+(?:the[ \t]+)?{NAME_WORD}(?:[ \t]+{NAME_WORD})?")
}

// =============================================================================
// Built-in rules
// =============================================================================

struct BuiltinRule {
    id: String,
    tier: PatternTier,
    pattern: String,
    extractor: NameExtractor,
    category: EntityCategory,
    hint: Option<GenerationHint>,
}

fn builtin_rules() -> Vec<BuiltinRule> {
    let mut rules = Vec::new();
    let place = |subtype: &str| Some(GenerationHint::with_subtype("location", subtype));

    // Tier 1: named individuals
    rules.push(BuiltinRule {
        id: "npc.occupation".into(),
        tier: PatternTier::NamedIndividual,
        pattern: format!(
            r"\b({NAME_WORD})[ \t]+the[ \t]+(?:(?:old|young|retired|former)[ \t]+)?(?:{})\b",
            alternation(OCCUPATIONS)
        ),
        extractor: NameExtractor::Group(1),
        category: EntityCategory::Character,
        hint: Some(GenerationHint::new("npc")),
    });
    rules.push(BuiltinRule {
        id: "npc.titled".into(),
        tier: PatternTier::NamedIndividual,
        pattern: format!(
            r"\b(?:{})[ \t]+{NAME_WORD}(?:[ \t]+{NAME_WORD})?\b",
            alternation(TITLES)
        ),
        extractor: NameExtractor::WholeMatch,
        category: EntityCategory::Character,
        hint: Some(GenerationHint::new("npc")),
    });

    // Tier 2: establishments
    rules.push(BuiltinRule {
        id: "place.establishment".into(),
        tier: PatternTier::Establishment,
        pattern: format!(
            r"\b(?i:the)[ \t]+((?:{WORD}[ \t]+){{1,3}}(?:{}))\b",
            alternation(ESTABLISHMENTS)
        ),
        extractor: NameExtractor::Group(1),
        category: EntityCategory::Place,
        hint: place("tavern"),
    });

    // Tier 3: categorized landmarks
    for (subtype, nouns) in LANDMARKS {
        let nouns = alternation(nouns);
        rules.push(BuiltinRule {
            id: format!("place.landmark.{subtype}"),
            tier: PatternTier::Landmark,
            pattern: format!(
                r"\b{ARTICLE}((?:{WORD}[ \t]+){{1,3}}(?:{nouns})|{})\b",
                of_phrase(&nouns)
            ),
            extractor: NameExtractor::WithoutArticle(1),
            category: EntityCategory::Place,
            hint: place(subtype),
        });
    }

    // Tier 4: generic places
    rules.push(BuiltinRule {
        id: "place.generic".into(),
        tier: PatternTier::GenericPlace,
        pattern: format!(
            r"\b{ARTICLE}((?:{WORD}[ \t]+){{1,3}}(?:{}))\b",
            alternation(GENERIC_PLACES)
        ),
        extractor: NameExtractor::WithoutArticle(1),
        category: EntityCategory::Place,
        hint: Some(GenerationHint::new("location")),
    });

    // Tiers 5 and 6 are the structured scans, added by the registry

    // Tier 7: items
    let items = alternation(ITEMS);
    rules.push(BuiltinRule {
        id: "item.of_phrase".into(),
        tier: PatternTier::ItemPhrase,
        pattern: format!(
            r"\b{ARTICLE}((?:{WORD}[ \t]+){{0,2}}{})\b",
            of_phrase(&items)
        ),
        extractor: NameExtractor::WithoutArticle(1),
        category: EntityCategory::Item,
        hint: Some(GenerationHint::new("item")),
    });
    rules.push(BuiltinRule {
        id: "item.named".into(),
        tier: PatternTier::ItemPhrase,
        pattern: format!(r"\b(?i:the)[ \t]+((?:{WORD}[ \t]+){{1,2}}(?:{items}))\b"),
        extractor: NameExtractor::Group(1),
        category: EntityCategory::Item,
        hint: Some(GenerationHint::new("item")),
    });

    // Tier 8: organizations
    rules.push(BuiltinRule {
        id: "org.named".into(),
        tier: PatternTier::Organization,
        pattern: format!(
            r"\b(?i:the)[ \t]+((?:{WORD}[ \t]+){{1,3}}(?:{}))\b",
            alternation(ORGANIZATIONS)
        ),
        extractor: NameExtractor::Group(1),
        category: EntityCategory::Organization,
        hint: Some(GenerationHint::new("organization")),
    });
    rules.push(BuiltinRule {
        id: "org.of_phrase".into(),
        tier: PatternTier::Organization,
        pattern: format!(r"\b(?i:the)[ \t]+({})\b", of_phrase(&alternation(ORG_HEADS))),
        extractor: NameExtractor::Group(1),
        category: EntityCategory::Organization,
        hint: Some(GenerationHint::new("organization")),
    });

    rules
}

fn compile_spec(spec: &PatternSpec, size_limit: usize) -> Result<PatternDefinition, MatcherError> {
    let extractor = match (spec.name_group, spec.strip_article) {
        (Some(g), true) => NameExtractor::WithoutArticle(g),
        (Some(g), false) => NameExtractor::Group(g),
        (None, true) => NameExtractor::WithoutArticle(0),
        (None, false) => NameExtractor::WholeMatch,
    };
    let hint = match (&spec.template, &spec.subtype) {
        (Some(t), Some(s)) => Some(GenerationHint::with_subtype(t, s)),
        (Some(t), None) => Some(GenerationHint::new(t)),
        (None, Some(s)) => {
            let mut hint = spec.category.default_hint();
            hint.subtype = Some(s.clone());
            Some(hint)
        }
        (None, None) => None,
    };
    PatternDefinition::with_size_limit(
        &spec.id,
        &spec.pattern,
        extractor,
        spec.category,
        hint,
        size_limit,
    )
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered, read-only sequence of matchers.
pub struct PatternRegistry {
    matchers: Vec<Box<dyn Matcher>>,
    faults: Vec<PatternFault>,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PatternRegistry {
    /// Build the registry. Rules that fail to compile are recorded as faults
    /// and left out; construction itself never fails.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut registry = Self {
            matchers: Vec::new(),
            faults: Vec::new(),
        };
        let builtins = builtin_rules();
        let non_names: Arc<HashSet<String>> = Arc::new(
            config
                .non_name_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        );

        for tier in PatternTier::ALL {
            let mut priority = tier.base_priority();

            match tier {
                PatternTier::StructuredList => {
                    registry.matchers.push(Box::new(StructuredListMatcher::new(
                        &config.stop_words,
                        config.min_list_words,
                        config.max_list_words,
                        priority,
                    )));
                    priority += 1;
                }
                PatternTier::LandmarkSection => {
                    match LandmarkSectionMatcher::new(&config.landmark_headers, priority) {
                        Ok(m) => registry.matchers.push(Box::new(m)),
                        Err(e) => registry.record_fault(&e),
                    }
                    priority += 1;
                }
                _ => {}
            }

            for rule in builtins.iter().filter(|r| r.tier == tier) {
                let compiled = PatternDefinition::with_size_limit(
                    &rule.id,
                    &rule.pattern,
                    rule.extractor,
                    rule.category,
                    rule.hint.clone(),
                    config.pattern_size_limit,
                )
                .map(|def| def.skipping(non_names.clone()));
                registry.push_compiled(compiled, priority);
                priority += 1;
            }

            for spec in config.extra_patterns.iter().filter(|s| s.tier == tier) {
                registry.push_compiled(compile_spec(spec, config.pattern_size_limit), priority);
                priority += 1;
            }
        }

        registry
    }

    fn push_compiled(&mut self, compiled: Result<PatternDefinition, MatcherError>, priority: u32) {
        match compiled {
            Ok(def) => self.matchers.push(Box::new(def.at_priority(priority))),
            Err(e) => self.record_fault(&e),
        }
    }

    fn record_fault(&mut self, err: &MatcherError) {
        warn!(error = %err, "skipping recognizer rule");
        self.faults.push(PatternFault::from(err));
    }

    /// Add a matcher (e.g. a `LexiconMatcher`), keeping priority order.
    /// Ties keep registration order.
    pub fn register(&mut self, matcher: Box<dyn Matcher>) {
        self.matchers.push(matcher);
        self.matchers.sort_by_key(|m| m.priority());
    }

    pub fn matchers(&self) -> &[Box<dyn Matcher>] {
        &self.matchers
    }

    /// Rules dropped at construction
    pub fn faults(&self) -> &[PatternFault] {
        &self.faults
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
