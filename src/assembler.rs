//! Annotation Assembler - the engine's single output seam
//!
//! Takes reconciled entities (in priority order) and produces the public
//! result: sorted by source position, hint keys normalized, character
//! offsets filled in. `splice` turns that result into renderable segments.

use serde::{Deserialize, Serialize};

use crate::scanner::{AnnotatedEntity, GenerationHint};

pub fn assemble(mut entities: Vec<AnnotatedEntity>, text: &str) -> Vec<AnnotatedEntity> {
    entities.sort_by_key(|e| (e.start, e.end));

    let mut chars = CharCursor::new(text);
    for entity in &mut entities {
        normalize_hint(entity);
        entity.char_start = chars.char_index(entity.start);
        entity.char_end = chars.char_index(entity.end);
    }

    entities
}

/// Byte -> char offset conversion for ascending queries. Offsets past the
/// end clamp to the text length; offsets inside a char round down to its
/// first byte.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn char_index(&mut self, byte: usize) -> usize {
        let mut target = byte.min(self.text.len());
        while !self.text.is_char_boundary(target) {
            target -= 1;
        }
        if target < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..target].chars().count();
        self.byte = target;
        self.chars
    }
}

fn normalize_hint(entity: &mut AnnotatedEntity) {
    if entity.generation_hint.is_none() && !entity.exists_in_store {
        entity.generation_hint = Some(entity.category.default_hint());
    }
    if let Some(hint) = entity.generation_hint.as_mut() {
        *hint = GenerationHint {
            template: hint_key(&hint.template),
            subtype: hint.subtype.as_deref().map(hint_key),
        };
    }
}

fn hint_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

// =============================================================================
// Splicing
// =============================================================================

/// A piece of the source text, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextSegment {
    Plain {
        text: String,
    },
    /// Render as a link to the existing record
    Known {
        text: String,
        name: String,
        record_id: String,
        record_type: String,
    },
    /// Render as an on-demand generation trigger
    Novel {
        text: String,
        name: String,
        hint: Option<GenerationHint>,
    },
}

/// Cut `text` into plain and annotated segments. Expects `assemble` output;
/// entities that overlap an earlier one or fall outside the text are left
/// as plain text.
pub fn splice(text: &str, entities: &[AnnotatedEntity]) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for entity in entities {
        if entity.start < cursor {
            continue;
        }
        let (Some(before), Some(span)) = (
            text.get(cursor..entity.start),
            text.get(entity.start..entity.end),
        ) else {
            continue;
        };

        if !before.is_empty() {
            segments.push(TextSegment::Plain {
                text: before.to_string(),
            });
        }

        let segment = match (&entity.store_record_id, &entity.store_record_type) {
            (Some(id), Some(kind)) if entity.exists_in_store => TextSegment::Known {
                text: span.to_string(),
                name: entity.name.clone(),
                record_id: id.clone(),
                record_type: kind.clone(),
            },
            _ => TextSegment::Novel {
                text: span.to_string(),
                name: entity.name.clone(),
                hint: entity.generation_hint.clone(),
            },
        };
        segments.push(segment);
        cursor = entity.end;
    }

    if cursor < text.len() {
        segments.push(TextSegment::Plain {
            text: text[cursor..].to_string(),
        });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{EntityCategory, RawCandidate};

    fn entity(text: &str, needle: &str, category: EntityCategory) -> AnnotatedEntity {
        let start = text.find(needle).unwrap();
        AnnotatedEntity::novel(RawCandidate {
            text: needle.to_string(),
            name: needle.to_string(),
            category,
            generation_hint: None,
            start,
            end: start + needle.len(),
            priority_rank: 0,
            rule: "test".into(),
        })
    }

    #[test]
    fn test_sorted_by_start() {
        let text = "Vex met Mira at Old Mill";
        let out = assemble(
            vec![
                entity(text, "Old Mill", EntityCategory::Place),
                entity(text, "Vex", EntityCategory::Character),
                entity(text, "Mira", EntityCategory::Character),
            ],
            text,
        );
        let names: Vec<&str> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Vex", "Mira", "Old Mill"]);
    }

    #[test]
    fn test_novel_gets_default_hint_and_normalized_keys() {
        let text = "Old Mill";
        let mut e = entity(text, "Old Mill", EntityCategory::Place);
        let out = assemble(vec![e.clone()], text);
        assert_eq!(out[0].generation_hint.as_ref().unwrap().template, "location");

        e.generation_hint = Some(GenerationHint::with_subtype("Location", "Guild Hall"));
        let out = assemble(vec![e], text);
        let hint = out[0].generation_hint.as_ref().unwrap();
        assert_eq!(hint.template, "location");
        assert_eq!(hint.subtype.as_deref(), Some("guild_hall"));
    }

    #[test]
    fn test_char_offsets_differ_from_bytes_after_multibyte() {
        let text = "Café crowd cheered Vex";
        let out = assemble(vec![entity(text, "Vex", EntityCategory::Character)], text);
        assert_eq!(out[0].start, 20);
        assert_eq!(out[0].char_start, 19);
        assert_eq!(out[0].char_end, 22);
    }

    #[test]
    fn test_char_offsets_never_echo_bytes() {
        let text = "Él vio a Vex junto a Mira";
        let vex = entity(text, "Vex", EntityCategory::Character);
        assert_eq!((vex.char_start, vex.char_end), (0, 0));

        // Overlapping and out-of-range spans still get real char offsets
        let mut wide = entity(text, "Vex junto", EntityCategory::Place);
        wide.end = text.len() + 10;
        let mut mid_char = entity(text, "Mira", EntityCategory::Character);
        mid_char.start = 1;
        let out = assemble(vec![vex, wide, mid_char], text);

        let total = text.chars().count();
        assert_eq!(out[0].name, "Mira");
        assert_eq!((out[0].char_start, out[0].char_end), (0, total));
        assert_eq!((out[1].char_start, out[1].char_end), (9, 12));
        assert_eq!((out[2].char_start, out[2].char_end), (9, total));
    }

    #[test]
    fn test_splice_round_trips_text() {
        let text = "Vex met Mira at Old Mill.";
        let mut mira = entity(text, "Mira", EntityCategory::Character);
        mira.exists_in_store = true;
        mira.store_record_id = Some("r1".into());
        mira.store_record_type = Some("npc".into());
        let entities = assemble(
            vec![entity(text, "Old Mill", EntityCategory::Place), mira],
            text,
        );

        let segments = splice(text, &entities);
        let rebuilt: String = segments
            .iter()
            .map(|s| match s {
                TextSegment::Plain { text } => text.as_str(),
                TextSegment::Known { text, .. } => text.as_str(),
                TextSegment::Novel { text, .. } => text.as_str(),
            })
            .collect();
        assert_eq!(rebuilt, text);
        assert!(matches!(&segments[1], TextSegment::Known { record_id, .. } if record_id == "r1"));
        assert!(matches!(&segments[3], TextSegment::Novel { name, .. } if name == "Old Mill"));
        assert_eq!(segments.len(), 5);
    }
}
