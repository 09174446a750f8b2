//! WASM surface: `MentionDetector`
//!
//! Wraps a `MentionEngine` over an in-memory store that the host hydrates
//! with campaign records. `detect` returns a Promise so the JS side can
//! await it like any other backend call.

use js_sys::Promise;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::assembler::splice;
use crate::config::EngineConfig;
use crate::engine::{DetectionStats, MentionEngine};
use crate::reconcile::{InMemoryStore, StoreRecord};
use crate::scanner::{AnnotatedEntity, EntityCategory, LexiconMatcher, PatternFault, PatternTier};

#[wasm_bindgen]
pub struct MentionDetector {
    store: Arc<InMemoryStore>,
    engine: Arc<MentionEngine>,
}

fn to_js<T: serde::Serialize>(value: &T, what: &str) -> JsValue {
    match serde_wasm_bindgen::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            web_sys::console::error_1(
                &format!("[MentionDetector] {} serialization failed: {:?}", what, e).into(),
            );
            JsValue::NULL
        }
    }
}

fn fault_message(fault: &PatternFault) -> String {
    format!("[MentionDetector] rule '{}' skipped: {}", fault.rule, fault.message)
}

/// Console lines for one detection. The first `build_faults` pattern faults
/// were already reported when the detector was built.
fn problem_messages(stats: &DetectionStats, build_faults: usize) -> Vec<String> {
    let faults = stats.pattern_faults.iter().skip(build_faults).map(fault_message);
    let lookups = stats.lookup_failures.iter().map(|f| {
        format!(
            "[MentionDetector] lookup for '{}' failed, reported as novel: {}",
            f.name, f.error
        )
    });
    faults.chain(lookups).collect()
}

fn warn_all(messages: impl IntoIterator<Item = String>) {
    for message in messages {
        web_sys::console::warn_1(&message.into());
    }
}

#[wasm_bindgen]
impl MentionDetector {
    /// `config_json` is an optional `EngineConfig` document; omitted fields
    /// keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MentionDetector, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => EngineConfig::from_json(json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            _ => EngineConfig::default(),
        };
        let store = Arc::new(InMemoryStore::new());
        let engine = MentionEngine::with_config(store.clone(), config);
        warn_all(engine.scanner().registry().faults().iter().map(fault_message));
        Ok(MentionDetector {
            store,
            engine: Arc::new(engine),
        })
    }

    /// Replace the records held for one campaign.
    /// Expects `[{ id, title, type }]`.
    #[wasm_bindgen(js_name = hydrateRecords)]
    pub fn js_hydrate_records(&self, campaign_id: &str, records: JsValue) -> Result<usize, JsValue> {
        let records: Vec<StoreRecord> = serde_wasm_bindgen::from_value(records)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse records: {}", e)))?;
        let count = records.len();
        self.store
            .hydrate(campaign_id, records)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(count)
    }

    #[wasm_bindgen(js_name = recordCount)]
    pub fn record_count(&self, campaign_id: &str) -> usize {
        self.store.record_count(campaign_id)
    }

    /// Add plain names (e.g. every stored NPC title) as an exact-match
    /// recognizer ahead of the pattern rules.
    #[wasm_bindgen(js_name = registerNames)]
    pub fn js_register_names(&mut self, category: &str, names: JsValue) -> Result<usize, JsValue> {
        let category = EntityCategory::parse(category)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown category '{}'", category)))?;
        let names: Vec<String> = serde_wasm_bindgen::from_value(names)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse names: {}", e)))?;

        let lexicon = LexiconMatcher::new(
            &format!("lexicon.{}", category.as_str()),
            category,
            &names,
            PatternTier::NamedIndividual.base_priority(),
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let count = lexicon.name_count();

        let engine = Arc::get_mut(&mut self.engine)
            .ok_or_else(|| JsValue::from_str("Cannot register names while a detection is running"))?;
        engine.register_matcher(Box::new(lexicon));
        Ok(count)
    }

    /// Resolves to `AnnotatedEntity[]`, rejects on invalid input
    #[wasm_bindgen(js_name = detect)]
    pub fn js_detect(&self, text: String, campaign_id: String) -> Promise {
        let engine = self.engine.clone();
        future_to_promise(async move {
            let report = engine
                .detect_with_report(&text, &campaign_id)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let build_faults = engine.scanner().registry().faults().len();
            warn_all(problem_messages(&report.stats, build_faults));
            Ok(to_js(&report.entities, "detect"))
        })
    }

    /// Like `detect`, resolving to `{ entities, stats }`
    #[wasm_bindgen(js_name = detectWithStats)]
    pub fn js_detect_with_stats(&self, text: String, campaign_id: String) -> Promise {
        let engine = self.engine.clone();
        future_to_promise(async move {
            let report = engine
                .detect_with_report(&text, &campaign_id)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let build_faults = engine.scanner().registry().faults().len();
            warn_all(problem_messages(&report.stats, build_faults));
            let entities = to_js(&report.entities, "detectWithStats");
            let stats = to_js(&report.stats, "detectWithStats");
            let out = js_sys::Object::new();
            js_sys::Reflect::set(&out, &"entities".into(), &entities)?;
            js_sys::Reflect::set(&out, &"stats".into(), &stats)?;
            Ok(out.into())
        })
    }

    /// Deduplicated candidates without any store lookups
    #[wasm_bindgen(js_name = scanOnly)]
    pub fn js_scan_only(&self, text: &str) -> JsValue {
        to_js(&self.engine.candidates(text), "scanOnly")
    }

    /// Split `text` into plain and annotated segments for rendering
    #[wasm_bindgen(js_name = splice)]
    pub fn js_splice(&self, text: &str, entities: JsValue) -> Result<JsValue, JsValue> {
        let entities: Vec<AnnotatedEntity> = serde_wasm_bindgen::from_value(entities)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse entities: {}", e)))?;
        Ok(to_js(&splice(text, &entities), "splice"))
    }

    #[wasm_bindgen(js_name = ruleCount)]
    pub fn rule_count(&self) -> usize {
        self.engine.scanner().registry().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::LookupFailure;

    fn fault(rule: &str) -> PatternFault {
        PatternFault {
            rule: rule.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_problem_messages_cover_scan_faults_and_lookups() {
        let stats = DetectionStats {
            pattern_faults: vec![fault("broken"), fault("lexicon.npc")],
            lookup_failures: vec![LookupFailure {
                name: "Lord Varric".into(),
                error: "knowledge store lookup timed out".into(),
            }],
            ..Default::default()
        };

        let messages = problem_messages(&stats, 1);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("lexicon.npc"));
        assert!(!messages.iter().any(|m| m.contains("'broken'")));
        assert!(messages[1].contains("Lord Varric") && messages[1].contains("timed out"));
    }

    #[test]
    fn test_clean_detection_is_silent() {
        assert!(problem_messages(&DetectionStats::default(), 0).is_empty());
    }
}
