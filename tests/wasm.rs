//! Browser-side checks for the JS bindings. Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use mentioncore::MentionDetector;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn records() -> JsValue {
    serde_wasm_bindgen::to_value(&serde_json::json!([
        { "id": "rec-gareth", "title": "Gareth", "type": "npc" }
    ]))
    .unwrap()
}

#[wasm_bindgen_test]
fn hydrate_reports_count() {
    let detector = MentionDetector::new(None).unwrap();
    assert_eq!(detector.js_hydrate_records("c1", records()).unwrap(), 1);
    assert_eq!(detector.record_count("c1"), 1);
}

#[wasm_bindgen_test]
fn rejects_bad_config() {
    assert!(MentionDetector::new(Some(r#"{ "min_list_words": 0 }"#.to_string())).is_err());
}

#[wasm_bindgen_test]
async fn detect_resolves_with_entities() {
    let detector = MentionDetector::new(None).unwrap();
    detector.js_hydrate_records("c1", records()).unwrap();

    let promise = detector.js_detect("Gareth the guard waved.".to_string(), "c1".to_string());
    let value = JsFuture::from(promise).await.unwrap();
    let entities: Vec<serde_json::Value> = serde_wasm_bindgen::from_value(value).unwrap();

    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["name"], "Gareth");
    assert_eq!(entities[0]["existsInStore"], true);
    assert_eq!(entities[0]["storeRecordId"], "rec-gareth");
}

#[wasm_bindgen_test]
async fn detect_rejects_blank_campaign() {
    let detector = MentionDetector::new(None).unwrap();
    let promise = detector.js_detect("Gareth the guard".to_string(), " ".to_string());
    assert!(JsFuture::from(promise).await.is_err());
}
