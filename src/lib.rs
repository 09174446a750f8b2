//! MentionCore: Campaign Entity Mention Detection + Reconciliation
//!
//! A Rust/WASM engine that finds the characters, places, items and
//! organizations mentioned in free-form campaign text, then checks each one
//! against the campaign's knowledge store. Known mentions link to their
//! record; Novel mentions carry a generation hint for on-demand creation.
//!
//! # Architecture
//!
//! ## Scanner Components
//! - `registry.rs` - PatternRegistry: ordered recognizer table (8 priority tiers)
//! - `matcher.rs` - Matcher trait + regex-backed PatternDefinition
//! - `structured.rs` - Structured-list lines and "Landmarks:" section bullets
//! - `lexicon.rs` - LexiconMatcher: known-name matching via Aho-Corasick
//! - `scan.rs` - Scanner: registry-ordered scan, fail-open per rule
//! - `dedupe.rs` - Span deduplication (position, name, overlap)
//!
//! ## Pipeline
//! - `reconcile/` - Reconciler + KnowledgeStore seam (concurrent lookups)
//! - `assembler.rs` - Ordering, hint normalization, splicing
//! - `engine/` - MentionEngine: the single `detect` entry point
//! - `wasm.rs` - MentionDetector: JS bindings
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { MentionDetector } from 'mentioncore';
//!
//! await init();
//!
//! const detector = new MentionDetector();
//!
//! // Load the campaign's records
//! detector.hydrateRecords('c1', [
//!   { id: 'rec-gareth', title: 'Gareth', type: 'npc' }
//! ]);
//!
//! const entities = await detector.detect(
//!   "Lord Varric met Gareth the guard at the Prancing Pony Inn.",
//!   'c1'
//! );
//!
//! // Gareth -> existsInStore, storeRecordId 'rec-gareth'
//! // Lord Varric, Prancing Pony Inn -> novel, with generationHint
//! console.log(entities);
//! ```

pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod scanner;
pub mod wasm;

// Public exports
pub use assembler::{assemble, splice, TextSegment};
pub use config::EngineConfig;
pub use engine::{DetectionReport, DetectionStats, MentionEngine};
pub use error::*;
pub use reconcile::{InMemoryStore, KnowledgeStore, Reconciler, StoreRecord};
pub use scanner::*;
pub use wasm::MentionDetector;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("mentioncore v{}", env!("CARGO_PKG_VERSION"))
}
