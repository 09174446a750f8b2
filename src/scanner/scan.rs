//! Scanner - applies every registry entry to the text
//!
//! Output order is registry order first, text position second: every
//! candidate of a higher-priority rule precedes every candidate of a
//! lower-priority one. The deduplicator relies on this ordering as its
//! tie-break.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MatcherError;
use crate::scanner::matcher::{MatchSpan, Matcher, PatternFault};
use crate::scanner::registry::PatternRegistry;
use crate::scanner::types::RawCandidate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOutput {
    pub candidates: Vec<RawCandidate>,
    /// Rules skipped during this scan
    pub faults: Vec<PatternFault>,
}

pub struct Scanner {
    registry: PatternRegistry,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(PatternRegistry::default())
    }
}

impl Scanner {
    pub fn new(registry: PatternRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PatternRegistry {
        &mut self.registry
    }

    /// Run every matcher in priority order. A matcher that errors or panics
    /// is skipped; the rest still run.
    pub fn scan(&self, text: &str) -> ScanOutput {
        let mut output = ScanOutput::default();
        if text.is_empty() {
            return output;
        }

        for matcher in self.registry.matchers() {
            let spans = match run_isolated(matcher.as_ref(), text) {
                Ok(spans) => spans,
                Err(err) => {
                    warn!(rule = matcher.id(), error = %err, "recognizer failed, skipping");
                    output.faults.push(PatternFault::from(&err));
                    continue;
                }
            };

            for span in spans {
                if !is_valid_span(text, &span) {
                    debug!(rule = matcher.id(), start = span.start, end = span.end, "dropping out-of-bounds span");
                    continue;
                }
                let priority_rank = output.candidates.len();
                output.candidates.push(RawCandidate {
                    text: text[span.start..span.end].to_string(),
                    name: span.name,
                    category: matcher.category(),
                    generation_hint: matcher.hint().cloned(),
                    start: span.start,
                    end: span.end,
                    priority_rank,
                    rule: matcher.id().to_string(),
                });
            }
        }

        debug!(
            candidates = output.candidates.len(),
            faults = output.faults.len(),
            "scan complete"
        );
        output
    }
}

fn run_isolated(matcher: &dyn Matcher, text: &str) -> Result<Vec<MatchSpan>, MatcherError> {
    panic::catch_unwind(AssertUnwindSafe(|| matcher.find(text))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panicked".to_string());
        Err(MatcherError::Runtime {
            rule: matcher.id().to_string(),
            message,
        })
    })
}

/// Custom matchers are untrusted: spans must be non-empty, in bounds, on
/// char boundaries, and carry a name.
fn is_valid_span(text: &str, span: &MatchSpan) -> bool {
    span.start < span.end
        && span.end <= text.len()
        && text.is_char_boundary(span.start)
        && text.is_char_boundary(span.end)
        && !span.name.trim().is_empty()
}
