//! MentionEngine: the single entry point
//!
//! `detect(text, campaign_id)` runs the whole pipeline:
//! 1. Scanner - registry-ordered raw candidates
//! 2. Deduplicator - position / name / overlap filtering
//! 3. Reconciler - concurrent store lookups, failures isolated
//! 4. Assembler - ordering and output normalization
//!
//! The engine holds no per-call state, so concurrent `detect` calls on one
//! engine are independent.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::assembler::assemble;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::reconcile::{KnowledgeStore, LookupFailure, Reconciler};
use crate::scanner::{
    dedupe_with_stats, AnnotatedEntity, DedupeStats, Matcher, PatternFault, PatternRegistry,
    RawCandidate, Scanner,
};

#[cfg(test)]
mod tests;

// =============================================================================
// Types
// =============================================================================

/// Timing per pipeline phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionTimings {
    pub total_us: u64,
    pub scan_us: u64,
    pub dedupe_us: u64,
    pub reconcile_us: u64,
    pub assemble_us: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionStats {
    pub timings: DetectionTimings,
    pub raw_candidates: usize,
    pub dropped: DedupeStats,
    pub entities: usize,
    pub known: usize,
    pub novel: usize,
    /// Rules skipped, at registry build or during this scan
    pub pattern_faults: Vec<PatternFault>,
    /// Lookups that failed and were downgraded to Novel
    pub lookup_failures: Vec<LookupFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub entities: Vec<AnnotatedEntity>,
    pub stats: DetectionStats,
}

// =============================================================================
// MentionEngine
// =============================================================================

pub struct MentionEngine {
    scanner: Scanner,
    reconciler: Reconciler,
    config: EngineConfig,
}

impl MentionEngine {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn KnowledgeStore>, config: EngineConfig) -> Self {
        let registry = PatternRegistry::from_config(&config);
        info!(
            rules = registry.len(),
            faults = registry.faults().len(),
            "mention engine ready"
        );
        Self {
            scanner: Scanner::new(registry),
            reconciler: Reconciler::new(store),
            config,
        }
    }

    /// Add a recognizer, e.g. a `LexiconMatcher` over known titles
    pub fn register_matcher(&mut self, matcher: Box<dyn Matcher>) {
        self.scanner.registry_mut().register(matcher);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    fn validate(&self, text: &str, campaign_id: &str) -> Result<(), EngineError> {
        if campaign_id.trim().is_empty() {
            return Err(EngineError::MissingCampaignId);
        }
        if text.len() > self.config.max_text_bytes {
            return Err(EngineError::TextTooLarge {
                size: text.len(),
                limit: self.config.max_text_bytes,
            });
        }
        Ok(())
    }

    /// Scan + dedupe only; no store access. Priority order.
    pub fn candidates(&self, text: &str) -> Vec<RawCandidate> {
        let scanned = self.scanner.scan(text);
        dedupe_with_stats(&scanned.candidates).0
    }

    pub async fn detect(
        &self,
        text: &str,
        campaign_id: &str,
    ) -> Result<Vec<AnnotatedEntity>, EngineError> {
        Ok(self.detect_with_report(text, campaign_id).await?.entities)
    }

    pub async fn detect_with_report(
        &self,
        text: &str,
        campaign_id: &str,
    ) -> Result<DetectionReport, EngineError> {
        self.validate(text, campaign_id)?;

        let mut report = DetectionReport::default();
        report.stats.pattern_faults = self.scanner.registry().faults().to_vec();
        if text.is_empty() {
            return Ok(report);
        }

        let overall_start = instant::Instant::now();

        // Phase 1: scan
        let phase_start = instant::Instant::now();
        let scanned = self.scanner.scan(text);
        report.stats.timings.scan_us = phase_start.elapsed().as_micros() as u64;
        report.stats.raw_candidates = scanned.candidates.len();
        report.stats.pattern_faults.extend(scanned.faults);

        // Phase 2: dedupe
        let phase_start = instant::Instant::now();
        let (candidates, dropped) = dedupe_with_stats(&scanned.candidates);
        report.stats.timings.dedupe_us = phase_start.elapsed().as_micros() as u64;
        report.stats.dropped = dropped;

        // Phase 3: reconcile
        let phase_start = instant::Instant::now();
        let reconciled = if candidates.is_empty() {
            Default::default()
        } else {
            self.reconciler.reconcile(candidates, campaign_id).await
        };
        report.stats.timings.reconcile_us = phase_start.elapsed().as_micros() as u64;
        report.stats.lookup_failures = reconciled.failures;

        // Phase 4: assemble
        let phase_start = instant::Instant::now();
        report.entities = assemble(reconciled.entities, text);
        report.stats.timings.assemble_us = phase_start.elapsed().as_micros() as u64;

        report.stats.entities = report.entities.len();
        report.stats.known = report.entities.iter().filter(|e| e.exists_in_store).count();
        report.stats.novel = report.stats.entities - report.stats.known;
        report.stats.timings.total_us = overall_start.elapsed().as_micros() as u64;

        debug!(
            campaign_id,
            raw = report.stats.raw_candidates,
            dropped = report.stats.dropped.total(),
            known = report.stats.known,
            novel = report.stats.novel,
            "detection complete"
        );
        Ok(report)
    }
}
