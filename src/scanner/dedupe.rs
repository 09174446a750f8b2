//! Span Deduplicator
//!
//! One left-to-right pass over the priority-ordered scan output. A candidate
//! survives only if it clears three checks, in order:
//! 1. Position: its exact `[start, end)` is not already claimed
//! 2. Name: its case-folded name is not already claimed
//! 3. Overlap: it does not intersect any claimed interval
//!
//! Claims are recorded only for survivors, so the first (highest-priority)
//! candidate to reach a position or a name wins. An overlapping loser is
//! dropped whole, never shrunk.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::scanner::types::RawCandidate;

/// How many candidates each check discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeStats {
    pub by_position: usize,
    pub by_name: usize,
    pub by_overlap: usize,
}

impl DedupeStats {
    pub fn total(&self) -> usize {
        self.by_position + self.by_name + self.by_overlap
    }
}

/// Disjoint claimed intervals keyed by start
#[derive(Default)]
struct IntervalClaims {
    spans: BTreeMap<usize, usize>,
}

impl IntervalClaims {
    /// Claims are disjoint, so only the nearest claim starting before `end`
    /// can intersect `[start, end)`.
    fn intersects(&self, start: usize, end: usize) -> bool {
        self.spans
            .range(..end)
            .next_back()
            .map(|(_, &claimed_end)| claimed_end > start)
            .unwrap_or(false)
    }

    fn claim(&mut self, start: usize, end: usize) {
        self.spans.insert(start, end);
    }
}

pub fn dedupe(candidates: &[RawCandidate]) -> Vec<RawCandidate> {
    dedupe_with_stats(candidates).0
}

pub fn dedupe_with_stats(candidates: &[RawCandidate]) -> (Vec<RawCandidate>, DedupeStats) {
    let mut positions: HashSet<(usize, usize)> = HashSet::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut claims = IntervalClaims::default();
    let mut stats = DedupeStats::default();
    let mut kept = Vec::new();

    for candidate in candidates {
        if positions.contains(&(candidate.start, candidate.end)) {
            stats.by_position += 1;
            continue;
        }

        let key = candidate.name_key();
        if names.contains(&key) {
            stats.by_name += 1;
            continue;
        }

        if claims.intersects(candidate.start, candidate.end) {
            stats.by_overlap += 1;
            continue;
        }

        positions.insert((candidate.start, candidate.end));
        names.insert(key);
        claims.claim(candidate.start, candidate.end);
        kept.push(candidate.clone());
    }

    (kept, stats)
}
