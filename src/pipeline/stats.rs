//! Process-wide pipeline counters (observability only).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::model::AliasTier;

#[derive(Debug, Default)]
pub struct PipelineStats {
    edge_types: Mutex<HashMap<String, u64>>,
    alias_tiers: Mutex<HashMap<AliasTier, u64>>,
    dropped_edges: AtomicU64,
}

/// Point-in-time copy of the counters, sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub edge_types: BTreeMap<String, u64>,
    /// Keyed by tier code (`0`, `1`, `2`, `-1`).
    pub alias_tiers: BTreeMap<i8, u64>,
    /// Triples discarded by the abstract-type allow-list.
    pub dropped_edges: u64,
}

impl PipelineStats {
    pub fn record_edge(&self, edge_type: &str, tier: AliasTier) {
        *self.edge_types.lock().entry_ref(edge_type).or_insert(0) += 1;
        *self.alias_tiers.lock().entry(tier).or_insert(0) += 1;
    }

    pub fn record_dropped(&self) {
        self.dropped_edges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn edge_type_count(&self, edge_type: &str) -> u64 {
        self.edge_types.lock().get(edge_type).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            edge_types: self.edge_types.lock().iter().map(|(k, v)| (k.clone(), *v)).collect(),
            alias_tiers: self.alias_tiers.lock().iter().map(|(t, v)| (t.code(), *v)).collect(),
            dropped_edges: self.dropped_edges.load(Ordering::Relaxed),
        }
    }
}
