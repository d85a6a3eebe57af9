//! Pipeline snapshot and its store

use crate::model::{ExchangeRateTable, Metal, Provenance, Quote, Region, RegionalPrice, Sourced};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything one poll cycle produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic cycle number, 0 for the bootstrap snapshot
    pub cycle: u64,
    pub taken_at: DateTime<Utc>,
    pub quotes: BTreeMap<Metal, Sourced<Quote>>,
    pub regions: Vec<RegionalPrice>,
    pub rates: ExchangeRateTable,
    pub rates_provenance: Provenance,
}

impl Snapshot {
    pub fn quote(&self, metal: Metal) -> Option<&Sourced<Quote>> {
        self.quotes.get(&metal)
    }

    pub fn region(&self, region: Region) -> Option<&RegionalPrice> {
        self.regions.iter().find(|r| r.region == region)
    }

    /// Whether every published figure came straight from a feed
    pub fn is_fully_live(&self) -> bool {
        self.quotes.values().all(|q| q.is_live())
            && self.regions.iter().all(|r| r.provenance.is_live())
    }
}

/// Holds the latest published snapshot
///
/// Snapshots are replaced whole; readers always see a complete cycle.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Latest snapshot
    pub async fn current(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Swap in `snapshot` unless a later cycle is already published
    ///
    /// Returns whether the snapshot was accepted.
    pub async fn publish(&self, snapshot: Snapshot) -> bool {
        let mut current = self.current.write().await;
        if snapshot.cycle < current.cycle {
            tracing::debug!(
                stale = snapshot.cycle,
                current = current.cycle,
                "Discarding snapshot from an older cycle"
            );
            return false;
        }
        *current = Arc::new(snapshot);
        true
    }
}
