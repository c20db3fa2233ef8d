/**
 * AGGREGATOR STORE - Dernier snapshot connu de chaque hôte
 *
 * ROLE: concurrent host_id -> HostSnapshot map shared by report handlers and feed loops.
 *
 * HOW IT WORKS:
 * - Fixed set of shards, each a parking_lot RwLock<HashMap>, picked by hashing host_id
 * - upsert derives net_in_speed / net_out_speed from the previous entry of the same host
 *   (arrival timestamps are the basis), then replaces the entry wholesale
 * - get / get_all hand out clones, a reader never sees a half-written entry
 * - nothing is ever evicted: a silent host keeps its last snapshot and an aging updated_at
 */

use hostpulse_model::{derive_rate, HostSnapshot};
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const DEFAULT_SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, HostSnapshot>>;

pub struct AggregatorStore {
    shards: Vec<Shard>,
}

impl AggregatorStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1);
        Self {
            shards: (0..count).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, host_id: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        host_id.hash(&mut hasher);
        let idx = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Stamps the arrival time then upserts. Used by the `/report` handler.
    pub fn accept(&self, mut snapshot: HostSnapshot, received_at: i64) -> HostSnapshot {
        snapshot.updated_at = received_at;
        self.upsert(snapshot)
    }

    /// Insert-or-replace keyed by `host_id`; returns the stored copy.
    pub fn upsert(&self, mut snapshot: HostSnapshot) -> HostSnapshot {
        let mut map = self.shard(&snapshot.host_id).write();
        if let Some(previous) = map.get(&snapshot.host_id) {
            apply_rates(previous, &mut snapshot);
        }
        map.insert(snapshot.host_id.clone(), snapshot.clone());
        snapshot
    }

    pub fn get(&self, host_id: &str) -> Option<HostSnapshot> {
        self.shard(host_id).read().get(host_id).cloned()
    }

    /// Copy of every stored entry, in no particular order.
    pub fn get_all(&self) -> Vec<HostSnapshot> {
        let mut list = Vec::new();
        for shard in &self.shards {
            list.extend(shard.read().values().cloned());
        }
        list
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AggregatorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Each direction independently: a counter that went backwards gives 0,
/// no elapsed time keeps the reporter-side value.
fn apply_rates(previous: &HostSnapshot, next: &mut HostSnapshot) {
    let elapsed = next.updated_at.saturating_sub(previous.updated_at) as f64;
    if let Some(rate) = derive_rate(previous.net_recv, next.net_recv, elapsed) {
        next.net_in_speed = rate;
    }
    if let Some(rate) = derive_rate(previous.net_sent, next.net_sent, elapsed) {
        next.net_out_speed = rate;
    }
}
