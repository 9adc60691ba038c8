//! The in-flight table, the active-subscription registry, the per-caller
//! index, and the pending queue. See SPEC_FULL.md §4.3–§4.6.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::push::{CallerId, PushRecord};

/// `server_push_ref -> push record`. Empty whenever the control channel is
/// not joined (Invariant 2); a reconnect invalidates every push-ref, so
/// nothing here survives a disconnect.
#[derive(Debug, Default)]
pub struct InFlight {
    entries: HashMap<String, PushRecord>,
}

impl InFlight {
    /// Record that `push_ref` now refers to `record`.
    pub fn insert(&mut self, push_ref: String, record: PushRecord) {
        self.entries.insert(push_ref, record);
    }

    /// Pop the record for `push_ref`, if any (a reply removes it from
    /// in-flight unconditionally, per Invariant 1).
    pub fn remove(&mut self, push_ref: &str) -> Option<PushRecord> {
        self.entries.remove(push_ref)
    }

    /// Number of in-flight pushes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no in-flight pushes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything, without running any reply logic. Used when a
    /// disconnect invalidates every outstanding push-ref.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove and return every in-flight record, for a disconnect that
    /// needs to notify each one's waiter before discarding it.
    pub fn drain(&mut self) -> Vec<PushRecord> {
        self.entries.drain().map(|(_, record)| record).collect()
    }
}

/// `subscription_id -> originating push record`, plus `owner -> set of
/// subscription_id` for O(1) "unsubscribe all for this caller".
#[derive(Debug, Default)]
pub struct Subscriptions {
    by_id: HashMap<String, PushRecord>,
    by_owner: HashMap<CallerId, HashSet<String>>,
}

impl Subscriptions {
    /// Register a newly-confirmed subscription.
    pub fn insert(&mut self, subscription_id: String, record: PushRecord) {
        self.by_owner
            .entry(record.owner)
            .or_default()
            .insert(subscription_id.clone());
        self.by_id.insert(subscription_id, record);
    }

    /// Look up the push record that owns `subscription_id` (used to route
    /// inbound `subscription:data` frames).
    pub fn get(&self, subscription_id: &str) -> Option<&PushRecord> {
        self.by_id.get(subscription_id)
    }

    /// Drop a single subscription from both maps.
    pub fn remove(&mut self, subscription_id: &str) -> Option<PushRecord> {
        let record = self.by_id.remove(subscription_id)?;
        if let Some(set) = self.by_owner.get_mut(&record.owner) {
            set.remove(subscription_id);
            if set.is_empty() {
                self.by_owner.remove(&record.owner);
            }
        }
        Some(record)
    }

    /// All subscription ids currently owned by `caller`.
    pub fn ids_for_owner(&self, caller: CallerId) -> Vec<String> {
        self.by_owner
            .get(&caller)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every subscription owned by `caller` (used on owner-down and
    /// when an owner disconnects without explicit cleanup). Returns the
    /// removed records.
    pub fn remove_all_for_owner(&mut self, caller: CallerId) -> Vec<(String, PushRecord)> {
        let ids = self.ids_for_owner(caller);
        ids.into_iter()
            .filter_map(|id| self.remove(&id).map(|r| (id, r)))
            .collect()
    }

    /// Take every active subscription, clearing both `by_id` and
    /// `by_owner` (Invariant 3 requires they stay in lockstep — a half
    /// cleared index would leave dangling owner entries with no matching
    /// subscription). The caller-ref/owner binding is not lost: it travels
    /// with each drained push record and `by_owner` is reconstructed as
    /// replay re-`insert`s the subscriptions under their new ids
    /// (SPEC_FULL.md §4.6 step 3).
    pub fn drain_for_replay(&mut self) -> Vec<PushRecord> {
        self.by_owner.clear();
        self.by_id.drain().map(|(_, record)| record).collect()
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// A FIFO of push records awaiting the control channel to be joined.
#[derive(Debug, Default)]
pub struct Pending {
    queue: VecDeque<PushRecord>,
}

impl Pending {
    /// Enqueue a push record.
    pub fn push(&mut self, record: PushRecord) {
        self.queue.push_back(record);
    }

    /// Drain every record currently queued, in FIFO order. Records pushed
    /// by a concurrent `push` call made *during* iteration over the
    /// returned `Vec` are not included — they land in the (now empty)
    /// queue and are drained on the next join, per SPEC_FULL.md §4.5.
    pub fn drain(&mut self) -> Vec<PushRecord> {
        self.queue.drain(..).collect()
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
