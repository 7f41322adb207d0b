//! The milestone registry: milestones by identity plus an ordered index from
//! trigger value to the milestones waiting at that value.

use crate::common::MilestoneId;
use crate::components::milestone::Milestone;
use slotmap::SlotMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// An `f64` trigger value usable as an ordered map key.
///
/// Ordering is ascending numeric via `f64::total_cmp`. Registration rejects
/// non-finite values, so the NaN corner of the total order is never hit.
#[derive(Debug, Clone, Copy)]
pub struct TriggerKey(pub f64);

impl TriggerKey {
    /// Folds `-0.0` into `0.0` so both land in the same bucket.
    pub fn new(value: f64) -> Self {
        Self(value + 0.0)
    }
}

impl PartialEq for TriggerKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TriggerKey {}

impl Hash for TriggerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for TriggerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TriggerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Stores milestones and keeps them bucketed by their current trigger value.
///
/// Invariant: every armed milestone appears in exactly one bucket, the one
/// keyed by its current `trigger_value`. Disarmed milestones (recurring ones
/// that already fired this round) live only in the registry. Empty buckets
/// are pruned. All structural changes go through these methods.
#[derive(Debug, Default)]
pub struct MilestoneIndex {
    by_id: SlotMap<MilestoneId, Milestone>,
    by_trigger_value: BTreeMap<TriggerKey, Vec<MilestoneId>>,
}

impl MilestoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the milestone and indexes it under its trigger value.
    pub fn register(&mut self, milestone: Milestone) -> MilestoneId {
        let armed = milestone.armed;
        let value = milestone.trigger_value();
        let id = self.by_id.insert(milestone);
        if armed {
            self.insert_into_bucket(id, value);
        }
        id
    }

    /// Removes a milestone from both the registry and its bucket.
    pub fn unregister(&mut self, id: MilestoneId) -> Option<Milestone> {
        let milestone = self.by_id.remove(id)?;
        if milestone.armed {
            self.remove_from_bucket(id, milestone.trigger_value());
        }
        Some(milestone)
    }

    /// Removes every milestone matching `predicate` and returns their ids.
    ///
    /// Matching ids are collected before anything is removed.
    pub fn unregister_where(
        &mut self,
        mut predicate: impl FnMut(MilestoneId, &Milestone) -> bool,
    ) -> Vec<MilestoneId> {
        let doomed: Vec<MilestoneId> = self
            .by_id
            .iter()
            .filter(|(id, milestone)| predicate(*id, milestone))
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.unregister(*id);
        }
        doomed
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_trigger_value.clear();
    }

    /// Moves an armed milestone to the bucket for `new_value`.
    ///
    /// A disarmed milestone only has its value updated. Returns `false` for
    /// unknown ids.
    pub fn re_key(&mut self, id: MilestoneId, new_value: f64) -> bool {
        let Some(milestone) = self.by_id.get_mut(id) else {
            return false;
        };
        let old_value = milestone.trigger_value();
        milestone.set_trigger_value(new_value);
        if milestone.armed {
            self.remove_from_bucket(id, old_value);
            self.insert_into_bucket(id, new_value);
        }
        true
    }

    /// Takes a milestone out of the value index but keeps it registered.
    pub fn disarm(&mut self, id: MilestoneId) -> bool {
        let Some(milestone) = self.by_id.get_mut(id) else {
            return false;
        };
        if !milestone.armed {
            return false;
        }
        milestone.armed = false;
        let value = milestone.trigger_value();
        self.remove_from_bucket(id, value);
        true
    }

    /// Puts a disarmed milestone back into the value index at its current
    /// trigger value.
    pub fn arm(&mut self, id: MilestoneId) -> bool {
        let Some(milestone) = self.by_id.get_mut(id) else {
            return false;
        };
        if milestone.armed {
            return false;
        }
        milestone.armed = true;
        let value = milestone.trigger_value();
        self.insert_into_bucket(id, value);
        true
    }

    pub fn get(&self, id: MilestoneId) -> Option<&Milestone> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: MilestoneId) -> Option<&mut Milestone> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: MilestoneId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MilestoneId, &Milestone)> {
        self.by_id.iter()
    }

    pub fn ids(&self) -> Vec<MilestoneId> {
        self.by_id.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Buckets in ascending trigger-value order, ids in registration order.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, &[MilestoneId])> {
        self.by_trigger_value
            .iter()
            .map(|(key, ids)| (key.0, ids.as_slice()))
    }

    fn insert_into_bucket(&mut self, id: MilestoneId, value: f64) {
        let bucket = self.by_trigger_value.entry(TriggerKey::new(value)).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    fn remove_from_bucket(&mut self, id: MilestoneId, value: f64) {
        let key = TriggerKey::new(value);
        if let Some(bucket) = self.by_trigger_value.get_mut(&key) {
            bucket.retain(|member| *member != id);
            if bucket.is_empty() {
                self.by_trigger_value.remove(&key);
            }
        }
    }
}
