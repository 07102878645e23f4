use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

use crate::domain::utils::id::{LaneId, Vin};

/// One vehicle's pending request to cross, with its bid.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub vin: Vin,
    pub vehicle_spec: String,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
    pub arrival_time: f64,
    pub arrival_velocity: f64,
    pub accelerating: bool,
    pub bid: f64,
}

/// A proposal tagged with its submission index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedProposal {
    pub index: u64,
    pub proposal: Proposal,
}

type QueueKey = (OrderedFloat<f64>, u64);

/// Pending proposals ordered by arrival time, ties by submission order.
#[derive(Debug, Clone, Default)]
pub struct ProposalQueue {
    entries: BTreeMap<QueueKey, IndexedProposal>,
    next_index: u64,
}

impl ProposalQueue {
    pub fn new() -> Self {
        ProposalQueue { entries: BTreeMap::new(), next_index: 0 }
    }

    /// Enqueues `proposal` and returns its submission index.
    pub fn push(&mut self, proposal: Proposal) -> u64 {
        let index = self.next_index;
        self.next_index += 1;

        let key = (OrderedFloat(proposal.arrival_time), index);
        self.entries.insert(key, IndexedProposal { index, proposal });

        return index;
    }

    pub fn remove(&mut self, proposal: &IndexedProposal) -> Option<IndexedProposal> {
        self.entries.remove(&(OrderedFloat(proposal.proposal.arrival_time), proposal.index))
    }

    /// Drops every proposal whose arrival time lies before `current_time`.
    pub fn remove_expired(&mut self, current_time: f64) -> Vec<IndexedProposal> {
        let retained = self.entries.split_off(&(OrderedFloat(current_time), 0));
        let expired = std::mem::replace(&mut self.entries, retained);

        return expired.into_values().collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedProposal> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
