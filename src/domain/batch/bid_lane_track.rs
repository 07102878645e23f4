use std::collections::{HashMap, VecDeque};

use crate::domain::batch::lane_bid_compare::LaneBidCompare;
use crate::domain::batch::proposal::IndexedProposal;
use crate::domain::utils::id::{LaneId, Vin};

/// Divisor turning waiting time into bid bonus: 100 s of waiting adds one unit.
pub const WAIT_TIME_BID_DIVISOR: f64 = 100.0;

/// Bidding record of one vehicle waiting in a lane.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueVehicle {
    pub vin: Vin,
    pub bid: f64,
    pub time_entered: f64,

    /// Cleared at the start of a refresh, set again while the vehicle still proposes.
    pub is_active: bool,
}

impl QueueVehicle {
    pub fn new(vin: Vin, bid: f64, time_entered: f64) -> Self {
        QueueVehicle { vin, bid, time_entered, is_active: true }
    }

    pub fn time_cost(&self, current_time: f64) -> f64 {
        (current_time - self.time_entered).abs() / WAIT_TIME_BID_DIVISOR
    }

    /// Submitted bid plus a bonus growing with the time spent waiting.
    pub fn effective_bid(&self, current_time: f64) -> f64 {
        self.bid + self.time_cost(current_time)
    }
}

/// Aggregated bidding state of one lane.
#[derive(Debug, Clone)]
pub struct LaneOrder {
    pub lane: LaneId,

    /// Position in which the lane was registered, used to break bid ties.
    pub registration_index: usize,

    /// Newest vehicles first.
    vehicles: VecDeque<QueueVehicle>,

    /// Sum of effective bids as of the last update.
    lane_bid: f64,
}

impl LaneOrder {
    pub fn new(lane: LaneId, registration_index: usize) -> Self {
        LaneOrder { lane, registration_index, vehicles: VecDeque::new(), lane_bid: 0.0 }
    }

    pub fn lane_bid(&self) -> f64 {
        self.lane_bid
    }

    /// Recomputes the lane bid at `current_time`.
    pub fn update_lane_bid(&mut self, current_time: f64) -> f64 {
        self.lane_bid = self.vehicles.iter().map(|vehicle| vehicle.effective_bid(current_time)).sum();
        return self.lane_bid;
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &QueueVehicle> {
        self.vehicles.iter()
    }

    pub fn vehicle(&self, vin: Vin) -> Option<&QueueVehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.vin == vin)
    }

    /// Reactivates a tracked vehicle or starts tracking a new one at `current_time`.
    pub fn add_vehicle(&mut self, vin: Vin, bid: f64, current_time: f64) {
        if let Some(vehicle) = self.vehicles.iter_mut().find(|vehicle| vehicle.vin == vin) {
            vehicle.is_active = true;
            return;
        }

        self.vehicles.push_front(QueueVehicle::new(vin, bid, current_time));
        self.update_lane_bid(current_time);
    }

    pub fn set_inactive(&mut self) {
        for vehicle in self.vehicles.iter_mut() {
            vehicle.is_active = false;
        }
    }

    /// Drops every inactive vehicle, recomputing the lane bid after each removal.
    ///
    /// # Returns
    /// The removed vehicles.
    pub fn remove_inactive_vehicles(&mut self, current_time: f64) -> Vec<QueueVehicle> {
        let mut removed = Vec::new();

        while let Some(position) = self.vehicles.iter().position(|vehicle| !vehicle.is_active) {
            if let Some(vehicle) = self.vehicles.remove(position) {
                removed.push(vehicle);
            }
            self.update_lane_bid(current_time);
        }

        return removed;
    }
}

/// Tracks per-lane aggregated bids across admission cycles and orders proposals by them.
#[derive(Debug, Clone, Default)]
pub struct BidLaneTrack {
    /// Lanes in priority order after the last bid update.
    lanes: Vec<LaneOrder>,
}

impl BidLaneTrack {
    /// One [`LaneOrder`] per lane vehicles can arrive on.
    pub fn new(lanes: impl IntoIterator<Item = LaneId>) -> Self {
        let lanes = lanes.into_iter().enumerate().map(|(index, lane)| LaneOrder::new(lane, index)).collect();
        BidLaneTrack { lanes }
    }

    pub fn lane_order(&self, lane: LaneId) -> Option<&LaneOrder> {
        self.lanes.iter().find(|order| order.lane == lane)
    }

    /// Lanes in their current priority order.
    pub fn lanes(&self) -> &[LaneOrder] {
        &self.lanes
    }

    pub fn set_all_to_inactive(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.set_inactive();
        }
    }

    /// Reactivates or adds the vehicle of every proposal in `traffic`, then purges
    /// vehicles that no longer propose.
    ///
    /// Callers mark all vehicles inactive via [`Self::set_all_to_inactive`] first.
    pub fn refresh_traffic<'p>(&mut self, traffic: impl IntoIterator<Item = &'p IndexedProposal>, current_time: f64) {
        for indexed in traffic {
            let proposal = &indexed.proposal;
            match self.lanes.iter_mut().find(|order| order.lane == proposal.arrival_lane) {
                Some(lane) => lane.add_vehicle(proposal.vin, proposal.bid, current_time),
                None => log::warn!("{:?} proposes on lane {} which has no bid tracking.", proposal.vin, proposal.arrival_lane),
            }
        }

        for lane in self.lanes.iter_mut() {
            let removed = lane.remove_inactive_vehicles(current_time);
            if !removed.is_empty() {
                log::debug!("Lane {}: {} vehicles stopped bidding, lane bid now {:.4}.", lane.lane, removed.len(), lane.lane_bid());
            }
        }
    }

    /// Recomputes every lane bid and sorts lanes by it, highest first.
    pub fn update_all_lane_bids(&mut self, current_time: f64) {
        for lane in self.lanes.iter_mut() {
            lane.update_lane_bid(current_time);
        }

        self.lanes.sort_by(LaneBidCompare::compare);
    }

    /// Groups `proposals` by arrival lane in lane priority order, keeping the
    /// relative order inside each lane. Proposals on untracked lanes follow last.
    pub fn reorder_proposals(&mut self, proposals: Vec<IndexedProposal>, current_time: f64) -> Vec<IndexedProposal> {
        self.update_all_lane_bids(current_time);

        let rank: HashMap<LaneId, usize> = self.lanes.iter().enumerate().map(|(rank, order)| (order.lane, rank)).collect();
        let untracked = self.lanes.len();

        let mut ranked: Vec<(usize, IndexedProposal)> =
            proposals.into_iter().map(|proposal| (rank.get(&proposal.proposal.arrival_lane).copied().unwrap_or(untracked), proposal)).collect();

        // Stable sort keeps intra-lane order.
        ranked.sort_by_key(|(rank, _)| *rank);

        return ranked.into_iter().map(|(_, proposal)| proposal).collect();
    }
}
