use std::collections::HashMap;

use crate::api::config_dto::BatchConfigDto;
use crate::domain::batch::bid_lane_track::BidLaneTrack;
use crate::domain::batch::proposal::{IndexedProposal, ProposalQueue};
use crate::domain::intersection::topology::Intersection;
use crate::domain::utils::id::{LaneId, RoadId};
use crate::error::{Error, Result};

pub const DEFAULT_PROCESSING_INTERVAL: f64 = 2.0;
pub const DEFAULT_LOOKAHEAD_TIME: f64 = 3.0;
pub const DEFAULT_COMP_COMM_DELAY: f64 = 0.05;

/// Cadence and window of batch admission, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Time between two batches.
    pub processing_interval: f64,

    /// Offset from the current time at which the selection window opens.
    pub lookahead_time: f64,

    /// Width of the selection window.
    pub batch_interval: f64,

    /// Computation and communication delay between processing and the proposal deadline.
    pub comp_comm_delay: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            processing_interval: DEFAULT_PROCESSING_INTERVAL,
            lookahead_time: DEFAULT_LOOKAHEAD_TIME,
            batch_interval: DEFAULT_PROCESSING_INTERVAL,
            comp_comm_delay: DEFAULT_COMP_COMM_DELAY,
        }
    }
}

impl BatchConfig {
    pub fn from_dto(dto: &BatchConfigDto) -> Result<Self> {
        let config = BatchConfig {
            processing_interval: dto.processing_interval,
            lookahead_time: dto.lookahead_time,
            batch_interval: dto.batch_interval.unwrap_or(dto.processing_interval),
            comp_comm_delay: dto.comp_comm_delay,
        };
        config.validate()?;

        return Ok(config);
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("processingInterval", self.processing_interval), ("batchInterval", self.batch_interval)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(Error::InvalidConfiguration(format!("{} must be positive, got {}", field, value)));
            }
        }

        for (field, value) in [("lookaheadTime", self.lookahead_time), ("compCommDelay", self.comp_comm_delay)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(Error::InvalidConfiguration(format!("{} must not be negative, got {}", field, value)));
            }
        }

        return Ok(());
    }
}

/// Periodic batch admission: selects a look-ahead window of pending proposals,
/// groups them by arrival road and orders them by aggregated lane bids.
#[derive(Debug, Clone)]
pub struct WalletBasedReordering {
    config: BatchConfig,
    bid_lane_track: BidLaneTrack,
    road_of_lane: HashMap<LaneId, RoadId>,
    next_processing_time: f64,
    next_proposal_deadline: f64,
}

impl WalletBasedReordering {
    /// Tracks bids on every entry lane of `intersection`.
    pub fn new(config: BatchConfig, intersection: &Intersection) -> Self {
        let entry_lanes: Vec<_> = intersection.entry_roads().iter().flat_map(|road| road.lanes.iter().copied()).collect();
        let road_of_lane = intersection.lanes().iter().map(|lane| (lane.id, lane.road)).collect();

        WalletBasedReordering {
            config,
            bid_lane_track: BidLaneTrack::new(entry_lanes),
            road_of_lane,
            next_processing_time: 0.0,
            next_proposal_deadline: config.comp_comm_delay,
        }
    }

    pub fn set_initial_time(&mut self, init_time: f64) {
        self.next_processing_time = init_time + self.config.processing_interval;
        self.next_proposal_deadline = self.next_processing_time + self.config.comp_comm_delay;
    }

    pub fn next_processing_time(&self) -> f64 {
        self.next_processing_time
    }

    pub fn next_proposal_deadline(&self) -> f64 {
        self.next_proposal_deadline
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn bid_lane_track(&self) -> &BidLaneTrack {
        &self.bid_lane_track
    }

    /// Selects, partitions and bid-orders the next batch from `queue`, then
    /// schedules the following batch.
    ///
    /// All of `queue` feeds the lane bids, not just the selected batch.
    pub fn get_batch(&mut self, current_time: f64, queue: &ProposalQueue) -> Vec<IndexedProposal> {
        let selected = self.select_proposals(current_time, queue);
        let partitioned = self.partition_by_road(selected);

        self.bid_lane_track.set_all_to_inactive();
        self.bid_lane_track.refresh_traffic(queue.iter(), current_time);
        let batch = self.bid_lane_track.reorder_proposals(partitioned, current_time);

        self.next_processing_time = current_time + self.config.processing_interval;
        self.next_proposal_deadline = self.next_processing_time + self.config.comp_comm_delay;

        log::info!(
            "Batch at {:.2}: {} of {} pending proposals selected, next batch at {:.2}.",
            current_time,
            batch.len(),
            queue.len(),
            self.next_processing_time
        );

        return batch;
    }

    /// Every proposal arriving before the end of the window, plus the first one at or
    /// past it. The queue is ordered by arrival time, so selection stops there.
    pub fn select_proposals(&self, current_time: f64, queue: &ProposalQueue) -> Vec<IndexedProposal> {
        let end_time = current_time + self.config.lookahead_time + self.config.batch_interval;

        let mut result = Vec::new();
        for proposal in queue.iter() {
            result.push(proposal.clone());
            if proposal.proposal.arrival_time >= end_time {
                break;
            }
        }

        return result;
    }

    /// Groups proposals by the road of their arrival lane, roads in order of first
    /// appearance, keeping the relative order inside each group.
    pub fn partition_by_road(&self, proposals: Vec<IndexedProposal>) -> Vec<IndexedProposal> {
        let mut groups: Vec<(Option<RoadId>, Vec<IndexedProposal>)> = Vec::new();

        for proposal in proposals {
            let road = self.road_of_lane.get(&proposal.proposal.arrival_lane).copied();
            match groups.iter_mut().find(|(group_road, _)| *group_road == road) {
                Some((_, group)) => group.push(proposal),
                None => groups.push((road, vec![proposal])),
            }
        }

        return groups.into_iter().flat_map(|(_, group)| group).collect();
    }
}
