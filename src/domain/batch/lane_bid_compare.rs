use std::cmp::Ordering;

use crate::domain::batch::bid_lane_track::LaneOrder;

/// Orders lanes by their aggregated bid, highest first.
pub struct LaneBidCompare;

impl LaneBidCompare {
    /// Returns `Ordering::Less` if `lane1` has the higher lane bid and should be served first.
    ///
    /// Note: equal (or incomparable) bids fall back to the registration index of the
    ///       lanes, so the order is total and stable across refreshes.
    pub fn compare(lane1: &LaneOrder, lane2: &LaneOrder) -> Ordering {
        if lane1.registration_index == lane2.registration_index {
            return Ordering::Equal;
        }

        match lane2.lane_bid().partial_cmp(&lane1.lane_bid()) {
            Some(Ordering::Equal) | None => lane1.registration_index.cmp(&lane2.registration_index),
            Some(ord) => ord,
        }
    }
}
