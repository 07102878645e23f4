pub mod bid_lane_track;
pub mod lane_bid_compare;
pub mod proposal;
pub mod wallet;
pub mod wallet_reordering;
