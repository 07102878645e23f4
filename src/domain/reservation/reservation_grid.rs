use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::utils::id::{TileId, Vin};
use crate::error::{Error, Result};

/// Slack added before flooring so that times sitting exactly on a step boundary
/// are not pushed into the previous step by rounding noise.
const DISCRETE_TIME_EPSILON: f64 = 1e-9;

/// Largest discrete time index the grid addresses. Step indices are clamped to
/// `-MAX_TIME_INDEX..=MAX_TIME_INDEX` so that `index + 1` never overflows.
pub const MAX_TIME_INDEX: i64 = 1 << 40;

/// A single (discrete time, tile) cell of the reservation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeTile {
    pub time: i64,
    pub tile: TileId,
}

impl TimeTile {
    pub fn new(time: i64, tile: TileId) -> Self {
        TimeTile { time, tile }
    }
}

/// Exclusive-ownership bookkeeping of (discrete time, tile) -> owner.
#[derive(Debug, Clone)]
pub struct ReservationGrid {
    /// Duration of one discrete time step in seconds.
    grid_time_step: f64,

    /// Owners of every reserved cell, grouped per discrete time step.
    timeline: BTreeMap<i64, HashMap<TileId, Vin>>,

    /// Cells held by each owner, used for **cancel** and statistics.
    owners: HashMap<Vin, BTreeSet<TimeTile>>,
}

impl ReservationGrid {
    pub fn new(grid_time_step: f64) -> Result<Self> {
        if !(grid_time_step > 0.0) || !grid_time_step.is_finite() {
            return Err(Error::InvalidConfiguration(format!("Grid time step must be positive, got {}", grid_time_step)));
        }

        return Ok(ReservationGrid { grid_time_step, timeline: BTreeMap::new(), owners: HashMap::new() });
    }

    pub fn grid_time_step(&self) -> f64 {
        self.grid_time_step
    }

    /// Index of the discrete time step containing `time`, clamped to
    /// [`MAX_TIME_INDEX`] in both directions.
    pub fn calc_discrete_time(&self, time: f64) -> i64 {
        let index = (time / self.grid_time_step + DISCRETE_TIME_EPSILON).floor();
        if index.is_nan() {
            return 0;
        }

        return (index as i64).clamp(-MAX_TIME_INDEX, MAX_TIME_INDEX);
    }

    /// **true** if `time` is finite and falls inside the addressable step range.
    pub fn is_representable(&self, time: f64) -> bool {
        time.is_finite() && (time / self.grid_time_step).abs() < MAX_TIME_INDEX as f64
    }

    /// Start of the discrete time step `time_index`.
    pub fn calc_time(&self, time_index: i64) -> f64 {
        time_index as f64 * self.grid_time_step
    }

    /// Time left from `time` until the next step boundary, in `(0, grid_time_step]`.
    pub fn calc_remaining_time(&self, time: f64) -> f64 {
        let remaining = self.calc_time(self.calc_discrete_time(time) + 1) - time;

        if remaining <= 0.0 {
            return self.grid_time_step;
        }

        return remaining.min(self.grid_time_step);
    }

    pub fn is_reserved(&self, time: i64, tile: TileId) -> bool {
        self.reserved_by(time, tile).is_some()
    }

    /// **true** if the cell is held by anyone other than `owner`.
    pub fn is_reserved_by_other(&self, time: i64, tile: TileId, owner: Vin) -> bool {
        matches!(self.reserved_by(time, tile), Some(holder) if holder != owner)
    }

    pub fn reserved_by(&self, time: i64, tile: TileId) -> Option<Vin> {
        self.timeline.get(&time)?.get(&tile).copied()
    }

    /// Claims every cell of `working_list` for `owner`.
    ///
    /// # Returns
    /// `true` if all cells were claimed, `false` if any cell is already held by a
    /// different owner. In that case the grid is left untouched.
    pub fn reserve(&mut self, owner: Vin, working_list: &[TimeTile]) -> bool {
        if working_list.is_empty() {
            return true;
        }

        if let Some(conflict) = working_list.iter().find(|cell| self.is_reserved_by_other(cell.time, cell.tile, owner)) {
            log::debug!(
                "Reservation for {:?} rejected: tile {} at step {} is held by {:?}.",
                owner,
                conflict.tile,
                conflict.time,
                self.reserved_by(conflict.time, conflict.tile)
            );
            return false;
        }

        let held = self.owners.entry(owner).or_default();
        for cell in working_list {
            self.timeline.entry(cell.time).or_default().insert(cell.tile, owner);
            held.insert(*cell);
        }

        return true;
    }

    /// Releases every cell held by `owner`. Unknown owners are a no-op.
    pub fn cancel(&mut self, owner: Vin) {
        let Some(cells) = self.owners.remove(&owner) else {
            return;
        };

        for cell in cells {
            let Some(tiles) = self.timeline.get_mut(&cell.time) else {
                log::error!("Grid index out of sync: {:?} holds step {} which has no entries.", owner, cell.time);
                continue;
            };

            if tiles.get(&cell.tile) == Some(&owner) {
                tiles.remove(&cell.tile);
            }
            if tiles.is_empty() {
                self.timeline.remove(&cell.time);
            }
        }
    }

    /// Drops every reservation whose time step lies fully before `current_time`.
    pub fn clean_up(&mut self, current_time: f64) {
        let current_step = self.calc_discrete_time(current_time);
        let retained = self.timeline.split_off(&current_step);
        let expired = std::mem::replace(&mut self.timeline, retained);

        for (time, tiles) in expired {
            for (tile, owner) in tiles {
                if let Some(cells) = self.owners.get_mut(&owner) {
                    cells.remove(&TimeTile::new(time, tile));
                    if cells.is_empty() {
                        self.owners.remove(&owner);
                    }
                }
            }
        }
    }

    /// Clears all reservations.
    pub fn reset(&mut self) {
        log::warn!("Reservation grid reset, {} reservations dropped.", self.reservation_count());
        self.timeline.clear();
        self.owners.clear();
    }

    /// Number of reserved (time, tile) cells.
    pub fn reservation_count(&self) -> usize {
        self.timeline.values().map(|tiles| tiles.len()).sum()
    }

    /// Tiles reserved during the step containing `time`, ordered by tile id.
    pub fn reserved_tiles_at(&self, time: f64) -> Vec<TileId> {
        let mut tiles: Vec<TileId> = match self.timeline.get(&self.calc_discrete_time(time)) {
            Some(tiles) => tiles.keys().copied().collect(),
            None => Vec::new(),
        };
        tiles.sort();

        return tiles;
    }

    /// Owners holding any tile during the step containing `time`.
    pub fn vins_at(&self, time: f64) -> BTreeSet<Vin> {
        match self.timeline.get(&self.calc_discrete_time(time)) {
            Some(tiles) => tiles.values().copied().collect(),
            None => BTreeSet::new(),
        }
    }

    /// Cells held by `owner`, ordered by time then tile.
    pub fn reservations_of(&self, owner: Vin) -> Vec<TimeTile> {
        match self.owners.get(&owner) {
            Some(cells) => cells.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn has_reservations(&self, owner: Vin) -> bool {
        self.owners.contains_key(&owner)
    }
}
