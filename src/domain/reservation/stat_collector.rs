use std::collections::BTreeSet;
use std::io::Write;

use crate::domain::reservation::reservation_grid::ReservationGrid;
use crate::domain::utils::id::Vin;
use crate::error::Result;

/// One change of the set of vehicles holding tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct VinHistoryEntry {
    pub time: f64,
    pub vins: BTreeSet<Vin>,
}

/// Records which vehicles hold reservations at the manager's current time,
/// keeping an entry only when that set changes.
#[derive(Debug, Clone, Default)]
pub struct VinHistoryStatCollector {
    history: Vec<VinHistoryEntry>,
}

impl VinHistoryStatCollector {
    pub fn new() -> Self {
        VinHistoryStatCollector { history: Vec::new() }
    }

    pub fn collect(&mut self, grid: &ReservationGrid, current_time: f64) {
        let vins = grid.vins_at(current_time);

        let changed = match self.history.last() {
            Some(last) => last.vins != vins,
            None => !vins.is_empty(),
        };

        if changed {
            self.history.push(VinHistoryEntry { time: current_time, vins });
        }
    }

    pub fn history(&self) -> &[VinHistoryEntry] {
        &self.history
    }

    /// Writes one row per entry: `time,vin,vin,...`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_wtr = csv::WriterBuilder::new().flexible(true).has_headers(false).from_writer(writer);

        for entry in &self.history {
            let mut row = Vec::with_capacity(entry.vins.len() + 1);
            row.push(entry.time.to_string());
            row.extend(entry.vins.iter().map(|vin| vin.to_string()));
            csv_wtr.write_record(&row)?;
        }

        csv_wtr.flush()?;

        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::reservation_grid::TimeTile;
    use crate::domain::utils::id::TileId;

    #[test]
    fn records_only_changes() {
        let mut grid = ReservationGrid::new(1.0).unwrap();
        grid.reserve(Vin::new(3), &[TimeTile::new(1, TileId::new(0)), TimeTile::new(2, TileId::new(0))]);
        grid.reserve(Vin::new(5), &[TimeTile::new(2, TileId::new(1))]);

        let mut collector = VinHistoryStatCollector::new();
        for time in [0.0, 1.0, 1.5, 2.0, 3.0] {
            collector.collect(&grid, time);
        }

        let history = collector.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].time, 1.0);
        assert_eq!(history[1].vins, BTreeSet::from([Vin::new(3), Vin::new(5)]));
        assert!(history[2].vins.is_empty());
    }

    #[test]
    fn csv_rows_list_time_and_vins() {
        let mut grid = ReservationGrid::new(1.0).unwrap();
        grid.reserve(Vin::new(3), &[TimeTile::new(1, TileId::new(0))]);
        grid.reserve(Vin::new(5), &[TimeTile::new(1, TileId::new(1))]);

        let mut collector = VinHistoryStatCollector::new();
        collector.collect(&grid, 1.0);
        collector.collect(&grid, 2.0);

        let mut out = Vec::new();
        collector.write_csv(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1,3,5\n2\n");
    }
}
