use crate::domain::intersection::geometry::{ConvexPolygon, Point2d, Rect};
use crate::domain::utils::id::TileId;
use crate::error::{Error, Result};

/// Atomic unit of intersection space used for occupancy bookkeeping.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Dense id in `0..number_of_tiles`.
    pub id: TileId,

    /// Column index within the tiling.
    pub x: usize,

    /// Row index within the tiling.
    pub y: usize,

    /// **true** if the tile lies on the tiling border or misses one of its eight
    /// neighbours, i.e. it borders the boundary of the controlled area.
    pub is_edge_tile: bool,

    pub rect: Rect,
}

/// Square tiling of an intersection area. Only squares that actually overlap the
/// area become tiles.
#[derive(Debug, Clone)]
pub struct TiledArea {
    bounds: Rect,
    tile_length: f64,
    x_num: usize,
    y_num: usize,
    tiles: Vec<Tile>,

    /// Column-major lookup `x * y_num + y` into `tiles`.
    grid: Vec<Option<TileId>>,
}

impl TiledArea {
    /// Tiles `area` with squares of side `tile_length` meters.
    pub fn new(area: &ConvexPolygon, tile_length: f64) -> Result<Self> {
        if !(tile_length > 0.0) || !tile_length.is_finite() {
            return Err(Error::InvalidConfiguration(format!("Tile length must be positive, got {}", tile_length)));
        }

        let bounds = area.bounding_box();
        let x_num = (bounds.width() / tile_length) as usize + 1;
        let y_num = (bounds.height() / tile_length) as usize + 1;

        let mut tiles = Vec::new();
        let mut grid = vec![None; x_num * y_num];

        for x in 0..x_num {
            for y in 0..y_num {
                let min = Point2d::new(bounds.min.x + x as f64 * tile_length, bounds.min.y + y as f64 * tile_length);
                let rect = Rect::new(min, Point2d::new(min.x + tile_length, min.y + tile_length));

                if rect.to_polygon().intersects(area) {
                    let id = TileId::new(tiles.len() as u32);
                    grid[x * y_num + y] = Some(id);
                    tiles.push(Tile { id, x, y, is_edge_tile: false, rect });
                }
            }
        }

        if tiles.is_empty() {
            return Err(Error::ModelConstructionError("Intersection area produced no tiles".to_string()));
        }

        let mut tiled_area = TiledArea { bounds, tile_length, x_num, y_num, tiles, grid };
        tiled_area.mark_edge_tiles();

        return Ok(tiled_area);
    }

    fn mark_edge_tiles(&mut self) {
        let edge_flags: Vec<bool> = self.tiles.iter().map(|tile| self.is_on_edge(tile.x, tile.y)).collect();

        for (tile, is_edge) in self.tiles.iter_mut().zip(edge_flags) {
            tile.is_edge_tile = is_edge;
        }
    }

    fn is_on_edge(&self, x: usize, y: usize) -> bool {
        if x == 0 || y == 0 || x + 1 == self.x_num || y + 1 == self.y_num {
            return true;
        }

        for dx in [-1i64, 0, 1] {
            for dy in [-1i64, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x as i64 + dx) as usize;
                let ny = (y as i64 + dy) as usize;
                if self.tile_at(nx, ny).is_none() {
                    return true;
                }
            }
        }

        return false;
    }

    pub fn tile_at(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.x_num || y >= self.y_num {
            return None;
        }
        let id = self.grid[x * self.y_num + y]?;
        return self.tiles.get(id.index());
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn number_of_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile_length(&self) -> f64 {
        self.tile_length
    }

    /// Returns every tile the `shape` overlaps, ordered by column then row.
    ///
    /// Only the tiles under the shape's bounding box are tested.
    pub fn find_occupied_tiles(&self, shape: &ConvexPolygon) -> Vec<&Tile> {
        let bbox = shape.bounding_box();

        if bbox.max.x < self.bounds.min.x || bbox.max.y < self.bounds.min.y {
            return Vec::new();
        }

        let first_column = self.column_of(bbox.min.x);
        let last_column = self.column_of(bbox.max.x).min(self.x_num - 1);
        let first_row = self.row_of(bbox.min.y);
        let last_row = self.row_of(bbox.max.y).min(self.y_num - 1);

        let mut occupied = Vec::new();
        for x in first_column..=last_column {
            for y in first_row..=last_row {
                if let Some(tile) = self.tile_at(x, y) {
                    if tile.rect.to_polygon().intersects(shape) {
                        occupied.push(tile);
                    }
                }
            }
        }

        return occupied;
    }

    fn column_of(&self, x: f64) -> usize {
        ((x - self.bounds.min.x) / self.tile_length).max(0.0) as usize
    }

    fn row_of(&self, y: f64) -> usize {
        ((y - self.bounds.min.y) / self.tile_length).max(0.0) as usize
    }
}
