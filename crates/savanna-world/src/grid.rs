//! 2D occupancy grid for the field.

use savanna_core::{Direction, EntityId, GridConfig, Location};
use tracing::warn;

/// A bounded (non-wrapping) grid holding at most one entity per cell
#[derive(Debug, Clone)]
pub struct Grid {
    pub depth: i32,
    pub width: i32,
    cells: Vec<Option<EntityId>>,
}

impl Grid {
    /// Both dimensions must be positive; use [`Grid::from_config`] for
    /// unchecked input.
    pub fn new(depth: i32, width: i32) -> Self {
        Self {
            depth,
            width,
            cells: vec![None; cell_count(depth, width)],
        }
    }

    /// Create a grid from configuration, falling back to the default
    /// dimensions when either is non-positive
    pub fn from_config(config: &GridConfig) -> Self {
        let resolved = config.resolved();
        Self::new(resolved.depth, resolved.width)
    }

    pub fn contains(&self, loc: Location) -> bool {
        loc.row >= 0 && loc.row < self.depth && loc.col >= 0 && loc.col < self.width
    }

    /// Occupant at a location; out-of-bounds locations are empty
    pub fn occupant_at(&self, loc: Location) -> Option<EntityId> {
        if !self.contains(loc) {
            return None;
        }
        self.cells[self.loc_to_index(loc)]
    }

    pub fn is_free(&self, loc: Location) -> bool {
        self.contains(loc) && self.occupant_at(loc).is_none()
    }

    /// Claim a cell. The last placement wins: an existing occupant is
    /// overwritten, not rejected.
    pub fn place(&mut self, id: EntityId, loc: Location) {
        if !self.contains(loc) {
            warn!(entity_id = %id, row = loc.row, col = loc.col, "Placement outside the grid ignored");
            return;
        }
        let index = self.loc_to_index(loc);
        if let Some(previous) = self.cells[index] {
            if previous != id {
                warn!(
                    entity_id = %id,
                    previous_occupant = %previous,
                    row = loc.row,
                    col = loc.col,
                    "Placement overwrote an occupied cell"
                );
            }
        }
        self.cells[index] = Some(id);
    }

    pub fn clear(&mut self, loc: Location) {
        if self.contains(loc) {
            let index = self.loc_to_index(loc);
            self.cells[index] = None;
        }
    }

    pub fn clear_all(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
    }

    /// Up to eight neighbors, clipped at the edges, in [`Direction::all`] order
    pub fn adjacent(&self, loc: Location) -> Vec<Location> {
        Direction::all()
            .into_iter()
            .map(|direction| loc.offset(direction))
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }

    /// Neighbors that currently have no occupant, in scan order
    pub fn free_adjacent(&self, loc: Location) -> Vec<Location> {
        self.adjacent(loc)
            .into_iter()
            .filter(|neighbor| self.occupant_at(*neighbor).is_none())
            .collect()
    }

    fn loc_to_index(&self, loc: Location) -> usize {
        loc.row as usize * self.width as usize + loc.col as usize
    }

    /// Get location from index
    pub fn index_to_loc(&self, index: usize) -> Location {
        let width = self.width as usize;
        Location::new((index / width) as i32, (index % width) as i32)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterator over all locations, row by row
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_loc(i))
    }

    /// Iterator over all cells with locations
    pub fn iter(&self) -> impl Iterator<Item = (Location, Option<EntityId>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_loc(i), *cell))
    }
}

/// Cells in a `depth` x `width` grid, counted in `usize` so large
/// dimensions cannot overflow; zero if either is non-positive
fn cell_count(depth: i32, width: i32) -> usize {
    depth.max(0) as usize * width.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 12);
        assert_eq!(grid.depth, 10);
        assert_eq!(grid.width, 12);
        assert_eq!(grid.len(), 120);
        assert!(grid.iter().all(|(_, cell)| cell.is_none()));
    }

    #[test]
    fn test_grid_from_invalid_config() {
        let grid = Grid::from_config(&GridConfig { depth: -1, width: 0 });
        assert_eq!(grid.depth, savanna_core::DEFAULT_DEPTH);
        assert_eq!(grid.width, savanna_core::DEFAULT_WIDTH);
    }

    #[test]
    fn test_adjacent_interior_and_edges() {
        let grid = Grid::new(10, 10);

        let interior = grid.adjacent(Location::new(5, 5));
        assert_eq!(interior.len(), 8);
        assert!(!interior.contains(&Location::new(5, 5)));
        assert_eq!(interior[0], Location::new(4, 4));
        assert_eq!(interior[7], Location::new(6, 6));

        let corner = grid.adjacent(Location::new(0, 0));
        assert_eq!(
            corner,
            vec![Location::new(0, 1), Location::new(1, 0), Location::new(1, 1)]
        );

        let edge = grid.adjacent(Location::new(0, 5));
        assert_eq!(edge.len(), 5);
    }

    #[test]
    fn test_adjacent_on_single_cell_grid() {
        let grid = Grid::new(1, 1);
        assert!(grid.adjacent(Location::new(0, 0)).is_empty());
    }

    #[test]
    fn test_place_and_clear() {
        let mut grid = Grid::new(3, 3);
        let id = EntityId::new();
        let loc = Location::new(1, 2);

        grid.place(id, loc);
        assert_eq!(grid.occupant_at(loc), Some(id));
        assert!(!grid.is_free(loc));

        grid.clear(loc);
        assert_eq!(grid.occupant_at(loc), None);
        assert!(grid.is_free(loc));
    }

    #[test]
    fn test_last_placement_wins() {
        let mut grid = Grid::new(3, 3);
        let first = EntityId::new();
        let second = EntityId::new();
        let loc = Location::new(0, 0);

        grid.place(first, loc);
        grid.place(second, loc);
        assert_eq!(grid.occupant_at(loc), Some(second));
    }

    #[test]
    fn test_free_adjacent() {
        let mut grid = Grid::new(3, 3);
        let center = Location::new(1, 1);
        grid.place(EntityId::new(), Location::new(0, 0));
        grid.place(EntityId::new(), Location::new(2, 2));

        let free = grid.free_adjacent(center);
        assert_eq!(free.len(), 6);
        assert!(!free.contains(&Location::new(0, 0)));
        assert!(!free.contains(&Location::new(2, 2)));
    }

    #[test]
    fn test_out_of_bounds_is_empty_and_ignored() {
        let mut grid = Grid::new(2, 2);
        let outside = Location::new(5, -1);
        grid.place(EntityId::new(), outside);
        assert_eq!(grid.occupant_at(outside), None);
        assert!(!grid.is_free(outside));
        assert!(grid.iter().all(|(_, cell)| cell.is_none()));
    }

    #[test]
    fn test_index_round_trip() {
        let grid = Grid::new(4, 7);
        let locations: Vec<Location> = grid.locations().collect();
        assert_eq!(locations.len(), 28);
        assert_eq!(locations[0], Location::new(0, 0));
        assert_eq!(locations[8], Location::new(1, 1));
        assert_eq!(grid.index_to_loc(27), Location::new(3, 6));
    }

    #[test]
    fn test_cell_count_does_not_overflow() {
        assert_eq!(cell_count(i32::MAX, 2), i32::MAX as usize * 2);
        assert_eq!(cell_count(70_000, 70_000), 4_900_000_000);
        assert_eq!(cell_count(-1, 10), 0);
        assert_eq!(cell_count(10, 0), 0);
    }
}
