//! The grid together with the entities it references.

use crate::entity::Entity;
use crate::grid::Grid;
use savanna_core::{EntityId, Error, GridConfig, Location, PopulationStats, Result, Species};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occupancy grid plus the store of every entity that is on it or died
/// since the last compaction
pub struct Field {
    pub(crate) grid: Grid,
    pub(crate) entities: HashMap<EntityId, Entity>,
}

impl Field {
    pub fn new(depth: i32, width: i32) -> Self {
        Self {
            grid: Grid::new(depth, width),
            entities: HashMap::new(),
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            grid: Grid::from_config(config),
            entities: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn depth(&self) -> i32 {
        self.grid.depth
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    /// Put a new entity on its recorded location and store it
    pub(crate) fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        if let Some(loc) = entity.location() {
            self.grid.place(id, loc);
        }
        self.entities.insert(id, entity);
        id
    }

    /// Checked spawn for entities built outside the engine: the target
    /// cell must exist and be free
    pub(crate) fn try_spawn(&mut self, entity: Entity) -> Result<EntityId> {
        let loc = entity
            .location()
            .ok_or_else(|| Error::Validation("entity has no location".to_string()))?;
        if !self.grid.contains(loc) {
            return Err(Error::Validation(format!("{} is outside the field", loc)));
        }
        if let Some(occupant) = self.grid.occupant_at(loc) {
            return Err(Error::Validation(format!(
                "{} is already occupied by {}",
                loc, occupant
            )));
        }
        Ok(self.spawn(entity))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Lift an entity out of the store so it can act with mutable access
    /// to its neighbors. Its cell stays claimed until it is restored.
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub(crate) fn restore(&mut self, entity: Entity) {
        self.entities.insert(entity.id(), entity);
    }

    pub fn occupant_at(&self, loc: Location) -> Option<&Entity> {
        self.grid
            .occupant_at(loc)
            .and_then(|id| self.entities.get(&id))
    }

    pub fn species_at(&self, loc: Location) -> Option<Species> {
        self.occupant_at(loc).map(|entity| entity.species())
    }

    /// Drop dead entities from the store, returning them
    pub(crate) fn remove_dead(&mut self) -> Vec<Entity> {
        let dead: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, entity)| !entity.is_alive())
            .map(|(id, _)| *id)
            .collect();

        dead.into_iter()
            .filter_map(|id| self.entities.remove(&id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.grid.clear_all();
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            depth: self.grid.depth,
            width: self.grid.width,
            cells: self
                .grid
                .iter()
                .map(|(loc, _)| self.species_at(loc))
                .collect(),
        }
    }

    /// Check that grid and entity records agree: every occupied cell
    /// points at a live stored entity located there, and every live
    /// entity is found at exactly its recorded cell.
    pub fn check_consistency(&self) -> Result<()> {
        for (loc, occupant) in self.grid.iter() {
            let Some(id) = occupant else { continue };
            let entity = self.entities.get(&id).ok_or_else(|| {
                Error::Validation(format!("{} references missing entity {}", loc, id))
            })?;
            if !entity.is_alive() {
                return Err(Error::Validation(format!("{} references dead entity {}", loc, id)));
            }
            if entity.location() != Some(loc) {
                return Err(Error::Validation(format!(
                    "{} holds {} but it believes it is at {:?}",
                    loc,
                    id,
                    entity.location()
                )));
            }
        }

        for entity in self.entities.values() {
            match (entity.is_alive(), entity.location()) {
                (true, Some(loc)) => {
                    if self.grid.occupant_at(loc) != Some(entity.id()) {
                        return Err(Error::Validation(format!(
                            "live entity {} is not on its cell {}",
                            entity.id(),
                            loc
                        )));
                    }
                }
                (true, None) => {
                    return Err(Error::Validation(format!(
                        "live entity {} has no location",
                        entity.id()
                    )));
                }
                (false, Some(loc)) => {
                    return Err(Error::Validation(format!(
                        "dead entity {} still holds {}",
                        entity.id(),
                        loc
                    )));
                }
                (false, None) => {}
            }
        }
        Ok(())
    }
}

/// Read-only view of which species sits in each cell, row by row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub depth: i32,
    pub width: i32,
    pub cells: Vec<Option<Species>>,
}

impl FieldSnapshot {
    pub fn get(&self, loc: Location) -> Option<Species> {
        if loc.row < 0 || loc.row >= self.depth || loc.col < 0 || loc.col >= self.width {
            return None;
        }
        self.cells[loc.row as usize * self.width as usize + loc.col as usize]
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats::from_cells(&self.cells)
    }

    /// One character per cell, one line per row; handy in logs and tests
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.depth.max(0) as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            for cell in row {
                out.push(match cell {
                    Some(Species::Lion) => 'L',
                    Some(Species::Human) => 'H',
                    Some(Species::Elephant) => 'E',
                    Some(Species::Zebra) => 'Z',
                    Some(Species::Buffalo) => 'B',
                    Some(Species::Grass) => '.',
                    None => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}
