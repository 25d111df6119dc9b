//! Lifecycle shared by plants and animals.

use crate::animal::Animal;
use crate::context::SimulationContext;
use crate::field::Field;
use crate::grid::Grid;
use crate::plant::Plant;
use savanna_core::{DeathCause, EntityId, Location, Species};
use tracing::trace;

/// Identity, age and placement of a living thing
#[derive(Debug, Clone)]
pub struct EntityCore {
    id: EntityId,
    species: Species,
    age: u32,
    alive: bool,
    location: Option<Location>,
    death_cause: Option<DeathCause>,
}

impl EntityCore {
    /// Not yet on any grid; the field places it on spawn
    pub(crate) fn new(species: Species, location: Location, age: u32) -> Self {
        Self {
            id: EntityId::new(),
            species,
            age,
            alive: true,
            location: Some(location),
            death_cause: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub(crate) fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// `None` once dead
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death_cause
    }

    /// One step older; past `max_age` the entity dies
    pub(crate) fn increment_age(&mut self, max_age: u32, grid: &mut Grid) {
        self.age += 1;
        if self.age > max_age {
            self.kill(grid, DeathCause::OldAge);
        }
    }

    /// Move to `loc`, vacating the previous cell first
    pub(crate) fn set_location(&mut self, grid: &mut Grid, loc: Location) {
        if let Some(previous) = self.location {
            grid.clear(previous);
        }
        self.location = Some(loc);
        grid.place(self.id, loc);
    }

    /// Mark dead and give up the cell. Only the first call has any effect;
    /// returns whether this call did the killing.
    pub(crate) fn kill(&mut self, grid: &mut Grid, cause: DeathCause) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.death_cause = Some(cause);
        if let Some(loc) = self.location.take() {
            grid.clear(loc);
            trace!(
                entity_id = %self.id,
                species = %self.species,
                age = self.age,
                row = loc.row,
                col = loc.col,
                cause = %cause,
                "Entity died"
            );
        }
        true
    }
}

/// Anything that occupies a cell
#[derive(Debug, Clone)]
pub enum Entity {
    Animal(Animal),
    Plant(Plant),
}

impl Entity {
    pub fn core(&self) -> &EntityCore {
        match self {
            Entity::Animal(animal) => animal.core(),
            Entity::Plant(plant) => plant.core(),
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut EntityCore {
        match self {
            Entity::Animal(animal) => animal.core_mut(),
            Entity::Plant(plant) => plant.core_mut(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.core().id()
    }

    pub fn species(&self) -> Species {
        self.core().species()
    }

    pub fn age(&self) -> u32 {
        self.core().age()
    }

    pub fn is_alive(&self) -> bool {
        self.core().is_alive()
    }

    pub fn location(&self) -> Option<Location> {
        self.core().location()
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.core().death_cause()
    }

    pub fn is_plant(&self) -> bool {
        matches!(self, Entity::Plant(_))
    }

    pub fn max_age(&self) -> u32 {
        match self {
            Entity::Animal(animal) => animal.profile().max_age,
            Entity::Plant(plant) => plant.profile().max_age,
        }
    }

    /// Food gained by whoever eats this entity
    pub fn food_value(&self) -> i32 {
        match self {
            Entity::Animal(animal) => animal.profile().food_value,
            Entity::Plant(plant) => plant.profile().food_value,
        }
    }

    pub fn as_animal(&self) -> Option<&Animal> {
        match self {
            Entity::Animal(animal) => Some(animal),
            Entity::Plant(_) => None,
        }
    }

    pub fn as_plant(&self) -> Option<&Plant> {
        match self {
            Entity::Plant(plant) => Some(plant),
            Entity::Animal(_) => None,
        }
    }

    pub(crate) fn kill(&mut self, grid: &mut Grid, cause: DeathCause) -> bool {
        self.core_mut().kill(grid, cause)
    }

    /// One tick of behavior. Newly created entities are spawned into the
    /// field and their ids pushed to `newborns`; the caller decides when
    /// they join the acting population.
    pub(crate) fn step(
        &mut self,
        field: &mut Field,
        context: &mut SimulationContext,
        newborns: &mut Vec<EntityId>,
    ) {
        match self {
            Entity::Animal(animal) => animal.step(field, context, newborns),
            Entity::Plant(plant) => plant.step(field, context, newborns),
        }
    }
}

impl From<Animal> for Entity {
    fn from(animal: Animal) -> Self {
        Entity::Animal(animal)
    }
}

impl From<Plant> for Entity {
    fn from(plant: Plant) -> Self {
        Entity::Plant(plant)
    }
}
