//! Plant behavior: aging (faster in rain) and spreading (more likely in wind).

use crate::context::SimulationContext;
use crate::entity::EntityCore;
use crate::environment::Weather;
use crate::field::Field;
use crate::species::PlantProfile;
use savanna_core::{EntityId, Location, Species};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Plant {
    core: EntityCore,
    profile: Arc<PlantProfile>,
}

impl Plant {
    pub fn new(profile: Arc<PlantProfile>, location: Location) -> Self {
        Self::with_age(profile, location, 0)
    }

    pub fn with_age(profile: Arc<PlantProfile>, location: Location, age: u32) -> Self {
        Self {
            core: EntityCore::new(profile.species, location, age),
            profile,
        }
    }

    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    pub fn profile(&self) -> &PlantProfile {
        &self.profile
    }

    pub fn id(&self) -> EntityId {
        self.core.id()
    }

    pub fn species(&self) -> Species {
        self.core.species()
    }

    pub fn age(&self) -> u32 {
        self.core.age()
    }

    pub fn is_alive(&self) -> bool {
        self.core.is_alive()
    }

    pub fn location(&self) -> Option<Location> {
        self.core.location()
    }

    /// Doubled when windy
    pub fn spreading_probability(&self, weather: &Weather) -> f64 {
        if weather.is_windy() {
            self.profile.spreading_probability * 2.0
        } else {
            self.profile.spreading_probability
        }
    }

    pub(crate) fn step(
        &mut self,
        field: &mut Field,
        context: &mut SimulationContext,
        newborns: &mut Vec<EntityId>,
    ) {
        self.core.increment_age(self.profile.max_age, &mut field.grid);
        if context.weather().is_rainy() {
            self.core.increment_age(self.profile.max_age, &mut field.grid);
        }

        if !self.is_alive() {
            return;
        }

        let probability = self.spreading_probability(context.weather());
        if context.chance(probability) {
            self.spread(field, newborns, context.step());
        }
    }

    /// One seedling in every free neighbor
    fn spread(&self, field: &mut Field, newborns: &mut Vec<EntityId>, tick: u64) {
        let Some(here) = self.location() else { return };
        let free = field.grid.free_adjacent(here);
        let count = free.len();

        for loc in free {
            let seedling = Plant::new(self.profile.clone(), loc);
            newborns.push(field.spawn(seedling.into()));
        }

        trace!(
            plant_id = %self.id(),
            species = %self.species(),
            seedlings = count,
            tick = tick,
            "Plant spread"
        );
    }
}
