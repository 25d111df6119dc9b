//! World stepper: owns the field, the acting order and the shared context.

use crate::animal::{Animal, AnimalState};
use crate::context::SimulationContext;
use crate::entity::Entity;
use crate::environment::{Clock, Weather};
use crate::field::{Field, FieldSnapshot};
use crate::plant::Plant;
use crate::species::{SpeciesProfile, SpeciesRegistry};
use rand_chacha::ChaCha8Rng;
use savanna_core::{
    DeathTally, EntityId, Error, Location, PopulationStats, Result, SimulationConfig, Species,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, Level};

pub struct World {
    field: Field,
    /// Acting order; newborns are appended after the tick that made them
    entities: Vec<EntityId>,
    context: SimulationContext,
    registry: SpeciesRegistry,
    config: SimulationConfig,
    births: u64,
    deaths: DeathTally,
}

impl World {
    /// Build and populate a world with the built-in species
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_registry(config, SpeciesRegistry::savanna())
    }

    pub fn with_registry(config: SimulationConfig, registry: SpeciesRegistry) -> Result<Self> {
        let context = SimulationContext::new(&config);
        Self::with_context(config, registry, context)
    }

    /// Build around an injected random source
    pub fn with_rng(config: SimulationConfig, registry: SpeciesRegistry, rng: ChaCha8Rng) -> Result<Self> {
        let context = SimulationContext::with_rng(&config, rng);
        Self::with_context(config, registry, context)
    }

    fn with_context(
        config: SimulationConfig,
        registry: SpeciesRegistry,
        context: SimulationContext,
    ) -> Result<Self> {
        Self::validate(&config, &registry)?;

        let mut world = Self {
            field: Field::from_config(&config.grid),
            entities: Vec::new(),
            context,
            registry,
            config,
            births: 0,
            deaths: DeathTally::new(),
        };
        world.populate();
        Ok(world)
    }

    fn validate(config: &SimulationConfig, registry: &SpeciesRegistry) -> Result<()> {
        config.validate()?;
        registry.validate()?;
        for (species, probability) in config.population.priority() {
            if probability > 0.0 && !registry.contains(species) {
                return Err(Error::UnknownSpecies(format!(
                    "{} has a creation probability but no profile",
                    species
                )));
            }
        }
        Ok(())
    }

    /// Throw everything away and populate a fresh field from `config`.
    /// Non-positive dimensions fall back to the defaults.
    #[instrument(skip(self, config), fields(depth = config.grid.depth, width = config.grid.width))]
    pub fn reset(&mut self, config: SimulationConfig) -> Result<()> {
        Self::validate(&config, &self.registry)?;

        self.field = Field::from_config(&config.grid);
        self.entities.clear();
        self.context.reset(&config);
        self.births = 0;
        self.deaths = DeathTally::new();
        self.config = config;
        self.populate();
        Ok(())
    }

    /// Roll each cell against every species in priority order; the first
    /// hit claims the cell
    fn populate(&mut self) {
        let priority = self.config.population.priority();
        let locations: Vec<Location> = self.field.grid().locations().collect();

        for loc in locations {
            for (species, probability) in priority {
                if probability <= 0.0 || !self.context.chance(probability) {
                    continue;
                }
                let entity = match self.registry.get(species) {
                    Some(SpeciesProfile::Animal(profile)) => {
                        Entity::Animal(Animal::seeded(profile.clone(), loc, &mut self.context))
                    }
                    Some(SpeciesProfile::Plant(profile)) => Entity::Plant(Plant::new(profile.clone(), loc)),
                    None => continue,
                };
                let id = self.field.spawn(entity);
                self.entities.push(id);
                break;
            }
        }

        let stats = self.stats();
        info!(
            event = "world_populated",
            depth = self.field.depth(),
            width = self.field.width(),
            population = stats.total(),
            species = %stats.describe(),
            "World populated"
        );
    }

    /// Advance one tick: environment, then every live entity in order,
    /// then compaction and admission of this tick's newborns
    pub fn step(&mut self) {
        let tick = self.context.advance();
        let mut newborns = Vec::new();

        for &id in &self.entities {
            // Already dead (eaten, trampled, infected) earlier this tick
            let Some(mut entity) = self.field.take(id) else { continue };
            if entity.is_alive() {
                entity.step(&mut self.field, &mut self.context, &mut newborns);
            }
            self.field.restore(entity);
        }

        self.births += newborns.len() as u64;
        self.compact();

        // Newborns act from the next tick on
        let field = &self.field;
        self.entities
            .extend(newborns.into_iter().filter(|id| field.get(*id).is_some()));

        if self.config.metrics_interval > 0 && tick % self.config.metrics_interval == 0 {
            self.emit_population_metrics();
        }
    }

    fn compact(&mut self) {
        for dead in self.field.remove_dead() {
            if let Some(cause) = dead.death_cause() {
                self.deaths.record(cause);
            }
        }
        let field = &self.field;
        self.entities.retain(|id| field.get(*id).is_some());
    }

    /// Step until `num_steps` ticks have run or the world stops being viable
    #[instrument(skip(self))]
    pub fn run(&mut self, num_steps: u64) -> WorldSummary {
        info!("Starting simulation for {} steps", num_steps);

        for _ in 0..num_steps {
            if !self.is_viable() {
                info!(step = self.step_count(), "World no longer viable, stopping");
                break;
            }
            self.step();
        }

        let summary = self.summary();
        info!(
            event = "run_complete",
            steps = summary.step,
            population = summary.total_population,
            disease_deaths = summary.disease_deaths,
            births = summary.births,
            deaths = summary.deaths.total(),
            "Run complete"
        );
        summary
    }

    fn emit_population_metrics(&self) {
        let stats = self.stats();
        let tick = self.step_count();

        info!(
            event = "population_metrics",
            tick = tick,
            total_population = stats.total(),
            species = %stats.describe(),
            distinct_species = stats.distinct_species(),
            disease_deaths = self.disease_deaths(),
            births = self.births,
            deaths = self.deaths.total(),
            time = self.context.clock().describe(),
            weather = %self.context.weather(),
            "Population metrics snapshot"
        );

        for species in Species::all() {
            event!(
                Level::DEBUG,
                gauge_name = "population_by_species",
                gauge_value = stats.count(species),
                species = %species,
                tick = tick,
                "Species population"
            );
        }

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = stats.total(),
            tick = tick,
            "Population gauge"
        );
    }

    /// Put an animal with a chosen state on a free cell. It acts from the
    /// next tick.
    pub fn place_animal(&mut self, species: Species, loc: Location, state: AnimalState) -> Result<EntityId> {
        let profile = self.registry.animal(species)?;
        if state.age > profile.max_age {
            return Err(Error::Validation(format!(
                "{} cannot start at age {} (max {})",
                species, state.age, profile.max_age
            )));
        }
        let id = self
            .field
            .try_spawn(Animal::with_state(profile, loc, state).into())?;
        self.entities.push(id);
        debug!(entity_id = %id, species = %species, row = loc.row, col = loc.col, "Animal placed");
        Ok(id)
    }

    /// Put a plant of a chosen age on a free cell
    pub fn place_plant(&mut self, species: Species, loc: Location, age: u32) -> Result<EntityId> {
        let profile = self.registry.plant(species)?;
        if age > profile.max_age {
            return Err(Error::Validation(format!(
                "{} cannot start at age {} (max {})",
                species, age, profile.max_age
            )));
        }
        let id = self
            .field
            .try_spawn(Plant::with_age(profile, loc, age).into())?;
        self.entities.push(id);
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.field.get(id)
    }

    pub fn occupant_at(&self, loc: Location) -> Option<&Entity> {
        self.field.occupant_at(loc)
    }

    /// Ids in acting order
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        self.field.snapshot()
    }

    pub fn stats(&self) -> PopulationStats {
        let mut stats = PopulationStats::new();
        for (_, occupant) in self.field.grid().iter() {
            if let Some(entity) = occupant.and_then(|id| self.field.get(id)) {
                stats.increment(entity.species());
            }
        }
        stats
    }

    /// At least two species still alive
    pub fn is_viable(&self) -> bool {
        self.stats().is_viable()
    }

    pub fn population(&self) -> usize {
        self.entities.len()
    }

    pub fn step_count(&self) -> u64 {
        self.context.step()
    }

    pub fn disease_deaths(&self) -> u64 {
        self.context.disease().death_count()
    }

    pub fn births(&self) -> u64 {
        self.births
    }

    pub fn deaths(&self) -> &DeathTally {
        &self.deaths
    }

    pub fn clock(&self) -> &Clock {
        self.context.clock()
    }

    pub fn weather(&self) -> &Weather {
        self.context.weather()
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// For drivers and tests that need to force clock or weather
    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.field.check_consistency()
    }

    pub fn summary(&self) -> WorldSummary {
        let population = self.stats();
        WorldSummary {
            step: self.step_count(),
            total_population: population.total(),
            viable: population.is_viable(),
            population,
            disease_deaths: self.disease_deaths(),
            births: self.births,
            deaths: self.deaths.clone(),
            is_day: self.clock().is_day(),
            weather: self.weather().describe(),
        }
    }
}

/// Status of a world between ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSummary {
    pub step: u64,
    pub total_population: u32,
    pub viable: bool,
    pub population: PopulationStats,
    pub disease_deaths: u64,
    pub births: u64,
    pub deaths: DeathTally,
    pub is_day: bool,
    pub weather: String,
}
