//! Animal behavior: aging, disease, hunger, breeding, hunting and movement.

use crate::context::SimulationContext;
use crate::entity::{Entity, EntityCore};
use crate::environment::Clock;
use crate::field::Field;
use crate::grid::Grid;
use crate::species::{AnimalProfile, SEEDED_FOOD_LEVEL};
use savanna_core::{DeathCause, EntityId, Location, Sex, Species};
use std::sync::Arc;
use tracing::{debug, trace};

/// Explicit starting state for an animal placed by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalState {
    pub age: u32,
    pub food_level: i32,
    pub sex: Sex,
    pub infected: bool,
}

#[derive(Debug, Clone)]
pub struct Animal {
    core: EntityCore,
    profile: Arc<AnimalProfile>,
    food_level: i32,
    sex: Sex,
    infected: bool,
}

impl Animal {
    /// Member of the initial population: a random age in the first half of
    /// its life, the standard starting food level and a random sex. Carriers
    /// keep their seed age.
    pub fn seeded(profile: Arc<AnimalProfile>, location: Location, context: &mut SimulationContext) -> Self {
        let infected = context.chance(profile.infection_rate);
        let age = context.below(profile.max_age / 2);
        let sex = random_sex(context);
        Self::with_state(
            profile,
            location,
            AnimalState {
                age,
                food_level: SEEDED_FOOD_LEVEL,
                sex,
                infected,
            },
        )
    }

    /// Age zero with the species' newborn food level
    pub fn newborn(profile: Arc<AnimalProfile>, location: Location, context: &mut SimulationContext) -> Self {
        let sex = random_sex(context);
        let food_level = profile.newborn_food_level;
        let mut animal = Self::with_state(
            profile,
            location,
            AnimalState {
                age: 0,
                food_level,
                sex,
                infected: false,
            },
        );
        animal.maybe_born_infected(context);
        animal
    }

    /// No random draws; the caller picks every attribute
    pub fn with_state(profile: Arc<AnimalProfile>, location: Location, state: AnimalState) -> Self {
        Self {
            core: EntityCore::new(profile.species, location, state.age),
            profile,
            food_level: state.food_level,
            sex: state.sex,
            infected: state.infected,
        }
    }

    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    pub fn profile(&self) -> &AnimalProfile {
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

    pub fn food_level(&self) -> i32 {
        self.food_level
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    /// Nocturnal animals act at night, the rest by day
    pub fn is_awake(&self, clock: &Clock) -> bool {
        self.profile.nocturnal != clock.is_day()
    }

    fn maybe_born_infected(&mut self, context: &mut SimulationContext) {
        if context.chance(self.profile.infection_rate) {
            self.infected = true;
            let age = context.disease().infected_age(self.profile.max_age);
            self.core.set_age(age);
        }
    }

    /// Catch the disease from a neighbor. Infection pushes the age to
    /// `infected_age` unless the animal is already at least that old, in
    /// which case it dies outright. Returns whether it died.
    pub(crate) fn contract_disease(&mut self, infected_age: u32, grid: &mut Grid) -> bool {
        self.infected = true;
        if infected_age > self.core.age() {
            self.core.set_age(infected_age);
            false
        } else {
            self.core.kill(grid, DeathCause::Disease)
        }
    }

    pub(crate) fn step(
        &mut self,
        field: &mut Field,
        context: &mut SimulationContext,
        newborns: &mut Vec<EntityId>,
    ) {
        self.core.increment_age(self.profile.max_age, &mut field.grid);
        self.spread_disease(field, context);
        self.increment_hunger(&mut field.grid);

        if !self.is_alive() || !self.is_awake(context.clock()) {
            return;
        }

        if self.sex == Sex::Female {
            self.give_birth(field, context, newborns);
        }

        if self.profile.visibility_required && context.weather().is_foggy() {
            return;
        }

        let Some(here) = self.location() else { return };

        let mut target = None;
        if self.food_level < self.profile.max_food_level {
            target = self.find_food(field, context.step());
        }
        if target.is_none() {
            target = context.pick(&field.grid.free_adjacent(here));
        }

        match target {
            Some(loc) => self.core.set_location(&mut field.grid, loc),
            None => {
                self.core.kill(&mut field.grid, DeathCause::Overcrowding);
            }
        }
    }

    fn increment_hunger(&mut self, grid: &mut Grid) {
        self.food_level -= 1;
        if self.food_level <= 0 {
            self.core.kill(grid, DeathCause::Starvation);
        }
    }

    /// Pass the infection to same-species neighbors, one draw each
    fn spread_disease(&self, field: &mut Field, context: &mut SimulationContext) {
        if !self.is_alive() || !self.infected {
            return;
        }
        let Some(here) = self.location() else { return };

        let virality = context.disease().virality();
        let infected_age = context.disease().infected_age(self.profile.max_age);

        for loc in field.grid.adjacent(here) {
            let Some(id) = field.grid.occupant_at(loc) else { continue };
            let Some(Entity::Animal(neighbour)) = field.entities.get_mut(&id) else {
                continue;
            };
            if neighbour.species() != self.species() {
                continue;
            }
            if context.chance(virality) {
                let died = neighbour.contract_disease(infected_age, &mut field.grid);
                context.record_disease_death();
                debug!(
                    source_id = %self.id(),
                    target_id = %id,
                    species = %self.species(),
                    target_died = died,
                    tick = context.step(),
                    "Disease transmitted"
                );
            }
        }
    }

    fn has_adjacent_mate(&self, field: &Field, here: Location) -> bool {
        field
            .grid
            .adjacent(here)
            .into_iter()
            .filter_map(|loc| field.occupant_at(loc))
            .filter_map(Entity::as_animal)
            .any(|animal| animal.species() == self.species() && animal.sex() == Sex::Male)
    }

    fn can_breed(&self, field: &Field, here: Location) -> bool {
        self.age() >= self.profile.breeding_age && self.has_adjacent_mate(field, here)
    }

    /// Number of young this step (possibly zero)
    fn breed(&self, field: &Field, here: Location, context: &mut SimulationContext) -> u32 {
        if self.can_breed(field, here) && context.chance(self.profile.breeding_probability) {
            context.between_one_and(self.profile.max_litter_size)
        } else {
            0
        }
    }

    /// Fill free neighbors in scan order, one newborn each, up to the
    /// litter size
    fn give_birth(
        &mut self,
        field: &mut Field,
        context: &mut SimulationContext,
        newborns: &mut Vec<EntityId>,
    ) {
        let Some(here) = self.location() else { return };
        let free = field.grid.free_adjacent(here);
        let births = self.breed(field, here, context) as usize;
        if births == 0 {
            return;
        }

        let mut born = 0;
        for loc in free.into_iter().take(births) {
            let young = Animal::newborn(self.profile.clone(), loc, context);
            let id = field.spawn(young.into());
            newborns.push(id);
            born += 1;
        }

        debug!(
            parent_id = %self.id(),
            species = %self.species(),
            litter_size = births,
            born = born,
            row = here.row,
            col = here.col,
            tick = context.step(),
            "Animal gave birth"
        );
    }

    /// First neighbor in scan order whose species is on the menu. The prey
    /// dies and its cell becomes the move target. Predators trample plants
    /// without gaining food from them.
    fn find_food(&mut self, field: &mut Field, tick: u64) -> Option<Location> {
        let here = self.location()?;

        for loc in field.grid.adjacent(here) {
            let Some(id) = field.grid.occupant_at(loc) else { continue };
            let Some(prey) = field.entities.get_mut(&id) else { continue };
            if !self.profile.eats(prey.species()) {
                continue;
            }

            let cause = if self.profile.predator && prey.is_plant() {
                DeathCause::Trampled
            } else {
                self.food_level += prey.food_value();
                DeathCause::Predation
            };
            prey.kill(&mut field.grid, cause);

            trace!(
                hunter_id = %self.id(),
                hunter = %self.species(),
                prey_id = %id,
                prey = %prey.species(),
                cause = %cause,
                food_level = self.food_level,
                tick = tick,
                "Prey consumed"
            );
            return Some(loc);
        }
        None
    }
}

fn random_sex(context: &mut SimulationContext) -> Sex {
    if context.coin() {
        Sex::Male
    } else {
        Sex::Female
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::SpeciesRegistry;
    use savanna_core::SimulationConfig;

    fn context() -> SimulationContext {
        SimulationContext::new(&SimulationConfig {
            seed: Some(7),
            ..Default::default()
        })
    }

    fn place(field: &mut Field, animal: Animal) -> EntityId {
        field.spawn(Entity::Animal(animal))
    }

    fn state(age: u32, food_level: i32, sex: Sex) -> AnimalState {
        AnimalState {
            age,
            food_level,
            sex,
            infected: false,
        }
    }

    fn run_step(field: &mut Field, context: &mut SimulationContext, id: EntityId) -> Vec<EntityId> {
        let mut newborns = Vec::new();
        let mut entity = field.take(id).unwrap();
        entity.step(field, context, &mut newborns);
        field.restore(entity);
        newborns
    }

    #[test]
    fn test_seeded_animals_start_young_and_fed() {
        let mut context = context();
        let profile = SpeciesRegistry::savanna().animal(Species::Lion).unwrap();
        for _ in 0..50 {
            let lion = Animal::seeded(profile.clone(), Location::new(0, 0), &mut context);
            assert_eq!(lion.food_level(), SEEDED_FOOD_LEVEL);
            assert!(lion.age() < 50);
        }
    }

    #[test]
    fn test_seeded_carriers_keep_their_seed_age() {
        let mut context = context();
        let mut zebra = AnimalProfile::zebra();
        zebra.infection_rate = 1.0;
        let zebra = Arc::new(zebra);

        let ages: Vec<u32> = (0..20)
            .map(|_| Animal::seeded(zebra.clone(), Location::new(0, 0), &mut context))
            .inspect(|animal| assert!(animal.is_infected()))
            .map(|animal| animal.age())
            .collect();
        assert!(ages.iter().all(|age| *age < 35), "ages: {:?}", ages);
        assert_eq!(context.disease().death_count(), 0);
    }

    #[test]
    fn test_born_infected_when_rate_is_one() {
        let mut context = context();
        let mut zebra = AnimalProfile::zebra();
        zebra.infection_rate = 1.0;
        let calf = Animal::newborn(Arc::new(zebra), Location::new(0, 0), &mut context);

        assert!(calf.is_infected());
        assert_eq!(calf.age(), 60);
        assert_eq!(context.disease().death_count(), 0);
    }

    #[test]
    fn test_awake_windows() {
        let lion = Animal::with_state(Arc::new(AnimalProfile::lion()), Location::new(0, 0), state(5, 30, Sex::Male));
        let zebra = Animal::with_state(Arc::new(AnimalProfile::zebra()), Location::new(0, 0), state(5, 30, Sex::Male));
        let mut clock = Clock::new();

        assert!(lion.is_awake(&clock));
        assert!(!zebra.is_awake(&clock));
        clock.toggle();
        assert!(!lion.is_awake(&clock));
        assert!(zebra.is_awake(&clock));
    }

    #[test]
    fn test_starvation_stops_the_step() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(true);
        let start = Location::new(1, 1);
        let id = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), start, state(20, 1, Sex::Male)),
        );

        run_step(&mut field, &mut context, id);

        let zebra = field.get(id).unwrap();
        assert!(!zebra.is_alive());
        assert_eq!(zebra.death_cause(), Some(DeathCause::Starvation));
        assert_eq!(field.grid.occupant_at(start), None);
        assert!(field.grid.iter().all(|(_, cell)| cell.is_none()));
    }

    #[test]
    fn test_old_age_death_on_the_tick_it_is_exceeded() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        let id = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), Location::new(1, 1), state(70, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, id);
        let zebra = field.get(id).unwrap();
        assert!(!zebra.is_alive());
        assert_eq!(zebra.death_cause(), Some(DeathCause::OldAge));
    }

    #[test]
    fn test_asleep_animal_stays_put() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(false);
        let start = Location::new(1, 1);
        let id = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), start, state(20, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, id);
        let zebra = field.get(id).unwrap().as_animal().unwrap();
        assert_eq!(zebra.location(), Some(start));
        assert_eq!(zebra.food_level(), 19);
        assert_eq!(zebra.age(), 21);
    }

    #[test]
    fn test_overcrowded_animal_dies() {
        let mut field = Field::new(1, 2);
        let mut context = context();
        context.clock_mut().set_day(true);
        // Elephants don't eat zebras, so the only neighbor blocks the way
        let id = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), Location::new(0, 0), state(20, 20, Sex::Male)),
        );
        place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::elephant()), Location::new(0, 1), state(20, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, id);
        let zebra = field.get(id).unwrap();
        assert_eq!(zebra.death_cause(), Some(DeathCause::Overcrowding));
    }

    #[test]
    fn test_free_move_lands_on_free_neighbor() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(true);
        let start = Location::new(1, 1);
        // Full stomach: no hunting, straight to a random free cell
        let id = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), start, state(20, 40, Sex::Male)),
        );

        run_step(&mut field, &mut context, id);
        let zebra = field.get(id).unwrap();
        let now = zebra.location().unwrap();
        assert_ne!(now, start);
        assert!(field.grid.adjacent(start).contains(&now));
        assert_eq!(field.grid.occupant_at(start), None);
        assert_eq!(field.grid.occupant_at(now), Some(id));
    }

    #[test]
    fn test_well_fed_hunter_leaves_prey_alone() {
        let mut field = Field::new(1, 3);
        let mut context = context();
        context.clock_mut().set_day(false);
        context.weather_mut().fog = false;
        // Hunger runs first: 101 drops to 100, which is not below the cap
        let lion = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::lion()), Location::new(0, 1), state(20, 101, Sex::Male)),
        );
        let zebra = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), Location::new(0, 0), state(20, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, lion);

        assert!(field.get(zebra).unwrap().is_alive());
        let lion = field.get(lion).unwrap().as_animal().unwrap();
        assert_eq!(lion.food_level(), 100);
        assert_eq!(lion.location(), Some(Location::new(0, 2)));
    }

    #[test]
    fn test_grazer_eats_grass_for_food() {
        let registry = SpeciesRegistry::savanna();
        let mut field = Field::new(1, 2);
        let mut context = context();
        context.clock_mut().set_day(true);
        let id = place(
            &mut field,
            Animal::with_state(registry.animal(Species::Buffalo).unwrap(), Location::new(0, 0), state(20, 10, Sex::Male)),
        );
        let grass = field.spawn(Entity::Plant(crate::plant::Plant::new(
            registry.plant(Species::Grass).unwrap(),
            Location::new(0, 1),
        )));

        run_step(&mut field, &mut context, id);
        let buffalo = field.get(id).unwrap().as_animal().unwrap();
        assert_eq!(buffalo.food_level(), 10 - 1 + 8);
        assert_eq!(buffalo.location(), Some(Location::new(0, 1)));
        assert_eq!(field.get(grass).unwrap().death_cause(), Some(DeathCause::Predation));
    }

    #[test]
    fn test_predator_tramples_grass_without_food() {
        let registry = SpeciesRegistry::savanna();
        let mut field = Field::new(1, 2);
        let mut context = context();
        context.clock_mut().set_day(false);
        context.weather_mut().fog = false;
        let id = place(
            &mut field,
            Animal::with_state(registry.animal(Species::Lion).unwrap(), Location::new(0, 0), state(20, 50, Sex::Male)),
        );
        let grass = field.spawn(Entity::Plant(crate::plant::Plant::new(
            registry.plant(Species::Grass).unwrap(),
            Location::new(0, 1),
        )));

        run_step(&mut field, &mut context, id);
        let lion = field.get(id).unwrap().as_animal().unwrap();
        assert_eq!(lion.food_level(), 49);
        assert_eq!(lion.location(), Some(Location::new(0, 1)));
        assert_eq!(field.get(grass).unwrap().death_cause(), Some(DeathCause::Trampled));
    }

    #[test]
    fn test_prey_search_takes_first_match_in_scan_order() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(false);
        context.weather_mut().fog = false;
        let lion = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::lion()), Location::new(1, 1), state(20, 50, Sex::Male)),
        );
        // (0, 2) comes before (2, 0) in row-major order
        let first = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::elephant()), Location::new(0, 2), state(20, 20, Sex::Male)),
        );
        let second = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::zebra()), Location::new(2, 0), state(20, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, lion);
        assert!(!field.get(first).unwrap().is_alive());
        assert!(field.get(second).unwrap().is_alive());
        let lion = field.get(lion).unwrap().as_animal().unwrap();
        assert_eq!(lion.location(), Some(Location::new(0, 2)));
        assert_eq!(lion.food_level(), 50 - 1 + 10);
    }

    #[test]
    fn test_female_needs_adjacent_male_of_same_species() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(true);
        let mut zebra = AnimalProfile::zebra();
        zebra.breeding_probability = 1.0;
        zebra.infection_rate = 0.0;
        let zebra = Arc::new(zebra);

        let mother = place(
            &mut field,
            Animal::with_state(zebra.clone(), Location::new(1, 1), state(20, 40, Sex::Female)),
        );
        // A male of another species and a female of the same one don't count
        place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::buffalo()), Location::new(0, 0), state(20, 40, Sex::Male)),
        );
        place(
            &mut field,
            Animal::with_state(zebra, Location::new(0, 1), state(20, 40, Sex::Female)),
        );

        let newborns = run_step(&mut field, &mut context, mother);
        assert!(newborns.is_empty());
    }

    #[test]
    fn test_too_young_to_breed() {
        let mut field = Field::new(3, 3);
        let mut context = context();
        context.clock_mut().set_day(true);
        let mut zebra = AnimalProfile::zebra();
        zebra.breeding_probability = 1.0;
        let zebra = Arc::new(zebra);

        let mother = place(
            &mut field,
            Animal::with_state(zebra.clone(), Location::new(1, 1), state(10, 40, Sex::Female)),
        );
        place(
            &mut field,
            Animal::with_state(zebra, Location::new(0, 1), state(20, 40, Sex::Male)),
        );

        let newborns = run_step(&mut field, &mut context, mother);
        assert!(newborns.is_empty());
    }

    #[test]
    fn test_litter_limited_by_free_cells() {
        let mut field = Field::new(1, 3);
        let mut context = context();
        context.clock_mut().set_day(false);
        context.weather_mut().fog = false;
        let mut lion = AnimalProfile::lion();
        lion.breeding_probability = 1.0;
        lion.max_litter_size = 4;
        lion.infection_rate = 0.0;
        let lion = Arc::new(lion);

        let mother = place(
            &mut field,
            Animal::with_state(lion.clone(), Location::new(0, 1), state(20, 200, Sex::Female)),
        );
        place(
            &mut field,
            Animal::with_state(lion, Location::new(0, 0), state(20, 200, Sex::Male)),
        );

        let newborns = run_step(&mut field, &mut context, mother);
        // Only (0, 2) is free
        assert_eq!(newborns.len(), 1);
        let cub = field.get(newborns[0]).unwrap().as_animal().unwrap();
        assert_eq!(cub.location(), Some(Location::new(0, 2)));
        assert_eq!(cub.age(), 0);
        assert_eq!(cub.food_level(), 20);
        // The litter took the last free cell and the mother was not hungry
        assert_eq!(
            field.get(mother).unwrap().death_cause(),
            Some(DeathCause::Overcrowding)
        );
    }

    #[test]
    fn test_infection_kills_animals_past_the_threshold() {
        let mut field = Field::new(1, 2);
        let mut context = SimulationContext::new(&SimulationConfig {
            seed: Some(3),
            disease: savanna_core::DiseaseConfig {
                virality: 1.0,
                virulence: 10,
            },
            ..Default::default()
        });
        context.clock_mut().set_day(false);
        let zebra = Arc::new(AnimalProfile::zebra());

        let carrier = place(
            &mut field,
            Animal::with_state(
                zebra.clone(),
                Location::new(0, 0),
                AnimalState {
                    age: 5,
                    food_level: 20,
                    sex: Sex::Male,
                    infected: true,
                },
            ),
        );
        let elder = place(
            &mut field,
            Animal::with_state(zebra, Location::new(0, 1), state(65, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, carrier);
        let elder = field.get(elder).unwrap();
        assert!(!elder.is_alive());
        assert_eq!(elder.death_cause(), Some(DeathCause::Disease));
        assert!(elder.as_animal().unwrap().is_infected());
        assert_eq!(context.disease().death_count(), 1);
    }

    #[test]
    fn test_infection_does_not_spread_across_species() {
        let mut field = Field::new(1, 2);
        let mut context = SimulationContext::new(&SimulationConfig {
            seed: Some(3),
            disease: savanna_core::DiseaseConfig {
                virality: 1.0,
                virulence: 10,
            },
            ..Default::default()
        });
        context.clock_mut().set_day(false);

        let carrier = place(
            &mut field,
            Animal::with_state(
                Arc::new(AnimalProfile::zebra()),
                Location::new(0, 0),
                AnimalState {
                    age: 5,
                    food_level: 20,
                    sex: Sex::Male,
                    infected: true,
                },
            ),
        );
        let buffalo = place(
            &mut field,
            Animal::with_state(Arc::new(AnimalProfile::buffalo()), Location::new(0, 1), state(5, 20, Sex::Male)),
        );

        run_step(&mut field, &mut context, carrier);
        let buffalo = field.get(buffalo).unwrap().as_animal().unwrap();
        assert!(!buffalo.is_infected());
        assert_eq!(buffalo.age(), 5);
        assert_eq!(context.disease().death_count(), 0);
    }
}
