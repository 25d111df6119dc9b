//! Per-species constants.
//!
//! Every behavioral difference between species is data: a single `Animal`
//! and a single `Plant` type read their parameters from the profile they
//! carry. Prey relations are sets of `Species` values, checked against the
//! registry when it is built.

use savanna_core::{check_probability, Error, Result, Species};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Food level every animal placed by the initial population starts with
pub const SEEDED_FOOD_LEVEL: i32 = 30;

/// Parameters shared by all animals of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalProfile {
    pub species: Species,
    /// Minimum age for a female to give birth
    pub breeding_age: u32,
    pub breeding_probability: f64,
    pub max_age: u32,
    pub max_litter_size: u32,
    /// An animal only hunts while its food level is below this
    pub max_food_level: i32,
    /// Food gained by whoever eats this animal
    pub food_value: i32,
    pub newborn_food_level: i32,
    pub prey: BTreeSet<Species>,
    pub nocturnal: bool,
    /// Chance of carrying the disease from birth
    pub infection_rate: f64,
    /// Needs clear weather to hunt or move
    pub visibility_required: bool,
    /// Predators trample plants in their diet instead of eating them
    pub predator: bool,
}

impl AnimalProfile {
    pub fn lion() -> Self {
        Self {
            species: Species::Lion,
            breeding_age: 10,
            breeding_probability: 0.6,
            max_age: 100,
            max_litter_size: 4,
            max_food_level: 100,
            food_value: 0,
            newborn_food_level: 20,
            prey: [Species::Zebra, Species::Elephant, Species::Buffalo, Species::Grass]
                .into_iter()
                .collect(),
            nocturnal: true,
            infection_rate: 0.001,
            visibility_required: true,
            predator: true,
        }
    }

    pub fn human() -> Self {
        Self {
            species: Species::Human,
            breeding_age: 10,
            breeding_probability: 0.5,
            max_age: 100,
            max_litter_size: 2,
            max_food_level: 20,
            food_value: 0,
            newborn_food_level: 21,
            prey: [Species::Zebra, Species::Buffalo, Species::Grass]
                .into_iter()
                .collect(),
            nocturnal: false,
            infection_rate: 0.095,
            visibility_required: true,
            predator: true,
        }
    }

    pub fn elephant() -> Self {
        Self {
            species: Species::Elephant,
            breeding_age: 15,
            breeding_probability: 0.5,
            max_age: 70,
            max_litter_size: 1,
            max_food_level: 30,
            food_value: 10,
            newborn_food_level: 15,
            ..Self::grazer(Species::Elephant)
        }
    }

    pub fn zebra() -> Self {
        Self {
            species: Species::Zebra,
            breeding_age: 15,
            breeding_probability: 0.5,
            max_age: 70,
            max_litter_size: 1,
            max_food_level: 30,
            food_value: 25,
            newborn_food_level: 15,
            ..Self::grazer(Species::Zebra)
        }
    }

    pub fn buffalo() -> Self {
        Self {
            species: Species::Buffalo,
            breeding_age: 15,
            breeding_probability: 0.45,
            max_age: 70,
            max_litter_size: 2,
            max_food_level: 30,
            food_value: 25,
            newborn_food_level: 14,
            infection_rate: 0.01,
            ..Self::grazer(Species::Buffalo)
        }
    }

    // Diurnal grass eater with no visibility requirement
    fn grazer(species: Species) -> Self {
        Self {
            species,
            breeding_age: 0,
            breeding_probability: 0.0,
            max_age: 1,
            max_litter_size: 1,
            max_food_level: 0,
            food_value: 0,
            newborn_food_level: 0,
            prey: [Species::Grass].into_iter().collect(),
            nocturnal: false,
            infection_rate: 0.001,
            visibility_required: false,
            predator: false,
        }
    }

    pub fn eats(&self, species: Species) -> bool {
        self.prey.contains(&species)
    }

    fn validate(&self) -> Result<()> {
        if self.species.is_plant() {
            return Err(Error::InvalidConfig(format!(
                "{} is a plant and cannot have an animal profile",
                self.species
            )));
        }
        check_probability(&format!("{} breeding probability", self.species), self.breeding_probability)?;
        check_probability(&format!("{} infection rate", self.species), self.infection_rate)?;
        if self.max_age == 0 {
            return Err(Error::InvalidConfig(format!("{} max_age must be positive", self.species)));
        }
        if self.max_litter_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "{} max_litter_size must be positive",
                self.species
            )));
        }
        Ok(())
    }
}

/// Parameters shared by all plants of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub species: Species,
    pub max_age: u32,
    pub food_value: i32,
    pub spreading_probability: f64,
}

impl PlantProfile {
    pub fn grass() -> Self {
        Self {
            species: Species::Grass,
            max_age: 14,
            food_value: 8,
            spreading_probability: 0.07,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.species.is_plant() {
            return Err(Error::InvalidConfig(format!(
                "{} is an animal and cannot have a plant profile",
                self.species
            )));
        }
        check_probability(
            &format!("{} spreading probability", self.species),
            self.spreading_probability,
        )?;
        if self.max_age == 0 {
            return Err(Error::InvalidConfig(format!("{} max_age must be positive", self.species)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum SpeciesProfile {
    Animal(Arc<AnimalProfile>),
    Plant(Arc<PlantProfile>),
}

/// Serializable form of the registry, as found in config files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesTable {
    pub animals: Vec<AnimalProfile>,
    pub plants: Vec<PlantProfile>,
}

impl SpeciesTable {
    pub fn savanna() -> Self {
        Self {
            animals: vec![
                AnimalProfile::lion(),
                AnimalProfile::human(),
                AnimalProfile::elephant(),
                AnimalProfile::zebra(),
                AnimalProfile::buffalo(),
            ],
            plants: vec![PlantProfile::grass()],
        }
    }
}

/// Validated lookup from species to profile
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    profiles: BTreeMap<Species, SpeciesProfile>,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::savanna()
    }
}

impl SpeciesRegistry {
    /// The built-in savanna species
    pub fn savanna() -> Self {
        let table = SpeciesTable::savanna();
        let mut profiles = BTreeMap::new();
        for profile in table.animals {
            profiles.insert(profile.species, SpeciesProfile::Animal(Arc::new(profile)));
        }
        for profile in table.plants {
            profiles.insert(profile.species, SpeciesProfile::Plant(Arc::new(profile)));
        }
        Self { profiles }
    }

    /// Build and validate a registry. Duplicate species, out-of-range
    /// parameters and prey lists naming unregistered species are rejected.
    pub fn from_table(table: SpeciesTable) -> Result<Self> {
        let mut profiles = BTreeMap::new();

        for profile in table.animals {
            profile.validate()?;
            let species = profile.species;
            if profiles
                .insert(species, SpeciesProfile::Animal(Arc::new(profile)))
                .is_some()
            {
                return Err(Error::InvalidConfig(format!("{} registered twice", species)));
            }
        }
        for profile in table.plants {
            profile.validate()?;
            let species = profile.species;
            if profiles
                .insert(species, SpeciesProfile::Plant(Arc::new(profile)))
                .is_some()
            {
                return Err(Error::InvalidConfig(format!("{} registered twice", species)));
            }
        }

        let registry = Self { profiles };
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: SpeciesTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Every prey entry must name a registered species
    pub fn validate(&self) -> Result<()> {
        for profile in self.profiles.values() {
            if let SpeciesProfile::Animal(animal) = profile {
                for prey in &animal.prey {
                    if !self.profiles.contains_key(prey) {
                        return Err(Error::UnknownSpecies(format!(
                            "{} (listed as prey of {})",
                            prey, animal.species
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, species: Species) -> Option<&SpeciesProfile> {
        self.profiles.get(&species)
    }

    pub fn contains(&self, species: Species) -> bool {
        self.profiles.contains_key(&species)
    }

    pub fn animal(&self, species: Species) -> Result<Arc<AnimalProfile>> {
        match self.profiles.get(&species) {
            Some(SpeciesProfile::Animal(profile)) => Ok(profile.clone()),
            Some(SpeciesProfile::Plant(_)) => Err(Error::Validation(format!(
                "{} is registered as a plant",
                species
            ))),
            None => Err(Error::UnknownSpecies(species.to_string())),
        }
    }

    pub fn plant(&self, species: Species) -> Result<Arc<PlantProfile>> {
        match self.profiles.get(&species) {
            Some(SpeciesProfile::Plant(profile)) => Ok(profile.clone()),
            Some(SpeciesProfile::Animal(_)) => Err(Error::Validation(format!(
                "{} is registered as an animal",
                species
            ))),
            None => Err(Error::UnknownSpecies(species.to_string())),
        }
    }

    pub fn species(&self) -> impl Iterator<Item = Species> + '_ {
        self.profiles.keys().copied()
    }

    /// Table form of the registry, for writing back to a config file
    pub fn to_table(&self) -> SpeciesTable {
        let mut table = SpeciesTable::default();
        for profile in self.profiles.values() {
            match profile {
                SpeciesProfile::Animal(animal) => table.animals.push((**animal).clone()),
                SpeciesProfile::Plant(plant) => table.plants.push((**plant).clone()),
            }
        }
        table
    }

    /// Replace one animal profile, keeping the registry valid
    pub fn with_animal(mut self, profile: AnimalProfile) -> Result<Self> {
        profile.validate()?;
        self.profiles
            .insert(profile.species, SpeciesProfile::Animal(Arc::new(profile)));
        self.validate()?;
        Ok(self)
    }

    /// Replace one plant profile, keeping the registry valid
    pub fn with_plant(mut self, profile: PlantProfile) -> Result<Self> {
        profile.validate()?;
        self.profiles
            .insert(profile.species, SpeciesProfile::Plant(Arc::new(profile)));
        self.validate()?;
        Ok(self)
    }
}
