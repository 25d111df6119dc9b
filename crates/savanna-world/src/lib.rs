//! Savanna simulation engine.
//!
//! A rectangular field of animals and plants advanced one tick at a time.
//! Species differ only by the profile data they carry; the world owns the
//! field, the acting order and a shared context holding clock, weather,
//! disease and the random source.

pub mod animal;
pub mod context;
pub mod entity;
pub mod environment;
pub mod field;
pub mod grid;
pub mod plant;
pub mod simulation;
pub mod species;

pub use animal::{Animal, AnimalState};
pub use context::SimulationContext;
pub use entity::{Entity, EntityCore};
pub use environment::{Clock, Disease, Weather};
pub use field::{Field, FieldSnapshot};
pub use grid::Grid;
pub use plant::Plant;
pub use simulation::{World, WorldSummary};
pub use species::{AnimalProfile, PlantProfile, SpeciesProfile, SpeciesRegistry, SpeciesTable};
