//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Unique identifier for an entity instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cell address in the field, `row` counted from the top edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub col: i32,
}

impl Location {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, direction: Direction) -> Self {
        let (dr, dc) = direction.to_delta();
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the eight compass steps between adjacent cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// `(row, col)` delta
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::SouthWest => (1, -1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
        }
    }

    /// All directions in row-major scan order. Neighborhood queries follow
    /// this order so prey search and litter placement are reproducible.
    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::North,
            Direction::NorthEast,
            Direction::West,
            Direction::East,
            Direction::SouthWest,
            Direction::South,
            Direction::SouthEast,
        ]
    }
}

/// Species identifier shared by plants and animals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Lion,
    Human,
    Elephant,
    Zebra,
    Buffalo,
    Grass,
}

impl Species {
    pub fn all() -> [Species; 6] {
        [
            Species::Lion,
            Species::Human,
            Species::Elephant,
            Species::Zebra,
            Species::Buffalo,
            Species::Grass,
        ]
    }

    pub fn is_plant(&self) -> bool {
        matches!(self, Species::Grass)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Species::Lion => "lion",
            Species::Human => "human",
            Species::Elephant => "elephant",
            Species::Zebra => "zebra",
            Species::Buffalo => "buffalo",
            Species::Grass => "grass",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::all()
            .into_iter()
            .find(|species| species.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownSpecies(s.to_string()))
    }
}

/// Fixed at birth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

/// Why an entity left the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    OldAge,
    Starvation,
    Overcrowding,
    Disease,
    Predation,
    /// A plant stepped on by a predator that does not eat it
    Trampled,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeathCause::OldAge => "old_age",
            DeathCause::Starvation => "starvation",
            DeathCause::Overcrowding => "overcrowding",
            DeathCause::Disease => "disease",
            DeathCause::Predation => "predation",
            DeathCause::Trampled => "trampled",
        };
        f.write_str(label)
    }
}
