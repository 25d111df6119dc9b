//! Day/night cycle, weather and disease state.

use rand::Rng;
use savanna_core::DiseaseConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day/night flag. A fresh clock starts at night.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    is_day: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_day(&self) -> bool {
        self.is_day
    }

    pub fn toggle(&mut self) {
        self.is_day = !self.is_day;
    }

    pub fn set_day(&mut self, is_day: bool) {
        self.is_day = is_day;
    }

    pub fn describe(&self) -> &'static str {
        if self.is_day {
            "Day"
        } else {
            "Night"
        }
    }
}

/// Three independent weather flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    pub rain: bool,
    pub fog: bool,
    pub wind: bool,
}

impl Weather {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut weather = Self::clear();
        weather.reroll(rng);
        weather
    }

    /// Flip a fair coin for each flag
    pub fn reroll<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.rain = rng.gen();
        self.fog = rng.gen();
        self.wind = rng.gen();
    }

    pub fn is_rainy(&self) -> bool {
        self.rain
    }

    pub fn is_foggy(&self) -> bool {
        self.fog
    }

    pub fn is_windy(&self) -> bool {
        self.wind
    }

    /// e.g. `rainy; windy.` or `sunny.` when no flag is set
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.rain {
            parts.push("rainy");
        }
        if self.fog {
            parts.push("foggy");
        }
        if self.wind {
            parts.push("windy");
        }
        if parts.is_empty() {
            "sunny.".to_string()
        } else {
            format!("{}.", parts.join("; "))
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Disease parameters plus the running count of transmissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    virality: f64,
    virulence: u32,
    deaths: u64,
}

impl Disease {
    pub fn new(virality: f64, virulence: u32) -> Self {
        Self {
            virality,
            virulence,
            deaths: 0,
        }
    }

    pub fn from_config(config: &DiseaseConfig) -> Self {
        Self::new(config.virality, config.virulence)
    }

    pub fn virality(&self) -> f64 {
        self.virality
    }

    pub fn virulence(&self) -> u32 {
        self.virulence
    }

    /// Age an infected animal is pushed to, leaving it `virulence` steps
    pub fn infected_age(&self, max_age: u32) -> u32 {
        max_age.saturating_sub(self.virulence)
    }

    /// Counted once per successful transmission, whether or not the
    /// target dies of it
    pub fn record_death(&mut self) {
        self.deaths += 1;
    }

    pub fn death_count(&self) -> u64 {
        self.deaths
    }
}

impl Default for Disease {
    fn default() -> Self {
        Self::from_config(&DiseaseConfig::default())
    }
}
