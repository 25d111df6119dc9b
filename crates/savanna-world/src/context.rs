//! Shared state every entity reads while it acts.

use crate::environment::{Clock, Disease, Weather};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use savanna_core::{EnvironmentConfig, SimulationConfig};
use tracing::{debug, trace};

/// Environment, disease and the shared random source for one world.
///
/// The world stepper owns the context and advances clock and weather
/// between ticks; entities only draw random numbers from it and report
/// disease transmissions through [`SimulationContext::record_disease_death`].
pub struct SimulationContext {
    clock: Clock,
    weather: Weather,
    disease: Disease,
    environment: EnvironmentConfig,
    rng: ChaCha8Rng,
    step: u64,
}

impl SimulationContext {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Build around an injected random source
    pub fn with_rng(config: &SimulationConfig, mut rng: ChaCha8Rng) -> Self {
        let weather = Weather::random(&mut rng);
        Self {
            clock: Clock::new(),
            weather,
            disease: Disease::from_config(&config.disease),
            environment: config.environment.clone(),
            rng,
            step: 0,
        }
    }

    /// Back to step zero with a fresh clock, weather and disease counter.
    /// The random source is reseeded only when the config names a seed.
    pub fn reset(&mut self, config: &SimulationConfig) {
        if let Some(seed) = config.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.clock = Clock::new();
        self.weather = Weather::random(&mut self.rng);
        self.disease = Disease::from_config(&config.disease);
        self.environment = config.environment.clone();
        self.step = 0;
    }

    /// Start a new tick: bump the step counter, toggle day/night on the
    /// fixed cadence and maybe re-roll the weather.
    pub(crate) fn advance(&mut self) -> u64 {
        self.step += 1;

        if self.step % self.environment.day_length == 0 {
            self.clock.toggle();
            debug!(tick = self.step, time = self.clock.describe(), "Day/night switched");
        }

        // The interval is drawn fresh every tick, so changes are irregular
        let interval = self
            .rng
            .gen_range(self.environment.weather_interval_min..self.environment.weather_interval_max);
        if self.step % interval == 0 {
            self.weather.reroll(&mut self.rng);
            debug!(
                tick = self.step,
                interval = interval,
                weather = %self.weather,
                "Weather changed"
            );
        }

        self.step
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn weather_mut(&mut self) -> &mut Weather {
        &mut self.weather
    }

    pub fn disease(&self) -> &Disease {
        &self.disease
    }

    pub fn record_disease_death(&mut self) {
        self.disease.record_death();
        trace!(tick = self.step, total = self.disease.death_count(), "Disease transmission recorded");
    }

    /// Single draw against a probability. Success is `draw <= probability`,
    /// so a probability of 1.0 always succeeds.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() <= probability
    }

    /// Fair coin
    pub fn coin(&mut self) -> bool {
        self.rng.gen()
    }

    /// Uniform integer in `[1, max]`
    pub fn between_one_and(&mut self, max: u32) -> u32 {
        self.rng.gen_range(1..=max.max(1))
    }

    /// Uniform integer in `[0, bound)`; zero when the bound is zero
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            0
        } else {
            self.rng.gen_range(0..bound)
        }
    }

    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.rng).copied()
    }
}
