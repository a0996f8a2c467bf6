//! Fleet configuration
//!
//! Everything the dispatch core needs to assemble a fleet: size, per-car
//! capacity, transit delay, optional floor bounds and starting floors.

use anyhow::Result;
use std::time::Duration;

use super::scoring::ScoringKind;
use super::types::{
    FloorRange, DEFAULT_CAPACITY, DEFAULT_FLOOR_DELAY, DEFAULT_NUM_CARS, DEFAULT_START_FLOOR,
};

/// Configuration for a fleet of cars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// Number of cars; ids run from 1 to `num_cars`
    pub num_cars: usize,

    /// Maximum queued requests per car
    pub capacity: usize,

    /// Simulated travel time per floor
    pub floor_delay: Duration,

    /// Floors served by every car, unbounded when `None`
    pub floor_range: Option<FloorRange>,

    /// Starting floor per car. Empty means every car starts at `DEFAULT_START_FLOOR`.
    pub start_floors: Vec<i32>,

    pub scoring: ScoringKind,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_cars: DEFAULT_NUM_CARS,
            capacity: DEFAULT_CAPACITY,
            floor_delay: DEFAULT_FLOOR_DELAY,
            floor_range: None,
            start_floors: Vec::new(),
            scoring: ScoringKind::default(),
        }
    }
}

impl FleetConfig {
    /// Starting floor of the car at zero-based `index`
    pub fn start_floor(&self, index: usize) -> i32 {
        self.start_floors
            .get(index)
            .copied()
            .unwrap_or(DEFAULT_START_FLOOR)
    }

    /// Check the configuration describes a fleet that can serve requests
    pub fn validate(&self) -> Result<()> {
        if self.num_cars == 0 {
            anyhow::bail!("fleet needs at least one car");
        }
        if self.capacity == 0 {
            anyhow::bail!("car capacity must be at least 1");
        }
        if !self.start_floors.is_empty() && self.start_floors.len() != self.num_cars {
            anyhow::bail!(
                "got {} starting floors for {} cars",
                self.start_floors.len(),
                self.num_cars
            );
        }

        if let Some(range) = self.floor_range {
            if range.lowest > range.highest {
                anyhow::bail!("floor range {} is empty", range);
            }
            for index in 0..self.num_cars {
                let floor = self.start_floor(index);
                if !range.contains(floor) {
                    anyhow::bail!(
                        "car {} starts at floor {} outside the served range {}",
                        index + 1,
                        floor,
                        range
                    );
                }
            }
        }

        Ok(())
    }
}
