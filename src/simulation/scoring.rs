//! Car scoring policies for the dispatcher
//!
//! A policy turns a car's position snapshot and an incoming request into a
//! cost. The dispatcher ranks cars by ascending cost, ties broken by car id.

use std::fmt;

use super::types::{CarPosition, Direction, Request};

/// Extra cost `DirectionAware` charges a car moving away from the pickup
pub const DEFAULT_WRONG_WAY_PENALTY: u64 = 10;

/// Cost function used to rank cars for a pickup
pub trait ScoringPolicy: fmt::Debug + Send + Sync {
    /// Cost of sending a car at `position` to serve `request`; lower is better
    fn score(&self, position: &CarPosition, request: &Request) -> u64;
}

/// Distance from the car to the pickup floor, ignoring direction and load
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestCar;

impl ScoringPolicy for NearestCar {
    fn score(&self, position: &CarPosition, request: &Request) -> u64 {
        u64::from(position.floor.abs_diff(request.source_floor))
    }
}

/// SCAN-style policy: distance, plus a penalty for cars heading away from the pickup
#[derive(Debug, Clone, Copy)]
pub struct DirectionAware {
    pub wrong_way_penalty: u64,
}

impl Default for DirectionAware {
    fn default() -> Self {
        Self {
            wrong_way_penalty: DEFAULT_WRONG_WAY_PENALTY,
        }
    }
}

impl ScoringPolicy for DirectionAware {
    fn score(&self, position: &CarPosition, request: &Request) -> u64 {
        let distance = NearestCar.score(position, request);
        if is_heading_toward(position, request.source_floor) {
            distance
        } else {
            distance.saturating_add(self.wrong_way_penalty)
        }
    }
}

/// Whether a car's path passes `floor` without turning around
///
/// Idle cars can go either way.
fn is_heading_toward(position: &CarPosition, floor: i32) -> bool {
    match position.direction {
        Direction::Up => floor >= position.floor,
        Direction::Down => floor <= position.floor,
        Direction::Idle => true,
    }
}

/// Named scoring policies, for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringKind {
    #[default]
    Nearest,
    DirectionAware,
}

impl ScoringKind {
    pub fn build(self) -> Box<dyn ScoringPolicy> {
        match self {
            ScoringKind::Nearest => Box::new(NearestCar),
            ScoringKind::DirectionAware => Box::new(DirectionAware::default()),
        }
    }
}
