//! Multi-car elevator dispatch simulation
//!
//! This module contains the dispatch core: cars with bounded FIFO queues and
//! their own worker threads, and a dispatcher that assigns pickups to them.
//! It can be driven from tests or the console runner without any other setup.

mod car;
mod config;
mod dispatcher;
mod error;
mod fleet;
mod scoring;
mod types;

pub use car::Car;
pub use config::FleetConfig;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use fleet::Fleet;
pub use scoring::{
    DirectionAware, NearestCar, ScoringKind, ScoringPolicy, DEFAULT_WRONG_WAY_PENALTY,
};
pub use types::{
    CarId, CarPosition, CarStatus, Direction, FloorObservation, FloorRange, Request,
    DEFAULT_CAPACITY, DEFAULT_FLOOR_DELAY, DEFAULT_NUM_CARS, DEFAULT_START_FLOOR,
};
