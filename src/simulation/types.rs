//! Core types for the elevator simulation
//!
//! Plain value types shared by cars, the dispatcher and observers.

use std::fmt;
use std::time::Duration;

/// Default number of cars in a fleet
pub const DEFAULT_NUM_CARS: usize = 3;

/// Default number of requests a car may hold in its queue
pub const DEFAULT_CAPACITY: usize = 5;

/// Floor every car starts on unless configured otherwise
pub const DEFAULT_START_FLOOR: i32 = 1;

/// Simulated time it takes a car to travel one floor
pub const DEFAULT_FLOOR_DELAY: Duration = Duration::from_secs(1);

/// A wrapper type for car IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId(pub usize);

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of travel of a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Idle,
}

impl Direction {
    /// Direction needed to get from `from` to `to`
    pub fn between(from: i32, to: i32) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::Idle,
        }
    }

    /// Signed single-floor step for this direction
    pub fn step(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Idle => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Idle => "IDLE",
        };
        f.write_str(label)
    }
}

/// A pickup at `source_floor` going to `destination_floor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Request {
    pub source_floor: i32,
    pub destination_floor: i32,
}

impl Request {
    pub fn new(source_floor: i32, destination_floor: i32) -> Self {
        Self {
            source_floor,
            destination_floor,
        }
    }

    /// Direction of the rider's trip (source to destination)
    pub fn direction(&self) -> Direction {
        Direction::between(self.source_floor, self.destination_floor)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_floor, self.destination_floor)
    }
}

/// Inclusive range of floors a car or dispatcher will serve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorRange {
    pub lowest: i32,
    pub highest: i32,
}

impl FloorRange {
    pub fn new(lowest: i32, highest: i32) -> Self {
        Self { lowest, highest }
    }

    pub fn contains(&self, floor: i32) -> bool {
        (self.lowest..=self.highest).contains(&floor)
    }

    /// First floor of `request` that falls outside the range, if any
    pub fn first_outside(&self, request: &Request) -> Option<i32> {
        [request.source_floor, request.destination_floor]
            .into_iter()
            .find(|floor| !self.contains(*floor))
    }
}

impl fmt::Display for FloorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.lowest, self.highest)
    }
}

/// Snapshot of a car's motion state, taken under the car's lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarPosition {
    pub floor: i32,
    pub direction: Direction,
}

/// One entry of a car's position stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorObservation {
    pub car_id: CarId,
    pub floor: i32,
    pub direction: Direction,
}

/// Read-only status of a car, used for summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarStatus {
    pub id: CarId,
    pub floor: i32,
    pub direction: Direction,
    /// Requests waiting in the queue (not counting one in flight)
    pub pending: usize,
    pub capacity: usize,
    /// Requests run to completion
    pub completed: u64,
    /// Single-floor steps taken since the car was created
    pub floors_travelled: u64,
}
