//! Dispatcher that assigns pickups to cars
//!
//! The dispatcher owns the fleet registry and the scoring policy. It never
//! touches a car's state directly, only through `submit_request` and
//! `current_position`, so there is no lock spanning several cars.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::car::Car;
use super::error::{DispatchError, Result};
use super::scoring::{NearestCar, ScoringPolicy};
use super::types::{CarId, CarStatus, FloorRange, Request};

/// Assigns incoming pickups to the registered cars
#[derive(Debug)]
pub struct Dispatcher {
    /// Keyed by id so iteration order is the tie-break order
    cars: BTreeMap<CarId, Car>,
    floor_range: Option<FloorRange>,
    scoring: Box<dyn ScoringPolicy>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher using nearest-car scoring and no floor bounds
    pub fn new() -> Self {
        Self {
            cars: BTreeMap::new(),
            floor_range: None,
            scoring: Box::new(NearestCar),
        }
    }

    /// Reject pickups touching floors outside `range` before any car is asked
    pub fn with_floor_range(mut self, range: FloorRange) -> Self {
        self.floor_range = Some(range);
        self
    }

    /// Replace the scoring policy
    pub fn with_scoring(mut self, scoring: Box<dyn ScoringPolicy>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Add a car to the fleet. Setup-time only.
    pub fn register_car(&mut self, car: Car) -> Result<()> {
        match self.cars.entry(car.id()) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateCar { car_id: car.id() }),
            Entry::Vacant(slot) => {
                debug!("Registered car {} (capacity {})", car.id(), car.capacity());
                slot.insert(car);
                Ok(())
            }
        }
    }

    /// Assign a pickup from `source_floor` to `destination_floor` to a car
    ///
    /// Cars are ranked by the scoring policy (ties to the lowest id) and asked
    /// in order; a car that rejects with a car-local error is skipped. Returns
    /// the id of the car that accepted, or `NoCarAvailable` when every car
    /// rejected or the fleet is empty.
    ///
    /// Positions are snapshotted once per call. A car may move or accept other
    /// work right after its snapshot is taken, so the ranking is best-effort
    /// under concurrent pickups.
    pub fn request_pickup(&self, source_floor: i32, destination_floor: i32) -> Result<CarId> {
        let request = Request::new(source_floor, destination_floor);

        if let Some(range) = self.floor_range {
            if let Some(floor) = range.first_outside(&request) {
                return Err(DispatchError::InvalidFloor { floor, range });
            }
        }

        for car in self.rank_cars(&request) {
            match car.submit_request(request) {
                Ok(()) => {
                    info!("Pickup {} assigned to car {}", request, car.id());
                    return Ok(car.id());
                }
                Err(err) if err.is_car_local() => {
                    debug!("Car {} passed on pickup {}: {}", car.id(), request, err);
                }
                Err(err) => return Err(err),
            }
        }

        warn!("No car available for pickup {}", request);
        Err(DispatchError::NoCarAvailable {
            source_floor,
            destination_floor,
        })
    }

    /// Best car for a pickup by score alone, without queueing anything
    pub fn select_car(&self, source_floor: i32, destination_floor: i32) -> Option<CarId> {
        self.rank_cars(&Request::new(source_floor, destination_floor))
            .first()
            .map(|car| car.id())
    }

    fn rank_cars(&self, request: &Request) -> Vec<&Car> {
        let mut ranked: Vec<(u64, CarId, &Car)> = self
            .cars
            .values()
            .map(|car| {
                let position = car.current_position();
                (self.scoring.score(&position, request), car.id(), car)
            })
            .collect();
        ranked.sort_by_key(|(score, id, _)| (*score, *id));
        ranked.into_iter().map(|(_, _, car)| car).collect()
    }

    pub fn car(&self, id: CarId) -> Option<&Car> {
        self.cars.get(&id)
    }

    /// Registered cars in id order
    pub fn cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    pub fn car_ids(&self) -> Vec<CarId> {
        self.cars.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn floor_range(&self) -> Option<FloorRange> {
        self.floor_range
    }

    /// Status of every car, in id order
    pub fn fleet_status(&self) -> Vec<CarStatus> {
        self.cars.values().map(Car::status).collect()
    }
}
