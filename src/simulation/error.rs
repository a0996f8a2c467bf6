//! Error types for request dispatch.
//!
//! Car-local errors (`CapacityExceeded`, `CarStopped`) are absorbed by the
//! dispatcher, which retries the pickup on the next-ranked car. Fleet-wide
//! errors (`NoCarAvailable`) and bad input (`InvalidFloor`) always reach the
//! caller.

use super::types::{CarId, FloorRange};

pub type Result<T> = core::result::Result<T, DispatchError>;

/// Unified error type for cars and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The car's queue already holds `capacity` requests.
    #[error("car {car_id} is at capacity ({capacity} pending requests)")]
    CapacityExceeded { car_id: CarId, capacity: usize },

    /// Every car rejected the pickup, or the fleet is empty.
    #[error("no car available for pickup {source_floor} -> {destination_floor}")]
    NoCarAvailable {
        source_floor: i32,
        destination_floor: i32,
    },

    /// A floor of the request lies outside the served range.
    #[error("floor {floor} is outside the served range {range}")]
    InvalidFloor { floor: i32, range: FloorRange },

    /// The car has been told to shut down and takes no more work.
    #[error("car {car_id} is stopped")]
    CarStopped { car_id: CarId },

    /// A car with this id is already registered.
    #[error("car {car_id} is already registered")]
    DuplicateCar { car_id: CarId },
}

impl DispatchError {
    /// Whether the dispatcher may recover by trying another car
    pub fn is_car_local(&self) -> bool {
        matches!(
            self,
            DispatchError::CapacityExceeded { .. }
                | DispatchError::CarStopped { .. }
                | DispatchError::InvalidFloor { .. }
        )
    }
}
