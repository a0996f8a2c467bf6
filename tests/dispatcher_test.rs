//! Dispatch policy tests
//!
//! Workers are not started unless a test needs a moving car, so cars stay
//! where they were placed and accepted pickups stay in their car's queue.

use std::time::{Duration, Instant};

use elevator_sim::simulation::{
    Car, CarId, CarPosition, DirectionAware, Direction, DispatchError, Dispatcher, FloorRange,
    NearestCar, Request, ScoringPolicy,
};

/// Dispatcher with one car per entry of `floors`, ids starting at 1
fn fleet_at(floors: &[i32], capacity: usize) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    for (index, floor) in floors.iter().enumerate() {
        dispatcher
            .register_car(Car::new(CarId(index + 1), capacity, *floor, Duration::ZERO))
            .unwrap();
    }
    dispatcher
}

fn pending(dispatcher: &Dispatcher) -> Vec<usize> {
    dispatcher.cars().map(Car::pending_len).collect()
}

#[test]
fn test_nearest_car_selected() {
    let dispatcher = fleet_at(&[1, 10, 20], 5);

    assert_eq!(dispatcher.select_car(9, 15), Some(CarId(2)));
    assert_eq!(dispatcher.request_pickup(9, 15), Ok(CarId(2)));
    assert_eq!(pending(&dispatcher), vec![0, 1, 0]);
}

#[test]
fn test_tie_broken_by_lowest_id() {
    let dispatcher = fleet_at(&[8, 12, 12, 8], 5);

    for _ in 0..3 {
        assert_eq!(dispatcher.select_car(10, 0), Some(CarId(1)));
    }
    assert_eq!(dispatcher.request_pickup(10, 0), Ok(CarId(1)));
}

#[test]
fn test_tie_break_ignores_registration_order() {
    let mut dispatcher = Dispatcher::new();
    for (id, floor) in [(5, 3), (2, 7), (9, 3)] {
        dispatcher
            .register_car(Car::new(CarId(id), 5, floor, Duration::ZERO))
            .unwrap();
    }

    assert_eq!(dispatcher.request_pickup(5, 1), Ok(CarId(2)));
    assert_eq!(dispatcher.car_ids(), vec![CarId(2), CarId(5), CarId(9)]);
}

#[test]
fn test_full_car_falls_back_to_next_nearest() {
    let dispatcher = fleet_at(&[1, 10, 20], 1);
    dispatcher.car(CarId(2)).unwrap().submit_request(Request::new(10, 11)).unwrap();

    // Car 2 is closest but full; car 1 (distance 8) beats car 3 (distance 11)
    assert_eq!(dispatcher.request_pickup(9, 15), Ok(CarId(1)));
    assert_eq!(dispatcher.request_pickup(9, 15), Ok(CarId(3)));
    assert_eq!(pending(&dispatcher), vec![1, 1, 1]);
}

#[test]
fn test_fleet_exhaustion_leaves_queues_unchanged() {
    let dispatcher = fleet_at(&[1, 5], 2);
    for _ in 0..4 {
        dispatcher.request_pickup(3, 4).unwrap();
    }
    assert_eq!(pending(&dispatcher), vec![2, 2]);

    assert_eq!(
        dispatcher.request_pickup(3, 4),
        Err(DispatchError::NoCarAvailable {
            source_floor: 3,
            destination_floor: 4
        })
    );
    assert_eq!(pending(&dispatcher), vec![2, 2]);
}

#[test]
fn test_empty_fleet_has_no_car_available() {
    let dispatcher = Dispatcher::new();
    assert!(dispatcher.is_empty());
    assert_eq!(dispatcher.select_car(1, 2), None);
    assert!(matches!(
        dispatcher.request_pickup(1, 2),
        Err(DispatchError::NoCarAvailable { .. })
    ));
}

#[test]
fn test_stopped_car_is_skipped() {
    let dispatcher = fleet_at(&[1, 10], 5);
    dispatcher.car(CarId(1)).unwrap().stop();

    assert_eq!(dispatcher.request_pickup(1, 3), Ok(CarId(2)));
}

#[test]
fn test_duplicate_car_rejected() {
    let mut dispatcher = fleet_at(&[1], 5);
    let err = dispatcher
        .register_car(Car::new(CarId(1), 5, 3, Duration::ZERO))
        .unwrap_err();

    assert_eq!(err, DispatchError::DuplicateCar { car_id: CarId(1) });
    assert_eq!(dispatcher.len(), 1);
    assert_eq!(dispatcher.car(CarId(1)).unwrap().current_position().floor, 1);
}

#[test]
fn test_out_of_range_pickup_surfaces_invalid_floor() {
    let range = FloorRange::new(0, 10);
    let mut dispatcher = Dispatcher::new().with_floor_range(range);
    dispatcher
        .register_car(Car::new(CarId(1), 5, 0, Duration::ZERO))
        .unwrap();

    assert_eq!(
        dispatcher.request_pickup(-1, 5),
        Err(DispatchError::InvalidFloor { floor: -1, range })
    );
    assert_eq!(
        dispatcher.request_pickup(5, 42),
        Err(DispatchError::InvalidFloor { floor: 42, range })
    );
    assert_eq!(pending(&dispatcher), vec![0]);
}

#[test]
fn test_car_range_rejection_falls_back() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_car(
            Car::new(CarId(1), 5, 5, Duration::ZERO).with_floor_range(FloorRange::new(0, 9)),
        )
        .unwrap();
    dispatcher
        .register_car(Car::new(CarId(2), 5, 0, Duration::ZERO))
        .unwrap();

    // Car 1 is nearer but does not serve floor 12
    assert_eq!(dispatcher.request_pickup(6, 12), Ok(CarId(2)));
    assert_eq!(dispatcher.request_pickup(6, 8), Ok(CarId(1)));
}

#[test]
fn test_fleet_status_in_id_order() {
    let dispatcher = fleet_at(&[4, -2], 3);
    dispatcher.request_pickup(-1, 6).unwrap();

    let status = dispatcher.fleet_status();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].id, CarId(1));
    assert_eq!(status[0].floor, 4);
    assert_eq!(status[0].pending, 0);
    assert_eq!(status[1].id, CarId(2));
    assert_eq!(status[1].pending, 1);
    assert_eq!(status[1].capacity, 3);
}

#[test]
fn test_nearest_car_ignores_direction() {
    let request = Request::new(8, 2);
    let moving_away = CarPosition {
        floor: 5,
        direction: Direction::Down,
    };
    let idle = CarPosition {
        floor: 11,
        direction: Direction::Idle,
    };

    assert_eq!(NearestCar.score(&moving_away, &request), 3);
    assert_eq!(NearestCar.score(&idle, &request), 3);
}

#[test]
fn test_direction_aware_penalises_cars_moving_away() {
    let policy = DirectionAware::default();
    let request = Request::new(8, 2);
    let moving_toward = CarPosition {
        floor: 5,
        direction: Direction::Up,
    };
    let moving_away = CarPosition {
        floor: 11,
        direction: Direction::Up,
    };
    let idle = CarPosition {
        floor: 11,
        direction: Direction::Idle,
    };

    assert_eq!(policy.score(&moving_toward, &request), 3);
    assert_eq!(
        policy.score(&moving_away, &request),
        3 + policy.wrong_way_penalty
    );
    assert_eq!(policy.score(&idle, &request), 3);
}

#[test]
fn test_custom_scoring_policy_is_used() {
    /// Prefers the highest car, whatever the pickup
    #[derive(Debug)]
    struct HighestCar;

    impl ScoringPolicy for HighestCar {
        fn score(&self, position: &CarPosition, _request: &Request) -> u64 {
            (1000 - position.floor) as u64
        }
    }

    let mut dispatcher = Dispatcher::new().with_scoring(Box::new(HighestCar));
    for (id, floor) in [(1, 2), (2, 30), (3, 7)] {
        dispatcher
            .register_car(Car::new(CarId(id), 5, floor, Duration::ZERO))
            .unwrap();
    }

    assert_eq!(dispatcher.request_pickup(2, 3), Ok(CarId(2)));
}

/// Wait until the car's worker has picked a direction
fn wait_for_direction(car: &Car, direction: Direction) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while car.current_position().direction != direction {
        assert!(Instant::now() < deadline, "car {} never moved {}", car.id(), direction);
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_direction_aware_dispatch_prefers_car_heading_to_pickup() {
    // Car 1 is nearest to floor 5 but is heading down, away from it
    let moving_away = Car::new(CarId(1), 5, 4, Duration::from_secs(30));
    let idle = Car::new(CarId(2), 5, 7, Duration::ZERO);
    moving_away.submit_request(Request::new(4, -100)).unwrap();
    let worker = moving_away.spawn().unwrap();
    wait_for_direction(&moving_away, Direction::Down);

    let mut nearest = Dispatcher::new();
    let mut direction_aware =
        Dispatcher::new().with_scoring(Box::new(DirectionAware::default()));
    for car in [&moving_away, &idle] {
        nearest.register_car(car.clone()).unwrap();
        direction_aware.register_car(car.clone()).unwrap();
    }

    assert_eq!(nearest.select_car(5, 9), Some(CarId(1)));
    assert_eq!(direction_aware.request_pickup(5, 9), Ok(CarId(2)));
    assert_eq!(idle.pending_len(), 1);
    assert_eq!(moving_away.pending_len(), 0);

    moving_away.stop();
    worker.join().unwrap();
}
