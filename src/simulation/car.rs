//! Elevator car logic for the dispatch simulation
//!
//! Each car is a monitor: its queue, position and counters sit behind one
//! mutex with two condition variables. `work` wakes the car's worker when a
//! request arrives (or the car is stopped), `drained` wakes anyone waiting for
//! the car to run out of work. The worker thread is the only writer of the
//! car's floor.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use super::error::{DispatchError, Result};
use super::types::{CarId, CarPosition, CarStatus, Direction, FloorObservation, FloorRange, Request};

/// Mutable state of a car, only touched with the monitor lock held
#[derive(Debug)]
struct CarState {
    floor: i32,
    direction: Direction,
    pending: VecDeque<Request>,
    /// A request has been dequeued and is being travelled
    in_flight: bool,
    /// A worker thread currently owns this car
    worker_active: bool,
    stopping: bool,
    completed: u64,
    floors_travelled: u64,
}

impl CarState {
    fn is_drained(&self) -> bool {
        self.stopping || (!self.in_flight && self.pending.is_empty())
    }
}

#[derive(Debug)]
struct Monitor {
    state: Mutex<CarState>,
    work: Condvar,
    drained: Condvar,
}

/// An elevator car with a bounded FIFO request queue
///
/// Cloning a `Car` yields another handle to the same car.
#[derive(Debug, Clone)]
pub struct Car {
    id: CarId,
    capacity: usize,
    floor_delay: Duration,
    floor_range: Option<FloorRange>,
    observer: Option<Sender<FloorObservation>>,
    monitor: Arc<Monitor>,
}

impl Car {
    /// Create an idle car at `start_floor` that can queue up to `capacity` requests
    pub fn new(id: CarId, capacity: usize, start_floor: i32, floor_delay: Duration) -> Self {
        Self {
            id,
            capacity,
            floor_delay,
            floor_range: None,
            observer: None,
            monitor: Arc::new(Monitor {
                state: Mutex::new(CarState {
                    floor: start_floor,
                    direction: Direction::Idle,
                    pending: VecDeque::with_capacity(capacity),
                    in_flight: false,
                    worker_active: false,
                    stopping: false,
                    completed: 0,
                    floors_travelled: 0,
                }),
                work: Condvar::new(),
                drained: Condvar::new(),
            }),
        }
    }

    /// Reject requests touching floors outside `range`
    pub fn with_floor_range(mut self, range: FloorRange) -> Self {
        self.floor_range = Some(range);
        self
    }

    /// Send every floor observation of this car to `observer`
    pub fn with_observer(mut self, observer: Sender<FloorObservation>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn id(&self) -> CarId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn floor_range(&self) -> Option<FloorRange> {
        self.floor_range
    }

    /// Queue a request at the tail of this car's FIFO
    ///
    /// Fails with `CapacityExceeded` when the queue is full, `InvalidFloor`
    /// when a floor lies outside the car's range and `CarStopped` once the
    /// car has been stopped. A rejected request is never queued.
    pub fn submit_request(&self, request: Request) -> Result<()> {
        if let Some(range) = self.floor_range {
            if let Some(floor) = range.first_outside(&request) {
                return Err(DispatchError::InvalidFloor { floor, range });
            }
        }

        let mut state = self.monitor.state.lock();
        if state.stopping {
            return Err(DispatchError::CarStopped { car_id: self.id });
        }
        if state.pending.len() >= self.capacity {
            return Err(DispatchError::CapacityExceeded {
                car_id: self.id,
                capacity: self.capacity,
            });
        }
        state.pending.push_back(request);
        let queued = state.pending.len();
        drop(state);

        self.monitor.work.notify_one();
        info!(
            "Car {} added request {} ({}/{} pending)",
            self.id, request, queued, self.capacity
        );
        Ok(())
    }

    /// Consistent snapshot of floor and direction
    pub fn current_position(&self) -> CarPosition {
        let state = self.monitor.state.lock();
        CarPosition {
            floor: state.floor,
            direction: state.direction,
        }
    }

    /// Number of queued requests, not counting one in flight
    pub fn pending_len(&self) -> usize {
        self.monitor.state.lock().pending.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.monitor.state.lock().stopping
    }

    pub fn status(&self) -> CarStatus {
        let state = self.monitor.state.lock();
        CarStatus {
            id: self.id,
            floor: state.floor,
            direction: state.direction,
            pending: state.pending.len(),
            capacity: self.capacity,
            completed: state.completed,
            floors_travelled: state.floors_travelled,
        }
    }

    /// Raise the stop signal and wake the worker and any idle waiters
    ///
    /// The worker exits at its next check: while idle, between floors or
    /// during the transit delay. Queued requests are discarded.
    pub fn stop(&self) {
        self.monitor.state.lock().stopping = true;
        self.monitor.work.notify_all();
        self.monitor.drained.notify_all();
    }

    /// Block until the car has no queued or in-flight request, or is stopped
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.monitor.state.lock();
        while !state.is_drained() {
            match deadline {
                Some(deadline) => {
                    if self
                        .monitor
                        .drained
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return state.is_drained();
                    }
                }
                None => self.monitor.drained.wait(&mut state),
            }
        }
        true
    }

    /// Run this car's worker loop on a dedicated thread
    ///
    /// Fails with `AlreadyExists` if a worker is already running for this car.
    pub fn spawn(&self) -> io::Result<JoinHandle<()>> {
        if !self.claim_worker() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("car {} already has a worker", self.id),
            ));
        }

        let car = self.clone();
        thread::Builder::new()
            .name(format!("car-{}", self.id))
            .spawn(move || car.serve())
            .map_err(|err| {
                self.release_worker();
                err
            })
    }

    /// Worker main loop: serve queued requests in order until stopped
    ///
    /// Returns at once if another worker already runs this car.
    pub fn run(&self) {
        if !self.claim_worker() {
            warn!("Car {} already has a worker, not starting another", self.id);
            return;
        }
        self.serve();
    }

    fn claim_worker(&self) -> bool {
        let mut state = self.monitor.state.lock();
        if state.worker_active {
            return false;
        }
        state.worker_active = true;
        true
    }

    fn release_worker(&self) {
        self.monitor.state.lock().worker_active = false;
    }

    fn serve(&self) {
        info!(
            "Car {} worker started at floor {}",
            self.id,
            self.current_position().floor
        );

        while let Some(request) = self.next_request() {
            self.process_request(request);
        }

        self.finish();
    }

    /// Dequeue the head request, blocking while the queue is empty
    ///
    /// Returns `None` once the car is stopped.
    fn next_request(&self) -> Option<Request> {
        let mut state = self.monitor.state.lock();
        loop {
            if state.stopping {
                return None;
            }
            if let Some(request) = state.pending.pop_front() {
                state.in_flight = true;
                return Some(request);
            }
            state.direction = Direction::Idle;
            self.monitor.drained.notify_all();
            self.monitor.work.wait(&mut state);
        }
    }

    fn process_request(&self, request: Request) {
        debug!("Car {} serving request {}", self.id, request);

        // Departure observation at the current floor
        let (floor, direction) = {
            let mut state = self.monitor.state.lock();
            let direction = match Direction::between(state.floor, request.source_floor) {
                Direction::Idle => request.direction(),
                towards_source => towards_source,
            };
            state.direction = direction;
            (state.floor, direction)
        };
        self.emit(floor, direction);

        let arrived =
            self.travel_to(request.source_floor) && self.travel_to(request.destination_floor);

        let mut state = self.monitor.state.lock();
        state.in_flight = false;
        if arrived {
            state.completed += 1;
            // The second leg of a same-floor request has no direction
            if request.direction() == Direction::Idle {
                state.direction = Direction::Idle;
            }
        }
        let floor = state.floor;
        drop(state);

        if arrived {
            info!("Car {} completed request {}", self.id, request);
        } else {
            warn!(
                "Car {} stopped at floor {} while serving request {}",
                self.id, floor, request
            );
        }
    }

    /// Move one floor at a time to `target`, returning `false` if stopped on the way
    fn travel_to(&self, target: i32) -> bool {
        let direction = {
            let mut state = self.monitor.state.lock();
            if state.floor == target {
                return !state.stopping;
            }
            let direction = Direction::between(state.floor, target);
            state.direction = direction;
            direction
        };

        loop {
            if !self.pause() {
                return false;
            }

            let floor = {
                let mut state = self.monitor.state.lock();
                state.floor += direction.step();
                state.floors_travelled += 1;
                state.floor
            };
            self.emit(floor, direction);

            if floor == target {
                return true;
            }
        }
    }

    /// Simulated transit time for one floor; wakes early and returns `false` on stop
    fn pause(&self) -> bool {
        let mut state = self.monitor.state.lock();
        let Some(deadline) = Instant::now().checked_add(self.floor_delay) else {
            while !state.stopping {
                self.monitor.work.wait(&mut state);
            }
            return false;
        };
        while !state.stopping {
            if self
                .monitor
                .work
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        !state.stopping
    }

    fn emit(&self, floor: i32, direction: Direction) {
        debug!("Car {} reached floor {} ({})", self.id, floor, direction);
        if let Some(observer) = &self.observer {
            // A dropped receiver only means nobody is watching any more
            let _ = observer.send(FloorObservation {
                car_id: self.id,
                floor,
                direction,
            });
        }
    }

    fn finish(&self) {
        let mut state = self.monitor.state.lock();
        let discarded = state.pending.len();
        state.pending.clear();
        state.in_flight = false;
        state.worker_active = false;
        state.direction = Direction::Idle;
        let floor = state.floor;
        drop(state);
        self.monitor.drained.notify_all();

        if discarded > 0 {
            warn!(
                "Car {} discarded {} queued request(s) on shutdown",
                self.id, discarded
            );
        }
        info!("Car {} worker stopped at floor {}", self.id, floor);
    }
}
