//! Fleet lifecycle: assembling cars into a dispatcher and running their workers
//!
//! Cars are registered before any worker runs, so queues can be pre-loaded
//! deterministically. `start` spawns one thread per car; `shutdown` stops and
//! joins them and also runs on drop.

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use log::{error, info};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::car::Car;
use super::config::FleetConfig;
use super::dispatcher::Dispatcher;
use super::types::{CarId, FloorObservation};

/// A dispatcher together with the worker threads of its cars
#[derive(Debug)]
pub struct Fleet {
    dispatcher: Arc<Dispatcher>,
    workers: Vec<(CarId, JoinHandle<()>)>,
    stopped: bool,
}

impl Fleet {
    /// Build and register the cars described by `config`, without starting them
    ///
    /// Every car sends its floor observations to `observer` when one is given.
    pub fn from_config(
        config: &FleetConfig,
        observer: Option<Sender<FloorObservation>>,
    ) -> Result<Self> {
        config.validate().context("Invalid fleet configuration")?;

        let mut dispatcher = Dispatcher::new().with_scoring(config.scoring.build());
        if let Some(range) = config.floor_range {
            dispatcher = dispatcher.with_floor_range(range);
        }

        for index in 0..config.num_cars {
            let mut car = Car::new(
                CarId(index + 1),
                config.capacity,
                config.start_floor(index),
                config.floor_delay,
            );
            if let Some(range) = config.floor_range {
                car = car.with_floor_range(range);
            }
            if let Some(observer) = &observer {
                car = car.with_observer(observer.clone());
            }
            dispatcher
                .register_car(car)
                .context("Failed to register car")?;
        }

        info!(
            "Assembled fleet of {} cars (capacity {}, {:?} per floor)",
            config.num_cars, config.capacity, config.floor_delay
        );
        Ok(Self::from_dispatcher(dispatcher))
    }

    /// Wrap a hand-assembled dispatcher
    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            workers: Vec::new(),
            stopped: false,
        }
    }

    /// Shared handle for callers issuing pickups, possibly from several threads
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Spawn one worker thread per car
    pub fn start(&mut self) -> Result<()> {
        if self.stopped {
            anyhow::bail!("fleet has been shut down");
        }
        if self.is_running() {
            anyhow::bail!("fleet is already running");
        }

        for car in self.dispatcher.cars() {
            let handle = car
                .spawn()
                .with_context(|| format!("Failed to spawn worker for car {}", car.id()))?;
            self.workers.push((car.id(), handle));
        }

        info!("Started {} car workers", self.workers.len());
        Ok(())
    }

    /// Wait until every car has drained its queue, or `timeout` elapses
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        self.dispatcher.cars().all(|car| {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            car.wait_idle(remaining)
        })
    }

    /// Stop every car and join its worker. Idempotent.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        for car in self.dispatcher.cars() {
            car.stop();
        }

        let joined = self.workers.len();
        for (car_id, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Car {} worker panicked", car_id);
            }
        }

        info!("Fleet shut down ({} workers joined)", joined);
    }
}

impl Drop for Fleet {
    fn drop(&mut self) {
        self.shutdown();
    }
}
