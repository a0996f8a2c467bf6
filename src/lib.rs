//! Elevator Dispatch Library
//!
//! A multi-car elevator dispatch engine with one worker thread per car,
//! usable from tests or the headless console runner.

pub mod simulation;
