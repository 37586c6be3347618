//! Tracklink Native - Host-side controller over a tracking service
//!
//! This crate connects the handle types of `tracklink-core` to a running
//! tracking service:
//! - A controller that caches frames and owns image calibration
//! - Listener callbacks driven by service events
//! - An asynchronous configuration proxy with deadlines
//! - A simulated service for tests, demos and offline tooling
//!
//! # Modules
//!
//! - [`controller`]: The application entry point
//! - [`service`]: The `TrackingService` seam, policy flags and events
//! - [`config`]: Configuration values and the request/response proxy
//! - [`simulation`]: In-memory service loadable from JSON fixtures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod controller;
pub mod error;
pub mod listener;
pub mod service;
pub mod settings;
pub mod simulation;

// Re-export key types
pub use config::{Config, ConfigRequest, ConfigValue};
pub use controller::{Controller, ControllerImpl};
pub use error::{ServiceError, ServiceResult};
pub use listener::Listener;
pub use service::{LogSeverity, PolicyFlags, ServiceEvent, TrackingService};
pub use settings::ControllerSettings;
pub use simulation::{LinearCalibration, SimulatedFixture, SimulatedService};
