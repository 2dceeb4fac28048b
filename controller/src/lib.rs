//! Vescalc Controller
//!
//! Orchestration layer of the conversion calculator: owns the rate
//! snapshots, drives initial loads and manual refreshes, debounces
//! amount-driven recomputes, and exposes the observable state the
//! presentation layer renders.

pub mod config;
pub mod controller;
pub mod scheduler;
pub mod state;

pub use config::CalculatorConfig;
pub use controller::RateController;
pub use scheduler::{RecomputeScheduler, SchedulerConfig};
pub use state::{RatesSnapshot, RatesState, SchedulerPhase};
