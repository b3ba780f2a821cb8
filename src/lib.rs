//! Solar PV output prediction for Indian cities.
//!
//! Offline: fetch hourly weather history, label it with a physics-based
//! simulation, fit a random forest. Online: turn one weather observation
//! into a feature vector, predict peak power and derive daily metrics.

#[cfg(feature = "api")]
pub mod api;
pub mod cities;
pub mod cli;
pub mod config;
pub mod error;
/// Feature vector construction for the predictor.
pub mod features;
pub mod io;
pub mod label;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod training;
pub mod weather;
