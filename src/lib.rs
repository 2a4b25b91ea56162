pub mod address;
pub mod board;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod facade;
pub mod geocode;
pub mod logging;
pub mod stats;
pub mod store;
pub mod tasks;
pub mod variant;

// Domain data shapes shared across layers
pub mod domain;
