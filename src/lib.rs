// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod recommend;
pub mod specs;
pub mod store;
