//! Tally Dashboard - back-office screens for a small retail shop.
//!
//! Every screen keeps its records in a
//! [`SharedCollection`](tally_engine::SharedCollection) and derives what it
//! shows through a [`ViewEngine`](tally_engine::ViewEngine): the inventory
//! table, the customer list, alerts, the sales log and the reports page.

pub mod config;
pub mod error;
pub mod screens;

pub use config::{Config, ConfigError};
pub use error::{AppError, Result};
pub use screens::{render, Screen};
