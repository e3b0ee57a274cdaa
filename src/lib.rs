//! Watches the Steam store for paid games temporarily discounted to free.
//!
//! Once per cycle the [`monitor::Monitor`] fetches the store's specials
//! listing, looks up each listed app's price, and records every paid app
//! at 100% off into a JSON file. Each game is recorded at most once.
//!
//! ```no_run
//! use steam_freebies::config::MonitorConfig;
//! use steam_freebies::monitor::Monitor;
//!
//! # async fn example() -> steam_freebies::error::Result<()> {
//! let monitor = Monitor::from_config(MonitorConfig::default())?;
//! let report = monitor.run_cycle().await;
//! println!("{} new free games", report.discovered.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod storage;

#[cfg(test)]
mod test_support;
