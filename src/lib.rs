//! Tourtrack - location tracking core for TourGuide
//!
//! Periodically refreshes the location of every registered user through a
//! bounded worker pool, scores proximity rewards, and ranks the attractions
//! nearest to a user.

pub mod domain;
pub mod error;
pub mod providers;
pub mod ranking;
pub mod registry;
pub mod service;
pub mod tracker;

pub use error::{Result, TourtrackError};
