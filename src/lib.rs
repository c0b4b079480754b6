//! Constant-velocity Kalman tracking of a 2D target from noisy position fixes.
//!
//! The estimator in [`localization`] owns no I/O and no randomness; harnesses
//! drive it with `predict`/`update` and read the estimate back.

pub mod error;
pub mod localization;
pub mod models;
pub mod utils;

pub use error::TrackerError;
pub use localization::{BayesianFilter, KalmanTracker2D, TrackerConfig};
