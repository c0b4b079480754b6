mod bayesian_filter;
mod kalman_filter;

pub use bayesian_filter::BayesianFilter;
pub use kalman_filter::{
    CovarianceUpdate, Innovation, KalmanTracker2D, Phase, TrackerConfig,
    DEFAULT_SINGULARITY_TOLERANCE, DEFAULT_SYMMETRY_TOLERANCE,
};
