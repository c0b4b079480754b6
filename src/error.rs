/// Errors returned by the tracker. None of them leave the tracker half-updated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    /// A covariance or model matrix handed in at construction (or reset) is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Non-positive `dt`, non-finite values or a measurement of the wrong length.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The innovation covariance cannot be inverted within tolerance.
    #[error("innovation covariance is singular (reciprocal condition number {reciprocal_condition:e})")]
    SingularInnovation { reciprocal_condition: f64 },
}
