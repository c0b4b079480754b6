use nalgebra::{RealField, SVector};

use crate::utils::state::GaussianState;

/// S: State Size, Z: Observation Size, U: Input Size
pub trait BayesianFilter<T: RealField, const S: usize, const Z: usize, const U: usize> {
    type Error;

    /// One full step: move the estimate `dt` forward (with optional input `u`),
    /// then correct it with the observation `z`.
    fn update_estimate(
        &mut self,
        u: Option<&SVector<T, U>>,
        z: &SVector<T, Z>,
        dt: T,
    ) -> Result<GaussianState<T, S>, Self::Error>;

    fn gaussian_estimate(&self) -> GaussianState<T, S>;
}
