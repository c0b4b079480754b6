use nalgebra::{RealField, SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::utils::{Matrix, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianState<T: RealField, const D: usize> {
    /// State Vector
    pub x: SVector<T, D>,
    /// Covariance Matrix
    pub cov: SMatrix<T, D, D>,
}

impl<T: RealField + Copy, const D: usize> GaussianState<T, D> {
    pub fn new(x: SVector<T, D>, cov: SMatrix<T, D, D>) -> GaussianState<T, D> {
        GaussianState { x, cov }
    }

    /// Sum of the variances
    pub fn uncertainty(&self) -> T {
        self.cov.trace()
    }
}

/// Number of floats in a [`Checkpoint`]: the 4-vector followed by the 4x4 covariance.
pub const CHECKPOINT_LEN: usize = 4 + 4 * 4;

/// Flat record of a tracking session: `[x, dx, y, dy, P00, P01, .., P33]`,
/// covariance in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub values: [f64; CHECKPOINT_LEN],
}

impl Checkpoint {
    pub fn from_slice(values: &[f64]) -> Result<Checkpoint, TrackerError> {
        let values: [f64; CHECKPOINT_LEN] = values.try_into().map_err(|_| {
            TrackerError::InvalidInput(format!(
                "checkpoint needs {CHECKPOINT_LEN} values, got {}",
                values.len()
            ))
        })?;
        Ok(Checkpoint { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl From<&GaussianState<f64, 4>> for Checkpoint {
    fn from(state: &GaussianState<f64, 4>) -> Checkpoint {
        let mut values = [0.0; CHECKPOINT_LEN];
        values[..4].copy_from_slice(state.x.as_slice());
        // nalgebra stores column-major, the record is row-major
        for (i, row) in state.cov.row_iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                values[4 + i * 4 + j] = *v;
            }
        }
        Checkpoint { values }
    }
}

impl From<&Checkpoint> for GaussianState<f64, 4> {
    fn from(checkpoint: &Checkpoint) -> GaussianState<f64, 4> {
        let x = Vector::<4>::from_row_slice(&checkpoint.values[..4]);
        let cov = Matrix::<4, 4>::from_row_slice(&checkpoint.values[4..]);
        GaussianState { x, cov }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix4, Vector4};

    #[test]
    fn checkpoint_is_row_major() {
        #[allow(clippy::deprecated_cfg_attr)]
        #[cfg_attr(rustfmt, rustfmt_skip)]
        let cov = Matrix4::new(
            1., 2., 0., 0.,
            3., 4., 0., 0.,
            0., 0., 5., 6.,
            0., 0., 7., 8.,
        );
        let state = GaussianState::new(Vector4::new(0.1, 0.2, 0.3, 0.4), cov);
        let checkpoint = Checkpoint::from(&state);
        assert_eq!(&checkpoint.values[..6], &[0.1, 0.2, 0.3, 0.4, 1., 2.]);
        assert_eq!(checkpoint.values[8], 3.);
        assert_eq!(GaussianState::from(&checkpoint), state);
    }

    #[test]
    fn checkpoint_from_short_slice_fails() {
        let err = Checkpoint::from_slice(&[0.0; 19]).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
        assert!(Checkpoint::from_slice(&[0.0; 20]).is_ok());
    }
}
