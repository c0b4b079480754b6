pub mod mvn;
pub mod record;
pub mod state;

use nalgebra::{SMatrix, SVector};

use crate::error::TrackerError;

pub type Vector<const N: usize> = SVector<f64, N>;
pub type Matrix<const A: usize, const B: usize> = SMatrix<f64, A, B>;

/// Average a square matrix with its transpose to absorb floating-point asymmetry.
pub fn symmetrize<const D: usize>(m: &Matrix<D, D>) -> Matrix<D, D> {
    (m + m.transpose()) * 0.5
}

/// Clamp negative diagonal entries (rounding artefacts) to zero.
pub fn clamp_negative_diagonal<const D: usize>(m: &mut Matrix<D, D>) {
    for i in 0..D {
        if m[(i, i)] < 0.0 {
            m[(i, i)] = 0.0;
        }
    }
}

/// Cheap covariance sanity check: finite, symmetric within `tolerance`
/// (relative to the largest entry), and a non-negative diagonal.
/// This does not prove positive semi-definiteness.
pub fn check_covariance<const D: usize>(
    name: &str,
    m: &Matrix<D, D>,
    tolerance: f64,
) -> Result<(), TrackerError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(TrackerError::InvalidConfiguration(format!(
            "{name} contains non-finite entries"
        )));
    }
    let scale = m.amax().max(1.0);
    for i in 0..D {
        if m[(i, i)] < 0.0 {
            return Err(TrackerError::InvalidConfiguration(format!(
                "{name} has negative variance {} at ({i}, {i})",
                m[(i, i)]
            )));
        }
        for j in (i + 1)..D {
            if (m[(i, j)] - m[(j, i)]).abs() > tolerance * scale {
                return Err(TrackerError::InvalidConfiguration(format!(
                    "{name} is not symmetric at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Matrix4};

    #[test]
    fn symmetrize_averages_off_diagonal() {
        let m = Matrix2::new(1.0, 2.0, 4.0, 3.0);
        let s = symmetrize(&m);
        assert_eq!(s, Matrix2::new(1.0, 3.0, 3.0, 3.0));
    }

    #[test]
    fn clamp_only_touches_negative_diagonal() {
        let mut m = Matrix2::new(-1e-18, -0.5, -0.5, 2.0);
        clamp_negative_diagonal(&mut m);
        assert_eq!(m, Matrix2::new(0.0, -0.5, -0.5, 2.0));
    }

    #[test]
    fn check_covariance_accepts_identity() {
        assert!(check_covariance("p", &Matrix4::<f64>::identity(), 1e-9).is_ok());
        assert!(check_covariance("r", &Matrix2::<f64>::zeros(), 1e-9).is_ok());
    }

    #[test]
    fn check_covariance_rejects_bad_matrices() {
        let asymmetric = Matrix2::new(1.0, 0.5, 0.0, 1.0);
        let negative = Matrix2::new(-1.0, 0.0, 0.0, 1.0);
        let nan = Matrix2::new(f64::NAN, 0.0, 0.0, 1.0);
        for m in [asymmetric, negative, nan] {
            assert!(matches!(
                check_covariance("r", &m, 1e-9),
                Err(TrackerError::InvalidConfiguration(_))
            ));
        }
    }
}
