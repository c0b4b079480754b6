use nalgebra::{RealField, SMatrix, SVector};

/// Gaussian density over `D` dimensions, kept in precision form so repeated
/// evaluations only need a matrix-vector product.
#[derive(Debug, Clone, Copy)]
pub struct MultiVariateNormal<T: RealField, const D: usize> {
    mean: SVector<T, D>,
    precision: SMatrix<T, D, D>,
    factor: T,
}

impl<T: RealField + Copy, const D: usize> MultiVariateNormal<T, D> {
    /// Returns `None` when `covariance` is not positive definite.
    pub fn new(mean: &SVector<T, D>, covariance: &SMatrix<T, D, D>) -> Option<Self> {
        let covariance_cholesky = covariance.cholesky()?;
        let det = covariance_cholesky.determinant();
        let precision = covariance_cholesky.inverse();
        let factor = T::one() / (T::two_pi().powi(D as i32) * det).sqrt();
        Some(MultiVariateNormal {
            mean: *mean,
            precision,
            factor,
        })
    }

    /// Squared Mahalanobis distance of `x` from the mean
    pub fn mahalanobis_squared(&self, x: &SVector<T, D>) -> T {
        let dx = self.mean - x;
        (dx.transpose() * self.precision * dx).x
    }

    /// Probability density function
    pub fn pdf(&self, x: &SVector<T, D>) -> T {
        let neg_half = T::from_f64(-0.5).unwrap_or_else(T::zero);
        self.factor * T::exp(neg_half * self.mahalanobis_squared(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Vector2};

    #[test]
    fn standard_normal_peak() {
        let mvn = MultiVariateNormal::new(&Vector2::zeros(), &Matrix2::<f64>::identity()).unwrap();
        let peak = 1.0 / (2.0 * std::f64::consts::PI);
        assert!((mvn.pdf(&Vector2::zeros()) - peak).abs() < 1e-12);
        assert!((mvn.mahalanobis_squared(&Vector2::new(3.0, 4.0)) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn singular_covariance_is_rejected() {
        let cov = Matrix2::new(1.0, 1.0, 1.0, 1.0);
        assert!(MultiVariateNormal::new(&Vector2::zeros(), &cov).is_none());
    }
}
