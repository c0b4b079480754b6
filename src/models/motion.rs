use nalgebra::{Matrix4, Matrix4x2, RealField, SMatrix, SVector, Vector2, Vector4};

/// Linear motion model: `x_{t+1} = F(dt) * x_t + B(dt) * u`
pub trait LinearMotionModel<T: RealField, const S: usize, const U: usize> {
    fn transition(&self, dt: T) -> SMatrix<T, S, S>;
    fn control(&self, dt: T) -> SMatrix<T, S, U>;

    fn prediction(&self, x: &SVector<T, S>, u: &SVector<T, U>, dt: T) -> SVector<T, S> {
        self.transition(dt.clone()) * x + self.control(dt) * u
    }
}

/// constant velocity motion model
///
/// state = [x, dx, y, dy]
///
/// x_{t+1} = x_t + dx_t * dt
///
/// dx_{t+1} = dx_t + u_x
///
/// y_{t+1} = y_t + dy_t * dt
///
/// dy_{t+1} = dy_t + u_y
///
/// where the optional input `u` is a velocity increment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstantVelocity;

impl ConstantVelocity {
    /// Discretized white-noise-acceleration process noise for one step of `dt`,
    /// `variance` being the acceleration variance shared by both axes.
    pub fn white_noise_acceleration(dt: f64, variance: f64) -> Matrix4<f64> {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;
        let pp = dt4 / 4.0 * variance;
        let pv = dt3 / 2.0 * variance;
        let vv = dt2 * variance;
        #[allow(clippy::deprecated_cfg_attr)]
        #[cfg_attr(rustfmt, rustfmt_skip)]
        Matrix4::<f64>::new(
            pp, pv, 0., 0.,
            pv, vv, 0., 0.,
            0., 0., pp, pv,
            0., 0., pv, vv,
        )
    }
}

impl LinearMotionModel<f64, 4, 2> for ConstantVelocity {
    fn transition(&self, dt: f64) -> Matrix4<f64> {
        #[allow(clippy::deprecated_cfg_attr)]
        #[cfg_attr(rustfmt, rustfmt_skip)]
        Matrix4::<f64>::new(
            1., dt, 0., 0.,
            0., 1., 0., 0.,
            0., 0., 1., dt,
            0., 0., 0., 1.,
        )
    }

    fn control(&self, _dt: f64) -> Matrix4x2<f64> {
        #[allow(clippy::deprecated_cfg_attr)]
        #[cfg_attr(rustfmt, rustfmt_skip)]
        Matrix4x2::<f64>::new(
            0., 0.,
            1., 0.,
            0., 0.,
            0., 1.,
        )
    }

    fn prediction(&self, x: &Vector4<f64>, u: &Vector2<f64>, dt: f64) -> Vector4<f64> {
        Vector4::new(x[0] + x[1] * dt, x[1] + u.x, x[2] + x[3] * dt, x[3] + u.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_matches_matrix_form() {
        let model = ConstantVelocity;
        let x = Vector4::new(1.0, 2.0, -3.0, 0.5);
        let u = Vector2::new(0.1, -0.2);
        let dt = 0.25;
        let direct = model.prediction(&x, &u, dt);
        let matrix = model.transition(dt) * x + model.control(dt) * u;
        assert!((direct - matrix).norm() < 1e-12);
        assert!((direct - Vector4::new(1.5, 2.1, -2.875, 0.3)).norm() < 1e-12);
    }

    #[test]
    fn white_noise_acceleration_is_symmetric_psd() {
        let q = ConstantVelocity::white_noise_acceleration(0.1, 2.0);
        assert_eq!(q, q.transpose());
        let eigenvalues = q.symmetric_eigenvalues();
        assert!(eigenvalues.iter().all(|e| *e >= -1e-15));
        assert!((q[(1, 1)] - 0.02).abs() < 1e-15);
    }
}
