// Linear Kalman filter tracking [x, dx, y, dy] from noisy (x, y) position fixes.

use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::TrackerError;
use crate::localization::bayesian_filter::BayesianFilter;
use crate::models::measurement::{LinearMeasurementModel, PositionMeasurement};
use crate::models::motion::{ConstantVelocity, LinearMotionModel};
use crate::utils::mvn::MultiVariateNormal;
use crate::utils::state::{Checkpoint, GaussianState};
use crate::utils::{check_covariance, clamp_negative_diagonal, symmetrize};

pub const DEFAULT_SINGULARITY_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-9;

/// How the posterior covariance is formed after the gain is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceUpdate {
    /// P = (I - K * H) * P
    #[default]
    Standard,
    /// P = (I - K * H) * P * (I - K * H)^T + K * R * K^T
    Joseph,
}

/// Where the tracker stands in the predict/update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Holding the caller's prior, nothing applied yet
    Initial,
    AwaitingPredict,
    AwaitingUpdate,
}

/// Diagnostics of one successful update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Innovation {
    /// z - H * x
    pub residual: Vector2<f64>,
    /// S = H * P * H^T + R
    pub covariance: Matrix2<f64>,
    /// Normalized innovation squared, residual^T * S^-1 * residual
    pub nis: f64,
    /// Density of the residual under N(0, S), when S is positive definite
    pub likelihood: Option<f64>,
}

fn default_singularity_tolerance() -> f64 {
    DEFAULT_SINGULARITY_TOLERANCE
}

fn default_symmetry_tolerance() -> f64 {
    DEFAULT_SYMMETRY_TOLERANCE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub initial: GaussianState<f64, 4>,
    pub process_noise: Matrix4<f64>,
    pub measurement_noise: Matrix2<f64>,
    #[serde(default)]
    pub measurement_model: PositionMeasurement,
    #[serde(default)]
    pub covariance_update: CovarianceUpdate,
    /// Smallest accepted reciprocal condition number of the innovation covariance
    #[serde(default = "default_singularity_tolerance")]
    pub singularity_tolerance: f64,
    /// Largest accepted |P_ij - P_ji|, relative to the largest entry
    #[serde(default = "default_symmetry_tolerance")]
    pub symmetry_tolerance: f64,
}

impl TrackerConfig {
    pub fn new(
        initial_state: Vector4<f64>,
        initial_covariance: Matrix4<f64>,
        process_noise: Matrix4<f64>,
        measurement_noise: Matrix2<f64>,
    ) -> TrackerConfig {
        TrackerConfig {
            initial: GaussianState::new(initial_state, initial_covariance),
            process_noise,
            measurement_noise,
            measurement_model: PositionMeasurement::default(),
            covariance_update: CovarianceUpdate::default(),
            singularity_tolerance: DEFAULT_SINGULARITY_TOLERANCE,
            symmetry_tolerance: DEFAULT_SYMMETRY_TOLERANCE,
        }
    }

    pub fn with_observation_matrix(mut self, h: Matrix2x4<f64>) -> TrackerConfig {
        self.measurement_model = PositionMeasurement::new(h);
        self
    }

    pub fn with_covariance_update(mut self, covariance_update: CovarianceUpdate) -> TrackerConfig {
        self.covariance_update = covariance_update;
        self
    }

    pub fn with_singularity_tolerance(mut self, tolerance: f64) -> TrackerConfig {
        self.singularity_tolerance = tolerance;
        self
    }

    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> TrackerConfig {
        self.symmetry_tolerance = tolerance;
        self
    }
}

/// Constant-velocity Kalman tracker over the state [x, dx, y, dy].
///
/// Owns the estimate and its covariance; `q`, `r` and the observation matrix
/// are fixed at construction. Not internally synchronized: one instance per
/// tracked object, callers serialize access if they share one.
#[derive(Debug, Clone)]
pub struct KalmanTracker2D {
    estimate: GaussianState<f64, 4>,
    q: Matrix4<f64>,
    r: Matrix2<f64>,
    motion_model: ConstantVelocity,
    measurement_model: PositionMeasurement,
    covariance_update: CovarianceUpdate,
    singularity_tolerance: f64,
    symmetry_tolerance: f64,
    phase: Phase,
    last_innovation: Option<Innovation>,
}

impl KalmanTracker2D {
    pub fn new(
        initial_state: Vector4<f64>,
        initial_covariance: Matrix4<f64>,
        process_noise: Matrix4<f64>,
        measurement_noise: Matrix2<f64>,
    ) -> Result<KalmanTracker2D, TrackerError> {
        KalmanTracker2D::from_config(TrackerConfig::new(
            initial_state,
            initial_covariance,
            process_noise,
            measurement_noise,
        ))
    }

    pub fn from_config(config: TrackerConfig) -> Result<KalmanTracker2D, TrackerError> {
        for (name, tolerance) in [
            ("singularity tolerance", config.singularity_tolerance),
            ("symmetry tolerance", config.symmetry_tolerance),
        ] {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(TrackerError::InvalidConfiguration(format!(
                    "{name} must be finite and non-negative, got {tolerance}"
                )));
            }
        }
        let tol = config.symmetry_tolerance;
        check_covariance("process noise", &config.process_noise, tol)?;
        check_covariance("measurement noise", &config.measurement_noise, tol)?;
        if config
            .measurement_model
            .observation_matrix()
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(TrackerError::InvalidConfiguration(
                "observation matrix contains non-finite entries".to_owned(),
            ));
        }
        validate_prior(&config.initial, tol)?;

        Ok(KalmanTracker2D {
            estimate: config.initial,
            q: config.process_noise,
            r: config.measurement_noise,
            motion_model: ConstantVelocity,
            measurement_model: config.measurement_model,
            covariance_update: config.covariance_update,
            singularity_tolerance: config.singularity_tolerance,
            symmetry_tolerance: tol,
            phase: Phase::Initial,
            last_innovation: None,
        })
    }

    /// Propagate the estimate `dt` forward with the constant-velocity model.
    pub fn predict(&mut self, dt: f64) -> Result<(), TrackerError> {
        self.predict_with_control(dt, &Vector2::zeros())
    }

    /// Like [`predict`](Self::predict), with `u` added to the velocities.
    pub fn predict_with_control(&mut self, dt: f64, u: &Vector2<f64>) -> Result<(), TrackerError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(TrackerError::InvalidInput(format!(
                "dt must be finite and positive, got {dt}"
            )));
        }
        if u.iter().any(|v| !v.is_finite()) {
            return Err(TrackerError::InvalidInput(format!(
                "control input must be finite, got {u:?}"
            )));
        }
        if self.phase == Phase::AwaitingUpdate {
            debug!("predict without an update since the previous predict");
        }

        let f = self.motion_model.transition(dt);
        let x_pred = self.motion_model.prediction(&self.estimate.x, u, dt);
        let p_pred = symmetrize(&(f * self.estimate.cov * f.transpose() + self.q));

        if !all_finite(&x_pred, &p_pred) {
            return Err(TrackerError::InvalidInput(format!(
                "prediction over dt = {dt} overflowed"
            )));
        }

        self.estimate = GaussianState::new(x_pred, p_pred);
        self.phase = Phase::AwaitingUpdate;
        trace!(
            "predicted ({:.3}, {:.3}) trace(P) = {:.4}",
            x_pred[0],
            x_pred[2],
            p_pred.trace()
        );
        Ok(())
    }

    /// Correct the estimate with a position measurement `z = [x, y]`.
    pub fn update(&mut self, z: &Vector2<f64>) -> Result<Innovation, TrackerError> {
        if z.iter().any(|v| !v.is_finite()) {
            return Err(TrackerError::InvalidInput(format!(
                "measurement must be finite, got {z:?}"
            )));
        }
        if self.phase == Phase::AwaitingPredict {
            debug!("update without a predict since the previous update");
        }

        let h = self.measurement_model.observation_matrix();
        let x = self.estimate.x;
        let p = self.estimate.cov;

        let y = z - self.measurement_model.prediction(&x);
        let s = symmetrize(&(h * p * h.transpose() + self.r));

        let reciprocal_condition = reciprocal_condition(&s);
        // negated so that NaN also lands here
        if !(reciprocal_condition >= self.singularity_tolerance) {
            warn!(
                "innovation covariance singular (rcond = {:e}), measurement rejected",
                reciprocal_condition
            );
            return Err(TrackerError::SingularInnovation {
                reciprocal_condition,
            });
        }
        let s_inv = s
            .try_inverse()
            .ok_or(TrackerError::SingularInnovation {
                reciprocal_condition,
            })?;

        let k = p * h.transpose() * s_inv;
        let x_est = x + k * y;
        let i_kh = Matrix4::<f64>::identity() - k * h;
        let p_est = match self.covariance_update {
            CovarianceUpdate::Standard => i_kh * p,
            CovarianceUpdate::Joseph => i_kh * p * i_kh.transpose() + k * self.r * k.transpose(),
        };
        let mut p_est = symmetrize(&p_est);
        clamp_negative_diagonal(&mut p_est);

        if !all_finite(&x_est, &p_est) {
            return Err(TrackerError::SingularInnovation {
                reciprocal_condition,
            });
        }

        let innovation = Innovation {
            residual: y,
            covariance: s,
            nis: (y.transpose() * s_inv * y).x,
            likelihood: MultiVariateNormal::new(&Vector2::zeros(), &s).map(|mvn| mvn.pdf(&y)),
        };

        self.estimate = GaussianState::new(x_est, p_est);
        self.phase = Phase::AwaitingPredict;
        self.last_innovation = Some(innovation);
        trace!(
            "updated ({:.3}, {:.3}) nis = {:.3} trace(P) = {:.4}",
            x_est[0],
            x_est[2],
            innovation.nis,
            p_est.trace()
        );
        Ok(innovation)
    }

    /// [`update`](Self::update) for callers holding an untyped measurement.
    pub fn update_from_slice(&mut self, z: &[f64]) -> Result<Innovation, TrackerError> {
        match z {
            [x, y] => self.update(&Vector2::new(*x, *y)),
            _ => Err(TrackerError::InvalidInput(format!(
                "measurement needs 2 values, got {}",
                z.len()
            ))),
        }
    }

    /// Predict by `dt`, then update with `z`, returning the posterior.
    ///
    /// A failed update leaves the prediction applied.
    pub fn step(
        &mut self,
        dt: f64,
        z: &Vector2<f64>,
    ) -> Result<GaussianState<f64, 4>, TrackerError> {
        self.predict(dt)?;
        self.update(z)?;
        Ok(self.estimate)
    }

    /// Replace the estimate with a new prior, as when a session restarts.
    pub fn reset(&mut self, prior: GaussianState<f64, 4>) -> Result<(), TrackerError> {
        validate_prior(&prior, self.symmetry_tolerance)?;
        self.estimate = prior;
        self.phase = Phase::Initial;
        self.last_innovation = None;
        debug!("tracker reset to ({:.3}, {:.3})", prior.x[0], prior.x[2]);
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::from(&self.estimate)
    }

    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), TrackerError> {
        self.reset(GaussianState::from(checkpoint))
    }

    /// [x, dx, y, dy]
    pub fn state(&self) -> &Vector4<f64> {
        &self.estimate.x
    }

    pub fn covariance(&self) -> &Matrix4<f64> {
        &self.estimate.cov
    }

    pub fn estimate(&self) -> GaussianState<f64, 4> {
        self.estimate
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.estimate.x[0], self.estimate.x[2])
    }

    pub fn velocity(&self) -> Vector2<f64> {
        Vector2::new(self.estimate.x[1], self.estimate.x[3])
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_innovation(&self) -> Option<&Innovation> {
        self.last_innovation.as_ref()
    }

    pub fn observation_matrix(&self) -> Matrix2x4<f64> {
        self.measurement_model.observation_matrix()
    }

    pub fn process_noise(&self) -> &Matrix4<f64> {
        &self.q
    }

    pub fn measurement_noise(&self) -> &Matrix2<f64> {
        &self.r
    }
}

impl BayesianFilter<f64, 4, 2, 2> for KalmanTracker2D {
    type Error = TrackerError;

    fn update_estimate(
        &mut self,
        u: Option<&Vector2<f64>>,
        z: &Vector2<f64>,
        dt: f64,
    ) -> Result<GaussianState<f64, 4>, TrackerError> {
        self.predict_with_control(dt, u.unwrap_or(&Vector2::zeros()))?;
        self.update(z)?;
        Ok(self.estimate)
    }

    fn gaussian_estimate(&self) -> GaussianState<f64, 4> {
        self.estimate
    }
}

fn validate_prior(prior: &GaussianState<f64, 4>, tolerance: f64) -> Result<(), TrackerError> {
    if prior.x.iter().any(|v| !v.is_finite()) {
        return Err(TrackerError::InvalidConfiguration(format!(
            "initial state must be finite, got {:?}",
            prior.x
        )));
    }
    check_covariance("initial covariance", &prior.cov, tolerance)
}

/// min / max eigenvalue of a symmetric 2x2, 0 when the largest is not positive
fn reciprocal_condition(s: &Matrix2<f64>) -> f64 {
    let eigenvalues = s.symmetric_eigenvalues();
    let max = eigenvalues.max();
    if !(max > 0.0) || !max.is_finite() {
        return 0.0;
    }
    eigenvalues.min() / max
}

fn all_finite(x: &Vector4<f64>, p: &Matrix4<f64>) -> bool {
    x.iter().chain(p.iter()).all(|v| v.is_finite())
}
