use nalgebra::{Matrix2x4, RealField, SMatrix, SVector};
use serde::{Deserialize, Serialize};

pub trait LinearMeasurementModel<T: RealField, const S: usize, const Z: usize> {
    fn observation_matrix(&self) -> SMatrix<T, Z, S>;

    fn prediction(&self, x: &SVector<T, S>) -> SVector<T, Z> {
        self.observation_matrix() * x
    }
}

/// Measurement = [x, y]
///
/// Reads the two positions out of `[x, dx, y, dy]`. The matrix can be replaced
/// for sensors that observe a different linear combination of the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionMeasurement {
    h: Matrix2x4<f64>,
}

impl PositionMeasurement {
    pub fn new(h: Matrix2x4<f64>) -> PositionMeasurement {
        PositionMeasurement { h }
    }
}

impl Default for PositionMeasurement {
    fn default() -> PositionMeasurement {
        #[allow(clippy::deprecated_cfg_attr)]
        #[cfg_attr(rustfmt, rustfmt_skip)]
        let h = Matrix2x4::<f64>::new(
            1., 0., 0., 0.,
            0., 0., 1., 0.
        );
        PositionMeasurement { h }
    }
}

impl LinearMeasurementModel<f64, 4, 2> for PositionMeasurement {
    fn observation_matrix(&self) -> Matrix2x4<f64> {
        self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector4};

    #[test]
    fn default_reads_positions() {
        let model = PositionMeasurement::default();
        let z = model.prediction(&Vector4::new(1.0, 10.0, 2.0, 20.0));
        assert_eq!(z, Vector2::new(1.0, 2.0));
    }
}
