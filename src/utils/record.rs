use std::io;

use serde::{Deserialize, Serialize};

use crate::utils::Vector;

/// One row of the per-step table consumed by plotting harnesses.
///
/// Each of the four state components `[x, dx, y, dy]` appears three times:
/// measured (`x_`), estimated (`x`) and ground truth (`x_real`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(rename = "x_")]
    pub x_measured: f64,
    #[serde(rename = "dx_")]
    pub dx_measured: f64,
    #[serde(rename = "y_")]
    pub y_measured: f64,
    #[serde(rename = "dy_")]
    pub dy_measured: f64,
    #[serde(rename = "x")]
    pub x_estimated: f64,
    #[serde(rename = "dx")]
    pub dx_estimated: f64,
    #[serde(rename = "y")]
    pub y_estimated: f64,
    #[serde(rename = "dy")]
    pub dy_estimated: f64,
    pub x_real: f64,
    pub dx_real: f64,
    pub y_real: f64,
    pub dy_real: f64,
}

impl StepRecord {
    pub fn new(measured: &Vector<4>, estimated: &Vector<4>, real: &Vector<4>) -> StepRecord {
        StepRecord {
            x_measured: measured[0],
            dx_measured: measured[1],
            y_measured: measured[2],
            dy_measured: measured[3],
            x_estimated: estimated[0],
            dx_estimated: estimated[1],
            y_estimated: estimated[2],
            dy_estimated: estimated[3],
            x_real: real[0],
            dx_real: real[1],
            y_real: real[2],
            dy_real: real[3],
        }
    }
}

/// Write `records` as CSV with a header row.
pub fn write_records<W: io::Write>(writer: W, records: &[StepRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
