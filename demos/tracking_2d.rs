// Tracks a target accelerating along a straight line in 2D and prints one CSV
// row per step (measured, estimated and true [x, dx, y, dy]) for plotting.
//
// cargo run --example tracking_2d > tracking_2d.csv
// TRACKER_LOG=trace cargo run --example tracking_2d

use std::error::Error;

use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};
use rand_distr::{Distribution, Normal};
use tracing::{info, warn};

extern crate kalman_tracker;
use kalman_tracker::utils::record::{write_records, StepRecord};
use kalman_tracker::{KalmanTracker2D, TrackerError};

const N_STEPS: usize = 100;
const DT: f64 = 0.1;

const V_X: f64 = 1.0;
const V_Y: f64 = 1.0;
const X_NOISE: f64 = 1.0;
const Y_NOISE: f64 = 1.0;
const V_X_NOISE: f64 = 1.0;
const V_Y_NOISE: f64 = 1.0;
const A_X: f64 = 1.0;
const A_Y: f64 = 1.0;
const Q_VAR: f64 = 1.0;

fn main() -> Result<(), Box<dyn Error>> {
    let log_level = std::env::var("TRACKER_LOG")
        .ok()
        .and_then(|level| level.parse::<tracing_subscriber::filter::LevelFilter>().ok())
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut rng = rand::thread_rng();
    let x_noise = Normal::new(0., X_NOISE)?;
    let y_noise = Normal::new(0., Y_NOISE)?;
    let v_x_noise = Normal::new(0., V_X_NOISE)?;
    let v_y_noise = Normal::new(0., V_Y_NOISE)?;

    let mut kf = KalmanTracker2D::new(
        Vector4::new(0., V_X, 0., V_Y),
        Matrix4::identity(),
        Matrix4::identity() * Q_VAR,
        Matrix2::from_diagonal(&Vector2::new(X_NOISE, Y_NOISE)),
    )?;

    let mut x_true = Vector4::new(0., V_X, 0., V_Y);
    let mut u = Vector2::zeros();
    let mut records = Vec::with_capacity(N_STEPS);

    for step in 0..N_STEPS {
        kf.predict_with_control(DT, &u)?;
        let predicted = *kf.state();

        // truth: position integrates the old velocity, velocity picks up the acceleration
        x_true = Vector4::new(
            x_true[0] + DT * x_true[1],
            x_true[1] + DT * A_X,
            x_true[2] + DT * x_true[3],
            x_true[3] + DT * A_Y,
        );
        let z = Vector2::new(
            x_true[0] + x_noise.sample(&mut rng),
            x_true[2] + y_noise.sample(&mut rng),
        );

        match kf.update(&z) {
            Ok(_) => {}
            Err(err @ TrackerError::SingularInnovation { .. }) => {
                warn!("step {step}: measurement dropped: {err}");
            }
            Err(err) => return Err(err.into()),
        }

        // noisy velocity increment, applied on the next predict
        u = Vector2::new(
            DT * A_X + v_x_noise.sample(&mut rng),
            DT * A_Y + v_y_noise.sample(&mut rng),
        );

        // the sensor only sees positions, the predicted velocities fill the gap
        let measured = Vector4::new(z.x, predicted[1], z.y, predicted[3]);
        records.push(StepRecord::new(&measured, kf.state(), &x_true));
    }

    let final_error = (kf.position() - Vector2::new(x_true[0], x_true[2])).norm();
    info!("tracked {N_STEPS} steps, final position error {final_error:.3}");

    write_records(std::io::stdout().lock(), &records)?;
    Ok(())
}
