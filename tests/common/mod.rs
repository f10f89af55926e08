//! Common helpers for fusion integration tests

#![allow(dead_code)]

use fusion_ekf::types::measurement::MeasurementPackage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Laser position noise standard deviation (matches the default variance 0.0225)
pub const LASER_STD: f64 = 0.15;
/// Radar range noise standard deviation (matches the default variance 0.09)
pub const RADAR_RANGE_STD: f64 = 0.3;
/// Radar bearing noise standard deviation (matches the default variance 0.0009)
pub const RADAR_BEARING_STD: f64 = 0.03;
/// Radar range-rate noise standard deviation
pub const RADAR_RATE_STD: f64 = 0.3;

/// A ground truth sample `[px, py, vx, vy]` with its timestamp in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct TruthSample {
    pub timestamp: i64,
    pub state: [f64; 4],
}

/// Constant velocity ground truth sampled every `step_us` microseconds.
pub fn constant_velocity_truth(start: [f64; 4], step_us: i64, steps: usize) -> Vec<TruthSample> {
    (0..steps)
        .map(|k| {
            let timestamp = k as i64 * step_us;
            let t = timestamp as f64 / 1e6;
            TruthSample {
                timestamp,
                state: [
                    start[0] + start[2] * t,
                    start[1] + start[3] * t,
                    start[2],
                    start[3],
                ],
            }
        })
        .collect()
}

/// Noise-free radar reading of a truth state.
pub fn radar_reading(state: &[f64; 4]) -> [f64; 3] {
    let [px, py, vx, vy] = *state;
    let rho = (px * px + py * py).sqrt();
    [rho, py.atan2(px), (px * vx + py * vy) / rho]
}

/// Alternating laser / radar packages with Gaussian noise, starting with laser.
pub fn noisy_alternating_packages(
    truth: &[TruthSample],
    seed: u64,
) -> Vec<MeasurementPackage<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let laser = Normal::new(0.0, LASER_STD).unwrap();
    let range = Normal::new(0.0, RADAR_RANGE_STD).unwrap();
    let bearing = Normal::new(0.0, RADAR_BEARING_STD).unwrap();
    let rate = Normal::new(0.0, RADAR_RATE_STD).unwrap();

    truth
        .iter()
        .enumerate()
        .map(|(k, sample)| {
            if k % 2 == 0 {
                MeasurementPackage::laser(
                    sample.timestamp,
                    sample.state[0] + laser.sample(&mut rng),
                    sample.state[1] + laser.sample(&mut rng),
                )
            } else {
                let [rho, phi, rho_dot] = radar_reading(&sample.state);
                MeasurementPackage::radar(
                    sample.timestamp,
                    rho + range.sample(&mut rng),
                    phi + bearing.sample(&mut rng),
                    rho_dot + rate.sample(&mut rng),
                )
            }
        })
        .collect()
}

/// Euclidean distance between two 2D points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
