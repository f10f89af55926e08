//! Example usage of the fusion-ekf library
//!
//! Simulates one target driving a gentle curve, observed alternately by a
//! laser and a radar, and prints the fused estimate next to the truth.
//! Set `RUST_LOG=fusion_ekf=trace` to see every fused state.

use fusion_ekf::prelude::*;
use tracing_subscriber::EnvFilter;

/// Ground truth `[px, py, vx, vy]` at time `t` seconds.
fn truth(t: f64) -> [f64; 4] {
    let speed = 5.0;
    let yaw_rate = 0.1;
    let heading = yaw_rate * t;
    let radius = speed / yaw_rate;
    [
        radius * heading.sin() + 2.0,
        radius * (1.0 - heading.cos()) + 1.0,
        speed * heading.cos(),
        speed * heading.sin(),
    ]
}

/// Small deterministic disturbance so the readings are not perfect.
fn jitter(k: usize, scale: f64) -> f64 {
    scale * ((k as f64) * 12.9898).sin()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("fusion-ekf: Laser / Radar EKF");
    println!("=============================\n");

    let config = FusionConfig::<f64>::default();
    let mut ekf = FusionEkf::new(&config);

    let step_us: i64 = 50_000;
    let steps = 200;

    for k in 0..steps {
        let timestamp = k as i64 * step_us;
        let t = timestamp as f64 / 1e6;
        let [px, py, vx, vy] = truth(t);

        let package = if k % 2 == 0 {
            MeasurementPackage::laser(
                timestamp,
                px + jitter(k, 0.15),
                py + jitter(k + 1, 0.15),
            )
        } else {
            let rho = (px * px + py * py).sqrt();
            let phi = py.atan2(px);
            let rho_dot = (px * vx + py * vy) / rho;
            MeasurementPackage::radar(
                timestamp,
                rho + jitter(k, 0.3),
                phi + jitter(k + 1, 0.03),
                rho_dot + jitter(k + 2, 0.3),
            )
        };

        if let Err(e) = ekf.process_measurement(&package) {
            println!("t={:6.2}s  {} reading dropped: {}", t, package.kind(), e);
            continue;
        }

        if k % 20 == 0 {
            let x = ekf.state();
            println!(
                "t={:6.2}s  {:5}  est=({:7.2}, {:7.2}, {:5.2}, {:5.2})  truth=({:7.2}, {:7.2}, {:5.2}, {:5.2})",
                t,
                package.kind(),
                x.index(0),
                x.index(1),
                x.index(2),
                x.index(3),
                px,
                py,
                vx,
                vy
            );
        }
    }

    let p = ekf.covariance();
    println!(
        "\nFinal position std: ({:.3}, {:.3}) m, velocity std: ({:.3}, {:.3}) m/s",
        p.variance(0).sqrt(),
        p.variance(1).sqrt(),
        p.variance(2).sqrt(),
        p.variance(3).sqrt()
    );
}
