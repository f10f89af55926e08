//! Tuning constants for the fusion filter

use nalgebra::RealField;
use num_traits::Float;

use crate::models::{ConstantVelocity2D, LaserSensor, RadarSensor, DEFAULT_MIN_RANGE};
use crate::types::spaces::StateCovariance;

/// Noise and prior settings for [`FusionEkf`](crate::filters::fusion::FusionEkf).
///
/// The defaults are tuned for a vehicle-scale target observed by a lidar
/// and an automotive radar, with positions in metres and time in seconds.
///
/// ```
/// use fusion_ekf::config::FusionConfig;
///
/// let config = FusionConfig::<f64>::default()
///     .with_process_noise(4.0, 4.0)
///     .with_laser_noise(0.01, 0.01);
/// assert_eq!(config.noise_ax, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionConfig<T> {
    /// Acceleration noise intensity along x
    pub noise_ax: T,
    /// Acceleration noise intensity along y
    pub noise_ay: T,
    /// Laser variance for `[px, py]`
    pub laser_variance: [T; 2],
    /// Radar variance for `[rho, phi, rho_dot]`
    pub radar_variance: [T; 3],
    /// Prior variance of the position components at initialization
    pub initial_position_variance: T,
    /// Prior variance of the velocity components at initialization
    pub initial_velocity_variance: T,
    /// Ranges below this make the radar Jacobian undefined
    pub min_range: T,
}

impl<T: RealField + Copy> Default for FusionConfig<T> {
    fn default() -> Self {
        Self {
            noise_ax: nalgebra::convert(9.0),
            noise_ay: nalgebra::convert(9.0),
            laser_variance: [nalgebra::convert(0.0225), nalgebra::convert(0.0225)],
            radar_variance: [
                nalgebra::convert(0.09),
                nalgebra::convert(0.0009),
                nalgebra::convert(0.09),
            ],
            initial_position_variance: T::one(),
            initial_velocity_variance: nalgebra::convert(1000.0),
            min_range: nalgebra::convert(DEFAULT_MIN_RANGE),
        }
    }
}

impl<T: RealField + Float + Copy> FusionConfig<T> {
    pub fn with_process_noise(mut self, noise_ax: T, noise_ay: T) -> Self {
        self.noise_ax = noise_ax;
        self.noise_ay = noise_ay;
        self
    }

    pub fn with_laser_noise(mut self, var_px: T, var_py: T) -> Self {
        self.laser_variance = [var_px, var_py];
        self
    }

    pub fn with_radar_noise(mut self, var_rho: T, var_phi: T, var_rho_dot: T) -> Self {
        self.radar_variance = [var_rho, var_phi, var_rho_dot];
        self
    }

    /// Sets the prior variances used when the first measurement arrives.
    pub fn with_initial_variance(mut self, position: T, velocity: T) -> Self {
        self.initial_position_variance = position;
        self.initial_velocity_variance = velocity;
        self
    }

    pub fn with_min_range(mut self, min_range: T) -> Self {
        self.min_range = min_range;
        self
    }

    /// Builds the constant velocity process model.
    ///
    /// # Panics
    /// Panics if a noise intensity is negative.
    pub fn transition_model(&self) -> ConstantVelocity2D<T> {
        ConstantVelocity2D::new(self.noise_ax, self.noise_ay)
    }

    /// Builds the laser measurement model.
    ///
    /// # Panics
    /// Panics if a variance is negative.
    pub fn laser_sensor(&self) -> LaserSensor<T> {
        LaserSensor::new(self.laser_variance[0], self.laser_variance[1])
    }

    /// Builds the radar measurement model.
    ///
    /// # Panics
    /// Panics if a variance is negative or `min_range` is not positive.
    pub fn radar_sensor(&self) -> RadarSensor<T> {
        RadarSensor::new(
            self.radar_variance[0],
            self.radar_variance[1],
            self.radar_variance[2],
        )
        .with_min_range(self.min_range)
    }

    /// Prior covariance assigned on the first measurement.
    pub fn initial_covariance(&self) -> StateCovariance<T, 4> {
        let p = self.initial_position_variance;
        let v = self.initial_velocity_variance;
        StateCovariance::from_diagonal(&nalgebra::vector![p, p, v, v])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = FusionConfig::<f64>::default();
        assert_eq!(config.noise_ax, 9.0);
        assert_eq!(config.noise_ay, 9.0);
        assert_eq!(config.laser_variance, [0.0225, 0.0225]);
        assert_eq!(config.radar_variance, [0.09, 0.0009, 0.09]);
        assert_eq!(config.min_range, 1e-4);
    }

    #[test]
    fn test_initial_covariance() {
        let p = FusionConfig::<f64>::default().initial_covariance();
        assert_eq!(p.variance(0), 1.0);
        assert_eq!(p.variance(1), 1.0);
        assert_eq!(p.variance(2), 1000.0);
        assert_eq!(p.variance(3), 1000.0);
        assert_eq!(p.as_matrix()[(0, 2)], 0.0);
    }

    #[test]
    fn test_builders_flow_into_models() {
        let config = FusionConfig::<f64>::default()
            .with_radar_noise(1.0, 0.01, 0.5)
            .with_min_range(0.5);
        let radar = config.radar_sensor();
        assert_eq!(radar.var_rho, 1.0);
        assert_eq!(radar.var_phi, 0.01);
        assert_eq!(radar.min_range, 0.5);
    }
}
