//! Observation (sensor) models
//!
//! Describes how sensor measurements relate to the tracked state.

use nalgebra::RealField;
use num_traits::Float;

use super::jacobian::{range_bearing_rate, range_bearing_rate_jacobian, DEFAULT_MIN_RANGE};
use crate::types::spaces::{Measurement, MeasurementCovariance, StateVector};
use crate::types::transforms::ObservationMatrix;
use crate::Result;

/// Trait for linear observation models.
///
/// Describes the measurement process:
/// z = H * x + v
///
/// where:
/// - H is the observation matrix
/// - v is zero-mean Gaussian measurement noise with covariance R
pub trait ObservationModel<T: RealField, const N: usize, const M: usize> {
    /// Returns the observation matrix.
    fn observation_matrix(&self) -> ObservationMatrix<T, M, N>;

    /// Returns the measurement noise covariance.
    fn measurement_noise(&self) -> MeasurementCovariance<T, M>;
}

/// Trait for nonlinear observation models.
///
/// z = h(x) + v
///
/// The EKF uses `observe` for the predicted measurement and `jacobian_at`
/// for the linearized covariance update.
pub trait NonlinearObservationModel<T: RealField, const N: usize, const M: usize> {
    /// Evaluates the measurement function h(x).
    fn observe(&self, state: &StateVector<T, N>) -> Measurement<T, M>;

    /// Jacobian of h at `state`, or an error where it is undefined.
    fn jacobian_at(&self, state: &StateVector<T, N>) -> Result<ObservationMatrix<T, M, N>>;

    /// Returns the measurement noise covariance.
    fn measurement_noise(&self) -> MeasurementCovariance<T, M>;

    /// Indices of measurement components that are angles.
    ///
    /// Residuals on these components are wrapped into (-pi, pi].
    fn angular_components(&self) -> &'static [usize] {
        &[]
    }
}

// ============================================================================
// Laser
// ============================================================================

/// Position-only sensor in 2D (laser / lidar).
///
/// Observes [px, py] from state [px, py, vx, vy].
#[derive(Debug, Clone)]
pub struct LaserSensor<T: RealField> {
    /// Variance of the x reading
    pub var_px: T,
    /// Variance of the y reading
    pub var_py: T,
}

impl<T: RealField + Float + Copy> LaserSensor<T> {
    /// Creates a laser sensor from per-axis measurement variances.
    ///
    /// # Panics
    /// Panics if either variance is negative.
    pub fn new(var_px: T, var_py: T) -> Self {
        assert!(var_px >= T::zero(), "Measurement noise var_px must be non-negative");
        assert!(var_py >= T::zero(), "Measurement noise var_py must be non-negative");
        Self { var_px, var_py }
    }
}

impl<T: RealField + Float + Copy> ObservationModel<T, 4, 2> for LaserSensor<T> {
    fn observation_matrix(&self) -> ObservationMatrix<T, 2, 4> {
        let one = T::one();
        let zero = T::zero();

        ObservationMatrix::from_matrix(nalgebra::matrix![
            one, zero, zero, zero;
            zero, one, zero, zero
        ])
    }

    fn measurement_noise(&self) -> MeasurementCovariance<T, 2> {
        let zero = T::zero();

        MeasurementCovariance::from_matrix(nalgebra::matrix![
            self.var_px, zero;
            zero, self.var_py
        ])
    }
}

// ============================================================================
// Radar
// ============================================================================

/// Range / bearing / range-rate sensor located at the origin (radar).
///
/// Observes `[rho, phi, rho_dot]`. Bearing is measured counter-clockwise
/// from the +x axis, in radians.
#[derive(Debug, Clone)]
pub struct RadarSensor<T: RealField> {
    /// Range variance
    pub var_rho: T,
    /// Bearing variance (rad^2)
    pub var_phi: T,
    /// Range-rate variance
    pub var_rho_dot: T,
    /// Ranges below this are treated as zero
    pub min_range: T,
}

impl<T: RealField + Float + Copy> RadarSensor<T> {
    /// Creates a radar sensor from per-component measurement variances.
    ///
    /// # Panics
    /// Panics if any variance is negative.
    pub fn new(var_rho: T, var_phi: T, var_rho_dot: T) -> Self {
        assert!(var_rho >= T::zero(), "Range noise var_rho must be non-negative");
        assert!(var_phi >= T::zero(), "Bearing noise var_phi must be non-negative");
        assert!(
            var_rho_dot >= T::zero(),
            "Range-rate noise var_rho_dot must be non-negative"
        );
        Self {
            var_rho,
            var_phi,
            var_rho_dot,
            min_range: nalgebra::convert(DEFAULT_MIN_RANGE),
        }
    }

    /// Overrides the range floor.
    ///
    /// # Panics
    /// Panics if `min_range` is not strictly positive.
    pub fn with_min_range(mut self, min_range: T) -> Self {
        assert!(min_range > T::zero(), "Range floor min_range must be positive");
        self.min_range = min_range;
        self
    }

    /// Converts a polar reading to a Cartesian state guess.
    ///
    /// Position is exact. Velocity assumes all motion is radial, since a
    /// range rate alone cannot recover the tangential component.
    pub fn to_cartesian(&self, z: &Measurement<T, 3>) -> StateVector<T, 4> {
        let rho = *z.index(0);
        let phi = *z.index(1);
        let rho_dot = *z.index(2);

        let (sin_phi, cos_phi) = Float::sin_cos(phi);

        StateVector::from_array([
            rho * cos_phi,
            rho * sin_phi,
            rho_dot * cos_phi,
            rho_dot * sin_phi,
        ])
    }
}

impl<T: RealField + Float + Copy> NonlinearObservationModel<T, 4, 3> for RadarSensor<T> {
    fn observe(&self, state: &StateVector<T, 4>) -> Measurement<T, 3> {
        range_bearing_rate(state, self.min_range)
    }

    fn jacobian_at(&self, state: &StateVector<T, 4>) -> Result<ObservationMatrix<T, 3, 4>> {
        range_bearing_rate_jacobian(state, self.min_range)
    }

    fn measurement_noise(&self) -> MeasurementCovariance<T, 3> {
        let zero = T::zero();

        MeasurementCovariance::from_matrix(nalgebra::matrix![
            self.var_rho, zero, zero;
            zero, self.var_phi, zero;
            zero, zero, self.var_rho_dot
        ])
    }

    fn angular_components(&self) -> &'static [usize] {
        &[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FusionError;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn test_laser_sensor() {
        let sensor = LaserSensor::new(0.0225_f64, 0.0225);
        let state = StateVector::from_array([10.0, 20.0, 1.0, 2.0]);

        let z = sensor.observation_matrix().observe(&state);
        assert!((z.index(0) - 10.0).abs() < 1e-10);
        assert!((z.index(1) - 20.0).abs() < 1e-10);

        let r = sensor.measurement_noise();
        assert!((r.variance(0) - 0.0225).abs() < 1e-15);
        assert!(r.as_matrix()[(0, 1)].abs() < 1e-15);
    }

    #[test]
    fn test_radar_sensor_observe() {
        let sensor = RadarSensor::new(0.09_f64, 0.0009, 0.09);
        let state = StateVector::from_array([0.0, 10.0, 0.0, -2.0]);

        let z = sensor.observe(&state);
        assert!((z.index(0) - 10.0).abs() < 1e-10);
        assert!((z.index(1) - FRAC_PI_2).abs() < 1e-10);
        assert!((z.index(2) + 2.0).abs() < 1e-10);
        assert_eq!(sensor.angular_components(), &[1]);
    }

    #[test]
    fn test_radar_noise() {
        let sensor = RadarSensor::new(0.09_f64, 0.0009, 0.09);
        let r = sensor.measurement_noise();
        assert!((r.variance(0) - 0.09).abs() < 1e-15);
        assert!((r.variance(1) - 0.0009).abs() < 1e-15);
        assert!((r.variance(2) - 0.09).abs() < 1e-15);
    }

    #[test]
    fn test_radar_min_range_floor() {
        let sensor = RadarSensor::new(0.09_f64, 0.0009, 0.09).with_min_range(1.0);
        let state = StateVector::from_array([0.5, 0.0, 1.0, 0.0]);
        assert_eq!(sensor.jacobian_at(&state), Err(FusionError::DegenerateRange));

        let far = StateVector::from_array([2.0, 0.0, 1.0, 0.0]);
        assert!(sensor.jacobian_at(&far).is_ok());
    }

    #[test]
    fn test_radar_to_cartesian() {
        let sensor = RadarSensor::new(0.09_f64, 0.0009, 0.09);
        let x = sensor.to_cartesian(&Measurement::from_array([5.0, FRAC_PI_2, 2.0]));

        assert!(x.index(0).abs() < 1e-10);
        assert!((x.index(1) - 5.0).abs() < 1e-10);
        assert!(x.index(2).abs() < 1e-10);
        assert!((x.index(3) - 2.0).abs() < 1e-10);
    }
}
