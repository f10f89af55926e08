//! Transition (motion) models for target dynamics
//!
//! Describes how the tracked object evolves between two measurements.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::StateCovariance;
use crate::types::transforms::TransitionMatrix;

/// Trait for linear transition (motion) models.
///
/// Describes target dynamics in the form:
/// x_{k+1} = F * x_k + w
///
/// where:
/// - F is the state transition matrix
/// - w is zero-mean Gaussian process noise with covariance Q
pub trait TransitionModel<T: RealField, const N: usize> {
    /// Returns the state transition matrix for time step dt.
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, N>;

    /// Returns the process noise covariance for time step dt.
    fn process_noise(&self, dt: T) -> StateCovariance<T, N>;
}

/// Constant velocity model in 2D with independent acceleration noise per axis.
///
/// State: [px, py, vx, vy]
#[derive(Debug, Clone)]
pub struct ConstantVelocity2D<T: RealField> {
    /// Acceleration noise intensity along x (variance, m^2/s^4)
    pub noise_ax: T,
    /// Acceleration noise intensity along y (variance, m^2/s^4)
    pub noise_ay: T,
}

impl<T: RealField + Float + Copy> ConstantVelocity2D<T> {
    /// Creates a new constant velocity model.
    ///
    /// # Panics
    /// Panics if either noise intensity is negative.
    pub fn new(noise_ax: T, noise_ay: T) -> Self {
        assert!(noise_ax >= T::zero(), "Process noise noise_ax must be non-negative");
        assert!(noise_ay >= T::zero(), "Process noise noise_ay must be non-negative");
        Self { noise_ax, noise_ay }
    }
}

impl<T: RealField + Float + Copy> TransitionModel<T, 4> for ConstantVelocity2D<T> {
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, 4> {
        let mut f = TransitionMatrix::identity();
        f.set_entry(0, 2, dt);
        f.set_entry(1, 3, dt);
        f
    }

    fn process_noise(&self, dt: T) -> StateCovariance<T, 4> {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let two: T = nalgebra::convert(2.0);
        let four: T = nalgebra::convert(4.0);

        // Discrete white noise acceleration model
        let q11 = dt4 / four * self.noise_ax;
        let q22 = dt4 / four * self.noise_ay;
        let q13 = dt3 / two * self.noise_ax;
        let q24 = dt3 / two * self.noise_ay;
        let q33 = dt2 * self.noise_ax;
        let q44 = dt2 * self.noise_ay;

        let zero = T::zero();

        StateCovariance::from_matrix(nalgebra::matrix![
            q11, zero, q13, zero;
            zero, q22, zero, q24;
            q13, zero, q33, zero;
            zero, q24, zero, q44
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_matrix_entries() {
        let model = ConstantVelocity2D::new(9.0_f64, 9.0);
        let f = model.transition_matrix(0.1);

        assert!((f.entry(0, 2) - 0.1).abs() < 1e-15);
        assert!((f.entry(1, 3) - 0.1).abs() < 1e-15);
        assert!((f.entry(0, 0) - 1.0).abs() < 1e-15);
        assert!(f.entry(2, 0).abs() < 1e-15);
    }

    #[test]
    fn test_process_noise() {
        let model = ConstantVelocity2D::new(9.0_f64, 4.0);
        let q = model.process_noise(2.0);
        let m = q.as_matrix();

        assert!((m[(0, 0)] - 16.0 / 4.0 * 9.0).abs() < 1e-12);
        assert!((m[(1, 1)] - 16.0 / 4.0 * 4.0).abs() < 1e-12);
        assert!((m[(0, 2)] - 8.0 / 2.0 * 9.0).abs() < 1e-12);
        assert!((m[(3, 1)] - 8.0 / 2.0 * 4.0).abs() < 1e-12);
        assert!((m[(2, 2)] - 4.0 * 9.0).abs() < 1e-12);
        assert!((m[(3, 3)] - 4.0 * 4.0).abs() < 1e-12);
        assert!(m[(0, 1)].abs() < 1e-12);
        assert!(q.max_asymmetry() < 1e-15);
    }

    #[test]
    fn test_zero_dt_is_identity_with_no_noise() {
        let model = ConstantVelocity2D::new(9.0_f64, 9.0);
        let f = model.transition_matrix(0.0);
        let q = model.process_noise(0.0);

        assert_eq!(f, TransitionMatrix::identity());
        assert!(q.trace().abs() < 1e-15);
    }

    #[test]
    #[should_panic(expected = "noise_ay must be non-negative")]
    fn test_negative_noise_panics() {
        let _ = ConstantVelocity2D::new(9.0_f64, -1.0);
    }
}
