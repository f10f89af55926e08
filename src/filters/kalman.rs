//! Kalman filter core
//!
//! Holds the belief (mean `x`, covariance `P`) together with the current
//! process model (`F`, `Q`) and mutates them in place. Two update paths
//! share one correction step:
//!
//! - [`KalmanFilter::update`] for linear sensors, with innovation `z - H*x`
//! - [`KalmanFilter::update_ekf`] for nonlinear sensors, with innovation
//!   `z - h(x)`; `H` is then only the linearization used for the gain and
//!   the covariance.
//!
//! The measurement model (`H`, `R`) is passed per update. Laser and radar
//! readings have different dimensions, and const generics pin those at
//! compile time, so a single stored `H` could only ever serve one of them.
//!
//! # Example
//!
//! ```
//! use fusion_ekf::filters::kalman::KalmanFilter;
//! use fusion_ekf::models::{ConstantVelocity2D, LaserSensor, ObservationModel, TransitionModel};
//! use fusion_ekf::types::spaces::{Measurement, StateCovariance, StateVector};
//!
//! let motion = ConstantVelocity2D::new(9.0, 9.0);
//! let laser = LaserSensor::new(0.0225, 0.0225);
//!
//! let mut kf = KalmanFilter::new(
//!     StateVector::from_array([0.0_f64, 0.0, 1.0, 0.0]),
//!     StateCovariance::from_diagonal(&nalgebra::vector![1.0, 1.0, 1000.0, 1000.0]),
//!     motion.transition_matrix(0.1),
//!     motion.process_noise(0.1),
//! );
//!
//! kf.predict();
//! kf.update(
//!     &Measurement::from_array([0.1, 0.0]),
//!     &laser.observation_matrix(),
//!     &laser.measurement_noise(),
//! )
//! .unwrap();
//! assert!((kf.mean().index(0) - 0.1).abs() < 0.05);
//! ```

use nalgebra::RealField;
use num_traits::Float;

use crate::models::NonlinearObservationModel;
use crate::types::spaces::{
    ComputeInnovation, Innovation, Measurement, MeasurementCovariance, StateCovariance,
    StateVector,
};
use crate::types::transforms::{
    compute_innovation_covariance, compute_kalman_gain, covariance_update, ObservationMatrix,
    TransitionMatrix,
};
use crate::{FusionError, Result};

/// A discrete-time Kalman filter that owns and mutates its belief.
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `N`: State dimension
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanFilter<T: RealField, const N: usize> {
    mean: StateVector<T, N>,
    covariance: StateCovariance<T, N>,
    transition: TransitionMatrix<T, N>,
    process_noise: StateCovariance<T, N>,
}

impl<T: RealField + Float + Copy, const N: usize> KalmanFilter<T, N> {
    /// Creates a filter from an initial belief and process model.
    #[inline]
    pub fn new(
        mean: StateVector<T, N>,
        covariance: StateCovariance<T, N>,
        transition: TransitionMatrix<T, N>,
        process_noise: StateCovariance<T, N>,
    ) -> Self {
        Self {
            mean,
            covariance,
            transition,
            process_noise,
        }
    }

    /// Replaces the belief and the process model.
    pub fn init(
        &mut self,
        mean: StateVector<T, N>,
        covariance: StateCovariance<T, N>,
        transition: TransitionMatrix<T, N>,
        process_noise: StateCovariance<T, N>,
    ) {
        self.mean = mean;
        self.covariance = covariance;
        self.transition = transition;
        self.process_noise = process_noise;
    }

    /// Replaces the belief, keeping the process model.
    #[inline]
    pub fn set_belief(&mut self, mean: StateVector<T, N>, covariance: StateCovariance<T, N>) {
        self.mean = mean;
        self.covariance = covariance;
    }

    /// Replaces F and Q, typically once per cycle for the new dt.
    #[inline]
    pub fn set_process_model(
        &mut self,
        transition: TransitionMatrix<T, N>,
        process_noise: StateCovariance<T, N>,
    ) {
        self.transition = transition;
        self.process_noise = process_noise;
    }

    #[inline]
    pub fn mean(&self) -> &StateVector<T, N> {
        &self.mean
    }

    #[inline]
    pub fn covariance(&self) -> &StateCovariance<T, N> {
        &self.covariance
    }

    #[inline]
    pub fn transition(&self) -> &TransitionMatrix<T, N> {
        &self.transition
    }

    #[inline]
    pub fn process_noise(&self) -> &StateCovariance<T, N> {
        &self.process_noise
    }

    /// Trace of the covariance (sum of variances).
    #[inline]
    pub fn uncertainty(&self) -> T {
        self.covariance.trace()
    }

    /// Propagates the belief through the process model.
    ///
    /// - x = F * x
    /// - P = F * P * F^T + Q
    pub fn predict(&mut self) {
        self.mean = self.transition.apply_state(&self.mean);
        self.covariance = self
            .transition
            .propagate_covariance(&self.covariance)
            .add(&self.process_noise);
    }

    /// Linear measurement update.
    ///
    /// Innovation y = z - H * x, then the shared correction.
    ///
    /// On error the belief is left untouched.
    pub fn update<const M: usize>(
        &mut self,
        measurement: &Measurement<T, M>,
        obs_matrix: &ObservationMatrix<T, M, N>,
        meas_noise: &MeasurementCovariance<T, M>,
    ) -> Result<()> {
        let predicted_meas = obs_matrix.observe(&self.mean);
        let innovation = measurement.innovation(predicted_meas);

        self.correct(&innovation, obs_matrix, meas_noise)
    }

    /// Extended (nonlinear) measurement update.
    ///
    /// The predicted measurement comes from `model.observe(x)`; `jacobian`
    /// is only used for the gain and the covariance. Angular innovation
    /// components reported by the model are wrapped into (-pi, pi].
    ///
    /// On error the belief is left untouched.
    pub fn update_ekf<const M: usize, Obs>(
        &mut self,
        measurement: &Measurement<T, M>,
        jacobian: &ObservationMatrix<T, M, N>,
        meas_noise: &MeasurementCovariance<T, M>,
        model: &Obs,
    ) -> Result<()>
    where
        Obs: NonlinearObservationModel<T, N, M>,
    {
        let predicted_meas = model.observe(&self.mean);
        let innovation = model
            .angular_components()
            .iter()
            .fold(measurement.innovation(predicted_meas), |y, &i| {
                y.wrap_angle(i)
            });

        self.correct(&innovation, jacobian, meas_noise)
    }

    /// Shared correction step.
    ///
    /// - S = H * P * H^T + R
    /// - K = P * H^T * S^{-1}
    /// - x = x + K * y
    /// - P = (I - K * H) * P
    ///
    /// The corrected covariance is re-symmetrized to absorb round-off.
    fn correct<const M: usize>(
        &mut self,
        innovation: &Innovation<T, M>,
        obs_matrix: &ObservationMatrix<T, M, N>,
        meas_noise: &MeasurementCovariance<T, M>,
    ) -> Result<()> {
        let innovation_cov =
            compute_innovation_covariance(&self.covariance, obs_matrix, meas_noise);
        let kalman_gain = compute_kalman_gain(&self.covariance, obs_matrix, &innovation_cov)?;

        let updated_mean = self.mean + kalman_gain.correct(innovation);
        let updated_cov =
            covariance_update(&self.covariance, &kalman_gain, obs_matrix).symmetrize();

        if !updated_mean.is_finite() || !updated_cov.is_finite() {
            return Err(FusionError::NumericalInstability);
        }

        self.mean = updated_mean;
        self.covariance = updated_cov;
        Ok(())
    }
}
