//! Laser / radar fusion
//!
//! [`FusionEkf`] wraps one [`KalmanFilter`] and drives it from a stream of
//! timestamped sensor readings:
//!
//! 1. The first reading initializes the state (no predict, no update).
//! 2. Every later reading refreshes `F` and `Q` for the elapsed time,
//!    predicts, and then corrects with the update path that matches the
//!    sensor: a plain Kalman update for laser, an EKF update for radar.
//!
//! # Example
//!
//! ```
//! use fusion_ekf::filters::fusion::FusionEkf;
//! use fusion_ekf::types::measurement::MeasurementPackage;
//!
//! let mut ekf = FusionEkf::<f64>::default();
//!
//! ekf.process_measurement(&MeasurementPackage::laser(0, 1.0, 1.0)).unwrap();
//! ekf.process_measurement(&MeasurementPackage::radar(50_000, 1.45, 0.79, 0.0)).unwrap();
//! ekf.process_measurement(&MeasurementPackage::laser(100_000, 1.1, 1.0)).unwrap();
//!
//! let x = ekf.state();
//! assert!((x.index(0) - 1.05).abs() < 0.2);
//! ```

use nalgebra::RealField;
use num_traits::Float;
use tracing::{debug, trace, warn};

use super::kalman::KalmanFilter;
use crate::config::FusionConfig;
use crate::models::{
    ConstantVelocity2D, LaserSensor, NonlinearObservationModel, ObservationModel, RadarSensor,
    TransitionModel,
};
use crate::types::measurement::{MeasurementPackage, SensorReading};
use crate::types::spaces::{MeasurementCovariance, StateCovariance, StateVector};
use crate::types::transforms::{ObservationMatrix, TransitionMatrix};
use crate::{FusionError, Result};

/// Microseconds per second; package timestamps are in microseconds.
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Fuses laser and radar readings into one position / velocity estimate.
///
/// State: `[px, py, vx, vy]`. One instance tracks one object.
#[derive(Debug, Clone)]
pub struct FusionEkf<T: RealField> {
    filter: KalmanFilter<T, 4>,
    motion: ConstantVelocity2D<T>,
    radar: RadarSensor<T>,
    laser_h: ObservationMatrix<T, 2, 4>,
    laser_r: MeasurementCovariance<T, 2>,
    radar_r: MeasurementCovariance<T, 3>,
    initial_covariance: StateCovariance<T, 4>,
    initialized: bool,
    previous_timestamp: i64,
}

impl<T: RealField + Float + Copy> Default for FusionEkf<T> {
    fn default() -> Self {
        Self::new(&FusionConfig::default())
    }
}

impl<T: RealField + Float + Copy> FusionEkf<T> {
    /// Creates an uninitialized filter.
    ///
    /// # Panics
    /// Panics if the configuration carries negative noise values or a
    /// non-positive range floor.
    pub fn new(config: &FusionConfig<T>) -> Self {
        let motion = config.transition_model();
        let laser: LaserSensor<T> = config.laser_sensor();
        let radar = config.radar_sensor();
        let initial_covariance = config.initial_covariance();

        Self {
            filter: KalmanFilter::new(
                StateVector::zeros(),
                initial_covariance,
                TransitionMatrix::identity(),
                StateCovariance::zeros(),
            ),
            laser_h: laser.observation_matrix(),
            laser_r: laser.measurement_noise(),
            radar_r: radar.measurement_noise(),
            motion,
            radar,
            initial_covariance,
            initialized: false,
            previous_timestamp: 0,
        }
    }

    /// Feeds one reading through the filter.
    ///
    /// Errors:
    /// - [`FusionError::NonFiniteMeasurement`] and
    ///   [`FusionError::OutOfOrderTimestamp`] reject the reading before
    ///   anything changes.
    /// - [`FusionError::DegenerateRange`], [`FusionError::SingularInnovation`]
    ///   and [`FusionError::NumericalInstability`] are raised after the
    ///   prediction: the predicted belief and the new timestamp are kept,
    ///   only the correction is skipped.
    ///
    /// A first radar reading at the origin (both position components within
    /// the range floor) cannot be linearized. The filter then starts from
    /// `(1, 1)` with the position variance raised to the velocity prior, so
    /// later radar readings can still correct it.
    pub fn process_measurement(&mut self, package: &MeasurementPackage<T>) -> Result<()> {
        if !package.reading.as_slice().iter().all(|v| Float::is_finite(*v)) {
            warn!(
                sensor = %package.kind(),
                timestamp = package.timestamp,
                "rejecting non-finite reading"
            );
            return Err(FusionError::NonFiniteMeasurement);
        }

        if !self.initialized {
            self.initialize(package);
            return Ok(());
        }

        let dt = self.elapsed_seconds(package.timestamp)?;
        self.previous_timestamp = package.timestamp;

        self.predict(dt);

        match self.update(&package.reading) {
            Ok(()) => {
                trace!(
                    sensor = %package.kind(),
                    timestamp = package.timestamp,
                    x = ?self.filter.mean().as_slice(),
                    p = ?self.filter.covariance().as_matrix().as_slice(),
                    "measurement fused"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    sensor = %package.kind(),
                    timestamp = package.timestamp,
                    error = %e,
                    "update skipped, keeping prediction"
                );
                Err(e)
            }
        }
    }

    /// Feeds a sequence of readings in order.
    ///
    /// Stops at the first error. Returns the number of readings processed.
    pub fn process_all<I>(&mut self, packages: I) -> Result<usize>
    where
        I: IntoIterator<Item = MeasurementPackage<T>>,
    {
        let mut count = 0;
        for package in packages {
            self.process_measurement(&package)?;
            count += 1;
        }
        Ok(count)
    }

    /// Drops the current estimate; the next reading initializes again.
    pub fn reset(&mut self) {
        self.filter.set_belief(StateVector::zeros(), self.initial_covariance);
        self.initialized = false;
        self.previous_timestamp = 0;
    }

    /// Current state estimate `[px, py, vx, vy]`.
    #[inline]
    pub fn state(&self) -> &StateVector<T, 4> {
        self.filter.mean()
    }

    /// Current state covariance.
    #[inline]
    pub fn covariance(&self) -> &StateCovariance<T, 4> {
        self.filter.covariance()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Timestamp of the last accepted reading, if any.
    #[inline]
    pub fn previous_timestamp(&self) -> Option<i64> {
        self.initialized.then_some(self.previous_timestamp)
    }

    /// Read-only access to the underlying Kalman filter.
    #[inline]
    pub fn filter(&self) -> &KalmanFilter<T, 4> {
        &self.filter
    }

    fn initialize(&mut self, package: &MeasurementPackage<T>) {
        let mut covariance = self.initial_covariance;
        let mean = match &package.reading {
            SensorReading::Laser(z) => {
                StateVector::from_array([*z.index(0), *z.index(1), T::zero(), T::zero()])
            }
            SensorReading::Radar(z) => {
                let mean = self.radar.to_cartesian(z);
                if self.at_radar_origin(&mean) {
                    covariance = self.origin_fallback_covariance();
                    self.origin_fallback_mean(&mean)
                } else {
                    mean
                }
            }
        };

        let zero = T::zero();
        self.filter.init(
            mean,
            covariance,
            self.motion.transition_matrix(zero),
            self.motion.process_noise(zero),
        );
        self.previous_timestamp = package.timestamp;
        self.initialized = true;

        debug!(
            sensor = %package.kind(),
            timestamp = package.timestamp,
            x = ?self.filter.mean().as_slice(),
            "filter initialized"
        );
    }

    /// Both position components lie within the radar range floor.
    fn at_radar_origin(&self, mean: &StateVector<T, 4>) -> bool {
        let floor = self.radar.min_range;
        Float::abs(*mean.index(0)) < floor && Float::abs(*mean.index(1)) < floor
    }

    /// Moves a radar-origin start to `(1, 1)`, where the radar Jacobian exists.
    fn origin_fallback_mean(&self, mean: &StateVector<T, 4>) -> StateVector<T, 4> {
        let one = T::one();
        warn!("radar initialization at the origin, starting from (1, 1)");
        StateVector::from_array([one, one, *mean.index(2), *mean.index(3)])
    }

    /// Position variance raised to the velocity prior to cover the guessed start.
    fn origin_fallback_covariance(&self) -> StateCovariance<T, 4> {
        let v = self.initial_covariance.variance(2);
        let mut p = *self.initial_covariance.as_matrix();
        p[(0, 0)] = Float::max(p[(0, 0)], v);
        p[(1, 1)] = Float::max(p[(1, 1)], v);
        StateCovariance::from_matrix(p)
    }

    /// Seconds since the previous reading.
    fn elapsed_seconds(&self, timestamp: i64) -> Result<T> {
        if timestamp < self.previous_timestamp {
            warn!(
                previous = self.previous_timestamp,
                current = timestamp,
                "rejecting out-of-order reading"
            );
            return Err(FusionError::OutOfOrderTimestamp {
                previous: self.previous_timestamp,
                current: timestamp,
            });
        }

        let micros = timestamp.saturating_sub(self.previous_timestamp) as f64;
        Ok(nalgebra::convert(micros / MICROS_PER_SECOND))
    }

    /// Refreshes F and Q for `dt` and propagates the belief.
    fn predict(&mut self, dt: T) {
        self.filter.set_process_model(
            self.motion.transition_matrix(dt),
            self.motion.process_noise(dt),
        );
        self.filter.predict();
    }

    fn update(&mut self, reading: &SensorReading<T>) -> Result<()> {
        match reading {
            SensorReading::Radar(z) => {
                let h = self.radar.jacobian_at(self.filter.mean())?;
                self.filter.update_ekf(z, &h, &self.radar_r, &self.radar)
            }
            SensorReading::Laser(z) => self.filter.update(z, &self.laser_h, &self.laser_r),
        }
    }
}
