//! fusion-ekf: Laser / Radar Sensor Fusion for Rust
//!
//! Estimates the position and velocity of a single moving object from two
//! asynchronous sensors with an Extended Kalman Filter:
//!
//! - a laser reporting Cartesian position `[px, py]` (linear model)
//! - a radar reporting `[rho, phi, rho_dot]` (nonlinear model, linearized
//!   with its Jacobian)
//!
//! # Features
//!
//! - **Type Safety**: State, measurement and innovation vectors live in
//!   distinct types; dimension mismatches are caught at compile time
//! - **Explicit Failure**: Degenerate geometry and singular innovation
//!   covariances surface as [`FusionError`] instead of NaN
//! - **no_std Support**: Disable `std` (and enable `libm`) for embedded use
//!
//! # Example
//!
//! ```
//! use fusion_ekf::prelude::*;
//!
//! let mut ekf = FusionEkf::<f64>::new(&FusionConfig::default());
//!
//! ekf.process_measurement(&MeasurementPackage::laser(0, 0.6, 0.6)).unwrap();
//! ekf.process_measurement(&MeasurementPackage::radar(50_000, 0.9, 0.79, 1.2)).unwrap();
//!
//! let x = ekf.state();
//! println!("px={} py={} vx={} vy={}", x.index(0), x.index(1), x.index(2), x.index(3));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod filters;
pub mod models;
pub mod types;

pub mod prelude {
    pub use crate::config::FusionConfig;
    pub use crate::filters::fusion::FusionEkf;
    pub use crate::filters::kalman::KalmanFilter;
    pub use crate::models::*;
    pub use crate::types::measurement::*;
    pub use crate::types::spaces::*;
    pub use crate::types::transforms::*;
    pub use crate::{FusionError, Result};
}

/// Error types for the library
#[derive(Debug, Clone, PartialEq)]
pub enum FusionError {
    /// A raw reading carried the wrong number of values for its sensor
    DimensionMismatch { expected: usize, actual: usize },
    /// A reading contained NaN or infinity
    NonFiniteMeasurement,
    /// Target too close to the radar origin for the Jacobian to exist
    DegenerateRange,
    /// Innovation covariance is singular and cannot be inverted
    SingularInnovation,
    /// The corrected state or covariance was not finite
    NumericalInstability,
    /// A reading is older than the previous one
    OutOfOrderTimestamp { previous: i64, current: i64 },
}

#[cfg(feature = "std")]
impl std::error::Error for FusionError {}

impl ::core::fmt::Display for FusionError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            FusionError::DimensionMismatch { expected, actual } => {
                write!(f, "Expected {} measurement values, got {}", expected, actual)
            }
            FusionError::NonFiniteMeasurement => write!(f, "Measurement is not finite"),
            FusionError::DegenerateRange => write!(f, "Range too close to zero"),
            FusionError::SingularInnovation => write!(f, "Innovation covariance is singular"),
            FusionError::NumericalInstability => write!(f, "Numerical instability detected"),
            FusionError::OutOfOrderTimestamp { previous, current } => write!(
                f,
                "Timestamp {} is older than previous timestamp {}",
                current, previous
            ),
        }
    }
}

pub type Result<T> = ::core::result::Result<T, FusionError>;
