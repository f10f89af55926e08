//! State estimation filters
//!
//! - [`kalman::KalmanFilter`]: Kalman core with linear and extended updates
//! - [`fusion::FusionEkf`]: Laser / radar fusion driver built on the core

pub mod fusion;
pub mod kalman;
