//! Timestamped sensor readings
//!
//! A [`MeasurementPackage`] is what the ingestion side hands to the fusion
//! filter: a microsecond timestamp plus a reading tagged by sensor.

use core::fmt;

use nalgebra::RealField;

use super::spaces::Measurement;
use crate::{FusionError, Result};

/// The two sensor modalities the filter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Linear position sensor reporting `[px, py]`.
    Laser,
    /// Nonlinear sensor reporting `[rho, phi, rho_dot]`.
    Radar,
}

impl SensorKind {
    /// Number of raw values one reading of this sensor carries.
    #[inline]
    pub const fn dimension(self) -> usize {
        match self {
            SensorKind::Laser => 2,
            SensorKind::Radar => 3,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SensorKind::Laser => "laser",
            SensorKind::Radar => "radar",
        })
    }
}

/// A single sensor reading, tagged by the sensor that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorReading<T: RealField + Copy> {
    /// `[px, py]`
    Laser(Measurement<T, 2>),
    /// `[rho, phi, rho_dot]`
    Radar(Measurement<T, 3>),
}

impl<T: RealField + Copy> SensorReading<T> {
    #[inline]
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Laser(_) => SensorKind::Laser,
            SensorReading::Radar(_) => SensorKind::Radar,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match self {
            SensorReading::Laser(z) => z.as_slice(),
            SensorReading::Radar(z) => z.as_slice(),
        }
    }
}

/// A timestamped reading.
///
/// Timestamps are integer microseconds on the sensor clock. The fusion
/// filter expects them in non-decreasing order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementPackage<T: RealField + Copy> {
    /// Sensor clock time in microseconds
    pub timestamp: i64,
    /// The reading itself
    pub reading: SensorReading<T>,
}

impl<T: RealField + Copy> MeasurementPackage<T> {
    /// Creates a laser package from `[px, py]`.
    #[inline]
    pub fn laser(timestamp: i64, px: T, py: T) -> Self {
        Self {
            timestamp,
            reading: SensorReading::Laser(Measurement::from_array([px, py])),
        }
    }

    /// Creates a radar package from `[rho, phi, rho_dot]`.
    #[inline]
    pub fn radar(timestamp: i64, rho: T, phi: T, rho_dot: T) -> Self {
        Self {
            timestamp,
            reading: SensorReading::Radar(Measurement::from_array([rho, phi, rho_dot])),
        }
    }

    /// Builds a package from an untyped raw value slice.
    ///
    /// Fails with [`FusionError::DimensionMismatch`] if `raw` does not carry
    /// exactly as many values as `kind` reports.
    pub fn from_raw(kind: SensorKind, timestamp: i64, raw: &[T]) -> Result<Self> {
        let expected = kind.dimension();
        if raw.len() != expected {
            return Err(FusionError::DimensionMismatch {
                expected,
                actual: raw.len(),
            });
        }

        Ok(match kind {
            SensorKind::Laser => Self::laser(timestamp, raw[0], raw[1]),
            SensorKind::Radar => Self::radar(timestamp, raw[0], raw[1], raw[2]),
        })
    }

    #[inline]
    pub fn kind(&self) -> SensorKind {
        self.reading.kind()
    }
}
