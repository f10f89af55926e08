//! Vector space markers and typed vectors
//!
//! State vectors, sensor measurements and innovations all live in small
//! fixed-size nalgebra vectors. The `Space` marker keeps them apart so a
//! radar measurement can never be added to a state by accident.

use ::core::marker::PhantomData;
use ::core::ops::Add;
use nalgebra::{RealField, SMatrix, SVector, Scalar};

// ============================================================================
// Vector Space Markers
// ============================================================================

/// Marker for state space vectors (`[px, py, vx, vy]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace;

/// Marker for measurement space vectors (raw sensor readings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSpace;

/// Marker for innovation vectors (measurement - predicted measurement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnovationSpace;

// ============================================================================
// Typed Vector
// ============================================================================

/// A fixed-size vector tagged with the space it belongs to.
///
/// # Type Parameters
///
/// - `T`: Scalar type (`f32` or `f64`)
/// - `N`: Dimension
/// - `Space`: One of the marker types above
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        transparent,
        bound(
            serialize = "SVector<T, N>: serde::Serialize",
            deserialize = "SVector<T, N>: serde::Deserialize<'de>"
        )
    )
)]
pub struct Vector<T: Scalar, const N: usize, Space> {
    inner: SVector<T, N>,
    #[cfg_attr(feature = "serde", serde(skip))]
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a vector from raw components.
    #[inline]
    pub fn from_array(data: [T; N]) -> Self {
        Self {
            inner: SVector::from(data),
            _marker: PhantomData,
        }
    }

    /// Wraps an nalgebra vector.
    #[inline]
    pub fn from_svector(inner: SVector<T, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying nalgebra vector.
    #[inline]
    pub fn as_svector(&self) -> &SVector<T, N> {
        &self.inner
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// Access element at index.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Vector<T, N, Space> {}

impl<T: RealField + Copy, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a zero vector.
    #[inline]
    pub fn zeros() -> Self {
        Self::from_svector(SVector::zeros())
    }

    /// Returns `true` if every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|v| v.is_finite())
    }
}

// ============================================================================
// Type Aliases
// ============================================================================

/// A state vector in state space.
pub type StateVector<T, const N: usize> = Vector<T, N, StateSpace>;

/// A sensor reading in measurement space.
pub type Measurement<T, const M: usize> = Vector<T, M, MeasurementSpace>;

/// A measurement residual.
pub type Innovation<T, const M: usize> = Vector<T, M, InnovationSpace>;

// ============================================================================
// Operations: Same-Space Addition
// ============================================================================

impl<T: RealField + Copy, const N: usize, Space> Add for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_svector(self.inner + rhs.inner)
    }
}

// ============================================================================
// Measurement - Measurement = Innovation
// ============================================================================

/// Computes the residual between an observed and a predicted measurement.
///
/// Subtracting two measurements yields an [`Innovation`], not another
/// measurement, so this lives in its own trait instead of `Sub`.
pub trait ComputeInnovation<T: RealField, const M: usize> {
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M>;
}

impl<T: RealField + Copy, const M: usize> ComputeInnovation<T, M> for Measurement<T, M> {
    #[inline]
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M> {
        Innovation::from_svector(self.inner - predicted.inner)
    }
}

impl<T: RealField + Copy, const M: usize> Innovation<T, M> {
    /// Wraps the component at `index` into (-pi, pi].
    ///
    /// Bearings are subtracted raw, so a target just across the +-pi cut
    /// produces a residual near 2*pi instead of near zero.
    #[inline]
    pub fn wrap_angle(mut self, index: usize) -> Self {
        self.inner[index] = crate::models::normalize_angle(self.inner[index]);
        self
    }
}

// ============================================================================
// Covariance Matrix
// ============================================================================

/// A covariance matrix bound to a specific vector space.
///
/// Covariances are symmetric positive semi-definite. The filter checks the
/// symmetry half of that contract after every step.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance<T: Scalar, const N: usize, Space> {
    inner: SMatrix<T, N, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Covariance<T, N, Space> {
    /// Wraps a raw matrix.
    ///
    /// The caller is responsible for symmetry and positive semi-definiteness.
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, N, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, N, N> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Covariance<T, N, Space> where
    SMatrix<T, N, N>: Copy
{
}

impl<T: RealField + Copy, const N: usize, Space> Covariance<T, N, Space> {
    #[inline]
    pub fn zeros() -> Self {
        Self::from_matrix(SMatrix::zeros())
    }

    #[inline]
    pub fn identity() -> Self {
        Self::from_matrix(SMatrix::identity())
    }

    /// Creates a diagonal covariance matrix from per-component variances.
    #[inline]
    pub fn from_diagonal(diag: &SVector<T, N>) -> Self {
        Self::from_matrix(SMatrix::from_diagonal(diag))
    }

    /// Adds two covariance matrices.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self::from_matrix(self.inner + other.inner)
    }

    /// Sum of the variances.
    #[inline]
    pub fn trace(&self) -> T {
        self.inner.trace()
    }

    /// Variance of component `i`.
    #[inline]
    pub fn variance(&self, i: usize) -> T {
        self.inner[(i, i)]
    }

    /// Largest absolute difference between `P[i][j]` and `P[j][i]`.
    pub fn max_asymmetry(&self) -> T {
        let mut worst = T::zero();
        for i in 0..N {
            for j in (i + 1)..N {
                let d = (self.inner[(i, j)] - self.inner[(j, i)]).abs();
                if d > worst {
                    worst = d;
                }
            }
        }
        worst
    }

    /// Returns `(P + P^T) / 2`.
    #[inline]
    pub fn symmetrize(&self) -> Self {
        let half: T = nalgebra::convert(0.5);
        Self::from_matrix((self.inner + self.inner.transpose()) * half)
    }

    /// Returns `true` if every entry is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|v| v.is_finite())
    }
}

// ============================================================================
// Type Aliases for Covariance
// ============================================================================

/// Covariance matrix in state space (P, Q).
pub type StateCovariance<T, const N: usize> = Covariance<T, N, StateSpace>;

/// Covariance matrix in measurement space (R, and the innovation covariance S).
pub type MeasurementCovariance<T, const M: usize> = Covariance<T, M, MeasurementSpace>;

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn test_state_vector_operations() {
        let v1: StateVector<f64, 4> = StateVector::from_array([1.0, 2.0, 3.0, 4.0]);
        let v2: StateVector<f64, 4> = StateVector::from_array([0.5, 1.0, 1.5, 2.0]);

        let sum = v1 + v2;
        assert!((sum.index(0) - 1.5).abs() < 1e-10);
        assert!((sum.index(3) - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_measurement_to_innovation() {
        let actual: Measurement<f64, 3> = Measurement::from_array([10.0, 0.2, 1.0]);
        let predicted: Measurement<f64, 3> = Measurement::from_array([9.5, 0.1, 1.5]);

        let innovation = actual.innovation(predicted);
        assert!((innovation.index(0) - 0.5).abs() < 1e-10);
        assert!((innovation.index(1) - 0.1).abs() < 1e-10);
        assert!((innovation.index(2) + 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_innovation_wrap_angle() {
        // Measured bearing just below +pi, predicted just above -pi.
        let actual: Measurement<f64, 3> = Measurement::from_array([5.0, PI - 0.05, 0.0]);
        let predicted: Measurement<f64, 3> = Measurement::from_array([5.0, -PI + 0.05, 0.0]);

        let wrapped = actual.innovation(predicted).wrap_angle(1);
        assert!((wrapped.index(1) + 0.1).abs() < 1e-10);
        // Other components are untouched.
        assert!(wrapped.index(0).abs() < 1e-10);
    }

    #[test]
    fn test_covariance_operations() {
        let cov: StateCovariance<f64, 4> = StateCovariance::identity();
        assert!((cov.trace() - 4.0).abs() < 1e-10);
        assert!((cov.variance(2) - 1.0).abs() < 1e-10);
        assert!(cov.max_asymmetry() < 1e-15);
    }

    #[test]
    fn test_symmetrize() {
        let cov: StateCovariance<f64, 2> =
            StateCovariance::from_matrix(nalgebra::matrix![2.0, 1.0; 0.0, 3.0]);
        assert!((cov.max_asymmetry() - 1.0).abs() < 1e-12);

        let sym = cov.symmetrize();
        assert!(sym.max_asymmetry() < 1e-15);
        assert!((sym.as_matrix()[(0, 1)] - 0.5).abs() < 1e-12);
        assert!((sym.trace() - 5.0).abs() < 1e-12);
    }
}
