//! Radar measurement function and its Jacobian
//!
//! The radar observes `h(x) = [rho, phi, rho_dot]` with
//!
//! ```text
//! rho     = sqrt(px^2 + py^2)
//! phi     = atan2(py, px)
//! rho_dot = (px*vx + py*vy) / rho
//! ```
//!
//! which is nonlinear in the state, so the EKF linearizes it with the
//! Jacobian below for the covariance update.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::{Measurement, StateVector};
use crate::types::transforms::ObservationMatrix;
use crate::{FusionError, Result};

/// Default floor below which the range is treated as zero.
pub const DEFAULT_MIN_RANGE: f64 = 1e-4;

/// Wraps an angle into (-pi, pi].
///
/// Reduces in closed form, so arbitrarily large finite inputs terminate.
/// A second reduction pass absorbs the rounding of the first one when the
/// input is far larger than 2*pi. Non-finite inputs are returned as is.
pub fn normalize_angle<T: RealField + Copy>(angle: T) -> T {
    if !angle.is_finite() {
        return angle;
    }
    let pi = T::pi();
    if angle > -pi && angle <= pi {
        return angle;
    }

    let two_pi = T::two_pi();
    let reduce = |a: T| a - two_pi * ((a + pi) / two_pi).floor();

    let wrapped = reduce(reduce(angle));
    if wrapped <= -pi {
        wrapped + two_pi
    } else if wrapped > pi {
        wrapped - two_pi
    } else {
        wrapped
    }
}

/// Evaluates the radar measurement function `h(x)`.
///
/// The range-rate denominator is floored at `min_range`, so a state at the
/// origin yields `[0, 0, 0]` rather than NaN.
pub fn range_bearing_rate<T: RealField + Float + Copy>(
    state: &StateVector<T, 4>,
    min_range: T,
) -> Measurement<T, 3> {
    let px = *state.index(0);
    let py = *state.index(1);
    let vx = *state.index(2);
    let vy = *state.index(3);

    let rho = Float::sqrt(px * px + py * py);
    let phi = Float::atan2(py, px);
    let rho_dot = (px * vx + py * vy) / Float::max(rho, min_range);

    Measurement::from_array([rho, phi, rho_dot])
}

/// Computes the 3x4 Jacobian of [`range_bearing_rate`] at `state`.
///
/// Fails with [`FusionError::DegenerateRange`] when the range is below
/// `min_range`: every row divides by a power of rho.
pub fn range_bearing_rate_jacobian<T: RealField + Float + Copy>(
    state: &StateVector<T, 4>,
    min_range: T,
) -> Result<ObservationMatrix<T, 3, 4>> {
    let px = *state.index(0);
    let py = *state.index(1);
    let vx = *state.index(2);
    let vy = *state.index(3);

    let c1 = px * px + py * py;
    let c2 = Float::sqrt(c1);
    let c3 = c1 * c2;

    if !(c2 >= min_range) {
        return Err(FusionError::DegenerateRange);
    }

    let zero = T::zero();

    Ok(ObservationMatrix::from_matrix(nalgebra::matrix![
        px / c2, py / c2, zero, zero;
        -py / c1, px / c1, zero, zero;
        py * (vx * py - vy * px) / c3, px * (vy * px - vx * py) / c3, px / c2, py / c2
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn test_jacobian_3_4_5() {
        let state = StateVector::from_array([3.0_f64, 4.0, 1.0, 2.0]);
        let h = range_bearing_rate_jacobian(&state, DEFAULT_MIN_RANGE).unwrap();
        let m = h.as_matrix();

        assert!((m[(0, 0)] - 0.6).abs() < 1e-12);
        assert!((m[(0, 1)] - 0.8).abs() < 1e-12);
        assert!(m[(0, 2)].abs() < 1e-12);
        assert!(m[(0, 3)].abs() < 1e-12);

        assert!((m[(1, 0)] + 4.0 / 25.0).abs() < 1e-12);
        assert!((m[(1, 1)] - 3.0 / 25.0).abs() < 1e-12);

        // vx*py - vy*px = 4 - 6 = -2
        assert!((m[(2, 0)] - 4.0 * -2.0 / 125.0).abs() < 1e-12);
        assert!((m[(2, 1)] - 3.0 * 2.0 / 125.0).abs() < 1e-12);
        assert!((m[(2, 2)] - 0.6).abs() < 1e-12);
        assert!((m[(2, 3)] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let state = [7.0_f64, -2.5, 1.5, 3.0];
        let x = StateVector::from_array(state);
        let h = range_bearing_rate_jacobian(&x, DEFAULT_MIN_RANGE).unwrap();
        let eps = 1e-6;

        for col in 0..4 {
            let mut plus = state;
            let mut minus = state;
            plus[col] += eps;
            minus[col] -= eps;
            let zp = range_bearing_rate(&StateVector::from_array(plus), DEFAULT_MIN_RANGE);
            let zm = range_bearing_rate(&StateVector::from_array(minus), DEFAULT_MIN_RANGE);
            for row in 0..3 {
                let numeric = (zp.index(row) - zm.index(row)) / (2.0 * eps);
                let analytic = h.as_matrix()[(row, col)];
                assert!(
                    (numeric - analytic).abs() < 1e-6,
                    "d h[{}] / d x[{}]: numeric {} vs analytic {}",
                    row,
                    col,
                    numeric,
                    analytic
                );
            }
        }
    }

    #[test]
    fn test_jacobian_rejects_zero_range() {
        let state = StateVector::from_array([0.0_f64, 0.0, 1.0, 1.0]);
        assert_eq!(
            range_bearing_rate_jacobian(&state, DEFAULT_MIN_RANGE),
            Err(FusionError::DegenerateRange)
        );

        let near = StateVector::from_array([5e-5_f64, 5e-5, 1.0, 1.0]);
        assert!(range_bearing_rate_jacobian(&near, DEFAULT_MIN_RANGE).is_err());
    }

    #[test]
    fn test_jacobian_rejects_nan_state() {
        let state = StateVector::from_array([f64::NAN, 1.0, 0.0, 0.0]);
        assert!(range_bearing_rate_jacobian(&state, DEFAULT_MIN_RANGE).is_err());
    }

    #[test]
    fn test_measurement_function() {
        let state = StateVector::from_array([3.0_f64, 4.0, 1.0, 2.0]);
        let z = range_bearing_rate(&state, DEFAULT_MIN_RANGE);

        assert!((z.index(0) - 5.0).abs() < 1e-12);
        assert!((z.index(1) - (4.0_f64).atan2(3.0)).abs() < 1e-12);
        assert!((z.index(2) - 11.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_measurement_function_at_origin_is_finite() {
        let state = StateVector::from_array([0.0_f64, 0.0, 3.0, -1.0]);
        let z = range_bearing_rate(&state, DEFAULT_MIN_RANGE);
        assert!(z.is_finite());
        assert_eq!(*z.index(0), 0.0);
        assert_eq!(*z.index(2), 0.0);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(0.5_f64) - 0.5).abs() < 1e-12);
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(2.0 * PI - 0.1) + 0.1).abs() < 1e-12);
        assert!((normalize_angle(-7.0 * PI + 0.2) - (-PI + 0.2)).abs() < 1e-9);
        assert!(normalize_angle(f64::NAN).is_nan());
    }

    #[test]
    fn test_normalize_angle_huge_inputs() {
        for angle in [1e17_f64, -1e17, 3.3e150, f64::MAX / 8.0] {
            let wrapped = normalize_angle(angle);
            assert!(
                wrapped > -PI && wrapped <= PI,
                "{} wrapped to {}",
                angle,
                wrapped
            );
        }

        let wrapped = normalize_angle(1.0e9_f32);
        assert!(wrapped > -core::f32::consts::PI && wrapped <= core::f32::consts::PI);
    }
}
