//! Motion and sensor models
//!
//! The constant-velocity process model, the laser and radar measurement
//! models, and the radar Jacobian they share with the filter.

mod jacobian;
mod observation;
mod transition;

pub use jacobian::*;
pub use observation::*;
pub use transition::*;
