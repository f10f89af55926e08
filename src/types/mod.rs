//! Core types: typed vector spaces, transforms and measurement packages

pub mod measurement;
pub mod spaces;
pub mod transforms;
