//! Core functionalities.
mod env;
mod step;
pub use env::Env;
use std::fmt::Debug;
pub use step::{Info, Step};

/// Observation of an environment.
///
/// Vectorized environments are not supported.
pub trait Obs: Clone + Debug {}

/// Action of an environment.
pub trait Act: Clone + Debug {}
