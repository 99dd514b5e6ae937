#![warn(missing_docs)]
//! Environment abstraction for dict observation wrappers.
//!
//! This crate provides the [`Env`] trait, observation and action spaces ([`space`]),
//! observations made of typed arrays ([`array`]) and records ([`record`]).
//! Observation wrappers are implemented in `dictobs-wrappers` on top of these.
pub mod array;
pub mod dummy;
pub mod error;
pub mod record;
pub mod space;

mod base;
pub use array::{Array, ArrayDict, GymObs};
pub use base::{Act, Env, Info, Obs, Step};
pub use error::DictObsError;
pub use space::{AggregateInfo, BoxSpace, DType, DictSpace, DiscreteSpace, Space};
