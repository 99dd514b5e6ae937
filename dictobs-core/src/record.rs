//! Records of values emitted by environments and observation filters.
//!
//! A [`Record`] is a side channel of [`Env::step`](crate::Env::step): the environment
//! and the wrappers around it put values to be logged, e.g., the length of an episode
//! or flattened observations, into it.
//!
//! ```rust
//! use dictobs_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("episode_length", 10.0);
//! record.insert("obs", RecordValue::Array1(vec![1.0, 2.0]));
//! assert_eq!(record.get_scalar("episode_length").unwrap(), 10.0);
//! ```
mod base;

pub use base::{Record, RecordValue};
