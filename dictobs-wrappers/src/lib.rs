//! Observation wrappers for environments with dict observation spaces.
//!
//! An [`ObsWrapper`] wraps an environment implementing [`Env`] and converts its
//! observations with an [`ObsFilter`]. Everything else, i.e., actions, rewards,
//! rendering and closing, is delegated to the inner environment as is.
//!
//! There are two built-in filters for dict observations:
//!
//! * [`FlattenDictFilter`] concatenates the arrays of selected keys into a single
//!   1-dimensional array. The observation space becomes an unbounded box space.
//! * [`DictInputFilter`] keeps the arrays of selected keys as a dict. The observation
//!   space becomes a dict space over the selected keys, annotated with the shape and
//!   dtype of their union (see [`AggregateInfo`]).
//!
//! ```
//! use dictobs_core::{dummy::{DummyDictEnv, DummyDictEnvConfig}, Env};
//! use dictobs_wrappers::{FlattenDictFilter, FlattenDictFilterConfig, ObsWrapper};
//!
//! let env = DummyDictEnv::build(&DummyDictEnvConfig::default(), 0).unwrap();
//! let config = FlattenDictFilterConfig::default().keys(["observation", "desired_goal"]);
//! let mut env = ObsWrapper::<_, FlattenDictFilter>::new(env, &config).unwrap();
//! assert_eq!(env.observation_space().shape(), Some(&[7usize][..]));
//!
//! let obs = env.reset(None).unwrap();
//! assert_eq!(obs.as_array().unwrap().shape(), &[7]);
//! ```
//!
//! [`Env`]: dictobs_core::Env
//! [`AggregateInfo`]: dictobs_core::AggregateInfo
#![warn(missing_docs)]
mod dict_input;
mod filter;
mod flatten;
mod wrapper;

pub use dict_input::{DictInputFilter, DictInputFilterConfig};
pub use filter::ObsFilter;
pub use flatten::{FlattenDictFilter, FlattenDictFilterConfig};
pub use wrapper::{ObsWrapper, ObsWrapperConfig};
