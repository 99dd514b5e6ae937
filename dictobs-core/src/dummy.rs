//! A deterministic environment with dict observations.
//!
//! [`DummyDictEnv`] emits dict observations following a [`DictSpace`] given in its
//! configuration. The element `j` of the array at the `i`-th key takes the value
//! `seed + t + 10 * i + j` at step `t` of an episode, cast to the dtype of the
//! sub-space. This makes it easy to check what observation wrappers do with the values.
use crate::{
    record::{Record, RecordValue},
    Act, Array, ArrayDict, BoxSpace, DType, DictObsError, DictSpace, DiscreteSpace, Env, GymObs,
    Space, Step,
};
use anyhow::{bail, Result};
use log::{info, trace};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Discrete action of [`DummyDictEnv`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyAct(pub i64);

impl Act for DummyAct {}

/// Configuration of [`DummyDictEnv`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DummyDictEnvConfig {
    /// Observation space. Sub-spaces must be box or discrete spaces.
    pub observation_space: DictSpace,

    /// The number of actions.
    pub n_actions: i64,

    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for DummyDictEnvConfig {
    fn default() -> Self {
        Self {
            observation_space: DictSpace::default()
                .with("observation", BoxSpace::unbounded(&[4], DType::F32))
                .with("achieved_goal", BoxSpace::unbounded(&[3], DType::F32))
                .with("desired_goal", BoxSpace::unbounded(&[3], DType::F32)),
            n_actions: 2,
            max_steps: 5,
        }
    }
}

impl DummyDictEnvConfig {
    /// Sets the observation space.
    pub fn observation_space(mut self, v: DictSpace) -> Self {
        self.observation_space = v;
        self
    }

    /// Sets the number of actions.
    pub fn n_actions(mut self, v: i64) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }
}

/// A deterministic environment with dict observations.
///
/// Action `0` gives reward `1` and the others give `0`.
pub struct DummyDictEnv {
    config: DummyDictEnvConfig,
    observation_space: Space,
    action_space: Space,
    seed: i64,
    count_steps: usize,
    n_renders: usize,
    closed: bool,
}

impl DummyDictEnv {
    /// The number of calls of [`Env::render`].
    pub fn n_renders(&self) -> usize {
        self.n_renders
    }

    /// Returns `true` after [`Env::close`] is called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn observe(&self) -> Result<GymObs> {
        let mut obs = ArrayDict::new();
        for (i, (key, space)) in self.config.observation_space.iter().enumerate() {
            let (shape, dtype) = match (space.shape(), space.dtype()) {
                (Some(shape), Some(dtype)) => (shape, dtype),
                _ => return Err(DictObsError::ShapeUnavailable(key.clone()).into()),
            };
            let offset = (self.seed + self.count_steps as i64) as f64 + (10 * i) as f64;
            let n = shape.iter().product::<usize>();
            let values = (0..n).map(|j| offset + j as f64).collect();
            let array = Array::F64(ArrayD::from_shape_vec(IxDyn(shape), values)?);
            obs.insert(key.clone(), array.to_dtype(dtype));
        }
        Ok(obs.into())
    }
}

impl Env for DummyDictEnv {
    type Config = DummyDictEnvConfig;
    type Obs = GymObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        for (key, space) in config.observation_space.iter() {
            if let Space::Dict(_) = space {
                return Err(DictObsError::SpaceTypeMismatch(format!(
                    "box or discrete at key {}",
                    key
                ))
                .into());
            }
        }
        info!(
            "Build DummyDictEnv with keys {:?}",
            config.observation_space.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            config: config.clone(),
            observation_space: config.observation_space.clone().into(),
            action_space: DiscreteSpace::new(config.n_actions).into(),
            seed,
            count_steps: 0,
            n_renders: 0,
            closed: false,
        })
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        trace!("DummyDictEnv::step()");
        if !(0..self.config.n_actions).contains(&a.0) {
            bail!("Invalid action: {}", a.0);
        }

        self.count_steps += 1;
        let obs = self.observe()?;
        let reward = if a.0 == 0 { 1.0 } else { 0.0 };
        let is_truncated = self.count_steps >= self.config.max_steps;

        let mut record = Record::empty();
        if is_truncated {
            record.insert(
                "episode_length",
                RecordValue::Scalar(self.count_steps as f32),
            );
        }

        let step = Step::new(
            obs,
            a.clone(),
            vec![reward],
            vec![0],
            vec![is_truncated as i8],
            (),
            None,
        );
        Ok((step, record))
    }

    /// Resets the environment when `is_done` is `None` or `is_done[0] == 1`.
    ///
    /// Otherwise, the current observation is returned without reset.
    fn reset(&mut self, is_done: Option<&Vec<i8>>) -> Result<Self::Obs> {
        trace!("DummyDictEnv::reset()");
        let reset = match is_done {
            None => true,
            Some(v) => {
                debug_assert_eq!(v.len(), 1);
                v[0] != 0
            }
        };
        if reset {
            self.count_steps = 0;
        }
        self.observe()
    }

    /// Resets the environment using `ix` as the seed.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.seed = ix as i64;
        self.reset(None)
    }

    fn render(&mut self) -> Result<()> {
        trace!("DummyDictEnv::render()");
        self.n_renders += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        info!("Close DummyDictEnv");
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> DummyDictEnv {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = DummyDictEnvConfig::default().observation_space(
            DictSpace::default()
                .with("a", BoxSpace::unbounded(&[2], DType::F32))
                .with("b", BoxSpace::unbounded(&[3], DType::F32))
                .with("c", DiscreteSpace::new(4)),
        );
        DummyDictEnv::build(&config, 0).unwrap()
    }

    #[test]
    fn test_reset_values() {
        let mut env = env();
        let obs = env.reset(None).unwrap();
        let obs = obs.as_dict().unwrap();
        assert_eq!(obs.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(obs.get("a").unwrap().to_flat_vec::<f32>(), vec![0., 1.]);
        assert_eq!(obs.get("b").unwrap().to_flat_vec::<f32>(), vec![10., 11., 12.]);
        assert_eq!(obs.get("c").unwrap().dtype(), DType::I64);
        assert_eq!(obs.get("c").unwrap().to_flat_vec::<i64>(), vec![20]);
    }

    #[test]
    fn test_episode_truncation() {
        let mut env = env();
        env.reset(None).unwrap();
        for t in 1..=5 {
            let (step, record) = env.step(&DummyAct(0)).unwrap();
            assert_eq!(step.reward, vec![1.0]);
            assert_eq!(step.is_done(), t == 5);
            if t == 5 {
                assert_eq!(record.get_scalar("episode_length").unwrap(), 5.0);
            }
        }
        assert!(env.step(&DummyAct(2)).is_err());
    }

    #[test]
    fn test_reset_with_index_seeds_values() {
        let mut env = env();
        let obs = env.reset_with_index(100).unwrap();
        let a = obs.as_dict().unwrap().get("a").unwrap().to_flat_vec::<f32>();
        assert_eq!(a, vec![100., 101.]);
    }

    #[test]
    fn test_nested_dict_is_rejected() {
        let config = DummyDictEnvConfig::default().observation_space(
            DictSpace::default().with("nested", DictSpace::default()),
        );
        assert!(DummyDictEnv::build(&config, 0).is_err());
    }
}
