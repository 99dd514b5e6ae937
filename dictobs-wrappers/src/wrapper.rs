//! Environment wrapper converting observations with a filter.
use crate::filter::ObsFilter;
use anyhow::Result;
use dictobs_core::{record::Record, Env, GymObs, Space, Step};
use log::trace;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ObsWrapper`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObsWrapperConfig<EC, FC> {
    /// Configuration of the inner environment.
    pub env_config: EC,

    /// Configuration of the observation filter.
    pub filter_config: FC,
}

impl<EC, FC> ObsWrapperConfig<EC, FC> {
    /// Sets the configuration of the inner environment.
    pub fn env_config(mut self, v: EC) -> Self {
        self.env_config = v;
        self
    }

    /// Sets the configuration of the observation filter.
    pub fn filter_config(mut self, v: FC) -> Self {
        self.filter_config = v;
        self
    }
}

impl<EC, FC> ObsWrapperConfig<EC, FC>
where
    EC: Serialize + DeserializeOwned,
    FC: Serialize + DeserializeOwned,
{
    /// Constructs [`ObsWrapperConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ObsWrapperConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Wraps an environment and converts its observations with a filter `F`.
///
/// The observation space is the one derived by the filter. All other capabilities,
/// such as the action space, rendering and closing, are delegated to the inner
/// environment. Observations from [`Env::reset`], [`Env::step`] and
/// [`Env::step_with_reset`] go through the filter, including [`Step::init_obs`].
///
/// Since [`ObsWrapper`] implements [`Env`] with [`GymObs`] observations, wrappers
/// can be nested.
pub struct ObsWrapper<E, F> {
    env: E,
    filter: F,
}

impl<E, F> ObsWrapper<E, F>
where
    E: Env<Obs = GymObs>,
    F: ObsFilter,
{
    /// Wraps an environment.
    ///
    /// The filter is built with the observation space of `env`.
    pub fn new(env: E, filter_config: &F::Config) -> Result<Self> {
        let filter = F::build(filter_config, env.observation_space())?;
        Ok(Self { env, filter })
    }

    /// The inner environment.
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// The inner environment.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// The observation filter.
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Unwraps the inner environment.
    pub fn into_inner(self) -> E {
        self.env
    }

    fn convert_step(&mut self, step: Step<E>) -> Result<(Step<Self>, Record)> {
        let (obs, record) = self.filter.filt(step.obs)?;
        let init_obs = match step.init_obs {
            Some(obs) => Some(self.filter.reset(obs)?),
            None => None,
        };
        let step = Step::new(
            obs,
            step.act,
            step.reward,
            step.is_terminated,
            step.is_truncated,
            step.info,
            init_obs,
        );
        Ok((step, record))
    }
}

impl<E, F> Env for ObsWrapper<E, F>
where
    E: Env<Obs = GymObs>,
    F: ObsFilter,
{
    type Config = ObsWrapperConfig<E::Config, F::Config>;
    type Obs = GymObs;
    type Act = E::Act;
    type Info = E::Info;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = E::build(&config.env_config, seed)?;
        Self::new(env, &config.filter_config)
    }

    fn observation_space(&self) -> &Space {
        self.filter.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        trace!("ObsWrapper::step()");
        let (step, record) = self.env.step(a)?;
        let (step, record_filter) = self.convert_step(step)?;
        Ok((step, record.merge(record_filter)))
    }

    fn reset(&mut self, is_done: Option<&Vec<i8>>) -> Result<Self::Obs> {
        trace!("ObsWrapper::reset()");
        let obs = self.env.reset(is_done)?;
        self.filter.reset(obs)
    }

    /// Delegates to [`Env::step_with_reset`] of the inner environment, so that the
    /// inner environment decides when to reset.
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        trace!("ObsWrapper::step_with_reset()");
        let (step, record) = self.env.step_with_reset(a)?;
        let (step, record_filter) = self.convert_step(step)?;
        Ok((step, record.merge(record_filter)))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        trace!("ObsWrapper::reset_with_index()");
        let obs = self.env.reset_with_index(ix)?;
        self.filter.reset(obs)
    }

    fn render(&mut self) -> Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlattenDictFilter, FlattenDictFilterConfig};
    use dictobs_core::dummy::{DummyAct, DummyDictEnv, DummyDictEnvConfig};

    type Wrapped = ObsWrapper<DummyDictEnv, FlattenDictFilter>;

    fn config() -> ObsWrapperConfig<DummyDictEnvConfig, FlattenDictFilterConfig> {
        ObsWrapperConfig::default()
            .filter_config(FlattenDictFilterConfig::default().keys(["desired_goal", "observation"]))
    }

    #[test]
    fn test_build() {
        let env = Wrapped::build(&config(), 0).unwrap();
        assert_eq!(env.observation_space().shape(), Some(&[7usize][..]));
        assert_eq!(env.inner().observation_space().as_dict().unwrap().len(), 3);
        assert_eq!(env.filter().keys(), &["desired_goal", "observation"]);
    }

    #[test]
    fn test_step_with_reset_filters_init_obs() {
        let mut env = Wrapped::build(&config().env_config(DummyDictEnvConfig::default().max_steps(2)), 0).unwrap();
        env.reset(None).unwrap();

        let (step, _) = env.step_with_reset(&DummyAct(1)).unwrap();
        assert!(step.init_obs.is_none());
        assert_eq!(
            step.obs.as_array().unwrap().to_flat_vec::<f32>(),
            vec![21., 22., 23., 1., 2., 3., 4.]
        );

        let (step, record) = env.step_with_reset(&DummyAct(1)).unwrap();
        assert!(step.is_done());
        assert_eq!(record.get_scalar("episode_length").unwrap(), 2.0);
        let init_obs = step.init_obs.unwrap();
        assert_eq!(
            init_obs.as_array().unwrap().to_flat_vec::<f32>(),
            vec![20., 21., 22., 0., 1., 2., 3.]
        );
    }
}
