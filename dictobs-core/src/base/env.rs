//! Environment.
use super::{Act, Info, Obs, Step};
use crate::{record::Record, space::Space};
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Space containing all possible observations.
    fn observation_space(&self) -> &Space;

    /// Space containing all possible actions.
    fn action_space(&self) -> &Space;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment if `is_done[0] == 1`. or `is_done.is_none()`.
    ///
    /// Vectorized environments are not supported and `is_done.len()` is expected to be 1.
    fn reset(&mut self, is_done: Option<&Vec<i8>>) -> Result<Self::Obs>;

    /// Performes an environment step and reset the environment if an episode ends.
    ///
    /// The observation after the reset is put in [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized,
    {
        let (mut step, record) = self.step(a)?;
        if step.is_done() {
            step.init_obs = Some(self.reset(None)?);
        }
        Ok((step, record))
    }

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluation of a trained agent.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;

    /// Renders the current state of the environment.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases resources held by the environment.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
