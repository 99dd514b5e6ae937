//! Observation filter.
use anyhow::Result;
use dictobs_core::{
    record::{Record, RecordValue},
    Array, DictObsError, DictSpace, GymObs, Space,
};
use serde::{de::DeserializeOwned, Serialize};

/// Converts observations of the inner environment of an [`ObsWrapper`].
///
/// A filter is built from its configuration and the observation space of the inner
/// environment, and derives its own observation space at that time.
///
/// [`ObsWrapper`]: crate::ObsWrapper
pub trait ObsFilter {
    /// Configuration.
    type Config: Clone + Default + Serialize + DeserializeOwned;

    /// Builds the filter for an environment with observation space `space`.
    fn build(config: &Self::Config, space: &Space) -> Result<Self>
    where
        Self: Sized;

    /// Observation space after filtering.
    fn observation_space(&self) -> &Space;

    /// Converts an observation of the inner environment.
    fn filt(&mut self, obs: GymObs) -> Result<(GymObs, Record)>;

    /// Called when resetting the environment.
    ///
    /// This method is useful for stateful filters.
    fn reset(&mut self, obs: GymObs) -> Result<GymObs> {
        let (obs, _) = self.filt(obs)?;
        Ok(obs)
    }

    /// Returns default configuration.
    fn default_config() -> Self::Config {
        Self::Config::default()
    }
}

/// Returns the dict space, or fails if `space` is not a dict space.
pub(crate) fn dict_space(space: &Space) -> Result<&DictSpace> {
    space
        .as_dict()
        .ok_or_else(|| DictObsError::SpaceTypeMismatch("dict".to_string()).into())
}

/// Records flattened arrays of which keys are in `record_keys`.
pub(crate) fn record_arrays<'a>(
    record_keys: &Option<Vec<String>>,
    arrays: impl Iterator<Item = (&'a str, &'a Array)>,
) -> Record {
    let mut record = Record::empty();
    if let Some(keys) = record_keys {
        arrays
            .filter(|(key, _)| keys.iter().any(|k| k == *key))
            .for_each(|(key, arr)| {
                record.insert(key, RecordValue::Array1(arr.to_flat_vec::<f32>()));
            });
    }
    record
}
