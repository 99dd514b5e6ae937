//! Filter flattening selected keys of dict observations into an array.
use crate::filter::{dict_space, record_arrays, ObsFilter};
use anyhow::Result;
use dictobs_core::{record::Record, Array, BoxSpace, DType, DictObsError, GymObs, Space};
use log::{info, trace};
use serde::{Deserialize, Serialize};

/// Configuration of [`FlattenDictFilter`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenDictFilterConfig {
    /// Keys to be flattened, in the order of concatenation.
    pub keys: Vec<String>,

    /// If `None`, no values will be recorded.
    pub record_keys: Option<Vec<String>>,
}

impl FlattenDictFilterConfig {
    /// Sets the keys to be flattened.
    pub fn keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keys of which values will be recorded.
    pub fn record_keys(mut self, keys: Option<Vec<String>>) -> Self {
        self.record_keys = keys;
        self
    }
}

/// Flattens selected keys of a dict observation into an array.
///
/// The arrays of the selected keys are flattened in row-major order and
/// concatenated in the order of the keys in the configuration.
/// The observation space is a box space of shape `[size]` with bounds `(-inf, inf)`,
/// where `size` is the total number of elements of the selected sub-spaces.
///
/// The dtype of the observation space is always `f32`. It is not enforced on
/// observations: the dtype of the concatenated array is the promotion of the
/// dtypes of the selected arrays.
#[derive(Clone, Debug)]
pub struct FlattenDictFilter {
    keys: Vec<String>,
    record_keys: Option<Vec<String>>,
    observation_space: Space,
}

impl FlattenDictFilter {
    /// Keys to be flattened.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl ObsFilter for FlattenDictFilter {
    type Config = FlattenDictFilterConfig;

    /// Fails if `space` is not a dict space or a key is not in `space`.
    fn build(config: &Self::Config, space: &Space) -> Result<Self> {
        let dict = dict_space(space)?;

        let mut size = 0;
        for key in config.keys.iter() {
            let sub_space = dict
                .get(key)
                .ok_or_else(|| DictObsError::KeyNotFound(key.clone()))?;
            size += sub_space
                .size()
                .ok_or_else(|| DictObsError::ShapeUnavailable(key.clone()))?;
        }
        info!(
            "Build FlattenDictFilter with keys {:?}, size = {}",
            config.keys, size
        );

        Ok(Self {
            keys: config.keys.clone(),
            record_keys: config.record_keys.clone(),
            observation_space: BoxSpace::unbounded(&[size], DType::F32).into(),
        })
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// Concatenates the flattened arrays of the selected keys.
    ///
    /// Fails if `obs` is not a dict or a selected key is missing.
    fn filt(&mut self, obs: GymObs) -> Result<(GymObs, Record)> {
        trace!("FlattenDictFilter::filt()");
        let obs = obs.into_dict()?;
        let arrays = self
            .keys
            .iter()
            .map(|key| {
                obs.get(key)
                    .ok_or_else(|| DictObsError::KeyNotFound(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let record = record_arrays(
            &self.record_keys,
            self.keys.iter().map(String::as_str).zip(arrays.iter().copied()),
        );
        Ok((Array::concatenate(&arrays).into(), record))
    }
}
