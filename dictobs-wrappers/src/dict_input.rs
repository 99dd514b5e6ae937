//! Filter selecting a subset of keys of dict observations.
use crate::filter::{dict_space, record_arrays, ObsFilter};
use anyhow::Result;
use dictobs_core::{
    record::Record, AggregateInfo, ArrayDict, DType, DictObsError, DictSpace, GymObs, Space,
};
use log::{info, trace};
use serde::{Deserialize, Serialize};

/// Configuration of [`DictInputFilter`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DictInputFilterConfig {
    /// Keys to be kept, in the order of the output dict.
    pub keys: Vec<String>,

    /// If `None`, no values will be recorded.
    pub record_keys: Option<Vec<String>>,
}

impl DictInputFilterConfig {
    /// Sets the keys to be kept.
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

/// Keeps selected keys of a dict observation.
///
/// The observation space is a dict space over the selected keys in the configured
/// order. All of the selected sub-spaces must have the same dtype. The space is
/// annotated with [`AggregateInfo`], of which shape is `[size]` where `size` is
/// the total number of elements of the selected sub-spaces.
///
/// A key given more than once appears once in the output dict, but is counted in
/// `size` for every occurrence.
#[derive(Clone, Debug)]
pub struct DictInputFilter {
    keys: Vec<String>,
    record_keys: Option<Vec<String>>,
    observation_space: Space,
}

impl DictInputFilter {
    /// Keys to be kept.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl ObsFilter for DictInputFilter {
    type Config = DictInputFilterConfig;

    fn build(config: &Self::Config, space: &Space) -> Result<Self> {
        let dict = dict_space(space)?;

        let mut spaces = Vec::with_capacity(config.keys.len());
        let mut size = 0;
        let mut dtype: Option<DType> = None;
        for key in config.keys.iter() {
            let sub_space = dict
                .get(key)
                .ok_or_else(|| DictObsError::KeyNotFound(key.clone()))?;
            let (n, found) = match (sub_space.size(), sub_space.dtype()) {
                (Some(n), Some(found)) => (n, found),
                _ => return Err(DictObsError::ShapeUnavailable(key.clone()).into()),
            };
            match dtype {
                None => dtype = Some(found),
                Some(expected) if expected != found => {
                    return Err(DictObsError::DTypeMismatch {
                        key: key.clone(),
                        expected,
                        found,
                    }
                    .into());
                }
                _ => {}
            }
            size += n;
            if !spaces.iter().any(|(k, _)| k == key) {
                spaces.push((key.clone(), sub_space.clone()));
            }
        }

        let aggregate = AggregateInfo {
            shape: vec![size],
            dtype: dtype.unwrap_or(DType::F32),
        };
        info!(
            "Build DictInputFilter with keys {:?}, aggregate = {:?}",
            config.keys, aggregate
        );

        Ok(Self {
            keys: config.keys.clone(),
            record_keys: config.record_keys.clone(),
            observation_space: DictSpace::new(spaces)?.with_aggregate(aggregate).into(),
        })
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// Moves the arrays of the selected keys into a new dict.
    ///
    /// Fails if `obs` is not a dict or a selected key is missing.
    fn filt(&mut self, obs: GymObs) -> Result<(GymObs, Record)> {
        trace!("DictInputFilter::filt()");
        let mut obs = obs.into_dict()?;
        let mut out = ArrayDict::new();
        for key in self.keys.iter() {
            if out.get(key).is_some() {
                continue;
            }
            let arr = obs
                .remove(key)
                .ok_or_else(|| DictObsError::KeyNotFound(key.clone()))?;
            out.insert(key.clone(), arr);
        }

        let record = record_arrays(
            &self.record_keys,
            out.iter().map(|(k, v)| (k.as_str(), v)),
        );
        Ok((out.into(), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictobs_core::{BoxSpace, DiscreteSpace};
    use ndarray::arr1;

    fn space() -> Space {
        DictSpace::default()
            .with("a", BoxSpace::unbounded(&[2], DType::F32))
            .with("b", BoxSpace::unbounded(&[3], DType::F32))
            .with("c", BoxSpace::unbounded(&[2, 2], DType::F32))
            .with("t", DiscreteSpace::new(5))
            .into()
    }

    fn obs() -> GymObs {
        let mut d = ArrayDict::new();
        d.insert("a", arr1(&[1f32, 2.]).into_dyn());
        d.insert("b", arr1(&[3f32, 4., 5.]).into_dyn());
        d.insert("c", arr1(&[6f32, 7., 8., 9.]).into_dyn());
        d.into()
    }

    fn build(keys: &[&str]) -> Result<DictInputFilter> {
        let config = DictInputFilterConfig::default().keys(keys.iter().copied());
        DictInputFilter::build(&config, &space())
    }

    #[test]
    fn test_space() {
        let filter = build(&["b", "a"]).unwrap();
        let space = filter.observation_space();
        let dict = space.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(dict.get("b").unwrap().shape(), Some(&[3usize][..]));
        assert_eq!(space.shape(), Some(&[5usize][..]));
        assert_eq!(space.dtype(), Some(DType::F32));
    }

    #[test]
    fn test_empty_keys() {
        let filter = build(&[]).unwrap();
        let space = filter.observation_space();
        assert!(space.as_dict().unwrap().is_empty());
        assert_eq!(space.shape(), Some(&[0usize][..]));
        assert_eq!(space.dtype(), Some(DType::F32));
    }

    #[test]
    fn test_dtype_mismatch() {
        let err = build(&["a", "t"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DictObsError>(),
            Some(&DictObsError::DTypeMismatch {
                key: "t".into(),
                expected: DType::F32,
                found: DType::I64,
            })
        );
    }

    #[test]
    fn test_missing_key_at_build() {
        let err = build(&["z"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DictObsError>(),
            Some(&DictObsError::KeyNotFound("z".into()))
        );
    }

    #[test]
    fn test_repeated_keys() {
        let filter = build(&["a", "a"]).unwrap();
        let space = filter.observation_space();
        assert_eq!(space.as_dict().unwrap().keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(space.shape(), Some(&[4usize][..]));

        let mut filter = build(&["a", "b", "a"]).unwrap();
        assert_eq!(filter.observation_space().shape(), Some(&[7usize][..]));
        let (obs, _) = filter.filt(obs()).unwrap();
        let dict = obs.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(dict.get("a").unwrap().to_flat_vec::<f32>(), vec![1., 2.]);
    }

    #[test]
    fn test_filt() {
        let mut filter = build(&["b", "a"]).unwrap();
        let (obs, record) = filter.filt(obs()).unwrap();
        let dict = obs.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(dict.get("b").unwrap().to_flat_vec::<f32>(), vec![3., 4., 5.]);
        assert_eq!(dict.get("a").unwrap().to_flat_vec::<f32>(), vec![1., 2.]);
        assert!(dict.get("c").is_none());
        assert!(record.is_empty());
    }

    #[test]
    fn test_filt_missing_key() {
        let mut filter = build(&["a", "b"]).unwrap();
        let mut d = ArrayDict::new();
        d.insert("a", arr1(&[1f32, 2.]).into_dyn());
        let err = filter.filt(d.into()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DictObsError>(),
            Some(&DictObsError::KeyNotFound("b".into()))
        );
    }

    #[test]
    fn test_record_keys() {
        let config = DictInputFilterConfig::default()
            .keys(["a", "c"])
            .record_keys(Some(vec!["c".into()]));
        let mut filter = DictInputFilter::build(&config, &space()).unwrap();
        let (_, record) = filter.filt(obs()).unwrap();
        assert_eq!(record.get_array1("c").unwrap(), vec![6., 7., 8., 9.]);
        assert!(record.get("a").is_none());
    }
}
