//! Observation and action spaces.
//!
//! A [`Space`] describes the domain of values an environment emits as observations
//! or accepts as actions. Three kinds of spaces are supported:
//!
//! * [`BoxSpace`] - a numeric array with element-wise bounds, a shape and an element type.
//! * [`DiscreteSpace`] - a scalar integer in `0..n`.
//! * [`DictSpace`] - an ordered mapping from string keys to sub-spaces.
//!
//! A [`DictSpace`] can carry an [`AggregateInfo`], which describes the shape and the
//! element type of the union of its sub-spaces. This is advisory metadata attached by
//! wrappers such as `DictInputFilter`; the values of the space are still dicts.
use crate::{
    array::{Array, ArrayDict, GymObs},
    error::DictObsError,
};
use anyhow::Result;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Element type of arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// `u8`
    U8,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl DType {
    /// Returns the smallest type which can represent values of both types.
    ///
    /// The rule follows numpy: mixing a 32-bit integer with `f32` gives `f64`,
    /// while `u8` fits into `f32`.
    pub fn promote(self, other: DType) -> DType {
        use DType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (F64, _) | (_, F64) => F64,
            (F32, U8) | (U8, F32) => F32,
            (F32, _) | (_, F32) => F64,
            (I64, _) | (_, I64) => I64,
            _ => I32,
        }
    }

    /// Returns `true` for floating point types.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::U8 => "u8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

/// A numeric array space with element-wise bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: ArrayD<f64>,
    high: ArrayD<f64>,
    shape: Vec<usize>,
    dtype: DType,
}

impl BoxSpace {
    /// Creates a box space with the same bounds for all elements.
    pub fn new(low: f64, high: f64, shape: &[usize], dtype: DType) -> Self {
        Self {
            low: ArrayD::from_elem(IxDyn(shape), low),
            high: ArrayD::from_elem(IxDyn(shape), high),
            shape: shape.to_vec(),
            dtype,
        }
    }

    /// Creates a box space from element-wise bounds.
    ///
    /// The shape of the space is taken from `low`, which must have the same shape as `high`.
    pub fn from_bounds(low: ArrayD<f64>, high: ArrayD<f64>, dtype: DType) -> Result<Self> {
        if low.shape() != high.shape() {
            return Err(DictObsError::ShapeError(format!(
                "low {:?} and high {:?}",
                low.shape(),
                high.shape()
            ))
            .into());
        }
        let shape = low.shape().to_vec();
        Ok(Self {
            low,
            high,
            shape,
            dtype,
        })
    }

    /// Creates a box space with bounds `(-inf, inf)`.
    pub fn unbounded(shape: &[usize], dtype: DType) -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY, shape, dtype)
    }

    /// Lower bounds.
    pub fn low(&self) -> &ArrayD<f64> {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &ArrayD<f64> {
        &self.high
    }

    /// Shape of elements in the space.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The number of scalar values in an element of the space.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns `true` if all bounds are finite.
    pub fn is_bounded(&self) -> bool {
        self.low.iter().chain(self.high.iter()).all(|x| x.is_finite())
    }

    /// Returns `true` if `x` has the shape of the space and lies within the bounds.
    ///
    /// The element type of `x` is not checked.
    pub fn contains(&self, x: &Array) -> bool {
        if x.shape() != &self.shape[..] {
            return false;
        }
        x.to_flat_vec::<f64>()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(v, (l, h))| l <= v && v <= h)
    }
}

/// A space of integers `0..n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteSpace {
    /// The number of values.
    pub n: i64,
}

impl DiscreteSpace {
    /// Creates a discrete space.
    pub fn new(n: i64) -> Self {
        Self { n }
    }

    /// Returns `true` if `x` is a scalar integer in `0..n`.
    pub fn contains(&self, x: &Array) -> bool {
        if !x.shape().is_empty() || x.dtype().is_float() {
            return false;
        }
        x.to_flat_vec::<i64>()
            .first()
            .map_or(false, |v| (0..self.n).contains(v))
    }
}

/// Shape and element type of the union of the sub-spaces of a [`DictSpace`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateInfo {
    /// Shape of the flattened union, `[size]`.
    pub shape: Vec<usize>,

    /// Element type shared by all sub-spaces.
    pub dtype: DType,
}

/// An ordered mapping from keys to sub-spaces.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DictSpaceRepr")]
pub struct DictSpace {
    spaces: Vec<(String, Space)>,

    #[serde(default)]
    aggregate: Option<AggregateInfo>,
}

/// Deserialized form of [`DictSpace`] before key validation.
#[derive(Deserialize)]
struct DictSpaceRepr {
    spaces: Vec<(String, Space)>,

    #[serde(default)]
    aggregate: Option<AggregateInfo>,
}

impl TryFrom<DictSpaceRepr> for DictSpace {
    type Error = DictObsError;

    fn try_from(repr: DictSpaceRepr) -> Result<Self, Self::Error> {
        check_unique_keys(&repr.spaces)?;
        Ok(Self {
            spaces: repr.spaces,
            aggregate: repr.aggregate,
        })
    }
}

fn check_unique_keys(spaces: &[(String, Space)]) -> Result<(), DictObsError> {
    for (i, (key, _)) in spaces.iter().enumerate() {
        if spaces[..i].iter().any(|(k, _)| k == key) {
            return Err(DictObsError::DuplicateKey(key.clone()));
        }
    }
    Ok(())
}

impl DictSpace {
    /// Creates a dict space, keeping the order of `spaces`.
    ///
    /// Fails if a key appears more than once.
    pub fn new(spaces: Vec<(String, Space)>) -> Result<Self> {
        check_unique_keys(&spaces)?;
        Ok(Self {
            spaces,
            aggregate: None,
        })
    }

    /// Sets the sub-space of `key`.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn with(mut self, key: impl Into<String>, space: impl Into<Space>) -> Self {
        let key = key.into();
        let space = space.into();
        match self.spaces.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = space,
            None => self.spaces.push((key, space)),
        }
        self
    }

    /// Attaches aggregate shape and element type.
    pub fn with_aggregate(mut self, aggregate: AggregateInfo) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Returns the sub-space of `key`.
    pub fn get(&self, key: &str) -> Option<&Space> {
        self.spaces.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.spaces.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over keys and sub-spaces in order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Space)> {
        self.spaces.iter()
    }

    /// The number of sub-spaces.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Returns `true` if there is no sub-space.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Aggregate shape and element type, if attached.
    pub fn aggregate(&self) -> Option<&AggregateInfo> {
        self.aggregate.as_ref()
    }

    /// Returns `true` if `x` has exactly the keys of the space and each value
    /// lies in the corresponding sub-space.
    pub fn contains(&self, x: &ArrayDict) -> bool {
        x.len() == self.len()
            && self.spaces.iter().all(|(k, s)| match x.get(k) {
                Some(v) => s.contains(&GymObs::Array(v.clone())),
                None => false,
            })
    }
}

/// Observation or action space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Space {
    /// Box space.
    Box(BoxSpace),

    /// Discrete space.
    Discrete(DiscreteSpace),

    /// Dict space.
    Dict(DictSpace),
}

impl Space {
    /// Shape of elements in the space.
    ///
    /// Discrete spaces are scalar, i.e., `[]`. Dict spaces have a shape only if
    /// [`AggregateInfo`] is attached.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Space::Box(s) => Some(s.shape()),
            Space::Discrete(_) => Some(&[]),
            Space::Dict(s) => s.aggregate().map(|a| &a.shape[..]),
        }
    }

    /// Element type of the space.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Space::Box(s) => Some(s.dtype()),
            Space::Discrete(_) => Some(DType::I64),
            Space::Dict(s) => s.aggregate().map(|a| a.dtype),
        }
    }

    /// The number of scalar values, i.e., the product of [`Space::shape`].
    pub fn size(&self) -> Option<usize> {
        self.shape().map(|s| s.iter().product())
    }

    /// Returns the dict space, if this is one.
    pub fn as_dict(&self) -> Option<&DictSpace> {
        match self {
            Space::Dict(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the box space, if this is one.
    pub fn as_box(&self) -> Option<&BoxSpace> {
        match self {
            Space::Box(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if `x` is an element of the space.
    pub fn contains(&self, x: &GymObs) -> bool {
        match (self, x) {
            (Space::Box(s), GymObs::Array(a)) => s.contains(a),
            (Space::Discrete(s), GymObs::Array(a)) => s.contains(a),
            (Space::Dict(s), GymObs::Dict(d)) => s.contains(d),
            _ => false,
        }
    }
}

impl From<BoxSpace> for Space {
    fn from(s: BoxSpace) -> Self {
        Space::Box(s)
    }
}

impl From<DiscreteSpace> for Space {
    fn from(s: DiscreteSpace) -> Self {
        Space::Discrete(s)
    }
}

impl From<DictSpace> for Space {
    fn from(s: DictSpace) -> Self {
        Space::Dict(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn goal_env_space() -> DictSpace {
        DictSpace::default()
            .with("observation", BoxSpace::unbounded(&[2, 3], DType::F32))
            .with("desired_goal", BoxSpace::unbounded(&[3], DType::F32))
            .with("step", DiscreteSpace::new(10))
    }

    #[test]
    fn test_promote() {
        use DType::*;
        assert_eq!(F32.promote(F32), F32);
        assert_eq!(U8.promote(F32), F32);
        assert_eq!(I32.promote(F32), F64);
        assert_eq!(F32.promote(I64), F64);
        assert_eq!(I32.promote(I64), I64);
        assert_eq!(U8.promote(I32), I32);
        assert_eq!(F64.promote(U8), F64);
    }

    #[test]
    fn test_dict_space_order_and_shape() {
        let space = goal_env_space();
        let keys: Vec<_> = space.keys().collect();
        assert_eq!(keys, vec!["observation", "desired_goal", "step"]);

        let space = Space::from(space);
        assert_eq!(space.shape(), None);
        assert_eq!(space.dtype(), None);

        let dict = space.as_dict().unwrap();
        assert_eq!(dict.get("observation").unwrap().size(), Some(6));
        assert_eq!(dict.get("step").unwrap().size(), Some(1));
        assert_eq!(dict.get("step").unwrap().dtype(), Some(DType::I64));
    }

    #[test]
    fn test_with_replaces_in_place() {
        let space = goal_env_space().with("observation", BoxSpace::unbounded(&[4], DType::F64));
        let keys: Vec<_> = space.keys().collect();
        assert_eq!(keys, vec!["observation", "desired_goal", "step"]);
        assert_eq!(space.get("observation").unwrap().shape(), Some(&[4usize][..]));
    }

    #[test]
    fn test_duplicate_keys() {
        let s = Space::from(BoxSpace::unbounded(&[1], DType::F32));
        let err = DictSpace::new(vec![("a".into(), s.clone()), ("a".into(), s)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DictObsError>(),
            Some(&DictObsError::DuplicateKey("a".into()))
        );
    }

    #[test]
    fn test_deserialize_rejects_duplicate_keys() {
        let yaml = "
spaces:
  - - a
    - type: Discrete
      n: 2
  - - a
    - type: Discrete
      n: 3
";
        assert!(serde_yaml::from_str::<DictSpace>(yaml).is_err());

        let space = goal_env_space().with_aggregate(AggregateInfo {
            shape: vec![10],
            dtype: DType::F32,
        });
        let yaml = serde_yaml::to_string(&space).unwrap();
        assert_eq!(serde_yaml::from_str::<DictSpace>(&yaml).unwrap(), space);
    }

    #[test]
    fn test_aggregate() {
        let space = Space::from(goal_env_space().with_aggregate(AggregateInfo {
            shape: vec![10],
            dtype: DType::F32,
        }));
        assert_eq!(space.shape(), Some(&[10usize][..]));
        assert_eq!(space.dtype(), Some(DType::F32));
    }

    #[test]
    fn test_box_contains() {
        let space = BoxSpace::new(-1.0, 1.0, &[2], DType::F32);
        assert!(space.is_bounded());
        assert!(space.contains(&arr1(&[0.5f32, -1.0]).into_dyn().into()));
        assert!(!space.contains(&arr1(&[0.5f32, 1.5]).into_dyn().into()));
        assert!(!space.contains(&arr1(&[0.5f32]).into_dyn().into()));
        assert!(!BoxSpace::unbounded(&[2], DType::F32).is_bounded());
    }

    #[test]
    fn test_from_bounds() {
        let low = arr1(&[0.0, -1.0]).into_dyn();
        let high = arr1(&[1.0, 1.0]).into_dyn();
        let space = BoxSpace::from_bounds(low, high, DType::F64).unwrap();
        assert_eq!(space.shape(), &[2]);
        assert!(!space.contains(&arr1(&[-0.5f64, 0.0]).into_dyn().into()));

        let low = arr1(&[0.0]).into_dyn();
        let high = arr1(&[1.0, 1.0]).into_dyn();
        assert!(BoxSpace::from_bounds(low, high, DType::F64).is_err());
    }

    #[test]
    fn test_discrete_contains() {
        let space = DiscreteSpace::new(3);
        assert!(space.contains(&ndarray::arr0(2i64).into_dyn().into()));
        assert!(!space.contains(&ndarray::arr0(3i64).into_dyn().into()));
        assert!(!space.contains(&ndarray::arr0(1.0f32).into_dyn().into()));
    }
}
