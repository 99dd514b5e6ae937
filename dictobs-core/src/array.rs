//! Arrays and observations.
//!
//! [`Array`] is an [`ndarray::ArrayD`] tagged with its element type, which lets
//! observations of different dtypes live in the same dict. [`ArrayDict`] keeps
//! key/array pairs in insertion order, and [`GymObs`] is the observation emitted by
//! environments with either a single array or a dict of arrays.
use crate::{error::DictObsError, space::DType, Obs};
use anyhow::Result;
use ndarray::{Array1, ArrayD};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

/// Applies an expression to the inner array of any variant.
macro_rules! dispatch {
    ($self_:expr, $a:ident => $e:expr) => {
        match $self_ {
            Array::U8($a) => $e,
            Array::I32($a) => $e,
            Array::I64($a) => $e,
            Array::F32($a) => $e,
            Array::F64($a) => $e,
        }
    };
}

/// Applies an expression to the inner array and wraps the result in the same variant.
macro_rules! map_same {
    ($self_:expr, $a:ident => $e:expr) => {
        match $self_ {
            Array::U8($a) => Array::U8($e),
            Array::I32($a) => Array::I32($e),
            Array::I64($a) => Array::I64($e),
            Array::F32($a) => Array::F32($e),
            Array::F64($a) => Array::F64($e),
        }
    };
}

/// An n-dimensional array with a runtime element type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Array {
    /// `u8` array.
    U8(ArrayD<u8>),
    /// `i32` array.
    I32(ArrayD<i32>),
    /// `i64` array.
    I64(ArrayD<i64>),
    /// `f32` array.
    F32(ArrayD<f32>),
    /// `f64` array.
    F64(ArrayD<f64>),
}

impl Array {
    /// Element type.
    pub fn dtype(&self) -> DType {
        match self {
            Array::U8(_) => DType::U8,
            Array::I32(_) => DType::I32,
            Array::I64(_) => DType::I64,
            Array::F32(_) => DType::F32,
            Array::F64(_) => DType::F64,
        }
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns elements in row-major order, converted to `T`.
    pub fn to_flat_vec<T>(&self) -> Vec<T>
    where
        T: 'static + Copy,
        u8: AsPrimitive<T>,
        i32: AsPrimitive<T>,
        i64: AsPrimitive<T>,
        f32: AsPrimitive<T>,
        f64: AsPrimitive<T>,
    {
        dispatch!(self, a => a.iter().map(|&x| x.as_()).collect())
    }

    /// Returns a 1-dimensional array with the elements in row-major order.
    ///
    /// The element type is kept.
    pub fn flatten(&self) -> Array {
        map_same!(self, a => Array1::from_iter(a.iter().cloned()).into_dyn())
    }

    /// Converts elements to the given type.
    pub fn to_dtype(&self, dtype: DType) -> Array {
        if dtype == self.dtype() {
            return self.clone();
        }
        match dtype {
            DType::U8 => Array::U8(self.mapv_as()),
            DType::I32 => Array::I32(self.mapv_as()),
            DType::I64 => Array::I64(self.mapv_as()),
            DType::F32 => Array::F32(self.mapv_as()),
            DType::F64 => Array::F64(self.mapv_as()),
        }
    }

    fn mapv_as<T>(&self) -> ArrayD<T>
    where
        T: 'static + Copy,
        u8: AsPrimitive<T>,
        i32: AsPrimitive<T>,
        i64: AsPrimitive<T>,
        f32: AsPrimitive<T>,
        f64: AsPrimitive<T>,
    {
        dispatch!(self, a => a.mapv(|x| x.as_()))
    }

    /// Concatenates arrays into a 1-dimensional array.
    ///
    /// Each array is flattened in row-major order. The element type of the result is
    /// the promotion of the element types of `arrays` (see [`DType::promote`]).
    /// An empty input gives an empty `f32` array.
    pub fn concatenate(arrays: &[&Array]) -> Array {
        let dtype = arrays
            .iter()
            .map(|a| a.dtype())
            .reduce(DType::promote)
            .unwrap_or(DType::F32);

        match dtype {
            DType::U8 => Array::U8(concat_as(arrays)),
            DType::I32 => Array::I32(concat_as(arrays)),
            DType::I64 => Array::I64(concat_as(arrays)),
            DType::F32 => Array::F32(concat_as(arrays)),
            DType::F64 => Array::F64(concat_as(arrays)),
        }
    }

    /// Returns the inner `f32` array.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Array::F32(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the inner `f64` array.
    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Array::F64(a) => Some(a),
            _ => None,
        }
    }
}

fn concat_as<T>(arrays: &[&Array]) -> ArrayD<T>
where
    T: 'static + Copy,
    u8: AsPrimitive<T>,
    i32: AsPrimitive<T>,
    i64: AsPrimitive<T>,
    f32: AsPrimitive<T>,
    f64: AsPrimitive<T>,
{
    Array1::from_iter(arrays.iter().flat_map(|a| a.to_flat_vec::<T>())).into_dyn()
}

macro_rules! impl_from_arrayd {
    ($t:ty, $variant:ident) => {
        impl From<ArrayD<$t>> for Array {
            fn from(a: ArrayD<$t>) -> Self {
                Array::$variant(a)
            }
        }
    };
}

impl_from_arrayd!(u8, U8);
impl_from_arrayd!(i32, I32);
impl_from_arrayd!(i64, I64);
impl_from_arrayd!(f32, F32);
impl_from_arrayd!(f64, F64);

/// Arrays indexed by keys, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayDict(pub Vec<(String, Array)>);

impl ArrayDict {
    /// Creates an empty dict.
    pub fn new() -> Self {
        Self(vec![])
    }

    /// Sets the array of `key`.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Array>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Returns the array of `key`.
    pub fn get(&self, key: &str) -> Option<&Array> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes and returns the array of `key`.
    pub fn remove(&mut self, key: &str) -> Option<Array> {
        let ix = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(ix).1)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over keys and arrays in order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Array)> {
        self.0.iter()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> std::iter::FromIterator<(K, Array)> for ArrayDict {
    fn from_iter<I: IntoIterator<Item = (K, Array)>>(iter: I) -> Self {
        let mut dict = ArrayDict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl IntoIterator for ArrayDict {
    type Item = (String, Array);
    type IntoIter = std::vec::IntoIter<(String, Array)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Observation of an environment: an array or a dict of arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GymObs {
    /// Array observation.
    Array(Array),

    /// Dict observation.
    Dict(ArrayDict),
}

impl GymObs {
    /// Returns the array, if the observation is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            GymObs::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the dict, if the observation is a dict.
    pub fn as_dict(&self) -> Option<&ArrayDict> {
        match self {
            GymObs::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Takes the dict out of the observation.
    ///
    /// Fails with [`DictObsError::NotADict`] for array observations.
    pub fn into_dict(self) -> Result<ArrayDict> {
        match self {
            GymObs::Dict(d) => Ok(d),
            GymObs::Array(_) => Err(DictObsError::NotADict.into()),
        }
    }
}

impl Obs for GymObs {}

impl From<Array> for GymObs {
    fn from(a: Array) -> Self {
        GymObs::Array(a)
    }
}

impl From<ArrayDict> for GymObs {
    fn from(d: ArrayDict) -> Self {
        GymObs::Dict(d)
    }
}
