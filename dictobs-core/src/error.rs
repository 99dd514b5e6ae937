//! Errors in the library.
use crate::space::DType;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum DictObsError {
    /// A key is missing in a dict space or in a dict observation.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A key appears more than once.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Selected sub-spaces have different element types.
    #[error("DType mismatch at key {key}: expected {expected}, found {found}")]
    DTypeMismatch {
        /// Key of the offending sub-space.
        key: String,
        /// DType of the first selected sub-space.
        expected: DType,
        /// DType of the offending sub-space.
        found: DType,
    },

    /// The observation given to a dict filter is not a dict.
    #[error("Observation is not a dict")]
    NotADict,

    /// The space is not of the expected kind.
    #[error("Space type mismatch: expected {0}")]
    SpaceTypeMismatch(String),

    /// A sub-space has no shape or dtype.
    #[error("Shape is not available for the space at key {0}")]
    ShapeUnavailable(String),

    /// The shape of data does not match the given shape.
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
