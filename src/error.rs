//! Error types for lithology mixing
//!
//! Configuration problems (bad component counts, incompatible porosity models,
//! unknown mixing models) are errors. Numerical degeneracies in value accessors are
//! not: those return [`crate::constants::UNDEFINED_VALUE`] and log a warning. The same
//! degeneracy in a derivative is an error because the solver consumes it as a Jacobian.

use std::path::PathBuf;
use thiserror::Error;

pub type LithologyResult<T> = Result<T, LithologyError>;

#[derive(Error, Debug)]
pub enum LithologyError {
    #[error("wrong number of lithologies: {count} (expected 1 to 3)")]
    WrongComponentCount { count: usize },

    #[error("percentage values incorrect: ({p1}, {p2}, {p3}); each must lie in [0, 100] and sum to 100")]
    InvalidPercentages { p1: f64, p2: f64, p3: f64 },

    #[error("percentage maps incorrect at ({i}, {j}): ({p1}, {p2}, {p3})")]
    InvalidCellPercentages {
        i: usize,
        j: usize,
        p1: f64,
        p2: f64,
        p3: f64,
    },

    #[error("lithologies of {composition} use different porosity models and cannot be mixed")]
    IncompatiblePorosityModels { composition: String },

    #[error("MixModel not defined: {model}")]
    UndefinedMixModel { model: String },

    #[error("layering index {index} outside [0, 1]")]
    InvalidLayeringIndex { index: f64 },

    #[error("could not find simple lithology {name}")]
    UnknownLithology { name: String },

    #[error("fault lithology with {count} components has no permeability derivative")]
    FaultDerivative { count: usize },

    #[error("permeability derivative of {composition} is not finite")]
    NumericDerivative { composition: String },

    #[error("expected {expected} component values, got {actual}")]
    ComponentMismatch { expected: usize, actual: usize },

    #[error("cell ({i}, {j}) outside a {nx} x {ny} formation grid")]
    CellOutOfRange {
        i: usize,
        j: usize,
        nx: usize,
        ny: usize,
    },

    #[error("cell ({i}, {j}) has no lithology")]
    MissingCellLithology { i: usize, j: usize },

    #[error("lithology catalog could not be parsed: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
