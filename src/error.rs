use thiserror::Error;

use crate::variable::Role;

pub type Result<T, E = FuzzyError> = std::result::Result<T, E>;

/// Errors raised while configuring or running the inference engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FuzzyError {
    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("no crisp value supplied for input variable `{variable}`")]
    MissingInput { variable: String },

    #[error("variable `{variable}` has no term `{label}`")]
    UnknownTerm { variable: String, label: String },

    /// The aggregated set of an output integrates to zero. The caller
    /// picks the fallback.
    #[error("no rule fired for output variable `{variable}`")]
    NoRuleFired { variable: String },

    #[error("variable `{name}` is an output and cannot take a crisp value")]
    NotAnInput { name: String },

    #[error("crisp value for `{variable}` is not finite: {value}")]
    NonFiniteInput { variable: String, value: f64 },

    #[error("invalid universe [{min}, {max}] with step {step}: {reason}")]
    InvalidUniverse {
        min: f64,
        max: f64,
        step: f64,
        reason: &'static str,
    },

    #[error("invalid triangular membership ({a}, {b}, {c}): expected finite a <= b <= c")]
    InvalidMembership { a: f64, b: f64, c: f64 },

    #[error("duplicate term `{label}` in variable `{variable}`")]
    DuplicateTerm { variable: String, label: String },

    #[error("duplicate variable `{name}`")]
    DuplicateVariable { name: String },

    #[error("rule {rule}: variable `{variable}` is used as {found:?} but declared {declared:?}")]
    RoleMismatch {
        rule: usize,
        variable: String,
        found: Role,
        declared: Role,
    },

    #[error("rule {rule}: {reason}")]
    InvalidConsequence { rule: usize, reason: &'static str },

    #[error("rule {rule}: weight {weight} outside [0, 1]")]
    InvalidWeight { rule: usize, weight: f64 },
}
