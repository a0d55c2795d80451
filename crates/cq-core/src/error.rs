use thiserror::Error;

/// Errors raised while combining or compiling queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two queries over different classes cannot be combined.
    #[error("inconsistent class: cannot combine '{left}' with '{right}'")]
    InconsistentClass { left: String, right: String },

    /// A constraint operand has no wire representation.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodeError),
}

/// Failures turning a [`Value`](crate::Value) into its wire form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("non-finite number {0} has no wire representation")]
    NonFiniteNumber(f64),

    #[error("invalid geo point: latitude {latitude}, longitude {longitude}")]
    InvalidGeoPoint { latitude: f64, longitude: f64 },

    #[error("reference to an unsaved object of class '{0}'")]
    UnsavedObject(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
