use thiserror::Error;

/// Reasons a selection payload cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Payload does not start with the verification prefix")]
    MissingPrefix,

    #[error("Payload has {0} fields, expected 3")]
    WrongFieldCount(usize),

    #[error("Payload field is empty")]
    EmptyField,
}
