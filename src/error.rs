use std::io;

use thiserror::Error;

/// Everything that can go wrong while building, decoding or rendering a payload
#[derive(Debug, Error)]
pub enum Error {
    /// Target is neither a 13 digit citizen id nor a 10 digit phone number
    #[error("target {0:?} is neither a 13 digit citizen id nor a 10 digit phone number")]
    TargetFormat(String),

    #[error("amount must not be negative")]
    NegativeAmount,

    /// Amount could not be represented as a decimal (NaN, infinite or out of range)
    #[error("amount {0} is not a finite decimal value")]
    InvalidAmount(String),

    /// Raised by the image renderer, the payload itself is still valid
    #[error("unable to write QR code image: {0}")]
    ImageWrite(#[source] io::Error),

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("checksum mismatch: payload carries {actual}, computed {expected}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl<I: std::fmt::Debug> From<nom::error::Error<I>> for Error {
    fn from(value: nom::error::Error<I>) -> Self {
        Self::Parse(format!("{:?} at {:?}", value.code, value.input))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
