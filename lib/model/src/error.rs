use oxiri::IriParseError;
use oxrdf::BlankNodeIdParseError;
use oxsdatatypes::{ParseDateTimeError, ParseDecimalError, TooLargeForDecimalError};
use std::num::{ParseFloatError, ParseIntError, TryFromIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// Result of an expression that may evaluate to an error.
pub type ThinResult<T> = Result<T, ThinError>;

/// The SPARQL expression error.
///
/// A type error, an unbound variable or an overflow all leave the expression without a value
/// and are handled the same way by `FILTER`, `BIND` and the aggregates, so no cause is kept.
#[derive(Clone, Copy, Debug, Default, Error, PartialEq, Eq)]
#[error("The expression has no value")]
pub struct ThinError;

impl ThinError {
    /// Shorthand for `Err(ThinError)`.
    pub fn expected<T>() -> ThinResult<T> {
        Err(ThinError)
    }
}

macro_rules! no_value_on {
    ($($t:ty),+) => {
        $(
            impl From<$t> for ThinError {
                fn from(_: $t) -> Self {
                    ThinError
                }
            }
        )+
    };
}

no_value_on!(
    BlankNodeIdParseError,
    IriParseError,
    ParseBoolError,
    ParseDateTimeError,
    ParseDecimalError,
    ParseFloatError,
    ParseIntError,
    TooLargeForDecimalError,
    TryFromIntError
);
