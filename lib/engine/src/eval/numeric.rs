use rdf_hooks_model::vocab::xsd;
use rdf_hooks_model::{Decimal, Literal, Term, ThinError, ThinResult};
use std::cmp::Ordering;
use std::str::FromStr;

const INTEGER_DATATYPES: [&str; 13] = [
    "http://www.w3.org/2001/XMLSchema#integer",
    "http://www.w3.org/2001/XMLSchema#int",
    "http://www.w3.org/2001/XMLSchema#long",
    "http://www.w3.org/2001/XMLSchema#short",
    "http://www.w3.org/2001/XMLSchema#byte",
    "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
    "http://www.w3.org/2001/XMLSchema#nonPositiveInteger",
    "http://www.w3.org/2001/XMLSchema#negativeInteger",
    "http://www.w3.org/2001/XMLSchema#positiveInteger",
    "http://www.w3.org/2001/XMLSchema#unsignedInt",
    "http://www.w3.org/2001/XMLSchema#unsignedLong",
    "http://www.w3.org/2001/XMLSchema#unsignedShort",
    "http://www.w3.org/2001/XMLSchema#unsignedByte",
];

/// A numeric value following the XSD type promotion rules (integer < decimal < double).
///
/// `xsd:float` is handled as `xsd:double`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Numeric {
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
}

impl Numeric {
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::Literal(literal) => Self::from_literal(literal),
            _ => None,
        }
    }

    pub fn from_literal(literal: &Literal) -> Option<Self> {
        let datatype = literal.datatype();
        let value = literal.value();
        if INTEGER_DATATYPES.contains(&datatype.as_str()) {
            i64::from_str(value).ok().map(Self::Integer)
        } else if datatype == xsd::DECIMAL {
            Decimal::from_str(value).ok().map(Self::Decimal)
        } else if datatype == xsd::DOUBLE || datatype == xsd::FLOAT {
            parse_double(value).map(Self::Double)
        } else {
            None
        }
    }

    pub fn is_numeric_datatype(literal: &Literal) -> bool {
        let datatype = literal.datatype();
        INTEGER_DATATYPES.contains(&datatype.as_str())
            || datatype == xsd::DECIMAL
            || datatype == xsd::DOUBLE
            || datatype == xsd::FLOAT
    }

    pub fn into_term(self) -> Term {
        match self {
            Self::Integer(value) => Literal::from(value).into(),
            Self::Decimal(value) => {
                Literal::new_typed_literal(value.to_string(), xsd::DECIMAL).into()
            }
            Self::Double(value) => Literal::from(value).into(),
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss, reason = "xsd:integer to xsd:double promotion")]
            Self::Integer(value) => value as f64,
            Self::Decimal(value) => f64::from_str(&value.to_string()).unwrap_or(f64::NAN),
            Self::Double(value) => value,
        }
    }

    fn to_decimal(self) -> ThinResult<Decimal> {
        match self {
            Self::Integer(value) => Ok(Decimal::from(value)),
            Self::Decimal(value) => Ok(value),
            Self::Double(_) => ThinError::expected(),
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Integer(_) => 0,
            Self::Decimal(_) => 1,
            Self::Double(_) => 2,
        }
    }

    /// Promotes both operands to their common type.
    fn promote(self, other: Self) -> ThinResult<(Self, Self)> {
        Ok(match self.rank().max(other.rank()) {
            0 => (self, other),
            1 => (
                Self::Decimal(self.to_decimal()?),
                Self::Decimal(other.to_decimal()?),
            ),
            _ => (Self::Double(self.to_f64()), Self::Double(other.to_f64())),
        })
    }

    pub fn add(self, other: Self) -> ThinResult<Self> {
        match self.promote(other)? {
            (Self::Integer(a), Self::Integer(b)) => a.checked_add(b).map(Self::Integer),
            (Self::Decimal(a), Self::Decimal(b)) => a.checked_add(b).map(Self::Decimal),
            (a, b) => Some(Self::Double(a.to_f64() + b.to_f64())),
        }
        .ok_or(ThinError::default())
    }

    pub fn subtract(self, other: Self) -> ThinResult<Self> {
        match self.promote(other)? {
            (Self::Integer(a), Self::Integer(b)) => a.checked_sub(b).map(Self::Integer),
            (Self::Decimal(a), Self::Decimal(b)) => a.checked_sub(b).map(Self::Decimal),
            (a, b) => Some(Self::Double(a.to_f64() - b.to_f64())),
        }
        .ok_or(ThinError::default())
    }

    pub fn multiply(self, other: Self) -> ThinResult<Self> {
        match self.promote(other)? {
            (Self::Integer(a), Self::Integer(b)) => a.checked_mul(b).map(Self::Integer),
            (Self::Decimal(a), Self::Decimal(b)) => a.checked_mul(b).map(Self::Decimal),
            (a, b) => Some(Self::Double(a.to_f64() * b.to_f64())),
        }
        .ok_or(ThinError::default())
    }

    /// Divides both values. Integer division yields a decimal.
    pub fn divide(self, other: Self) -> ThinResult<Self> {
        match self.promote(other)? {
            (Self::Integer(a), Self::Integer(b)) => {
                Decimal::from(a).checked_div(Decimal::from(b)).map(Self::Decimal)
            }
            (Self::Decimal(a), Self::Decimal(b)) => a.checked_div(b).map(Self::Decimal),
            (a, b) => Some(Self::Double(a.to_f64() / b.to_f64())),
        }
        .ok_or(ThinError::default())
    }

    pub fn negate(self) -> ThinResult<Self> {
        match self {
            Self::Integer(value) => value.checked_neg().map(Self::Integer),
            Self::Decimal(value) => Decimal::from(0).checked_sub(value).map(Self::Decimal),
            Self::Double(value) => Some(Self::Double(-value)),
        }
        .ok_or(ThinError::default())
    }

    pub fn abs(self) -> ThinResult<Self> {
        match self {
            Self::Integer(value) => value.checked_abs().map(Self::Integer),
            Self::Decimal(value) if value < Decimal::from(0) => {
                Decimal::from(0).checked_sub(value).map(Self::Decimal)
            }
            Self::Decimal(_) => Some(self),
            Self::Double(value) => Some(Self::Double(value.abs())),
        }
        .ok_or(ThinError::default())
    }

    pub fn ceil(self) -> ThinResult<Self> {
        self.map_fraction(f64::ceil)
    }

    pub fn floor(self) -> ThinResult<Self> {
        self.map_fraction(f64::floor)
    }

    /// Rounds half values towards positive infinity.
    pub fn round(self) -> ThinResult<Self> {
        self.map_fraction(|value| (value + 0.5).floor())
    }

    fn map_fraction(self, operation: impl Fn(f64) -> f64) -> ThinResult<Self> {
        match self {
            Self::Integer(_) => Ok(self),
            Self::Decimal(value) => {
                let value = operation(f64::from_str(&value.to_string())?);
                Ok(Self::Decimal(Decimal::from_str(&format!("{value}"))?))
            }
            Self::Double(value) => Ok(Self::Double(operation(value))),
        }
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        match self.promote(other).ok()? {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(&b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            Self::Integer(value) => value != 0,
            Self::Decimal(value) => value != Decimal::from(0),
            Self::Double(value) => value != 0.0 && !value.is_nan(),
        }
    }
}

/// Parses an `xsd:double` lexical form, including `INF`, `-INF` and `NaN`.
pub(crate) fn parse_double(value: &str) -> Option<f64> {
    match value {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => f64::from_str(value).ok(),
    }
}
