use oxiri::Iri;
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term};
use oxsdatatypes::Decimal;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Prefixes of plain strings that are turned into IRIs when a [Value] is converted into a term.
const IRI_PREFIXES: [&str; 3] = ["http://", "https://", "urn:"];

/// A native value exchanged with user-provided functions.
///
/// Numeric, boolean and string literals are converted to their native representation and IRIs
/// stay IRIs. Everything else (language-tagged strings, blank nodes, literals of other datatypes)
/// is passed through as an opaque [Term].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Iri(NamedNode),
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Boolean(bool),
    Term(Term),
}

impl Value {
    /// Converts an RDF term into its native representation.
    pub fn from_term(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => Self::Iri(node),
            Term::Literal(literal) => Self::from_literal(literal),
            term => Self::Term(term),
        }
    }

    fn from_literal(literal: Literal) -> Self {
        if literal.language().is_some() {
            return Self::Term(literal.into());
        }

        let datatype = literal.datatype();
        let native = if datatype == xsd::STRING {
            Some(Self::String(literal.value().to_owned()))
        } else if datatype == xsd::BOOLEAN {
            match literal.value() {
                "true" | "1" => Some(Self::Boolean(true)),
                "false" | "0" => Some(Self::Boolean(false)),
                _ => None,
            }
        } else if is_integer_datatype(datatype.as_str()) {
            i64::from_str(literal.value()).ok().map(Self::Integer)
        } else if datatype == xsd::DECIMAL {
            Decimal::from_str(literal.value()).ok().map(Self::Decimal)
        } else if datatype == xsd::DOUBLE || datatype == xsd::FLOAT {
            f64::from_str(literal.value()).ok().map(Self::Double)
        } else {
            None
        };
        native.unwrap_or_else(|| Self::Term(literal.into()))
    }

    /// Converts the value into an RDF term.
    ///
    /// Strings that look like IRIs (`http://`, `https://` or `urn:`) become named nodes.
    ///
    /// ```
    /// use rdf_hooks_model::{Literal, NamedNode, Term, Value};
    ///
    /// assert_eq!(
    ///     Value::from("http://example.com/a").into_term(),
    ///     Term::from(NamedNode::new_unchecked("http://example.com/a"))
    /// );
    /// assert_eq!(Value::from(1).into_term(), Term::from(Literal::from(1)));
    /// ```
    pub fn into_term(self) -> Term {
        match self {
            Self::Iri(node) => node.into(),
            Self::String(value) => string_to_term(value),
            Self::Integer(value) => Literal::from(value).into(),
            Self::Decimal(value) => {
                Literal::new_typed_literal(value.to_string(), xsd::DECIMAL).into()
            }
            Self::Double(value) => Literal::from(value).into(),
            Self::Boolean(value) => Literal::from(value).into(),
            Self::Term(term) => term,
        }
    }

    /// Returns the lexical value of strings, IRIs and plain literals.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            Self::Iri(node) => Some(node.as_str()),
            Self::Term(Term::Literal(literal)) => Some(literal.value()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss, reason = "Mirrors xsd:double promotion")]
            Self::Integer(value) => Some(*value as f64),
            Self::Decimal(value) => f64::from_str(&value.to_string()).ok(),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

fn string_to_term(value: String) -> Term {
    let looks_like_iri = IRI_PREFIXES.iter().any(|prefix| value.starts_with(prefix));
    if looks_like_iri && Iri::parse(value.as_str()).is_ok() {
        NamedNode::new_unchecked(value).into()
    } else {
        Literal::new_simple_literal(value).into()
    }
}

fn is_integer_datatype(datatype: &str) -> bool {
    [
        xsd::INTEGER,
        xsd::INT,
        xsd::LONG,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ]
    .iter()
    .any(|candidate| candidate.as_str() == datatype)
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(node) => f.write_str(node.as_str()),
            Self::String(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Term(Term::Literal(literal)) => f.write_str(literal.value()),
            Self::Term(term) => write!(f, "{term}"),
        }
    }
}

impl From<Term> for Value {
    fn from(term: Term) -> Self {
        Self::from_term(term)
    }
}

impl From<NamedNode> for Value {
    fn from(node: NamedNode) -> Self {
        Self::Iri(node)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(
            |_| Self::Term(Literal::new_typed_literal(value.to_string(), xsd::INTEGER).into()),
            Self::Integer,
        )
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, LiteralRef};

    #[test]
    fn literals_become_native_values() {
        assert_eq!(
            Value::from_term(Literal::new_simple_literal("hello").into()),
            Value::String("hello".to_owned())
        );
        assert_eq!(Value::from_term(Literal::from(42).into()), Value::Integer(42));
        assert_eq!(Value::from_term(Literal::from(true).into()), Value::Boolean(true));
        assert_eq!(Value::from_term(Literal::from(1.5).into()), Value::Double(1.5));
        assert_eq!(
            Value::from_term(Literal::new_typed_literal("2.50", xsd::DECIMAL).into()),
            Value::Decimal(Decimal::from_str("2.5").unwrap())
        );
    }

    #[test]
    fn other_terms_stay_opaque() {
        let tagged: Term = Literal::new_language_tagged_literal_unchecked("chat", "fr").into();
        assert_eq!(Value::from_term(tagged.clone()), Value::Term(tagged));

        let bnode: Term = BlankNode::new_unchecked("b1").into();
        assert_eq!(Value::from_term(bnode.clone()), Value::Term(bnode));

        let invalid: Term = Literal::new_typed_literal("abc", xsd::INTEGER).into();
        assert_eq!(Value::from_term(invalid.clone()), Value::Term(invalid));
    }

    #[test]
    fn iri_like_strings_become_named_nodes() {
        assert_eq!(
            Value::from("urn:isbn:123").into_term(),
            Term::from(NamedNode::new_unchecked("urn:isbn:123"))
        );
        assert_eq!(
            Value::from("https://example.com/x").into_term(),
            Term::from(NamedNode::new_unchecked("https://example.com/x"))
        );
        assert_eq!(
            Value::from("http://not an iri").into_term(),
            Term::from(LiteralRef::new_simple_literal("http://not an iri").into_owned())
        );
        assert_eq!(
            Value::from("hello").into_term(),
            Term::from(Literal::new_simple_literal("hello"))
        );
    }

    #[test]
    fn numbers_are_typed() {
        assert_eq!(
            Value::from(0).into_term(),
            Term::from(Literal::new_typed_literal("0", xsd::INTEGER))
        );
        assert_eq!(
            Value::Decimal(Decimal::from(3)).into_term(),
            Term::from(Literal::new_typed_literal("3", xsd::DECIMAL))
        );
    }
}
