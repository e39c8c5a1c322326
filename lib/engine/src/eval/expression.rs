use crate::eval::numeric::{parse_double, Numeric};
use crate::eval::{ActiveGraph, EvalContext, SimpleEvaluator};
use crate::plan::AlgebraNode;
use crate::solution::Solution;
use md5::{Digest, Md5};
use rdf_hooks_model::vocab::{rdf, xsd};
use rdf_hooks_model::{
    BlankNode, DateTime, Decimal, Literal, NamedNode, Term, ThinError, ThinResult,
};
use regex::{Regex, RegexBuilder};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use spargebra::algebra::{Expression, Function, OrderExpression};
use std::cmp::Ordering;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const REGEX_SIZE_LIMIT: usize = 1_000_000;

impl SimpleEvaluator {
    /// Evaluates `expression` against `solution`.
    ///
    /// Errors are SPARQL expression errors (unbound variables, type errors, ...) and carry no
    /// further information.
    pub fn evaluate_expression(
        &self,
        expression: &Expression,
        solution: &Solution,
        graph: &ActiveGraph,
    ) -> ThinResult<Term> {
        let eval = |expression: &Expression| self.evaluate_expression(expression, solution, graph);
        let ebv = |expression: &Expression| eval(expression).and_then(|t| effective_boolean_value(&t));

        match expression {
            Expression::NamedNode(node) => Ok(node.clone().into()),
            Expression::Literal(literal) => Ok(literal.clone().into()),
            Expression::Variable(variable) => {
                solution.get(variable).cloned().ok_or(ThinError::default())
            }
            Expression::Or(lhs, rhs) => match ebv(lhs) {
                Ok(true) => Ok(boolean(true)),
                lhs => match (lhs, ebv(rhs)?) {
                    (_, true) => Ok(boolean(true)),
                    (Ok(false), false) => Ok(boolean(false)),
                    _ => ThinError::expected(),
                },
            },
            Expression::And(lhs, rhs) => match ebv(lhs) {
                Ok(false) => Ok(boolean(false)),
                lhs => match (lhs, ebv(rhs)?) {
                    (_, false) => Ok(boolean(false)),
                    (Ok(true), true) => Ok(boolean(true)),
                    _ => ThinError::expected(),
                },
            },
            Expression::Equal(lhs, rhs) => equals(&eval(lhs)?, &eval(rhs)?).map(boolean),
            Expression::SameTerm(lhs, rhs) => Ok(boolean(eval(lhs)? == eval(rhs)?)),
            Expression::Greater(lhs, rhs) => {
                compare(&eval(lhs)?, &eval(rhs)?).map(|o| boolean(o == Ordering::Greater))
            }
            Expression::GreaterOrEqual(lhs, rhs) => {
                compare(&eval(lhs)?, &eval(rhs)?).map(|o| boolean(o != Ordering::Less))
            }
            Expression::Less(lhs, rhs) => {
                compare(&eval(lhs)?, &eval(rhs)?).map(|o| boolean(o == Ordering::Less))
            }
            Expression::LessOrEqual(lhs, rhs) => {
                compare(&eval(lhs)?, &eval(rhs)?).map(|o| boolean(o != Ordering::Greater))
            }
            Expression::In(needle, haystack) => {
                let needle = eval(needle)?;
                let mut has_error = false;
                for candidate in haystack {
                    match eval(candidate).and_then(|candidate| equals(&needle, &candidate)) {
                        Ok(true) => return Ok(boolean(true)),
                        Ok(false) => {}
                        Err(_) => has_error = true,
                    }
                }
                if has_error {
                    ThinError::expected()
                } else {
                    Ok(boolean(false))
                }
            }
            Expression::Add(lhs, rhs) => numeric(&eval(lhs)?)?
                .add(numeric(&eval(rhs)?)?)
                .map(Numeric::into_term),
            Expression::Subtract(lhs, rhs) => numeric(&eval(lhs)?)?
                .subtract(numeric(&eval(rhs)?)?)
                .map(Numeric::into_term),
            Expression::Multiply(lhs, rhs) => numeric(&eval(lhs)?)?
                .multiply(numeric(&eval(rhs)?)?)
                .map(Numeric::into_term),
            Expression::Divide(lhs, rhs) => numeric(&eval(lhs)?)?
                .divide(numeric(&eval(rhs)?)?)
                .map(Numeric::into_term),
            Expression::UnaryPlus(inner) => Ok(numeric(&eval(inner)?)?.into_term()),
            Expression::UnaryMinus(inner) => numeric(&eval(inner)?)?.negate().map(Numeric::into_term),
            Expression::Not(inner) => Ok(boolean(!ebv(inner)?)),
            Expression::Exists(pattern) => {
                let node = AlgebraNode::compile(pattern).map_err(|_| ThinError::default())?;
                let context = EvalContext {
                    solution: solution.clone(),
                    graph: graph.clone(),
                };
                match self.evaluate(&node, &context).next() {
                    None => Ok(boolean(false)),
                    Some(Ok(_)) => Ok(boolean(true)),
                    Some(Err(_)) => ThinError::expected(),
                }
            }
            Expression::Bound(variable) => Ok(boolean(solution.contains(variable))),
            Expression::If(condition, then, otherwise) => {
                if ebv(condition)? {
                    eval(then)
                } else {
                    eval(otherwise)
                }
            }
            Expression::Coalesce(alternatives) => alternatives
                .iter()
                .find_map(|alternative| eval(alternative).ok())
                .ok_or(ThinError::default()),
            Expression::FunctionCall(function, args) => {
                self.evaluate_function(function, args, solution, graph)
            }
        }
    }

    /// Sorts `solutions` by the given keys. Keys that fail to evaluate sort like unbound ones.
    pub(crate) fn order_solutions(
        &self,
        solutions: Vec<Solution>,
        expression: &[OrderExpression],
        graph: &ActiveGraph,
    ) -> Vec<Solution> {
        let mut keyed = solutions
            .into_iter()
            .map(|solution| {
                let keys = expression
                    .iter()
                    .map(|key| {
                        let (OrderExpression::Asc(key) | OrderExpression::Desc(key)) = key;
                        self.evaluate_expression(key, &solution, graph).ok()
                    })
                    .collect::<Vec<_>>();
                (keys, solution)
            })
            .collect::<Vec<_>>();
        keyed.sort_by(|(lhs, _), (rhs, _)| {
            expression
                .iter()
                .zip(lhs.iter().zip(rhs))
                .map(|(key, (lhs, rhs))| {
                    let ordering = order_terms(lhs.as_ref(), rhs.as_ref());
                    match key {
                        OrderExpression::Asc(_) => ordering,
                        OrderExpression::Desc(_) => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        keyed.into_iter().map(|(_, solution)| solution).collect()
    }

    fn evaluate_function(
        &self,
        function: &Function,
        args: &[Expression],
        solution: &Solution,
        graph: &ActiveGraph,
    ) -> ThinResult<Term> {
        let arg = |index: usize| -> ThinResult<Term> {
            let expression = args.get(index).ok_or(ThinError::default())?;
            self.evaluate_expression(expression, solution, graph)
        };

        match function {
            Function::Str => match arg(0)? {
                Term::NamedNode(node) => Ok(simple(node.into_string())),
                Term::Literal(literal) => Ok(simple(literal.value())),
                Term::BlankNode(_) => ThinError::expected(),
            },
            Function::Lang => match arg(0)? {
                Term::Literal(literal) => Ok(simple(literal.language().unwrap_or_default())),
                _ => ThinError::expected(),
            },
            Function::LangMatches => {
                let tag = simple_string(&arg(0)?)?;
                let range = simple_string(&arg(1)?)?;
                Ok(boolean(lang_matches(&tag, &range)))
            }
            Function::Datatype => match arg(0)? {
                Term::Literal(literal) => Ok(literal.datatype().into_owned().into()),
                _ => ThinError::expected(),
            },
            Function::Iri => match arg(0)? {
                Term::NamedNode(node) => Ok(node.into()),
                Term::Literal(literal) => {
                    let value = simple_string(&Term::Literal(literal))?;
                    let iri = match self.base_iri() {
                        Some(base) => NamedNode::new_unchecked(base.resolve(&value)?.into_inner()),
                        None => NamedNode::new(value)?,
                    };
                    Ok(iri.into())
                }
                Term::BlankNode(_) => ThinError::expected(),
            },
            Function::BNode => match args.first() {
                None => Ok(BlankNode::default().into()),
                Some(_) => {
                    simple_string(&arg(0)?)?;
                    Ok(BlankNode::default().into())
                }
            },
            Function::Rand => Ok(Literal::from(rand::random::<f64>()).into()),
            Function::Abs => numeric(&arg(0)?)?.abs().map(Numeric::into_term),
            Function::Ceil => numeric(&arg(0)?)?.ceil().map(Numeric::into_term),
            Function::Floor => numeric(&arg(0)?)?.floor().map(Numeric::into_term),
            Function::Round => numeric(&arg(0)?)?.round().map(Numeric::into_term),
            Function::Concat => {
                let mut result = String::new();
                let mut language: Option<Option<String>> = None;
                for index in 0..args.len() {
                    let (value, value_language) = string_with_language(&arg(index)?)?;
                    result.push_str(&value);
                    language = match language {
                        None => Some(value_language),
                        Some(previous) if previous == value_language => Some(previous),
                        Some(_) => Some(None),
                    };
                }
                Ok(string_literal(result, language.flatten()))
            }
            Function::SubStr => {
                let (value, language) = string_with_language(&arg(0)?)?;
                let start = numeric(&arg(1)?)?.round()?.to_f64();
                let length = match args.get(2) {
                    Some(_) => Some(numeric(&arg(2)?)?.round()?.to_f64()),
                    None => None,
                };
                let substring = value
                    .chars()
                    .zip(1_u32..)
                    .filter(|(_, position)| {
                        let position = f64::from(*position);
                        position >= start && length.map_or(true, |length| position < start + length)
                    })
                    .map(|(c, _)| c)
                    .collect::<String>();
                Ok(string_literal(substring, language))
            }
            Function::StrLen => {
                let (value, _) = string_with_language(&arg(0)?)?;
                Ok(Literal::from(i64::try_from(value.chars().count())?).into())
            }
            Function::Replace => {
                let (value, language) = string_with_language(&arg(0)?)?;
                let pattern = simple_string(&arg(1)?)?;
                let replacement = simple_string(&arg(2)?)?;
                let flags = match args.get(3) {
                    Some(_) => simple_string(&arg(3)?)?,
                    None => String::new(),
                };
                let regex = compile_regex(&pattern, &flags)?;
                let replaced = regex.replace_all(&value, replacement.as_str()).into_owned();
                Ok(string_literal(replaced, language))
            }
            Function::UCase => {
                let (value, language) = string_with_language(&arg(0)?)?;
                Ok(string_literal(value.to_uppercase(), language))
            }
            Function::LCase => {
                let (value, language) = string_with_language(&arg(0)?)?;
                Ok(string_literal(value.to_lowercase(), language))
            }
            Function::EncodeForUri => {
                let (value, _) = string_with_language(&arg(0)?)?;
                Ok(simple(encode_for_uri(&value)))
            }
            Function::Contains => {
                let (value, needle) = compatible_strings(&arg(0)?, &arg(1)?)?;
                Ok(boolean(value.0.contains(&needle)))
            }
            Function::StrStarts => {
                let (value, needle) = compatible_strings(&arg(0)?, &arg(1)?)?;
                Ok(boolean(value.0.starts_with(&needle)))
            }
            Function::StrEnds => {
                let (value, needle) = compatible_strings(&arg(0)?, &arg(1)?)?;
                Ok(boolean(value.0.ends_with(&needle)))
            }
            Function::StrBefore => {
                let ((value, language), needle) = compatible_strings(&arg(0)?, &arg(1)?)?;
                Ok(match value.find(&needle) {
                    Some(position) => string_literal(value[..position].to_owned(), language),
                    None => simple(""),
                })
            }
            Function::StrAfter => {
                let ((value, language), needle) = compatible_strings(&arg(0)?, &arg(1)?)?;
                Ok(match value.find(&needle) {
                    Some(position) => {
                        string_literal(value[position + needle.len()..].to_owned(), language)
                    }
                    None => simple(""),
                })
            }
            Function::Year => Ok(Literal::from(DateTimeParts::from_term(&arg(0)?)?.year).into()),
            Function::Month => Ok(Literal::from(DateTimeParts::from_term(&arg(0)?)?.month).into()),
            Function::Day => Ok(Literal::from(DateTimeParts::from_term(&arg(0)?)?.day).into()),
            Function::Hours => Ok(Literal::from(DateTimeParts::from_term(&arg(0)?)?.hour).into()),
            Function::Minutes => {
                Ok(Literal::from(DateTimeParts::from_term(&arg(0)?)?.minute).into())
            }
            Function::Seconds => Ok(Numeric::Decimal(DateTimeParts::from_term(&arg(0)?)?.second)
                .into_term()),
            Function::Timezone => {
                let offset = DateTimeParts::from_term(&arg(0)?)?
                    .timezone_offset()
                    .ok_or(ThinError::default())?;
                Ok(Literal::new_typed_literal(
                    day_time_duration(offset),
                    NamedNode::new_unchecked(
                        "http://www.w3.org/2001/XMLSchema#dayTimeDuration",
                    ),
                )
                .into())
            }
            Function::Tz => Ok(simple(DateTimeParts::from_term(&arg(0)?)?.timezone)),
            Function::Now => Ok(self.inner.now.clone()),
            Function::Uuid => Ok(NamedNode::new_unchecked(format!(
                "urn:uuid:{}",
                Uuid::new_v4()
            ))
            .into()),
            Function::StrUuid => Ok(simple(Uuid::new_v4().to_string())),
            Function::Md5 => hash::<Md5>(&arg(0)?),
            Function::Sha1 => hash::<Sha1>(&arg(0)?),
            Function::Sha256 => hash::<Sha256>(&arg(0)?),
            Function::Sha384 => hash::<Sha384>(&arg(0)?),
            Function::Sha512 => hash::<Sha512>(&arg(0)?),
            Function::StrLang => {
                let value = simple_string(&arg(0)?)?;
                let language = simple_string(&arg(1)?)?;
                Literal::new_language_tagged_literal(value, language)
                    .map(Into::into)
                    .map_err(|_| ThinError::default())
            }
            Function::StrDt => {
                let value = simple_string(&arg(0)?)?;
                let Term::NamedNode(datatype) = arg(1)? else {
                    return ThinError::expected();
                };
                Ok(Literal::new_typed_literal(value, datatype).into())
            }
            Function::IsIri => Ok(boolean(arg(0)?.is_named_node())),
            Function::IsBlank => Ok(boolean(arg(0)?.is_blank_node())),
            Function::IsLiteral => Ok(boolean(arg(0)?.is_literal())),
            Function::IsNumeric => Ok(boolean(Numeric::from_term(&arg(0)?).is_some())),
            Function::Regex => {
                let (value, _) = string_with_language(&arg(0)?)?;
                let pattern = simple_string(&arg(1)?)?;
                let flags = match args.get(2) {
                    Some(_) => simple_string(&arg(2)?)?,
                    None => String::new(),
                };
                Ok(boolean(compile_regex(&pattern, &flags)?.is_match(&value)))
            }
            Function::Custom(function) => {
                if args.len() != 1 {
                    return ThinError::expected();
                }
                cast(function, arg(0)?)
            }
        }
    }
}

/// Computes the effective boolean value of a term.
pub(crate) fn effective_boolean_value(term: &Term) -> ThinResult<bool> {
    let Term::Literal(literal) = term else {
        return ThinError::expected();
    };
    if literal.datatype() == xsd::BOOLEAN {
        return Ok(matches!(literal.value(), "true" | "1"));
    }
    if literal.datatype() == xsd::STRING {
        return Ok(!literal.value().is_empty());
    }
    if Numeric::is_numeric_datatype(literal) {
        return Ok(Numeric::from_literal(literal).is_some_and(Numeric::is_truthy));
    }
    ThinError::expected()
}

/// The total order used by `ORDER BY`: unbound, blank nodes, IRIs, then literals.
pub(crate) fn order_terms(lhs: Option<&Term>, rhs: Option<&Term>) -> Ordering {
    let (lhs, rhs) = match (lhs, rhs) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(lhs), Some(rhs)) => (lhs, rhs),
    };
    match (lhs, rhs) {
        (Term::BlankNode(a), Term::BlankNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::BlankNode(_), _) => Ordering::Less,
        (_, Term::BlankNode(_)) => Ordering::Greater,
        (Term::NamedNode(a), Term::NamedNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::NamedNode(_), _) => Ordering::Less,
        (_, Term::NamedNode(_)) => Ordering::Greater,
        (Term::Literal(a), Term::Literal(b)) => compare(lhs, rhs).unwrap_or_else(|_| {
            a.value()
                .cmp(b.value())
                .then_with(|| a.datatype().as_str().cmp(b.datatype().as_str()))
                .then_with(|| a.language().cmp(&b.language()))
        }),
    }
}

/// SPARQL `=`: value equality for comparable literals, term equality otherwise.
pub(crate) fn equals(lhs: &Term, rhs: &Term) -> ThinResult<bool> {
    match (lhs, rhs) {
        (Term::Literal(a), Term::Literal(b)) => {
            if a == b {
                return Ok(true);
            }
            if let (Some(a), Some(b)) = (Numeric::from_literal(a), Numeric::from_literal(b)) {
                return Ok(a.compare(b) == Some(Ordering::Equal));
            }
            if is_known_datatype(a) && is_known_datatype(b) {
                return match compare(lhs, rhs) {
                    Ok(ordering) => Ok(ordering == Ordering::Equal),
                    Err(_) => Ok(false),
                };
            }
            ThinError::expected()
        }
        _ => Ok(lhs == rhs),
    }
}

/// Compares two literals of compatible types.
pub(crate) fn compare(lhs: &Term, rhs: &Term) -> ThinResult<Ordering> {
    let (Term::Literal(a), Term::Literal(b)) = (lhs, rhs) else {
        return ThinError::expected();
    };
    if let (Some(a), Some(b)) = (Numeric::from_literal(a), Numeric::from_literal(b)) {
        return a.compare(b).ok_or(ThinError::default());
    }
    if a.datatype() != b.datatype() {
        return ThinError::expected();
    }
    let datatype = a.datatype();
    if datatype == xsd::STRING {
        Ok(a.value().cmp(b.value()))
    } else if datatype == rdf::LANG_STRING {
        if a.language() == b.language() {
            Ok(a.value().cmp(b.value()))
        } else {
            ThinError::expected()
        }
    } else if datatype == xsd::BOOLEAN {
        let a = matches!(a.value(), "true" | "1");
        let b = matches!(b.value(), "true" | "1");
        Ok(a.cmp(&b))
    } else if datatype == xsd::DATE_TIME {
        DateTime::from_str(a.value())?
            .partial_cmp(&DateTime::from_str(b.value())?)
            .ok_or(ThinError::default())
    } else {
        ThinError::expected()
    }
}

fn is_known_datatype(literal: &Literal) -> bool {
    let datatype = literal.datatype();
    datatype == xsd::STRING
        || datatype == rdf::LANG_STRING
        || datatype == xsd::BOOLEAN
        || datatype == xsd::DATE_TIME
        || Numeric::is_numeric_datatype(literal)
}

/// The value of `NOW()`, fixed for a whole evaluation.
pub(crate) fn now() -> Term {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seconds = i64::try_from(elapsed.as_secs()).unwrap_or_default();
    let (year, month, day) = civil_from_days(seconds.div_euclid(86_400));
    let time = seconds.rem_euclid(86_400);
    let lexical = format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        time / 3600,
        time % 3600 / 60,
        time % 60,
        elapsed.subsec_millis()
    );
    Literal::new_typed_literal(lexical, xsd::DATE_TIME).into()
}

/// Converts days since the unix epoch into a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// The components of an `xsd:dateTime` or `xsd:date` lexical form.
struct DateTimeParts {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: Decimal,
    /// `Z`, `+hh:mm`, `-hh:mm` or empty.
    timezone: String,
}

impl DateTimeParts {
    fn from_term(term: &Term) -> ThinResult<Self> {
        let Term::Literal(literal) = term else {
            return ThinError::expected();
        };
        let value = literal.value();
        if literal.datatype() == xsd::DATE_TIME {
            DateTime::from_str(value)?;
        } else if literal.datatype() != xsd::DATE {
            return ThinError::expected();
        }

        let (value, timezone) = split_timezone(value);
        let (date, time) = value.split_once('T').unwrap_or((value, "00:00:00"));
        let (negative_year, date) = match date.strip_prefix('-') {
            Some(date) => (true, date),
            None => (false, date),
        };
        let mut date_parts = date.splitn(3, '-');
        let mut time_parts = time.splitn(3, ':');
        let next_integer = |part: Option<&str>| -> ThinResult<i64> {
            Ok(i64::from_str(part.ok_or(ThinError::default())?)?)
        };
        let year = next_integer(date_parts.next())?;
        Ok(Self {
            year: if negative_year { -year } else { year },
            month: next_integer(date_parts.next())?,
            day: next_integer(date_parts.next())?,
            hour: next_integer(time_parts.next())?,
            minute: next_integer(time_parts.next())?,
            second: Decimal::from_str(time_parts.next().ok_or(ThinError::default())?)?,
            timezone: timezone.to_owned(),
        })
    }

    /// The timezone offset in minutes.
    fn timezone_offset(&self) -> Option<i64> {
        if self.timezone == "Z" {
            return Some(0);
        }
        let (sign, offset) = match self.timezone.strip_prefix('+') {
            Some(offset) => (1, offset),
            None => (-1, self.timezone.strip_prefix('-')?),
        };
        let (hours, minutes) = offset.split_once(':')?;
        Some(sign * (i64::from_str(hours).ok()? * 60 + i64::from_str(minutes).ok()?))
    }
}

fn split_timezone(value: &str) -> (&str, &str) {
    if let Some(value) = value.strip_suffix('Z') {
        return (value, "Z");
    }
    let bytes = value.as_bytes();
    if bytes.len() > 6
        && matches!(bytes[bytes.len() - 6], b'+' | b'-')
        && bytes[bytes.len() - 3] == b':'
    {
        return value.split_at(value.len() - 6);
    }
    (value, "")
}

fn day_time_duration(offset_minutes: i64) -> String {
    if offset_minutes == 0 {
        return "PT0S".to_owned();
    }
    let sign = if offset_minutes < 0 { "-" } else { "" };
    let hours = offset_minutes.abs() / 60;
    let minutes = offset_minutes.abs() % 60;
    match (hours, minutes) {
        (hours, 0) => format!("{sign}PT{hours}H"),
        (0, minutes) => format!("{sign}PT{minutes}M"),
        (hours, minutes) => format!("{sign}PT{hours}H{minutes}M"),
    }
}

fn cast(datatype: &NamedNode, value: Term) -> ThinResult<Term> {
    let lexical = match &value {
        Term::Literal(literal) => literal.value().to_owned(),
        Term::NamedNode(node) if datatype.as_ref() == xsd::STRING => node.as_str().to_owned(),
        _ => return ThinError::expected(),
    };
    let number = Numeric::from_term(&value);
    let as_boolean = match &value {
        Term::Literal(literal) if literal.datatype() == xsd::BOOLEAN => {
            Some(matches!(literal.value(), "true" | "1"))
        }
        _ => None,
    };

    let datatype = datatype.as_ref();
    if datatype == xsd::STRING {
        Ok(simple(lexical))
    } else if datatype == xsd::BOOLEAN {
        let result = match (number, as_boolean) {
            (Some(number), _) => number.is_truthy(),
            (None, Some(value)) => value,
            _ => match lexical.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return ThinError::expected(),
            },
        };
        Ok(boolean(result))
    } else if datatype == xsd::INTEGER {
        let result = match (number, as_boolean) {
            (Some(Numeric::Integer(value)), _) => value,
            (Some(number), _) => {
                let truncated = number.to_f64().trunc();
                i64::from_str(&format!("{truncated}"))?
            }
            (None, Some(value)) => i64::from(value),
            _ => i64::from_str(lexical.trim())?,
        };
        Ok(Literal::from(result).into())
    } else if datatype == xsd::DECIMAL {
        let result = match (number, as_boolean) {
            (Some(Numeric::Integer(value)), _) => Decimal::from(value),
            (Some(Numeric::Decimal(value)), _) => value,
            (Some(Numeric::Double(value)), _) => Decimal::from_str(&format!("{value}"))?,
            (None, Some(value)) => Decimal::from(i64::from(value)),
            _ => Decimal::from_str(lexical.trim())?,
        };
        Ok(Numeric::Decimal(result).into_term())
    } else if datatype == xsd::DOUBLE || datatype == xsd::FLOAT {
        let result = match (number, as_boolean) {
            (Some(number), _) => number.to_f64(),
            (None, Some(value)) => f64::from(u8::from(value)),
            _ => parse_double(lexical.trim()).ok_or(ThinError::default())?,
        };
        if datatype == xsd::DOUBLE {
            Ok(Literal::from(result).into())
        } else {
            Ok(Literal::new_typed_literal(format!("{result}"), xsd::FLOAT).into())
        }
    } else if datatype == xsd::DATE_TIME {
        let value = DateTime::from_str(lexical.trim())?;
        Ok(Literal::new_typed_literal(value.to_string(), xsd::DATE_TIME).into())
    } else {
        ThinError::expected()
    }
}

fn hash<H: Digest>(term: &Term) -> ThinResult<Term> {
    let value = simple_string(term)?;
    Ok(simple(hex::encode(H::digest(value.as_bytes()))))
}

fn compile_regex(pattern: &str, flags: &str) -> ThinResult<Regex> {
    let pattern = if flags.contains('q') {
        regex::escape(pattern)
    } else {
        pattern.to_owned()
    };
    let mut builder = RegexBuilder::new(&pattern);
    builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in flags.chars() {
        match flag {
            's' => {
                builder.dot_matches_new_line(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            'i' => {
                builder.case_insensitive(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'q' => {}
            _ => return ThinError::expected(),
        }
    }
    builder.build().map_err(|_| ThinError::default())
}

fn lang_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    tag == range
        || tag
            .strip_prefix(&range)
            .is_some_and(|rest| rest.starts_with('-'))
}

fn encode_for_uri(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            result.push(char::from(byte));
        } else {
            result.push_str(&format!("%{byte:02X}"));
        }
    }
    result
}

fn numeric(term: &Term) -> ThinResult<Numeric> {
    Numeric::from_term(term).ok_or(ThinError::default())
}

/// The lexical value of a simple or `xsd:string` literal.
fn simple_string(term: &Term) -> ThinResult<String> {
    match term {
        Term::Literal(literal) if literal.datatype() == xsd::STRING => {
            Ok(literal.value().to_owned())
        }
        _ => ThinError::expected(),
    }
}

/// The value and language of a string literal, with or without language tag.
fn string_with_language(term: &Term) -> ThinResult<(String, Option<String>)> {
    match term {
        Term::Literal(literal)
            if literal.datatype() == xsd::STRING || literal.datatype() == rdf::LANG_STRING =>
        {
            Ok((
                literal.value().to_owned(),
                literal.language().map(ToOwned::to_owned),
            ))
        }
        _ => ThinError::expected(),
    }
}

/// Checks that the second argument is compatible with the first one.
fn compatible_strings(
    lhs: &Term,
    rhs: &Term,
) -> ThinResult<((String, Option<String>), String)> {
    let (value, language) = string_with_language(lhs)?;
    let (needle, needle_language) = string_with_language(rhs)?;
    if needle_language.is_some() && needle_language != language {
        return ThinError::expected();
    }
    Ok(((value, language), needle))
}

fn string_literal(value: String, language: Option<String>) -> Term {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language).into(),
        None => Literal::new_simple_literal(value).into(),
    }
}

fn simple(value: impl Into<String>) -> Term {
    Literal::new_simple_literal(value).into()
}

fn boolean(value: bool) -> Term {
    Literal::from(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_boolean_values() {
        assert_eq!(effective_boolean_value(&boolean(true)), Ok(true));
        assert_eq!(effective_boolean_value(&simple("")), Ok(false));
        assert_eq!(effective_boolean_value(&simple("a")), Ok(true));
        assert_eq!(
            effective_boolean_value(&Literal::from(0).into()),
            Ok(false)
        );
        assert!(effective_boolean_value(&NamedNode::new_unchecked("http://a").into()).is_err());
    }

    #[test]
    fn numeric_equality_crosses_datatypes() {
        let integer: Term = Literal::from(1).into();
        let decimal: Term = Literal::new_typed_literal("1.0", xsd::DECIMAL).into();
        assert_eq!(equals(&integer, &decimal), Ok(true));
        assert_eq!(equals(&simple("a"), &simple("b")), Ok(false));
        assert_eq!(equals(&simple("a"), &integer), Ok(false));
    }

    #[test]
    fn ordering_puts_blank_nodes_first() {
        let blank: Term = BlankNode::new_unchecked("b").into();
        let iri: Term = NamedNode::new_unchecked("http://a").into();
        let literal = simple("a");
        assert_eq!(order_terms(None, Some(&blank)), Ordering::Less);
        assert_eq!(order_terms(Some(&blank), Some(&iri)), Ordering::Less);
        assert_eq!(order_terms(Some(&iri), Some(&literal)), Ordering::Less);
        assert_eq!(
            order_terms(Some(&Literal::from(2).into()), Some(&Literal::from(10).into())),
            Ordering::Less
        );
    }

    #[test]
    fn date_time_components() {
        let parts = DateTimeParts::from_term(
            &Literal::new_typed_literal("2011-01-10T14:45:13.815-05:00", xsd::DATE_TIME).into(),
        )
        .unwrap();
        assert_eq!(parts.year, 2011);
        assert_eq!(parts.month, 1);
        assert_eq!(parts.day, 10);
        assert_eq!(parts.hour, 14);
        assert_eq!(parts.minute, 45);
        assert_eq!(parts.second, Decimal::from_str("13.815").unwrap());
        assert_eq!(parts.timezone, "-05:00");
        assert_eq!(parts.timezone_offset(), Some(-300));
        assert_eq!(day_time_duration(-300), "-PT5H");
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
    }

    #[test]
    fn encodes_for_uri() {
        assert_eq!(encode_for_uri("Los Angeles"), "Los%20Angeles");
        assert_eq!(encode_for_uri("a~b"), "a~b");
    }

    #[test]
    fn language_ranges() {
        assert!(lang_matches("en-US", "en"));
        assert!(lang_matches("fr", "*"));
        assert!(!lang_matches("english", "en"));
    }
}
