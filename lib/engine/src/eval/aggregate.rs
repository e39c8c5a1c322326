use crate::eval::numeric::Numeric;
use crate::eval::{error_iter, order_terms, ActiveGraph, EvalContext, SimpleEvaluator, SolutionIter};
use crate::plan::AlgebraNode;
use crate::solution::Solution;
use rdf_hooks_model::vocab::{rdf, xsd};
use rdf_hooks_model::{Literal, Term, ThinError, ThinResult, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::algebra::{AggregateExpression, AggregateFunction};
use std::sync::Arc;

impl SimpleEvaluator {
    /// Evaluates a `GROUP BY` node and its aggregates.
    ///
    /// Without grouping variables, all solutions form a single group, even if there are none.
    pub(super) fn evaluate_group(
        &self,
        inner: &Arc<AlgebraNode>,
        variables: &Arc<[Variable]>,
        aggregates: &Arc<[(Variable, AggregateExpression)]>,
        context: &EvalContext,
    ) -> SolutionIter {
        let solutions = match self
            .evaluate(inner, context)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(solutions) => solutions,
            Err(error) => return error_iter(error),
        };

        let mut keys = Vec::<Vec<Option<Term>>>::new();
        let mut groups = FxHashMap::<Vec<Option<Term>>, Vec<Solution>>::default();
        if variables.is_empty() {
            keys.push(Vec::new());
            groups.insert(Vec::new(), Vec::new());
        }
        for solution in solutions {
            let key = variables
                .iter()
                .map(|variable| solution.get(variable).cloned())
                .collect::<Vec<_>>();
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    keys.push(key);
                    Vec::new()
                })
                .push(solution);
        }

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(members) = groups.remove(&key) else {
                continue;
            };
            let bindings = variables
                .iter()
                .zip(key)
                .filter_map(|(variable, term)| Some((variable.clone(), term?)));
            let Some(mut result) = context.solution.extend(bindings) else {
                continue;
            };
            for (variable, aggregate) in aggregates.iter() {
                if let Ok(value) = self.evaluate_aggregate(aggregate, &members, &context.graph) {
                    if let Some(extended) = result.with(variable.clone(), value) {
                        result = extended;
                    }
                }
            }
            results.push(Ok(result));
        }
        Box::new(results.into_iter())
    }

    fn evaluate_aggregate(
        &self,
        aggregate: &AggregateExpression,
        members: &[Solution],
        graph: &ActiveGraph,
    ) -> ThinResult<Term> {
        let (function, expression, distinct) = match aggregate {
            AggregateExpression::CountSolutions { distinct } => {
                let count = if *distinct {
                    members.iter().collect::<FxHashSet<_>>().len()
                } else {
                    members.len()
                };
                return Ok(Literal::from(i64::try_from(count)?).into());
            }
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => (name, expr, *distinct),
        };

        let mut values = members
            .iter()
            .map(|solution| self.evaluate_expression(expression, solution, graph))
            .collect::<Vec<_>>();
        if distinct {
            let mut seen = FxHashSet::default();
            values.retain(|value| match value {
                Ok(term) => seen.insert(term.clone()),
                Err(_) => true,
            });
        }

        match function {
            AggregateFunction::Count => {
                let count = values.iter().filter(|value| value.is_ok()).count();
                Ok(Literal::from(i64::try_from(count)?).into())
            }
            AggregateFunction::Sum => Ok(sum(values)?.into_term()),
            AggregateFunction::Avg => {
                let count = values.len();
                if count == 0 {
                    return Ok(Literal::from(0).into());
                }
                let total = sum(values)?;
                let count = Numeric::Integer(i64::try_from(count)?);
                Ok(total.divide(count)?.into_term())
            }
            AggregateFunction::Min => values
                .into_iter()
                .filter_map(Result::ok)
                .min_by(|lhs, rhs| order_terms(Some(lhs), Some(rhs)))
                .ok_or(ThinError::default()),
            AggregateFunction::Max => values
                .into_iter()
                .filter_map(Result::ok)
                .max_by(|lhs, rhs| order_terms(Some(lhs), Some(rhs)))
                .ok_or(ThinError::default()),
            AggregateFunction::GroupConcat { separator } => {
                let separator = separator.as_deref().unwrap_or(" ");
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    match value? {
                        Term::Literal(literal)
                            if literal.datatype() == xsd::STRING
                                || literal.datatype() == rdf::LANG_STRING =>
                        {
                            parts.push(literal.value().to_owned());
                        }
                        _ => return ThinError::expected(),
                    }
                }
                Ok(Literal::new_simple_literal(parts.join(separator)).into())
            }
            AggregateFunction::Sample => values
                .into_iter()
                .find_map(Result::ok)
                .ok_or(ThinError::default()),
            AggregateFunction::Custom(_) => ThinError::expected(),
        }
    }
}

fn sum(values: Vec<ThinResult<Term>>) -> ThinResult<Numeric> {
    let mut total = Numeric::Integer(0);
    for value in values {
        let value = Numeric::from_term(&value?).ok_or(ThinError::default())?;
        total = total.add(value)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks_model::Decimal;

    fn integer(value: i64) -> ThinResult<Term> {
        Ok(Literal::from(value).into())
    }

    #[test]
    fn sum_of_mixed_numbers() {
        let decimal: Term = Literal::new_typed_literal("0.5", xsd::DECIMAL).into();
        let total = sum(vec![integer(1), integer(2), Ok(decimal)]).unwrap();
        assert_eq!(
            total.into_term(),
            Numeric::Decimal("3.5".parse::<Decimal>().unwrap()).into_term()
        );
    }

    #[test]
    fn sum_fails_on_non_numeric_values() {
        let text: Term = Literal::new_simple_literal("a").into();
        assert!(sum(vec![integer(1), Ok(text)]).is_err());
    }
}
