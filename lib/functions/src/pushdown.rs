use crate::registry::FunctionRegistry;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{AlgebraNode, EvalContext, SimpleEvaluator, SolutionIter};
use rdf_hooks_model::{Term, Variable};
use spargebra::algebra::Expression;
use std::iter::empty;
use std::sync::Arc;
use tracing::debug;

/// Pushes an equality filter into the inner plan if that plan contains a node handled by a
/// registered function.
///
/// `FILTER(?x = <c>)` evaluates the inner plan once with `?x` pre-bound to `<c>`. Disjunctions
/// of such equalities evaluate it once per disjunct and concatenate the results. The filter
/// itself is not evaluated again.
pub(crate) fn evaluate(
    registry: &FunctionRegistry,
    evaluator: &SimpleEvaluator,
    expression: &Expression,
    inner: &Arc<AlgebraNode>,
    context: &EvalContext,
) -> Result<Option<SolutionIter>, QueryEvaluationError> {
    let Some(bindings) = pre_bindings(expression) else {
        return Ok(None);
    };
    if !inner.any(&|node| registry.recognizes(node)) {
        return Ok(None);
    }
    debug!(branches = bindings.len(), "Pushing filter into a function pattern");

    let evaluator = evaluator.clone();
    let inner = Arc::clone(inner);
    let context = context.clone();
    Ok(Some(Box::new(bindings.into_iter().flat_map(
        move |(variable, term)| -> SolutionIter {
            match context.solution.with(variable, term) {
                Some(solution) => evaluator.evaluate(&inner, &context.with_solution(solution)),
                None => Box::new(empty()),
            }
        },
    ))))
}

/// Returns the bindings of each disjunct if `expression` is an equality between a variable and
/// a constant, or a disjunction of those.
pub(crate) fn pre_bindings(expression: &Expression) -> Option<Vec<(Variable, Term)>> {
    match expression {
        Expression::Equal(left, right) => Some(vec![equality(left, right)?]),
        Expression::Or(left, right) => {
            let mut bindings = pre_bindings(left)?;
            bindings.extend(pre_bindings(right)?);
            Some(bindings)
        }
        _ => None,
    }
}

fn equality(left: &Expression, right: &Expression) -> Option<(Variable, Term)> {
    match (left, right) {
        (Expression::Variable(variable), constant) | (constant, Expression::Variable(variable)) => {
            Some((variable.clone(), constant_term(constant)?))
        }
        _ => None,
    }
}

fn constant_term(expression: &Expression) -> Option<Term> {
    match expression {
        Expression::NamedNode(node) => Some(node.clone().into()),
        Expression::Literal(literal) => Some(literal.clone().into()),
        _ => None,
    }
}
