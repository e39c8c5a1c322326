use crate::definition::{FunctionOutput, OutputRow, OutputShape};
use crate::error::FunctionError;
use crate::registry::RegisteredFunction;
use crate::type_pattern::resolve;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{blank_node_variable, EvalContext, SimpleEvaluator, Solution, SolutionIter};
use rdf_hooks_model::{Term, Value};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::iter::once;
use std::sync::Arc;
use tracing::{debug, warn};

fn is_ours(function: &RegisteredFunction, pattern: &TriplePattern) -> bool {
    matches!(&pattern.predicate, NamedNodePattern::NamedNode(p) if p == function.iri())
}

/// Returns whether `patterns` use the predicate of `function`.
pub(crate) fn matches(function: &RegisteredFunction, patterns: &[TriplePattern]) -> bool {
    patterns.iter().any(|pattern| is_ours(function, pattern))
}

/// Evaluates a basic graph pattern that uses the predicate of a predicate pattern function.
///
/// The other triples are evaluated first. The function is then called with the subject of
/// every triple using the predicate and its values are joined with the object. A failing call
/// skips the solution.
pub(crate) fn evaluate(
    function: &Arc<RegisteredFunction>,
    evaluator: &SimpleEvaluator,
    patterns: &[TriplePattern],
    context: &EvalContext,
) -> Result<Option<SolutionIter>, QueryEvaluationError> {
    if !matches(function, patterns) {
        return Ok(None);
    }
    let (ours, other): (Vec<_>, Vec<_>) = patterns
        .iter()
        .cloned()
        .partition(|pattern| is_ours(function, pattern));
    debug!(
        function = %function.iri(),
        patterns = ours.len(),
        "Evaluating predicate pattern"
    );

    let bases = evaluator.evaluate_bgp(other, context);
    let function = Arc::clone(function);
    Ok(Some(Box::new(bases.flat_map(
        move |base| -> SolutionIter {
            match base {
                Ok(base) => Box::new(join(&function, &ours, base).into_iter().map(Ok)),
                Err(error) => Box::new(once(Err(error))),
            }
        },
    ))))
}

fn join(function: &RegisteredFunction, patterns: &[TriplePattern], base: Solution) -> Vec<Solution> {
    let mut candidates = vec![base];
    for pattern in patterns {
        let mut next = Vec::new();
        for candidate in &candidates {
            let Some(subject) = resolve(&pattern.subject, candidate) else {
                continue;
            };
            let values = match call(function, subject) {
                Ok(values) => values,
                Err(error) => {
                    warn!(
                        function = %function.iri(),
                        %error,
                        "Predicate function failed, skipping the solution"
                    );
                    continue;
                }
            };
            for term in values {
                let solution = match &pattern.object {
                    TermPattern::Variable(variable) => candidate.with(variable.clone(), term),
                    TermPattern::BlankNode(node) => candidate.with(blank_node_variable(node), term),
                    object => resolve(object, candidate)
                        .is_some_and(|expected| expected == term)
                        .then(|| candidate.clone()),
                };
                next.extend(solution);
            }
        }
        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

fn call(function: &RegisteredFunction, subject: Term) -> Result<Vec<Term>, FunctionError> {
    let values = vec![Value::from_term(subject)];
    let args = match function.definition().signature() {
        Some(signature) => signature.bind(values)?,
        None => return Err(FunctionError::failed("The function has no signature")),
    };
    function
        .definition()
        .call(&args)?
        .check(function.output())
        .and_then(FunctionOutput::into_rows)?
        .into_iter()
        .map(|row| match row {
            OutputRow::Value(value) => Ok(value.into_term()),
            OutputRow::Struct(_) => Err(FunctionError::UnexpectedOutput {
                expected: OutputShape::Multi,
                actual: OutputShape::Struct,
            }),
        })
        .collect()
}
