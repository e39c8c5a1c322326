use crate::eval::{ActiveGraph, EvalContext, SimpleEvaluator, TemporaryGraphGuard};
use crate::plan::AlgebraNode;
use crate::quad_storage::QuadStorage;
use crate::results::{QueryResults, QuerySolutionIter, QueryTripleIter};
use crate::sparql::error::QueryEvaluationError;
use crate::sparql::{Query, QueryOptions};
use rdf_hooks_model::{Iri, Subject, Term, Variable};
use rustc_hash::FxHashSet;
use spargebra::algebra::GraphPattern;
use std::sync::Arc;
use tracing::debug;

/// Evaluates `query` against `storage`.
///
/// The returned results are lazy. Temporary graphs created by custom evaluators are private to
/// this evaluation and live until the results are consumed or dropped.
pub fn evaluate_query(
    storage: Arc<dyn QuadStorage>,
    query: &Query,
    options: &QueryOptions,
) -> Result<QueryResults, QueryEvaluationError> {
    let (pattern, base_iri) = match &query.inner {
        spargebra::Query::Select {
            pattern, base_iri, ..
        }
        | spargebra::Query::Construct {
            pattern, base_iri, ..
        }
        | spargebra::Query::Describe {
            pattern, base_iri, ..
        }
        | spargebra::Query::Ask {
            pattern, base_iri, ..
        } => (pattern, base_iri),
    };

    let evaluator = create_evaluator(storage, query, base_iri.clone(), options);
    let guard = TemporaryGraphGuard::new(evaluator.clone());
    let node = AlgebraNode::compile(pattern)?;
    debug!(root = node.kind(), "Evaluating query");
    let solutions = evaluator.evaluate(&node, &EvalContext::default());

    match &query.inner {
        spargebra::Query::Select { .. } => {
            let variables = projected_variables(pattern);
            Ok(QueryResults::Solutions(QuerySolutionIter::from_solutions(
                variables, solutions, guard,
            )))
        }
        spargebra::Query::Construct { template, .. } => {
            let variables = in_scope_variables(pattern);
            let solutions = QuerySolutionIter::from_solutions(variables, solutions, guard);
            Ok(QueryResults::Graph(QueryTripleIter::new(
                template.clone(),
                solutions,
            )))
        }
        spargebra::Query::Ask { .. } => {
            let mut solutions = solutions;
            let result = match solutions.next() {
                Some(Ok(_)) => true,
                Some(Err(error)) => return Err(error),
                None => false,
            };
            drop(guard);
            Ok(QueryResults::Boolean(result))
        }
        spargebra::Query::Describe { .. } => {
            let variables = projected_variables(pattern);
            let mut described = Vec::new();
            let mut seen = FxHashSet::default();
            for solution in QuerySolutionIter::from_solutions(variables, solutions, guard) {
                for (_, term) in solution?.iter() {
                    let subject = match term {
                        Term::NamedNode(node) => Subject::from(node.clone()),
                        Term::BlankNode(node) => Subject::from(node.clone()),
                        Term::Literal(_) => continue,
                    };
                    if seen.insert(subject.clone()) {
                        described.push(subject);
                    }
                }
            }

            let mut triples = Vec::new();
            for subject in described {
                triples.extend(evaluator.triples_for_pattern(
                    Some(subject.as_ref()),
                    None,
                    None,
                    &ActiveGraph::Default,
                )?);
            }
            Ok(QueryResults::Graph(QueryTripleIter::from_triples(
                triples.into_iter().map(Ok),
            )))
        }
    }
}

fn create_evaluator(
    storage: Arc<dyn QuadStorage>,
    query: &Query,
    base_iri: Option<Iri<String>>,
    options: &QueryOptions,
) -> SimpleEvaluator {
    SimpleEvaluator::new(
        storage,
        query.dataset.clone(),
        base_iri,
        options.custom_evaluators.clone(),
    )
}

/// The variables of the outermost projection, or all in-scope variables without one.
fn projected_variables(pattern: &GraphPattern) -> Arc<[Variable]> {
    match pattern {
        GraphPattern::Project { variables, .. } => variables.clone().into(),
        GraphPattern::Slice { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::OrderBy { inner, .. } => projected_variables(inner),
        _ => in_scope_variables(pattern),
    }
}

fn in_scope_variables(pattern: &GraphPattern) -> Arc<[Variable]> {
    let mut variables = Vec::new();
    pattern.on_in_scope_variable(|variable| {
        if !variables.contains(variable) {
            variables.push(variable.clone());
        }
    });
    variables.into()
}
