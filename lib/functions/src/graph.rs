use crate::definition::{FunctionOutput, OutputShape};
use crate::error::FunctionError;
use crate::extension::{call_function, evaluate_arguments, function_error, ExtendCall};
use crate::registry::RegisteredFunction;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{EvalContext, SimpleEvaluator, SolutionIter};
use rdf_hooks_model::{NamedNode, TripleRef};
use spargebra::algebra::Expression;
use std::iter::once;
use std::sync::Arc;
use tracing::debug;

/// Evaluates a graph function for every solution of the inner node.
///
/// The returned triples are added to the temporary graph of the function and the variable is
/// bound to the IRI of that graph. The graph belongs to the current evaluation only, so
/// concurrent queries calling the same function do not share it. It is removed once the query
/// results are consumed.
pub(crate) fn evaluate(
    function: &Arc<RegisteredFunction>,
    evaluator: &SimpleEvaluator,
    call: &ExtendCall<'_>,
    context: &EvalContext,
) -> SolutionIter {
    let Some(graph_iri) = function.graph_iri().cloned() else {
        return Box::new(once(Err(QueryEvaluationError::InternalError(format!(
            "The graph function <{}> has no temporary graph",
            function.iri()
        )))));
    };

    let function = Arc::clone(function);
    let evaluator_clone = evaluator.clone();
    let variable = call.variable.clone();
    let arguments: Arc<[Expression]> = call.arguments.into();
    let graph = context.graph.clone();
    Box::new(
        evaluator
            .evaluate(call.inner, context)
            .filter_map(move |solution| {
                let solution = match solution {
                    Ok(solution) => solution,
                    Err(error) => return Some(Err(error)),
                };
                let filled = evaluate_arguments(
                    &function,
                    &evaluator_clone,
                    &arguments,
                    &solution,
                    &graph,
                )
                .and_then(|args| call_function(&function, &args))
                .and_then(|output| fill_graph(&function, &evaluator_clone, &graph_iri, output));
                match filled {
                    Ok(()) => solution.with(variable.clone(), graph_iri.clone().into()).map(Ok),
                    Err(error) => Some(Err(error)),
                }
            }),
    )
}

fn fill_graph(
    function: &RegisteredFunction,
    evaluator: &SimpleEvaluator,
    graph_iri: &NamedNode,
    output: FunctionOutput,
) -> Result<(), QueryEvaluationError> {
    let FunctionOutput::Graph(graph) = output else {
        return Err(function_error(
            function,
            &FunctionError::UnexpectedOutput {
                expected: OutputShape::Graph,
                actual: output.shape(),
            },
        ));
    };
    debug!(
        function = %function.iri(),
        graph = %graph_iri,
        triples = graph.len(),
        "Graph function returned triples"
    );
    evaluator.insert_temporary_graph(graph_iri, graph.iter().map(TripleRef::into_owned))
}
