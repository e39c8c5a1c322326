//! The older calling convention for extension functions.
//!
//! A legacy function is called once per solution of the inner node and receives a [LegacyCall]
//! carrying the solutions produced so far. It appends its own solutions to it and returns it.
//! Unlike registered functions, it reads its arguments from the algebra node itself.

use crate::error::FunctionError;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{
    custom_function_call, ActiveGraph, AlgebraNode, EvalContext, SimpleEvaluator, Solution,
    SolutionIter,
};
use rdf_hooks_model::{NamedNode, Term, Variable};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// The state threaded through the calls of a legacy function.
pub struct LegacyCall<'a> {
    /// The solutions produced so far, including those of previous calls.
    pub results: Vec<Solution>,
    pub evaluator: &'a SimpleEvaluator,
    pub graph: &'a ActiveGraph,
    /// The `Extend` node that called the function.
    pub node: &'a AlgebraNode,
    /// The solution of the inner node the function is called for.
    pub solution: Solution,
}

impl LegacyCall<'_> {
    /// The variable the `BIND` expression assigns.
    pub fn variable(&self) -> Option<&Variable> {
        match self.node {
            AlgebraNode::Extend { variable, .. } => Some(variable),
            _ => None,
        }
    }

    /// Evaluates the argument at `index` against the current solution.
    pub fn argument(&self, index: usize) -> Result<Term, FunctionError> {
        let AlgebraNode::Extend { expression, .. } = self.node else {
            return Err(FunctionError::failed("Not called from a BIND expression"));
        };
        let argument = custom_function_call(expression)
            .and_then(|(_, arguments)| arguments.get(index))
            .ok_or_else(|| FunctionError::MissingArgument(format!("#{}", index + 1)))?;
        self.evaluator
            .evaluate_expression(argument, &self.solution, self.graph)
            .map_err(|_| FunctionError::InvalidArgument {
                name: format!("#{}", index + 1),
                value: argument.to_string(),
            })
    }

    /// Adds the current solution extended with `bindings` to the results.
    ///
    /// Returns `false` if a binding conflicts with the current solution.
    pub fn push(&mut self, bindings: impl IntoIterator<Item = (Variable, Term)>) -> bool {
        match self.solution.extend(bindings) {
            Some(solution) => {
                self.results.push(solution);
                true
            }
            None => false,
        }
    }
}

/// A function using the legacy calling convention.
///
/// Any `fn(LegacyCall<'_>) -> Result<LegacyCall<'_>, FunctionError>` implements it.
pub trait LegacyFunction: Send + Sync {
    fn call<'a>(&self, call: LegacyCall<'a>) -> Result<LegacyCall<'a>, FunctionError>;
}

impl<F> LegacyFunction for F
where
    F: for<'a> Fn(LegacyCall<'a>) -> Result<LegacyCall<'a>, FunctionError> + Send + Sync,
{
    fn call<'a>(&self, call: LegacyCall<'a>) -> Result<LegacyCall<'a>, FunctionError> {
        self(call)
    }
}

/// Maps IRIs to legacy functions, in registration order.
#[derive(Default)]
pub(crate) struct LegacyDispatcher {
    functions: Vec<(NamedNode, Arc<dyn LegacyFunction>)>,
}

impl LegacyDispatcher {
    pub fn insert(&mut self, iri: NamedNode, function: Arc<dyn LegacyFunction>) {
        self.functions.push((iri, function));
    }

    pub fn contains(&self, iri: &NamedNode) -> bool {
        self.functions.iter().any(|(candidate, _)| candidate == iri)
    }

    pub fn iris(&self) -> impl Iterator<Item = &NamedNode> {
        self.functions.iter().map(|(iri, _)| iri)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Evaluates an `Extend` node calling a legacy function.
    ///
    /// The inner node is evaluated eagerly and errors are fatal for the query.
    pub fn evaluate(
        &self,
        evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError> {
        let AlgebraNode::Extend {
            inner, expression, ..
        } = node.as_ref()
        else {
            return Ok(None);
        };
        let Some((iri, _)) = custom_function_call(expression) else {
            return Ok(None);
        };
        let Some((iri, function)) = self.functions.iter().find(|(candidate, _)| candidate == iri)
        else {
            return Ok(None);
        };
        debug!(function = %iri, "Dispatching BIND to a legacy function");

        let mut results = Vec::new();
        for solution in evaluator.evaluate(inner, context) {
            let call = LegacyCall {
                results,
                evaluator,
                graph: &context.graph,
                node: node.as_ref(),
                solution: solution?,
            };
            results = function
                .call(call)
                .map_err(|error| QueryEvaluationError::function(iri, error.to_string()))?
                .results;
        }
        Ok(Some(Box::new(results.into_iter().map(Ok))))
    }
}

impl Debug for LegacyDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.functions.iter().map(|(iri, _)| iri))
            .finish()
    }
}
