//! A straightforward, tuple-at-a-time evaluator for the [AlgebraNode] tree.
//!
//! Every node is first offered to the configured [CustomEvaluator]s, in order. The first one
//! returning `Some` produces the solutions of the node; otherwise the default handling below
//! runs. Joins are evaluated by substitution: the right-hand side is evaluated once per
//! left-hand solution, with that solution as the evaluation context.

mod aggregate;
mod expression;
mod numeric;
mod path;
mod temporary;

use crate::plan::AlgebraNode;
use crate::quad_storage::QuadStorage;
use crate::solution::Solution;
use crate::sparql::error::QueryEvaluationError;
use crate::sparql::QueryDataset;
use rdf_hooks_model::{
    BlankNode, GraphNameRef, Iri, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, Subject,
    SubjectRef, Term, TermRef, Triple, Variable,
};
use rustc_hash::FxHashSet;
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::fmt::{Debug, Formatter};
use std::iter::{empty, once};
use std::sync::Arc;
use tracing::debug;

pub(crate) use expression::{effective_boolean_value, order_terms};
pub use temporary::{TemporaryGraphGuard, TemporaryGraphs};

/// A lazy iterator of solutions.
pub type SolutionIter = Box<dyn Iterator<Item = Result<Solution, QueryEvaluationError>>>;

/// The prefix of the hidden variables that replace blank nodes in graph patterns.
pub const BLANK_NODE_VARIABLE_PREFIX: &str = "__bn_";

/// A hook that can take over the evaluation of an algebra node.
///
/// Implementations inspect `node` and either return `Ok(None)`, in which case the next hook or
/// the default evaluation handles the node, or the solutions of the node. Sub-plans can be
/// evaluated through `evaluator`, which offers them to all hooks again.
pub trait CustomEvaluator: Send + Sync {
    fn evaluate(
        &self,
        evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError>;
}

/// The graph patterns are matched against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActiveGraph {
    /// The default graph of the query dataset.
    #[default]
    Default,
    /// A named graph, selected by a `GRAPH` clause.
    Named(NamedOrBlankNode),
}

/// The context a node is evaluated in.
#[derive(Clone, Debug, Default)]
pub struct EvalContext {
    /// The bindings that are already known. All produced solutions extend them.
    pub solution: Solution,
    pub graph: ActiveGraph,
}

impl EvalContext {
    /// Returns a context with the same active graph but a different solution.
    pub fn with_solution(&self, solution: Solution) -> Self {
        Self {
            solution,
            graph: self.graph.clone(),
        }
    }
}

/// Evaluates algebra trees against a [QuadStorage].
///
/// The evaluator is cheap to clone. All clones share the temporary graphs of the query they
/// evaluate.
#[derive(Clone)]
pub struct SimpleEvaluator {
    inner: Arc<EvaluatorState>,
}

struct EvaluatorState {
    storage: Arc<dyn QuadStorage>,
    dataset: QueryDataset,
    base_iri: Option<Iri<String>>,
    now: Term,
    custom_evaluators: Vec<Arc<dyn CustomEvaluator>>,
    temporary_graphs: TemporaryGraphs,
}

impl SimpleEvaluator {
    /// Creates a new evaluator for a single query or update.
    pub fn new(
        storage: Arc<dyn QuadStorage>,
        dataset: QueryDataset,
        base_iri: Option<Iri<String>>,
        custom_evaluators: Vec<Arc<dyn CustomEvaluator>>,
    ) -> Self {
        Self {
            inner: Arc::new(EvaluatorState {
                storage,
                dataset,
                base_iri,
                now: expression::now(),
                custom_evaluators,
                temporary_graphs: TemporaryGraphs::default(),
            }),
        }
    }

    pub fn storage(&self) -> &Arc<dyn QuadStorage> {
        &self.inner.storage
    }

    pub fn dataset(&self) -> &QueryDataset {
        &self.inner.dataset
    }

    pub fn base_iri(&self) -> Option<&Iri<String>> {
        self.inner.base_iri.as_ref()
    }

    pub fn temporary_graphs(&self) -> &TemporaryGraphs {
        &self.inner.temporary_graphs
    }

    /// Evaluates `node`, offering it to the custom evaluators first.
    pub fn evaluate(&self, node: &Arc<AlgebraNode>, context: &EvalContext) -> SolutionIter {
        for custom_evaluator in &self.inner.custom_evaluators {
            match custom_evaluator.evaluate(self, node, context) {
                Ok(Some(solutions)) => {
                    debug!(node = node.kind(), "Node handled by a custom evaluator");
                    return solutions;
                }
                Ok(None) => {}
                Err(error) => return error_iter(error),
            }
        }
        self.evaluate_default(node, context)
    }

    /// Evaluates the given triple patterns. The solutions are produced lazily.
    ///
    /// The patterns are evaluated as a new basic graph pattern, so custom evaluators get the
    /// chance to handle them. An empty list of patterns yields the context solution.
    pub fn evaluate_bgp(
        &self,
        patterns: Vec<TriplePattern>,
        context: &EvalContext,
    ) -> SolutionIter {
        if patterns.is_empty() {
            return Box::new(once(Ok(context.solution.clone())));
        }
        let node = Arc::new(AlgebraNode::Bgp { patterns });
        self.evaluate(&node, context)
    }

    /// Evaluates `node` without offering it to the custom evaluators. Its children are still
    /// evaluated with [Self::evaluate].
    pub fn evaluate_default(&self, node: &Arc<AlgebraNode>, context: &EvalContext) -> SolutionIter {
        match node.as_ref() {
            AlgebraNode::Bgp { patterns } => self.evaluate_triple_patterns(patterns, context),
            AlgebraNode::Path {
                subject,
                path,
                object,
            } => self.evaluate_path_pattern(subject, path, object, context),
            AlgebraNode::Join { left, right } => {
                let evaluator = self.clone();
                let right = Arc::clone(right);
                let graph = context.graph.clone();
                Box::new(self.evaluate(left, context).flat_map(
                    move |solution| -> SolutionIter {
                        match solution {
                            Ok(solution) => evaluator.evaluate(
                                &right,
                                &EvalContext {
                                    solution,
                                    graph: graph.clone(),
                                },
                            ),
                            Err(error) => error_iter(error),
                        }
                    },
                ))
            }
            AlgebraNode::LeftJoin {
                left,
                right,
                expression,
            } => {
                let evaluator = self.clone();
                let right = Arc::clone(right);
                let expression = expression.clone();
                let graph = context.graph.clone();
                Box::new(self.evaluate(left, context).flat_map(
                    move |solution| -> SolutionIter {
                        let solution = match solution {
                            Ok(solution) => solution,
                            Err(error) => return error_iter(error),
                        };
                        let context = EvalContext {
                            solution: solution.clone(),
                            graph: graph.clone(),
                        };
                        let mut matches = Vec::new();
                        for candidate in evaluator.evaluate(&right, &context) {
                            let candidate = match candidate {
                                Ok(candidate) => candidate,
                                Err(error) => return error_iter(error),
                            };
                            let accepted = expression.as_ref().map_or(true, |expression| {
                                evaluator.is_true(expression, &candidate, &graph)
                            });
                            if accepted {
                                matches.push(Ok(candidate));
                            }
                        }
                        if matches.is_empty() {
                            Box::new(once(Ok(solution)))
                        } else {
                            Box::new(matches.into_iter())
                        }
                    },
                ))
            }
            AlgebraNode::Filter { expression, inner } => {
                let evaluator = self.clone();
                let expression = Arc::clone(expression);
                let graph = context.graph.clone();
                Box::new(
                    self.evaluate(inner, context)
                        .filter(move |solution| match solution {
                            Ok(solution) => evaluator.is_true(&expression, solution, &graph),
                            Err(_) => true,
                        }),
                )
            }
            AlgebraNode::Union { left, right } => Box::new(
                self.evaluate(left, context)
                    .chain(self.evaluate(right, context)),
            ),
            AlgebraNode::Graph { name, inner } => self.evaluate_graph(name, inner, context),
            AlgebraNode::Extend {
                inner,
                variable,
                expression,
            } => {
                let evaluator = self.clone();
                let expression = Arc::clone(expression);
                let variable = variable.clone();
                let graph = context.graph.clone();
                Box::new(
                    self.evaluate(inner, context)
                        .filter_map(move |solution| match solution {
                            Ok(solution) => {
                                match evaluator.evaluate_expression(&expression, &solution, &graph)
                                {
                                    Ok(term) => solution.with(variable.clone(), term).map(Ok),
                                    Err(_) => Some(Ok(solution)),
                                }
                            }
                            Err(error) => Some(Err(error)),
                        }),
                )
            }
            AlgebraNode::Minus { left, right } => {
                let right_context = EvalContext {
                    solution: Solution::empty(),
                    graph: context.graph.clone(),
                };
                let right = match self
                    .evaluate(right, &right_context)
                    .collect::<Result<Vec<_>, _>>()
                {
                    Ok(right) => right,
                    Err(error) => return error_iter(error),
                };
                Box::new(
                    self.evaluate(left, context)
                        .filter(move |solution| match solution {
                            Ok(solution) => !right.iter().any(|candidate| {
                                solution.shares_variable_with(candidate)
                                    && solution.is_compatible(candidate)
                            }),
                            Err(_) => true,
                        }),
                )
            }
            AlgebraNode::Values { solutions, .. } => {
                let solution = context.solution.clone();
                let solutions = Arc::clone(solutions);
                Box::new(
                    (0..solutions.len())
                        .filter_map(move |index| solution.merge(&solutions[index]).map(Ok)),
                )
            }
            AlgebraNode::OrderBy { inner, expression } => {
                let solutions = match self
                    .evaluate(inner, context)
                    .collect::<Result<Vec<_>, _>>()
                {
                    Ok(solutions) => solutions,
                    Err(error) => return error_iter(error),
                };
                Box::new(
                    self.order_solutions(solutions, expression, &context.graph)
                        .into_iter()
                        .map(Ok),
                )
            }
            AlgebraNode::Project { inner, variables } => {
                // Sub-selects only see their own bindings, the outer ones are joined afterward.
                let inner_context = EvalContext {
                    solution: Solution::empty(),
                    graph: context.graph.clone(),
                };
                let outer = context.solution.clone();
                let variables = Arc::clone(variables);
                Box::new(
                    self.evaluate(inner, &inner_context)
                        .filter_map(move |solution| match solution {
                            Ok(solution) => outer.merge(&solution.project(&variables)).map(Ok),
                            Err(error) => Some(Err(error)),
                        }),
                )
            }
            AlgebraNode::Distinct { inner } => {
                let mut seen = FxHashSet::default();
                Box::new(
                    self.evaluate(inner, context)
                        .filter(move |solution| match solution {
                            Ok(solution) => seen.insert(solution.clone()),
                            Err(_) => true,
                        }),
                )
            }
            AlgebraNode::Reduced { inner } => self.evaluate(inner, context),
            AlgebraNode::Slice {
                inner,
                start,
                length,
            } => {
                let solutions = self.evaluate(inner, context).skip(*start);
                match length {
                    Some(length) => Box::new(solutions.take(*length)),
                    None => Box::new(solutions),
                }
            }
            AlgebraNode::Group {
                inner,
                variables,
                aggregates,
            } => self.evaluate_group(inner, variables, aggregates, context),
            AlgebraNode::Service { name, silent, .. } => {
                if *silent {
                    return Box::new(once(Ok(context.solution.clone())));
                }
                let error = match name {
                    NamedNodePattern::NamedNode(name) => {
                        QueryEvaluationError::UnsupportedService(name.clone())
                    }
                    NamedNodePattern::Variable(variable) => match context.solution.get(variable)
                    {
                        Some(Term::NamedNode(name)) => {
                            QueryEvaluationError::UnsupportedService(name.clone())
                        }
                        _ => QueryEvaluationError::UnboundService,
                    },
                };
                error_iter(error)
            }
        }
    }

    fn is_true(
        &self,
        expression: &spargebra::algebra::Expression,
        solution: &Solution,
        graph: &ActiveGraph,
    ) -> bool {
        self.evaluate_expression(expression, solution, graph)
            .and_then(|term| effective_boolean_value(&term))
            .unwrap_or(false)
    }

    fn evaluate_graph(
        &self,
        name: &NamedNodePattern,
        inner: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> SolutionIter {
        let variable = match name {
            NamedNodePattern::NamedNode(name) => {
                let graph = NamedOrBlankNode::from(name.clone());
                if !self.is_available_named_graph(&graph) {
                    return Box::new(empty());
                }
                return self.evaluate(
                    inner,
                    &EvalContext {
                        solution: context.solution.clone(),
                        graph: ActiveGraph::Named(graph),
                    },
                );
            }
            NamedNodePattern::Variable(variable) => variable,
        };

        if let Some(bound) = context.solution.get(variable) {
            let graph = match bound {
                Term::NamedNode(node) => NamedOrBlankNode::from(node.clone()),
                Term::BlankNode(node) => NamedOrBlankNode::from(node.clone()),
                Term::Literal(_) => return Box::new(empty()),
            };
            if !self.is_available_named_graph(&graph) {
                return Box::new(empty());
            }
            return self.evaluate(
                inner,
                &EvalContext {
                    solution: context.solution.clone(),
                    graph: ActiveGraph::Named(graph),
                },
            );
        }

        let graphs = match self.named_graph_candidates() {
            Ok(graphs) => graphs,
            Err(error) => return error_iter(error),
        };
        let evaluator = self.clone();
        let inner = Arc::clone(inner);
        let variable = variable.clone();
        let solution = context.solution.clone();
        Box::new(graphs.into_iter().flat_map(move |graph| -> SolutionIter {
            let Some(solution) = solution.with(variable.clone(), graph_name_to_term(&graph)) else {
                return Box::new(empty());
            };
            evaluator.evaluate(
                &inner,
                &EvalContext {
                    solution,
                    graph: ActiveGraph::Named(graph),
                },
            )
        }))
    }

    /// The named graphs a `GRAPH ?g` clause iterates over.
    fn named_graph_candidates(&self) -> Result<Vec<NamedOrBlankNode>, QueryEvaluationError> {
        let mut graphs = match self.inner.dataset.available_named_graphs() {
            Some(graphs) => graphs.to_vec(),
            None => self.inner.storage.named_graphs()?,
        };
        for graph in self.inner.temporary_graphs.graphs() {
            let graph = NamedOrBlankNode::from(graph);
            if !graphs.contains(&graph) {
                graphs.push(graph);
            }
        }
        Ok(graphs)
    }

    fn is_available_named_graph(&self, graph: &NamedOrBlankNode) -> bool {
        let is_temporary = match graph {
            NamedOrBlankNode::NamedNode(node) => self.inner.temporary_graphs.contains(node.as_ref()),
            NamedOrBlankNode::BlankNode(_) => false,
        };
        is_temporary
            || self
                .inner
                .dataset
                .available_named_graphs()
                .map_or(true, |graphs| graphs.contains(graph))
    }

    fn evaluate_triple_patterns(
        &self,
        patterns: &[TriplePattern],
        context: &EvalContext,
    ) -> SolutionIter {
        let mut solutions: SolutionIter = Box::new(once(Ok(context.solution.clone())));
        for pattern in patterns {
            let evaluator = self.clone();
            let pattern = pattern.clone();
            let graph = context.graph.clone();
            solutions = Box::new(solutions.flat_map(move |solution| -> SolutionIter {
                match solution {
                    Ok(solution) => evaluator.evaluate_triple_pattern(&pattern, &solution, &graph),
                    Err(error) => error_iter(error),
                }
            }));
        }
        solutions
    }

    fn evaluate_triple_pattern(
        &self,
        pattern: &TriplePattern,
        solution: &Solution,
        graph: &ActiveGraph,
    ) -> SolutionIter {
        let subject_slot = PatternSlot::from_term_pattern(&pattern.subject, solution);
        let predicate_slot = PatternSlot::from_named_node_pattern(&pattern.predicate, solution);
        let object_slot = PatternSlot::from_term_pattern(&pattern.object, solution);

        let subject = match subject_slot.bound_subject() {
            Ok(subject) => subject,
            Err(()) => return Box::new(empty()),
        };
        let predicate = match predicate_slot.bound_named_node() {
            Ok(predicate) => predicate,
            Err(()) => return Box::new(empty()),
        };
        let object = object_slot.bound();

        let triples = match self.triples_for_pattern(
            subject.as_ref().map(Subject::as_ref),
            predicate.as_ref().map(NamedNode::as_ref),
            object.map(Term::as_ref),
            graph,
        ) {
            Ok(triples) => triples,
            Err(error) => return error_iter(error),
        };

        let solution = solution.clone();
        Box::new(triples.into_iter().filter_map(move |triple| {
            let mut result = solution.clone();
            if let PatternSlot::Free(variable) = &subject_slot {
                result = result.with(variable.clone(), triple.subject.into())?;
            }
            if let PatternSlot::Free(variable) = &predicate_slot {
                result = result.with(variable.clone(), triple.predicate.into())?;
            }
            if let PatternSlot::Free(variable) = &object_slot {
                result = result.with(variable.clone(), triple.object)?;
            }
            Some(Ok(result))
        }))
    }

    /// Returns the triples of the active graph that match the pattern.
    ///
    /// If the default graph is made of several graphs, duplicate triples are removed.
    pub fn triples_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph: &ActiveGraph,
    ) -> Result<Vec<Triple>, QueryEvaluationError> {
        let quads = match graph {
            ActiveGraph::Named(graph) => {
                let graph_name = match graph {
                    NamedOrBlankNode::NamedNode(node) => GraphNameRef::from(node.as_ref()),
                    NamedOrBlankNode::BlankNode(node) => GraphNameRef::from(node.as_ref()),
                };
                return Ok(self
                    .quads_for_pattern(subject, predicate, object, Some(graph_name))?
                    .into_iter()
                    .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
                    .collect());
            }
            ActiveGraph::Default => match self.inner.dataset.default_graph_graphs() {
                Some([graph_name]) => {
                    return Ok(self
                        .quads_for_pattern(subject, predicate, object, Some(graph_name.as_ref()))?
                        .into_iter()
                        .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
                        .collect());
                }
                Some(graph_names) => {
                    let mut quads = Vec::new();
                    for graph_name in graph_names {
                        quads.extend(self.quads_for_pattern(
                            subject,
                            predicate,
                            object,
                            Some(graph_name.as_ref()),
                        )?);
                    }
                    quads
                }
                None => self.quads_for_pattern(subject, predicate, object, None)?,
            },
        };

        let mut seen = FxHashSet::default();
        Ok(quads
            .into_iter()
            .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
            .filter(|triple| seen.insert(triple.clone()))
            .collect())
    }

    /// Looks up quads in the storage and in the temporary graphs of this evaluation.
    ///
    /// A temporary graph shadows a storage graph with the same name.
    fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, QueryEvaluationError> {
        let temporary_graphs = &self.inner.temporary_graphs;
        match graph_name {
            Some(GraphNameRef::NamedNode(node)) if temporary_graphs.contains(node) => Ok(
                temporary_graphs.quads_for_pattern(subject, predicate, object, Some(node))?,
            ),
            Some(graph_name) => Ok(self.inner.storage.quads_for_pattern(
                subject,
                predicate,
                object,
                Some(graph_name),
            )?),
            None => {
                let mut quads =
                    self.inner
                        .storage
                        .quads_for_pattern(subject, predicate, object, None)?;
                quads.extend(temporary_graphs.quads_for_pattern(subject, predicate, object, None)?);
                Ok(quads)
            }
        }
    }

    /// Fills the temporary graph `graph` with `triples` and registers it for cleanup.
    ///
    /// The graph is only visible to this evaluation. The shared storage is not modified.
    pub fn insert_temporary_graph(
        &self,
        graph: &NamedNode,
        triples: impl IntoIterator<Item = Triple>,
    ) -> Result<(), QueryEvaluationError> {
        let inserted = self.inner.temporary_graphs.insert(graph, triples)?;
        debug!(graph = %graph, inserted, "Filled temporary graph");
        Ok(())
    }

    /// Drops all temporary graphs created by this evaluation.
    pub fn purge_temporary_graphs(&self) {
        self.inner.temporary_graphs.purge();
    }
}

impl Debug for SimpleEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleEvaluator")
            .field("dataset", &self.inner.dataset)
            .field("base_iri", &self.inner.base_iri)
            .field("custom_evaluators", &self.inner.custom_evaluators.len())
            .finish_non_exhaustive()
    }
}

/// A position of a triple pattern, either bound to a term or a variable to bind.
enum PatternSlot {
    Bound(Term),
    Free(Variable),
}

impl PatternSlot {
    fn from_term_pattern(pattern: &TermPattern, solution: &Solution) -> Self {
        match pattern {
            TermPattern::NamedNode(node) => Self::Bound(node.clone().into()),
            TermPattern::Literal(literal) => Self::Bound(literal.clone().into()),
            TermPattern::BlankNode(node) => Self::from_variable(blank_node_variable(node), solution),
            TermPattern::Variable(variable) => Self::from_variable(variable.clone(), solution),
        }
    }

    fn from_named_node_pattern(pattern: &NamedNodePattern, solution: &Solution) -> Self {
        match pattern {
            NamedNodePattern::NamedNode(node) => Self::Bound(node.clone().into()),
            NamedNodePattern::Variable(variable) => {
                Self::from_variable(variable.clone(), solution)
            }
        }
    }

    fn from_variable(variable: Variable, solution: &Solution) -> Self {
        match solution.get(&variable) {
            Some(term) => Self::Bound(term.clone()),
            None => Self::Free(variable),
        }
    }

    fn bound(&self) -> Option<&Term> {
        match self {
            Self::Bound(term) => Some(term),
            Self::Free(_) => None,
        }
    }

    /// `Err` if the slot is bound to a term that cannot be a subject.
    fn bound_subject(&self) -> Result<Option<Subject>, ()> {
        match self.bound() {
            Some(Term::NamedNode(node)) => Ok(Some(node.clone().into())),
            Some(Term::BlankNode(node)) => Ok(Some(node.clone().into())),
            Some(Term::Literal(_)) => Err(()),
            None => Ok(None),
        }
    }

    /// `Err` if the slot is bound to a term that cannot be a predicate.
    fn bound_named_node(&self) -> Result<Option<NamedNode>, ()> {
        match self.bound() {
            Some(Term::NamedNode(node)) => Ok(Some(node.clone())),
            Some(_) => Err(()),
            None => Ok(None),
        }
    }
}

/// Returns the hidden variable that stands for a blank node of a graph pattern.
pub fn blank_node_variable(node: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("{BLANK_NODE_VARIABLE_PREFIX}{}", node.as_str()))
}

/// Returns whether `variable` has been introduced for a blank node.
pub fn is_blank_node_variable(variable: &Variable) -> bool {
    variable.as_str().starts_with(BLANK_NODE_VARIABLE_PREFIX)
}

fn graph_name_to_term(graph: &NamedOrBlankNode) -> Term {
    match graph {
        NamedOrBlankNode::NamedNode(node) => node.clone().into(),
        NamedOrBlankNode::BlankNode(node) => node.clone().into(),
    }
}

pub(crate) fn error_iter(error: QueryEvaluationError) -> SolutionIter {
    Box::new(once(Err(error)))
}

#[cfg(test)]
mod tests;
