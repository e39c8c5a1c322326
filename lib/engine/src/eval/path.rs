use crate::eval::{
    blank_node_variable, error_iter, ActiveGraph, EvalContext, SimpleEvaluator, SolutionIter,
};
use crate::solution::Solution;
use crate::sparql::error::QueryEvaluationError;
use itertools::Itertools;
use rdf_hooks_model::{SubjectRef, Term, Variable};
use rustc_hash::FxHashSet;
use spargebra::algebra::PropertyPathExpression;
use spargebra::term::TermPattern;
use std::iter::{empty, once};

/// One end of a path pattern.
enum PathEnd {
    Bound(Term),
    Free(Variable),
}

impl PathEnd {
    fn new(pattern: &TermPattern, solution: &Solution) -> Self {
        let variable = match pattern {
            TermPattern::NamedNode(node) => return Self::Bound(node.clone().into()),
            TermPattern::Literal(literal) => return Self::Bound(literal.clone().into()),
            TermPattern::BlankNode(node) => blank_node_variable(node),
            TermPattern::Variable(variable) => variable.clone(),
        };
        match solution.get(&variable) {
            Some(term) => Self::Bound(term.clone()),
            None => Self::Free(variable),
        }
    }
}

impl SimpleEvaluator {
    pub(super) fn evaluate_path_pattern(
        &self,
        subject: &TermPattern,
        path: &PropertyPathExpression,
        object: &TermPattern,
        context: &EvalContext,
    ) -> SolutionIter {
        let solution = &context.solution;
        let graph = &context.graph;
        let result = match (PathEnd::new(subject, solution), PathEnd::new(object, solution)) {
            (PathEnd::Bound(start), PathEnd::Bound(end)) => {
                match self.path_targets(&start, path, graph) {
                    Ok(targets) if targets.contains(&end) => {
                        return Box::new(once(Ok(solution.clone())));
                    }
                    Ok(_) => return Box::new(empty()),
                    Err(error) => return error_iter(error),
                }
            }
            (PathEnd::Bound(start), PathEnd::Free(variable)) => self
                .path_targets(&start, path, graph)
                .map(|targets| bind_all(solution, &variable, targets)),
            (PathEnd::Free(variable), PathEnd::Bound(end)) => self
                .path_sources(&end, path, graph)
                .map(|sources| bind_all(solution, &variable, sources)),
            (PathEnd::Free(subject), PathEnd::Free(object)) => {
                self.path_pairs(path, graph).map(|pairs| {
                    pairs
                        .into_iter()
                        .filter_map(|(start, end)| {
                            if subject == object && start != end {
                                return None;
                            }
                            solution
                                .with(subject.clone(), start)?
                                .with(object.clone(), end)
                        })
                        .collect()
                })
            }
        };
        match result {
            Ok(solutions) => Box::new(solutions.into_iter().map(Ok)),
            Err(error) => error_iter(error),
        }
    }

    /// Returns all nodes reachable from `start` through `path`.
    fn path_targets(
        &self,
        start: &Term,
        path: &PropertyPathExpression,
        graph: &ActiveGraph,
    ) -> Result<Vec<Term>, QueryEvaluationError> {
        match path {
            PropertyPathExpression::NamedNode(predicate) => {
                let Some(subject) = as_subject(start) else {
                    return Ok(Vec::new());
                };
                Ok(self
                    .triples_for_pattern(Some(subject), Some(predicate.as_ref()), None, graph)?
                    .into_iter()
                    .map(|triple| triple.object)
                    .collect())
            }
            PropertyPathExpression::Reverse(inner) => self.path_sources(start, inner, graph),
            PropertyPathExpression::Sequence(first, second) => {
                let mut targets = Vec::new();
                for middle in self.path_targets(start, first, graph)? {
                    targets.extend(self.path_targets(&middle, second, graph)?);
                }
                Ok(deduplicate(targets))
            }
            PropertyPathExpression::Alternative(left, right) => {
                let mut targets = self.path_targets(start, left, graph)?;
                targets.extend(self.path_targets(start, right, graph)?);
                Ok(deduplicate(targets))
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                closure(start, true, |node| self.path_targets(node, inner, graph))
            }
            PropertyPathExpression::OneOrMore(inner) => {
                closure(start, false, |node| self.path_targets(node, inner, graph))
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                let mut targets = vec![start.clone()];
                targets.extend(self.path_targets(start, inner, graph)?);
                Ok(deduplicate(targets))
            }
            PropertyPathExpression::NegatedPropertySet(excluded) => {
                let Some(subject) = as_subject(start) else {
                    return Ok(Vec::new());
                };
                Ok(deduplicate(
                    self.triples_for_pattern(Some(subject), None, None, graph)?
                        .into_iter()
                        .filter(|triple| !excluded.contains(&triple.predicate))
                        .map(|triple| triple.object)
                        .collect(),
                ))
            }
        }
    }

    /// Returns all nodes from which `end` is reachable through `path`.
    fn path_sources(
        &self,
        end: &Term,
        path: &PropertyPathExpression,
        graph: &ActiveGraph,
    ) -> Result<Vec<Term>, QueryEvaluationError> {
        match path {
            PropertyPathExpression::NamedNode(predicate) => Ok(self
                .triples_for_pattern(None, Some(predicate.as_ref()), Some(end.as_ref()), graph)?
                .into_iter()
                .map(|triple| triple.subject.into())
                .collect()),
            PropertyPathExpression::Reverse(inner) => self.path_targets(end, inner, graph),
            PropertyPathExpression::Sequence(first, second) => {
                let mut sources = Vec::new();
                for middle in self.path_sources(end, second, graph)? {
                    sources.extend(self.path_sources(&middle, first, graph)?);
                }
                Ok(deduplicate(sources))
            }
            PropertyPathExpression::Alternative(left, right) => {
                let mut sources = self.path_sources(end, left, graph)?;
                sources.extend(self.path_sources(end, right, graph)?);
                Ok(deduplicate(sources))
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                closure(end, true, |node| self.path_sources(node, inner, graph))
            }
            PropertyPathExpression::OneOrMore(inner) => {
                closure(end, false, |node| self.path_sources(node, inner, graph))
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                let mut sources = vec![end.clone()];
                sources.extend(self.path_sources(end, inner, graph)?);
                Ok(deduplicate(sources))
            }
            PropertyPathExpression::NegatedPropertySet(excluded) => Ok(deduplicate(
                self.triples_for_pattern(None, None, Some(end.as_ref()), graph)?
                    .into_iter()
                    .filter(|triple| !excluded.contains(&triple.predicate))
                    .map(|triple| triple.subject.into())
                    .collect(),
            )),
        }
    }

    /// Returns all `(start, end)` pairs connected by `path`.
    fn path_pairs(
        &self,
        path: &PropertyPathExpression,
        graph: &ActiveGraph,
    ) -> Result<Vec<(Term, Term)>, QueryEvaluationError> {
        let mut pairs = Vec::new();
        for start in self.graph_nodes(graph)? {
            for end in self.path_targets(&start, path, graph)? {
                pairs.push((start.clone(), end));
            }
        }
        Ok(pairs)
    }

    /// The subjects and objects of the active graph.
    fn graph_nodes(&self, graph: &ActiveGraph) -> Result<Vec<Term>, QueryEvaluationError> {
        let mut nodes = Vec::new();
        for triple in self.triples_for_pattern(None, None, None, graph)? {
            nodes.push(triple.subject.into());
            nodes.push(triple.object);
        }
        Ok(deduplicate(nodes))
    }
}

/// Transitive closure of `step`, starting at `start`.
fn closure(
    start: &Term,
    include_start: bool,
    step: impl Fn(&Term) -> Result<Vec<Term>, QueryEvaluationError>,
) -> Result<Vec<Term>, QueryEvaluationError> {
    let mut visited = FxHashSet::default();
    let mut result = Vec::new();
    if include_start {
        visited.insert(start.clone());
        result.push(start.clone());
    }
    let mut frontier = vec![start.clone()];
    while let Some(node) = frontier.pop() {
        for next in step(&node)? {
            if visited.insert(next.clone()) {
                result.push(next.clone());
                frontier.push(next);
            }
        }
    }
    Ok(result)
}

fn bind_all(solution: &Solution, variable: &Variable, terms: Vec<Term>) -> Vec<Solution> {
    terms
        .into_iter()
        .filter_map(|term| solution.with(variable.clone(), term))
        .collect()
}

fn as_subject(term: &Term) -> Option<SubjectRef<'_>> {
    match term {
        Term::NamedNode(node) => Some(node.as_ref().into()),
        Term::BlankNode(node) => Some(node.as_ref().into()),
        Term::Literal(_) => None,
    }
}

fn deduplicate(terms: Vec<Term>) -> Vec<Term> {
    terms.into_iter().unique().collect()
}
