use crate::results::QuerySolutionIter;
use crate::sparql::error::QueryEvaluationError;
use rdf_hooks_model::{BlankNode, Graph, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use sparesults::QuerySolution;
use spargebra::term::{TermPattern, TriplePattern};

/// An iterator over the triples that compose a graph solution.
pub struct QueryTripleIter {
    inner: Box<dyn Iterator<Item = Result<Triple, QueryEvaluationError>>>,
}

impl QueryTripleIter {
    /// Instantiates the `CONSTRUCT` template once per solution.
    pub fn new(template: Vec<TriplePattern>, solutions: QuerySolutionIter) -> Self {
        Self {
            inner: Box::new(ConstructIter {
                template,
                solutions,
                buffered_results: Vec::new(),
                already_emitted_results: FxHashSet::default(),
                bnodes: FxHashMap::default(),
            }),
        }
    }

    /// Wraps triples that have already been computed.
    pub fn from_triples(
        triples: impl Iterator<Item = Result<Triple, QueryEvaluationError>> + 'static,
    ) -> Self {
        Self {
            inner: Box::new(triples),
        }
    }

    pub fn collect_as_graph(self) -> Result<Graph, QueryEvaluationError> {
        let mut graph = Graph::new();
        for triple in self {
            graph.insert(triple?.as_ref());
        }
        Ok(graph)
    }
}

impl Iterator for QueryTripleIter {
    type Item = Result<Triple, QueryEvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

struct ConstructIter {
    template: Vec<TriplePattern>,
    solutions: QuerySolutionIter,
    buffered_results: Vec<Result<Triple, QueryEvaluationError>>,
    already_emitted_results: FxHashSet<Triple>,
    bnodes: FxHashMap<BlankNode, BlankNode>,
}

impl Iterator for ConstructIter {
    type Item = Result<Triple, QueryEvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.buffered_results.pop() {
                return Some(result);
            }

            let solution = match self.solutions.next()? {
                Ok(solution) => solution,
                Err(error) => return Some(Err(error)),
            };

            for template in &self.template {
                let subject =
                    get_triple_template_value(&template.subject, &solution, &mut self.bnodes)
                        .and_then(|t| t.try_into().ok());
                let predicate = get_triple_template_value(
                    &TermPattern::from(template.predicate.clone()),
                    &solution,
                    &mut self.bnodes,
                )
                .and_then(|t| t.try_into().ok());
                let object =
                    get_triple_template_value(&template.object, &solution, &mut self.bnodes);

                if let (Some(subject), Some(predicate), Some(object)) = (subject, predicate, object)
                {
                    let triple = Triple {
                        subject,
                        predicate,
                        object,
                    };
                    // Fresh blank nodes are allocated per solution, so such triples are new.
                    let new_triple = triple.subject.is_blank_node()
                        || triple.object.is_blank_node()
                        || self.already_emitted_results.insert(triple.clone());
                    if new_triple {
                        self.buffered_results.push(Ok(triple));
                    }
                }
            }
            self.bnodes.clear();
        }
    }
}

fn get_triple_template_value(
    selector: &TermPattern,
    solution: &QuerySolution,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match selector {
        TermPattern::NamedNode(nn) => Some(Term::NamedNode(nn.clone())),
        TermPattern::BlankNode(bnode) => Some(Term::BlankNode(
            bnodes.entry(bnode.clone()).or_default().clone(),
        )),
        TermPattern::Literal(term) => Some(Term::Literal(term.clone())),
        TermPattern::Variable(v) => solution.get(v).cloned(),
    }
}
