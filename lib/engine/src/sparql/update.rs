use crate::eval::{EvalContext, SimpleEvaluator, TemporaryGraphGuard};
use crate::plan::{ground_term_to_term, AlgebraNode};
use crate::quad_storage::QuadStorage;
use crate::solution::Solution;
use crate::sparql::algebra::QueryDataset;
use crate::sparql::error::QueryEvaluationError;
use crate::sparql::{Update, UpdateOptions};
use rdf_hooks_model::{
    BlankNode, GraphName, GraphNameRef, Iri, NamedNode, NamedOrBlankNode, Quad, Subject, Term,
};
use rustc_hash::FxHashMap;
use spargebra::algebra::{GraphPattern, GraphTarget};
use spargebra::term::{
    GraphNamePattern, GroundQuad, GroundQuadPattern, GroundSubject, GroundTermPattern,
    NamedNodePattern, QuadPattern, TermPattern,
};
use std::sync::Arc;
use tracing::debug;

/// Applies all operations of `update` to `storage`, in order.
pub fn evaluate_update(
    storage: Arc<dyn QuadStorage>,
    update: &Update,
    options: &UpdateOptions,
) -> Result<(), QueryEvaluationError> {
    let evaluator = UpdateEvaluator {
        storage,
        base_iri: update.inner.base_iri.clone(),
        options,
    };
    for operation in &update.inner.operations {
        evaluator.apply(operation)?;
    }
    Ok(())
}

struct UpdateEvaluator<'a> {
    storage: Arc<dyn QuadStorage>,
    base_iri: Option<Iri<String>>,
    options: &'a UpdateOptions,
}

impl UpdateEvaluator<'_> {
    fn apply(
        &self,
        operation: &spargebra::GraphUpdateOperation,
    ) -> Result<(), QueryEvaluationError> {
        match operation {
            spargebra::GraphUpdateOperation::InsertData { data } => {
                let mut bnodes = FxHashMap::default();
                let quads = data
                    .iter()
                    .map(|quad| {
                        let subject = match &quad.subject {
                            Subject::BlankNode(node) => fresh_blank_node(node, &mut bnodes).into(),
                            subject => subject.clone(),
                        };
                        let object = match &quad.object {
                            Term::BlankNode(node) => fresh_blank_node(node, &mut bnodes).into(),
                            object => object.clone(),
                        };
                        Quad::new(
                            subject,
                            quad.predicate.clone(),
                            object,
                            graph_name(&quad.graph_name),
                        )
                    })
                    .collect::<Vec<_>>();
                let inserted = self.storage.extend(quads)?;
                debug!(inserted, "Applied INSERT DATA");
                Ok(())
            }
            spargebra::GraphUpdateOperation::DeleteData { data } => {
                for quad in data {
                    self.storage.remove(ground_quad(quad).as_ref())?;
                }
                Ok(())
            }
            spargebra::GraphUpdateOperation::DeleteInsert {
                delete,
                insert,
                using,
                pattern,
            } => self.delete_insert(delete, insert, using.as_ref(), pattern),
            spargebra::GraphUpdateOperation::Load { silent, source, .. } => {
                if *silent {
                    Ok(())
                } else {
                    Err(QueryEvaluationError::NotImplemented(format!(
                        "LOAD of {source}, the store has no HTTP client"
                    )))
                }
            }
            spargebra::GraphUpdateOperation::Clear { graph, silent } => match graph {
                GraphTarget::NamedNode(graph) => {
                    if self.storage.contains_named_graph(graph.as_ref().into())? {
                        Ok(self.storage.clear_graph(graph.as_ref().into())?)
                    } else if *silent {
                        Ok(())
                    } else {
                        Err(QueryEvaluationError::GraphDoesNotExist(graph.clone()))
                    }
                }
                GraphTarget::DefaultGraph => {
                    Ok(self.storage.clear_graph(GraphNameRef::DefaultGraph)?)
                }
                GraphTarget::NamedGraphs => {
                    for graph in self.storage.named_graphs()? {
                        self.storage.clear_graph(named_graph_ref(&graph))?;
                    }
                    Ok(())
                }
                GraphTarget::AllGraphs => {
                    self.storage
                        .clear_graph(GraphNameRef::DefaultGraph)?;
                    for graph in self.storage.named_graphs()? {
                        self.storage.clear_graph(named_graph_ref(&graph))?;
                    }
                    Ok(())
                }
            },
            spargebra::GraphUpdateOperation::Create { graph, silent } => {
                if self.storage.contains_named_graph(graph.as_ref().into())? {
                    if *silent {
                        Ok(())
                    } else {
                        Err(QueryEvaluationError::GraphAlreadyExists(graph.clone()))
                    }
                } else {
                    self.storage.insert_named_graph(graph.as_ref().into())?;
                    Ok(())
                }
            }
            spargebra::GraphUpdateOperation::Drop { graph, silent } => match graph {
                GraphTarget::NamedNode(graph) => {
                    if self.storage.remove_named_graph(graph.as_ref().into())? || *silent {
                        Ok(())
                    } else {
                        Err(QueryEvaluationError::GraphDoesNotExist(graph.clone()))
                    }
                }
                GraphTarget::DefaultGraph => {
                    Ok(self.storage.clear_graph(GraphNameRef::DefaultGraph)?)
                }
                GraphTarget::NamedGraphs => {
                    for graph in self.storage.named_graphs()? {
                        self.storage.remove_named_graph(graph.as_ref())?;
                    }
                    Ok(())
                }
                GraphTarget::AllGraphs => Ok(self.storage.clear()?),
            },
        }
    }

    fn delete_insert(
        &self,
        delete: &[GroundQuadPattern],
        insert: &[QuadPattern],
        using: Option<&spargebra::algebra::QueryDataset>,
        pattern: &GraphPattern,
    ) -> Result<(), QueryEvaluationError> {
        let evaluator = SimpleEvaluator::new(
            Arc::clone(&self.storage),
            QueryDataset::from_algebra(using),
            self.base_iri.clone(),
            self.options.query_options.custom_evaluators.clone(),
        );
        let guard = TemporaryGraphGuard::new(evaluator.clone());
        let node = AlgebraNode::compile(pattern)?;
        let solutions = evaluator
            .evaluate(&node, &EvalContext::default())
            .collect::<Result<Vec<_>, _>>()?;
        drop(guard);

        let mut deleted = Vec::new();
        let mut inserted = Vec::new();
        for solution in &solutions {
            deleted.extend(
                delete
                    .iter()
                    .filter_map(|quad| instantiate_ground_quad_pattern(quad, solution)),
            );
            let mut bnodes = FxHashMap::default();
            inserted.extend(
                insert
                    .iter()
                    .filter_map(|quad| instantiate_quad_pattern(quad, solution, &mut bnodes)),
            );
        }

        for quad in &deleted {
            self.storage.remove(quad.as_ref())?;
        }
        let inserted = self.storage.extend(inserted)?;
        debug!(
            solutions = solutions.len(),
            deleted = deleted.len(),
            inserted,
            "Applied DELETE/INSERT"
        );
        Ok(())
    }
}

fn fresh_blank_node(node: &BlankNode, bnodes: &mut FxHashMap<BlankNode, BlankNode>) -> BlankNode {
    bnodes.entry(node.clone()).or_default().clone()
}

fn graph_name(graph_name: &spargebra::term::GraphName) -> GraphName {
    match graph_name {
        spargebra::term::GraphName::NamedNode(node) => node.clone().into(),
        spargebra::term::GraphName::DefaultGraph => GraphName::DefaultGraph,
    }
}

fn named_graph_ref(graph: &NamedOrBlankNode) -> GraphNameRef<'_> {
    match graph {
        NamedOrBlankNode::NamedNode(node) => node.as_ref().into(),
        NamedOrBlankNode::BlankNode(node) => node.as_ref().into(),
    }
}

fn ground_quad(quad: &GroundQuad) -> Quad {
    let subject = match &quad.subject {
        GroundSubject::NamedNode(node) => node.clone(),
    };
    Quad::new(
        subject,
        quad.predicate.clone(),
        ground_term_to_term(&quad.object),
        graph_name(&quad.graph_name),
    )
}

fn instantiate_ground_quad_pattern(quad: &GroundQuadPattern, solution: &Solution) -> Option<Quad> {
    let subject = match ground_term_pattern(&quad.subject, solution)? {
        Term::NamedNode(node) => Subject::from(node),
        Term::BlankNode(node) => Subject::from(node),
        Term::Literal(_) => return None,
    };
    Some(Quad::new(
        subject,
        named_node_pattern(&quad.predicate, solution)?,
        ground_term_pattern(&quad.object, solution)?,
        graph_name_pattern(&quad.graph_name, solution)?,
    ))
}

fn instantiate_quad_pattern(
    quad: &QuadPattern,
    solution: &Solution,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Quad> {
    let subject = match term_pattern(&quad.subject, solution, bnodes)? {
        Term::NamedNode(node) => Subject::from(node),
        Term::BlankNode(node) => Subject::from(node),
        Term::Literal(_) => return None,
    };
    Some(Quad::new(
        subject,
        named_node_pattern(&quad.predicate, solution)?,
        term_pattern(&quad.object, solution, bnodes)?,
        graph_name_pattern(&quad.graph_name, solution)?,
    ))
}

fn term_pattern(
    pattern: &TermPattern,
    solution: &Solution,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::BlankNode(node) => Some(fresh_blank_node(node, bnodes).into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
    }
}

fn ground_term_pattern(pattern: &GroundTermPattern, solution: &Solution) -> Option<Term> {
    match pattern {
        GroundTermPattern::NamedNode(node) => Some(node.clone().into()),
        GroundTermPattern::Literal(literal) => Some(literal.clone().into()),
        GroundTermPattern::Variable(variable) => solution.get(variable).cloned(),
    }
}

fn named_node_pattern(pattern: &NamedNodePattern, solution: &Solution) -> Option<NamedNode> {
    match pattern {
        NamedNodePattern::NamedNode(node) => Some(node.clone()),
        NamedNodePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => Some(node.clone()),
            _ => None,
        },
    }
}

fn graph_name_pattern(pattern: &GraphNamePattern, solution: &Solution) -> Option<GraphName> {
    match pattern {
        GraphNamePattern::NamedNode(node) => Some(node.clone().into()),
        GraphNamePattern::DefaultGraph => Some(GraphName::DefaultGraph),
        GraphNamePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => Some(node.clone().into()),
            Term::BlankNode(node) => Some(node.clone().into()),
            Term::Literal(_) => None,
        },
    }
}
