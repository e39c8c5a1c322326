use crate::error::StorageError;
use crate::eval::SimpleEvaluator;
use crate::memory::MemoryQuadStorage;
use crate::quad_storage::QuadStorage;
use rdf_hooks_model::{
    GraphName, GraphNameRef, NamedNode, NamedNodeRef, Quad, SubjectRef, TermRef, Triple,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// The graphs that graph functions created during a single query evaluation.
///
/// The triples live in an overlay owned by the evaluation and never reach the shared storage, so
/// concurrent queries neither see nor purge each other's graphs.
#[derive(Debug, Default)]
pub struct TemporaryGraphs {
    graphs: Mutex<Vec<NamedNode>>,
    overlay: MemoryQuadStorage,
}

impl TemporaryGraphs {
    fn lock(&self) -> MutexGuard<'_, Vec<NamedNode>> {
        // The list stays consistent even if a holder panicked.
        self.graphs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `graph` for cleanup.
    pub fn register(&self, graph: NamedNode) {
        let mut graphs = self.lock();
        if !graphs.contains(&graph) {
            graphs.push(graph);
        }
    }

    pub fn contains(&self, graph: NamedNodeRef<'_>) -> bool {
        self.lock().iter().any(|g| g.as_ref() == graph)
    }

    pub fn graphs(&self) -> Vec<NamedNode> {
        self.lock().clone()
    }

    /// Registers `graph` and adds `triples` to it. Returns the number of new triples.
    pub fn insert(
        &self,
        graph: &NamedNode,
        triples: impl IntoIterator<Item = Triple>,
    ) -> Result<usize, StorageError> {
        self.register(graph.clone());
        let graph_name = GraphName::from(graph.clone());
        self.overlay.extend(
            triples
                .into_iter()
                .map(|triple| triple.in_graph(graph_name.clone()))
                .collect(),
        )
    }

    /// Returns the quads of the temporary graphs matching the pattern. `None` matches every
    /// temporary graph.
    pub fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph: Option<NamedNodeRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError> {
        self.overlay
            .quads_for_pattern(subject, predicate, object, graph.map(GraphNameRef::from))
    }

    /// Drops all registered graphs. Failures are logged.
    pub(crate) fn purge(&self) {
        let graphs = std::mem::take(&mut *self.lock());
        for graph in graphs {
            match self.overlay.remove_named_graph(graph.as_ref().into()) {
                Ok(_) => debug!(graph = %graph, "Purged temporary graph"),
                Err(error) => warn!(graph = %graph, %error, "Could not purge temporary graph"),
            }
        }
    }

    /// Number of triples held by the temporary graphs.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.overlay.len()
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

/// Purges the temporary graphs of an evaluation when dropped.
///
/// The results of a query carry the guard, so the graphs are removed once the results are
/// consumed, fail, or are dropped early.
#[must_use]
pub struct TemporaryGraphGuard {
    evaluator: SimpleEvaluator,
}

impl TemporaryGraphGuard {
    pub fn new(evaluator: SimpleEvaluator) -> Self {
        Self { evaluator }
    }
}

impl Drop for TemporaryGraphGuard {
    fn drop(&mut self) {
        self.evaluator.purge_temporary_graphs();
    }
}
