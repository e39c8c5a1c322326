use crate::error::StorageError;
use crate::quad_storage::QuadStorage;
use rdf_hooks_model::{
    Dataset, GraphName, GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad,
    QuadRef, SubjectRef, TermRef,
};
use rustc_hash::FxHashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An in-memory [QuadStorage] backed by an [rdf_hooks_model::Dataset].
#[derive(Debug, Default)]
pub struct MemoryQuadStorage {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    dataset: Dataset,
    named_graphs: FxHashSet<NamedOrBlankNode>,
}

impl MemoryState {
    fn register_graph(&mut self, graph_name: GraphNameRef<'_>) {
        match graph_name {
            GraphNameRef::NamedNode(node) => {
                self.named_graphs.insert(node.into_owned().into());
            }
            GraphNameRef::BlankNode(node) => {
                self.named_graphs.insert(node.into_owned().into());
            }
            GraphNameRef::DefaultGraph => {}
        }
    }

    fn clear_graph(&mut self, graph_name: GraphNameRef<'_>) {
        let quads = self
            .dataset
            .quads_for_graph_name(graph_name)
            .map(QuadRef::into_owned)
            .collect::<Vec<_>>();
        for quad in &quads {
            self.dataset.remove(quad);
        }
    }
}

impl MemoryQuadStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StorageError> {
        self.state.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StorageError> {
        self.state.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl QuadStorage for MemoryQuadStorage {
    fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError> {
        let state = self.read()?;
        let dataset = &state.dataset;

        // Start from the most selective index, the remaining positions are filtered below.
        let candidates: Box<dyn Iterator<Item = QuadRef<'_>> + '_> = if let Some(subject) = subject
        {
            Box::new(dataset.quads_for_subject(subject))
        } else if let Some(object) = object {
            Box::new(dataset.quads_for_object(object))
        } else if let Some(predicate) = predicate {
            Box::new(dataset.quads_for_predicate(predicate))
        } else if let Some(graph_name) = graph_name {
            Box::new(dataset.quads_for_graph_name(graph_name))
        } else {
            Box::new(dataset.iter())
        };

        Ok(candidates
            .filter(|quad| {
                subject.map_or(true, |s| quad.subject == s)
                    && predicate.map_or(true, |p| quad.predicate == p)
                    && object.map_or(true, |o| quad.object == o)
                    && graph_name.map_or(true, |g| quad.graph_name == g)
            })
            .map(QuadRef::into_owned)
            .collect())
    }

    fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        state.register_graph(quad.graph_name);
        Ok(state.dataset.insert(quad))
    }

    fn extend(&self, quads: Vec<Quad>) -> Result<usize, StorageError> {
        let mut state = self.write()?;
        let mut inserted = 0;
        for quad in &quads {
            state.register_graph(quad.graph_name.as_ref());
            if state.dataset.insert(quad) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        Ok(self.write()?.dataset.remove(quad))
    }

    fn insert_named_graph(
        &self,
        graph_name: NamedOrBlankNodeRef<'_>,
    ) -> Result<bool, StorageError> {
        Ok(self.write()?.named_graphs.insert(graph_name.into_owned()))
    }

    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        let mut graphs = self.read()?.named_graphs.iter().cloned().collect::<Vec<_>>();
        graphs.sort_by_cached_key(ToString::to_string);
        Ok(graphs)
    }

    fn contains_named_graph(
        &self,
        graph_name: NamedOrBlankNodeRef<'_>,
    ) -> Result<bool, StorageError> {
        Ok(self
            .read()?
            .named_graphs
            .contains(&graph_name.into_owned()))
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.write()?;
        state.dataset.clear();
        state.named_graphs.clear();
        Ok(())
    }

    fn clear_graph(&self, graph_name: GraphNameRef<'_>) -> Result<(), StorageError> {
        self.write()?.clear_graph(graph_name);
        Ok(())
    }

    fn remove_named_graph(
        &self,
        graph_name: NamedOrBlankNodeRef<'_>,
    ) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        let graph_name = graph_name.into_owned();
        state.clear_graph(GraphName::from(graph_name.clone()).as_ref());
        Ok(state.named_graphs.remove(&graph_name))
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.dataset.len())
    }
}
