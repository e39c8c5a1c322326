use crate::error::StorageError;
use rdf_hooks_model::{
    GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, SubjectRef,
    TermRef,
};

/// The storage layer the evaluator reads quads from and writes updates to.
///
/// Implementations use interior mutability, as the storage is shared between all queries and
/// updates of a store.
#[allow(clippy::len_without_is_empty, reason = "Emptiness is derived by the store")]
pub trait QuadStorage: Send + Sync {
    /// Returns all quads matching the given pattern. `None` matches any term.
    fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError>;

    /// Inserts a single quad. Returns `true` if the quad was not already present.
    fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError>;

    /// Loads the given quads into the storage and returns the number of new quads.
    fn extend(&self, quads: Vec<Quad>) -> Result<usize, StorageError>;

    /// Removes the given quad from the storage.
    fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError>;

    /// Creates an empty named graph in the storage.
    fn insert_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>)
        -> Result<bool, StorageError>;

    /// Returns the list of named graphs in the storage.
    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError>;

    /// Returns whether `graph_name` is a named graph in the storage.
    fn contains_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>)
        -> Result<bool, StorageError>;

    /// Clears the entire storage.
    fn clear(&self) -> Result<(), StorageError>;

    /// Clears the entire graph. Named graphs stay registered.
    fn clear_graph(&self, graph_name: GraphNameRef<'_>) -> Result<(), StorageError>;

    /// Removes the entire named graph from the storage.
    fn remove_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>)
        -> Result<bool, StorageError>;

    /// Returns the number of quads in the storage.
    fn len(&self) -> Result<usize, StorageError>;
}
