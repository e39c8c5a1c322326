//! API to access an in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
//!
//! The entry point of the module is the [`Store`] struct.
//!
//! Usage example:
//! ```
//! use rdf_hooks::model::*;
//! use rdf_hooks::sparql::QueryResults;
//! use rdf_hooks::store::Store;
//!
//! let store = Store::new();
//!
//! // insertion
//! let ex = NamedNode::new("http://example.com")?;
//! let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
//! store.insert(&quad)?;
//!
//! // quad filter
//! let results = store.quads_for_pattern(None, None, None, None)?;
//! assert_eq!(vec![quad], results);
//!
//! // SPARQL query
//! if let QueryResults::Solutions(mut solutions) = store.query("SELECT ?s WHERE { ?s ?p ?o }")? {
//!     assert_eq!(solutions.next().unwrap()?.get("s"), Some(&ex.into()));
//! };
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::{LoaderError, QueryError, SerializerError};
use oxrdfio::{RdfParser, RdfSerializer};
use rdf_hooks_engine::error::StorageError;
use rdf_hooks_engine::sparql::{
    evaluate_query, evaluate_update, Query, QueryOptions, QueryResults, Update, UpdateOptions,
};
use rdf_hooks_engine::{MemoryQuadStorage, QuadStorage};
use rdf_hooks_model::{
    GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, SubjectRef,
    TermRef,
};
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::debug;

/// An [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) store.
///
/// The store can be updated and queried using [SPARQL](https://www.w3.org/TR/sparql11-query).
/// Custom functions are plugged into the evaluation through [QueryOptions].
///
/// Cloning a store is cheap: all clones share the same storage.
#[derive(Clone)]
pub struct Store {
    storage: Arc<dyn QuadStorage>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a [Store] with a [MemoryQuadStorage] as backing storage.
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryQuadStorage::new()))
    }

    /// Creates a [Store] on top of `storage`.
    pub fn with_storage(storage: Arc<dyn QuadStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn QuadStorage> {
        &self.storage
    }

    /// Executes a [SPARQL](https://www.w3.org/TR/sparql11-query/) query.
    ///
    /// Usage example:
    /// ```
    /// use rdf_hooks::model::*;
    /// use rdf_hooks::sparql::QueryResults;
    /// use rdf_hooks::store::Store;
    ///
    /// let store = Store::new();
    ///
    /// // insertions
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// store.insert(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?;
    ///
    /// // SPARQL query
    /// if let QueryResults::Solutions(mut solutions) = store.query("SELECT ?s WHERE { ?s ?p ?o }")? {
    ///     assert_eq!(
    ///         solutions.next().unwrap()?.get("s"),
    ///         Some(&ex.into_owned().into())
    ///     );
    /// }
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn query(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryError>>,
    ) -> Result<QueryResults, QueryError> {
        self.query_opt(query, &QueryOptions::default())
    }

    /// Executes a [SPARQL 1.1 query](https://www.w3.org/TR/sparql11-query/) with some options.
    ///
    /// The results are lazy. Temporary graphs created by graph functions are only visible to this
    /// query and are removed once the results are consumed or dropped. The store is never
    /// modified by a query.
    ///
    /// Usage example with a custom function:
    /// ```
    /// use rdf_hooks::functions::{FunctionDefinition, FunctionOutput, FunctionRegistry};
    /// use rdf_hooks::model::*;
    /// use rdf_hooks::sparql::{QueryOptions, QueryResults};
    /// use rdf_hooks::store::Store;
    /// use std::sync::Arc;
    ///
    /// let mut registry = FunctionRegistry::new();
    /// registry.register(
    ///     FunctionDefinition::extension("answer", |_| Ok(FunctionOutput::scalar(42)))
    ///         .with_namespace("urn:f:"),
    /// )?;
    /// let options = QueryOptions::default().with_custom_evaluator(Arc::new(registry));
    ///
    /// let store = Store::new();
    /// if let QueryResults::Solutions(mut solutions) =
    ///     store.query_opt("SELECT ?x WHERE { BIND(<urn:f:answer>() AS ?x) }", &options)?
    /// {
    ///     assert_eq!(
    ///         solutions.next().unwrap()?.get("x"),
    ///         Some(&Literal::from(42).into())
    ///     );
    /// }
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn query_opt(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryError>>,
        options: &QueryOptions,
    ) -> Result<QueryResults, QueryError> {
        let query = query.try_into().map_err(Into::into)?;
        debug!(%query, "Evaluating query");
        Ok(evaluate_query(Arc::clone(&self.storage), &query, options)?)
    }

    /// Executes a [SPARQL 1.1 update](https://www.w3.org/TR/sparql11-update/).
    ///
    /// Usage example:
    /// ```
    /// use rdf_hooks::model::*;
    /// use rdf_hooks::store::Store;
    ///
    /// let store = Store::new();
    ///
    /// // insertion
    /// store.update(
    ///     "INSERT DATA { <http://example.com> <http://example.com> <http://example.com> }",
    /// )?;
    ///
    /// // we inspect the store contents
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn update(
        &self,
        update: impl TryInto<Update, Error = impl Into<QueryError>>,
    ) -> Result<(), QueryError> {
        self.update_opt(update, UpdateOptions::default())
    }

    /// Executes a [SPARQL 1.1 update](https://www.w3.org/TR/sparql11-update/) with some options.
    ///
    /// The options are used to evaluate the `WHERE` clauses of the update.
    pub fn update_opt(
        &self,
        update: impl TryInto<Update, Error = impl Into<QueryError>>,
        options: impl Into<UpdateOptions>,
    ) -> Result<(), QueryError> {
        let update = update.try_into().map_err(Into::into)?;
        debug!(%update, "Applying update");
        Ok(evaluate_update(
            Arc::clone(&self.storage),
            &update,
            &options.into(),
        )?)
    }

    /// Retrieves quads with a filter on each quad component.
    pub fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError> {
        self.storage
            .quads_for_pattern(subject, predicate, object, graph_name)
    }

    /// Returns all the quads contained in the store.
    pub fn quads(&self) -> Result<Vec<Quad>, StorageError> {
        self.quads_for_pattern(None, None, None, None)
    }

    /// Checks if this store contains a given quad.
    ///
    /// Usage example:
    /// ```
    /// use rdf_hooks::model::*;
    /// use rdf_hooks::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, ex);
    ///
    /// let store = Store::new();
    /// assert!(!store.contains(quad)?);
    ///
    /// store.insert(quad)?;
    /// assert!(store.contains(quad)?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        let quad = quad.into();
        Ok(!self
            .quads_for_pattern(
                Some(quad.subject),
                Some(quad.predicate),
                Some(quad.object),
                Some(quad.graph_name),
            )?
            .is_empty())
    }

    /// Returns the number of quads in the store.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.storage.len()
    }

    /// Returns if the store is empty.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Loads a RDF file into the store and returns the number of new quads.
    ///
    /// Blank nodes are renamed, so loading the same file twice duplicates its blank nodes.
    ///
    /// Usage example:
    /// ```
    /// use rdf_hooks::io::{RdfFormat, RdfParser};
    /// use rdf_hooks::model::*;
    /// use rdf_hooks::store::Store;
    ///
    /// let store = Store::new();
    ///
    /// // insert a dataset file
    /// let file = b"<http://example.com> <http://example.com> <http://example.com> <http://example.com/g> .";
    /// store.load_from_reader(RdfFormat::NQuads, file.as_ref())?;
    ///
    /// // insert a graph file into a named graph
    /// let file = b"<> <> <> .";
    /// store.load_from_reader(
    ///     RdfParser::from_format(RdfFormat::Turtle)
    ///         .with_base_iri("http://example.com")?
    ///         .without_named_graphs()
    ///         .with_default_graph(NamedNodeRef::new("http://example.com/g2")?),
    ///     file.as_ref()
    /// )?;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, NamedNodeRef::new("http://example.com/g")?))?);
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, NamedNodeRef::new("http://example.com/g2")?))?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn load_from_reader(
        &self,
        parser: impl Into<RdfParser>,
        reader: impl Read,
    ) -> Result<usize, LoaderError> {
        let quads = parser
            .into()
            .rename_blank_nodes()
            .for_reader(reader)
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.storage.extend(quads)?;
        debug!(inserted, "Loaded quads");
        Ok(inserted)
    }

    /// Adds a quad to this store.
    ///
    /// Returns `true` if the quad was not already in the store.
    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.storage.insert(quad.into())
    }

    /// Adds a set of quads to this store and returns the number of new quads.
    pub fn extend(
        &self,
        quads: impl IntoIterator<Item = impl Into<Quad>>,
    ) -> Result<usize, StorageError> {
        let quads = quads.into_iter().map(Into::into).collect::<Vec<_>>();
        self.storage.extend(quads)
    }

    /// Removes a quad from this store.
    ///
    /// Returns `true` if the quad was in the store and has been removed.
    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.storage.remove(quad.into())
    }

    /// Dumps the store into a file.
    ///
    /// ```
    /// use rdf_hooks::io::RdfFormat;
    /// use rdf_hooks::store::Store;
    ///
    /// let file =
    ///     "<http://example.com> <http://example.com> <http://example.com> <http://example.com> .\n"
    ///         .as_bytes();
    ///
    /// let store = Store::new();
    /// store.load_from_reader(RdfFormat::NQuads, file)?;
    ///
    /// let buffer = store.dump_to_writer(RdfFormat::NQuads, Vec::new())?;
    /// assert_eq!(file, buffer.as_slice());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn dump_to_writer<W: Write>(
        &self,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let serializer = serializer.into();
        if !serializer.format().supports_datasets() {
            return Err(SerializerError::DatasetFormatExpected(serializer.format()));
        }
        let mut serializer = serializer.for_writer(writer);
        for quad in self.quads()? {
            serializer.serialize_quad(&quad)?;
        }
        Ok(serializer.finish()?)
    }

    /// Dumps a store graph into a file.
    pub fn dump_graph_to_writer<'a, W: Write>(
        &self,
        from_graph_name: impl Into<GraphNameRef<'a>>,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let mut serializer = serializer.into().for_writer(writer);
        for quad in self.quads_for_pattern(None, None, None, Some(from_graph_name.into()))? {
            serializer.serialize_triple(quad.as_ref())?;
        }
        Ok(serializer.finish()?)
    }

    /// Returns all the store named graphs.
    pub fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        self.storage.named_graphs()
    }

    /// Checks if the store contains a given graph.
    pub fn contains_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedOrBlankNodeRef<'a>>,
    ) -> Result<bool, StorageError> {
        self.storage.contains_named_graph(graph_name.into())
    }

    /// Inserts an empty graph into this store.
    ///
    /// Returns `true` if the graph was not already in the store.
    pub fn insert_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedOrBlankNodeRef<'a>>,
    ) -> Result<bool, StorageError> {
        self.storage.insert_named_graph(graph_name.into())
    }

    /// Removes all the quads of a graph. Named graphs stay in the store, empty.
    pub fn clear_graph<'a>(
        &self,
        graph_name: impl Into<GraphNameRef<'a>>,
    ) -> Result<(), StorageError> {
        self.storage.clear_graph(graph_name.into())
    }

    /// Removes a graph from this store.
    ///
    /// Returns `true` if the graph was in the store and has been removed.
    pub fn remove_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedOrBlankNodeRef<'a>>,
    ) -> Result<bool, StorageError> {
        self.storage.remove_named_graph(graph_name.into())
    }

    /// Clears the store.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.clear()
    }
}
