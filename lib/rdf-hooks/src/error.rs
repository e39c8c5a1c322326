use oxrdfio::{RdfFormat, RdfParseError};
use rdf_hooks_engine::error::StorageError;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::sparql::SparqlSyntaxError;
use std::convert::Infallible;
use std::io;

/// An error raised while loading a file into a [`Store`](crate::store::Store).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// An error raised while reading the file.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// An error raised during the insertion in the store.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LoaderError> for io::Error {
    #[inline]
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Storage(error) => error.into(),
            LoaderError::Parsing(error) => error.into(),
        }
    }
}

/// An error raised while writing a file from a [`Store`](crate::store::Store).
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// An error raised while writing the content.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error raised while reading the quads of the [`Store`](crate::store::Store).
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A format compatible with [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) is required.
    #[error("A RDF format supporting datasets was expected, {0} found")]
    DatasetFormatExpected(RdfFormat),
}

/// An error raised by [`Store::query`](crate::store::Store::query) and
/// [`Store::update`](crate::store::Store::update).
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query or update is not valid SPARQL.
    #[error(transparent)]
    Parsing(#[from] SparqlSyntaxError),
    /// The evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
}

impl From<Infallible> for QueryError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

impl From<StorageError> for QueryError {
    #[inline]
    fn from(error: StorageError) -> Self {
        Self::Evaluation(error.into())
    }
}
