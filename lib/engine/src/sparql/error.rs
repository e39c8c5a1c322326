use crate::error::StorageError;
use rdf_hooks_model::NamedNode;
use std::convert::Infallible;
use std::error::Error;
use std::io;

/// A SPARQL evaluation error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An error returned during results serialization.
    #[error(transparent)]
    ResultsSerialization(io::Error),
    /// A registered function could not be evaluated.
    #[error("Error while evaluating the function <{function}>: {message}")]
    Function { function: NamedNode, message: String },
    /// A custom evaluator failed for another reason.
    #[error("{0}")]
    CustomEvaluator(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// Error when `CREATE` tries to create an already existing graph
    #[error("The graph {0} already exists")]
    GraphAlreadyExists(NamedNode),
    /// Error when `DROP` or `CLEAR` tries to remove a not existing graph
    #[error("The graph {0} does not exist")]
    GraphDoesNotExist(NamedNode),
    /// The variable storing the `SERVICE` name is unbound
    #[error("The variable encoding the service name is unbound")]
    UnboundService,
    /// The given `SERVICE` is not supported
    #[error("The service {0} is not supported")]
    UnsupportedService(NamedNode),
    /// The results are not a RDF graph
    #[error("The query results are not a RDF graph")]
    NotAGraph,
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
    #[error("An internal error that likely indicates towards a bug in rdf-hooks: {0}")]
    InternalError(String),
}

impl QueryEvaluationError {
    pub fn internal<T>(cause: String) -> Result<T, Self> {
        Err(QueryEvaluationError::InternalError(cause))
    }

    /// Creates a [QueryEvaluationError::Function] error.
    pub fn function(function: &NamedNode, message: impl Into<String>) -> Self {
        Self::Function {
            function: function.clone(),
            message: message.into(),
        }
    }
}

impl From<Infallible> for QueryEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}
