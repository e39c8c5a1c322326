//! [SPARQL](https://www.w3.org/TR/sparql11-overview/) implementation.

mod algebra;
pub mod error;
mod eval;
mod update;

use crate::eval::CustomEvaluator;
pub use crate::results::{QueryResults, QuerySolution, QuerySolutionIter, QueryTripleIter};
pub use crate::sparql::algebra::{Query, QueryDataset, Update};
pub use eval::evaluate_query;
pub use rdf_hooks_model::{Variable, VariableNameParseError};
pub use sparesults::QueryResultsFormat;
pub use spargebra::SparqlSyntaxError;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
pub use update::evaluate_update;

/// Options for SPARQL query evaluation.
#[derive(Clone, Default)]
pub struct QueryOptions {
    /// The hooks that are offered every algebra node before the default evaluation, in order.
    pub custom_evaluators: Vec<Arc<dyn CustomEvaluator>>,
}

impl QueryOptions {
    /// Appends a hook to [Self::custom_evaluators].
    #[must_use]
    pub fn with_custom_evaluator(mut self, evaluator: Arc<dyn CustomEvaluator>) -> Self {
        self.custom_evaluators.push(evaluator);
        self
    }
}

impl Debug for QueryOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOptions")
            .field("custom_evaluators", &self.custom_evaluators.len())
            .finish()
    }
}

/// Options for SPARQL update evaluation.
#[derive(Clone, Debug, Default)]
pub struct UpdateOptions {
    /// The options used to evaluate the `WHERE` clauses.
    pub query_options: QueryOptions,
}

impl From<QueryOptions> for UpdateOptions {
    #[inline]
    fn from(query_options: QueryOptions) -> Self {
        Self { query_options }
    }
}
