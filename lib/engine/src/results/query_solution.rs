use crate::eval::{SolutionIter, TemporaryGraphGuard};
use crate::sparql::error::QueryEvaluationError;
use rdf_hooks_model::Variable;
pub use sparesults::QuerySolution;
use std::sync::Arc;

/// An iterator over [`QuerySolution`]s.
///
/// If the query created temporary graphs, the iterator owns the guard that removes them. The
/// guard is released as soon as the iterator is exhausted or dropped.
pub struct QuerySolutionIter {
    /// The variables used in the query solutions.
    variables: Arc<[Variable]>,
    inner: Box<dyn Iterator<Item = Result<QuerySolution, QueryEvaluationError>>>,
    guard: Option<TemporaryGraphGuard>,
}

impl QuerySolutionIter {
    /// Construct a new iterator of solutions from an ordered list of solution variables and an
    /// iterator of solutions.
    pub fn new(
        variables: Arc<[Variable]>,
        inner: impl Iterator<Item = Result<QuerySolution, QueryEvaluationError>> + 'static,
    ) -> Self {
        Self {
            variables,
            inner: Box::new(inner),
            guard: None,
        }
    }

    /// Projects the solutions of the evaluator onto `variables`.
    pub(crate) fn from_solutions(
        variables: Arc<[Variable]>,
        solutions: SolutionIter,
        guard: TemporaryGraphGuard,
    ) -> Self {
        let projection = Arc::clone(&variables);
        let inner = solutions.map(move |solution| {
            let solution = solution?;
            let values = projection
                .iter()
                .map(|variable| solution.get(variable).cloned())
                .collect::<Vec<_>>();
            Ok(QuerySolution::from((Arc::clone(&projection), values)))
        });
        Self {
            variables,
            inner: Box::new(inner),
            guard: Some(guard),
        }
    }

    /// The variables used in the solutions.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        self.variables.as_ref()
    }
}

impl Iterator for QuerySolutionIter {
    type Item = Result<QuerySolution, QueryEvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next();
        if next.is_none() {
            self.guard = None;
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<QuerySolution>();
    }
}
