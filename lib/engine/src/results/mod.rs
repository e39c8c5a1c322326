use oxrdfio::{RdfFormat, RdfSerializer};
use rdf_hooks_model::VariableRef;
use sparesults::{QueryResultsFormat, QueryResultsSerializer};
use std::io::Write;

mod query_solution;
mod triples;

use crate::sparql::error::QueryEvaluationError;
pub use query_solution::QuerySolutionIter;
pub use sparesults::QuerySolution;
pub use triples::QueryTripleIter;

/// Results of a [SPARQL query](https://www.w3.org/TR/sparql11-query/).
pub enum QueryResults {
    /// Results of a [SELECT](https://www.w3.org/TR/sparql11-query/#select) query.
    Solutions(QuerySolutionIter),
    /// Result of a [ASK](https://www.w3.org/TR/sparql11-query/#ask) query.
    Boolean(bool),
    /// Results of a [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct) or
    /// [DESCRIBE](https://www.w3.org/TR/sparql11-query/#describe) query.
    Graph(QueryTripleIter),
}

impl QueryResults {
    /// Writes the query results (solutions or boolean).
    ///
    /// Graph results are written as solutions binding `?subject`, `?predicate` and `?object`.
    pub fn write<W: Write>(
        self,
        writer: W,
        format: QueryResultsFormat,
    ) -> Result<W, QueryEvaluationError> {
        let serializer = QueryResultsSerializer::from_format(format);
        match self {
            Self::Boolean(value) => serializer.serialize_boolean_to_writer(writer, value),
            Self::Solutions(solutions) => {
                let mut serializer = serializer
                    .serialize_solutions_to_writer(writer, solutions.variables().to_vec())
                    .map_err(QueryEvaluationError::ResultsSerialization)?;
                for solution in solutions {
                    serializer
                        .serialize(&solution?)
                        .map_err(QueryEvaluationError::ResultsSerialization)?;
                }
                serializer.finish()
            }
            Self::Graph(triples) => {
                let s = VariableRef::new_unchecked("subject");
                let p = VariableRef::new_unchecked("predicate");
                let o = VariableRef::new_unchecked("object");
                let mut serializer = serializer
                    .serialize_solutions_to_writer(
                        writer,
                        vec![s.into_owned(), p.into_owned(), o.into_owned()],
                    )
                    .map_err(QueryEvaluationError::ResultsSerialization)?;

                for triple in triples {
                    let triple = triple?;
                    serializer
                        .serialize([
                            (s, &triple.subject.into()),
                            (p, &triple.predicate.into()),
                            (o, &triple.object),
                        ])
                        .map_err(QueryEvaluationError::ResultsSerialization)?;
                }

                serializer.finish()
            }
        }
        .map_err(QueryEvaluationError::ResultsSerialization)
    }

    /// Writes the graph query results.
    ///
    /// This method fails if it is called on the `Solution` or `Boolean` results.
    pub fn write_graph<W: Write>(
        self,
        writer: W,
        format: impl Into<RdfFormat>,
    ) -> Result<W, QueryEvaluationError> {
        if let Self::Graph(triples) = self {
            let mut serializer = RdfSerializer::from_format(format.into()).for_writer(writer);

            for triple in triples {
                serializer
                    .serialize_triple(&triple?)
                    .map_err(QueryEvaluationError::ResultsSerialization)?;
            }

            serializer
                .finish()
                .map_err(QueryEvaluationError::ResultsSerialization)
        } else {
            Err(QueryEvaluationError::NotAGraph)
        }
    }
}

impl From<QuerySolutionIter> for QueryResults {
    #[inline]
    fn from(value: QuerySolutionIter) -> Self {
        Self::Solutions(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks_model::{Literal, NamedNode, Variable};
    use std::sync::Arc;

    #[test]
    fn booleans_are_written_as_json() {
        let buffer = QueryResults::Boolean(true)
            .write(Vec::new(), QueryResultsFormat::Json)
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            r#"{"head":{},"boolean":true}"#
        );
    }

    #[test]
    fn solutions_are_written_as_tsv() {
        let variables: Arc<[Variable]> = Arc::new([
            Variable::new_unchecked("s"),
            Variable::new_unchecked("o"),
        ]);
        let solutions = vec![
            Ok(QuerySolution::from((
                Arc::clone(&variables),
                vec![
                    Some(NamedNode::new_unchecked("http://example.com/a").into()),
                    Some(Literal::from(1).into()),
                ],
            ))),
            Ok(QuerySolution::from((Arc::clone(&variables), vec![None, None]))),
        ];
        let results =
            QueryResults::Solutions(QuerySolutionIter::new(variables, solutions.into_iter()));

        let buffer = results.write(Vec::new(), QueryResultsFormat::Tsv).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "?s\t?o\n<http://example.com/a>\t1\n\t\n"
        );
    }

    #[test]
    fn only_graphs_are_written_as_rdf() {
        let result = QueryResults::Boolean(false).write_graph(Vec::new(), RdfFormat::Turtle);
        assert!(matches!(result, Err(QueryEvaluationError::NotAGraph)));
    }
}
