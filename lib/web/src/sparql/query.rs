use crate::error::RdfHooksServerError;
use crate::sparql::content_negotiation::{
    negotiate_graph, negotiate_solutions, parse_accept_header, GraphFormat,
};
use crate::sparql::json_ld::write_json_ld;
use crate::sparql::request::SparqlRequest;
use crate::AppState;
use anyhow::anyhow;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use rdf_hooks::model::{GraphName, IriParseError, NamedNode, NamedOrBlankNode};
use rdf_hooks::sparql::error::QueryEvaluationError;
use rdf_hooks::sparql::{Query, QueryDataset, QueryOptions, QueryResults};
use rdf_hooks::store::Store;

/// Evaluates a SPARQL query and serializes its results in the negotiated format.
///
/// Evaluation runs on the blocking pool: results are produced lazily while they are serialized,
/// and registered functions may be slow.
pub async fn evaluate_sparql_query(
    state: AppState,
    request: &SparqlRequest,
    query: &str,
) -> Result<Response, RdfHooksServerError> {
    let mut query = Query::parse(query, None)?;
    configure_dataset(
        query.dataset_mut(),
        request,
        state.endpoint.union_default_graph,
    )?;
    let accepted = parse_accept_header(&request.accept);

    let (body, media_type) = tokio::task::spawn_blocking(move || {
        evaluate_and_serialize(&state.store, &state.options, query, &accepted)
    })
    .await
    .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))??;
    Ok(([(CONTENT_TYPE, media_type)], body).into_response())
}

/// Applies the `default-graph-uri` and `named-graph-uri` parameters to the dataset of the query.
///
/// The parameters take precedence over the `FROM` clauses of the query. Without parameters and
/// `FROM` clauses, the default graph is the union of all graphs if `union_default_graph` is set.
fn configure_dataset(
    dataset: &mut QueryDataset,
    request: &SparqlRequest,
    union_default_graph: bool,
) -> Result<(), RdfHooksServerError> {
    if !request.default_graph_uris.is_empty() {
        dataset.set_default_graph(
            request
                .default_graph_uris
                .iter()
                .map(|iri| Ok(NamedNode::new(iri)?.into()))
                .collect::<Result<Vec<GraphName>, IriParseError>>()
                .map_err(|e| RdfHooksServerError::BadRequest(e.to_string()))?,
        );
    }
    if !request.named_graph_uris.is_empty() {
        dataset.set_available_named_graphs(
            request
                .named_graph_uris
                .iter()
                .map(|iri| Ok(NamedNode::new(iri)?.into()))
                .collect::<Result<Vec<NamedOrBlankNode>, IriParseError>>()
                .map_err(|e| RdfHooksServerError::BadRequest(e.to_string()))?,
        );
    }
    let has_parameters =
        !request.default_graph_uris.is_empty() || !request.named_graph_uris.is_empty();
    if union_default_graph && !has_parameters && dataset.is_default_dataset() {
        dataset.set_default_graph_as_union();
    }
    Ok(())
}

fn evaluate_and_serialize(
    store: &Store,
    options: &QueryOptions,
    query: Query,
    accepted: &[String],
) -> Result<(Vec<u8>, &'static str), RdfHooksServerError> {
    match store.query_opt(query, options)? {
        QueryResults::Graph(triples) => {
            let (format, media_type) = negotiate_graph(accepted);
            let body = match format {
                GraphFormat::Rdf(format) => QueryResults::Graph(triples)
                    .write_graph(Vec::new(), format)
                    .map_err(serialization_error)?,
                GraphFormat::JsonLd => {
                    let triples = triples.collect::<Result<Vec<_>, _>>()?;
                    write_json_ld(&triples)
                        .map_err(|e| RdfHooksServerError::Serialization(e.to_string()))?
                }
            };
            Ok((body, media_type))
        }
        results => {
            let (format, media_type) = negotiate_solutions(accepted);
            let body = results
                .write(Vec::new(), format)
                .map_err(serialization_error)?;
            Ok((body, media_type))
        }
    }
}

/// Errors of the lazy evaluation surface while writing; only writer failures are serialization
/// errors.
fn serialization_error(error: QueryEvaluationError) -> RdfHooksServerError {
    match error {
        QueryEvaluationError::ResultsSerialization(error) => {
            RdfHooksServerError::Serialization(error.to_string())
        }
        error => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(default_graphs: &[&str], named_graphs: &[&str]) -> SparqlRequest {
        SparqlRequest {
            default_graph_uris: default_graphs.iter().map(|s| (*s).to_owned()).collect(),
            named_graph_uris: named_graphs.iter().map(|s| (*s).to_owned()).collect(),
            ..SparqlRequest::default()
        }
    }

    #[test]
    fn parameters_set_the_dataset() {
        let mut query = Query::parse("SELECT * WHERE { ?s ?p ?o }", None).unwrap();
        configure_dataset(
            query.dataset_mut(),
            &request(&["http://example.com/g"], &[]),
            true,
        )
        .unwrap();
        assert_eq!(
            query.dataset().default_graph_graphs(),
            Some([GraphName::from(NamedNode::new_unchecked("http://example.com/g"))].as_slice())
        );
        assert_eq!(query.dataset().available_named_graphs(), None);
    }

    #[test]
    fn union_applies_without_parameters() {
        let mut query = Query::parse("SELECT * WHERE { ?s ?p ?o }", None).unwrap();
        configure_dataset(query.dataset_mut(), &request(&[], &[]), true).unwrap();
        assert_eq!(query.dataset().default_graph_graphs(), None);
    }

    #[test]
    fn from_clauses_are_kept_over_union() {
        let mut query =
            Query::parse("SELECT * FROM <http://example.com/g> WHERE { ?s ?p ?o }", None).unwrap();
        configure_dataset(query.dataset_mut(), &request(&[], &[]), true).unwrap();
        assert_eq!(
            query.dataset().default_graph_graphs(),
            Some([GraphName::from(NamedNode::new_unchecked("http://example.com/g"))].as_slice())
        );
    }

    #[test]
    fn invalid_graph_iris_are_rejected() {
        let mut query = Query::parse("SELECT * WHERE { ?s ?p ?o }", None).unwrap();
        let result = configure_dataset(query.dataset_mut(), &request(&[], &["not an iri"]), false);
        assert!(matches!(result, Err(RdfHooksServerError::BadRequest(_))));
    }
}
