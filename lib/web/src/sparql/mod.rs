mod content_negotiation;
mod html;
mod json_ld;
mod query;
mod request;
mod service_description;
mod update;

use crate::error::RdfHooksServerError;
use crate::sparql::html::render_page;
use crate::sparql::query::evaluate_sparql_query;
use crate::sparql::request::SparqlRequest;
use crate::sparql::service_description::generate_service_description;
use crate::sparql::update::evaluate_sparql_update;
use crate::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use rdf_hooks::io::RdfFormat;

/// The routes of the SPARQL endpoint, mounted at `path`.
pub fn create_sparql_routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(handle_sparql_request).post(handle_sparql_request))
}

/// Dispatches a request to the query, update or service description handlers.
async fn handle_sparql_request(
    State(state): State<AppState>,
    request: SparqlRequest,
) -> Result<Response, RdfHooksServerError> {
    match (&request.query, &request.update) {
        (Some(_), Some(_)) => Err(RdfHooksServerError::QueryAndUpdate),
        (Some(query), None) => evaluate_sparql_query(state, &request, query).await,
        (None, Some(update)) => Ok(evaluate_sparql_update(state, &request, update)
            .await?
            .into_response()),
        (None, None) => describe(&state, &request.accept),
    }
}

/// Serves the HTML page to browsers and the service description to everything else.
fn describe(state: &AppState, accept: &str) -> Result<Response, RdfHooksServerError> {
    if accept.starts_with("text/html") {
        return Ok(render_page(&state.endpoint).into_response());
    }
    let (format, media_type) = if accept == "text/turtle" {
        (RdfFormat::Turtle, "text/turtle")
    } else {
        (RdfFormat::RdfXml, "application/xml")
    };
    Ok(
        generate_service_description(&state.endpoint, &state.store, format, media_type)?
            .into_response(),
    )
}
