use crate::error::RdfHooksServerError;
use crate::sparql::request::SparqlRequest;
use crate::state::Endpoint;
use crate::AppState;
use anyhow::anyhow;
use axum::http::StatusCode;
use rdf_hooks::sparql::Update;
use tracing::info;

/// Applies a SPARQL update once the request is authorized.
pub async fn evaluate_sparql_update(
    state: AppState,
    request: &SparqlRequest,
    update: &str,
) -> Result<StatusCode, RdfHooksServerError> {
    authorize(&state.endpoint, request)?;
    let update = Update::parse(update, None)?;
    tokio::task::spawn_blocking(move || state.store.update_opt(update, state.options.clone()))
        .await
        .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))??;
    info!("Applied SPARQL update");
    Ok(StatusCode::NO_CONTENT)
}

fn authorize(endpoint: &Endpoint, request: &SparqlRequest) -> Result<(), RdfHooksServerError> {
    if !endpoint.enable_update {
        return Err(RdfHooksServerError::UpdateDisabled);
    }
    match &endpoint.api_key {
        Some(key) if request.bearer.as_deref() != Some(key.as_str()) => {
            Err(RdfHooksServerError::InvalidApiKey)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(enable_update: bool, api_key: Option<&str>) -> Endpoint {
        Endpoint {
            path: "/sparql".to_owned(),
            title: String::new(),
            description: String::new(),
            version: String::new(),
            public_url: String::new(),
            favicon: String::new(),
            enable_update,
            api_key: api_key.map(ToOwned::to_owned),
            union_default_graph: false,
            example_queries: Vec::new(),
            extension_functions: Vec::new(),
        }
    }

    fn bearer(token: Option<&str>) -> SparqlRequest {
        SparqlRequest {
            bearer: token.map(ToOwned::to_owned),
            ..SparqlRequest::default()
        }
    }

    #[test]
    fn updates_require_to_be_enabled() {
        let result = authorize(&endpoint(false, None), &bearer(None));
        assert!(matches!(result, Err(RdfHooksServerError::UpdateDisabled)));
    }

    #[test]
    fn updates_require_the_api_key_when_configured() {
        let endpoint = endpoint(true, Some("secret"));
        assert!(matches!(
            authorize(&endpoint, &bearer(None)),
            Err(RdfHooksServerError::InvalidApiKey)
        ));
        assert!(matches!(
            authorize(&endpoint, &bearer(Some("guess"))),
            Err(RdfHooksServerError::InvalidApiKey)
        ));
        assert!(authorize(&endpoint, &bearer(Some("secret"))).is_ok());
    }

    #[test]
    fn updates_are_open_without_api_key() {
        assert!(authorize(&endpoint(true, None), &bearer(None)).is_ok());
    }
}
