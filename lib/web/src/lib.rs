//! A [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/) endpoint serving a
//! [Store](rdf_hooks::store::Store) together with the functions of a
//! [FunctionRegistry](rdf_hooks::functions::FunctionRegistry).

use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;
mod error;
mod sparql;
mod state;

pub use config::{
    ServerConfig, DEFAULT_DESCRIPTION, DEFAULT_FAVICON, DEFAULT_PUBLIC_URL, DEFAULT_TITLE,
    MAX_SPARQL_BODY_SIZE,
};
pub use error::RdfHooksServerError;
use sparql::create_sparql_routes;
use state::AppState;

/// Builds the router of the endpoint.
///
/// The endpoint answers `GET` and `POST` requests at [ServerConfig::path]. If the path is not
/// `/`, the root redirects there.
pub fn create_router(config: ServerConfig) -> Router {
    let cors = config.cors;
    let path = config.path.clone();
    let state = AppState::new(config);

    let mut app = create_sparql_routes(&path);
    if path != "/" {
        let target = path.clone();
        app = app.route(
            "/",
            get(move || {
                let target = target.clone();
                async move { Redirect::temporary(&target) }
            }),
        );
    }
    let app = app
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_SPARQL_BODY_SIZE));

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serves the endpoint until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let bind = config.bind.clone();
    let path = config.path.clone();
    let app = create_router(config);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(address = %listener.local_addr()?, %path, "Listening for SPARQL requests");
    Ok(axum::serve(listener, app).await?)
}
