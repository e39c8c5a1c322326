use crate::config::ServerConfig;
use rdf_hooks::functions::ExampleQuery;
use rdf_hooks::model::NamedNode;
use rdf_hooks::sparql::QueryOptions;
use rdf_hooks::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub options: QueryOptions,
    pub endpoint: Arc<Endpoint>,
}

/// The static part of the endpoint, fixed when the server starts.
pub struct Endpoint {
    pub path: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub public_url: String,
    pub favicon: String,
    pub enable_update: bool,
    pub api_key: Option<String>,
    pub union_default_graph: bool,
    pub example_queries: Vec<ExampleQuery>,
    pub extension_functions: Vec<NamedNode>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let mut options = QueryOptions::default().with_custom_evaluator(Arc::clone(&config.registry) as _);
        for evaluator in config.custom_evaluators {
            options = options.with_custom_evaluator(evaluator);
        }
        let example_queries = if config.example_queries.is_empty() {
            config.registry.example_queries()
        } else {
            config.example_queries
        };
        Self {
            store: config.store,
            options,
            endpoint: Arc::new(Endpoint {
                path: config.path,
                title: config.title,
                description: config.description,
                version: config.version,
                public_url: config.public_url,
                favicon: config.favicon,
                enable_update: config.enable_update,
                api_key: config.api_key.filter(|key| !key.is_empty()),
                union_default_graph: config.union_default_graph,
                example_queries,
                extension_functions: config.registry.extension_function_iris(),
            }),
        }
    }
}
