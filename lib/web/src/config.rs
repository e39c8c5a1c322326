use rdf_hooks::engine::CustomEvaluator;
use rdf_hooks::functions::{ExampleQuery, FunctionRegistry};
use rdf_hooks::store::Store;
use std::sync::Arc;

pub const MAX_SPARQL_BODY_SIZE: usize = 1024 * 1024 * 128; // 128MB

pub const DEFAULT_TITLE: &str = "SPARQL endpoint for RDF hooks";
pub const DEFAULT_DESCRIPTION: &str = "A SPARQL endpoint to serve machine learning models, or any other logic implemented in Rust.";
pub const DEFAULT_PUBLIC_URL: &str = "https://your-endpoint/sparql";
pub const DEFAULT_FAVICON: &str =
    "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg";

/// Holds the configuration for a RDF Hooks web server.
pub struct ServerConfig {
    /// The store that is served.
    pub store: Store,
    /// The custom functions offered to every query and update.
    pub registry: Arc<FunctionRegistry>,
    /// Additional hooks, tried after the registry.
    pub custom_evaluators: Vec<Arc<dyn CustomEvaluator>>,
    /// The IP address or DNS name that the socket binds to.
    pub bind: String,
    /// The path of the SPARQL endpoint. `/` redirects there.
    pub path: String,
    pub title: String,
    pub description: String,
    pub version: String,
    /// The URL advertised in the service description.
    pub public_url: String,
    pub favicon: String,
    /// Whether SPARQL updates are accepted.
    pub enable_update: bool,
    /// When set, updates must carry an `Authorization: Bearer <key>` header.
    pub api_key: Option<String>,
    /// Whether CORS is enabled.
    pub cors: bool,
    /// Whether, by default, queries match against all graphs.
    pub union_default_graph: bool,
    /// The queries shown on the HTML page. Extracted from the registry when empty.
    pub example_queries: Vec<ExampleQuery>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            store: Store::new(),
            registry: Arc::new(FunctionRegistry::new()),
            custom_evaluators: Vec::new(),
            bind: "localhost:8000".to_owned(),
            path: "/sparql".to_owned(),
            title: DEFAULT_TITLE.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            public_url: DEFAULT_PUBLIC_URL.to_owned(),
            favicon: DEFAULT_FAVICON.to_owned(),
            enable_update: false,
            api_key: None,
            cors: true,
            union_default_graph: false,
            example_queries: Vec::new(),
        }
    }
}
