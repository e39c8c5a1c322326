use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdf-hooks")]
/// RDF Hooks command line toolkit and SPARQL HTTP server
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve RDF files as a SPARQL endpoint together with the demo functions
    Serve {
        /// Files to load into the served store
        ///
        /// The format is guessed from the file extension.
        #[arg(value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
        /// Host to listen to
        #[arg(long, default_value = "0.0.0.0", value_hint = ValueHint::Hostname)]
        host: String,
        /// Port to listen to
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
        /// Path of the SPARQL endpoint
        #[arg(long, default_value = "/sparql")]
        path: String,
        /// Accepts SPARQL updates
        #[arg(long)]
        enable_update: bool,
        /// Key required in the `Authorization: Bearer` header of updates
        #[arg(long, env = "RDF_HOOKS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Allows cross-origin requests
        #[arg(long)]
        cors: bool,
        /// If the SPARQL queries should look for triples in all the dataset graphs by default (ie. without `GRAPH` operations)
        #[arg(long)]
        union_default_graph: bool,
        /// Title of the endpoint, shown on its HTML page
        #[arg(long)]
        title: Option<String>,
        /// URL advertised in the service description
        #[arg(long, value_hint = ValueHint::Url)]
        public_url: Option<String>,
    },
    /// Evaluate a SPARQL query against RDF files, with the demo functions available
    Query {
        /// Files to load before evaluating the query
        #[arg(value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
        /// The SPARQL query
        #[arg(short, long, conflicts_with = "file")]
        query: Option<String>,
        /// File holding the SPARQL query
        #[arg(short, long, required_unless_present = "query", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// The format of the results
        ///
        /// It can be an extension like "json" or a MIME type like "text/csv". Defaults to JSON
        /// for solutions and Turtle for graphs.
        #[arg(long)]
        results_format: Option<String>,
    },
}
