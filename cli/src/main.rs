use crate::cli::{Args, Command};
use crate::functions::demo_registry;
use anyhow::{bail, Context};
use clap::Parser;
use rdf_hooks::io::{RdfFormat, RdfParser};
use rdf_hooks::sparql::{QueryOptions, QueryResults, QueryResultsFormat};
use rdf_hooks::store::Store;
use rdf_hooks_web::ServerConfig;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{stdout, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod functions;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Serve {
            files,
            host,
            port,
            path,
            enable_update,
            api_key,
            cors,
            union_default_graph,
            title,
            public_url,
        } => {
            let store = load_files(&files)?;
            let mut config = ServerConfig {
                store,
                registry: Arc::new(demo_registry()?),
                bind: format!("{host}:{port}"),
                public_url: format!("http://localhost:{port}{path}"),
                path,
                enable_update,
                api_key,
                cors,
                union_default_graph,
                ..ServerConfig::default()
            };
            if let Some(title) = title {
                config.title = title;
            }
            if let Some(public_url) = public_url {
                config.public_url = public_url;
            }
            rdf_hooks_web::serve(config).await
        }
        Command::Query {
            files,
            query,
            file,
            results_format,
        } => {
            let store = load_files(&files)?;
            let query = match (query, file) {
                (Some(query), _) => query,
                (None, Some(file)) => fs::read_to_string(&file)
                    .with_context(|| format!("Not able to read the query file {}", file.display()))?,
                (None, None) => bail!("Either --query or --file must be set"),
            };
            let options = QueryOptions::default().with_custom_evaluator(Arc::new(demo_registry()?));
            let results = store.query_opt(query.as_str(), &options)?;
            let mut writer = match results {
                QueryResults::Graph(_) => {
                    let format = results_format
                        .as_deref()
                        .map(rdf_format_from_name)
                        .transpose()?
                        .unwrap_or(RdfFormat::Turtle);
                    results.write_graph(stdout().lock(), format)?
                }
                results => {
                    let format = results_format
                        .as_deref()
                        .map(query_results_format_from_name)
                        .transpose()?
                        .unwrap_or(QueryResultsFormat::Json);
                    results.write(stdout().lock(), format)?
                }
            };
            writer.flush()?;
            Ok(())
        }
    }
}

/// Loads `files` into a new in-memory store.
fn load_files(files: &[PathBuf]) -> anyhow::Result<Store> {
    let store = Store::new();
    for file in files {
        let format = rdf_format_from_path(file)?;
        let reader = BufReader::new(
            File::open(file).with_context(|| format!("Not able to open {}", file.display()))?,
        );
        let loaded = store
            .load_from_reader(RdfParser::from_format(format), reader)
            .with_context(|| format!("Not able to load {}", file.display()))?;
        info!(
            file = %file.display(),
            loaded,
            total = store.len()?,
            "Loaded triples"
        );
    }
    Ok(store)
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

fn query_results_format_from_name(name: &str) -> anyhow::Result<QueryResultsFormat> {
    if let Some(t) = QueryResultsFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = QueryResultsFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The query results format '{name}' is unknown")
}
