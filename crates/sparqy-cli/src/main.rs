//! CLI entry point for the sparqy triple store adapter.
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use sparqy_core::types::ER_NAMESPACE;
use sparqy_core::{StoreConfig, TraversalDepth};
use sparqy_graph::SparqlGraphStore;

#[derive(Parser)]
#[command(name = "sparqy")]
#[command(about = "Labeled-property graph access to a reified SPARQL triple store")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: sparqy).
    #[arg(short, long, default_value = "sparqy", global = true)]
    config: String,

    /// Override the SPARQL endpoint URL.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Override the SPARQL Update endpoint URL.
    #[arg(long, global = true)]
    update_endpoint: Option<String>,

    /// Override the named graph.
    #[arg(long, global = true)]
    graph: Option<String>,

    /// Override the BASE IRI for minted resources.
    #[arg(long, global = true)]
    base_uri: Option<String>,

    /// Skip the CREATE GRAPH issued on startup.
    #[arg(long, global = true)]
    no_create_graph: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the two-hop neighborhood of a subject.
    Get {
        subject: String,
        /// Maximum number of rows (0 = unlimited).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the relationship map of several subjects.
    RelMap {
        #[arg(required = true)]
        subjects: Vec<String>,
        /// Traversal depth: 1 or 2.
        #[arg(long, default_value_t = 2)]
        depth: u32,
    },
    /// Store a fact as a new reified statement.
    Upsert {
        subject: String,
        relation: String,
        object: String,
    },
    /// Remove every stored statement of a fact.
    Delete {
        subject: String,
        relation: String,
        object: String,
    },
    /// Send raw SPARQL to the store (reads stdin when no text is given).
    Query {
        text: Option<String>,
        /// Literal parameter bound at `$name`, as name=value. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Print the schema description.
    Schema,
    /// Create a named graph (default: the configured graph).
    CreateGraph { uri: Option<String> },
    /// Drop a named graph (default: the configured graph).
    DropGraph { uri: Option<String> },
    /// Persist the store (a no-op for remote stores).
    Persist {
        #[arg(default_value = "./storage/graph_store.json")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.json_logs {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    if let Command::Schema = cli.command {
        println!("{}", serde_json::to_string(ER_NAMESPACE)?);
        return Ok(());
    }

    let mut config = load_store_config(&cli)?;
    // Graph administration commands issue their own statement.
    if matches!(cli.command, Command::CreateGraph { .. } | Command::DropGraph { .. }) {
        config.create_graph = false;
    }
    let store = SparqlGraphStore::connect(config).await?;

    match cli.command {
        Command::Get { ref subject, limit } => {
            let map = store.get_triplets(subject, limit).await;
            println!("{}", serde_json::to_string(&map)?);
        }
        Command::RelMap { ref subjects, depth } => {
            let depth = TraversalDepth::try_from(depth)?;
            let map = store.get_rel_map(subjects, depth).await;
            println!("{}", serde_json::to_string(&map)?);
        }
        Command::Upsert {
            ref subject,
            ref relation,
            ref object,
        } => {
            store.upsert_triplet(subject, relation, object).await?;
            println!("{}", serde_json::json!({ "upserted": [subject, relation, object] }));
        }
        Command::Delete {
            ref subject,
            ref relation,
            ref object,
        } => {
            store.delete(subject, relation, object).await?;
            println!("{}", serde_json::json!({ "deleted": [subject, relation, object] }));
        }
        Command::Query { ref text, ref params } => {
            let text = match text {
                Some(text) => text.clone(),
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let params: BTreeMap<String, String> = params.iter().cloned().collect();
            let response = store.query(&text, &params).await?;
            println!("{}", serde_json::to_string(&response)?);
        }
        Command::CreateGraph { ref uri } => {
            let uri = uri.as_deref().unwrap_or(store.graph());
            store.create_graph(uri).await?;
            println!("{}", serde_json::json!({ "created": uri }));
        }
        Command::DropGraph { ref uri } => {
            let uri = uri.as_deref().unwrap_or(store.graph());
            store.drop_graph(uri).await?;
            println!("{}", serde_json::json!({ "dropped": uri }));
        }
        Command::Persist { ref path } => {
            store.persist(path).await?;
            println!("{}", serde_json::json!({ "persisted": path }));
        }
        Command::Schema => {}
    }

    Ok(())
}

/// File and environment configuration with command-line overrides applied.
fn load_store_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = StoreConfig::load(&cli.config)?;
    apply_overrides(&mut config, cli);
    tracing::debug!(endpoint = %config.endpoint, graph = %config.graph, "Loaded store config");
    Ok(config)
}

fn apply_overrides(config: &mut StoreConfig, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(update_endpoint) = &cli.update_endpoint {
        config.update_endpoint = Some(update_endpoint.clone());
    }
    if let Some(graph) = &cli.graph {
        config.graph = graph.clone();
    }
    if let Some(base_uri) = &cli.base_uri {
        config.base_uri = base_uri.clone();
    }
    if cli.no_create_graph {
        config.create_graph = false;
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn param_splits_on_first_equals() {
        assert_eq!(
            parse_param("who=a=b").unwrap(),
            ("who".to_string(), "a=b".to_string())
        );
        assert!(parse_param("=x").is_err());
        assert!(parse_param("novalue").is_err());
    }

    #[test]
    fn rel_map_defaults_to_two_hops() {
        let cli = Cli::try_parse_from(["sparqy", "rel-map", "A", "B"]).unwrap();
        match cli.command {
            Command::RelMap { subjects, depth } => {
                assert_eq!(subjects, vec!["A", "B"]);
                assert_eq!(depth, 2);
            }
            _ => panic!("expected rel-map"),
        }
    }

    #[test]
    fn overrides_replace_file_settings() {
        let cli = Cli::try_parse_from([
            "sparqy",
            "--endpoint",
            "http://fuseki:3030/ds/sparql",
            "--graph",
            "http://example.org/kg",
            "--no-create-graph",
            "get",
            "A",
        ])
        .unwrap();

        let mut config = StoreConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.endpoint, "http://fuseki:3030/ds/sparql");
        assert_eq!(config.graph, "http://example.org/kg");
        assert!(!config.create_graph);
        assert_eq!(config.base_uri, "http://purl.org/stuff/data");
    }

    #[test]
    fn query_collects_repeated_params() {
        let cli = Cli::try_parse_from([
            "sparqy",
            "query",
            "SELECT * WHERE { ?s ?p $who }",
            "--param",
            "who=Groot",
            "--param",
            "n=3",
        ])
        .unwrap();
        match cli.command {
            Command::Query { text, params } => {
                assert!(text.is_some());
                assert_eq!(params.len(), 2);
                assert_eq!(params[0], ("who".to_string(), "Groot".to_string()));
            }
            _ => panic!("expected query"),
        }
    }
}
