//! The triple store adapter and the graph-store contract it fulfils.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use sparqy_core::types::ER_NAMESPACE;
use sparqy_core::{RelMap, StoreConfig, TraversalDepth};

use crate::client::{GraphError, QueryResponse, SparqlClient, SparqlEndpoint};
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::sparql::{QueryBuilder, QueryTemplate};

/// Operations a knowledge-graph application expects from its graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Arrow-chain rows reachable from `subject`, keyed by `subject`.
    async fn get(&self, subject: &str) -> RelMap;

    /// Relationship map for each of `subjects`, merged into one map.
    async fn get_rel_map(&self, subjects: &[String], depth: TraversalDepth) -> RelMap;

    async fn upsert_triplet(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<(), GraphError>;

    async fn delete(&self, subject: &str, relation: &str, object: &str) -> Result<(), GraphError>;

    async fn persist(&self, path: &Path) -> Result<(), GraphError>;

    fn get_schema(&self, refresh: bool) -> String;

    async fn query(
        &self,
        query: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<QueryResponse, GraphError>;
}

/// A SPARQL endpoint viewed as a labeled-property graph.
///
/// Holds only immutable configuration; every call is one round trip through
/// the endpoint.
pub struct SparqlGraphStore<E = SparqlClient, G = RandomIdGenerator> {
    pub(crate) endpoint: E,
    pub(crate) ids: G,
    pub(crate) builder: QueryBuilder,
    pub(crate) config: StoreConfig,
}

impl SparqlGraphStore {
    /// Build the HTTP client from `config` and construct the adapter.
    pub async fn connect(config: StoreConfig) -> Result<Self, GraphError> {
        let client = SparqlClient::new(&config)?;
        let ids = RandomIdGenerator::new(config.id_length);
        Self::with_parts(config, client, ids).await
    }
}

impl<E: SparqlEndpoint, G: IdGenerator> SparqlGraphStore<E, G> {
    /// Construct over an arbitrary endpoint and identifier strategy.
    ///
    /// Creates the named graph first when `config.create_graph` is set.
    pub async fn with_parts(config: StoreConfig, endpoint: E, ids: G) -> Result<Self, GraphError> {
        let builder = QueryBuilder::new(&config.base_uri, &config.graph)?;
        let store = Self {
            endpoint,
            ids,
            builder,
            config,
        };
        if store.config.create_graph {
            store.create_graph(&store.config.graph).await?;
        }
        tracing::info!(graph = %store.config.graph, "Triple store adapter ready");
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn graph(&self) -> &str {
        self.builder.graph()
    }

    /// Namespace of the fixed vocabulary. No live introspection: `refresh` is ignored.
    pub fn get_schema(&self, _refresh: bool) -> &'static str {
        ER_NAMESPACE
    }

    /// Accepted for interface compatibility; writes nothing.
    pub async fn persist(&self, path: &Path) -> Result<(), GraphError> {
        tracing::info!(path = %path.display(), "persist called; store is remote, nothing written");
        Ok(())
    }

    /// Pass `query` straight to the store.
    ///
    /// Each `params` entry is bound as an escaped literal at its `$name`
    /// placeholder. Credentials apply as for every other call.
    pub async fn query(
        &self,
        query: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<QueryResponse, GraphError> {
        let text = if params.is_empty() {
            query.to_string()
        } else {
            params
                .iter()
                .fold(QueryTemplate::new(query), |t, (name, value)| {
                    t.bind_literal(name, value)
                })
                .render()
        };
        tracing::debug!(query = %text, "Pass-through query");
        self.endpoint.query(&text).await
    }
}

#[async_trait]
impl<E: SparqlEndpoint, G: IdGenerator> GraphStore for SparqlGraphStore<E, G> {
    async fn get(&self, subject: &str) -> RelMap {
        SparqlGraphStore::get(self, subject).await
    }

    async fn get_rel_map(&self, subjects: &[String], depth: TraversalDepth) -> RelMap {
        SparqlGraphStore::get_rel_map(self, subjects, depth).await
    }

    async fn upsert_triplet(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<(), GraphError> {
        SparqlGraphStore::upsert_triplet(self, subject, relation, object).await
    }

    async fn delete(&self, subject: &str, relation: &str, object: &str) -> Result<(), GraphError> {
        SparqlGraphStore::delete(self, subject, relation, object).await
    }

    async fn persist(&self, path: &Path) -> Result<(), GraphError> {
        SparqlGraphStore::persist(self, path).await
    }

    fn get_schema(&self, refresh: bool) -> String {
        SparqlGraphStore::get_schema(self, refresh).to_string()
    }

    async fn query(
        &self,
        query: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<QueryResponse, GraphError> {
        SparqlGraphStore::query(self, query, params).await
    }
}
