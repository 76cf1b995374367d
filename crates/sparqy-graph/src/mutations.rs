//! Write operations for the reified graph.
//!
//! Writes are append-only: `upsert_triplet` always mints a new reified
//! statement, even for a fact that is already stored. Failures propagate.

use sparqy_core::Fact;

use crate::client::{GraphError, SparqlEndpoint};
use crate::ids::IdGenerator;
use crate::sparql::QueryBuilder;
use crate::store::SparqlGraphStore;

impl<E: SparqlEndpoint, G: IdGenerator> SparqlGraphStore<E, G> {
    // ── Facts ────────────────────────────────────────────────────

    /// Insert `(subject, relation, object)` as a fresh Triplet/Entity/Relationship/Entity
    /// quadruple in one `INSERT DATA` statement.
    pub async fn upsert_triplet(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<(), GraphError> {
        let fact = Fact::new(subject, relation, object);
        let ids = self.ids.reified_ids();
        tracing::info!(%fact, triplet = %ids.triplet, "Upserting triplet");

        let block = self.builder.reification_block(&ids, &fact)?;
        self.insert_data(&block).await?;
        Ok(())
    }

    /// Remove every reified statement whose literals equal `(subject, relation, object)`.
    pub async fn delete(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<(), GraphError> {
        let fact = Fact::new(subject, relation, object);
        tracing::info!(%fact, "Deleting triplet");

        let update = self.builder.delete_matching(&fact);
        self.sparql_update(&update).await?;
        Ok(())
    }

    /// Insert a bare triple block into the configured graph.
    pub async fn insert_data(&self, data: &str) -> Result<String, GraphError> {
        let update = self.builder.insert_data(data);
        self.sparql_update(&update).await
    }

    // ── Graph Administration ─────────────────────────────────────

    pub async fn create_graph(&self, uri: &str) -> Result<(), GraphError> {
        let update = QueryBuilder::create_graph(uri)?;
        self.sparql_update(&update).await?;
        tracing::info!(graph = %uri, "Created graph");
        Ok(())
    }

    pub async fn drop_graph(&self, uri: &str) -> Result<(), GraphError> {
        let update = QueryBuilder::drop_graph(uri)?;
        self.sparql_update(&update).await?;
        tracing::info!(graph = %uri, "Dropped graph");
        Ok(())
    }

    // ── Transport ────────────────────────────────────────────────

    /// Execute a SPARQL Update and log the endpoint's reply.
    pub(crate) async fn sparql_update(&self, update: &str) -> Result<String, GraphError> {
        tracing::debug!(update = %update, "Sending SPARQL update");
        let message = self.endpoint.update(update).await?;
        tracing::info!(response = %message.trim(), "Endpoint says");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::GraphError;
    use crate::store::testing::{store, ScriptedEndpoint};

    #[tokio::test]
    async fn upsert_sends_single_insert_with_four_resources() {
        let store = store(ScriptedEndpoint::default()).await;
        store.upsert_triplet("A", "knows", "B").await.unwrap();

        let updates = store.endpoint().updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 1);

        let update = &updates[0];
        assert!(update.starts_with("BASE <http://purl.org/stuff/data>"));
        assert!(update.contains("INSERT DATA { GRAPH <http://purl.org/stuff/guardians> {"));
        assert!(update.contains("<#T0000> a er:Triplet ;"));
        assert!(update.contains("<#E_0001> a er:Entity ;"));
        assert!(update.contains("<#R_0002> a er:Relationship ;"));
        assert!(update.contains("<#E_0003> a er:Entity ;"));
        assert!(update.contains(r#"er:value "A" ."#));
        assert!(update.contains(r#"er:value "knows" ."#));
        assert!(update.contains(r#"er:value "B" ."#));
    }

    #[tokio::test]
    async fn repeated_upsert_mints_new_resources() {
        let store = store(ScriptedEndpoint::default()).await;
        store.upsert_triplet("A", "knows", "B").await.unwrap();
        store.upsert_triplet("A", "knows", "B").await.unwrap();

        let updates = store.endpoint().updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].contains("<#T0000>"));
        assert!(updates[1].contains("<#T0004>"));
    }

    #[tokio::test]
    async fn upsert_escapes_values() {
        let store = store(ScriptedEndpoint::default()).await;
        store
            .upsert_triplet("Yondu", "whistles\n", "\"arrow\"")
            .await
            .unwrap();

        let update = store.endpoint().updates.lock().unwrap()[0].clone();
        assert!(update.contains(r#"er:value "whistles\n" ."#));
        assert!(update.contains(r#"er:value "\"arrow\"" ."#));
    }

    #[tokio::test]
    async fn delete_matches_literals_in_graph() {
        let store = store(ScriptedEndpoint::default()).await;
        store.delete("A", "knows", "B").await.unwrap();

        let update = store.endpoint().updates.lock().unwrap()[0].clone();
        assert!(update.contains("DELETE WHERE {"));
        assert!(update.contains("GRAPH <http://purl.org/stuff/guardians>"));
        assert!(update.contains(r#"er:value "B" ."#));
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let store = store(ScriptedEndpoint::failing_updates()).await;
        let err = store.upsert_triplet("A", "knows", "B").await.unwrap_err();
        assert!(matches!(err, GraphError::Http { status: 500, .. }));
        assert!(store.delete("A", "knows", "B").await.is_err());
        assert!(store.drop_graph("http://purl.org/stuff/guardians").await.is_err());
    }

    #[tokio::test]
    async fn graph_administration() {
        let store = store(ScriptedEndpoint::default()).await;
        store.create_graph("http://example.org/g").await.unwrap();
        store.drop_graph("http://example.org/g").await.unwrap();

        let updates = store.endpoint().updates.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec!["CREATE GRAPH <http://example.org/g>", "DROP GRAPH <http://example.org/g>"]
        );
    }

    #[tokio::test]
    async fn insert_data_returns_endpoint_reply() {
        let store = store(ScriptedEndpoint::default()).await;
        let reply = store.insert_data("<#x> a er:Entity .").await.unwrap();
        assert!(reply.contains("done"));
    }
}
