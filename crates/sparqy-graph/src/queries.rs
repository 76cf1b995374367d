//! Read operations: neighborhood traversal and arrow-chain rendering.
//!
//! Reads never fail. A transport or decoding error is logged and reported
//! as an empty row set, so "no matches" and "query failed" look the same.

use sparqy_core::escape::unescape_from_rdf;
use sparqy_core::{ArrowPath, ArrowStyle, Hop, RelMap, TraversalDepth};

use crate::client::SparqlEndpoint;
use crate::ids::IdGenerator;
use crate::results::{value, Binding};
use crate::store::SparqlGraphStore;

impl<E: SparqlEndpoint, G: IdGenerator> SparqlGraphStore<E, G> {
    // ── Traversal ────────────────────────────────────────────────

    /// Two-hop neighborhood of `subject`, rendered as arrow chains.
    pub async fn get(&self, subject: &str) -> RelMap {
        self.get_triplets(subject, None).await
    }

    /// Two-hop neighborhood of `subject`, truncated to `limit` rows when positive.
    pub async fn get_triplets(&self, subject: &str, limit: Option<usize>) -> RelMap {
        let query = self.builder.neighborhood(subject, limit);
        let rows = self.sparql_query(&query).await;
        tracing::debug!(subject, rows = rows.len(), "Fetched neighborhood");

        let mut map = RelMap::new();
        map.insert(
            subject.to_string(),
            to_arrows(subject, &rows, self.config.arrow_style),
        );
        map
    }

    /// Raw one-hop bindings (`?rel ?obj`) of `subject`.
    pub async fn select_triplets(&self, subject: &str, limit: Option<usize>) -> Vec<Binding> {
        let query = self.builder.one_hop(subject, limit);
        self.sparql_query(&query).await
    }

    /// Relationship map for every subject, one traversal each, merged by subject.
    pub async fn get_rel_map(&self, subjects: &[String], depth: TraversalDepth) -> RelMap {
        let mut map = RelMap::new();
        for subject in subjects {
            let rows = match depth {
                TraversalDepth::TwoHop => self
                    .get_triplets(subject, None)
                    .await
                    .remove(subject)
                    .unwrap_or_default(),
                TraversalDepth::OneHop => {
                    let bindings = self.select_triplets(subject, None).await;
                    one_hop_arrows(subject, &bindings, self.config.arrow_style)
                }
            };
            map.insert(subject.clone(), rows);
        }
        map
    }

    // ── Transport ────────────────────────────────────────────────

    /// Execute a SELECT, converting any failure into an empty row set.
    pub(crate) async fn sparql_query(&self, query: &str) -> Vec<Binding> {
        match self.endpoint.select(query).await {
            Ok(results) => results.into_bindings(),
            Err(e) => {
                tracing::warn!(error = %e, "SPARQL read failed, returning no rows");
                Vec::new()
            }
        }
    }
}

/// Decode one neighborhood row. The second hop counts only when both
/// `rel2` and `obj2` are bound.
pub fn decode_row(subject: &str, row: &Binding) -> Option<ArrowPath> {
    let first = hop(row, "rel1", "obj1")?;
    Some(ArrowPath {
        subject: subject.to_string(),
        first,
        second: hop(row, "rel2", "obj2"),
    })
}

/// Render neighborhood rows in order. Rows missing a first hop are skipped.
pub fn to_arrows(subject: &str, rows: &[Binding], style: ArrowStyle) -> Vec<String> {
    rows.iter()
        .filter_map(|row| {
            let path = decode_row(subject, row);
            if path.is_none() {
                tracing::warn!(subject, "Skipping row without rel1/obj1 bindings");
            }
            path
        })
        .map(|path| path.render(style))
        .collect()
}

fn one_hop_arrows(subject: &str, rows: &[Binding], style: ArrowStyle) -> Vec<String> {
    rows.iter()
        .filter_map(|row| hop(row, "rel", "obj"))
        .map(|first| {
            ArrowPath {
                subject: subject.to_string(),
                first,
                second: None,
            }
            .render(style)
        })
        .collect()
}

/// Values come back already decoded by the store and are unescaped once more,
/// so a stored backslash sequence such as `\n` is read as a control character.
fn hop(row: &Binding, rel_var: &str, obj_var: &str) -> Option<Hop> {
    Some(Hop {
        relation: unescape_from_rdf(value(row, rel_var)?),
        object: unescape_from_rdf(value(row, obj_var)?),
    })
}
