//! SPARQL text construction for the reified `er:` vocabulary.
//!
//! Query structure lives in fixed templates with `$name` placeholders. Values
//! are bound separately as raw structure, validated IRIs, or escaped literals,
//! and substituted in a single pass so bound text is never re-scanned.

use std::collections::HashMap;

use sparqy_core::escape::{check_iri, escape_for_rdf};
use sparqy_core::types::{ErClass, ErProperty, ReifiedIds, ER_PREFIX_IRI};
use sparqy_core::{Fact, SparqyError};

/// A query template with its bound placeholder values.
#[derive(Debug, Clone)]
pub struct QueryTemplate<'t> {
    text: &'t str,
    values: HashMap<String, String>,
}

impl<'t> QueryTemplate<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            values: HashMap::new(),
        }
    }

    /// Bind query structure verbatim.
    pub fn bind_raw(mut self, name: &str, fragment: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), fragment.into());
        self
    }

    /// Bind a value as an escaped, double-quoted string literal.
    pub fn bind_literal(self, name: &str, value: &str) -> Self {
        let literal = format!("\"{}\"", escape_for_rdf(value));
        self.bind_raw(name, literal)
    }

    /// Bind an IRI reference, written as `<iri>`.
    pub fn bind_iri(self, name: &str, iri: &str) -> Result<Self, SparqyError> {
        let iri = check_iri(iri)?;
        Ok(self.bind_raw(name, format!("<{iri}>")))
    }

    /// Substitute bound placeholders. Unbound `$name` tokens are left as-is,
    /// since SPARQL also accepts `$` as a variable sigil.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 64);
        let mut rest = self.text;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            match self.values.get(name) {
                Some(value) if !name.is_empty() => out.push_str(value),
                _ => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }
        out.push_str(rest);
        out
    }
}

// ── Templates ────────────────────────────────────────────────────

const NEIGHBORHOOD: &str = r#"$prologue
SELECT DISTINCT ?triplet ?rel1 ?obj1 ?triplet2 ?rel2 ?obj2 WHERE {
  GRAPH $graph {
    ?triplet a er:Triplet ;
        er:subject ?subject ;
        er:property ?property ;
        er:object ?object .

    ?subject er:value $subject .
    ?property er:value ?rel1 .
    ?object er:value ?obj1 .

    OPTIONAL {
      ?triplet2 a er:Triplet ;
          er:subject ?subject2 ;
          er:property ?property2 ;
          er:object ?object2 .

      ?subject2 er:value ?obj1 .
      ?property2 er:value ?rel2 .
      ?object2 er:value ?obj2 .
    }
  }
}$limit"#;

const ONE_HOP: &str = r#"$prologue
SELECT DISTINCT ?triplet ?rel ?obj WHERE {
  GRAPH $graph {
    ?triplet a er:Triplet ;
        er:subject ?subject ;
        er:property ?property ;
        er:object ?object .

    ?subject er:value $subject .
    ?property er:value ?rel .
    ?object er:value ?obj .
  }
}$limit"#;

const REIFICATION: &str = r#"
    $triplet a $triplet_class ;
        $subject_prop $s ;
        $property_prop $p ;
        $object_prop $o .

    $s a $entity_class ;
        $value_prop $subject .

    $p a $relationship_class ;
        $value_prop $relation .

    $o a $entity_class ;
        $value_prop $object .
"#;

const INSERT_DATA: &str = "$prologue\nINSERT DATA { GRAPH $graph { $data } }";

const DELETE_MATCHING: &str = r#"$prologue
DELETE WHERE {
  GRAPH $graph {
    ?t a er:Triplet ;
        er:subject ?s ;
        er:property ?p ;
        er:object ?o .

    ?s a er:Entity ;
        er:value $subject .

    ?p a er:Relationship ;
        er:value $relation .

    ?o a er:Entity ;
        er:value $object .
  }
}"#;

// ── Builder ──────────────────────────────────────────────────────

/// Renders every statement the adapter sends, scoped to one named graph.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    prologue: String,
    graph: String,
}

impl QueryBuilder {
    pub fn new(base_uri: &str, graph: &str) -> Result<Self, SparqyError> {
        let base = check_iri(base_uri)?;
        let graph = check_iri(graph)?;
        Ok(Self {
            prologue: format!("BASE <{base}>\nPREFIX er:  <{ER_PREFIX_IRI}>"),
            graph: graph.to_string(),
        })
    }

    pub fn graph(&self) -> &str {
        &self.graph
    }

    pub fn prologue(&self) -> &str {
        &self.prologue
    }

    fn scoped(&self, template: &'static str) -> QueryTemplate<'static> {
        QueryTemplate::new(template)
            .bind_raw("prologue", self.prologue.clone())
            .bind_raw("graph", format!("<{}>", self.graph))
    }

    /// Two-hop neighborhood of `subject`: `?rel1 ?obj1` and optional `?rel2 ?obj2`.
    ///
    /// Every statement mints its own Entity resources, so the second hop joins
    /// on the first object's literal value, not on the resource. The Triplet
    /// resources are projected too, so DISTINCT only merges rows reached
    /// through the same stored statements.
    pub fn neighborhood(&self, subject: &str, limit: Option<usize>) -> String {
        self.scoped(NEIGHBORHOOD)
            .bind_literal("subject", subject)
            .bind_raw("limit", limit_clause(limit))
            .render()
    }

    /// Direct relations of `subject`: `?rel ?obj`.
    pub fn one_hop(&self, subject: &str, limit: Option<usize>) -> String {
        self.scoped(ONE_HOP)
            .bind_literal("subject", subject)
            .bind_raw("limit", limit_clause(limit))
            .render()
    }

    /// Triple block declaring the four resources of one reified fact.
    pub fn reification_block(&self, ids: &ReifiedIds, fact: &Fact) -> Result<String, SparqyError> {
        Ok(QueryTemplate::new(REIFICATION)
            .bind_iri("triplet", ids.triplet.as_str())?
            .bind_iri("s", ids.subject.as_str())?
            .bind_iri("p", ids.property.as_str())?
            .bind_iri("o", ids.object.as_str())?
            .bind_raw("triplet_class", ErClass::Triplet.curie())
            .bind_raw("entity_class", ErClass::Entity.curie())
            .bind_raw("relationship_class", ErClass::Relationship.curie())
            .bind_raw("subject_prop", ErProperty::Subject.curie())
            .bind_raw("property_prop", ErProperty::Property.curie())
            .bind_raw("object_prop", ErProperty::Object.curie())
            .bind_raw("value_prop", ErProperty::Value.curie())
            .bind_literal("subject", &fact.subject)
            .bind_literal("relation", &fact.relation)
            .bind_literal("object", &fact.object)
            .render())
    }

    /// Wrap a triple block in a single `INSERT DATA` scoped to the graph.
    pub fn insert_data(&self, data: &str) -> String {
        self.scoped(INSERT_DATA).bind_raw("data", data).render()
    }

    /// Remove every reified statement whose three literals equal `fact`.
    pub fn delete_matching(&self, fact: &Fact) -> String {
        self.scoped(DELETE_MATCHING)
            .bind_literal("subject", &fact.subject)
            .bind_literal("relation", &fact.relation)
            .bind_literal("object", &fact.object)
            .render()
    }

    pub fn create_graph(uri: &str) -> Result<String, SparqyError> {
        Ok(QueryTemplate::new("CREATE GRAPH $uri")
            .bind_iri("uri", uri)?
            .render())
    }

    pub fn drop_graph(uri: &str) -> Result<String, SparqyError> {
        Ok(QueryTemplate::new("DROP GRAPH $uri")
            .bind_iri("uri", uri)?
            .render())
    }
}

/// `LIMIT n` for positive limits; empty otherwise.
fn limit_clause(limit: Option<usize>) -> String {
    match limit {
        Some(n) if n > 0 => format!("\nLIMIT {n}"),
        _ => String::new(),
    }
}
