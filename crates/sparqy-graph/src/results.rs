//! Decoding of SPARQL 1.1 JSON query results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::GraphError;

/// One result row: bound variable name → term.
pub type Binding = BTreeMap<String, Term>;

/// A `application/sparql-results+json` SELECT document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: ResultSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// An RDF term as encoded in a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    /// Emitted by older stores for literals with a datatype.
    TypedLiteral,
    Bnode,
    Triple,
}

impl Term {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }
}

impl SelectResults {
    pub fn from_json(body: &str) -> Result<Self, GraphError> {
        serde_json::from_str(body).map_err(|e| GraphError::Decode(e.to_string()))
    }

    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        let mut vars: Vec<String> = bindings.iter().flat_map(|b| b.keys().cloned()).collect();
        vars.sort();
        vars.dedup();
        Self {
            head: Head { vars },
            results: ResultSet { bindings },
        }
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.results.bindings
    }
}

/// The lexical value bound to `var`, if any.
pub fn value<'a>(binding: &'a Binding, var: &str) -> Option<&'a str> {
    binding.get(var).map(|t| t.value.as_str())
}
