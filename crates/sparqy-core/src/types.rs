//! Core domain types for the sparqy triple store adapter.
//!
//! A logical [`Fact`] is never stored as-is. It is reified into four
//! resources of the `er:` vocabulary: one `er:Triplet` linked to two
//! `er:Entity` resources and one `er:Relationship`, each carrying its
//! literal in `er:value`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SparqyError;

// ── Vocabulary ────────────────────────────────────────────────────

/// Namespace of the reification vocabulary, as reported by `get_schema`.
pub const ER_NAMESPACE: &str = "http://purl.org/stuff/er";

/// IRI bound to the `er:` prefix in every query.
pub const ER_PREFIX_IRI: &str = "http://purl.org/stuff/er#";

/// The three resource classes of the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErClass {
    Triplet,
    Entity,
    Relationship,
}

impl ErClass {
    pub fn curie(&self) -> &'static str {
        match self {
            Self::Triplet => "er:Triplet",
            Self::Entity => "er:Entity",
            Self::Relationship => "er:Relationship",
        }
    }
}

/// The four properties of the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErProperty {
    Subject,
    Property,
    Object,
    Value,
}

impl ErProperty {
    pub fn curie(&self) -> &'static str {
        match self {
            Self::Subject => "er:subject",
            Self::Property => "er:property",
            Self::Object => "er:object",
            Self::Value => "er:value",
        }
    }
}

// ── Facts ─────────────────────────────────────────────────────────

/// A subject-relation-object statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Fact {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Fact {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

// ── Resource Identifiers ──────────────────────────────────────────

/// A fragment IRI (`#T…`, `#E_…`, `#R_…`) resolved against the configured `BASE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn triplet(token: &str) -> Self {
        Self(format!("#T{token}"))
    }

    pub fn entity(token: &str) -> Self {
        Self(format!("#E_{token}"))
    }

    pub fn relationship(token: &str) -> Self {
        Self(format!("#R_{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four freshly minted identifiers of one reified statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReifiedIds {
    pub triplet: ResourceId,
    pub subject: ResourceId,
    pub property: ResourceId,
    pub object: ResourceId,
}

// ── Traversal ─────────────────────────────────────────────────────

/// How many hops a relationship map follows from each subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDepth {
    OneHop,
    #[default]
    TwoHop,
}

impl TraversalDepth {
    pub fn hops(&self) -> u32 {
        match self {
            Self::OneHop => 1,
            Self::TwoHop => 2,
        }
    }
}

impl TryFrom<u32> for TraversalDepth {
    type Error = SparqyError;

    fn try_from(depth: u32) -> Result<Self, Self::Error> {
        match depth {
            1 => Ok(Self::OneHop),
            2 => Ok(Self::TwoHop),
            other => Err(SparqyError::UnsupportedDepth(other)),
        }
    }
}

/// Relationship map: subject → rendered arrow-chain rows.
pub type RelMap = BTreeMap<String, Vec<String>>;

// ── Arrow Rendering ───────────────────────────────────────────────

/// Selects the textual layout of two-hop rows.
///
/// `Legacy` reproduces the historical output byte-for-byte, including the
/// stray `'` after the first object. `Clean` omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowStyle {
    #[default]
    Legacy,
    Clean,
}

/// One relation/object step of a traversal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub relation: String,
    pub object: String,
}

/// A decoded traversal row: the subject, its first hop, and an optional second hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowPath {
    pub subject: String,
    pub first: Hop,
    pub second: Option<Hop>,
}

impl ArrowPath {
    pub fn render(&self, style: ArrowStyle) -> String {
        let Self {
            subject,
            first,
            second,
        } = self;
        match (second, style) {
            (None, _) => format!("{subject}, -[{}]->, {}", first.relation, first.object),
            (Some(second), ArrowStyle::Legacy) => format!(
                "{subject}, -[{}]->, {}',<-[{}]-, {}",
                first.relation, first.object, second.relation, second.object
            ),
            (Some(second), ArrowStyle::Clean) => format!(
                "{subject}, -[{}]->, {},<-[{}]-, {}",
                first.relation, first.object, second.relation, second.object
            ),
        }
    }
}
