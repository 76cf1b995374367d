//! sparqy-graph: a SPARQL triple store viewed as a labeled-property graph.
//!
//! Facts are written as reified `er:Triplet` structures inside one named
//! graph and read back as two-hop arrow chains. All store traffic flows
//! through a [`SparqlEndpoint`]; [`SparqlClient`] is the HTTP implementation.

pub mod auth;
pub mod client;
pub mod ids;
pub mod mutations;
pub mod queries;
pub mod results;
pub mod sparql;
pub mod store;

pub use client::{GraphError, Operation, QueryResponse, SparqlClient, SparqlEndpoint};
pub use ids::{CounterIdGenerator, IdGenerator, RandomIdGenerator};
pub use results::{Binding, SelectResults};
pub use store::{GraphStore, SparqlGraphStore};
