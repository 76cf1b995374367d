//! sparqy-core: Shared types, literal escaping, and configuration for sparqy.
//!
//! This crate provides the foundational pieces used by the adapter and the CLI:
//! - The logical [`Fact`] and the `er:` reification vocabulary
//! - Arrow-chain rendering of traversal rows
//! - RDF literal escaping and unescaping
//! - Store configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod escape;
pub mod types;

pub use self::config::{HttpAuth, StoreConfig};
pub use error::SparqyError;
pub use types::{ArrowPath, ArrowStyle, Fact, Hop, RelMap, TraversalDepth};
