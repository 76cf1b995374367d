//! Identifier strategies for minted resources.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use sparqy_core::types::{ReifiedIds, ResourceId};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of resource identifier tokens.
pub trait IdGenerator: Send + Sync {
    /// Next uppercase-alphanumeric token.
    fn next_token(&self) -> String;

    /// Four fresh identifiers for one reified statement.
    fn reified_ids(&self) -> ReifiedIds {
        ReifiedIds {
            triplet: ResourceId::triplet(&self.next_token()),
            subject: ResourceId::entity(&self.next_token()),
            property: ResourceId::relationship(&self.next_token()),
            object: ResourceId::entity(&self.next_token()),
        }
    }
}

/// Random tokens from the thread-local CSPRNG.
///
/// Nothing checks new tokens against existing resources; the length sets the
/// collision odds. 16 characters give 36^16 (about 8e24) possibilities.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    /// Token length of the original four-character scheme.
    pub const LEGACY_LENGTH: usize = 4;

    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    pub fn legacy() -> Self {
        Self::new(Self::LEGACY_LENGTH)
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(16)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }
}

/// Monotonic per-instance counter, rendered as zero-padded uppercase hex.
///
/// Never repeats within one instance; two instances (or restarts) start over
/// from the same value.
#[derive(Debug)]
pub struct CounterIdGenerator {
    next: AtomicU64,
    width: usize,
}

impl CounterIdGenerator {
    pub fn new(width: usize) -> Self {
        Self::starting_at(0, width)
    }

    pub fn starting_at(start: u64, width: usize) -> Self {
        Self {
            next: AtomicU64::new(start),
            width,
        }
    }
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl IdGenerator for CounterIdGenerator {
    fn next_token(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{n:0width$X}", width = self.width)
    }
}
