//! Backend layer - the two interchangeable stores behind one strategy trait.
//!
//! The coordinator only ever sees `Arc<dyn BackendWriter>`. Clients are built
//! by the application entry point and injected, never held in globals.

/// Document store writer and the Redis-backed store
pub mod document;
/// Bounded-time connectivity probes
pub mod prober;
/// SeaORM-backed writer
pub mod relational;

use crate::errors::Result;
use crate::models::{BackendKind, OrderRequest, Transaction};
use async_trait::async_trait;
use std::time::Instant;

pub use document::{DocumentBackend, DocumentStore, RedisDocumentStore};
pub use prober::{ConnectionProber, ConnectionStatus, ProbeReport};
pub use relational::RelationalBackend;

/// A store that can record completed checkouts.
///
/// Implementations write the order record first and its lines second. A
/// failure after the order record exists is reported as
/// [`Error::OrderLines`](crate::errors::Error::OrderLines) and not rolled back.
#[async_trait]
pub trait BackendWriter: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Cheapest possible operation proving the backend is reachable.
    async fn check_connection(&self) -> Result<()>;

    /// Persists one order and its lines, returning the frozen transaction.
    async fn write(&self, request: &OrderRequest) -> Result<Transaction>;
}

/// Milliseconds since `started`, saturating.
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
