//! Document backend configuration.

use crate::backend::document::RedisDocumentStore;
use crate::errors::Result;

/// Fallback used when `REDIS_URL` is not set.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1/";

/// Gets the document store URL from `REDIS_URL` or returns the local default.
#[must_use]
pub fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string())
}

/// Builds a document store client for `redis_url`.
///
/// Only the URL is validated here; the connection is opened on first use.
pub fn create_document_store(redis_url: &str) -> Result<RedisDocumentStore> {
    RedisDocumentStore::open(redis_url)
}
