//! Document writer - orders and order lines as JSON documents.
//!
//! A [`DocumentStore`] groups documents into named collections and assigns
//! each one an id. [`RedisDocumentStore`] keeps every document as a JSON
//! string at `<collection>:<id>` and tracks the ids of a collection in a set
//! named after it.

use super::{BackendWriter, elapsed_ms};
use crate::{
    errors::{Error, Result},
    models::{BackendKind, OrderRequest, PaymentMethod, STATUS_COMPLETED, Transaction},
};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Collection holding order documents
pub const ORDERS: &str = "orders";
/// Collection holding order line documents
pub const ORDER_ITEMS: &str = "order_items";
/// Collection used by the write-capability probe
pub const CONNECTION_TEST: &str = "_connection_test";

/// Minimal document store: insert, fetch, delete and a cheap read.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `document` in `collection` and returns its generated id.
    async fn insert(&self, collection: &str, document: Value) -> Result<String>;

    /// Fetches a document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Removes a document; absent ids are ignored.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Returns the id of any one document in `collection`, if there is one.
    async fn peek(&self, collection: &str) -> Result<Option<String>>;
}

fn document_key(collection: &str, id: &str) -> String {
    format!("{collection}:{id}")
}

/// Adds the generated id and the store-side timestamp to an object document.
pub(crate) fn stamp(mut document: Value, id: &str) -> Value {
    if let Value::Object(map) = &mut document {
        map.insert("id".to_string(), json!(id));
        map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
    }
    document
}

/// Redis-backed [`DocumentStore`].
///
/// The connection is opened on first use and then shared; `ConnectionManager`
/// reconnects on its own after a dropped connection.
pub struct RedisDocumentStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl RedisDocumentStore {
    /// Validates `redis_url` without connecting.
    pub fn open(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::open(redis_url)?,
            manager: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                debug!("Opening document store connection");
                self.client.get_connection_manager().await
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&stamp(document, &id))?;
        let mut conn = self.connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .set(document_key(collection, &id), payload)
            .ignore()
            .sadd(collection, &id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(document_key(collection, id)).await?;
        raw.map(|r| serde_json::from_str(&r))
            .transpose()
            .map_err(Into::into)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .del(document_key(collection, id))
            .ignore()
            .srem(collection, id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn peek(&self, collection: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let member: Option<String> = conn.srandmember(collection).await?;
        Ok(member)
    }
}

/// Order document; same logical fields as the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    /// Customer name, `"Guest"` when none was given
    pub customer_name: String,
    /// Payment method
    pub payment_method: String,
    /// Payment status
    pub payment_status: String,
    /// Fulfilment status
    pub status: String,
    /// Sum of the line subtotals
    pub total_amount: f64,
    /// Optional table number
    #[serde(default)]
    pub table_number: Option<String>,
    /// Optional employee id
    #[serde(default)]
    pub employee_id: Option<String>,
}

/// Order line document; same logical fields as the `order_items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDocument {
    /// Parent order document id
    pub order_id: String,
    /// Menu item that was sold
    pub menu_item_id: String,
    /// Units sold
    pub quantity: u32,
    /// Price per unit at the time of sale
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub subtotal: f64,
}

/// [`BackendWriter`] over any [`DocumentStore`].
pub struct DocumentBackend<S> {
    store: S,
    probe_writes: bool,
}

impl<S: DocumentStore> DocumentBackend<S> {
    /// Wraps `store` with a read-only connectivity probe.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            probe_writes: false,
        }
    }

    /// Makes the probe also write and delete a throwaway document, proving
    /// write permission as well as reachability.
    #[must_use]
    pub const fn with_write_probe(mut self, enabled: bool) -> Self {
        self.probe_writes = enabled;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: DocumentStore> BackendWriter for DocumentBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn check_connection(&self) -> Result<()> {
        self.store.peek(ORDERS).await?;

        if self.probe_writes {
            let id = self
                .store
                .insert(CONNECTION_TEST, json!({ "probe": true }))
                .await?;
            self.store.delete(CONNECTION_TEST, &id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn write(&self, request: &OrderRequest) -> Result<Transaction> {
        if request.lines.is_empty() {
            return Err(Error::EmptyOrder);
        }

        let started = Instant::now();
        let order = OrderDocument {
            customer_name: request.customer(),
            payment_method: PaymentMethod::Cash.as_str().to_string(),
            payment_status: STATUS_COMPLETED.to_string(),
            status: STATUS_COMPLETED.to_string(),
            total_amount: request.total,
            table_number: request.table_number.clone(),
            employee_id: None,
        };

        let order_id = match serde_json::to_value(&order) {
            Ok(document) => self.store.insert(ORDERS, document).await,
            Err(e) => Err(e.into()),
        }
        .map_err(|e| {
            error!(
                operation = "insert_order",
                backend = %self.kind(),
                elapsed_ms = elapsed_ms(started),
                error = %e,
                "Order creation failed"
            );
            Error::OrderCreation {
                backend: self.kind().to_string(),
                message: e.to_string(),
            }
        })?;

        for line in &request.lines {
            let item = OrderItemDocument {
                order_id: order_id.clone(),
                menu_item_id: line.item.id.clone(),
                quantity: line.quantity,
                unit_price: line.item.price,
                subtotal: line.subtotal(),
            };

            let written = match serde_json::to_value(&item) {
                Ok(document) => self.store.insert(ORDER_ITEMS, document).await,
                Err(e) => Err(e.into()),
            };

            if let Err(e) = written {
                error!(
                    operation = "insert_order_items",
                    backend = %self.kind(),
                    order_id = %order_id,
                    elapsed_ms = elapsed_ms(started),
                    error = %e,
                    "Order created but its items could not be saved"
                );
                return Err(Error::OrderLines {
                    backend: self.kind().to_string(),
                    order_id,
                    message: e.to_string(),
                });
            }
        }

        info!(
            order_id = %order_id,
            total = request.total,
            elapsed_ms = elapsed_ms(started),
            "Order written to document store"
        );

        Ok(request.clone().into_transaction(order_id, Utc::now()))
    }
}
