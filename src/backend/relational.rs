//! Relational writer - orders and order lines through SeaORM.
//!
//! Order lines are inserted as one batch after the order row. The two are
//! separate statements: a failed batch leaves the order row in place and is
//! reported as a partial failure.

use super::{BackendWriter, elapsed_ms};
use crate::{
    entities::{Order, OrderItem, order, order_item},
    errors::{Error, Result},
    models::{BackendKind, OrderRequest, PaymentMethod, STATUS_COMPLETED, Transaction},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{QuerySelect, Set, prelude::*};
use std::time::Instant;
use tracing::{error, info, instrument};

/// [`BackendWriter`] over a SeaORM connection.
#[derive(Debug)]
pub struct RelationalBackend {
    db: DatabaseConnection,
}

impl RelationalBackend {
    /// Wraps an existing connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection, for catalog and history queries.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl BackendWriter for RelationalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn check_connection(&self) -> Result<()> {
        let _: Vec<order::Model> = Order::find().limit(1).all(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn write(&self, request: &OrderRequest) -> Result<Transaction> {
        if request.lines.is_empty() {
            return Err(Error::EmptyOrder);
        }

        let quantities = request
            .lines
            .iter()
            .map(|line| {
                i32::try_from(line.quantity).map_err(|_| Error::InvalidQuantity {
                    item_id: line.item.id.clone(),
                    quantity: i64::from(line.quantity),
                })
            })
            .collect::<Result<Vec<i32>>>()?;

        let started = Instant::now();
        let now = Utc::now();

        let order = order::ActiveModel {
            customer_name: Set(request.customer()),
            payment_method: Set(PaymentMethod::Cash.as_str().to_string()),
            payment_status: Set(STATUS_COMPLETED.to_string()),
            status: Set(STATUS_COMPLETED.to_string()),
            total_amount: Set(request.total),
            table_number: Set(request.table_number.clone()),
            employee_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
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

        let lines = request
            .lines
            .iter()
            .zip(quantities)
            .map(|(line, quantity)| order_item::ActiveModel {
                order_id: Set(order.id),
                menu_item_id: Set(line.item.id.clone()),
                quantity: Set(quantity),
                unit_price: Set(line.item.price),
                subtotal: Set(line.subtotal()),
                created_at: Set(now),
                ..Default::default()
            });

        OrderItem::insert_many(lines)
            .exec(&self.db)
            .await
            .map_err(|e| {
                error!(
                    operation = "insert_order_items",
                    backend = %self.kind(),
                    order_id = order.id,
                    elapsed_ms = elapsed_ms(started),
                    error = %e,
                    "Order created but its items could not be saved"
                );
                Error::OrderLines {
                    backend: self.kind().to_string(),
                    order_id: order.id.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!(
            order_id = order.id,
            total = request.total,
            elapsed_ms = elapsed_ms(started),
            "Order written to relational store"
        );

        Ok(request
            .clone()
            .into_transaction(order.id.to_string(), order.created_at))
    }
}
