//! Order entity - One row per completed checkout.
//!
//! The total is computed from the cart at write time and the row is never
//! mutated by the checkout path afterwards. Status transitions belong to
//! order management, not to this crate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Backend-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer name, `"Guest"` when none was given
    pub customer_name: String,
    /// Payment method, always `"cash"` for now
    pub payment_method: String,
    /// Payment status, `"completed"` at creation
    pub payment_status: String,
    /// Fulfilment status, `"completed"` at creation
    pub status: String,
    /// Sum of the line subtotals
    pub total_amount: f64,
    /// Optional table the order was served at
    pub table_number: Option<String>,
    /// Optional employee who rang the order up
    pub employee_id: Option<String>,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An order owns its lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
