//! Menu item entity - Reference data for everything that can be sold.
//!
//! Ids are opaque strings so the same menu item id can be carried by either
//! backend. Items are edited by back-office tooling and read by the cart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    /// Opaque identifier for the menu item
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "Chips", "Soda")
    pub name: String,
    /// Unit price, never negative
    pub price: f64,
    /// Free text category label (e.g., "snacks")
    pub category: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Optional image reference
    pub image_url: Option<String>,
    /// Whether the item can currently be ordered
    pub available: bool,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `MenuItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A menu item can appear on many order lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
