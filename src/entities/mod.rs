//! Entity module - SeaORM entity definitions for the relational backend.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod menu_item;
pub mod order;
pub mod order_item;

// Re-export specific types to avoid conflicts
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
