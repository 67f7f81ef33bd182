//! Order history - read side of the relational backend.
//!
//! Lets staff list recent checkouts and rebuild a [`Transaction`] from the
//! stored rows so a receipt can be printed again.

use crate::{
    entities::{MenuItem as MenuItemEntity, Order, OrderItem, order, order_item},
    errors::{Error, Result},
    models::{PaymentMethod, Transaction, TransactionLine},
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};

/// Retrieves the most recent orders, newest first.
pub async fn get_recent_orders(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<order::Model>> {
    Ok(Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Retrieves an order together with its lines.
pub async fn get_order_with_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<(order::Model, Vec<order_item::Model>)>> {
    let Some(order) = Order::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    Ok(Some((order, items)))
}

/// Rebuilds the frozen transaction of a stored order.
///
/// Line names come from the menu; a line whose menu item has since been
/// removed shows its menu item id instead. A stored negative quantity is
/// reported as [`Error::InvalidQuantity`].
pub async fn load_transaction(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<Transaction>> {
    let Some(order) = Order::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };

    let rows = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .find_also_related(MenuItemEntity)
        .all(db)
        .await?;

    let items = rows
        .into_iter()
        .map(|(line, menu_item)| {
            let quantity = u32::try_from(line.quantity).map_err(|_| Error::InvalidQuantity {
                item_id: line.menu_item_id.clone(),
                quantity: i64::from(line.quantity),
            })?;
            Ok(TransactionLine {
                name: menu_item.map_or_else(|| line.menu_item_id.clone(), |m| m.name),
                menu_item_id: line.menu_item_id,
                quantity,
                unit_price: line.unit_price,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Transaction {
        id: order.id.to_string(),
        date: order.created_at,
        customer: order.customer_name,
        items,
        total: order.total_amount,
        payment_method: PaymentMethod::Cash,
        payment_status: order.payment_status,
        status: order.status,
    }))
}
