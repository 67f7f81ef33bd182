//! Menu business logic - the catalog the cart is filled from.
//!
//! Menu items live in the relational backend. They are reference data for the
//! checkout path: the cart copies an item when it is added, and later price
//! changes never reach orders already written.

use crate::{
    config::MenuItemConfig,
    entities::{MenuItem as MenuItemEntity, menu_item},
    errors::{Error, Result},
    models::MenuItem,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Retrieves all orderable items, ordered by category then name.
pub async fn get_available_menu_items(db: &DatabaseConnection) -> Result<Vec<MenuItem>> {
    let items = MenuItemEntity::find()
        .filter(menu_item::Column::Available.eq(true))
        .order_by_asc(menu_item::Column::Category)
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await?;
    Ok(items.into_iter().map(MenuItem::from).collect())
}

/// Retrieves every item, available or not, ordered by name.
pub async fn get_all_menu_items(db: &DatabaseConnection) -> Result<Vec<MenuItem>> {
    let items = MenuItemEntity::find()
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await?;
    Ok(items.into_iter().map(MenuItem::from).collect())
}

/// Retrieves a specific item by its id.
pub async fn get_menu_item_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<MenuItem>> {
    Ok(MenuItemEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(MenuItem::from))
}

/// Creates a menu item, performing input validation.
///
/// A blank id is replaced with a generated one. The name is trimmed.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The database insert operation fails
pub async fn create_menu_item(db: &DatabaseConnection, item: MenuItem) -> Result<MenuItem> {
    if item.name.trim().is_empty() {
        return Err(Error::InvalidMenuItem {
            message: "name cannot be empty".to_string(),
        });
    }

    if item.price < 0.0 || !item.price.is_finite() {
        return Err(Error::InvalidAmount { amount: item.price });
    }

    let id = if item.id.trim().is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        item.id.trim().to_string()
    };
    let now = chrono::Utc::now();

    let model = menu_item::ActiveModel {
        id: Set(id),
        name: Set(item.name.trim().to_string()),
        price: Set(item.price),
        category: Set(item.category),
        description: Set(item.description),
        image_url: Set(item.image_url),
        available: Set(item.available),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?.into())
}

/// Marks an item as orderable or not.
///
/// # Errors
/// Returns an error if the item does not exist or the update fails.
pub async fn set_menu_item_availability(
    db: &DatabaseConnection,
    id: &str,
    available: bool,
) -> Result<MenuItem> {
    let mut item: menu_item::ActiveModel = MenuItemEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::MenuItemNotFound { id: id.to_string() })?
        .into();

    item.available = Set(available);
    item.updated_at = Set(chrono::Utc::now());

    Ok(item.update(db).await?.into())
}

/// Inserts configured items whose id is not in the catalog yet.
///
/// Existing items are left untouched, so edits made after the first run
/// survive restarts. Returns how many items were inserted.
pub async fn seed_menu_items(db: &DatabaseConnection, items: &[MenuItemConfig]) -> Result<usize> {
    let mut inserted = 0;
    for config in items {
        if get_menu_item_by_id(db, &config.id).await?.is_some() {
            continue;
        }
        create_menu_item(db, MenuItem::from(config)).await?;
        inserted += 1;
    }

    if inserted > 0 {
        info!("Seeded {inserted} menu items");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_menu_item_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_menu_item(&db, MenuItem::new("x", "  ", 10.0, "misc")).await;
        assert!(matches!(result, Err(Error::InvalidMenuItem { .. })));

        let result = create_menu_item(&db, MenuItem::new("x", "Tea", -1.0, "misc")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == -1.0));

        let result = create_menu_item(&db, MenuItem::new("x", "Tea", f64::NAN, "misc")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let result = create_menu_item(&db, MenuItem::new("x", "Tea", f64::INFINITY, "misc")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_create_and_get_menu_item() -> Result<()> {
        let db = setup_test_db().await?;

        let item = MenuItem::new("tea", " Iced Tea ", 500.0, "drinks");
        let created = create_menu_item(&db, item).await?;
        assert_eq!(created.name, "Iced Tea");

        let found = get_menu_item_by_id(&db, "tea").await?.unwrap();
        assert_eq!(found, created);
        assert!(get_menu_item_by_id(&db, "missing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_id_is_generated() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_menu_item(&db, MenuItem::new("", "Water", 0.0, "drinks")).await?;
        assert!(!created.id.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_available_items_are_filtered_and_ordered() -> Result<()> {
        let db = setup_menu_db().await?;
        create_menu_item(&db, MenuItem::new("c", "Apple Juice", 1500.0, "drinks")).await?;
        set_menu_item_availability(&db, "b", false).await?;

        let available = get_available_menu_items(&db).await?;
        let names: Vec<&str> = available.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apple Juice", "Chips"]);

        assert_eq!(get_all_menu_items(&db).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_availability_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_menu_item_availability(&db, "nope", true).await;
        assert!(matches!(result, Err(Error::MenuItemNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_skips_existing_items() -> Result<()> {
        let db = setup_menu_db().await?;
        let configs = vec![
            MenuItemConfig {
                id: "a".to_string(),
                name: "Renamed Chips".to_string(),
                price: 1.0,
                category: "snacks".to_string(),
                description: None,
                image_url: None,
                available: true,
            },
            MenuItemConfig {
                id: "d".to_string(),
                name: "Donut".to_string(),
                price: 800.0,
                category: "snacks".to_string(),
                description: Some("Glazed".to_string()),
                image_url: None,
                available: true,
            },
        ];

        assert_eq!(seed_menu_items(&db, &configs).await?, 1);
        assert_eq!(seed_menu_items(&db, &configs).await?, 0);

        let chips = get_menu_item_by_id(&db, "a").await?.unwrap();
        assert_eq!(chips.name, "Chips");
        assert_eq!(chips.price, 2000.0);
        Ok(())
    }
}
