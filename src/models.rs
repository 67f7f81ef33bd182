//! Domain types shared by the cart, the backends and the receipt formatter.
//!
//! These are backend-neutral: the relational entities and the document
//! payloads both convert into and out of them.

use crate::entities::menu_item;
use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer name used when checkout leaves the name blank.
pub const GUEST_CUSTOMER: &str = "Guest";

/// Payment and fulfilment status written for every new order.
pub const STATUS_COMPLETED: &str = "completed";

/// Two amounts closer than half a cent are considered equal.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// Largest quantity a single line may hold; order lines store it as `i32`.
pub const MAX_LINE_QUANTITY: u32 = 2_147_483_647;

/// A sellable item as seen by the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Opaque identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Free text category label
    pub category: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the item can currently be ordered
    pub available: bool,
}

impl MenuItem {
    /// Builds an available item with no description or image.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: category.into(),
            description: None,
            image_url: None,
            available: true,
        }
    }
}

impl From<menu_item::Model> for MenuItem {
    fn from(model: menu_item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            category: model.category,
            description: model.description,
            image_url: model.image_url,
            available: model.available,
        }
    }
}

/// One line of the cart: a menu item snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the item at the time it was added
    pub item: MenuItem,
    /// Always greater than zero while the line is in a cart
    pub quantity: u32,
}

impl CartLine {
    /// `price * quantity`
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// Payment methods accepted at checkout. Only cash is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash at the counter
    #[default]
    Cash,
}

impl PaymentMethod {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
        }
    }

    /// Human readable label for receipts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frozen copy of a cart line captured at the moment of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// Menu item that was sold
    pub menu_item_id: String,
    /// Item name at the time of sale
    pub name: String,
    /// Units sold
    pub quantity: u32,
    /// Price per unit at the time of sale
    pub unit_price: f64,
}

impl TransactionLine {
    /// `unit_price * quantity`
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

impl From<&CartLine> for TransactionLine {
    fn from(line: &CartLine) -> Self {
        Self {
            menu_item_id: line.item.id.clone(),
            name: line.item.name.clone(),
            quantity: line.quantity,
            unit_price: line.item.price,
        }
    }
}

/// The persisted, immutable record of a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Backend-assigned order id
    pub id: String,
    /// When the sale was recorded
    pub date: DateTime<Utc>,
    /// Customer name, never blank
    pub customer: String,
    /// Lines captured at the time of sale
    pub items: Vec<TransactionLine>,
    /// Sum of the line subtotals
    pub total: f64,
    /// How the customer paid
    pub payment_method: PaymentMethod,
    /// Payment status at creation
    pub payment_status: String,
    /// Fulfilment status at creation
    pub status: String,
}

/// Everything a backend needs to record one checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Snapshot of the cart lines
    pub lines: Vec<CartLine>,
    /// Name as typed at checkout, possibly blank
    pub customer_name: String,
    /// Computed cart total
    pub total: f64,
    /// Optional table number from the checkout form
    pub table_number: Option<String>,
}

impl OrderRequest {
    /// Creates a request without a table number.
    #[must_use]
    pub fn new(lines: Vec<CartLine>, customer_name: impl Into<String>, total: f64) -> Self {
        Self {
            lines,
            customer_name: customer_name.into(),
            total,
            table_number: None,
        }
    }

    /// Attaches a table number; blank numbers are dropped.
    #[must_use]
    pub fn with_table_number(mut self, table_number: Option<String>) -> Self {
        self.table_number = table_number.filter(|t| !t.trim().is_empty());
        self
    }

    /// Customer name to persist, falling back to [`GUEST_CUSTOMER`].
    #[must_use]
    pub fn customer(&self) -> String {
        let trimmed = self.customer_name.trim();
        if trimmed.is_empty() {
            GUEST_CUSTOMER.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Sum of the line subtotals.
    #[must_use]
    pub fn computed_total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Frozen copies of the lines for the resulting [`Transaction`].
    #[must_use]
    pub fn transaction_lines(&self) -> Vec<TransactionLine> {
        self.lines.iter().map(TransactionLine::from).collect()
    }

    /// Builds the frozen transaction once the backend has assigned an id.
    #[must_use]
    pub fn into_transaction(self, id: String, date: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            date,
            customer: self.customer(),
            items: self.transaction_lines(),
            total: self.total,
            payment_method: PaymentMethod::Cash,
            payment_status: STATUS_COMPLETED.to_string(),
            status: STATUS_COMPLETED.to_string(),
        }
    }
}

/// The two interchangeable data stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQL store accessed through SeaORM
    #[default]
    Relational,
    /// Key/document store
    Document,
}

impl BackendKind {
    /// The backend that is not `self`.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Relational => Self::Document,
            Self::Document => Self::Relational,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relational => f.write_str("relational store"),
            Self::Document => f.write_str("document store"),
        }
    }
}

/// Flattened outcome of a checkout, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    /// Whether the primary write succeeded
    pub success: bool,
    /// Id assigned by the backend that took the write
    pub transaction_id: Option<String>,
    /// Frozen transaction used to build the receipt
    pub data: Option<Transaction>,
    /// User-facing error message
    pub error: Option<String>,
    /// Backend that took the write
    pub backend: Option<BackendKind>,
}

impl TransactionResult {
    /// Successful write on `backend`.
    #[must_use]
    pub fn succeeded(backend: BackendKind, transaction: Transaction) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction.id.clone()),
            data: Some(transaction),
            error: None,
            backend: Some(backend),
        }
    }

    /// Failed checkout; `backend` is set when a write was attempted.
    #[must_use]
    pub fn failed(backend: Option<BackendKind>, error: &Error) -> Self {
        Self {
            success: false,
            transaction_id: None,
            data: None,
            error: Some(error.to_string()),
            backend,
        }
    }
}
