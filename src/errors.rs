//! Unified error type for the point-of-sale core.
//!
//! Backend client errors convert into this type with `?`. Checkout failures
//! carry enough context (backend, order id) to tell a clean failure apart from
//! the partial one where an order exists without its lines.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Relational backend error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Document backend error
    #[error("Document store error: {0}")]
    DocumentStore(#[from] redis::RedisError),

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A price or total is negative or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A menu item failed validation
    #[error("Invalid menu item: {message}")]
    InvalidMenuItem {
        /// What is wrong with the item
        message: String,
    },

    /// A line quantity is outside what an order line can hold
    #[error("Invalid quantity {quantity} for item '{item_id}'")]
    InvalidQuantity {
        /// Menu item of the offending line
        item_id: String,
        /// The rejected quantity
        quantity: i64,
    },

    /// No menu item exists with the given id
    #[error("Menu item '{id}' not found")]
    MenuItemNotFound {
        /// The id that was looked up
        id: String,
    },

    /// Checkout was attempted with no line items
    #[error("Cannot process an empty order")]
    EmptyOrder,

    /// The supplied total does not match the line subtotals
    #[error("Order total {supplied} does not match line subtotals {computed}")]
    TotalMismatch {
        /// Total handed to the checkout
        supplied: f64,
        /// Sum of quantity x unit price over all lines
        computed: f64,
    },

    /// The order record itself could not be created; nothing was persisted
    #[error("Order creation failed on {backend}: {message}")]
    OrderCreation {
        /// Backend that rejected the insert
        backend: String,
        /// Underlying error message
        message: String,
    },

    /// The order record exists but its lines could not be saved
    #[error(
        "Order {order_id} was created on {backend} but its items could not be saved: {message}. Please contact support"
    )]
    OrderLines {
        /// Backend holding the orphaned order
        backend: String,
        /// Id of the orphaned order record
        order_id: String,
        /// Underlying error message
        message: String,
    },

    /// Neither backend passed its connectivity probe
    #[error(
        "No backend available. Relational store: {relational}. Document store: {document}"
    )]
    NoBackendAvailable {
        /// Last relational probe error
        relational: String,
        /// Last document probe error
        document: String,
    },

    /// A probe did not finish within its time budget
    #[error("Connection timeout after {millis}ms")]
    ProbeTimeout {
        /// Configured timeout in milliseconds
        millis: u128,
    },

    /// Another checkout on the same coordinator has not finished yet
    #[error("A checkout is already in progress")]
    CheckoutInProgress,

    /// The checkout form failed validation
    #[error("Invalid checkout form: {message}")]
    Validation {
        /// Joined field messages
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
