//! Core business logic - framework-agnostic cart, checkout and order operations.
//!
//! Nothing here knows about a UI. The presentation layer owns a [`cart::Cart`]
//! and a [`coordinator::TransactionCoordinator`] and calls into these modules.

pub mod cart;
pub mod checkout;
pub mod coordinator;
pub mod menu;
pub mod orders;
pub mod receipt;
