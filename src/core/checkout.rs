//! Checkout form validation and the submit flow tying cart, coordinator and
//! receipt together.
//!
//! Each point-of-sale screen owns a [`CheckoutSession`]. A session allows one
//! submit at a time, so a double click cannot record the same cart twice,
//! while other sessions sharing the coordinator check out independently.

use crate::{
    config::MerchantInfo,
    core::{cart::Cart, coordinator::TransactionCoordinator, receipt},
    errors::{Error, Result},
    models::{BackendKind, OrderRequest, Transaction},
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Longest accepted customer name, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 50;

/// Raw checkout fields as typed by staff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    /// Optional, `"Guest"` is used when blank
    pub customer_name: String,
    /// Optional, digits only when present
    pub table_number: String,
    /// Required
    pub payment_method: String,
}

/// Outcome of [`validate`]: field name to message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// No field has an error
    pub valid: bool,
    /// Keyed by `customer_name`, `table_number` or `payment_method`
    pub errors: BTreeMap<&'static str, String>,
}

impl ValidationResult {
    fn summary(&self) -> String {
        self.errors
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks the form exactly as typed; never touches a backend.
#[must_use]
pub fn validate(form: &CheckoutForm) -> ValidationResult {
    let mut errors = BTreeMap::new();

    let table = &form.table_number;
    if !table.is_empty() && !table.chars().all(|c| c.is_ascii_digit()) {
        errors.insert(
            "table_number",
            "Table number must be a valid number".to_string(),
        );
    }

    if form.payment_method.is_empty() {
        errors.insert("payment_method", "Payment method is required".to_string());
    }

    if form.customer_name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        errors.insert(
            "customer_name",
            "Customer name must be less than 50 characters".to_string(),
        );
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

/// Cart of one point-of-sale screen plus its submit-in-progress flag.
#[derive(Debug, Default)]
pub struct CheckoutSession {
    cart: Mutex<Cart>,
    submitting: AtomicBool,
}

impl CheckoutSession {
    /// Session with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session starting from an existing cart.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            cart: Mutex::new(cart),
            submitting: AtomicBool::new(false),
        }
    }

    /// Locks the cart for reading or editing. Do not hold across an `.await`.
    pub fn cart(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a submit is running for this session.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}

/// Clears the session's submitting flag when the submit ends, however it ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything the presentation layer shows after a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    /// The recorded sale
    pub transaction: Transaction,
    /// Backend that took the write
    pub backend: BackendKind,
    /// Plain-text receipt
    pub text: String,
    /// Printable HTML receipt
    pub html: String,
    /// Download name for `text`
    pub file_name: String,
}

/// Validates the form, records the session's cart and renders the receipt.
///
/// The cart is cleared only when the order was recorded; on any error it
/// is left as it was so the checkout can be retried.
///
/// # Errors
/// Returns [`Error::Validation`] for a bad form,
/// [`Error::CheckoutInProgress`] while another submit of the same session is
/// running, otherwise whatever the coordinator reported.
pub async fn submit_checkout(
    coordinator: &TransactionCoordinator,
    session: &CheckoutSession,
    form: &CheckoutForm,
    preferred: BackendKind,
    merchant: &MerchantInfo,
) -> Result<CheckoutReceipt> {
    let validation = validate(form);
    if !validation.valid {
        let e = Error::Validation {
            message: validation.summary(),
        };
        warn!(error = %e, "Checkout form rejected");
        return Err(e);
    }

    let Some(_guard) = SubmitGuard::acquire(&session.submitting) else {
        warn!("Checkout refused, this session is already submitting");
        return Err(Error::CheckoutInProgress);
    };

    let (lines, total) = {
        let cart = session.cart();
        (cart.snapshot(), cart.total())
    };
    let request = OrderRequest::new(lines, form.customer_name.clone(), total)
        .with_table_number(Some(form.table_number.clone()));

    let (backend, transaction) = coordinator
        .try_process(request, preferred)
        .await
        .map_err(|(_, e)| e)?;

    session.cart().clear();
    info!(transaction_id = %transaction.id, %backend, "Checkout complete, cart cleared");

    Ok(CheckoutReceipt {
        text: receipt::to_text(&transaction, merchant),
        html: receipt::to_html(&transaction, merchant),
        file_name: receipt::receipt_file_name(&transaction),
        transaction,
        backend,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::backend::BackendWriter;
    use crate::config::BackendSettings;
    use crate::test_utils::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn form(name: &str, table: &str, payment: &str) -> CheckoutForm {
        CheckoutForm {
            customer_name: name.to_string(),
            table_number: table.to_string(),
            payment_method: payment.to_string(),
        }
    }

    fn coordinator(
        relational: &Arc<FakeBackend>,
        document: &Arc<FakeBackend>,
    ) -> TransactionCoordinator {
        TransactionCoordinator::new(
            Arc::clone(relational) as Arc<dyn BackendWriter>,
            Arc::clone(document) as Arc<dyn BackendWriter>,
            &BackendSettings::default(),
        )
    }

    fn example_session() -> CheckoutSession {
        let mut cart = Cart::new();
        cart.add_item(chips());
        cart.add_item(chips());
        cart.add_item(soda());
        CheckoutSession::with_cart(cart)
    }

    #[test]
    fn test_non_numeric_table_number() {
        let result = validate(&form("", "12A", "cash"));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors.get("table_number").unwrap(),
            "Table number must be a valid number"
        );
    }

    #[test]
    fn test_valid_forms() {
        assert!(validate(&form("", "", "cash")).valid);
        assert!(validate(&form("Alice", "12", "cash")).valid);
        assert!(validate(&form(&"x".repeat(50), "007", "cash")).valid);
    }

    #[test]
    fn test_fields_are_checked_as_typed() {
        for table in [" 12", "12 ", "   "] {
            let result = validate(&form("", table, "cash"));
            assert!(!result.valid, "{table:?}");
            assert!(result.errors.contains_key("table_number"));
        }

        let result = validate(&form("", "", " "));
        assert!(result.valid);
    }

    #[test]
    fn test_missing_payment_method_and_long_name() {
        let result = validate(&form(&"é".repeat(51), "", ""));
        assert!(!result.valid);
        assert_eq!(
            result.errors.get("payment_method").unwrap(),
            "Payment method is required"
        );
        assert_eq!(
            result.errors.get("customer_name").unwrap(),
            "Customer name must be less than 50 characters"
        );
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backends() {
        let relational = FakeBackend::healthy(BackendKind::Relational);
        let document = FakeBackend::healthy(BackendKind::Document);
        let session = example_session();

        let result = submit_checkout(
            &coordinator(&relational, &document),
            &session,
            &form("", "12A", "cash"),
            BackendKind::Relational,
            &MerchantInfo::default(),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(relational.probe_calls(), 0);
        assert_eq!(relational.write_calls(), 0);
        assert_eq!(session.cart().item_count(), 3);
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart() -> Result<()> {
        let relational = FakeBackend::healthy(BackendKind::Relational);
        let document = FakeBackend::healthy(BackendKind::Document);
        let session = example_session();

        let receipt = submit_checkout(
            &coordinator(&relational, &document),
            &session,
            &form("", "4", "cash"),
            BackendKind::Relational,
            &MerchantInfo::default(),
        )
        .await?;

        assert!(session.cart().is_empty());
        assert!(!session.is_submitting());
        assert_eq!(receipt.backend, BackendKind::Relational);
        assert_eq!(receipt.transaction.customer, "Guest");
        assert_eq!(receipt.file_name, "receipt-RELATION.txt");
        assert!(receipt.text.contains("5,000"));
        assert!(receipt.html.contains("2 x Chips"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let relational = FakeBackend::unhealthy(BackendKind::Relational);
        let document = FakeBackend::unhealthy(BackendKind::Document);
        let session = example_session();

        let result = submit_checkout(
            &coordinator(&relational, &document),
            &session,
            &form("Bob", "", "cash"),
            BackendKind::Relational,
            &MerchantInfo::default(),
        )
        .await;

        assert!(matches!(result, Err(Error::NoBackendAvailable { .. })));
        assert_eq!(session.cart().item_count(), 3);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_double_submit_of_one_session_is_refused() {
        let relational = FakeBackend::healthy(BackendKind::Relational);
        relational.set_write_delay(Duration::from_millis(100));
        let document = FakeBackend::healthy(BackendKind::Document);
        let coordinator = coordinator(&relational, &document);
        let session = example_session();
        let merchant = MerchantInfo::default();
        let form = form("", "", "cash");

        let (first, second) = tokio::join!(
            submit_checkout(&coordinator, &session, &form, BackendKind::Relational, &merchant),
            submit_checkout(&coordinator, &session, &form, BackendKind::Relational, &merchant)
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::CheckoutInProgress)));
        assert_eq!(relational.write_calls(), 1);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_different_sessions_check_out_concurrently() {
        let relational = FakeBackend::healthy(BackendKind::Relational);
        relational.set_write_delay(Duration::from_millis(100));
        let document = FakeBackend::healthy(BackendKind::Document);
        let coordinator = coordinator(&relational, &document);
        let counter_one = example_session();
        let counter_two = example_session();
        let merchant = MerchantInfo::default();
        let form = form("", "", "cash");

        let (first, second) = tokio::join!(
            submit_checkout(&coordinator, &counter_one, &form, BackendKind::Relational, &merchant),
            submit_checkout(&coordinator, &counter_two, &form, BackendKind::Relational, &merchant)
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.transaction.id, second.transaction.id);
        assert_eq!(relational.write_calls(), 2);
        assert!(counter_one.cart().is_empty());
        assert!(counter_two.cart().is_empty());
    }
}
