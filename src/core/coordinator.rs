//! Transaction coordinator - picks a backend, writes the order, mirrors it.
//!
//! One checkout goes through these steps:
//! 1. reject an empty order (or a total that does not match its lines)
//!    without touching any backend
//! 2. probe both backends
//! 3. use the preferred backend, or the other one when only it is healthy
//! 4. write the order to the selected backend
//! 5. on success, copy the write to the other backend when it is healthy and
//!    mirroring is enabled; a failed copy is only logged
//!
//! The two backends are at best eventually consistent copies: a mirrored
//! order gets its own id on the other backend. Checkouts from different
//! sessions run independently; double-submit protection lives with the
//! session in [`checkout`](super::checkout).

use crate::{
    backend::{BackendWriter, ConnectionProber, ProbeReport, elapsed_ms},
    config::BackendSettings,
    errors::{Error, Result},
    models::{
        AMOUNT_TOLERANCE, BackendKind, CartLine, MAX_LINE_QUANTITY, OrderRequest, Transaction,
        TransactionResult,
    },
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// How a successful write is copied to the non-primary backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorMode {
    /// Never mirror
    Disabled,
    /// Mirror before returning the result
    #[default]
    Awaited,
    /// Mirror on a spawned task
    Background,
}

/// Records checkouts on whichever backend is available.
pub struct TransactionCoordinator {
    relational: Arc<dyn BackendWriter>,
    document: Arc<dyn BackendWriter>,
    prober: ConnectionProber,
    mirror: MirrorMode,
}

impl TransactionCoordinator {
    /// Builds a coordinator over the two injected backends.
    #[must_use]
    pub fn new(
        relational: Arc<dyn BackendWriter>,
        document: Arc<dyn BackendWriter>,
        settings: &BackendSettings,
    ) -> Self {
        let prober = ConnectionProber::new(
            Arc::clone(&relational),
            Arc::clone(&document),
            settings.probe_timeout(),
            settings.preferred,
        );
        Self {
            relational,
            document,
            prober,
            mirror: settings.mirror,
        }
    }

    /// The prober shared with the status banner.
    #[must_use]
    pub const fn prober(&self) -> &ConnectionProber {
        &self.prober
    }

    /// Configured mirror mode
    #[must_use]
    pub const fn mirror_mode(&self) -> MirrorMode {
        self.mirror
    }

    const fn writer(&self, kind: BackendKind) -> &Arc<dyn BackendWriter> {
        match kind {
            BackendKind::Relational => &self.relational,
            BackendKind::Document => &self.document,
        }
    }

    /// Records a checkout of `lines` and flattens the outcome.
    pub async fn process(
        &self,
        lines: &[CartLine],
        customer_name: &str,
        total: f64,
        preferred: BackendKind,
    ) -> TransactionResult {
        self.process_order(OrderRequest::new(lines.to_vec(), customer_name, total), preferred)
            .await
    }

    /// Same as [`process`](Self::process) for a full request.
    pub async fn process_order(
        &self,
        request: OrderRequest,
        preferred: BackendKind,
    ) -> TransactionResult {
        match self.try_process(request, preferred).await {
            Ok((backend, transaction)) => TransactionResult::succeeded(backend, transaction),
            Err((backend, e)) => TransactionResult::failed(backend, &e),
        }
    }

    /// Typed form of [`process_order`](Self::process_order).
    ///
    /// # Errors
    /// The error carries the backend the write was attempted on, if any.
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn try_process(
        &self,
        request: OrderRequest,
        preferred: BackendKind,
    ) -> std::result::Result<(BackendKind, Transaction), (Option<BackendKind>, Error)> {
        check_request(&request).map_err(|e| {
            warn!(error = %e, "Rejected checkout before probing");
            (None, e)
        })?;

        let report = self.prober.probe_all().await;
        let Some(selected) = report.select(preferred) else {
            let e = Error::NoBackendAvailable {
                relational: report.relational.error_message(),
                document: report.document.error_message(),
            };
            error!(error = %e, "Checkout failed, no backend available");
            return Err((None, e));
        };

        if selected != preferred {
            warn!(%preferred, %selected, "Preferred backend unavailable, using fallback");
        }

        let started = Instant::now();
        let transaction = self.writer(selected).write(&request).await.map_err(|e| {
            error!(
                backend = %selected,
                elapsed_ms = elapsed_ms(started),
                error = %e,
                "Checkout write failed"
            );
            (Some(selected), e)
        })?;

        info!(
            backend = %selected,
            transaction_id = %transaction.id,
            elapsed_ms = elapsed_ms(started),
            "Checkout recorded"
        );

        self.mirror(selected, &report, request).await;
        Ok((selected, transaction))
    }

    async fn mirror(&self, primary: BackendKind, report: &ProbeReport, request: OrderRequest) {
        let secondary = primary.other();
        if self.mirror == MirrorMode::Disabled || !report.is_available(secondary) {
            return;
        }

        let writer = Arc::clone(self.writer(secondary));
        match self.mirror {
            MirrorMode::Awaited => mirror_write(writer, request).await,
            MirrorMode::Background => {
                tokio::spawn(mirror_write(writer, request));
            }
            MirrorMode::Disabled => {}
        }
    }
}

/// Rejects requests that must never reach a backend.
fn check_request(request: &OrderRequest) -> Result<()> {
    if request.lines.is_empty() {
        return Err(Error::EmptyOrder);
    }

    if let Some(line) = request
        .lines
        .iter()
        .find(|l| l.quantity == 0 || l.quantity > MAX_LINE_QUANTITY)
    {
        return Err(Error::InvalidQuantity {
            item_id: line.item.id.clone(),
            quantity: i64::from(line.quantity),
        });
    }

    let computed = request.computed_total();
    if !request.total.is_finite() || (computed - request.total).abs() > AMOUNT_TOLERANCE {
        return Err(Error::TotalMismatch {
            supplied: request.total,
            computed,
        });
    }
    Ok(())
}

async fn mirror_write(writer: Arc<dyn BackendWriter>, request: OrderRequest) {
    let started = Instant::now();
    match writer.write(&request).await {
        Ok(transaction) => info!(
            backend = %writer.kind(),
            mirror_id = %transaction.id,
            elapsed_ms = elapsed_ms(started),
            "Mirrored checkout"
        ),
        Err(e) => warn!(
            backend = %writer.kind(),
            elapsed_ms = elapsed_ms(started),
            error = %e,
            "Mirror write failed"
        ),
    }
}
