//! Connection prober - bounded-time reachability checks for both backends.
//!
//! A probe never fails the caller: errors and timeouts come back as a
//! [`ConnectionStatus`] with `connected: false` and a message. The prober
//! keeps the latest [`ProbeReport`] so the presentation layer can show a
//! status banner without probing again.

use super::{BackendWriter, elapsed_ms};
use crate::errors::Error;
use crate::models::BackendKind;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Reachability of one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Last probe succeeded
    pub connected: bool,
    /// A probe is in flight
    pub checking: bool,
    /// Message from the last failed probe
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    /// Status after a successful probe
    #[must_use]
    pub const fn connected() -> Self {
        Self {
            connected: true,
            checking: false,
            last_error: None,
        }
    }

    /// Status after a failed probe
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            checking: false,
            last_error: Some(message.into()),
        }
    }

    /// Error text for aggregated messages
    #[must_use]
    pub fn error_message(&self) -> String {
        self.last_error
            .clone()
            .unwrap_or_else(|| "not checked".to_string())
    }
}

/// Result of probing both backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Relational backend status
    pub relational: ConnectionStatus,
    /// Document backend status
    pub document: ConnectionStatus,
    /// Healthy backend to use, honouring the configured preference
    pub primary_available: Option<BackendKind>,
}

impl ProbeReport {
    /// Builds a report, picking `preferred` first when both are healthy.
    #[must_use]
    pub fn new(
        relational: ConnectionStatus,
        document: ConnectionStatus,
        preferred: BackendKind,
    ) -> Self {
        let mut report = Self {
            relational,
            document,
            primary_available: None,
        };
        report.primary_available = report.select(preferred);
        report
    }

    /// Status of `kind`
    #[must_use]
    pub const fn status(&self, kind: BackendKind) -> &ConnectionStatus {
        match kind {
            BackendKind::Relational => &self.relational,
            BackendKind::Document => &self.document,
        }
    }

    /// Whether `kind` passed its probe
    #[must_use]
    pub const fn is_available(&self, kind: BackendKind) -> bool {
        self.status(kind).connected
    }

    /// `preferred` if healthy, otherwise the other backend if healthy.
    #[must_use]
    pub const fn select(&self, preferred: BackendKind) -> Option<BackendKind> {
        if self.is_available(preferred) {
            Some(preferred)
        } else if self.is_available(preferred.other()) {
            Some(preferred.other())
        } else {
            None
        }
    }

    const fn status_mut(&mut self, kind: BackendKind) -> &mut ConnectionStatus {
        match kind {
            BackendKind::Relational => &mut self.relational,
            BackendKind::Document => &mut self.document,
        }
    }
}

/// Probes one backend, giving up after `timeout`.
#[instrument(skip(backend), fields(backend = %backend.kind()))]
pub async fn probe(backend: &dyn BackendWriter, timeout: Duration) -> ConnectionStatus {
    let started = Instant::now();

    match tokio::time::timeout(timeout, backend.check_connection()).await {
        Ok(Ok(())) => {
            debug!(elapsed_ms = elapsed_ms(started), "Connection probe succeeded");
            ConnectionStatus::connected()
        }
        Ok(Err(e)) => {
            warn!(
                operation = "probe",
                elapsed_ms = elapsed_ms(started),
                error = %e,
                "Connection probe failed"
            );
            ConnectionStatus::failed(e.to_string())
        }
        Err(_) => {
            let e = Error::ProbeTimeout {
                millis: timeout.as_millis(),
            };
            warn!(operation = "probe", error = %e, "Connection probe timed out");
            ConnectionStatus::failed(e.to_string())
        }
    }
}

/// Probes both backends and remembers the latest result.
pub struct ConnectionProber {
    relational: Arc<dyn BackendWriter>,
    document: Arc<dyn BackendWriter>,
    timeout: Duration,
    preferred: BackendKind,
    latest: Mutex<ProbeReport>,
}

impl ConnectionProber {
    /// Creates a prober; nothing is probed until asked.
    #[must_use]
    pub fn new(
        relational: Arc<dyn BackendWriter>,
        document: Arc<dyn BackendWriter>,
        timeout: Duration,
        preferred: BackendKind,
    ) -> Self {
        Self {
            relational,
            document,
            timeout,
            preferred,
            latest: Mutex::new(ProbeReport::default()),
        }
    }

    /// Backend preferred when both are healthy
    #[must_use]
    pub const fn preferred(&self) -> BackendKind {
        self.preferred
    }

    /// Latest known statuses; `checking` is set while a probe runs.
    #[must_use]
    pub fn snapshot(&self) -> ProbeReport {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Probes a single backend and records the result.
    pub async fn probe_backend(&self, kind: BackendKind) -> ConnectionStatus {
        self.update(|report| report.status_mut(kind).checking = true);

        let backend = match kind {
            BackendKind::Relational => &self.relational,
            BackendKind::Document => &self.document,
        };
        let status = probe(backend.as_ref(), self.timeout).await;

        let preferred = self.preferred;
        self.update(|report| {
            *report.status_mut(kind) = status.clone();
            report.primary_available = report.select(preferred);
        });
        status
    }

    /// Probes both backends concurrently.
    #[instrument(skip(self))]
    pub async fn probe_all(&self) -> ProbeReport {
        self.update(|report| {
            report.relational.checking = true;
            report.document.checking = true;
        });

        let (relational, document) = tokio::join!(
            probe(self.relational.as_ref(), self.timeout),
            probe(self.document.as_ref(), self.timeout)
        );
        let report = ProbeReport::new(relational, document, self.preferred);

        info!(
            relational = report.relational.connected,
            document = report.document.connected,
            primary = ?report.primary_available,
            "Probed backends"
        );

        self.update(|latest| *latest = report.clone());
        report
    }

    fn update(&self, f: impl FnOnce(&mut ProbeReport)) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut latest);
    }
}
