//! Shared test utilities.
//!
//! Provides in-memory database setup, the two-item example menu, an
//! in-memory [`DocumentStore`] and a scriptable [`BackendWriter`] fake that
//! counts its calls.
#![allow(clippy::unwrap_used)]

use crate::{
    backend::{BackendWriter, DocumentStore, document::stamp},
    core::menu,
    errors::{Error, Result},
    models::{BackendKind, CartLine, MenuItem, OrderRequest, Transaction},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Chips at 2000, id `"a"`
pub fn chips() -> MenuItem {
    MenuItem::new("a", "Chips", 2000.0, "snacks")
}

/// Soda at 1000, id `"b"`
pub fn soda() -> MenuItem {
    MenuItem::new("b", "Soda", 1000.0, "drinks")
}

/// Two chips and one soda: total 5000.
pub fn example_lines() -> Vec<CartLine> {
    vec![
        CartLine {
            item: chips(),
            quantity: 2,
        },
        CartLine {
            item: soda(),
            quantity: 1,
        },
    ]
}

/// In-memory database with chips and soda on the menu.
pub async fn setup_menu_db() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    menu::create_menu_item(&db, chips()).await?;
    menu::create_menu_item(&db, soda()).await?;
    Ok(db)
}

fn unreachable(what: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        format!("{what} unreachable"),
    ))
}

/// [`DocumentStore`] kept in a map, with switchable failures.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    failing: Mutex<HashSet<String>>,
    down: AtomicBool,
    inserts: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert into `collection` fail.
    pub fn fail_collection(&self, collection: &str) {
        self.failing.lock().unwrap().insert(collection.to_string());
    }

    /// Makes every call fail while `false`.
    pub fn set_reachable(&self, reachable: bool) {
        self.down.store(!reachable, Ordering::SeqCst);
    }

    /// Number of insert attempts so far.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// All documents of `collection`.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(unreachable("document store"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<String> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.failing.lock().unwrap().contains(collection) {
            return Err(Error::Io(std::io::Error::other(format!(
                "write to {collection} denied"
            ))));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let document = stamp(document, &id);
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.check_reachable()?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_reachable()?;
        if let Some(docs) = self.collections.lock().unwrap().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn peek(&self, collection: &str) -> Result<Option<String>> {
        self.check_reachable()?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.keys().next().cloned()))
    }
}

/// Scriptable [`BackendWriter`] that counts probes and writes.
///
/// Successful writes return ids like `"relational-1"`, `"document-2"`.
pub struct FakeBackend {
    kind: BackendKind,
    healthy: AtomicBool,
    fail_writes: AtomicBool,
    probe_delay: Mutex<Duration>,
    write_delay: Mutex<Duration>,
    probes: AtomicUsize,
    writes: AtomicUsize,
}

impl FakeBackend {
    fn build(kind: BackendKind, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            kind,
            healthy: AtomicBool::new(healthy),
            fail_writes: AtomicBool::new(false),
            probe_delay: Mutex::new(Duration::ZERO),
            write_delay: Mutex::new(Duration::ZERO),
            probes: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    /// Backend whose probe succeeds.
    pub fn healthy(kind: BackendKind) -> Arc<Self> {
        Self::build(kind, true)
    }

    /// Backend whose probe fails.
    pub fn unhealthy(kind: BackendKind) -> Arc<Self> {
        Self::build(kind, false)
    }

    /// Switches the probe outcome.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Makes writes fail after being counted.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delays every probe.
    pub fn set_probe_delay(&self, delay: Duration) {
        *self.probe_delay.lock().unwrap() = delay;
    }

    /// Delays every write.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    /// Number of probes so far.
    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of write attempts so far.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendWriter for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn check_connection(&self) -> Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.probe_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(unreachable(&self.kind.to_string()))
        }
    }

    async fn write(&self, request: &OrderRequest) -> Result<Transaction> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::OrderCreation {
                backend: self.kind.to_string(),
                message: "write rejected".to_string(),
            });
        }

        let prefix = match self.kind {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
        };
        Ok(request
            .clone()
            .into_transaction(format!("{prefix}-{n}"), Utc::now()))
    }
}
