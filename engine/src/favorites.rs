//! Favorite currency stores.
//!
//! Stores hold currency codes only; the engine resolves metadata through
//! the catalog.

use async_trait::async_trait;
use converter_rates::write_atomic;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::error::EngineResult;

/// Persistent set of favorite currency codes.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Add a code. Adding a code twice is a no-op.
    async fn insert(&self, code: &str) -> EngineResult<()>;

    /// Remove a code. Removing an absent code is a no-op.
    async fn delete(&self, code: &str) -> EngineResult<()>;

    /// Current codes in insertion order.
    fn list_all(&self) -> Vec<String>;

    /// Live view of the codes, updated after every change.
    fn subscribe(&self) -> watch::Receiver<Vec<String>>;
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// In-process favorites store.
pub struct MemoryFavoritesStore {
    tx: watch::Sender<Vec<String>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::with_codes(Vec::new())
    }

    /// Create a store pre-populated with `codes` (duplicates dropped).
    pub fn with_codes(codes: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes.iter().map(|c| normalize(c)) {
            if !code.is_empty() && !unique.contains(&code) {
                unique.push(code);
            }
        }
        let (tx, _) = watch::channel(unique);
        Self { tx }
    }

    /// Add a code, returning whether the set changed.
    pub fn add(&self, code: &str) -> bool {
        let code = normalize(code);
        if code.is_empty() {
            return false;
        }
        self.tx.send_if_modified(|codes| {
            if codes.contains(&code) {
                false
            } else {
                codes.push(code);
                true
            }
        })
    }

    /// Remove a code, returning whether the set changed.
    pub fn remove(&self, code: &str) -> bool {
        let code = normalize(code);
        self.tx.send_if_modified(|codes| {
            let before = codes.len();
            codes.retain(|c| *c != code);
            codes.len() != before
        })
    }

    fn replace(&self, codes: Vec<String>) {
        self.tx.send_replace(codes);
    }
}

impl Default for MemoryFavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn insert(&self, code: &str) -> EngineResult<()> {
        if self.add(code) {
            debug!(code = %code, "Favorite added");
        }
        Ok(())
    }

    async fn delete(&self, code: &str) -> EngineResult<()> {
        if self.remove(code) {
            debug!(code = %code, "Favorite removed");
        }
        Ok(())
    }

    fn list_all(&self) -> Vec<String> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.tx.subscribe()
    }
}

/// Favorites persisted as a JSON array of codes.
///
/// The file is rewritten on every change; subscribers are only notified
/// after the write succeeded.
pub struct JsonFavoritesStore {
    path: PathBuf,
    codes: MemoryFavoritesStore,
    write_lock: Mutex<()>,
}

impl JsonFavoritesStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let codes: Vec<String> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), favorites = codes.len(), "Opened favorites store");

        Ok(Self {
            path,
            codes: MemoryFavoritesStore::with_codes(codes),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn update(&self, mutate: impl FnOnce(&mut Vec<String>) -> bool) -> EngineResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut codes = self.codes.list_all();
        if !mutate(&mut codes) {
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(&codes)?;
        write_atomic(&self.path, &bytes).await?;
        self.codes.replace(codes);
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for JsonFavoritesStore {
    async fn insert(&self, code: &str) -> EngineResult<()> {
        let code = normalize(code);
        self.update(|codes| {
            if code.is_empty() || codes.contains(&code) {
                return false;
            }
            codes.push(code.clone());
            true
        })
        .await
    }

    async fn delete(&self, code: &str) -> EngineResult<()> {
        let code = normalize(code);
        self.update(|codes| {
            let before = codes.len();
            codes.retain(|c| *c != code);
            codes.len() != before
        })
        .await
    }

    fn list_all(&self) -> Vec<String> {
        self.codes.list_all()
    }

    fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.codes.subscribe()
    }
}
