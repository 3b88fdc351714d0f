//! Persistence layer.
//!
//! The book is kept in a flat key-value store: the balance under
//! `wallet.balance` as an exact decimal string and the bet history under
//! `bets` as a JSON list. The engine never sees the store; only
//! `load_book` / `save_book` do.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::types::{Bet, BetsimError, Book, Wallet};

pub const BALANCE_KEY: &str = "wallet.balance";
pub const BETS_KEY: &str = "bets";

/// String key-value store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Write several keys, in order. Stores that can commit them together
    /// should override this.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// A JSON object of string keys and values on disk, rewritten on every
/// change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!(path = %path.display(), "No saved state found, starting fresh");
            return Ok(Self { path, entries: BTreeMap::new() });
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store from {}", path.display()))?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse store from {}", path.display()))?;

        info!(path = %path.display(), keys = entries.len(), "Store loaded from disk");
        Ok(Self { path, entries })
    }

    /// Write to a sibling temp file, then rename over the store, so a
    /// crash leaves either the old or the new contents on disk.
    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialise store")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write store to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace store at {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Store flushed");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value);
        }
        self.flush()
    }
}

// ---------------------------------------------------------------------------
// Book persistence
// ---------------------------------------------------------------------------

/// Load the book, falling back to `initial_balance` and no bets for
/// missing keys. Corrupt values are errors rather than silent resets.
pub fn load_book(store: &dyn KeyValueStore, initial_balance: Decimal) -> Result<Book> {
    let balance = match store.get(BALANCE_KEY)? {
        Some(raw) => Decimal::from_str(raw.trim()).map_err(|e| {
            BetsimError::Storage(format!("Invalid {BALANCE_KEY} value {raw:?}: {e}"))
        })?,
        None => initial_balance,
    };

    let bets: Vec<Bet> = match store.get(BETS_KEY)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| BetsimError::Storage(format!("Invalid {BETS_KEY} value: {e}")))?,
        None => Vec::new(),
    };

    debug!(balance = %balance, bets = bets.len(), "Book loaded");
    Ok(Book {
        wallet: Wallet::new(balance),
        bets,
    })
}

/// Persist the whole book in one write. Stores without batching get the
/// bets before the balance, so a torn write can only under-credit.
pub fn save_book(store: &mut dyn KeyValueStore, book: &Book) -> Result<()> {
    let bets = serde_json::to_string(&book.bets).context("Failed to serialise bets")?;
    store.set_many(vec![
        (BETS_KEY, bets),
        (BALANCE_KEY, book.wallet.balance.to_string()),
    ])?;
    debug!(balance = %book.wallet, bets = book.bets.len(), "Book saved");
    Ok(())
}

/// Forget the saved book; the next load starts from the initial balance.
pub fn reset_book(store: &mut dyn KeyValueStore) -> Result<()> {
    store.remove(BALANCE_KEY)?;
    store.remove(BETS_KEY)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
