//! Key-value persistence. Every log lives under one storage key as a JSON
//! value, which keeps backups a flat `{key: value}` object.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    fn get_all(&self) -> Result<Map<String, Value>>;
    fn clear(&self) -> Result<()>;
}

// --- SQLite ---

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let store = SqliteStore { conn };
        store.migrate()?;
        debug!(path = %path.display(), "opened store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }
}

fn parse_stored(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable stored value");
            None
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            Ok(parse_stored(key, &raw))
        } else {
            Ok(None)
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, raw, now],
        )?;
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM kv_store ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut all = Map::new();
        for row in rows {
            let (key, raw) = row?;
            if let Some(value) = parse_stored(&key, &raw) {
                all.insert(key, value);
            }
        }
        Ok(all)
    }

    fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM kv_store", [])?;
        Ok(())
    }
}

// --- In-memory ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        Ok(self
            .values
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.values.borrow_mut().clear();
        Ok(())
    }
}

// --- Typed access ---

/// Read an array-valued key. Missing or non-array values read as empty;
/// individual records that fail to decode are skipped.
pub fn read_list<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Result<Vec<T>> {
    let items = match store.get(key)? {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(key, "expected an array, reading as empty");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(v) => out.push(v),
            Err(e) => warn!(key, index = i, error = %e, "skipping malformed record"),
        }
    }
    Ok(out)
}

/// Read an object-valued key. Missing or non-object values read as empty.
pub fn read_map<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<BTreeMap<String, T>> {
    let entries = match store.get(key)? {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            warn!(key, "expected an object, reading as empty");
            return Ok(BTreeMap::new());
        }
    };

    let mut out = BTreeMap::new();
    for (k, v) in entries {
        match serde_json::from_value(v) {
            Ok(v) => {
                out.insert(k, v);
            }
            Err(e) => warn!(key, entry = %k, error = %e, "skipping malformed entry"),
        }
    }
    Ok(out)
}

/// Read a string-valued key. Anything other than a string reads as `None`.
pub fn read_string(store: &impl KeyValueStore, key: &str) -> Result<Option<String>> {
    Ok(match store.get(key)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// An array-valued key edited in place. Elements stay exactly as stored
/// unless taken out, so records that do not decode survive a write.
#[derive(Debug)]
pub struct RecordList {
    key: String,
    items: Vec<Value>,
}

impl RecordList {
    pub fn load(store: &impl KeyValueStore, key: &str) -> Result<Self> {
        let items = match store.get(key)? {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!(key, "expected an array, replacing it on write");
                Vec::new()
            }
        };
        Ok(Self {
            key: key.to_string(),
            items,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The elements that decode as `T`, in stored order.
    #[must_use]
    pub fn decoded<T: DeserializeOwned>(&self) -> Vec<T> {
        self.items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    /// Remove and return every element matching `pred`.
    pub fn take_where(&mut self, mut pred: impl FnMut(&Value) -> bool) -> Vec<Value> {
        let (taken, kept): (Vec<Value>, Vec<Value>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|v| pred(v));
        self.items = kept;
        taken
    }

    pub fn push<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)
            .with_context(|| format!("Failed to encode {} record", self.key))?;
        self.items.push(value);
        Ok(())
    }

    pub fn save(&self, store: &impl KeyValueStore) -> Result<()> {
        store.set(&self.key, &Value::Array(self.items.clone()))
    }
}

/// String value of `field` on a raw record.
#[must_use]
pub fn str_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

pub fn write<T: Serialize + ?Sized>(store: &impl KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).with_context(|| format!("Failed to encode {key}"))?;
    store.set(key, &value)
}
