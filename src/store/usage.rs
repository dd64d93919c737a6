use crate::error::Result;
use crate::store::write_atomic;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub exec: String,
    pub clicks: u64,
}

/// Launch counts keyed by exec string.
///
/// Backed by a raw JSON object so keys whose values are not counts survive a
/// load/save cycle untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageCache {
    entries: Map<String, Value>,
}

impl UsageCache {
    /// Best-effort load: a missing, empty or malformed file is an empty cache.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No usage cache at {:?}: {}", path, e);
                return Self::default();
            }
        };
        Self::from_json(&content).unwrap_or_else(|| {
            warn!("Ignoring malformed usage cache {:?}", path);
            Self::default()
        })
    }

    pub fn from_json(content: &str) -> Option<Self> {
        match serde_json::from_str(content).ok()? {
            Value::Object(entries) => Some(Self { entries }),
            _ => None,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.entries)?;
        content.push('\n');
        write_atomic(path, content.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, exec: &str) -> u64 {
        self.entries.get(exec).and_then(Value::as_u64).unwrap_or(0)
    }

    /// Bumps the count for `exec`, creating it at 1. Returns the new count.
    pub fn increment(&mut self, exec: &str) -> u64 {
        let count = self.count(exec).saturating_add(1);
        self.entries.insert(exec.to_string(), Value::from(count));
        count
    }

    /// Valid counts in key iteration order.
    pub fn iter(&self) -> impl Iterator<Item = CacheEntry> + '_ {
        self.entries.iter().filter_map(|(exec, value)| {
            value.as_u64().map(|clicks| CacheEntry { exec: exec.clone(), clicks })
        })
    }

    /// The `n` most launched commands, highest first. Ties keep key order;
    /// fewer than `n` entries are returned as they are.
    pub fn favorites(&self, n: usize) -> Vec<CacheEntry> {
        let mut sorted: Vec<CacheEntry> = self.iter().collect();
        sorted.sort_by(|a, b| b.clicks.cmp(&a.clicks));
        sorted.truncate(n);
        sorted
    }
}
