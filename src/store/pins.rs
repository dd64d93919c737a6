use crate::error::Result;
use crate::store::write_atomic;
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered list of pinned exec strings with constant-time membership.
#[derive(Debug, Clone)]
pub struct PinStore {
    path: PathBuf,
    order: Vec<String>,
    members: HashSet<String>,
}

impl PinStore {
    /// Reads one exec per non-empty line. A missing file is created empty.
    pub fn load(path: &Path) -> Self {
        let mut store = Self {
            path: path.to_path_buf(),
            order: Vec::new(),
            members: HashSet::new(),
        };
        match fs::read_to_string(path) {
            Ok(content) => {
                for line in content.lines().filter(|l| !l.is_empty()) {
                    store.insert(line);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Could not find {:?}, creating", path);
                if let Err(e) = store.save() {
                    warn!("Failed to create pin list: {}", e);
                }
            }
            Err(e) => warn!("Failed to read pin list {:?}: {}", path, e),
        }
        store
    }

    /// A store that is never read from or written to disk.
    pub fn detached() -> Self {
        Self {
            path: PathBuf::new(),
            order: Vec::new(),
            members: HashSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, exec: &str) -> bool {
        self.members.contains(exec)
    }

    /// Position in pin order, used to sort the pinned tier.
    pub fn position(&self, exec: &str) -> Option<usize> {
        if !self.contains(exec) {
            return None;
        }
        self.order.iter().position(|e| e == exec)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, exec: &str) -> bool {
        if !self.members.insert(exec.to_string()) {
            return false;
        }
        self.order.push(exec.to_string());
        true
    }

    /// Pins or unpins `exec`; returns whether it is pinned afterwards.
    pub fn toggle(&mut self, exec: &str) -> bool {
        if self.members.remove(exec) {
            self.order.retain(|e| e != exec);
            false
        } else {
            self.insert(exec)
        }
    }

    pub fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let mut content = self.order.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        write_atomic(&self.path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin-cache");
        let pins = PinStore::load(&path);
        assert!(pins.is_empty());
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn blank_lines_and_duplicates_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin-cache");
        fs::write(&path, "firefox\n\nfoot\nfirefox\n\n").unwrap();

        let pins = PinStore::load(&path);
        assert_eq!(pins.as_slice(), &["firefox".to_string(), "foot".to_string()]);
        assert!(pins.contains("foot"));
        assert!(!pins.contains("vim"));
        assert_eq!(pins.position("foot"), Some(1));
        assert_eq!(pins.position("vim"), None);
    }

    #[test]
    fn toggle_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin-cache");
        let mut pins = PinStore::load(&path);

        assert!(pins.toggle("firefox"));
        assert!(pins.toggle("foot"));
        assert!(!pins.toggle("firefox"));
        pins.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "foot\n");
        let reloaded = PinStore::load(&path);
        assert_eq!(reloaded.as_slice(), &["foot".to_string()]);
    }

    #[test]
    fn detached_store_does_not_touch_disk() {
        let mut pins = PinStore::detached();
        pins.toggle("firefox");
        assert!(pins.save().is_ok());
        assert!(pins.contains("firefox"));
    }
}
