use crate::config::Context;
use crate::error::Result;
use crate::model::{ApplicationRecord, IndexedEntry, Tier};
use crate::sources::Source;
use crate::sources::desktop::DesktopSource;
use crate::store::pins::PinStore;
use crate::store::usage::UsageCache;
use log::{debug, info};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// All discovered applications, kept in display order: the pinned tier in
/// pin-list order, then favorites by descending clicks, then everything else
/// alphabetically. Ties fall back to discovery order.
#[derive(Debug, Clone, Default)]
pub struct ApplicationIndex {
    entries: Vec<IndexedEntry>,
    favorites: HashSet<String>,
    pin_rank: HashMap<String, usize>,
    by_discovery: Vec<usize>,
}

impl ApplicationIndex {
    pub fn build(
        records: Vec<ApplicationRecord>,
        cache: &UsageCache,
        pins: &PinStore,
        columns: usize,
    ) -> Self {
        let favorites: HashSet<String> = cache.favorites(columns)
            .into_iter()
            .map(|e| e.exec)
            .collect();

        let entries = records.into_iter()
            .filter(|r| !r.exec.is_empty())
            .enumerate()
            .map(|(discovery, record)| {
                let tier = if pins.contains(&record.exec) {
                    Tier::Pinned
                } else if favorites.contains(&record.exec) {
                    Tier::Favorite
                } else {
                    Tier::Common
                };
                let clicks = cache.count(&record.exec);
                IndexedEntry { record, tier, clicks, discovery }
            })
            .collect();

        let mut index = Self {
            entries,
            favorites,
            pin_rank: rank(pins),
            by_discovery: Vec::new(),
        };
        index.arrange();
        info!(
            "Index: {} pinned, {} favorites, {} common",
            index.tier(Tier::Pinned).count(),
            index.tier(Tier::Favorite).count(),
            index.tier(Tier::Common).count(),
        );
        index
    }

    /// Scans `dirs` for descriptors and builds the index in one go.
    pub fn scan(ctx: &Context, dirs: &[PathBuf], cache: &UsageCache, pins: &PinStore) -> Result<Self> {
        let records = DesktopSource::new(dirs.to_vec(), &ctx.locale).scan()?;
        let records = records.into_iter()
            .filter(|r| {
                let blocked = ctx.is_blacklisted(&r.name, &r.exec);
                if blocked {
                    debug!("Blacklisted {:?}", r.exec);
                }
                !blocked
            })
            .collect();
        Ok(Self::build(records, cache, pins, ctx.config.grid.columns))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&IndexedEntry> {
        self.entries.get(position)
    }

    /// Positions of all entries in scan order rather than display order.
    pub fn discovery_order(&self) -> &[usize] {
        &self.by_discovery
    }

    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &IndexedEntry> {
        self.entries.iter().filter(move |e| e.tier == tier)
    }

    /// Flips the pin of every entry sharing the exec at `position` and returns
    /// the exec with its new tier. Saving `pins` is left to the caller.
    pub fn toggle_pin(&mut self, position: usize, pins: &mut PinStore) -> Option<(String, Tier)> {
        let exec = self.entries.get(position)?.record.exec.clone();
        let pinned = pins.toggle(&exec);
        let tier = if pinned {
            Tier::Pinned
        } else if self.favorites.contains(&exec) {
            Tier::Favorite
        } else {
            Tier::Common
        };
        for entry in self.entries.iter_mut().filter(|e| e.record.exec == exec) {
            entry.tier = tier;
        }
        self.pin_rank = rank(pins);
        self.arrange();
        Some((exec, tier))
    }

    fn arrange(&mut self) {
        let pin_rank = &self.pin_rank;
        self.entries.sort_by_cached_key(|e| {
            let (tier, rank, clicks, name) = match e.tier {
                Tier::Pinned => (0, pin_rank.get(&e.record.exec).copied().unwrap_or(usize::MAX), 0, String::new()),
                Tier::Favorite => (1, 0, e.clicks, String::new()),
                Tier::Common => (2, 0, 0, e.record.name.to_lowercase()),
            };
            (tier, rank, Reverse(clicks), name, e.discovery)
        });
        let entries = &self.entries;
        self.by_discovery = (0..entries.len()).collect();
        self.by_discovery.sort_by_key(|&i| entries[i].discovery);
    }
}

fn rank(pins: &PinStore) -> HashMap<String, usize> {
    pins.as_slice().iter()
        .enumerate()
        .map(|(i, exec)| (exec.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, exec: &str) -> ApplicationRecord {
        ApplicationRecord {
            name: name.to_string(),
            exec: exec.to_string(),
            ..Default::default()
        }
    }

    fn pins_of(dir: &tempfile::TempDir, execs: &[&str]) -> PinStore {
        let path = dir.path().join("pins");
        std::fs::write(&path, execs.join("\n")).unwrap();
        PinStore::load(&path)
    }

    fn names(index: &ApplicationIndex) -> Vec<&str> {
        index.entries().iter().map(|e| e.record.name.as_str()).collect()
    }

    fn sample() -> Vec<ApplicationRecord> {
        vec![
            record("Vim", "vim"),
            record("Firefox", "firefox"),
            record("foot", "foot"),
            record("GIMP", "gimp"),
            record("ls", "ls"),
            record("Alacritty", "alacritty"),
        ]
    }

    #[test]
    fn tiers_and_display_order() {
        let dir = tempfile::tempdir().unwrap();
        let pins = pins_of(&dir, &["gimp", "alacritty"]);
        let cache = UsageCache::from_json(r#"{"firefox": 5, "vim": 10, "ls": 1, "gimp": 50}"#).unwrap();

        let index = ApplicationIndex::build(sample(), &cache, &pins, 2);

        assert_eq!(names(&index), vec!["GIMP", "Alacritty", "Vim", "Firefox", "foot", "ls"]);
        assert_eq!(index.tier(Tier::Pinned).count(), 2);
        // gimp is in the top two but pinned wins; only vim qualifies as favorite
        let favs: Vec<&str> = index.tier(Tier::Favorite).map(|e| e.record.exec.as_str()).collect();
        assert_eq!(favs, vec!["vim"]);
        assert_eq!(index.tier(Tier::Common).count(), 3);
    }

    #[test]
    fn records_without_exec_are_dropped() {
        let records = vec![record("Broken", ""), record("Foot", "foot")];
        let index = ApplicationIndex::build(records, &UsageCache::default(), &PinStore::detached(), 6);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0).unwrap().record.exec, "foot");
    }

    #[test]
    fn duplicate_execs_are_kept() {
        let records = vec![record("Foot", "foot"), record("Foot Server", "foot")];
        let cache = UsageCache::from_json(r#"{"foot": 3}"#).unwrap();
        let index = ApplicationIndex::build(records, &cache, &PinStore::detached(), 1);
        assert_eq!(index.tier(Tier::Favorite).count(), 2);
    }

    #[test]
    fn favorite_ties_keep_discovery_order() {
        let records = vec![record("B", "b"), record("A", "a")];
        let cache = UsageCache::from_json(r#"{"a": 2, "b": 2}"#).unwrap();
        let index = ApplicationIndex::build(records, &cache, &PinStore::detached(), 2);
        assert_eq!(names(&index), vec!["B", "A"]);
    }

    #[test]
    fn toggle_pin_moves_entry_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut pins = pins_of(&dir, &[]);
        let cache = UsageCache::from_json(r#"{"vim": 10}"#).unwrap();
        let mut index = ApplicationIndex::build(sample(), &cache, &pins, 1);
        assert_eq!(index.get(0).unwrap().record.exec, "vim");

        let foot = index.entries().iter().position(|e| e.record.exec == "foot").unwrap();
        assert_eq!(index.toggle_pin(foot, &mut pins), Some(("foot".to_string(), Tier::Pinned)));
        assert_eq!(index.get(0).unwrap().record.exec, "foot");
        pins.save().unwrap();
        assert_eq!(std::fs::read_to_string(pins.path()).unwrap(), "foot\n");

        // unpinning a favorite returns it to the favorite tier
        let vim = index.entries().iter().position(|e| e.record.exec == "vim").unwrap();
        assert_eq!(index.toggle_pin(vim, &mut pins).unwrap().1, Tier::Pinned);
        let vim = index.entries().iter().position(|e| e.record.exec == "vim").unwrap();
        assert_eq!(index.toggle_pin(vim, &mut pins).unwrap().1, Tier::Favorite);

        assert_eq!(index.toggle_pin(99, &mut pins), None);
    }

    #[test]
    fn discovery_order_survives_tiering() {
        let cache = UsageCache::from_json(r#"{"ls": 4}"#).unwrap();
        let index = ApplicationIndex::build(sample(), &cache, &PinStore::detached(), 1);
        assert_eq!(index.get(0).unwrap().record.exec, "ls");
        let scanned: Vec<&str> = index.discovery_order().iter()
            .map(|&i| index.get(i).unwrap().record.exec.as_str())
            .collect();
        assert_eq!(scanned, vec!["vim", "firefox", "foot", "gimp", "ls", "alacritty"]);
    }

    #[test]
    fn pinned_tier_follows_pin_list_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut pins = pins_of(&dir, &["ls", "firefox"]);
        let mut index = ApplicationIndex::build(sample(), &UsageCache::default(), &pins, 0);
        let pinned: Vec<&str> = index.tier(Tier::Pinned).map(|e| e.record.exec.as_str()).collect();
        assert_eq!(pinned, vec!["ls", "firefox"]);

        let vim = index.entries().iter().position(|e| e.record.exec == "vim").unwrap();
        index.toggle_pin(vim, &mut pins);
        let pinned: Vec<&str> = index.tier(Tier::Pinned).map(|e| e.record.exec.as_str()).collect();
        assert_eq!(pinned, vec!["ls", "firefox", "vim"]);
    }
}
