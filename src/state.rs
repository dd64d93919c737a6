use crate::config::Context;
use crate::error::Result;
use crate::executor::{self, Spawn};
use crate::filter::filter;
use crate::index::ApplicationIndex;
use crate::model::{Candidate, IndexedEntry, Tier};
use crate::store::case::{CaseMode, CaseSetting};
use crate::store::pins::PinStore;
use crate::store::usage::UsageCache;
use log::{info, warn};
use std::path::PathBuf;

/// Asynchronous input from outside the surface, e.g. a signal from `refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Refresh,
    Quit,
}

/// Session state of the application grid.
pub struct GridState {
    pub ctx: Context,
    pub dirs: Vec<PathBuf>,
    pub index: ApplicationIndex,
    pub cache: UsageCache,
    pub pins: PinStore,
    pub query: String,
    pub visible: Vec<usize>,
    pub selected_index: usize,
}

impl GridState {
    /// Loads the cache and pin list and scans `dirs`.
    pub fn load(ctx: Context, dirs: Vec<PathBuf>) -> Result<Self> {
        let mut state = Self {
            ctx,
            dirs,
            index: ApplicationIndex::default(),
            cache: UsageCache::default(),
            pins: PinStore::detached(),
            query: String::new(),
            visible: Vec::new(),
            selected_index: 0,
        };
        state.rebuild()?;
        Ok(state)
    }

    /// Drops the index and builds it again from disk.
    pub fn rebuild(&mut self) -> Result<()> {
        self.cache = UsageCache::load(&self.ctx.paths.usage_cache());
        self.pins = if self.ctx.config.grid.pins {
            PinStore::load(&self.ctx.paths.pin_list())
        } else {
            PinStore::detached()
        };
        self.index = ApplicationIndex::scan(&self.ctx, &self.dirs, &self.cache, &self.pins)?;
        self.query.clear();
        self.update_filter();
        info!("GridState: index rebuilt with {} entries", self.index.len());
        Ok(())
    }

    /// Returns false once the session should end.
    pub fn handle(&mut self, event: ControlEvent) -> bool {
        match event {
            ControlEvent::Refresh => {
                if let Err(e) = self.rebuild() {
                    warn!("Refresh failed: {}", e);
                }
                true
            }
            ControlEvent::Quit => false,
        }
    }

    pub fn update_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.update_filter();
    }

    /// An empty phrase shows the whole index in display order, uncapped.
    /// A search runs over the entries in scan order, so matches within each
    /// pass keep discovery order, and is capped at one row of the grid.
    pub fn update_filter(&mut self) {
        self.visible = if self.query.is_empty() {
            (0..self.index.len()).collect()
        } else {
            let order = self.index.discovery_order();
            let scanned: Vec<&IndexedEntry> = order.iter().filter_map(|&i| self.index.get(i)).collect();
            filter(&scanned, &self.query, CaseMode::Insensitive, Some(self.ctx.config.grid.columns))
                .ordered()
                .map(|i| order[i])
                .collect()
        };
        log::debug!("GridState: query='{}', visible={}", self.query, self.visible.len());
        self.selected_index = 0;
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &IndexedEntry> {
        self.visible.iter().filter_map(|&i| self.index.get(i))
    }

    pub fn move_selection(&mut self, delta: i32) {
        self.selected_index = wrap(self.selected_index, delta, self.visible.len());
    }

    pub fn get_selected(&self) -> Option<&IndexedEntry> {
        self.row(self.selected_index)
    }

    pub fn row(&self, row: usize) -> Option<&IndexedEntry> {
        self.visible.get(row).and_then(|&i| self.index.get(i))
    }

    /// Launches the entry at `row`, recording the click. Returns the exec.
    pub fn activate(&mut self, row: usize, spawner: &dyn Spawn) -> Result<Option<String>> {
        let Some(exec) = self.row(row).map(|e| e.record.exec.clone()) else {
            return Ok(None);
        };
        executor::launch(&exec, &mut self.cache, &self.ctx.paths.usage_cache(), spawner)?;
        Ok(Some(exec))
    }

    /// Pins or unpins the entry at `row` and saves the pin list. A failed
    /// save is only logged; the new tier holds for the session.
    pub fn toggle_pin(&mut self, row: usize) -> Option<Tier> {
        if !self.ctx.config.grid.pins {
            return None;
        }
        let &position = self.visible.get(row)?;
        let (exec, tier) = self.index.toggle_pin(position, &mut self.pins)?;
        info!("GridState: {:?} is now {:?}", exec, tier);
        self.update_filter();
        if let Err(e) = self.pins.save() {
            warn!("Failed to save pin list: {}", e);
        }
        Some(tier)
    }
}

/// Session state of the list surfaces (run dialog, button bar).
pub struct MenuState<T: Candidate> {
    pub items: Vec<T>,
    pub rows: usize,
    pub query: String,
    pub case: CaseSetting,
    pub visible: Vec<usize>,
    pub selected_index: usize,
}

impl<T: Candidate> MenuState<T> {
    pub fn new(items: Vec<T>, rows: usize, case: CaseSetting) -> Self {
        let mut state = Self {
            items,
            rows,
            query: String::new(),
            case,
            visible: Vec::new(),
            selected_index: 0,
        };
        state.update_filter();
        state
    }

    pub fn update_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.update_filter();
    }

    pub fn update_filter(&mut self) {
        self.visible = filter(&self.items, &self.query, self.case.mode, Some(self.rows)).to_vec();
        log::debug!("MenuState: query='{}', visible={}", self.query, self.visible.len());
        self.selected_index = 0;
    }

    /// Flips case sensitivity, clearing the phrase back to the default view.
    pub fn toggle_case(&mut self) -> CaseMode {
        let mode = self.case.toggle();
        self.query.clear();
        self.update_filter();
        mode
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().filter_map(|&i| self.items.get(i))
    }

    pub fn move_selection(&mut self, delta: i32) {
        self.selected_index = wrap(self.selected_index, delta, self.visible.len());
    }

    pub fn get_selected(&self) -> Option<&T> {
        self.row(self.selected_index)
    }

    pub fn row(&self, row: usize) -> Option<&T> {
        self.visible.get(row).and_then(|&i| self.items.get(i))
    }
}

impl<T: Candidate> Drop for MenuState<T> {
    fn drop(&mut self) {
        if let Err(e) = self.case.persist_if_changed() {
            warn!("Failed to save case setting: {}", e);
        }
    }
}

fn wrap(current: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + delta as i64).rem_euclid(len as i64) as usize
}
