use crate::error::{Error, Result};
use crate::model::BarEntry;
use crate::sources::Source;
use log::info;
use std::fs;
use std::path::PathBuf;

/// Buttons listed in the bar JSON file, kept in file order.
pub struct BarSource {
    pub path: PathBuf,
}

impl Source for BarSource {
    type Item = BarEntry;

    fn scan(&self) -> Result<Vec<BarEntry>> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let entries: Vec<BarEntry> = serde_json::from_str(&content)?;
        info!("BarSource: loaded {} entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }
}
