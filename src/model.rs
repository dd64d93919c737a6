use serde::{Deserialize, Serialize};

/// One parsed application descriptor. Optional fields are empty strings when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub name: String,      // Display name, localized when available
    pub exec: String,      // Launch command with field codes stripped
    pub icon: String,      // Icon theme name or absolute path
    pub comment: String,   // Description, localized when available
    pub mime_type: String, // Carried along, never searched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Pinned,
    Favorite,
    Common,
}

impl Tier {
    pub fn mark(self) -> char {
        match self {
            Tier::Pinned => '*',
            Tier::Favorite => '+',
            Tier::Common => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    pub record: ApplicationRecord,
    pub tier: Tier,
    pub clicks: u64,      // Usage count at build time
    pub discovery: usize, // Position in the scan
}

/// A button of the bar surface, as stored in `bar.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarEntry {
    pub name: String,
    pub exec: String,
    #[serde(default)]
    pub icon: String,
}

/// Anything the incremental filter can search and a surface can activate.
pub trait Candidate {
    /// Text tested for both prefix and containment.
    fn search_key(&self) -> &str;

    /// Extra text tested for containment only.
    fn search_detail(&self) -> &str {
        ""
    }

    /// Command handed to the spawner when the row is activated.
    fn command(&self) -> &str;
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn search_key(&self) -> &str {
        (**self).search_key()
    }

    fn search_detail(&self) -> &str {
        (**self).search_detail()
    }

    fn command(&self) -> &str {
        (**self).command()
    }
}

impl Candidate for String {
    fn search_key(&self) -> &str {
        self
    }

    fn command(&self) -> &str {
        self
    }
}

impl Candidate for IndexedEntry {
    fn search_key(&self) -> &str {
        &self.record.name
    }

    fn search_detail(&self) -> &str {
        &self.record.comment
    }

    fn command(&self) -> &str {
        &self.record.exec
    }
}

impl Candidate for BarEntry {
    fn search_key(&self) -> &str {
        &self.name
    }

    fn command(&self) -> &str {
        &self.exec
    }
}
