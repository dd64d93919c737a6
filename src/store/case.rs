use crate::error::Result;
use crate::store::write_atomic;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Insensitive,
    Sensitive,
}

impl CaseMode {
    pub fn token(self) -> &'static str {
        match self {
            CaseMode::Insensitive => "case_insensitive",
            CaseMode::Sensitive => "case_sensitive",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "case_insensitive" => Some(CaseMode::Insensitive),
            "case_sensitive" => Some(CaseMode::Sensitive),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            CaseMode::Insensitive => CaseMode::Sensitive,
            CaseMode::Sensitive => CaseMode::Insensitive,
        }
    }
}

/// The persisted case toggle. Written back only when it changed.
#[derive(Debug, Clone)]
pub struct CaseSetting {
    path: PathBuf,
    initial: CaseMode,
    pub mode: CaseMode,
}

impl CaseSetting {
    pub fn load(path: &Path) -> Self {
        let mode = match fs::read_to_string(path) {
            Ok(content) => CaseMode::from_token(&content).unwrap_or_default(),
            Err(e) => {
                debug!("No case setting at {:?}: {}", path, e);
                CaseMode::default()
            }
        };
        Self { path: path.to_path_buf(), initial: mode, mode }
    }

    /// A setting that starts at `mode` and is never written.
    pub fn transient(mode: CaseMode) -> Self {
        Self { path: PathBuf::new(), initial: mode, mode }
    }

    pub fn toggle(&mut self) -> CaseMode {
        self.mode = self.mode.flipped();
        self.mode
    }

    pub fn changed(&self) -> bool {
        self.mode != self.initial
    }

    /// Returns whether anything was written.
    pub fn persist_if_changed(&mut self) -> Result<bool> {
        if !self.changed() || self.path.as_os_str().is_empty() {
            return Ok(false);
        }
        write_atomic(&self.path, self.mode.token().as_bytes())?;
        self.initial = self.mode;
        Ok(true)
    }
}
