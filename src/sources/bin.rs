use crate::error::Result;
use crate::sources::Source;
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Executable names found on a colon-separated search path, for the run dialog.
pub struct BinSource {
    pub search_path: String,
}

impl BinSource {
    pub fn from_env() -> Self {
        Self { search_path: std::env::var("PATH").unwrap_or_default() }
    }
}

impl Source for BinSource {
    type Item = String;

    fn scan(&self) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        for path_str in self.search_path.split(':').filter(|s| !s.is_empty()) {
            let path = Path::new(path_str);
            if !path.is_dir() {
                continue;
            }
            debug!("Scanning binaries in {:?}", path);
            let Ok(read_dir) = fs::read_dir(path) else { continue };
            for entry in read_dir.flatten() {
                let path = entry.path();
                let Ok(metadata) = fs::metadata(&path) else { continue };
                if metadata.is_file() && metadata.permissions().mode() & 0o111 != 0 {
                    if let Some(file_name) = path.file_name().and_then(|s| s.to_str()) {
                        names.insert(file_name.to_string());
                    }
                }
            }
        }
        info!("BinSource: found {} commands", names.len());
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn lists_sorted_unique_executables() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        touch(&a.path().join("zed"), 0o755);
        touch(&a.path().join("notes.txt"), 0o644);
        touch(&b.path().join("zed"), 0o755);
        touch(&b.path().join("alacritty"), 0o700);
        fs::create_dir(b.path().join("subdir")).unwrap();

        let source = BinSource {
            search_path: format!("{}::{}:/nonexistent", a.path().display(), b.path().display()),
        };
        assert_eq!(source.scan().unwrap(), vec!["alacritty".to_string(), "zed".to_string()]);
    }
}
