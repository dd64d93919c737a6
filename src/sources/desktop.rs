use crate::config::Paths;
use crate::error::Result;
use crate::model::ApplicationRecord;
use crate::sources::Source;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

const HEADER: &str = "[Desktop Entry]";
const DISABLE_FLAGS: [&str; 2] = ["NoDisplay=true", "Hidden=true"];

const SYSTEM_DIRS: [&str; 2] = ["/usr/share/applications", "/usr/local/share/applications"];
const FLATPAK_SYSTEM_DIR: &str = "/var/lib/flatpak/exports/share/applications";
const FLATPAK_USER_DIR: &str = ".local/share/flatpak/exports/share/applications";

pub struct DesktopSource {
    pub dirs: Vec<PathBuf>,
    pub locale: String,
}

impl DesktopSource {
    pub fn new(dirs: Vec<PathBuf>, locale: impl Into<String>) -> Self {
        Self { dirs, locale: locale.into() }
    }
}

impl Source for DesktopSource {
    type Item = ApplicationRecord;

    fn scan(&self) -> Result<Vec<ApplicationRecord>> {
        let files = list_entries(&self.dirs);
        let mut records = Vec::with_capacity(files.len());
        for path in &files {
            // Non-UTF-8 or vanished files are skipped like any other rejection
            let Ok(content) = fs::read_to_string(path) else {
                debug!("Skipping unreadable {:?}", path);
                continue;
            };
            if let Some(record) = parse_desktop_entry(&content, &self.locale) {
                records.push(record);
            }
        }
        info!("DesktopSource: parsed {} of {} files", records.len(), files.len());
        Ok(records)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Name,
    LocalName,
    Exec,
    Icon,
    Comment,
    LocalComment,
    MimeType,
}

/// Parses the `[Desktop Entry]` section of a descriptor.
///
/// Returns `None` when the header is missing or a disable flag (`NoDisplay=true`,
/// `Hidden=true`) appears in the section. Localized `Name[ll]=` and `Comment[ll]=`
/// values win over the plain keys; `Exec=` is cut at the first `" %"` field code.
pub fn parse_desktop_entry(content: &str, locale: &str) -> Option<ApplicationRecord> {
    let prefixes = [
        ("Name=".to_string(), Field::Name),
        (format!("Name[{locale}]="), Field::LocalName),
        ("Exec=".to_string(), Field::Exec),
        ("Icon=".to_string(), Field::Icon),
        ("Comment=".to_string(), Field::Comment),
        (format!("Comment[{locale}]="), Field::LocalComment),
        ("MimeType=".to_string(), Field::MimeType),
    ];

    let mut lines = content.lines();
    lines.by_ref().find(|line| *line == HEADER)?;

    let mut record = ApplicationRecord::default();
    let mut local_name = String::new();
    let mut local_comment = String::new();

    for line in lines {
        if line.starts_with('[') {
            break;
        }
        if DISABLE_FLAGS.iter().any(|flag| *flag == line) {
            return None;
        }
        let Some((value, field)) = prefixes.iter()
            .find_map(|(prefix, field)| line.strip_prefix(prefix.as_str()).map(|v| (v, *field)))
        else {
            continue;
        };
        let dest = match field {
            Field::Name => &mut record.name,
            Field::LocalName => &mut local_name,
            Field::Exec => {
                record.exec = strip_field_codes(value).to_string();
                continue;
            }
            Field::Icon => &mut record.icon,
            Field::Comment => &mut record.comment,
            Field::LocalComment => &mut local_comment,
            Field::MimeType => &mut record.mime_type,
        };
        *dest = value.to_string();
    }

    if !local_name.is_empty() {
        record.name = local_name;
    }
    if !local_comment.is_empty() {
        record.comment = local_comment;
    }
    Some(record)
}

fn strip_field_codes(exec: &str) -> &str {
    match exec.find(" %") {
        Some(idx) => &exec[..idx],
        None => exec,
    }
}

/// Directories searched for descriptors, in priority order.
///
/// `xdg_data_dirs` is the raw `$XDG_DATA_DIRS` value; each non-empty segment
/// is searched as given. The flatpak export directories are appended unless
/// already listed.
pub fn app_dirs(paths: &Paths, xdg_data_dirs: Option<&str>) -> Vec<PathBuf> {
    let mut dirs = vec![paths.data_dir.join("applications")];
    dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));

    if let Some(value) = xdg_data_dirs {
        dirs.extend(value.split(':')
            .filter(|segment| !segment.is_empty())
            .map(PathBuf::from));
    }

    for flatpak in [paths.home.join(FLATPAK_USER_DIR), PathBuf::from(FLATPAK_SYSTEM_DIR)] {
        if !dirs.contains(&flatpak) {
            dirs.push(flatpak);
        }
    }
    dirs
}

/// Regular files directly inside each existing directory, by file name
/// within a directory. Unreadable directories and entries are skipped.
pub fn list_entries(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !fs::metadata(dir).map(|m| m.is_dir()).unwrap_or(false) {
            continue;
        }
        debug!("Scanning desktop files in {:?}", dir);
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    files
}
