use crate::error::{Error, Result};
use directories::BaseDirs;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "gridlaunch";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub dmenu: DmenuConfig,
    #[serde(default)]
    pub bar: BarConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    /// Two-letter code overriding the one derived from `$LANG`.
    #[serde(default)]
    pub locale: Option<String>,
    /// Regular expressions matched against name and exec at index build.
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GridConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_true")]
    pub pins: bool,
}

fn default_columns() -> usize { 6 }
fn default_true() -> bool { true }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            pins: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DmenuConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_true")]
    pub show_searchbox: bool,
}

fn default_rows() -> usize { 20 }

impl Default for DmenuConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            show_searchbox: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BarConfig {
    #[serde(default = "default_bar_file")]
    pub file: String,
}

fn default_bar_file() -> String { "bar.json".to_string() }

impl Default for BarConfig {
    fn default() -> Self {
        Self { file: default_bar_file() }
    }
}

impl Config {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Per-user locations, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub home: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub runtime_dir: PathBuf,
}

impl Paths {
    pub fn from_env() -> Result<Paths> {
        let base = BaseDirs::new().ok_or(Error::NoHome)?;
        let runtime_dir = match base.runtime_dir() {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("/var/run/user").join(nix::unistd::getuid().to_string()),
        };
        Ok(Paths {
            home: base.home_dir().to_path_buf(),
            config_dir: base.config_dir().join(APP_NAME),
            cache_dir: base.cache_dir().to_path_buf(),
            data_dir: base.data_dir().to_path_buf(),
            runtime_dir,
        })
    }

    /// Lays every directory out under `root`; used by tests and portable setups.
    pub fn rooted(root: &Path) -> Paths {
        Paths {
            home: root.join("home"),
            config_dir: root.join("config").join(APP_NAME),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
            runtime_dir: root.join("run"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn usage_cache(&self) -> PathBuf {
        self.cache_dir.join(format!("{APP_NAME}-fav-cache"))
    }

    pub fn pin_list(&self) -> PathBuf {
        self.cache_dir.join(format!("{APP_NAME}-pin-cache"))
    }

    pub fn case_setting(&self) -> PathBuf {
        self.config_dir.join("dmenu-settings")
    }

    pub fn pid_file(&self, surface: &str) -> PathBuf {
        self.runtime_dir.join(format!("{APP_NAME}-{surface}.pid"))
    }

    pub fn bar_file(&self, config: &BarConfig) -> PathBuf {
        let file = Path::new(&config.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.config_dir.join(file)
        }
    }
}

/// Everything the core reads at runtime, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub paths: Paths,
    pub locale: String,
    pub wm: String,
    pub blacklist: Vec<Regex>,
}

impl Context {
    pub fn new(config: Config, paths: Paths, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let locale = match &config.general.locale {
            Some(l) if !l.is_empty() => l.clone(),
            _ => locale_from_lang(lookup("LANG").as_deref()),
        };
        let wm = detect_wm(&lookup);
        let blacklist = config.general.blacklist.iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Ignoring blacklist pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();

        Self { config, paths, locale, wm, blacklist }
    }

    pub fn from_env(config: Config, paths: Paths) -> Self {
        Self::new(config, paths, |key| env::var(key).ok())
    }

    pub fn is_blacklisted(&self, name: &str, exec: &str) -> bool {
        self.blacklist.iter().any(|re| re.is_match(name) || re.is_match(exec))
    }
}

/// `de_DE.UTF-8` becomes `de`; an unset or empty `$LANG` falls back to `en`.
pub fn locale_from_lang(lang: Option<&str>) -> String {
    match lang {
        Some(lang) if !lang.is_empty() => lang.split('_').next().unwrap_or(lang).to_string(),
        _ => "en".to_string(),
    }
}

pub fn detect_wm(lookup: impl Fn(&str) -> Option<String>) -> String {
    for var in ["DESKTOP_SESSION", "SWAYSOCK", "I3SOCK"] {
        let Some(value) = lookup(var) else { continue };
        if value.contains("sway") {
            return "sway".to_string();
        }
        if value.contains("i3") {
            return "i3".to_string();
        }
        // May be a full socket path
        return match value.rsplit_once('/') {
            Some((_, last)) => last.to_string(),
            None => value,
        };
    }
    "other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn locale_is_cut_at_underscore() {
        assert_eq!(locale_from_lang(Some("de_DE.UTF-8")), "de");
        assert_eq!(locale_from_lang(Some("pl")), "pl");
        assert_eq!(locale_from_lang(Some("")), "en");
        assert_eq!(locale_from_lang(None), "en");
    }

    #[test]
    fn wm_detection_order() {
        assert_eq!(detect_wm(env_of(&[])), "other");
        assert_eq!(detect_wm(env_of(&[("SWAYSOCK", "/run/user/1000/sway-ipc.sock")])), "sway");
        assert_eq!(detect_wm(env_of(&[("I3SOCK", "/tmp/i3-ipc.sock")])), "i3");
        assert_eq!(detect_wm(env_of(&[("DESKTOP_SESSION", "/usr/share/xsessions/openbox")])), "openbox");
        assert_eq!(
            detect_wm(env_of(&[("DESKTOP_SESSION", "gnome"), ("SWAYSOCK", "sway")])),
            "gnome"
        );
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.grid.columns, 6);
        assert!(config.grid.pins);
        assert_eq!(config.dmenu.rows, 20);
        assert_eq!(config.bar.file, "bar.json");
    }

    #[test]
    fn partial_config_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[grid]\ncolumns = 4\n\n[general]\nlocale = \"fr\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.grid.columns, 4);
        assert!(config.grid.pins);
        assert_eq!(config.general.locale.as_deref(), Some("fr"));
        assert_eq!(config.dmenu.rows, 20);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[grid\ncolumns = ").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn context_prefers_configured_locale_and_compiles_blacklist() {
        let mut config = Config::default();
        config.general.locale = Some("pl".to_string());
        config.general.blacklist = vec!["^htop".to_string(), "(".to_string()];
        let ctx = Context::new(config, Paths::rooted(Path::new("/tmp/x")), env_of(&[("LANG", "de_DE.UTF-8")]));

        assert_eq!(ctx.locale, "pl");
        assert_eq!(ctx.blacklist.len(), 1);
        assert!(ctx.is_blacklisted("Htop", "htop"));
        assert!(!ctx.is_blacklisted("Firefox", "firefox"));
    }

    #[test]
    fn fixed_file_layout() {
        let paths = Paths::rooted(Path::new("/r"));
        assert_eq!(paths.usage_cache(), PathBuf::from("/r/cache/gridlaunch-fav-cache"));
        assert_eq!(paths.pin_list(), PathBuf::from("/r/cache/gridlaunch-pin-cache"));
        assert_eq!(paths.pid_file("grid"), PathBuf::from("/r/run/gridlaunch-grid.pid"));
        assert_eq!(paths.bar_file(&BarConfig::default()), PathBuf::from("/r/config/gridlaunch/bar.json"));
    }
}
