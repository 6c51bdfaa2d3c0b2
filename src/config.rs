use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CwConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Where tracking files live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// `<repo>/<dir_name>`
    Local,
    /// `<global_dir>/<repo name>`
    Global,
}

/// [tracking] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_storage")]
    pub storage: Storage,
    #[serde(default = "default_dir_name")]
    pub dir_name: String,
    #[serde(default = "default_global_dir")]
    pub global_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Commit limit when HEAD is the base branch itself
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    #[serde(default = "default_true")]
    pub first_parent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    #[serde(default = "default_true")]
    pub syntax_highlight: bool,
    #[serde(default = "default_tab_width")]
    pub tab_width: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Polling fallback interval for when file events go missing
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_storage() -> Storage {
    Storage::Local
}

fn default_dir_name() -> String {
    ".codewalk".into()
}

fn default_global_dir() -> String {
    "~/.codewalk".into()
}

fn default_max_commits() -> usize {
    50
}

fn default_tab_width() -> u8 {
    4
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_poll_secs() -> u64 {
    10
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            dir_name: default_dir_name(),
            global_dir: default_global_dir(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_commits: default_max_commits(),
            first_parent: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
            syntax_highlight: true,
            tab_width: default_tab_width(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
            poll_secs: default_poll_secs(),
        }
    }
}

impl CwConfig {
    /// Directory holding `<sha>.json` tracking files for this repo
    pub fn tracking_dir(&self, repo_root: &str) -> PathBuf {
        match self.tracking.storage {
            Storage::Local => Path::new(repo_root).join(&self.tracking.dir_name),
            Storage::Global => {
                let repo_name = Path::new(repo_root)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                expand_tilde(&self.tracking.global_dir).join(repo_name)
            }
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

/// Load config by merging global defaults with per-repo overrides.
/// Priority: per-repo `.codewalk.toml` > global `~/.config/codewalk/config.toml` > built-in defaults.
/// Merging is deep: individual fields within sections (e.g. `[tracking]`) override independently.
pub fn load_config(repo_root: &str) -> CwConfig {
    let local_path = Path::new(repo_root).join(".codewalk.toml");
    let global_path = dirs::config_dir().map(|d| d.join("codewalk/config.toml"));

    let global_table = global_path.and_then(|p| read_table(&p));
    let local_table = read_table(&local_path);

    merge_config(global_table, local_table)
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

fn merge_config(global: Option<toml::Table>, local: Option<toml::Table>) -> CwConfig {
    let merged = match (global, local) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return CwConfig::default(),
    };

    match merged.try_into() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Invalid codewalk config, using defaults: {}", e);
            CwConfig::default()
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
