/// Configuration system for agrisensa.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::AgrisensaConfig::default()`]
/// 2. **User global config**: `~/.agrisensa/config.toml`
/// 3. **Project local config**: `.agrisensa.toml` in the current working directory
/// 4. **Environment variables**: `AGRISENSA_*` overrides (highest precedence)
///
/// Later layers override earlier ones key by key: a file that only sets
/// `backend.base_url` leaves every other value from the previous layer
/// intact.
///
/// # Usage
///
/// ```rust,ignore
/// use agrisensa::config;
///
/// let cfg = config::load();
/// let client = BackendClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

pub use schema::AgrisensaConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Unreadable or malformed files are skipped with a warning so that a
/// broken config never prevents the dashboard from starting.
pub fn load() -> AgrisensaConfig {
    let loaded = load_with_warnings();
    loaded.log_warnings();
    loaded.config
}

/// A resolved configuration plus the problems skipped while loading it.
#[derive(Debug)]
pub struct Loaded {
    pub config: AgrisensaConfig,
    pub warnings: Vec<String>,
}

impl Loaded {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
    }
}

/// Like [`load`], but hands the warnings back instead of logging them.
///
/// `main` loads the config before the subscriber exists (the log level is
/// part of the config), so it reports these after `logging::init`.
pub fn load_with_warnings() -> Loaded {
    let paths = [global_config_path(), project_config_path()];
    let mut loaded = load_layers(paths.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut loaded.config);
    loaded
}

/// Merge the given TOML files over the defaults, in order.
fn load_layers<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Loaded {
    let mut warnings = Vec::new();
    let mut merged = match toml::Value::try_from(AgrisensaConfig::default()) {
        Ok(value) => value,
        Err(e) => {
            warnings.push(format!("cannot encode default configuration: {e}"));
            return Loaded {
                config: AgrisensaConfig::default(),
                warnings,
            };
        }
    };

    for path in paths {
        match load_toml_file(path) {
            Ok(Some(layer)) => merge_values(&mut merged, layer),
            Ok(None) => {}
            Err(warning) => warnings.push(warning),
        }
    }

    let config = merged.try_into().unwrap_or_else(|e| {
        warnings.push(format!("merged configuration is invalid, using defaults: {e}"));
        AgrisensaConfig::default()
    });
    Loaded { config, warnings }
}

/// Read a TOML file as a raw value tree. Missing files are `Ok(None)`.
fn load_toml_file(path: &Path) -> Result<Option<toml::Value>, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| format!("ignoring malformed config {}: {e}", path.display()))
}

/// Deep-merge `overlay` into `base`: tables merge recursively, every other
/// value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.agrisensa/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agrisensa").join("config.toml"))
}

/// Path to the project local config: `.agrisensa.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".agrisensa.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `AGRISENSA_BACKEND_URL`: backend base URL
/// - `AGRISENSA_BACKEND_TIMEOUT_MS`: backend request timeout
/// - `AGRISENSA_WEB_ADDR`: dashboard listen address
/// - `AGRISENSA_OPEN_BROWSER`: open the dashboard on start (`1`/`true`/...)
/// - `AGRISENSA_LOG`: log filter
fn apply_env_overrides(config: &mut AgrisensaConfig) {
    if let Ok(val) = std::env::var("AGRISENSA_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("AGRISENSA_BACKEND_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("AGRISENSA_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("AGRISENSA_OPEN_BROWSER") {
        config.web.open_browser = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("AGRISENSA_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.agrisensa/config.toml`.
///
/// Creates the `~/.agrisensa/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.agrisensa/ directory")?;
    }

    fs::write(&path, AgrisensaConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `backend.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    // Start from the defaults so keys missing from a partial file can be set.
    let mut root = toml::Value::try_from(AgrisensaConfig::default())
        .context("failed to serialize default config")?;
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        let existing: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_values(&mut root, existing);
    }

    set_toml_value(&mut root, key, value)?;

    // Reject updates that no longer deserialize (e.g. a string where a
    // table is expected) before touching the file.
    let _: AgrisensaConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("'{key}' = '{value}' does not produce a valid config"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value is parsed according to the type of the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(items)) => {
            // Comma-separated list; keep integers as integers.
            let numeric = items.iter().all(|v| v.is_integer());
            let parsed: Result<Vec<toml::Value>> = raw_value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if numeric {
                        s.parse::<i64>()
                            .map(toml::Value::Integer)
                            .with_context(|| format!("expected integer list for '{key}', got '{s}'"))
                    } else {
                        Ok(toml::Value::String(s.to_string()))
                    }
                })
                .collect();
            toml::Value::Array(parsed?)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' is a section, not a value"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
