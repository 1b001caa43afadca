//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rsnest/rsnest.toml`
//! 3. Local config: `<project_dir>/.rsnest.toml`
//! 4. Environment variables: `RSNEST_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::ReindexOptions;

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub id_prefix: Option<String>,
    pub require_complete: Option<bool>,
}

/// Unified configuration for rsnest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Node store file (default: <data dir>/rsnest/nodes.json)
    pub store_path: PathBuf,
    /// Element id prefix in form-encoded orderings, e.g. "page" for "page_3"
    pub id_prefix: String,
    /// Orderings must name every stored node, otherwise the tree is rebuilt
    pub require_complete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            id_prefix: "node".into(),
            require_complete: true,
        }
    }
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "rsnest")
        .map(|dirs| dirs.data_dir().join("nodes.json"))
        .unwrap_or_else(|| PathBuf::from("~/.rsnest/nodes.json"))
}

/// Get the XDG config directory for rsnest.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rsnest").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rsnest.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".rsnest.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Reindexing policy derived from these settings.
    pub fn reindex_options(&self) -> ReindexOptions {
        ReindexOptions {
            require_complete: self.require_complete,
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the store path.
    fn expand_paths(&mut self) {
        let raw = self.store_path.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.store_path = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            id_prefix: overlay
                .id_prefix
                .clone()
                .unwrap_or_else(|| self.id_prefix.clone()),
            require_complete: overlay.require_complete.unwrap_or(self.require_complete),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.rsnest.toml`
    ///
    /// A relative `store_path` from the local config resolves against
    /// `project_dir`.
    pub fn load(project_dir: Option<&Path>) -> ApplicationResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let mut raw = load_raw_settings(&local_path)?;
                raw.store_path = raw.store_path.map(|p| {
                    let text = p.to_string_lossy();
                    if p.is_relative() && !text.starts_with(['~', '$']) {
                        dir.join(p)
                    } else {
                        p
                    }
                });
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply RSNEST_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RSNEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("id_prefix") {
            settings.id_prefix = val;
        }
        if let Ok(val) = config.get_bool("require_complete") {
            settings.require_complete = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rsnest configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rsnest/rsnest.toml
#   Local:  <project>/.rsnest.toml
#   Env:    RSNEST_* environment variables

# Node store file (relative paths in a local config resolve against the project)
# store_path = "~/.local/share/rsnest/nodes.json"

# Prefix of element ids in form-encoded orderings ("page" for "page_3")
# id_prefix = "node"

# Orderings that leave stored nodes out trigger a full rebuild
# require_complete = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_created_then_requires_complete_orderings() {
        let settings = Settings::default();
        assert!(settings.require_complete);
        assert_eq!(settings.id_prefix, "node");
        assert!(settings.store_path.ends_with("nodes.json"));
        assert!(settings.reindex_options().require_complete);
    }

    #[test]
    fn given_tilde_in_store_path_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            store_path: PathBuf::from("~/trees/nodes.json"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.store_path.to_string_lossy();
        assert!(path.starts_with(&home), "store_path should start with home: {path}");
        assert!(!path.contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            store_path: None,
            id_prefix: Some("page".into()),
            require_complete: Some(false),
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.store_path, base.store_path);
        assert_eq!(merged.id_prefix, "page");
        assert!(!merged.require_complete);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.store_path.is_none());
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings {
            store_path: PathBuf::from("/tmp/nodes.json"),
            id_prefix: "crud_dummy".into(),
            require_complete: false,
        };
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
