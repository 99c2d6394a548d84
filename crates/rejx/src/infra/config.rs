//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::discovery::HiddenPolicy;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".rejx/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ignore: Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    include_hidden: Option<bool>,
    #[serde(default)]
    view: Option<String>,
}

impl Defaults {
    fn default_view() -> &'static str {
        "list"
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden.unwrap_or(false)
    }

    /// Hidden-file policy used when neither hidden flag is passed.
    pub fn hidden_policy(&self) -> HiddenPolicy {
        if self.include_hidden() {
            HiddenPolicy::Include
        } else {
            HiddenPolicy::Exclude
        }
    }

    /// View used by `ls` when `--view` is omitted.
    pub fn view(&self) -> &str {
        self.view.as_deref().unwrap_or(Self::default_view())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ignore {
    /// Globs relative to each search root; `dir/` ignores a directory anywhere.
    #[serde(default)]
    pub globs: Vec<String>,
    /// Regular expressions matched against the displayed path.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    include_hidden: Option<String>,
    view: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            include_hidden: env::var("REJX_INCLUDE_HIDDEN").ok(),
            view: env::var("REJX_VIEW").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(include_hidden: &str, view: &str) -> Self {
        Self {
            include_hidden: Some(include_hidden.to_owned()),
            view: Some(view.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_toml(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            ignore: merge_ignore(self.ignore, other.ignore),
        }
    }
}

fn merge_defaults(mut base: Defaults, overlay: Defaults) -> Defaults {
    if let Some(value) = overlay.include_hidden {
        base.include_hidden = Some(value);
    }
    if let Some(value) = overlay.view {
        base.view = Some(value);
    }
    base
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    let mut patterns: BTreeSet<String> = base.patterns.into_iter().collect();
    patterns.extend(overlay.patterns);

    Ignore {
        globs: globs.into_iter().collect(),
        patterns: patterns.into_iter().collect(),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("rejx/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(raw) = env.include_hidden {
        let value = parse_bool(&raw)
            .with_context(|| format!("REJX_INCLUDE_HIDDEN must be a boolean, got `{raw}`"))?;
        config.defaults.include_hidden = Some(value);
    }
    if let Some(view) = env.view {
        config.defaults.view = Some(view);
    }
    Ok(config)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert!(!config.defaults.include_hidden());
        assert_eq!(config.defaults.view(), "list");
        assert_eq!(config.defaults.hidden_policy(), HiddenPolicy::Exclude);
        assert!(config.ignore.globs.is_empty());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[defaults]
include_hidden = true
view = "tree"
[ignore]
globs = ["node_modules/"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".rejx"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".rejx/config.toml"),
            r#"
[defaults]
include_hidden = false
[ignore]
patterns = ["^vendor/"]
"#,
        )?;

        let global_path = Some(global);
        let workspace_path = Some(workspace_dir.join(".rejx/config.toml"));

        let config =
            Config::load_with_layers(global_path, workspace_path, EnvOverrides::default())?;

        assert!(!config.defaults.include_hidden());
        assert_eq!(config.defaults.view(), "tree");
        assert!(config.ignore.globs.contains(&"node_modules/".into()));
        assert!(config.ignore.patterns.contains(&"^vendor/".into()));
        assert_eq!(find_repo_root(&workspace_dir), Some(workspace_dir.clone()));

        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("yes", "tree");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert!(config.defaults.include_hidden());
        assert_eq!(config.defaults.view(), "tree");
        Ok(())
    }

    #[test]
    fn invalid_env_boolean_is_an_error() {
        let overrides = EnvOverrides::for_tests("maybe", "list");
        assert!(Config::load_with_layers(None, None, overrides).is_err());
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }
}
