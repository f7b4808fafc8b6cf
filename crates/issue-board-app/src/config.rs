use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use issue_board_core::filter::{PartialDisplayFilters, normalize_display_filters};
use serde::Deserialize;

const CONFIG_DIR: &str = ".issue-board";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_FILTERS_FILE: &str = "filters.json";

/// Board configuration loaded from `.issue-board/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardConfig {
    /// Workspace identity.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Display filters applied to views that never stored their own.
    #[serde(default)]
    pub display: PartialDisplayFilters,
    /// Filter persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(skip)]
    root: Option<PathBuf>,
}

impl BoardConfig {
    /// Load configuration from a working directory.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = workdir.as_ref().join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self {
                root: Some(config_dir),
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
        config.root = Some(config_dir);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.workspace.slug.trim().is_empty() {
            bail!("workspace slug must not be empty");
        }
        if self.workspace.user.trim().is_empty() {
            bail!("workspace user must not be empty");
        }
        normalize_display_filters(&self.display)
            .validate()
            .context("default display filters are not renderable")?;
        Ok(())
    }

    /// Location of the persisted filter file.
    ///
    /// Relative paths resolve against the `.issue-board` directory.
    #[must_use]
    pub fn filters_path(&self) -> PathBuf {
        let configured = self
            .storage
            .filters_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILTERS_FILE));
        match &self.root {
            Some(root) if configured.is_relative() => root.join(configured),
            _ => configured,
        }
    }
}

/// `[workspace]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace slug used in endpoint paths and filter keys.
    pub slug: String,
    /// User the persisted filters belong to.
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            slug: "default".into(),
            user: default_user(),
        }
    }
}

fn default_user() -> String {
    "local".into()
}

/// `[storage]` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Filter file; defaults to `filters.json` next to the config file.
    #[serde(default)]
    pub filters_file: Option<PathBuf>,
}
