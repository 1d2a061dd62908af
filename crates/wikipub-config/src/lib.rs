//! Configuration management for wikipub.
//!
//! Parses `wikipub.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `confluence.base_url`
//! - `confluence.username`
//! - `confluence.password`
//! - `confluence.credentials_file`
//! - `mappings[].space_key`, `mappings[].root`, `mappings[].path`

mod credentials;
mod expand;

pub use credentials::{CredentialStore, Credentials, DEFAULT_CREDENTIALS_FILE};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override dry-run flag.
    pub dry_run: Option<bool>,
    /// Override Confluence base URL.
    pub base_url: Option<String>,
    /// Override Confluence username.
    pub username: Option<String>,
    /// Override Confluence password or API token.
    pub password: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wikipub.toml";

/// Upper bound accepted for any navigation depth limit.
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence connection settings.
    pub confluence: Option<ConfluenceConfig>,
    /// Publishing behavior.
    pub publish: PublishConfig,
    /// Space mappings as written in TOML (paths relative to the config file).
    #[serde(rename = "mappings")]
    mappings_raw: Vec<MappingRaw>,

    /// Resolved space mappings (set after loading).
    #[serde(skip)]
    pub mappings: Vec<SpaceMapping>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Confluence configuration.
#[derive(Debug, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence base URL (e.g. `https://example.atlassian.net/wiki`).
    pub base_url: String,
    /// Account name for Basic authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password or API token.
    #[serde(default)]
    pub password: Option<String>,
    /// Credentials store consulted when `username` is not set.
    #[serde(default)]
    pub credentials_file: Option<String>,
}

impl ConfluenceConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "confluence.base_url")?;
        require_http_url(&self.base_url, "confluence.base_url")?;
        Ok(())
    }
}

/// Source documentation format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Antora site output (`data-panel="menu"` navigation, `article.doc` bodies).
    #[default]
    Antora,
}

/// Target page markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMarkup {
    /// Confluence storage format.
    #[default]
    ConfluenceStorage,
}

/// Publishing behavior.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Run the full walk without any remote calls.
    pub dry_run: bool,
    /// Deepest navigation level accepted.
    pub max_depth: usize,
    /// Format of the local documentation tree.
    pub source_format: SourceFormat,
    /// Markup written to the wiki.
    pub target_markup: TargetMarkup,
    /// Value of the page appearance properties ensured after each update.
    pub appearance: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_depth: 10,
            source_format: SourceFormat::default(),
            target_markup: TargetMarkup::default(),
            appearance: "full-width".to_owned(),
        }
    }
}

/// Raw mapping as parsed from TOML (path as string).
#[derive(Debug, Deserialize)]
struct MappingRaw {
    space_key: String,
    #[serde(default)]
    root: Option<String>,
    path: String,
}

/// One local directory published into one remote space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceMapping {
    /// Remote space key.
    pub space_key: String,
    /// Optional title of a page all navigation roots are nested under.
    pub root: Option<String>,
    /// Site directory containing `index.html`.
    pub path: PathBuf,
}

impl SpaceMapping {
    /// Create a mapping.
    #[must_use]
    pub fn new(space_key: impl Into<String>, root: Option<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            space_key: space_key.into(),
            root: root.filter(|r| !r.trim().is_empty()),
            path: path.into(),
        }
    }

    /// Navigation document of the mapped site.
    #[must_use]
    pub fn index_file(&self) -> PathBuf {
        self.path.join("index.html")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.password`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wikipub.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the `[confluence]` section is invalid after CLI overrides.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        // overrides may have replaced base_url
        if let Some(confluence) = &config.confluence {
            confluence.validate()?;
        }

        Ok(config)
    }

    /// Parse configuration text, resolving mapping paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, env expansion or validation fails.
    pub fn from_toml(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(dry_run) = settings.dry_run {
            self.publish.dry_run = dry_run;
        }
        if let Some(base_url) = &settings.base_url {
            match self.confluence.as_mut() {
                Some(confluence) => confluence.base_url.clone_from(base_url),
                None => {
                    self.confluence = Some(ConfluenceConfig {
                        base_url: base_url.clone(),
                        username: None,
                        password: None,
                        credentials_file: None,
                    });
                }
            }
        }
        if let Some(confluence) = self.confluence.as_mut() {
            if settings.username.is_some() {
                confluence.username.clone_from(&settings.username);
            }
            if settings.password.is_some() {
                confluence.password.clone_from(&settings.password);
            }
        }
    }

    /// Get validated Confluence configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Get the configured mappings, requiring at least one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no `[[mappings]]` entry exists.
    pub fn require_mappings(&self) -> Result<&[SpaceMapping], ConfigError> {
        if self.mappings.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[mappings]] entry required in config".into(),
            ));
        }
        Ok(&self.mappings)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// The `[confluence]` section is checked by [`Config::load`] once CLI
    /// overrides are applied, and again by
    /// [`require_confluence`](Self::require_confluence).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_publish()?;
        self.validate_mappings()?;
        Ok(())
    }

    fn validate_publish(&self) -> Result<(), ConfigError> {
        let depth = self.publish.max_depth;
        if depth == 0 || depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Validation(format!(
                "publish.max_depth must be between 1 and {MAX_DEPTH_LIMIT}"
            )));
        }
        require_non_empty(&self.publish.appearance, "publish.appearance")?;
        Ok(())
    }

    fn validate_mappings(&self) -> Result<(), ConfigError> {
        for (i, mapping) in self.mappings_raw.iter().enumerate() {
            require_non_empty(&mapping.space_key, &format!("mappings[{i}].space_key"))?;
            require_non_empty(&mapping.path, &format!("mappings[{i}].path"))?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut confluence) = self.confluence {
            confluence.base_url = expand::expand_env(&confluence.base_url, "confluence.base_url")?;
            expand::expand_opt(&mut confluence.username, "confluence.username")?;
            expand::expand_opt(&mut confluence.password, "confluence.password")?;
            expand::expand_opt(&mut confluence.credentials_file, "confluence.credentials_file")?;
        }

        for (i, mapping) in self.mappings_raw.iter_mut().enumerate() {
            mapping.space_key =
                expand::expand_env(&mapping.space_key, &format!("mappings[{i}].space_key"))?;
            mapping.path = expand::expand_env(&mapping.path, &format!("mappings[{i}].path"))?;
            expand::expand_opt(&mut mapping.root, &format!("mappings[{i}].root"))?;
        }

        Ok(())
    }

    /// Resolve mapping paths relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.mappings = self
            .mappings_raw
            .iter()
            .map(|m| SpaceMapping::new(m.space_key.clone(), m.root.clone(), config_dir.join(&m.path)))
            .collect();
    }
}
