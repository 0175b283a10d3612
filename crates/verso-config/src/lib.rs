//! Configuration management for verso.
//!
//! Parses `verso.toml` with serde and discovers the config file in parent
//! directories. CLI settings can be applied during load via
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `publish.remote`
//! - `publish.token`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "verso.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the rendered site directory.
    pub source_dir: Option<PathBuf>,
    /// Override the root-relative site prefix.
    pub prefix: Option<String>,
    /// Override the publish auth token.
    pub token: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Pre/post render hooks.
    pub hooks: HooksConfig,
    /// Publication target. Required for `deploy`/`archive`.
    pub publish: Option<PublishConfig>,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    source_dir: Option<String>,
    prefix: Option<String>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Renderer output directory (the fresh site tree).
    pub source_dir: PathBuf,
    /// Project directory for verso data (`.verso/`).
    pub project_dir: PathBuf,
    /// Root-relative site prefix for generated links.
    pub prefix: String,
}

impl SiteConfig {
    /// Checkout directory for the publication branch (`.verso/checkout/`).
    #[must_use]
    pub fn checkout_dir(&self) -> PathBuf {
        self.project_dir.join("checkout")
    }
}

/// Pre/post render hook commands.
///
/// Opaque shell commands; verso only cares whether they exit zero.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HooksConfig {
    /// Command run before rendering.
    pub pre_render: Option<String>,
    /// Command run after rendering.
    pub post_render: Option<String>,
}

/// Publication target configuration.
#[derive(Debug, Deserialize)]
pub struct PublishConfig {
    /// Remote URL of the hosting repository.
    pub remote: String,
    /// Hosting branch.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Auth token for the remote.
    pub token: Option<String>,
    /// Bound on remote transfer time, in seconds.
    pub timeout_secs: Option<u64>,
}

impl PublishConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.remote, "publish.remote")?;
        require_non_empty(&self.branch, "publish.branch")?;
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "publish.timeout_secs cannot be 0".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_branch() -> String {
    "gh-pages".to_owned()
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
        /// Config field path (e.g., "`publish.token`").
        field: String,
        /// Error message (e.g., "${`VERSO_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `verso.toml` in the current directory and parents.
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist or
    /// parsing fails.
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
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Get validated publish configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the `[publish]` section is
    /// missing or invalid.
    pub fn require_publish(&self) -> Result<&PublishConfig, ConfigError> {
        let publish = self.publish.as_ref().ok_or_else(|| {
            ConfigError::Validation("[publish] section required in config".into())
        })?;
        publish.validate()?;
        Ok(publish)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.site_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(prefix) = &settings.prefix {
            self.site_resolved.prefix.clone_from(prefix);
        }
        if let Some(token) = &settings.token
            && let Some(publish) = &mut self.publish
        {
            publish.token = Some(token.clone());
        }
    }

    /// Search for the config file in the current directory and parents.
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

    /// Create default config with paths relative to the working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to the given base.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            hooks: HooksConfig::default(),
            publish: None,
            site_resolved: SiteConfig {
                source_dir: base.join("_site"),
                project_dir: base.join(".verso"),
                prefix: String::new(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        if let Some(publish) = &config.publish {
            publish.validate()?;
        }

        Ok(config)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(publish) = &mut self.publish {
            publish.remote = expand::expand_env(&publish.remote, "publish.remote")?;
            if let Some(token) = &publish.token {
                publish.token = Some(expand::expand_env(token, "publish.token")?);
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on the config dir.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            source_dir: config_dir.join(self.site.source_dir.as_deref().unwrap_or("_site")),
            project_dir: config_dir.join(".verso"),
            prefix: self.site.prefix.clone().unwrap_or_default(),
        };
    }
}
