//! Configuration management for vcsclient.
//!
//! Connection settings are loaded from multiple sources:
//! - command-line arguments
//! - `VCSCLIENT_*` environment variables
//! - a TOML file following the XDG Base Directory specification
//! - built-in defaults
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcsclient::Config;
//!
//! // File first, environment on top
//! let config = Config::load_from_file()
//!     .unwrap_or_default()
//!     .merge(Config::load_from_env());
//!
//! let (provider, info) = config.resolve()?;
//! println!("Using {provider} at {}", info.api_endpoint);
//! # Ok::<(), vcsclient::error::ConfigError>(())
//! ```

use crate::error::ConfigError;
use crate::models::{VcsInfo, VcsProvider};
use crate::parsed_property::ParsedProperty;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROVIDER_ENV: &str = "VCSCLIENT_PROVIDER";
pub const API_ENDPOINT_ENV: &str = "VCSCLIENT_API_ENDPOINT";
pub const TOKEN_ENV: &str = "VCSCLIENT_TOKEN";
pub const PROJECT_ENV: &str = "VCSCLIENT_PROJECT";
pub const USERNAME_ENV: &str = "VCSCLIENT_USERNAME";

const CONFIG_DIR_NAME: &str = "vcsclient";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Temporary struct for deserializing TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    pub provider: Option<String>,
    pub api_endpoint: Option<String>,
    pub token: Option<String>,
    pub project: Option<String>,
    pub username: Option<String>,
}

/// Connection flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// VCS provider (azure-repos, github, gitlab, bitbucket-server, bitbucket-cloud)
    #[arg(long, global = true, help_heading = "Connection")]
    pub provider: Option<String>,

    /// Provider API endpoint, e.g. https://dev.azure.com/my-org/
    #[arg(long, global = true, help_heading = "Connection")]
    pub api_endpoint: Option<String>,

    /// Access token (prefer the VCSCLIENT_TOKEN environment variable)
    #[arg(long, global = true, help_heading = "Connection")]
    pub token: Option<String>,

    /// Project the client operates in
    #[arg(long, global = true, help_heading = "Connection")]
    pub project: Option<String>,

    /// Username, for providers that need one
    #[arg(long, global = true, help_heading = "Connection")]
    pub username: Option<String>,
}

/// Connection configuration assembled from CLI arguments, environment
/// variables, config file, and defaults.
#[derive(Clone, PartialEq)]
pub struct Config {
    /// Provider identifier, validated by [`Config::resolve`].
    pub provider: Option<ParsedProperty<String>>,
    /// Provider API endpoint.
    pub api_endpoint: Option<ParsedProperty<String>>,
    /// Access token.
    pub token: Option<ParsedProperty<String>>,
    /// Project the client operates in.
    pub project: Option<ParsedProperty<String>>,
    pub username: Option<ParsedProperty<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Some(ParsedProperty::Default(
                VcsProvider::AzureRepos.as_config_str().to_string(),
            )),
            api_endpoint: None,
            token: None,
            project: None,
            username: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_endpoint", &self.api_endpoint)
            .field(
                "token",
                &self.token.as_ref().map(|t| format!("[REDACTED] ({})", t.source_name())),
            )
            .field("project", &self.project)
            .field("username", &self.username)
            .finish()
    }
}

impl Config {
    /// A config with no value set, not even defaults.
    pub fn empty() -> Self {
        Self {
            provider: None,
            api_endpoint: None,
            token: None,
            project: None,
            username: None,
        }
    }

    /// Load configuration from the XDG config directory.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit TOML file.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        let config_content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::FileReadError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let config_file: ConfigFile =
            toml::from_str(&config_content).map_err(|e| ConfigError::ParseError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let file_property =
            |v: String| ParsedProperty::File(v.clone(), config_path.to_path_buf(), v);

        Ok(Self {
            provider: config_file.provider.map(file_property),
            api_endpoint: config_file.api_endpoint.map(file_property),
            token: config_file.token.map(file_property),
            project: config_file.project.map(file_property),
            username: config_file.username.map(file_property),
        })
    }

    /// Load configuration from environment variables. Empty values are ignored.
    pub fn load_from_env() -> Self {
        let env = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| ParsedProperty::Env(v.clone(), format!("{name}={v}")))
        };

        Self {
            provider: env(PROVIDER_ENV),
            api_endpoint: env(API_ENDPOINT_ENV),
            token: env(TOKEN_ENV),
            project: env(PROJECT_ENV),
            username: env(USERNAME_ENV),
        }
    }

    /// Build a Config from CLI connection flags.
    pub fn from_args(args: &ConnectionArgs) -> Self {
        let cli = |v: &Option<String>| {
            v.as_ref()
                .map(|v| ParsedProperty::Cli(v.clone(), v.clone()))
        };

        Self {
            provider: cli(&args.provider),
            api_endpoint: cli(&args.api_endpoint),
            token: cli(&args.token),
            project: cli(&args.project),
            username: cli(&args.username),
        }
    }

    /// Load every source and merge them: CLI > env > file > default.
    pub fn load(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        Ok(Self::default()
            .merge(Self::load_from_file()?)
            .merge(Self::load_from_env())
            .merge(Self::from_args(args)))
    }

    /// Get the config file path: `$XDG_CONFIG_HOME/vcsclient/config.toml`,
    /// falling back to `~/.config/vcsclient/config.toml`.
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "XDG_CONFIG_HOME".to_string(),
                    message: "not set and the home directory could not be determined"
                        .to_string(),
                })?
                .join(".config"),
        };

        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            provider: other.provider.or(self.provider),
            api_endpoint: other.api_endpoint.or(self.api_endpoint),
            token: other.token.or(self.token),
            project: other.project.or(self.project),
            username: other.username.or(self.username),
        }
    }

    /// Validate the merged configuration and produce the connection descriptor.
    pub fn resolve(&self) -> Result<(VcsProvider, VcsInfo), ConfigError> {
        let provider_property = self
            .provider
            .as_ref()
            .ok_or_else(|| missing("provider", PROVIDER_ENV))?;
        let provider: VcsProvider = provider_property.value().parse().map_err(|message: String| {
            ConfigError::InvalidValue {
                field: "provider".to_string(),
                message: format!("{message} (from {})", provider_property.describe_source()),
            }
        })?;

        let api_endpoint = required(&self.api_endpoint, "api-endpoint", API_ENDPOINT_ENV)?;
        let token = required(&self.token, "token", TOKEN_ENV)?;
        let project = self
            .project
            .as_ref()
            .map(|p| p.value().clone())
            .unwrap_or_default();

        Ok((
            provider,
            VcsInfo {
                api_endpoint,
                token: SecretString::from(token),
                project,
                username: self.username.as_ref().map(|u| u.value().clone()),
            },
        ))
    }

    /// Create a sample config file for user reference. Never overwrites.
    ///
    /// Returns the path of the (possibly pre-existing) file.
    pub fn create_sample_config() -> Result<PathBuf, ConfigError> {
        let config_path = Self::get_config_path()?;
        if config_path.exists() {
            return Ok(config_path);
        }

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::FileReadError {
                path: dir.to_path_buf(),
                message: format!("failed to create config directory: {e}"),
            })?;
        }

        let sample_config = r#"# vcsclient configuration file
# Location: $XDG_CONFIG_HOME/vcsclient/config.toml (defaults to ~/.config/vcsclient/config.toml)
# Every value can be overridden by a VCSCLIENT_* environment variable or a CLI flag.

# VCS provider (optional, defaults to "azure-repos")
provider = "azure-repos"

# Provider API endpoint (required)
# api_endpoint = "https://dev.azure.com/your-organization/"

# Access token (required, but consider using the VCSCLIENT_TOKEN environment variable instead)
# token = "your-personal-access-token"

# Project the client operates in
# project = "your-project"

# Username, for providers that authenticate with one (optional)
# username = "your-username"
"#;

        fs::write(&config_path, sample_config).map_err(|e| ConfigError::FileReadError {
            path: config_path.clone(),
            message: format!("failed to write sample config: {e}"),
        })?;

        Ok(config_path)
    }
}

fn missing(field: &str, env_var: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
        env_var: env_var.to_string(),
    }
}

fn required(
    property: &Option<ParsedProperty<String>>,
    field: &str,
    env_var: &str,
) -> Result<String, ConfigError> {
    property
        .as_ref()
        .map(|p| p.value().trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field, env_var))
}
