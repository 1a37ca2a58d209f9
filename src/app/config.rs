//! Engine configuration: paths and cache policy from `nexus.toml`, secrets
//! from the environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::adapters::ContentRoots;
use crate::domain::AppError;
use crate::domain::credential;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "nexus.toml";

pub const API_KEY_ENV: &str = "NEXUS_API_KEY";
pub const LEGACY_API_KEY_ENV: &str = "NEXUS_API_KEY_LEGACY";

/// Settings loaded from `nexus.toml`.
///
/// Relative paths are resolved against the directory holding the file (or the
/// working directory when no file is used).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(skip)]
    root: PathBuf,
    /// Trusted root for workflow templates.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    /// Root for the bootstrap template.
    #[serde(default = "default_web_template_dir")]
    pub web_template_dir: PathBuf,
    /// Inventory definition files watched for changes.
    #[serde(default = "default_inventory_dir")]
    pub inventory_dir: PathBuf,
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    #[serde(default = "default_skels_dir")]
    pub skels_dir: PathBuf,
    #[serde(default = "default_certs_dir")]
    pub certs_dir: PathBuf,
    /// Program and arguments printing the inventory as JSON.
    #[serde(default = "default_inventory_command")]
    pub inventory_command: Vec<String>,
    /// Extensions of the files that make up the watermark.
    #[serde(default = "default_inventory_extensions")]
    pub inventory_extensions: Vec<String>,
    /// Seconds before a cached inventory is considered stale.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            template_dir: default_template_dir(),
            web_template_dir: default_web_template_dir(),
            inventory_dir: default_inventory_dir(),
            scripts_dir: default_scripts_dir(),
            skels_dir: default_skels_dir(),
            certs_dir: default_certs_dir(),
            inventory_command: default_inventory_command(),
            inventory_extensions: default_inventory_extensions(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML content, resolving paths against `root`.
    pub fn parse(content: &str, root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let mut settings: Settings = toml::from_str(content)?;
        settings.root = root.into();
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config_error(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::parse(&content, root)
    }

    /// Load `path` if given, else `nexus.toml` in the working directory when it
    /// exists, else the defaults rooted at the working directory.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let cwd = std::env::current_dir()?;
        let candidate = cwd.join(CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Self::default().with_root(cwd))
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a configured path against the settings root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Content directories resolved against the settings root.
    pub fn content_roots(&self) -> ContentRoots {
        ContentRoots::new(
            self.resolve(&self.scripts_dir),
            self.resolve(&self.skels_dir),
            self.resolve(&self.certs_dir),
        )
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs.min(u64::from(u32::MAX)) as i64)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.inventory_command.is_empty() {
            return Err(AppError::config_error("inventory_command must not be empty"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(AppError::config_error("cache_ttl_secs must be greater than 0"));
        }
        if self.inventory_extensions.is_empty() {
            return Err(AppError::config_error("inventory_extensions must not be empty"));
        }
        Ok(())
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_web_template_dir() -> PathBuf {
    PathBuf::from("templates/web")
}

fn default_inventory_dir() -> PathBuf {
    PathBuf::from("inventory")
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("files/scripts")
}

fn default_skels_dir() -> PathBuf {
    PathBuf::from("files/skels")
}

fn default_certs_dir() -> PathBuf {
    PathBuf::from("files/certs")
}

fn default_inventory_command() -> Vec<String> {
    [
        "ansible-inventory",
        "-i",
        "inventory/hosts.yml",
        "--list",
        "--vault-password-file",
        ".vault_pass",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

fn default_inventory_extensions() -> Vec<String> {
    vec!["yml".to_string(), "yaml".to_string()]
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Shared secrets: the current key and an optional legacy key.
///
/// Empty values are treated as unset.
#[derive(Clone, Default)]
pub struct Credentials {
    current: Option<String>,
    legacy: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("current", &self.current.as_ref().map(|_| "<redacted>"))
            .field("legacy", &self.legacy.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(current: impl Into<String>) -> Self {
        Self { current: non_empty(current.into()), legacy: None }
    }

    pub fn with_legacy(mut self, legacy: impl Into<String>) -> Self {
        self.legacy = non_empty(legacy.into());
        self
    }

    /// Read `NEXUS_API_KEY` and `NEXUS_API_KEY_LEGACY`.
    pub fn from_env() -> Self {
        Self {
            current: std::env::var(API_KEY_ENV).ok().and_then(non_empty),
            legacy: std::env::var(LEGACY_API_KEY_ENV).ok().and_then(non_empty),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.current.is_some()
    }

    /// Whether a presented key matches the current or the legacy secret.
    pub fn accepts(&self, candidate: &str) -> bool {
        [&self.current, &self.legacy].into_iter().flatten().any(|key| key == candidate)
    }

    /// The current secret, obfuscated for echo-back to a node.
    pub fn scrambled(&self) -> Result<String, AppError> {
        self.current.as_deref().map(credential::scramble).ok_or_else(|| {
            AppError::rendering(format!("{} not found in server configuration", API_KEY_ENV))
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
