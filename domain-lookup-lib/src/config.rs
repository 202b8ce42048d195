//! Configuration file parsing and management.
//!
//! Settings come from three layers, lowest precedence first: TOML files,
//! `DL_*` environment variables, and whatever the caller applies last
//! (usually CLI flags). Each layer is applied on top of a [`LookupConfig`].

use crate::error::LookupError;
use crate::types::{LookupConfig, RequestedSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// source = "auto"
/// http_timeout = "10s"
/// whois_timeout = "12s"
/// cache_ttl = "5m"
/// bootstrap = true
///
/// [rdap_servers]
/// de = ["https://rdap.denic.de"]
///
/// [whois_servers]
/// io = "whois.nic.io"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for resolver and CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra RDAP base URLs per TLD, tried before any built-in server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap_servers: Option<HashMap<String, Vec<String>>>,

    /// Registry WHOIS host per TLD, `host` or `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_servers: Option<HashMap<String, String>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default source: auto, rdap, whois, registrar or registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// HTTP timeout (as string, e.g., "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<String>,

    /// WHOIS timeout (as string, e.g., "12s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Result cache lifetime (as string, e.g., "5m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,

    /// Whether to fetch the IANA RDAP bootstrap file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<bool>,

    /// Alternative bootstrap file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_url: Option<String>,

    /// Host used for IANA WHOIS referrals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iana_whois_host: Option<String>,

    /// Default pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

impl FileConfig {
    /// Requested source named in `[defaults]`, if any.
    pub fn default_source(&self) -> Result<Option<RequestedSource>, LookupError> {
        self.defaults
            .as_ref()
            .and_then(|d| d.source.as_deref())
            .map(str::parse)
            .transpose()
    }

    /// Layer this file's values over `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> Result<LookupConfig, LookupError> {
        if let Some(defaults) = &self.defaults {
            if let Some(value) = &defaults.http_timeout {
                config.http_timeout = require_duration("http_timeout", value)?;
            }
            if let Some(value) = &defaults.whois_timeout {
                config.whois_timeout = require_duration("whois_timeout", value)?;
            }
            if let Some(value) = &defaults.cache_ttl {
                config.cache_ttl = require_duration("cache_ttl", value)?;
            }
            if let Some(enabled) = defaults.bootstrap {
                config.enable_bootstrap = enabled;
            }
            if let Some(url) = &defaults.bootstrap_url {
                config.bootstrap_url = url.clone();
            }
            if let Some(host) = &defaults.iana_whois_host {
                config.iana_whois_host = host.clone();
            }
        }

        if let Some(servers) = &self.rdap_servers {
            for (tld, urls) in servers {
                for url in urls {
                    config = config.with_rdap_server(tld.as_str(), url.as_str());
                }
            }
        }

        if let Some(servers) = &self.whois_servers {
            for (tld, host) in servers {
                config = config.with_whois_server(tld.as_str(), host.as_str());
            }
        }

        Ok(config)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` when the file is missing or unreadable, `ConfigError`
    /// when it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, LookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            LookupError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then `~/.domain-lookup.toml`, then `./domain-lookup.toml`;
    /// later files win field by field. Files that fail to load are skipped
    /// with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, LookupError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring configuration file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for path in &loaded_files {
                debug!(path = %path.display(), "Merged configuration file");
            }
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./domain-lookup.toml", "./.domain-lookup.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".domain-lookup.toml", "domain-lookup.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-lookup").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.source.is_some() {
                        lower_defaults.source = higher_defaults.source;
                    }
                    if higher_defaults.http_timeout.is_some() {
                        lower_defaults.http_timeout = higher_defaults.http_timeout;
                    }
                    if higher_defaults.whois_timeout.is_some() {
                        lower_defaults.whois_timeout = higher_defaults.whois_timeout;
                    }
                    if higher_defaults.cache_ttl.is_some() {
                        lower_defaults.cache_ttl = higher_defaults.cache_ttl;
                    }
                    if higher_defaults.bootstrap.is_some() {
                        lower_defaults.bootstrap = higher_defaults.bootstrap;
                    }
                    if higher_defaults.bootstrap_url.is_some() {
                        lower_defaults.bootstrap_url = higher_defaults.bootstrap_url;
                    }
                    if higher_defaults.iana_whois_host.is_some() {
                        lower_defaults.iana_whois_host = higher_defaults.iana_whois_host;
                    }
                    if higher_defaults.pretty.is_some() {
                        lower_defaults.pretty = higher_defaults.pretty;
                    }
                    Some(lower_defaults)
                }
                (None, higher_defaults) => higher_defaults,
                (lower_defaults, None) => lower_defaults,
            },
            rdap_servers: merge_maps(lower.rdap_servers, higher.rdap_servers),
            whois_servers: merge_maps(lower.whois_servers, higher.whois_servers),
        }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), LookupError> {
        if let Some(defaults) = &config.defaults {
            config.default_source()?;

            for (name, value) in [
                ("http_timeout", &defaults.http_timeout),
                ("whois_timeout", &defaults.whois_timeout),
                ("cache_ttl", &defaults.cache_ttl),
            ] {
                if let Some(value) = value {
                    require_duration(name, value)?;
                }
            }

            if defaults
                .bootstrap_url
                .as_deref()
                .is_some_and(|url| !url.starts_with("http://") && !url.starts_with("https://"))
            {
                return Err(LookupError::config("bootstrap_url must be an http(s) URL"));
            }
        }

        if let Some(servers) = &config.rdap_servers {
            for (tld, urls) in servers {
                validate_tld_key(tld, "rdap_servers")?;
                if urls.is_empty() {
                    return Err(LookupError::config(format!(
                        "rdap_servers.{} cannot have an empty URL list",
                        tld
                    )));
                }
                if let Some(bad) = urls
                    .iter()
                    .find(|u| !u.starts_with("http://") && !u.starts_with("https://"))
                {
                    return Err(LookupError::config(format!(
                        "Invalid RDAP URL '{}' for '{}'",
                        bad, tld
                    )));
                }
            }
        }

        if let Some(servers) = &config.whois_servers {
            for (tld, host) in servers {
                validate_tld_key(tld, "whois_servers")?;
                if host.trim().is_empty() || host.contains(char::is_whitespace) {
                    return Err(LookupError::config(format!(
                        "Invalid WHOIS host '{}' for '{}'",
                        host, tld
                    )));
                }
            }
        }

        Ok(())
    }
}

fn merge_maps<V>(
    lower: Option<HashMap<String, V>>,
    higher: Option<HashMap<String, V>>,
) -> Option<HashMap<String, V>> {
    match (lower, higher) {
        (Some(mut lower), Some(higher)) => {
            lower.extend(higher);
            Some(lower)
        }
        (None, higher) => higher,
        (lower, None) => lower,
    }
}

fn validate_tld_key(tld: &str, table: &str) -> Result<(), LookupError> {
    if tld.is_empty() || tld.contains('.') || tld.contains(' ') {
        return Err(LookupError::config(format!(
            "Invalid TLD '{}' in [{}]",
            tld, table
        )));
    }
    Ok(())
}

fn require_duration(name: &str, value: &str) -> Result<Duration, LookupError> {
    parse_duration(value).ok_or_else(|| {
        LookupError::config(format!(
            "Invalid {} '{}'. Use format like '500ms', '10s', '2m'",
            name, value
        ))
    })
}

/// Environment variable configuration.
///
/// Mirrors the `[defaults]` table; values come from `DL_*` variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub source: Option<RequestedSource>,
    pub http_timeout: Option<Duration>,
    pub whois_timeout: Option<Duration>,
    pub cache_ttl: Option<Duration>,
    pub bootstrap: Option<bool>,
    pub bootstrap_url: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Layer the environment values over `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(timeout) = self.http_timeout {
            config.http_timeout = timeout;
        }
        if let Some(timeout) = self.whois_timeout {
            config.whois_timeout = timeout;
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache_ttl = ttl;
        }
        if let Some(enabled) = self.bootstrap {
            config.enable_bootstrap = enabled;
        }
        if let Some(url) = &self.bootstrap_url {
            config.bootstrap_url = url.clone();
        }
        config
    }
}

/// Load configuration from `DL_*` environment variables.
///
/// Invalid values are logged and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok())
}

/// Same as [`load_env_config`] with a caller-supplied variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("DL_SOURCE") {
        match val.parse::<RequestedSource>() {
            Ok(source) => env_config.source = Some(source),
            Err(_) => warn!("Invalid DL_SOURCE='{}', ignoring", val),
        }
    }

    env_config.http_timeout = env_duration(&lookup, "DL_HTTP_TIMEOUT");
    env_config.whois_timeout = env_duration(&lookup, "DL_WHOIS_TIMEOUT");
    env_config.cache_ttl = env_duration(&lookup, "DL_CACHE_TTL");

    if let Some(val) = lookup("DL_BOOTSTRAP") {
        match parse_bool(&val) {
            Some(enabled) => env_config.bootstrap = Some(enabled),
            None => warn!("Invalid DL_BOOTSTRAP='{}', use true/false", val),
        }
    }

    env_config.bootstrap_url = lookup("DL_BOOTSTRAP_URL").filter(|v| !v.trim().is_empty());
    env_config.config = lookup("DL_CONFIG").filter(|v| !v.trim().is_empty());

    debug!(?env_config, "Loaded environment configuration");
    env_config
}

fn env_duration<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name)?;
    let parsed = parse_duration(&val);
    if parsed.is_none() {
        warn!("Invalid {}='{}', use format like '10s' or '2m'", name, val);
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration like "500ms", "10s", "2m" or "1h". A bare number is seconds.
/// Values that overflow `u64` seconds are rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = value.strip_suffix('s') {
        s.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = value.strip_suffix('m') {
        m.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(h) = value.strip_suffix('h') {
        h.parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}
