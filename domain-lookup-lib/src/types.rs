//! Core data types for domain resolution.
//!
//! This module defines the normalized record every resolution produces,
//! the source tags attached to it, and the configuration for the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LookupError;

/// Kind of object being resolved. Only domains are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Domain,
}

/// Which protocol or authority the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestedSource {
    /// RDAP first, then WHOIS
    #[default]
    Auto,
    /// RDAP only; no WHOIS fallback
    Rdap,
    /// Skip RDAP entirely
    Whois,
    /// Prefer registrar answers wherever a registrar can be discovered
    Registrar,
    /// Never follow the registry to the registrar
    Registry,
}

impl RequestedSource {
    pub fn allows_rdap(self) -> bool {
        self != RequestedSource::Whois
    }

    pub fn allows_whois(self) -> bool {
        self != RequestedSource::Rdap
    }

    /// Whether the registrar discovery step should run.
    pub fn follows_registrar(self) -> bool {
        self != RequestedSource::Registry
    }
}

impl FromStr for RequestedSource {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "rdap" => Ok(Self::Rdap),
            "whois" => Ok(Self::Whois),
            "registrar" => Ok(Self::Registrar),
            "registry" => Ok(Self::Registry),
            other => Err(LookupError::config(format!(
                "Unknown data source '{}'. Use auto, rdap, whois, registrar or registry",
                other
            ))),
        }
    }
}

impl fmt::Display for RequestedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Rdap => "rdap",
            Self::Whois => "whois",
            Self::Registrar => "registrar",
            Self::Registry => "registry",
        };
        f.write_str(s)
    }
}

/// Which RDAP answer ended up in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdapSource {
    Registrar,
    Registry,
}

impl fmt::Display for RdapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registrar => f.write_str("registrar"),
            Self::Registry => f.write_str("registry"),
        }
    }
}

/// Origin of a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    #[serde(rename = "rdap-registrar")]
    RdapRegistrar,
    #[serde(rename = "rdap-registry")]
    RdapRegistry,
    #[serde(rename = "registrar")]
    Registrar,
    #[serde(rename = "registry")]
    Registry,
    #[serde(rename = "whois")]
    Whois,
}

impl From<RdapSource> for DataSource {
    fn from(source: RdapSource) -> Self {
        match source {
            RdapSource::Registrar => DataSource::RdapRegistrar,
            RdapSource::Registry => DataSource::RdapRegistry,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RdapRegistrar => "rdap-registrar",
            Self::RdapRegistry => "rdap-registry",
            Self::Registrar => "registrar",
            Self::Registry => "registry",
            Self::Whois => "whois",
        };
        f.write_str(s)
    }
}

/// Contact roles carried by a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactRole {
    Registrant,
    Admin,
    Tech,
    Billing,
}

/// One contact block. Redacted registries often leave most fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.organization.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.country.is_none()
    }
}

/// The canonical registration record.
///
/// Both the RDAP and the WHOIS path produce this shape; apart from
/// `data_source` and `raw` a consumer cannot tell which protocol answered.
/// Dates are kept exactly as the authority sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Domain name, upper-cased
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// Registry object id (RDAP `handle`, WHOIS "Registry Domain ID")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_domain_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_iana_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_whois_server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_abuse_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_abuse_phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_servers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<Contact>,

    /// Unrecognized WHOIS keys, slug-cased, values in input order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Vec<String>>,

    /// Raw text the record was built from (RDAP JSON or WHOIS text)
    pub raw: String,

    pub data_source: DataSource,
}

impl NormalizedRecord {
    /// An empty record for the given origin. Only the normalizers build these.
    pub(crate) fn empty(raw: String, data_source: DataSource) -> Self {
        Self {
            domain_name: None,
            registry_domain_id: None,
            registrar: None,
            registrar_iana_id: None,
            registrar_whois_server: None,
            registrar_abuse_email: None,
            registrar_abuse_phone: None,
            creation_date: None,
            expiration_date: None,
            updated_date: None,
            name_servers: Vec::new(),
            status: Vec::new(),
            dnssec: None,
            registrant: None,
            admin: None,
            tech: None,
            billing: None,
            extra: BTreeMap::new(),
            raw,
            data_source,
        }
    }

    pub fn contact(&self, role: ContactRole) -> Option<&Contact> {
        match role {
            ContactRole::Registrant => self.registrant.as_ref(),
            ContactRole::Admin => self.admin.as_ref(),
            ContactRole::Tech => self.tech.as_ref(),
            ContactRole::Billing => self.billing.as_ref(),
        }
    }

    pub(crate) fn contact_slot(&mut self, role: ContactRole) -> &mut Option<Contact> {
        match role {
            ContactRole::Registrant => &mut self.registrant,
            ContactRole::Admin => &mut self.admin,
            ContactRole::Tech => &mut self.tech,
            ContactRole::Billing => &mut self.billing,
        }
    }

    /// True when none of the canonical fields could be filled.
    pub fn is_sparse(&self) -> bool {
        self.domain_name.is_none()
            && self.registrar.is_none()
            && self.creation_date.is_none()
            && self.expiration_date.is_none()
            && self.name_servers.is_empty()
            && self.status.is_empty()
    }
}

/// What `resolve` hands back to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    /// Raw text of the answer that was normalized
    pub raw: String,

    pub parsed: NormalizedRecord,

    pub data_source: DataSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap_source: Option<RdapSource>,

    /// Registry answer (RDAP JSON or WHOIS text) kept alongside a registrar answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_raw: Option<String>,
}

impl ResolveResult {
    pub(crate) fn from_record(
        parsed: NormalizedRecord,
        rdap_source: Option<RdapSource>,
        registry_raw: Option<String>,
    ) -> Self {
        Self {
            raw: parsed.raw.clone(),
            data_source: parsed.data_source,
            parsed,
            rdap_source,
            registry_raw,
        }
    }
}

/// Configuration for the resolution engine.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Timeout for every HTTP call (RDAP queries and bootstrap refresh)
    /// Default: 10 seconds
    pub http_timeout: Duration,

    /// Single timeout covering connect and the whole read of a WHOIS query
    /// Default: 12 seconds
    pub whois_timeout: Duration,

    /// TCP port for WHOIS. Default: 43
    pub whois_port: u16,

    /// How long a resolved result is served from memory
    /// Default: 5 minutes
    pub cache_ttl: Duration,

    /// Whether to consult the IANA bootstrap document
    /// Default: true
    pub enable_bootstrap: bool,

    /// Location of the IANA RDAP bootstrap document
    pub bootstrap_url: String,

    /// How long a fetched bootstrap map stays fresh. Default: 24 hours
    pub bootstrap_ttl: Duration,

    /// Host used to discover WHOIS servers for TLDs missing from the tables
    pub iana_whois_host: String,

    /// Per-TLD RDAP base URLs tried before the built-in table
    pub rdap_servers: HashMap<String, Vec<String>>,

    /// Per-TLD WHOIS hosts that replace the built-in tables
    pub whois_servers: HashMap<String, String>,

    /// User-Agent header for HTTP requests
    pub user_agent: String,
}

pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";
pub const DEFAULT_IANA_WHOIS_HOST: &str = "whois.iana.org";

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(12),
            whois_port: 43,
            cache_ttl: Duration::from_secs(5 * 60),
            enable_bootstrap: true,
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            bootstrap_ttl: Duration::from_secs(24 * 3600),
            iana_whois_host: DEFAULT_IANA_WHOIS_HOST.to_string(),
            rdap_servers: HashMap::new(),
            whois_servers: HashMap::new(),
            user_agent: format!("domain-lookup/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LookupConfig {
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    pub fn with_whois_port(mut self, port: u16) -> Self {
        self.whois_port = port;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.enable_bootstrap = enabled;
        self
    }

    pub fn with_bootstrap_url<U: Into<String>>(mut self, url: U) -> Self {
        self.bootstrap_url = url.into();
        self
    }

    pub fn with_iana_whois_host<H: Into<String>>(mut self, host: H) -> Self {
        self.iana_whois_host = host.into();
        self
    }

    /// Add an RDAP base URL for a TLD, ahead of the built-in table.
    pub fn with_rdap_server<T: Into<String>, U: Into<String>>(mut self, tld: T, url: U) -> Self {
        self.rdap_servers
            .entry(tld.into().to_lowercase())
            .or_default()
            .push(url.into());
        self
    }

    /// Pin the WHOIS host for a TLD.
    pub fn with_whois_server<T: Into<String>, H: Into<String>>(mut self, tld: T, host: H) -> Self {
        self.whois_servers
            .insert(tld.into().to_lowercase(), host.into());
        self
    }
}
