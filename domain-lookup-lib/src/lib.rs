//! # Domain Lookup Library
//!
//! Resolves domain registration data over RDAP with a WHOIS fallback and
//! returns one normalized record regardless of which protocol answered.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_lookup_lib::{DomainResolver, LookupConfig, QueryType, RequestedSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = DomainResolver::new(LookupConfig::default())?;
//!     let result = resolver
//!         .resolve("example.com", QueryType::Domain, RequestedSource::Auto)
//!         .await?;
//!
//!     println!("Registrar: {:?} ({})", result.parsed.registrar, result.data_source);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP**: registry lookup with sponsoring-registrar discovery
//! - **WHOIS fallback**: registry host, registrar referral, then IANA referral
//! - **Bootstrap directory**: IANA `dns.json` merged over built-in tables
//! - **Normalization**: RDAP JSON and WHOIS text share one record shape
//! - **Result cache**: short-lived per-resolver cache

pub use cache::{CacheKey, ResultCache};
pub use config::{
    load_env_config, load_env_config_from, parse_duration, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig,
};
pub use error::{FailureKind, LookupError};
pub use protocols::authority::AuthorityEntry;
pub use resolver::DomainResolver;
pub use types::{
    Contact, ContactRole, DataSource, LookupConfig, NormalizedRecord, QueryType, RdapSource,
    RequestedSource, ResolveResult,
};
pub use utils::{extract_tld, normalize_query};

pub mod normalize;
pub mod protocols;

mod cache;
mod config;
mod error;
mod resolver;
mod types;
mod utils;

pub type Result<T> = std::result::Result<T, LookupError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
