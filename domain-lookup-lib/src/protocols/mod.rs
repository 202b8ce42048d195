//! Protocol implementations for domain resolution.
//!
//! RDAP over HTTPS, WHOIS over raw TCP, and the server tables both of
//! them consult.

/// ccTLD authority metadata
pub mod authority;

/// IANA RDAP bootstrap directory
pub mod bootstrap;

/// RDAP (Registration Data Access Protocol) client
pub mod rdap;

/// Built-in RDAP and gTLD WHOIS server tables
pub mod registry;

/// WHOIS protocol client
pub mod whois;

pub use authority::AuthorityEntry;
pub use bootstrap::{BootstrapDirectory, BootstrapMap};
pub use rdap::{RdapClient, RdapOutcome};
pub use whois::WhoisClient;
