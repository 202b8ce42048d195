//! Resolution orchestrator.
//!
//! `DomainResolver` walks one sequential chain per query:
//!
//! 1. result cache
//! 2. RDAP (registry, then the sponsoring registrar when linked)
//! 3. priority WHOIS: the known registry host, then the registrar it refers to
//! 4. generic WHOIS: the server IANA names for the TLD
//!
//! An authoritative "not registered" answer ends the chain immediately.
//! Infrastructure failures move on to the next step and are only surfaced
//! once the chain is exhausted.

use crate::cache::{CacheKey, ResultCache};
use crate::error::LookupError;
use crate::normalize::{normalize_rdap, normalize_whois};
use crate::protocols::authority::{self, AuthorityEntry};
use crate::protocols::bootstrap::BootstrapDirectory;
use crate::protocols::rdap::{RdapClient, RdapOutcome};
use crate::protocols::registry;
use crate::protocols::whois::{
    extract_registrar_server, has_contact_data, is_unregistered, WhoisClient,
};
use crate::types::{
    DataSource, LookupConfig, QueryType, RdapSource, RequestedSource, ResolveResult,
};
use crate::utils::{extract_tld, normalize_query, normalize_tld};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};

/// Main entry point for domain registration lookups.
///
/// # Example
///
/// ```rust,no_run
/// use domain_lookup_lib::{DomainResolver, LookupConfig, QueryType, RequestedSource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = DomainResolver::new(LookupConfig::default())?;
///     let result = resolver
///         .resolve("example.com", QueryType::Domain, RequestedSource::Auto)
///         .await?;
///     println!("{:?} via {}", result.parsed.registrar, result.data_source);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DomainResolver {
    config: LookupConfig,
    directory: Arc<BootstrapDirectory>,
    rdap_client: RdapClient,
    whois_client: WhoisClient,
    cache: ResultCache,
    /// TLD -> WHOIS host learned from IANA
    discovered_whois: RwLock<HashMap<String, String>>,
}

impl DomainResolver {
    /// Create a resolver with its own bootstrap directory.
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let directory = Arc::new(BootstrapDirectory::new(&config)?);
        Self::with_directory(config, directory)
    }

    /// Create a resolver sharing an existing bootstrap directory.
    pub fn with_directory(
        config: LookupConfig,
        directory: Arc<BootstrapDirectory>,
    ) -> Result<Self, LookupError> {
        let rdap_client = RdapClient::new(&config, Arc::clone(&directory))?;
        let whois_client = WhoisClient::from_config(&config);
        let cache = ResultCache::new(config.cache_ttl);

        Ok(Self {
            config,
            directory,
            rdap_client,
            whois_client,
            cache,
            discovered_whois: RwLock::new(HashMap::new()),
        })
    }

    /// Resolve registration data for `query`.
    ///
    /// The query is normalized to its ASCII form first; that form is what
    /// the cache and every upstream request use.
    ///
    /// # Errors
    ///
    /// - `InvalidDomain` when the query is not a domain name
    /// - `DomainNotRegistered` when an authority says the name is free
    /// - `UnsupportedSuffix` when neither protocol knows the TLD
    /// - transient errors (timeouts, connection failures) when every step failed
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        query: &str,
        query_type: QueryType,
        source: RequestedSource,
    ) -> Result<ResolveResult, LookupError> {
        let domain = normalize_query(query)?;
        let tld = extract_tld(&domain)
            .ok_or_else(|| LookupError::invalid_domain(query, "Domain must include a TLD"))?;

        let key = CacheKey::new(domain.clone(), query_type, source);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let result = self.run_chain(&domain, &tld, source).await?;
        self.cache.insert(key, result.clone());
        info!(
            domain = %domain,
            data_source = %result.data_source,
            cached = self.cache.len(),
            "Resolved"
        );

        Ok(result)
    }

    async fn run_chain(
        &self,
        domain: &str,
        tld: &str,
        source: RequestedSource,
    ) -> Result<ResolveResult, LookupError> {
        let mut rdap_failure = None;

        if source.allows_rdap() {
            let prefer = if source.follows_registrar() {
                RdapSource::Registrar
            } else {
                RdapSource::Registry
            };

            match self.rdap_client.query_domain(domain, prefer).await {
                Ok(outcome) => return Ok(rdap_result(outcome)),
                Err(e) if !source.allows_whois() || !e.is_recoverable() => return Err(e),
                Err(e) => {
                    debug!(domain, error = %e, "RDAP unavailable, falling back to WHOIS");
                    rdap_failure = Some(e);
                }
            }
        }

        let mut whois_failure = None;
        let priority_host = self.priority_whois_host(tld);

        if let Some(host) = &priority_host {
            match self.priority_whois(domain, host, source).await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    debug!(domain, host = %host, error = %e, "Registry WHOIS failed");
                    whois_failure = Some(e);
                }
            }
        }

        match self
            .generic_whois(domain, tld, priority_host.as_deref())
            .await
        {
            Ok(Some(result)) => Ok(result),
            Ok(None) => Err(whois_failure
                .or(rdap_failure.filter(|e| !matches!(e, LookupError::NoServerFound { .. })))
                .unwrap_or_else(|| LookupError::unsupported(tld))),
            Err(e) if !e.is_recoverable() => Err(e),
            Err(e) => Err(whois_failure.unwrap_or(e)),
        }
    }

    /// Registry WHOIS host: configured override, then the ccTLD table, then the gTLD table.
    fn priority_whois_host(&self, tld: &str) -> Option<String> {
        self.config
            .whois_servers
            .get(tld)
            .cloned()
            .or_else(|| authority::whois_host(tld).map(String::from))
            .or_else(|| registry::gtld_whois_server(tld).map(String::from))
    }

    async fn priority_whois(
        &self,
        domain: &str,
        host: &str,
        source: RequestedSource,
    ) -> Result<ResolveResult, LookupError> {
        let registry_text = self.query_whois(host, domain).await?;

        if is_unregistered(&registry_text) {
            return Err(LookupError::not_registered(domain, host));
        }

        if source.follows_registrar() {
            if let Some(registrar_host) = extract_registrar_server(&registry_text) {
                if !registrar_host.eq_ignore_ascii_case(host) {
                    match self.whois_client.query(&registrar_host, domain).await {
                        Ok(text) if accept_registrar_text(&text, source) => {
                            debug!(registrar_host = %registrar_host, "Using registrar WHOIS answer");
                            let parsed = normalize_whois(&text, DataSource::Registrar);
                            return Ok(ResolveResult::from_record(
                                parsed,
                                None,
                                Some(registry_text),
                            ));
                        }
                        Ok(_) => {
                            debug!(registrar_host = %registrar_host, "Registrar WHOIS has no contact data, keeping registry answer");
                        }
                        Err(e) => {
                            debug!(registrar_host = %registrar_host, error = %e, "Registrar WHOIS failed, keeping registry answer");
                        }
                    }
                }
            }
        }

        let parsed = normalize_whois(&registry_text, DataSource::Registry);
        Ok(ResolveResult::from_record(parsed, None, None))
    }

    /// Last resort: ask IANA for the TLD's WHOIS server and query it.
    ///
    /// `Ok(None)` means no WHOIS server exists for the TLD.
    async fn generic_whois(
        &self,
        domain: &str,
        tld: &str,
        already_tried: Option<&str>,
    ) -> Result<Option<ResolveResult>, LookupError> {
        let Some(host) = self.discover_whois_host(tld).await? else {
            return Ok(None);
        };

        if already_tried.is_some_and(|tried| tried.eq_ignore_ascii_case(&host)) {
            return Err(LookupError::connection(
                host,
                "Registry WHOIS host already failed for this query",
            ));
        }

        let text = self.query_whois(&host, domain).await?;
        if is_unregistered(&text) {
            return Err(LookupError::not_registered(domain, host));
        }

        let parsed = normalize_whois(&text, DataSource::Whois);
        Ok(Some(ResolveResult::from_record(parsed, None, None)))
    }

    async fn discover_whois_host(&self, tld: &str) -> Result<Option<String>, LookupError> {
        if let Ok(known) = self.discovered_whois.read() {
            if let Some(host) = known.get(tld) {
                return Ok(Some(host.clone()));
            }
        }

        let host = self
            .whois_client
            .discover_whois_server(&self.config.iana_whois_host, tld)
            .await?;

        if let Some(host) = &host {
            debug!(tld, host = %host, "Discovered WHOIS server via IANA");
            if let Ok(mut known) = self.discovered_whois.write() {
                known.insert(tld.to_string(), host.clone());
            }
        }
        Ok(host)
    }

    /// WHOIS query that treats an empty answer as a failed exchange.
    async fn query_whois(&self, host: &str, domain: &str) -> Result<String, LookupError> {
        let text = self.whois_client.query(host, domain).await?;
        if text.trim().is_empty() {
            return Err(LookupError::connection(host, "Empty WHOIS response"));
        }
        Ok(text)
    }

    /// Whether RDAP or a known WHOIS host can serve `tld`.
    ///
    /// Refreshes the bootstrap map first if it is stale.
    pub async fn is_supported(&self, tld: &str) -> bool {
        let tld = normalize_tld(tld);
        if tld.is_empty() {
            return false;
        }

        self.directory.refresh_if_stale().await;
        !self.directory.rdap_servers(&tld).is_empty() || self.priority_whois_host(&tld).is_some()
    }

    /// Country metadata for a ccTLD.
    pub fn authority_for(&self, tld: &str) -> Option<&'static AuthorityEntry> {
        authority::lookup(&normalize_tld(tld))
    }
}

fn rdap_result(outcome: RdapOutcome) -> ResolveResult {
    let parsed = normalize_rdap(&outcome.json, outcome.raw, outcome.source);
    ResolveResult::from_record(parsed, Some(outcome.source), outcome.registry_raw)
}

/// Registrar text replaces the registry text only when it is worth more.
///
/// An explicit registrar request takes any registered-looking answer;
/// otherwise the registrar must show contact data the registry lacks.
fn accept_registrar_text(text: &str, source: RequestedSource) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    match source {
        RequestedSource::Registrar => !is_unregistered(text),
        _ => has_contact_data(text),
    }
}
