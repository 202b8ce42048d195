//! RDAP (Registration Data Access Protocol) client.
//!
//! Candidates come from the [`BootstrapDirectory`] and are tried strictly in
//! order; the first 2xx JSON answer is the registry answer. Unless the caller
//! prefers the registry, the client then follows the registry's link to the
//! sponsoring registrar's RDAP service and returns that answer instead when
//! it succeeds.

use crate::error::LookupError;
use crate::protocols::bootstrap::BootstrapDirectory;
use crate::protocols::registry::rdap_domain_url;
use crate::types::{LookupConfig, RdapSource};
use crate::utils::extract_tld;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const RDAP_CONTENT_TYPE: &str = "application/rdap+json";

/// Successful RDAP resolution.
#[derive(Debug, Clone)]
pub struct RdapOutcome {
    /// Parsed JSON of the answer that should be normalized
    pub json: Value,
    /// Body text of that answer
    pub raw: String,
    /// Registry body, kept when the answer came from the registrar
    pub registry_raw: Option<String>,
    pub source: RdapSource,
}

/// RDAP client bound to a shared bootstrap directory.
#[derive(Debug, Clone)]
pub struct RdapClient {
    http_client: reqwest::Client,
    directory: Arc<BootstrapDirectory>,
    timeout: Duration,
}

impl RdapClient {
    pub fn new(config: &LookupConfig, directory: Arc<BootstrapDirectory>) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                LookupError::network_with_source("Failed to create RDAP HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            directory,
            timeout: config.http_timeout,
        })
    }

    /// Resolve an ASCII domain over RDAP.
    ///
    /// `prefer == RdapSource::Registry` skips registrar discovery entirely.
    ///
    /// # Errors
    ///
    /// - `NoServerFound` when the TLD has no RDAP candidate
    /// - `AllServersFailed` when every candidate failed
    #[instrument(skip(self))]
    pub async fn query_domain(
        &self,
        domain: &str,
        prefer: RdapSource,
    ) -> Result<RdapOutcome, LookupError> {
        self.directory.refresh_if_stale().await;

        let tld = extract_tld(domain)
            .ok_or_else(|| LookupError::invalid_domain(domain, "Domain must include a TLD"))?;

        let candidates = self.directory.rdap_servers(&tld);
        if candidates.is_empty() {
            return Err(LookupError::NoServerFound { tld });
        }

        let mut attempts = Vec::new();
        let mut registry = None;

        for base in &candidates {
            let url = rdap_domain_url(base, domain);
            match self.fetch(&url).await {
                Ok(answer) => {
                    debug!(url = %url, "RDAP registry answer");
                    registry = Some((url, answer));
                    break;
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "RDAP candidate failed");
                    attempts.push(format!("{}: {}", url, e));
                }
            }
        }

        let Some((registry_url, (raw, json))) = registry else {
            return Err(LookupError::AllServersFailed {
                domain: domain.to_string(),
                attempts,
            });
        };

        if prefer == RdapSource::Registry {
            return Ok(RdapOutcome {
                json,
                raw,
                registry_raw: None,
                source: RdapSource::Registry,
            });
        }

        if let Some(href) = find_registrar_link(&json) {
            let url = registrar_query_url(&href, domain);
            if url != registry_url {
                match self.fetch(&url).await {
                    Ok((registrar_raw, registrar_json)) => {
                        debug!(url = %url, "RDAP registrar answer");
                        return Ok(RdapOutcome {
                            json: registrar_json,
                            raw: registrar_raw,
                            registry_raw: Some(raw),
                            source: RdapSource::Registrar,
                        });
                    }
                    Err(e) => {
                        debug!(url = %url, error = %e, "Registrar RDAP failed, keeping registry answer");
                    }
                }
            }
        }

        Ok(RdapOutcome {
            json,
            raw,
            registry_raw: None,
            source: RdapSource::Registry,
        })
    }

    /// GET one RDAP URL. Any non-2xx status or non-object body is an error.
    async fn fetch(&self, url: &str) -> Result<(String, Value), LookupError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, RDAP_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::network(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        let json: Value = serde_json::from_str(&body)?;
        if !json.is_object() {
            return Err(LookupError::parse("RDAP response is not a JSON object"));
        }

        Ok((body, json))
    }

    fn map_request_error(&self, url: &str, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::timeout(format!("RDAP request to {}", url), self.timeout)
        } else {
            LookupError::from(err)
        }
    }
}

/// Find the sponsoring registrar's RDAP link in a registry answer.
///
/// Looks at top-level `links` first, then at the links of the entity with
/// the `registrar` role. Only `rel: related` links typed as RDAP JSON count;
/// a title mentioning the sponsoring registrar is preferred.
pub fn find_registrar_link(json: &Value) -> Option<String> {
    if let Some(href) = related_rdap_link(json.get("links")) {
        return Some(href);
    }

    json.get("entities")
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
        .filter(|entity| has_role(entity, "registrar"))
        .find_map(|entity| related_rdap_link(entity.get("links")))
}

fn related_rdap_link(links: Option<&Value>) -> Option<String> {
    let links = links?.as_array()?;

    let candidates: Vec<&Value> = links
        .iter()
        .filter(|link| {
            let rel = link.get("rel").and_then(|r| r.as_str()).unwrap_or_default();
            let media = link.get("type").and_then(|t| t.as_str()).unwrap_or_default();
            rel.eq_ignore_ascii_case("related")
                && media.to_lowercase().contains(RDAP_CONTENT_TYPE)
                && link.get("href").and_then(|h| h.as_str()).is_some()
        })
        .collect();

    let sponsoring = candidates.iter().find(|link| {
        link.get("title")
            .and_then(|t| t.as_str())
            .map(|t| t.to_lowercase().contains("sponsoring registrar"))
            .unwrap_or(false)
    });

    sponsoring
        .or(candidates.first())
        .and_then(|link| link.get("href"))
        .and_then(|h| h.as_str())
        .map(String::from)
}

pub(crate) fn has_role(entity: &Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(|r| r.as_array())
        .map(|roles| {
            roles
                .iter()
                .filter_map(|r| r.as_str())
                .any(|r| r.eq_ignore_ascii_case(role))
        })
        .unwrap_or(false)
}

/// A link that already addresses a domain object is used as-is; anything
/// else is treated as a service base URL.
fn registrar_query_url(href: &str, domain: &str) -> String {
    if href.contains("/domain/") {
        href.to_string()
    } else {
        rdap_domain_url(href, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_registrar_link_top_level() {
        let json = json!({
            "links": [
                {"rel": "self", "type": "application/rdap+json",
                 "href": "https://rdap.verisign.com/com/v1/domain/EXAMPLE.COM"},
                {"rel": "related", "type": "application/rdap+json",
                 "href": "https://rdap.registrar.example/domain/EXAMPLE.COM"}
            ]
        });
        assert_eq!(
            find_registrar_link(&json),
            Some("https://rdap.registrar.example/domain/EXAMPLE.COM".to_string())
        );
    }

    #[test]
    fn test_find_registrar_link_prefers_sponsoring_title() {
        let json = json!({
            "links": [
                {"rel": "related", "type": "application/rdap+json",
                 "href": "https://other.example/rdap"},
                {"rel": "related", "type": "application/rdap+json",
                 "title": "URL of Sponsoring Registrar's RDAP Record",
                 "href": "https://rdap.registrar.example/domain/EXAMPLE.COM"}
            ]
        });
        assert_eq!(
            find_registrar_link(&json),
            Some("https://rdap.registrar.example/domain/EXAMPLE.COM".to_string())
        );
    }

    #[test]
    fn test_find_registrar_link_from_registrar_entity() {
        let json = json!({
            "links": [
                {"rel": "related", "type": "text/html", "href": "https://registrar.example/"}
            ],
            "entities": [
                {"roles": ["technical"], "links": [
                    {"rel": "related", "type": "application/rdap+json", "href": "https://wrong.example"}
                ]},
                {"roles": ["registrar"], "links": [
                    {"rel": "related", "type": "application/rdap+json", "href": "https://rdap.registrar.example"}
                ]}
            ]
        });
        assert_eq!(
            find_registrar_link(&json),
            Some("https://rdap.registrar.example".to_string())
        );
    }

    #[test]
    fn test_find_registrar_link_none() {
        assert_eq!(find_registrar_link(&json!({"ldhName": "EXAMPLE.COM"})), None);
        assert_eq!(find_registrar_link(&json!({"links": "garbage"})), None);
    }

    #[test]
    fn test_registrar_query_url() {
        assert_eq!(
            registrar_query_url("https://rdap.registrar.example/domain/EXAMPLE.COM", "example.com"),
            "https://rdap.registrar.example/domain/EXAMPLE.COM"
        );
        assert_eq!(
            registrar_query_url("https://rdap.registrar.example/", "example.com"),
            "https://rdap.registrar.example/domain/example.com"
        );
    }

    #[tokio::test]
    async fn test_no_server_found_for_unknown_tld() {
        let config = LookupConfig::default().with_bootstrap(false);
        let directory = Arc::new(BootstrapDirectory::new(&config).unwrap());
        let client = RdapClient::new(&config, directory).unwrap();

        let err = client
            .query_domain("example.zz", RdapSource::Registrar)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NoServerFound { ref tld } if tld == "zz"));
    }
}
