//! WHOIS protocol over raw TCP (port 43).
//!
//! A WHOIS exchange is one connection: send the query terminated by CRLF,
//! read until the server closes. A single deadline covers connect, write and
//! the whole read. The text helpers in this module classify responses
//! (unregistered, carries contact data) and pull out referral hosts.

use crate::error::LookupError;
use crate::types::LookupConfig;
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Phrases registries use to say a name is not registered.
const UNREGISTERED_PATTERNS: &[&str] = &[
    "no match for",
    "not found",
    "no entries found",
    "no data found",
    "status: available",
    "domain available",
    "not been registered",
    "no matching record",
    "status: free",
    "no object found",
    "object does not exist",
    "domain not found",
];

lazy_static::lazy_static! {
    static ref REFERRAL_PATTERNS: Vec<Regex> = [
        r"(?im)^\s*Registrar WHOIS Server:[ \t]*(\S+)",
        r"(?im)^\s*WHOIS Server:[ \t]*(\S+)",
        r"(?im)^\s*ReferralServer:[ \t]*(\S+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();

    static ref CONTACT_LINE: Option<Regex> = Regex::new(
        r"(?im)^\s*(registrant|admin|administrative|tech|technical)(\s+contact)?\s+(name|email|e-mail|phone)\s*:[ \t]*\S"
    )
    .ok();
}

/// Raw-socket WHOIS client.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(12),
            port: 43,
        }
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            timeout: config.whois_timeout,
            port: config.whois_port,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Send `query` to `host` and return the full response text.
    ///
    /// `host` may carry an explicit `:port`, otherwise the client's port is
    /// used. On timeout the connection is dropped before the error returns.
    #[instrument(skip(self))]
    pub async fn query(&self, host: &str, query: &str) -> Result<String, LookupError> {
        match tokio::time::timeout(self.timeout, self.exchange(host, query)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(host, "WHOIS query timed out");
                Err(LookupError::timeout(
                    format!("WHOIS query to {}", host),
                    self.timeout,
                ))
            }
        }
    }

    async fn exchange(&self, host: &str, query: &str) -> Result<String, LookupError> {
        let (name, port) = split_host_port(host, self.port);

        let mut stream = TcpStream::connect((name, port))
            .await
            .map_err(|e| LookupError::connection(host, e.to_string()))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|e| LookupError::connection(host, format!("Failed to send query: {}", e)))?;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    response.extend_from_slice(&buf[..n]);
                    if response.len() >= MAX_RESPONSE_SIZE {
                        warn!(host, "WHOIS response exceeds 1 MiB, truncating");
                        response.truncate(MAX_RESPONSE_SIZE);
                        break;
                    }
                }
                Err(e) if !response.is_empty() => {
                    debug!(host, error = %e, "Read error after partial response, keeping it");
                    break;
                }
                Err(e) => {
                    return Err(LookupError::connection(
                        host,
                        format!("Read error: {}", e),
                    ));
                }
            }
        }

        debug!(host, bytes = response.len(), "WHOIS response received");
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    /// Ask the IANA WHOIS service which server is authoritative for `tld`.
    ///
    /// `Ok(None)` means IANA answered but names no server.
    pub async fn discover_whois_server(
        &self,
        iana_host: &str,
        tld: &str,
    ) -> Result<Option<String>, LookupError> {
        let response = self.query(iana_host, tld).await?;
        Ok(parse_iana_refer_response(&response))
    }
}

/// Split an optional `:port` suffix off a host name. IPv6 literals are left alone.
fn split_host_port(host: &str, default_port: u16) -> (&str, u16) {
    if let Some((name, port)) = host.rsplit_once(':') {
        if !name.contains(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (name, port);
            }
        }
    }
    (host, default_port)
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// IANA uses either `refer:` or `whois:`; `refer:` wins when both appear.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() && whois_server.is_none() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}

/// True when the text says the domain is not registered.
pub fn is_unregistered(text: &str) -> bool {
    let lower = text.to_lowercase();
    UNREGISTERED_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Registrar WHOIS host named in a registry response, if any.
///
/// Scheme prefixes (`whois://`, `rwhois://`, `http(s)://`) and a trailing
/// slash are stripped; the host is lower-cased.
pub fn extract_registrar_server(text: &str) -> Option<String> {
    for re in REFERRAL_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let Some(m) = caps.get(1) else {
                continue;
            };
            let server = clean_server(m.as_str());
            if !server.is_empty() && server.contains('.') {
                return Some(server);
            }
        }
    }
    None
}

fn clean_server(raw: &str) -> String {
    let mut server = raw.trim().to_lowercase();
    for scheme in ["rwhois://", "whois://", "https://", "http://"] {
        if let Some(rest) = server.strip_prefix(scheme) {
            server = rest.to_string();
            break;
        }
    }
    server.trim_end_matches('/').to_string()
}

/// True when the text carries a registrant/admin/tech line with a value.
pub fn has_contact_data(text: &str) -> bool {
    CONTACT_LINE
        .as_ref()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
