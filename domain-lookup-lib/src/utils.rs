//! Utility functions for query normalization and validation.
//!
//! Every query is reduced to one ASCII form before it touches the cache or
//! the network, so `München.de`, `https://xn--mnchen-3ya.de/path` and
//! `xn--mnchen-3ya.de` all resolve to the same entry.

use crate::error::LookupError;

/// Normalize a user-supplied query into an ASCII (punycode) domain name.
///
/// Strips surrounding whitespace, a URL scheme, any path/query/fragment, a
/// port, a trailing dot and a leading `www.` label, then applies IDNA
/// mapping and validates the result.
pub fn normalize_query(query: &str) -> Result<String, LookupError> {
    let original = query;
    let mut host = query.trim();

    if host.is_empty() {
        return Err(LookupError::invalid_domain(
            original,
            "Domain name cannot be empty",
        ));
    }

    if let Some(pos) = host.find("://") {
        host = &host[pos + 3..];
    }
    if let Some(end) = host.find(&['/', '?', '#'][..]) {
        host = &host[..end];
    }
    if let Some(at) = host.rfind('@') {
        host = &host[at + 1..];
    }
    if let Some(colon) = host.rfind(':') {
        if host[colon + 1..].chars().all(|c| c.is_ascii_digit()) {
            host = &host[..colon];
        }
    }
    let host = host.trim_end_matches('.');

    let ascii = idna::domain_to_ascii_cow(host.as_bytes(), idna::AsciiDenyList::URL)
        .map_err(|_| LookupError::invalid_domain(original, "Not a valid internationalized name"))?
        .to_lowercase();

    let ascii = match ascii.strip_prefix("www.") {
        Some(rest) if rest.contains('.') => rest.to_string(),
        _ => ascii,
    };

    validate_domain(&ascii).map_err(|reason| LookupError::invalid_domain(original, reason))?;
    Ok(ascii)
}

/// Check an already-ASCII domain name, returning the reason it is rejected.
fn validate_domain(domain: &str) -> Result<(), &'static str> {
    if domain.is_empty() {
        return Err("Domain name cannot be empty");
    }
    if domain.len() > 253 {
        return Err("Domain name is longer than 253 characters");
    }
    if !domain.contains('.') {
        return Err("Domain name must include a TLD");
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err("Domain name contains an empty label");
        }
        if label.len() > 63 {
            return Err("Label is longer than 63 characters");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("Label cannot start or end with a hyphen");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("Label contains invalid characters");
        }
    }

    let tld = extract_tld(domain).unwrap_or_default();
    if !(tld.starts_with("xn--") || tld.chars().all(|c| c.is_ascii_alphabetic())) {
        return Err("TLD must be alphabetic");
    }

    Ok(())
}

/// Last label of a domain, lower-cased. `None` when there is no dot.
pub fn extract_tld(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_end_matches('.');
    let (_, tld) = domain.rsplit_once('.')?;
    if tld.is_empty() {
        None
    } else {
        Some(tld.to_lowercase())
    }
}

/// Normalize a bare TLD argument (`.COM`, ` de `) for table lookups.
pub fn normalize_tld(tld: &str) -> String {
    tld.trim().trim_start_matches('.').to_lowercase()
}

/// Slug-case a free-form WHOIS label, e.g. `"Registrar URL"` → `registrar-url`.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;

    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
