//! WHOIS text -> [`NormalizedRecord`].

use super::fields::{lookup_label, FieldKey};
use crate::types::{DataSource, NormalizedRecord};
use crate::utils::slugify;

/// Normalize free-text WHOIS output.
///
/// Never fails: text without recognizable `key: value` lines yields a record
/// that only carries the raw text.
pub fn normalize_whois(text: &str, source: DataSource) -> NormalizedRecord {
    let mut record = NormalizedRecord::empty(text.to_string(), source);

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        let line = line
            .trim_start_matches(">>>")
            .trim_end_matches("<<<")
            .trim();

        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }

        match lookup_label(key) {
            Some(field) => apply(&mut record, field, value),
            None => {
                let slug = slugify(key);
                if !slug.is_empty() {
                    record
                        .extra
                        .entry(slug)
                        .or_default()
                        .push(value.to_string());
                }
            }
        }
    }

    record
}

/// Split at the first ASCII or full-width colon.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(|c: char| c == ':' || c == '：')?;
    let sep_len = line[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
    Some((line[..pos].trim(), line[pos + sep_len..].trim()))
}

fn apply(record: &mut NormalizedRecord, field: FieldKey, value: &str) {
    fn first(slot: &mut Option<String>, value: &str) {
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    match field {
        FieldKey::DomainName => first(&mut record.domain_name, &value.to_uppercase()),
        FieldKey::RegistryDomainId => first(&mut record.registry_domain_id, value),
        FieldKey::Registrar => first(&mut record.registrar, value),
        FieldKey::RegistrarIanaId => first(&mut record.registrar_iana_id, value),
        FieldKey::RegistrarWhoisServer => first(&mut record.registrar_whois_server, value),
        FieldKey::RegistrarAbuseEmail => first(&mut record.registrar_abuse_email, value),
        FieldKey::RegistrarAbusePhone => first(&mut record.registrar_abuse_phone, value),
        FieldKey::CreationDate => first(&mut record.creation_date, value),
        FieldKey::ExpirationDate => first(&mut record.expiration_date, value),
        FieldKey::UpdatedDate => first(&mut record.updated_date, value),
        FieldKey::Dnssec => first(&mut record.dnssec, value),
        FieldKey::NameServer => {
            // "ns1.example.de 192.0.2.1" style lines carry glue after the host
            if let Some(host) = value.split_whitespace().next() {
                let host = host.trim_end_matches('.').to_lowercase();
                if !record.name_servers.contains(&host) {
                    record.name_servers.push(host);
                }
            }
        }
        FieldKey::Status => {
            let status = strip_status_url(value);
            if !status.is_empty() {
                record.status.push(status);
            }
        }
        FieldKey::Contact(role, attr) => {
            let slot = record.contact_slot(role);
            attr.fill(slot.get_or_insert_with(Default::default), value);
        }
    }
}

/// `"clientTransferProhibited https://icann.org/epp#clientTransferProhibited"`
/// -> `"clientTransferProhibited"`.
fn strip_status_url(value: &str) -> String {
    value
        .split_whitespace()
        .take_while(|token| {
            let token = token.trim_start_matches('(');
            !(token.starts_with("http://") || token.starts_with("https://"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
