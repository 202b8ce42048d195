//! RDAP JSON -> [`NormalizedRecord`].
//!
//! Entities are classified once into an [`EntityIndex`] keyed by role, then
//! each canonical field reads from the index instead of re-scanning the
//! entity tree.

use crate::types::{Contact, ContactRole, DataSource, NormalizedRecord, RdapSource};
use serde_json::Value;
use std::collections::HashMap;

/// Entity roles the normalizer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    Registrant,
    Administrative,
    Technical,
    Billing,
    Registrar,
    Abuse,
}

impl EntityRole {
    fn parse(role: &str) -> Option<Self> {
        match role.to_ascii_lowercase().as_str() {
            "registrant" => Some(Self::Registrant),
            "administrative" => Some(Self::Administrative),
            "technical" => Some(Self::Technical),
            "billing" => Some(Self::Billing),
            "registrar" => Some(Self::Registrar),
            "abuse" => Some(Self::Abuse),
            _ => None,
        }
    }

    fn contact_role(self) -> Option<ContactRole> {
        match self {
            Self::Registrant => Some(ContactRole::Registrant),
            Self::Administrative => Some(ContactRole::Admin),
            Self::Technical => Some(ContactRole::Tech),
            Self::Billing => Some(ContactRole::Billing),
            Self::Registrar | Self::Abuse => None,
        }
    }
}

/// Role -> entities carrying that role, level by level.
///
/// Top-level entities are indexed before any nested ones, so a contact
/// hanging off the registrar entity never shadows the domain's own contact
/// with the same role.
#[derive(Debug, Default)]
pub struct EntityIndex<'a> {
    by_role: HashMap<EntityRole, Vec<&'a Value>>,
}

impl<'a> EntityIndex<'a> {
    pub fn build(json: &'a Value) -> Self {
        let mut index = Self::default();
        let mut level: Vec<&'a Value> = children(json).collect();

        while !level.is_empty() {
            let mut next = Vec::new();
            for entity in level {
                index.add(entity);
                next.extend(children(entity));
            }
            level = next;
        }

        index
    }

    fn add(&mut self, entity: &'a Value) {
        let roles = entity
            .get("roles")
            .and_then(|r| r.as_array())
            .into_iter()
            .flatten()
            .filter_map(|r| r.as_str())
            .filter_map(EntityRole::parse);

        for role in roles {
            self.by_role.entry(role).or_default().push(entity);
        }
    }

    /// First entity with the given role.
    pub fn first(&self, role: EntityRole) -> Option<&'a Value> {
        self.by_role.get(&role).and_then(|v| v.first()).copied()
    }
}

/// Entities listed directly under `value`.
fn children(value: &Value) -> impl Iterator<Item = &Value> {
    value
        .get("entities")
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
}

/// Flattened jCard (`vcardArray`) properties we map.
#[derive(Debug, Default, PartialEq, Eq)]
struct Card {
    name: Option<String>,
    organization: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    country: Option<String>,
}

impl Card {
    /// Decode an entity's `vcardArray`. Missing or malformed cards decode empty.
    fn from_entity(entity: &Value) -> Self {
        let mut card = Self::default();

        let properties = entity
            .get("vcardArray")
            .and_then(|v| v.as_array())
            .and_then(|a| a.get(1))
            .and_then(|a| a.as_array());

        for property in properties.into_iter().flatten() {
            let Some(items) = property.as_array() else {
                continue;
            };
            if items.len() < 4 {
                continue;
            }
            let Some(name) = items[0].as_str() else {
                continue;
            };
            let value = &items[3];

            match name.to_ascii_lowercase().as_str() {
                "fn" => set_once(&mut card.name, text_value(value)),
                "org" => set_once(&mut card.organization, text_value(value)),
                "email" => set_once(&mut card.email, text_value(value)),
                "tel" => set_once(
                    &mut card.phone,
                    text_value(value).map(|t| t.trim_start_matches("tel:").to_string()),
                ),
                "adr" => set_once(
                    &mut card.country,
                    value
                        .as_array()
                        .and_then(|parts| parts.get(6))
                        .and_then(text_value),
                ),
                _ => {}
            }
        }

        card
    }

    fn into_contact(self) -> Option<Contact> {
        let contact = Contact {
            name: self.name,
            organization: self.organization,
            email: self.email,
            phone: self.phone,
            country: self.country,
        };
        if contact.is_empty() {
            None
        } else {
            Some(contact)
        }
    }
}

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// jCard text values are strings, or arrays whose first string is used.
fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.as_str())
            .map(str::trim)
            .find(|s| !s.is_empty())?
            .to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn str_field(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Event families. Checked in this order, so "registration expiration"
/// counts as an expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Expiration,
    Updated,
    Created,
}

fn classify_event(action: &str) -> Option<EventKind> {
    let action = action.trim().to_lowercase();
    if action.contains("expir") {
        Some(EventKind::Expiration)
    } else if action.contains("last changed")
        || action.contains("last update")
        || action == "update"
        || action == "updated"
    {
        Some(EventKind::Updated)
    } else if action.contains("registration") || action.contains("created") || action.contains("create") {
        Some(EventKind::Created)
    } else {
        None
    }
}

/// IANA registrar id from `publicIds`, preferring an entry typed as IANA.
fn iana_id(entity: &Value) -> Option<String> {
    let ids = entity.get("publicIds")?.as_array()?;
    let typed = ids.iter().find(|id| {
        id.get("type")
            .and_then(|t| t.as_str())
            .map(|t| t.to_lowercase().contains("iana"))
            .unwrap_or(false)
    });
    typed
        .or_else(|| ids.first())
        .and_then(|id| str_field(id, "identifier"))
}

/// Normalize an RDAP domain object.
///
/// Never fails: fields that are missing or malformed are left absent.
pub fn normalize_rdap(json: &Value, raw: String, source: RdapSource) -> NormalizedRecord {
    let mut record = NormalizedRecord::empty(raw, DataSource::from(source));
    let index = EntityIndex::build(json);

    record.domain_name = str_field(json, "ldhName")
        .or_else(|| str_field(json, "unicodeName"))
        .map(|d| d.to_uppercase());
    record.registry_domain_id = str_field(json, "handle");
    record.registrar_whois_server = str_field(json, "port43");

    if let Some(registrar) = index.first(EntityRole::Registrar) {
        let card = Card::from_entity(registrar);
        record.registrar = card.name.or_else(|| str_field(registrar, "handle"));
        record.registrar_iana_id = iana_id(registrar);
    }

    if let Some(abuse) = index.first(EntityRole::Abuse) {
        let card = Card::from_entity(abuse);
        record.registrar_abuse_email = card.email;
        record.registrar_abuse_phone = card.phone;
    }

    for role in [
        EntityRole::Registrant,
        EntityRole::Administrative,
        EntityRole::Technical,
        EntityRole::Billing,
    ] {
        let (Some(entity), Some(contact_role)) = (index.first(role), role.contact_role()) else {
            continue;
        };
        *record.contact_slot(contact_role) = Card::from_entity(entity).into_contact();
    }

    for event in json
        .get("events")
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
    {
        let (Some(action), Some(date)) = (str_field(event, "eventAction"), str_field(event, "eventDate"))
        else {
            continue;
        };
        let slot = match classify_event(&action) {
            Some(EventKind::Expiration) => &mut record.expiration_date,
            Some(EventKind::Updated) => &mut record.updated_date,
            Some(EventKind::Created) => &mut record.creation_date,
            None => continue,
        };
        set_once(slot, Some(date));
    }

    record.status = json
        .get("status")
        .and_then(|s| s.as_array())
        .into_iter()
        .flatten()
        .filter_map(|s| s.as_str())
        .map(String::from)
        .collect();

    for ns in json
        .get("nameservers")
        .and_then(|n| n.as_array())
        .into_iter()
        .flatten()
    {
        if let Some(host) = str_field(ns, "ldhName") {
            let host = host.trim_end_matches('.').to_lowercase();
            if !record.name_servers.contains(&host) {
                record.name_servers.push(host);
            }
        }
    }

    record.dnssec = json
        .get("secureDNS")
        .and_then(|s| s.get("delegationSigned"))
        .and_then(|d| d.as_bool())
        .map(|signed| {
            if signed {
                "signedDelegation".to_string()
            } else {
                "unsigned".to_string()
            }
        });

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "objectClassName": "domain",
            "handle": "2336799_DOMAIN_COM-VRSN",
            "ldhName": "example.com",
            "port43": "whois.registrar.example",
            "status": ["client delete prohibited", "client transfer prohibited"],
            "events": [
                {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
                {"eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z"},
                {"eventAction": "last changed", "eventDate": "2024-08-14T07:01:34Z"},
                {"eventAction": "last update of RDAP database", "eventDate": "2024-09-01T12:00:00Z"}
            ],
            "nameservers": [
                {"objectClassName": "nameserver", "ldhName": "A.IANA-SERVERS.NET"},
                {"objectClassName": "nameserver", "ldhName": "B.IANA-SERVERS.NET"}
            ],
            "secureDNS": {"delegationSigned": true},
            "entities": [
                {
                    "objectClassName": "entity",
                    "handle": "376",
                    "roles": ["registrar"],
                    "publicIds": [{"type": "IANA Registrar ID", "identifier": "376"}],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "Example Registrar, Inc."]
                    ]],
                    "entities": [{
                        "roles": ["abuse"],
                        "vcardArray": ["vcard", [
                            ["version", {}, "text", "4.0"],
                            ["fn", {}, "text", ""],
                            ["tel", {"type": "voice"}, "uri", "tel:+1.5555550100"],
                            ["email", {}, "text", "abuse@registrar.example"]
                        ]]
                    }]
                },
                {
                    "roles": ["registrant", "administrative"],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "Jane Doe"],
                        ["org", {}, "text", "Example Org"],
                        ["adr", {}, "text", ["", "", "1 Main St", "Springfield", "IL", "62701", "US"]],
                        ["email", {}, "text", "jane@example.com"]
                    ]]
                }
            ]
        })
    }

    #[test]
    fn test_normalize_core_fields() {
        let json = sample();
        let record = normalize_rdap(&json, json.to_string(), RdapSource::Registry);

        assert_eq!(record.domain_name.as_deref(), Some("EXAMPLE.COM"));
        assert_eq!(
            record.registry_domain_id.as_deref(),
            Some("2336799_DOMAIN_COM-VRSN")
        );
        assert_eq!(record.registrar.as_deref(), Some("Example Registrar, Inc."));
        assert_eq!(record.registrar_iana_id.as_deref(), Some("376"));
        assert_eq!(
            record.registrar_whois_server.as_deref(),
            Some("whois.registrar.example")
        );
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(record.expiration_date.as_deref(), Some("2025-08-13T04:00:00Z"));
        assert_eq!(record.updated_date.as_deref(), Some("2024-08-14T07:01:34Z"));
        assert_eq!(
            record.status,
            vec!["client delete prohibited", "client transfer prohibited"]
        );
        assert_eq!(
            record.name_servers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert_eq!(record.dnssec.as_deref(), Some("signedDelegation"));
        assert_eq!(record.data_source, DataSource::RdapRegistry);
    }

    #[test]
    fn test_nested_abuse_contact() {
        let json = sample();
        let record = normalize_rdap(&json, String::new(), RdapSource::Registrar);

        assert_eq!(
            record.registrar_abuse_email.as_deref(),
            Some("abuse@registrar.example")
        );
        assert_eq!(record.registrar_abuse_phone.as_deref(), Some("+1.5555550100"));
        assert_eq!(record.data_source, DataSource::RdapRegistrar);
    }

    #[test]
    fn test_contacts_from_jcard() {
        let json = sample();
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);

        let registrant = record.registrant.as_ref().unwrap();
        assert_eq!(registrant.name.as_deref(), Some("Jane Doe"));
        assert_eq!(registrant.organization.as_deref(), Some("Example Org"));
        assert_eq!(registrant.email.as_deref(), Some("jane@example.com"));
        assert_eq!(registrant.country.as_deref(), Some("US"));
        assert_eq!(record.admin, record.registrant);
        assert!(record.tech.is_none());
        assert!(record.billing.is_none());
    }

    #[test]
    fn test_top_level_contact_beats_nested_registrar_contact() {
        let json = json!({
            "entities": [
                {
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar"]]],
                    "entities": [{
                        "roles": ["technical"],
                        "vcardArray": ["vcard", [["fn", {}, "text", "Registrar NOC"]]]
                    }]
                },
                {
                    "roles": ["technical"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Domain Tech Contact"]]]
                }
            ]
        });
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);

        let tech = record.tech.as_ref().unwrap();
        assert_eq!(tech.name.as_deref(), Some("Domain Tech Contact"));
        assert_eq!(record.registrar.as_deref(), Some("Example Registrar"));
    }

    #[test]
    fn test_nested_contact_used_when_no_top_level_one() {
        let json = json!({
            "entities": [{
                "roles": ["registrar"],
                "entities": [{
                    "roles": ["technical"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Registrar NOC"]]]
                }]
            }]
        });
        let record = normalize_rdap(&json, String::new(), RdapSource::Registrar);
        assert_eq!(
            record.tech.as_ref().and_then(|c| c.name.as_deref()),
            Some("Registrar NOC")
        );
    }

    #[test]
    fn test_name_servers_lowercased_and_deduplicated_in_order() {
        let json = json!({
            "nameservers": [
                {"ldhName": "NS2.EXAMPLE.NET."},
                {"ldhName": "ns1.example.net"},
                {"ldhName": "ns2.example.net"}
            ]
        });
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);
        assert_eq!(record.name_servers, vec!["ns2.example.net", "ns1.example.net"]);
    }

    #[test]
    fn test_first_event_per_family_wins() {
        let json = json!({
            "events": [
                {"eventAction": "last update of RDAP database", "eventDate": "2024-09-01"},
                {"eventAction": "last changed", "eventDate": "2024-08-14"},
                {"eventAction": "Registration", "eventDate": "2001-01-01"},
                {"eventAction": "reregistration", "eventDate": "2010-01-01"},
                {"eventAction": "registrar expiration", "eventDate": "2030-01-01"},
                {"eventAction": "transfer", "eventDate": "2015-01-01"}
            ]
        });
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);

        assert_eq!(record.updated_date.as_deref(), Some("2024-09-01"));
        assert_eq!(record.creation_date.as_deref(), Some("2001-01-01"));
        assert_eq!(record.expiration_date.as_deref(), Some("2030-01-01"));
    }

    #[test]
    fn test_classify_event() {
        assert_eq!(classify_event("expiration"), Some(EventKind::Expiration));
        assert_eq!(
            classify_event("registration expiration"),
            Some(EventKind::Expiration)
        );
        assert_eq!(classify_event("Last Changed"), Some(EventKind::Updated));
        assert_eq!(classify_event("updated"), Some(EventKind::Updated));
        assert_eq!(classify_event("created"), Some(EventKind::Created));
        assert_eq!(classify_event("transfer"), None);
    }

    #[test]
    fn test_registrar_falls_back_to_handle() {
        let json = json!({
            "entities": [{"roles": ["registrar"], "handle": "REG-123"}]
        });
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);
        assert_eq!(record.registrar.as_deref(), Some("REG-123"));
    }

    #[test]
    fn test_unsigned_dnssec() {
        let json = json!({"secureDNS": {"delegationSigned": false}});
        let record = normalize_rdap(&json, String::new(), RdapSource::Registry);
        assert_eq!(record.dnssec.as_deref(), Some("unsigned"));
    }

    #[test]
    fn test_malformed_json_degrades() {
        let json = json!({
            "ldhName": 42,
            "entities": "nope",
            "events": [{"eventAction": "registration"}, "junk"],
            "nameservers": [{"ldhName": null}],
            "status": [1, 2]
        });
        let record = normalize_rdap(&json, "raw".to_string(), RdapSource::Registry);

        assert!(record.is_sparse());
        assert_eq!(record.raw, "raw");
        assert!(record.registrant.is_none());
    }

    #[test]
    fn test_entity_index_depth_first() {
        let json = sample();
        let index = EntityIndex::build(&json);

        assert!(index.first(EntityRole::Registrar).is_some());
        assert!(index.first(EntityRole::Abuse).is_some());
        assert!(index.first(EntityRole::Technical).is_none());
        assert_eq!(
            index.first(EntityRole::Registrant),
            index.first(EntityRole::Administrative)
        );
    }
}
