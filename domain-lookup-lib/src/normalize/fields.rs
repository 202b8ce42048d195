//! Declarative WHOIS label table.
//!
//! Registries label the same datum in many ways ("Registry Expiry Date",
//! "Expiration Time", "paid-till", "到期时间"). Each canonical field lists
//! the labels that map onto it; contact labels are generated from role
//! prefixes crossed with field suffixes.

use crate::types::{Contact, ContactRole};
use std::collections::HashMap;

/// Per-contact attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Organization,
    Email,
    Phone,
    Country,
}

impl ContactField {
    /// Set this attribute on `contact` unless it already has a value.
    pub fn fill(self, contact: &mut Contact, value: &str) {
        let slot = match self {
            Self::Name => &mut contact.name,
            Self::Organization => &mut contact.organization,
            Self::Email => &mut contact.email,
            Self::Phone => &mut contact.phone,
            Self::Country => &mut contact.country,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
}

/// Canonical record field a WHOIS label maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    DomainName,
    RegistryDomainId,
    Registrar,
    RegistrarIanaId,
    RegistrarWhoisServer,
    RegistrarAbuseEmail,
    RegistrarAbusePhone,
    CreationDate,
    ExpirationDate,
    UpdatedDate,
    NameServer,
    Status,
    Dnssec,
    Contact(ContactRole, ContactField),
}

const FIELD_LABELS: &[(FieldKey, &[&str])] = &[
    (
        FieldKey::DomainName,
        &["domain name", "domain", "domain name (ascii)", "nom de domaine", "域名"],
    ),
    (
        FieldKey::RegistryDomainId,
        &["registry domain id", "roid", "domain id", "domain roid"],
    ),
    (
        FieldKey::Registrar,
        &[
            "registrar",
            "registrar name",
            "sponsoring registrar",
            "registrar organization",
            "注册商",
            "所属注册机构",
        ],
    ),
    (
        FieldKey::RegistrarIanaId,
        &["registrar iana id", "sponsoring registrar iana id"],
    ),
    (
        FieldKey::RegistrarWhoisServer,
        &["registrar whois server", "whois server", "whois"],
    ),
    (
        FieldKey::RegistrarAbuseEmail,
        &["registrar abuse contact email", "abuse contact email"],
    ),
    (
        FieldKey::RegistrarAbusePhone,
        &["registrar abuse contact phone", "abuse contact phone"],
    ),
    (
        FieldKey::CreationDate,
        &[
            "creation date",
            "created",
            "created on",
            "created date",
            "domain registration date",
            "registration date",
            "registration time",
            "registered",
            "registered on",
            "注册时间",
            "登録年月日",
        ],
    ),
    (
        FieldKey::ExpirationDate,
        &[
            "registry expiry date",
            "registrar registration expiration date",
            "expiration date",
            "expiration time",
            "expiry date",
            "expire date",
            "expires",
            "expires on",
            "paid-till",
            "renewal date",
            "到期时间",
            "有効期限",
        ],
    ),
    (
        FieldKey::UpdatedDate,
        &[
            "updated date",
            "last updated",
            "last update",
            "last modified",
            "modified",
            "changed",
            "更新时间",
            "最終更新",
        ],
    ),
    (
        FieldKey::NameServer,
        &[
            "name server",
            "name servers",
            "nameserver",
            "nameservers",
            "nserver",
            "host name",
            "域名服务器",
            "ネームサーバ",
        ],
    ),
    (
        FieldKey::Status,
        &["domain status", "status", "域名状态", "状態"],
    ),
    (FieldKey::Dnssec, &["dnssec", "dnssec status"]),
];

const ROLE_PREFIXES: &[(ContactRole, &[&str])] = &[
    (ContactRole::Registrant, &["registrant", "registrant contact"]),
    (
        ContactRole::Admin,
        &["admin", "administrative", "admin contact", "administrative contact"],
    ),
    (
        ContactRole::Tech,
        &["tech", "technical", "tech contact", "technical contact"],
    ),
    (ContactRole::Billing, &["billing", "billing contact"]),
];

const CONTACT_SUFFIXES: &[(ContactField, &[&str])] = &[
    (ContactField::Name, &["name"]),
    (
        ContactField::Organization,
        &["organization", "organisation", "org"],
    ),
    (ContactField::Email, &["email", "e-mail"]),
    (ContactField::Phone, &["phone", "phone number"]),
    (ContactField::Country, &["country", "country code"]),
];

/// Localized contact labels that do not follow the prefix/suffix pattern.
const CONTACT_LABELS: &[(ContactRole, ContactField, &str)] = &[
    (ContactRole::Registrant, ContactField::Name, "registrant"),
    (ContactRole::Registrant, ContactField::Name, "注册人"),
    (ContactRole::Registrant, ContactField::Name, "所有者"),
    (ContactRole::Registrant, ContactField::Email, "注册人联系邮箱"),
    (ContactRole::Registrant, ContactField::Name, "登録者名"),
];

lazy_static::lazy_static! {
    static ref LABEL_INDEX: HashMap<String, FieldKey> = build_index();
}

fn build_index() -> HashMap<String, FieldKey> {
    let mut index = HashMap::new();

    for (key, labels) in FIELD_LABELS {
        for label in labels.iter() {
            index.insert(label.to_string(), *key);
        }
    }

    for (role, prefixes) in ROLE_PREFIXES {
        for prefix in prefixes.iter() {
            for (field, suffixes) in CONTACT_SUFFIXES {
                for suffix in suffixes.iter() {
                    index
                        .entry(format!("{} {}", prefix, suffix))
                        .or_insert(FieldKey::Contact(*role, *field));
                }
            }
        }
    }

    for (role, field, label) in CONTACT_LABELS {
        index
            .entry(label.to_string())
            .or_insert(FieldKey::Contact(*role, *field));
    }

    index
}

/// Map a raw WHOIS label to its canonical field.
///
/// Matching ignores case, repeated whitespace and trailing dots
/// (`"Registrar.........:"` style padding).
pub fn lookup_label(label: &str) -> Option<FieldKey> {
    let key = label
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    LABEL_INDEX.get(&key).copied()
}
