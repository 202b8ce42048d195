//! Country-code TLD authority table.
//!
//! One entry per ccTLD we know something about: the country, the registry
//! operator, its registry WHOIS host (if it runs one) and whether the
//! registry accepts internationalized names.

use std::collections::HashMap;

/// Static metadata about a country-code TLD registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityEntry {
    pub country_code: &'static str,
    pub country_name: &'static str,
    pub registry: &'static str,
    pub whois_host: Option<&'static str>,
    pub idn: bool,
}

const fn entry(
    country_code: &'static str,
    country_name: &'static str,
    registry: &'static str,
    whois_host: Option<&'static str>,
    idn: bool,
) -> AuthorityEntry {
    AuthorityEntry {
        country_code,
        country_name,
        registry,
        whois_host,
        idn,
    }
}

const AUTHORITIES: &[AuthorityEntry] = &[
    entry("ac", "Ascension Island", "Internet Computer Bureau", Some("whois.nic.ac"), false),
    entry("ae", "United Arab Emirates", "Telecommunications and Digital Government Regulatory Authority", Some("whois.aeda.net.ae"), true),
    entry("ai", "Anguilla", "Government of Anguilla", Some("whois.nic.ai"), false),
    entry("at", "Austria", "nic.at", Some("whois.nic.at"), true),
    entry("au", "Australia", "auDA", Some("whois.auda.org.au"), false),
    entry("be", "Belgium", "DNS Belgium", Some("whois.dns.be"), true),
    entry("br", "Brazil", "NIC.br", Some("whois.registro.br"), true),
    entry("ca", "Canada", "Canadian Internet Registration Authority", Some("whois.cira.ca"), true),
    entry("cc", "Cocos (Keeling) Islands", "eNIC", Some("ccwhois.verisign-grs.com"), true),
    entry("ch", "Switzerland", "SWITCH", None, true),
    entry("cn", "China", "CNNIC", Some("whois.cnnic.cn"), true),
    entry("co", "Colombia", ".CO Internet", Some("whois.nic.co"), false),
    entry("cz", "Czech Republic", "CZ.NIC", Some("whois.nic.cz"), false),
    entry("de", "Germany", "DENIC", Some("whois.denic.de"), true),
    entry("dk", "Denmark", "Punktum dk", Some("whois.punktum.dk"), true),
    entry("es", "Spain", "Red.es", None, true),
    entry("eu", "European Union", "EURid", Some("whois.eu"), true),
    entry("fi", "Finland", "Traficom", Some("whois.fi"), true),
    entry("fr", "France", "AFNIC", Some("whois.nic.fr"), true),
    entry("gg", "Guernsey", "Island Networks", Some("whois.gg"), false),
    entry("hk", "Hong Kong", "HKIRC", Some("whois.hkirc.hk"), true),
    entry("ie", "Ireland", "IE Domain Registry", Some("whois.weare.ie"), false),
    entry("in", "India", "NIXI", Some("whois.registry.in"), true),
    entry("io", "British Indian Ocean Territory", "Internet Computer Bureau", Some("whois.nic.io"), false),
    entry("it", "Italy", "Registro .it", Some("whois.nic.it"), true),
    entry("jp", "Japan", "JPRS", Some("whois.jprs.jp"), true),
    entry("kr", "South Korea", "KISA", Some("whois.kr"), true),
    entry("me", "Montenegro", "doMEn", Some("whois.nic.me"), false),
    entry("mx", "Mexico", "NIC Mexico", Some("whois.mx"), false),
    entry("nl", "Netherlands", "SIDN", Some("whois.domain-registry.nl"), false),
    entry("no", "Norway", "Norid", Some("whois.norid.no"), true),
    entry("nz", "New Zealand", "InternetNZ", Some("whois.irs.net.nz"), true),
    entry("pl", "Poland", "NASK", Some("whois.dns.pl"), true),
    entry("pt", "Portugal", "Associação DNS.PT", Some("whois.dns.pt"), true),
    entry("ru", "Russian Federation", "Coordination Center for TLD RU", Some("whois.tcinet.ru"), false),
    entry("se", "Sweden", "Internetstiftelsen", Some("whois.iis.se"), true),
    entry("sg", "Singapore", "SGNIC", Some("whois.sgnic.sg"), true),
    entry("tv", "Tuvalu", "Verisign", Some("whois.nic.tv"), true),
    entry("tw", "Taiwan", "TWNIC", Some("whois.twnic.net.tw"), true),
    entry("uk", "United Kingdom", "Nominet", Some("whois.nic.uk"), false),
    entry("us", "United States", "Registry Services, LLC", Some("whois.nic.us"), false),
];

lazy_static::lazy_static! {
    static ref AUTHORITY_INDEX: HashMap<&'static str, &'static AuthorityEntry> =
        AUTHORITIES.iter().map(|e| (e.country_code, e)).collect();
}

/// Look up the authority entry for a country-code TLD.
pub fn lookup(tld: &str) -> Option<&'static AuthorityEntry> {
    AUTHORITY_INDEX.get(tld.to_lowercase().as_str()).copied()
}

/// Registry WHOIS host from the ccTLD table.
pub fn whois_host(tld: &str) -> Option<&'static str> {
    lookup(tld).and_then(|e| e.whois_host)
}
