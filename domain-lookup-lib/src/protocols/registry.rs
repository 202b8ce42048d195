//! Built-in RDAP and WHOIS server tables.
//!
//! These tables are consulted before any network discovery. The RDAP table
//! holds base URLs (without the trailing `/domain/` segment); the WHOIS table
//! covers generic TLDs, country codes live in [`super::authority`].

use std::collections::HashMap;

lazy_static::lazy_static! {
    /// TLD -> RDAP base URL for registries with known working endpoints.
    static ref RDAP_BASE_URLS: HashMap<&'static str, &'static str> = HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1"),
        ("net", "https://rdap.verisign.com/net/v1"),
        ("org", "https://rdap.publicinterestregistry.org/rdap"),
        ("info", "https://rdap.identitydigital.services/rdap"),
        ("biz", "https://rdap.nic.biz"),
        // Google registry
        ("app", "https://pubapi.registry.google/rdap"),
        ("dev", "https://pubapi.registry.google/rdap"),
        ("page", "https://pubapi.registry.google/rdap"),
        // CentralNic
        ("xyz", "https://rdap.centralnic.com/xyz"),
        ("tech", "https://rdap.centralnic.com/tech"),
        ("online", "https://rdap.centralnic.com/online"),
        ("site", "https://rdap.centralnic.com/site"),
        ("website", "https://rdap.centralnic.com/website"),
        ("blog", "https://rdap.blog.fury.ca/rdap"),
        ("shop", "https://rdap.gmoregistry.net/rdap"),
        // Identity Digital
        ("ai", "https://rdap.identitydigital.services/rdap"),
        ("io", "https://rdap.identitydigital.services/rdap"),
        ("me", "https://rdap.identitydigital.services/rdap"),
        ("zone", "https://rdap.identitydigital.services/rdap"),
        ("digital", "https://rdap.identitydigital.services/rdap"),
        // ccTLDs with working RDAP
        ("us", "https://rdap.nic.us"),
        ("uk", "https://rdap.nominet.uk"),
        ("de", "https://rdap.denic.de"),
        ("ca", "https://rdap.ca.fury.ca/rdap"),
        ("au", "https://rdap.cctld.au/rdap"),
        ("fr", "https://rdap.nic.fr"),
        ("nl", "https://rdap.sidn.nl"),
        ("br", "https://rdap.registro.br"),
        ("in", "https://rdap.nixiregistry.in/rdap"),
        ("tv", "https://rdap.nic.tv"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1"),
        ("cloud", "https://rdap.registry.cloud/rdap"),
    ]);

    /// TLD -> registry WHOIS host for generic TLDs.
    static ref GTLD_WHOIS_SERVERS: HashMap<&'static str, &'static str> = HashMap::from([
        ("com", "whois.verisign-grs.com"),
        ("net", "whois.verisign-grs.com"),
        ("org", "whois.pir.org"),
        ("info", "whois.afilias.net"),
        ("biz", "whois.biz"),
        ("name", "whois.nic.name"),
        ("mobi", "whois.afilias.net"),
        ("pro", "whois.registrypro.pro"),
        ("aero", "whois.aero"),
        ("asia", "whois.nic.asia"),
        ("cat", "whois.nic.cat"),
        ("coop", "whois.nic.coop"),
        ("edu", "whois.educause.edu"),
        ("gov", "whois.dotgov.gov"),
        ("int", "whois.iana.org"),
        ("jobs", "whois.nic.jobs"),
        ("museum", "whois.museum"),
        ("tel", "whois.nic.tel"),
        ("travel", "whois.nic.travel"),
        ("xxx", "whois.nic.xxx"),
        ("app", "whois.nic.google"),
        ("dev", "whois.nic.google"),
        ("page", "whois.nic.google"),
        ("blog", "whois.nic.blog"),
        ("cloud", "whois.nic.cloud"),
        ("xyz", "whois.nic.xyz"),
        ("online", "whois.nic.online"),
        ("site", "whois.nic.site"),
        ("tech", "whois.nic.tech"),
        ("store", "whois.nic.store"),
        ("shop", "whois.nic.shop"),
        ("website", "whois.nic.website"),
        ("space", "whois.nic.space"),
        ("world", "whois.nic.world"),
        ("email", "whois.nic.email"),
        ("digital", "whois.nic.digital"),
        ("network", "whois.nic.network"),
        ("agency", "whois.nic.agency"),
        ("company", "whois.nic.company"),
        ("solutions", "whois.nic.solutions"),
        ("software", "whois.nic.software"),
        ("studio", "whois.nic.studio"),
        ("design", "whois.nic.design"),
        ("media", "whois.nic.media"),
        ("live", "whois.nic.live"),
        ("news", "whois.nic.news"),
        ("life", "whois.nic.life"),
        ("art", "whois.nic.art"),
        ("music", "whois.nic.music"),
        ("games", "whois.nic.games"),
        ("fun", "whois.nic.fun"),
        ("zone", "whois.nic.zone"),
        ("top", "whois.nic.top"),
        ("icu", "whois.nic.icu"),
        ("club", "whois.nic.club"),
        ("link", "whois.nic.link"),
        ("click", "whois.nic.click"),
        ("wiki", "whois.nic.wiki"),
    ]);
}

/// Built-in RDAP base URL for a TLD, if one is known.
pub fn builtin_rdap_base(tld: &str) -> Option<&'static str> {
    RDAP_BASE_URLS.get(tld.to_lowercase().as_str()).copied()
}

/// Registry WHOIS host for a generic TLD, if one is known.
pub fn gtld_whois_server(tld: &str) -> Option<&'static str> {
    GTLD_WHOIS_SERVERS.get(tld.to_lowercase().as_str()).copied()
}

/// Build the RDAP domain query URL for `domain` under a server base URL.
///
/// `https://rdap.example/v1/` and `https://rdap.example/v1` produce the same URL.
pub fn rdap_domain_url(base: &str, domain: &str) -> String {
    format!("{}/domain/{}", base.trim_end_matches('/'), domain)
}
