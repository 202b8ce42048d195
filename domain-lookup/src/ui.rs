//! Human-readable output for the domain-lookup CLI.
//!
//! Plain mode prints `Label: value` lines per domain. `--pretty` adds
//! colors, a header, a spinner while a lookup runs and a closing summary.
//! Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use domain_lookup_lib::{Contact, ContactRole, FailureKind, LookupError, ResolveResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or a no-op one when stderr is not a terminal.
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        if !Term::stderr().is_term() {
            return Self {
                running,
                handle: None,
            };
        }

        let running_clone = running.clone();
        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(query_count: usize, source: &str) {
    println!(
        "{} {} {}",
        style("domain-lookup").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- {} quer{} | source: {}",
            query_count,
            if query_count == 1 { "y" } else { "ies" },
            source
        ))
        .dim(),
    );
    println!();
}

// ── Records ──────────────────────────────────────────────────────────────────

/// Labeled display lines for a resolved record, in display order.
/// Fields the authority did not provide are left out.
pub fn record_lines(result: &ResolveResult) -> Vec<(&'static str, String)> {
    let record = &result.parsed;
    let mut lines = Vec::new();

    let mut push = |label: &'static str, value: Option<&String>| {
        if let Some(value) = value {
            lines.push((label, value.clone()));
        }
    };

    push("Domain", record.domain_name.as_ref());
    push("Registry ID", record.registry_domain_id.as_ref());
    push("Registrar", record.registrar.as_ref());
    push("IANA ID", record.registrar_iana_id.as_ref());
    push("WHOIS Server", record.registrar_whois_server.as_ref());
    push("Abuse Email", record.registrar_abuse_email.as_ref());
    push("Abuse Phone", record.registrar_abuse_phone.as_ref());
    push("Created", record.creation_date.as_ref());
    push("Expires", record.expiration_date.as_ref());
    push("Updated", record.updated_date.as_ref());

    if !record.status.is_empty() {
        lines.push(("Status", record.status.join(", ")));
    }
    if !record.name_servers.is_empty() {
        lines.push(("Name Servers", record.name_servers.join(", ")));
    }
    if let Some(dnssec) = &record.dnssec {
        lines.push(("DNSSEC", dnssec.clone()));
    }

    for (label, role) in [
        ("Registrant", ContactRole::Registrant),
        ("Admin", ContactRole::Admin),
        ("Tech", ContactRole::Tech),
        ("Billing", ContactRole::Billing),
    ] {
        if let Some(contact) = record.contact(role).filter(|c| !c.is_empty()) {
            lines.push((label, format_contact(contact)));
        }
    }

    lines.push(("Source", result.data_source.to_string()));
    lines
}

/// `Jane Doe (Example Org) <jane@example.com>, +1.555, US`
pub fn format_contact(contact: &Contact) -> String {
    let mut head = Vec::new();
    if let Some(name) = &contact.name {
        head.push(name.clone());
    }
    if let Some(org) = &contact.organization {
        if head.is_empty() {
            head.push(org.clone());
        } else {
            head.push(format!("({})", org));
        }
    }
    if let Some(email) = &contact.email {
        head.push(format!("<{}>", email));
    }

    let mut parts = vec![head.join(" ")];
    parts.extend(contact.phone.clone());
    parts.extend(contact.country.clone());
    parts.retain(|p| !p.is_empty());
    parts.join(", ")
}

/// Print one resolved domain.
pub fn print_record(query: &str, result: &ResolveResult, pretty: bool, show_raw: bool) {
    let lines = record_lines(result);
    let width = lines.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 1;

    if pretty {
        println!(
            "  {}  {}",
            style(query).white().bold(),
            style("REGISTERED").green().bold(),
        );
        for (label, value) in &lines {
            let label = format!("{}:", label);
            let padded = pad_str(&label, width, Alignment::Left, None);
            println!("    {} {}", style(padded).cyan(), value);
        }
    } else {
        println!("{}", query);
        for (label, value) in &lines {
            println!("  {}: {}", label, value);
        }
    }

    if show_raw {
        println!();
        println!("{}", result.raw.trim_end());
    }
    println!();
}

/// Print a failed lookup.
pub fn print_failure(query: &str, error: &LookupError, pretty: bool) {
    if pretty {
        let status = match error.kind() {
            FailureKind::NotRegistered => style("NOT REGISTERED").yellow().bold(),
            FailureKind::Unsupported => style("UNSUPPORTED").yellow(),
            FailureKind::InvalidInput => style("INVALID").red(),
            FailureKind::Transient => style("ERROR").red().bold(),
        };
        println!(
            "  {}  {}  {}",
            style(query).white(),
            status,
            style(brief_error(error)).dim(),
        );
        println!();
    } else {
        println!("{}", query);
        println!("  Error: {}", error);
        println!();
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(resolved: usize, unregistered: usize, failed: usize, duration: Duration) {
    let total = resolved + unregistered + failed;
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} quer{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "y" } else { "ies" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} registered", resolved)).green(),
        style("|").dim(),
        style(format!("{} not registered", unregistered)).yellow(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );
}

/// Short reason shown next to a failed lookup in pretty mode.
pub fn brief_error(error: &LookupError) -> &'static str {
    match error {
        LookupError::DomainNotRegistered { .. } => "(available for registration)",
        LookupError::UnsupportedSuffix { .. } | LookupError::NoServerFound { .. } => {
            "(unknown TLD)"
        }
        LookupError::InvalidDomain { .. } => "(invalid domain)",
        LookupError::Timeout { .. } => "(timeout)",
        LookupError::NetworkError { .. }
        | LookupError::ConnectionError { .. }
        | LookupError::AllServersFailed { .. } => "(network error)",
        LookupError::ParseError { .. } => "(parsing error)",
        _ => "(error)",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
