//! Domain Lookup CLI Application
//!
//! Command-line front end for domain-lookup-lib: resolves registration data
//! for one or more domains and prints it as text or JSON.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_lookup_lib::{
    load_env_config, ConfigManager, DomainResolver, FailureKind, LookupConfig, LookupError,
    QueryType, RequestedSource, ResolveResult,
};
use serde_json::{json, Value};
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit code when at least one domain is not registered.
const EXIT_NOT_REGISTERED: i32 = 2;

/// CLI arguments for domain-lookup
#[derive(Parser, Debug)]
#[command(name = "domain-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Look up domain registration data using RDAP with WHOIS fallback")]
#[command(
    long_about = "Look up domain registration data using RDAP with automatic WHOIS fallback.\n\nAnswers from either protocol are normalized into the same record."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names or URLs to look up
    #[arg(value_name = "QUERY", help_heading = "Lookup")]
    pub queries: Vec<String>,

    /// Data source: auto, rdap, whois, registrar or registry
    #[arg(short = 's', long = "source", value_name = "SOURCE", help_heading = "Lookup")]
    pub source: Option<String>,

    /// Report whether a TLD can be resolved and exit
    #[arg(long = "supported", value_name = "TLD", help_heading = "Lookup")]
    pub supported: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Include the raw RDAP/WHOIS response
    #[arg(long = "raw", help_heading = "Output Format")]
    pub raw: bool,

    /// Colored, grouped output
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Disable IANA bootstrap (use only built-in and configured RDAP servers)
    #[arg(long = "no-bootstrap", help_heading = "Protocol")]
    pub no_bootstrap: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Debug-level logging on stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Settings after file, environment and CLI layers are combined.
struct Settings {
    config: LookupConfig,
    source: RequestedSource,
    pretty: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins unless `--verbose` is set.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("domain_lookup=debug,domain_lookup_lib=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.queries.is_empty() && args.supported.is_none() {
        return Err("No domains specified. Provide domain names or use --supported <TLD>".into());
    }
    if args.supported.is_some() && !args.queries.is_empty() {
        return Err("--supported cannot be combined with domain queries".into());
    }
    Ok(())
}

async fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    let resolver = DomainResolver::new(settings.config)?;

    if let Some(tld) = &args.supported {
        return Ok(report_supported(&resolver, tld, args.json).await);
    }

    if settings.pretty && !args.json {
        ui::print_header(args.queries.len(), &settings.source.to_string());
    }

    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(args.queries.len());

    for query in &args.queries {
        let spinner = (settings.pretty && !args.json)
            .then(|| ui::Spinner::start(format!("Resolving {}...", query)));

        let outcome = resolver
            .resolve(query, QueryType::Domain, settings.source)
            .await;

        if let Some(spinner) = spinner {
            spinner.stop().await;
        }

        if !args.json {
            match &outcome {
                Ok(result) => ui::print_record(query, result, settings.pretty, args.raw),
                Err(e) => ui::print_failure(query, e, settings.pretty),
            }
        }
        outcomes.push((query.as_str(), outcome));
    }

    if args.json {
        let entries: Vec<Value> = outcomes
            .iter()
            .map(|(query, outcome)| json_entry(query, outcome, args.raw))
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if settings.pretty {
        let failed = outcomes
            .iter()
            .filter(|(_, o)| o.as_ref().is_err_and(|e| !e.is_not_registered()))
            .count();
        let unregistered = outcomes
            .iter()
            .filter(|(_, o)| o.as_ref().is_err_and(LookupError::is_not_registered))
            .count();
        ui::print_summary(
            outcomes.len() - failed - unregistered,
            unregistered,
            failed,
            started.elapsed(),
        );
    }

    Ok(exit_code(outcomes.iter().map(|(_, o)| o)))
}

/// 1 if any lookup failed outright, 2 if any domain is unregistered, else 0.
fn exit_code<'a, I>(outcomes: I) -> i32
where
    I: Iterator<Item = &'a Result<ResolveResult, LookupError>>,
{
    let mut code = 0;
    for outcome in outcomes {
        match outcome {
            Ok(_) => {}
            Err(e) if e.is_not_registered() => code = code.max(EXIT_NOT_REGISTERED),
            Err(_) => return 1,
        }
    }
    code
}

fn json_entry(
    query: &str,
    outcome: &Result<ResolveResult, LookupError>,
    include_raw: bool,
) -> Result<Value, serde_json::Error> {
    match outcome {
        Ok(result) => {
            let mut value = serde_json::to_value(result)?;
            if !include_raw {
                strip_raw(&mut value);
            }
            Ok(json!({ "query": query, "result": value }))
        }
        Err(e) => Ok(json!({
            "query": query,
            "error": {
                "kind": kind_label(e.kind()),
                "message": e.to_string(),
            }
        })),
    }
}

fn strip_raw(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("raw");
        obj.remove("registryRaw");
        if let Some(parsed) = obj.get_mut("parsed").and_then(Value::as_object_mut) {
            parsed.remove("raw");
        }
    }
}

fn kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::NotRegistered => "not_registered",
        FailureKind::Unsupported => "unsupported",
        FailureKind::Transient => "transient",
        FailureKind::InvalidInput => "invalid_input",
    }
}

async fn report_supported(resolver: &DomainResolver, tld: &str, as_json: bool) -> i32 {
    let supported = resolver.is_supported(tld).await;
    let authority = resolver.authority_for(tld);

    if as_json {
        let mut entry = json!({
            "tld": tld.trim().trim_start_matches('.').to_lowercase(),
            "supported": supported,
        });
        if let Some(a) = authority {
            entry["country"] = json!(a.country_name);
            entry["registry"] = json!(a.registry);
        }
        println!("{}", entry);
    } else {
        let verdict = if supported { "supported" } else { "not supported" };
        match authority {
            Some(a) => println!("{}: {} ({}, {})", tld, verdict, a.country_name, a.registry),
            None => println!("{}: {}", tld, verdict),
        }
    }

    if supported {
        0
    } else {
        1
    }
}

/// Combine config files, `DL_*` variables and CLI flags, lowest precedence first.
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let manager = ConfigManager::new(args.verbose);

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let mut config = file_config.apply_to(LookupConfig::default())?;
    config = env_config.apply_to(config);
    if args.no_bootstrap {
        config = config.with_bootstrap(false);
    }

    let source = match &args.source {
        Some(source) => source.parse::<RequestedSource>()?,
        None => match env_config.source {
            Some(source) => source,
            None => file_config.default_source()?.unwrap_or_default(),
        },
    };

    let pretty = args.pretty
        || file_config
            .defaults
            .as_ref()
            .and_then(|d| d.pretty)
            .unwrap_or(false);

    debug!(%source, bootstrap = config.enable_bootstrap, pretty, "settings resolved");

    Ok(Settings {
        config,
        source,
        pretty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let failed: Result<ResolveResult, LookupError> =
            Err(LookupError::connection("whois.example", "refused"));
        let free: Result<ResolveResult, LookupError> =
            Err(LookupError::not_registered("example.com", "whois.example"));

        assert_eq!(
            exit_code(std::iter::empty::<&Result<ResolveResult, LookupError>>()),
            0
        );
        assert_eq!(exit_code([&free].into_iter()), 2);
        assert_eq!(exit_code([&free, &failed].into_iter()), 1);
    }

    #[test]
    fn test_validate_args() {
        let args = Args::parse_from(["domain-lookup"]);
        assert!(validate_args(&args).is_err());

        let args = Args::parse_from(["domain-lookup", "--supported", "com"]);
        assert!(validate_args(&args).is_ok());

        let args = Args::parse_from(["domain-lookup", "example.com", "--supported", "com"]);
        assert!(validate_args(&args).is_err());

        let args = Args::parse_from(["domain-lookup", "example.com", "--source", "whois"]);
        assert!(validate_args(&args).is_ok());
        assert_eq!(args.source.as_deref(), Some("whois"));
    }

    #[test]
    fn test_json_entry_strips_raw_by_default() {
        let err: Result<ResolveResult, LookupError> = Err(LookupError::unsupported("zz"));
        let entry = json_entry("example.zz", &err, false).unwrap();
        assert_eq!(entry["error"]["kind"], "unsupported");

        let mut value = json!({"raw": "x", "registryRaw": "y", "parsed": {"raw": "x", "registrar": "R"}});
        strip_raw(&mut value);
        assert_eq!(value, json!({"parsed": {"registrar": "R"}}));
    }
}
