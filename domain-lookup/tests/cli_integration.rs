// domain-lookup/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::NamedTempFile;

/// Command with a clean environment so local settings cannot leak in.
fn lookup_cmd() -> Command {
    let mut cmd = Command::cargo_bin("domain-lookup").unwrap();
    for var in [
        "DL_SOURCE",
        "DL_HTTP_TIMEOUT",
        "DL_WHOIS_TIMEOUT",
        "DL_CACHE_TTL",
        "DL_BOOTSTRAP",
        "DL_BOOTSTRAP_URL",
        "DL_CONFIG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// One-thread WHOIS server answering every query with `answer`.
fn spawn_whois(answer: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut line = String::new();
            let _ = BufReader::new(&stream).read_line(&mut line);
            let _ = stream.write_all(answer.as_bytes());
        }
    });

    addr.to_string()
}

fn config_file(whois_host: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let content = format!(
        "[defaults]\nbootstrap = false\nwhois_timeout = \"3s\"\niana_whois_host = \"{host}\"\n\n[whois_servers]\ntest = \"{host}\"\n",
        host = whois_host
    );
    fs::write(file.path(), content).expect("Failed to write to temp file");
    file
}

#[test]
fn test_help_lists_flags() {
    lookup_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--supported"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--raw"));
}

#[test]
fn test_version_flag() {
    lookup_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_arguments_is_an_error() {
    lookup_cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No domains specified"));
}

#[test]
fn test_unknown_source_is_rejected() {
    lookup_cmd()
        .args(["example.com", "--source", "carrier-pigeon", "--no-bootstrap"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown data source"));
}

#[test]
fn test_supported_builtin_tld() {
    lookup_cmd()
        .args(["--supported", "com", "--no-bootstrap"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com: supported"));
}

#[test]
fn test_unsupported_tld() {
    lookup_cmd()
        .args(["--supported", "zz", "--no-bootstrap"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("zz: not supported"));
}

#[test]
fn test_supported_json_includes_authority() {
    lookup_cmd()
        .args(["--supported", ".JP", "--no-bootstrap", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"country\":\"Japan\""))
        .stdout(predicate::str::contains("\"tld\":\"jp\""));
}

#[test]
fn test_invalid_domain_reports_error() {
    lookup_cmd()
        .args(["not a domain", "--no-bootstrap"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid domain"));
}

#[test]
fn test_invalid_domain_json() {
    lookup_cmd()
        .args(["bad_label.com", "--no-bootstrap", "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"kind\": \"invalid_input\""));
}

#[test]
fn test_broken_config_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "[defaults\nbootstrap = ").unwrap();

    lookup_cmd()
        .args(["example.com", "--config"])
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse TOML"));
}

#[test]
fn test_missing_config_file() {
    lookup_cmd()
        .args(["example.com", "--config", "/nonexistent/domain-lookup.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_whois_lookup_end_to_end() {
    let host = spawn_whois(
        "Domain Name: EXAMPLE.TEST\r\nRegistrar: Example Registrar, Inc.\r\nName Server: NS1.EXAMPLE.NET\r\n",
    );
    let config = config_file(&host);

    lookup_cmd()
        .args(["example.test", "--source", "whois", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Registrar: Example Registrar, Inc."))
        .stdout(predicate::str::contains("Name Servers: ns1.example.net"))
        .stdout(predicate::str::contains("Source: registry"));
}

#[test]
fn test_whois_lookup_json_with_raw() {
    let host = spawn_whois("Domain Name: EXAMPLE.TEST\r\nRegistrar: Example Registrar, Inc.\r\n");
    let config = config_file(&host);

    let output = lookup_cmd()
        .args(["example.test", "--source", "whois", "--json", "--raw", "--config"])
        .arg(config.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = &entries[0]["result"];
    assert_eq!(entries[0]["query"], "example.test");
    assert_eq!(result["dataSource"], "registry");
    assert_eq!(result["parsed"]["registrar"], "Example Registrar, Inc.");
    assert!(result["raw"].as_str().unwrap().contains("EXAMPLE.TEST"));
}

#[test]
fn test_unregistered_domain_exit_code() {
    let host = spawn_whois("No match for \"FREE.TEST\".\r\n");
    let config = config_file(&host);

    lookup_cmd()
        .args(["free.test", "--source", "whois", "--config"])
        .arg(config.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("not registered"));
}

#[test]
fn test_env_source_is_used() {
    let host = spawn_whois("Domain Name: EXAMPLE.TEST\r\nRegistrar: Env Registrar\r\n");
    let config = config_file(&host);

    lookup_cmd()
        .env("DL_SOURCE", "whois")
        .args(["example.test", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Env Registrar"));
}
