//! In-process RDAP and WHOIS stand-ins for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use domain_lookup_lib::LookupConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Minimal HTTP/1.1 server answering GETs from a fixed route table.
///
/// Unknown paths get a 404. Every request path is recorded in order.
pub struct HttpStub {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HttpStub {
    pub async fn start(routes: Vec<(String, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, status, body)| (path, (status, body)))
                .collect(),
        );

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    serve_http(stream, &routes, &seen).await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn serve_http(
    mut stream: TcpStream,
    routes: &HashMap<String, (u16, String)>,
    seen: &Mutex<Vec<String>>,
) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let text = String::from_utf8_lossy(&request);
    let path = text
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(path.clone());

    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, r#"{"errorCode":404}"#.to_string()));
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/rdap+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// WHOIS server on a random port. Answers each query line through `respond`.
pub struct WhoisStub {
    pub addr: SocketAddr,
    queries: Arc<Mutex<Vec<String>>>,
    saw_eof: Arc<AtomicBool>,
}

impl WhoisStub {
    /// Same answer for every query.
    pub async fn fixed(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::start(Some(Arc::new(move |_: &str| answer.clone()))).await
    }

    /// Answer looked up by query; unknown queries get an empty reply.
    pub async fn table(answers: Vec<(&str, String)>) -> Self {
        let answers: HashMap<String, String> = answers
            .into_iter()
            .map(|(q, a)| (q.to_string(), a))
            .collect();
        Self::start(Some(Arc::new(move |q: &str| {
            answers.get(q).cloned().unwrap_or_default()
        })))
        .await
    }

    /// Reads the query and never answers. Records when the client hangs up.
    pub async fn silent() -> Self {
        Self::start(None).await
    }

    async fn start(respond: Option<Arc<dyn Fn(&str) -> String + Send + Sync>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let queries = Arc::new(Mutex::new(Vec::new()));
        let saw_eof = Arc::new(AtomicBool::new(false));

        let seen = Arc::clone(&queries);
        let eof = Arc::clone(&saw_eof);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let respond = respond.clone();
                let seen = Arc::clone(&seen);
                let eof = Arc::clone(&eof);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 512];
                    while !request.ends_with(b"\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let query = String::from_utf8_lossy(&request).trim().to_string();
                    seen.lock().unwrap().push(query.clone());

                    match respond {
                        Some(respond) => {
                            let _ = stream.write_all((*respond)(&query).as_bytes()).await;
                            let _ = stream.shutdown().await;
                        }
                        None => loop {
                            match stream.read(&mut buf).await {
                                Ok(0) | Err(_) => {
                                    eof.store(true, Ordering::SeqCst);
                                    return;
                                }
                                Ok(_) => {}
                            }
                        },
                    }
                });
            }
        });

        Self {
            addr,
            queries,
            saw_eof,
        }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    /// Wait up to one second for the client to close the connection.
    pub async fn wait_for_eof(&self) -> bool {
        for _ in 0..100 {
            if self.saw_eof.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

/// Offline config: no bootstrap fetch, short timeouts, IANA pointed at `iana`.
pub fn offline_config(iana: &WhoisStub) -> LookupConfig {
    LookupConfig::default()
        .with_bootstrap(false)
        .with_http_timeout(Duration::from_secs(2))
        .with_whois_timeout(Duration::from_secs(2))
        .with_iana_whois_host(iana.host())
}

pub fn registry_whois_text(domain: &str, registrar_host: Option<&str>) -> String {
    let mut text = format!(
        "   Domain Name: {}\r\n   Registry Domain ID: 123456_DOMAIN_TEST-VRSN\r\n",
        domain.to_uppercase()
    );
    if let Some(host) = registrar_host {
        text.push_str(&format!("   Registrar WHOIS Server: {}\r\n", host));
    }
    for line in [
        "Registrar: Example Registrar, Inc.",
        "Creation Date: 2001-02-03T04:05:06Z",
        "Registry Expiry Date: 2030-02-03T04:05:06Z",
        "Name Server: NS2.EXAMPLE.NET",
        "Name Server: NS1.EXAMPLE.NET",
        "Name Server: NS3.EXAMPLE.NET",
        ">>> Last update of whois database: 2024-09-01T12:00:00Z <<<",
    ] {
        text.push_str("   ");
        text.push_str(line);
        text.push_str("\r\n");
    }
    text
}
