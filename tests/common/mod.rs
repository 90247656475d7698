//! Shared utilities for integration and load testing.

use std::path::PathBuf;
use troxy::{EmbeddedServer, TroxyEmbedded};

/// Absolute path of a file under `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
        .to_string_lossy()
        .into_owned()
}

/// The three recordings of the statistics scenario, in load order.
pub fn statistics_recordings() -> Vec<String> {
    vec![
        fixture("statistics/request_same_path1.troxy"),
        fixture("statistics/request_same_path2.troxy"),
        fixture("statistics/request_different_path.troxy"),
    ]
}

/// Start a server with the statistics recordings on a free port.
pub async fn start_statistics_server() -> EmbeddedServer {
    TroxyEmbedded::run(statistics_recordings(), 0)
        .await
        .expect("statistics server should start")
}

/// GET `path` with `SomeHeader: <header_value>`, returning status and body.
#[allow(dead_code)]
pub async fn response_for_request_to(
    client: &reqwest::Client,
    server: &EmbeddedServer,
    path: &str,
    header_value: &str,
) -> (u16, String) {
    let res = client
        .get(format!("{}{}", server.base_url(), path))
        .header("SomeHeader", header_value)
        .send()
        .await
        .expect("Server unreachable");
    let status = res.status().as_u16();
    let body = res.text().await.expect("Body unreadable");
    (status, body)
}

/// The request sequence of the statistics scenario.
#[allow(dead_code)]
pub async fn run_requests(client: &reqwest::Client, server: &EmbeddedServer) {
    response_for_request_to(client, server, "/samepath", "recording1").await;
    response_for_request_to(client, server, "/samepath", "recording1").await;
    response_for_request_to(client, server, "/samepath", "recording2").await;
    response_for_request_to(client, server, "/differentpath", "").await;
}

/// A client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
