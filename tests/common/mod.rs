use std::sync::Arc;

use http_client::HttpClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a minimal RFC 8555 directory plus a `newNonce` endpoint that
/// always hands back a fresh nonce, against a running `MockServer`.
/// Callers still need to mount `newAccount`/`newOrder`/etc. themselves —
/// this only gets far enough that `Client::for_directory_url` succeeds.
pub async fn mount_directory(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path("/acme/new-nonce"))
        .respond_with(|_: &wiremock::Request| {
            ResponseTemplate::new(204).append_header("Replay-Nonce", fresh_nonce().as_str())
        })
        .mount(server)
        .await;

    let directory = json!({
        "newNonce": format!("{}/acme/new-nonce", server.uri()),
        "newAccount": format!("{}/acme/new-account", server.uri()),
        "newOrder": format!("{}/acme/new-order", server.uri()),
        "revokeCert": format!("{}/acme/revoke-cert", server.uri()),
        "keyChange": format!("{}/acme/key-change", server.uri()),
        "meta": {}
    });

    Mock::given(method("GET"))
        .and(path("/directory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(directory))
        .mount(server)
        .await;
}

/// One nonce per call, distinguishable across the run — enough for tests
/// that assert every outbound request carried a distinct nonce.
pub fn fresh_nonce() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("nonce-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

pub fn http_client() -> Arc<dyn HttpClient> {
    Arc::new(http_client::h1::H1Client::new())
}

pub fn directory_url(server: &MockServer) -> String {
    format!("{}/directory", server.uri())
}
