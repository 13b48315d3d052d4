mod common;

use acme::api::client::Client;
use acme::crypto::es256;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[async_std::test]
async fn repeated_identical_order_returns_same_order_url() {
    let server = MockServer::start().await;
    common::mount_directory(&server).await;

    Mock::given(method("POST"))
        .and(path("/acme/new-account"))
        .respond_with(
            ResponseTemplate::new(201)
                .append_header("Location", format!("{}/acme/acct/1", server.uri()).as_str())
                .set_body_json(json!({"status": "valid"})),
        )
        .mount(&server)
        .await;

    // A CA that recognizes a duplicate order for the same identifier set
    // returns the existing order's URL instead of minting a new one.
    Mock::given(method("POST"))
        .and(path("/acme/new-order"))
        .respond_with(
            ResponseTemplate::new(201)
                .append_header("Location", format!("{}/acme/order/1", server.uri()).as_str())
                .set_body_json(json!({
                    "status": "pending",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/acme/authz/1", server.uri())],
                    "finalize": format!("{}/acme/order/1/finalize", server.uri()),
                })),
        )
        .mount(&server)
        .await;

    let client = Client::for_directory_url(common::http_client(), common::directory_url(&server))
        .await
        .unwrap();
    let account_key = es256::from_jwk(es256::tests::JWK).unwrap();
    let account = client.find_account(account_key).await.unwrap();

    let first = account.new_dns_order("example.com").await.unwrap();
    let second = account.new_dns_order("example.com").await.unwrap();

    assert_eq!(first.url(), second.url());
}
