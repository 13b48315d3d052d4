mod common;

use acme::api::client::Client;
use acme::crypto::es256;
use acme::materialize::ChallengeResponse;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[async_std::test]
async fn wildcard_order_is_dns01_only() {
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

    Mock::given(method("POST"))
        .and(path("/acme/new-order"))
        .respond_with(
            ResponseTemplate::new(201)
                .append_header("Location", format!("{}/acme/order/1", server.uri()).as_str())
                .set_body_json(json!({
                    "status": "pending",
                    "identifiers": [{"type": "dns", "value": "*.example.com"}],
                    "authorizations": [format!("{}/acme/authz/1", server.uri())],
                    "finalize": format!("{}/acme/order/1/finalize", server.uri()),
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/authz/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "pending",
            "identifier": {"type": "dns", "value": "example.com"},
            "wildcard": true,
            "challenges": [{
                "type": "dns-01",
                "url": format!("{}/acme/chall/1", server.uri()),
                "status": "pending",
                "token": "tok-abc",
            }],
        })))
        .mount(&server)
        .await;

    let client = Client::for_directory_url(common::http_client(), common::directory_url(&server))
        .await
        .unwrap();
    let account_key = es256::from_jwk(es256::tests::JWK).unwrap();
    let account = client.find_account(account_key).await.unwrap();

    let mut order = account.new_dns_order("*.example.com").await.unwrap();
    let authz = match order.state() {
        acme::api::order::OrderState::Pending(pending) => {
            pending.get_only_authorization().await.unwrap()
        }
        _ => panic!("expected pending order"),
    };

    assert!(authz.resource().wildcard);
    assert!(authz.find_challenge_type("http-01").is_none());
    assert!(authz.find_challenge_type("tls-alpn-01").is_none());
    let challenge = authz.find_challenge_type("dns-01").unwrap();

    match challenge.materialize(account.key()).unwrap() {
        ChallengeResponse::Dns01 {
            record_name,
            record_value,
        } => {
            assert_eq!(record_name, "_acme-challenge.example.com");
            assert_eq!(record_value.len(), 43);
        }
        _ => panic!("expected dns-01 response"),
    }
}
