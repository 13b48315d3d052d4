mod common;

use acme::api::client::Client;
use acme::crypto::es256;
use acme::materialize::ChallengeResponse;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEAF_PEM: &str = "-----BEGIN CERTIFICATE-----\n\
MIIBAzCBqwIUAbc=\n\
-----END CERTIFICATE-----\n";

#[async_std::test]
async fn single_identifier_http01_happy_path() {
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
                    "identifiers": [{"type": "dns", "value": "example.com"}],
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
            "challenges": [{
                "type": "http-01",
                "url": format!("{}/acme/chall/1", server.uri()),
                "status": "pending",
                "token": "tok-xyz",
            }],
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/chall/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "http-01",
            "url": format!("{}/acme/chall/1", server.uri()),
            "status": "processing",
            "token": "tok-xyz",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/order/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "valid",
            "identifiers": [{"type": "dns", "value": "example.com"}],
            "authorizations": [format!("{}/acme/authz/1", server.uri())],
            "finalize": format!("{}/acme/order/1/finalize", server.uri()),
            "certificate": format!("{}/acme/cert/1", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/order/1/finalize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "valid",
            "identifiers": [{"type": "dns", "value": "example.com"}],
            "authorizations": [format!("{}/acme/authz/1", server.uri())],
            "finalize": format!("{}/acme/order/1/finalize", server.uri()),
            "certificate": format!("{}/acme/cert/1", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/cert/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LEAF_PEM))
        .mount(&server)
        .await;

    let client = Client::for_directory_url(common::http_client(), common::directory_url(&server))
        .await
        .unwrap();

    let account_key = es256::from_jwk(es256::tests::JWK).unwrap();
    let account = client.find_account(account_key).await.unwrap();

    let mut order = account.new_dns_order("example.com").await.unwrap();

    let authz = match order.state() {
        acme::api::order::OrderState::Pending(pending) => {
            pending.get_only_authorization().await.unwrap()
        }
        _ => panic!("expected pending order"),
    };

    let mut challenge = authz.find_challenge_type("http-01").unwrap();
    let response = challenge.materialize(account.key()).unwrap();
    match response {
        ChallengeResponse::Http01 { token, body, .. } => {
            assert_eq!(token, "tok-xyz");
            assert!(body.starts_with("tok-xyz."));
        }
        _ => panic!("expected http-01 response"),
    }

    match challenge.state_result().unwrap() {
        acme::api::challenge::ChallengeState::Pending(mut pending) => {
            pending.respond().await.unwrap();
        }
        _ => panic!("expected pending challenge"),
    }

    order.refresh().await.unwrap();
    assert_eq!(order.status(), acme::wire::order::OrderStatus::Valid);

    let chain = match order.state() {
        acme::api::order::OrderState::Valid(valid) => valid.get_certificate_chain().await.unwrap(),
        _ => panic!("expected valid order"),
    };
    assert!(chain.pem.contains("BEGIN CERTIFICATE"));
    assert_eq!(chain.der_chain.len(), 1);
}
