mod common;

use acme::api::client::Client;
use acme::crypto::es256;
use acme::error::AcmeError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[async_std::test]
async fn rejected_authorization_drives_order_invalid_and_finalize_is_a_state_violation() {
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
                    "identifiers": [{"type": "dns", "value": "forbidden.example.com"}],
                    "authorizations": [format!("{}/acme/authz/1", server.uri())],
                    "finalize": format!("{}/acme/order/1/finalize", server.uri()),
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/order/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "invalid",
            "identifiers": [{"type": "dns", "value": "forbidden.example.com"}],
            "authorizations": [format!("{}/acme/authz/1", server.uri())],
            "finalize": format!("{}/acme/order/1/finalize", server.uri()),
            "error": {
                "type": "urn:ietf:params:acme:error:rejectedIdentifier",
                "detail": "forbidden.example.com is administratively blocked",
            },
        })))
        .mount(&server)
        .await;

    let client = Client::for_directory_url(common::http_client(), common::directory_url(&server))
        .await
        .unwrap();
    let account_key = es256::from_jwk(es256::tests::JWK).unwrap();
    let account = client.find_account(account_key).await.unwrap();

    let mut order = account.new_dns_order("forbidden.example.com").await.unwrap();
    order.refresh().await.unwrap();

    assert_eq!(order.status(), acme::wire::order::OrderStatus::Invalid);
    order.status_result().unwrap_err();

    let csr_der = [0u8; 8];
    match order.finalize(csr_der).await {
        Err(AcmeError::StateViolation { expected, actual }) => {
            assert_eq!(expected, "ready");
            assert_eq!(actual, "invalid");
        }
        other => panic!("expected StateViolation, got {other:?}"),
    }
}
