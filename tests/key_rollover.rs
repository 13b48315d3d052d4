mod common;

use acme::api::client::Client;
use acme::crypto::{account_key::GenerateAccountKey, es256, jws::JwsSigner, rs256};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[async_std::test]
async fn rolls_from_rsa_to_p256_and_keeps_kid() {
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
        .and(path("/acme/key-change"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "valid"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acme/order/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "pending",
            "identifiers": [{"type": "dns", "value": "example.com"}],
            "authorizations": [],
            "finalize": format!("{}/acme/order/1/finalize", server.uri()),
        })))
        .mount(&server)
        .await;

    let client = Client::for_directory_url(common::http_client(), common::directory_url(&server))
        .await
        .unwrap();

    let old_key = rs256::Rs256AccountKey::generate();
    let account = client.find_account(old_key).await.unwrap();
    let account_url = account.url().to_string();

    let new_key = es256::Es256AccountKey::generate();
    let account = account.roll_key(new_key).await.unwrap();

    assert_eq!(account.url(), account_url);
    assert_eq!(account.key().jws_alg(), "ES256");

    let order_url = format!("{}/acme/order/1", server.uri());
    account.get_order(&order_url).await.unwrap();
}
