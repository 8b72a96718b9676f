//! Register lookups against a local mock of the search endpoints

use std::time::Duration;

use egrul_client::{DirectorLookup, EgrulClient, EgrulConfig, EgrulError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INN: &str = "7707083893";

fn client_for(server: &MockServer) -> EgrulClient {
    let config = EgrulConfig::new(&server.uri())
        .with_token_delay(Duration::ZERO)
        .with_timeout(Duration::from_secs(5));
    EgrulClient::new(config).unwrap()
}

async fn mount_token(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(format!(
            "vyp3CaptchaToken=&page=&query={}&region=&PreventChromeAutocomplete=",
            INN
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_find_director_two_step() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "t": "tok123", "captchaRequired": false })).await;

    Mock::given(method("GET"))
        .and(path("/search-result/tok123"))
        .and(query_param("_", INN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [
                { "g": "ГЕНЕРАЛЬНЫЙ ДИРЕКТОР: Жигарев Антон Вячеславович", "i": INN },
                { "g": "ДИРЕКТОР: Кто-то Другой" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let fio = client.find_director(INN).await.unwrap();
    assert_eq!(fio.as_deref(), Some("Жигарев Антон Вячеславович"));

    let requests = server.received_requests().await.unwrap();
    let get = requests
        .iter()
        .find(|r| r.method.as_str() == "GET")
        .unwrap();
    let r_param = get
        .url
        .query_pairs()
        .find(|(k, _)| k == "r")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(r_param.len(), 14);
    assert!(r_param.bytes().all(|b| b.is_ascii_digit()));
    assert!(get
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("Mozilla/5.0"));
}

#[tokio::test]
async fn test_missing_token_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "captchaRequired": true })).await;

    let client = client_for(&server);
    assert_eq!(client.find_director(INN).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_rows_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "t": "tok" })).await;
    Mock::given(method("GET"))
        .and(path("/search-result/tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.find_director(INN).await.unwrap(), None);
}

#[tokio::test]
async fn test_head_without_colon_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "t": "tok" })).await;
    Mock::given(method("GET"))
        .and(path("/search-result/tok"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "rows": [{ "g": "Иванов Иван" }] })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.find_director(INN).await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.find_director(INN).await.unwrap_err();
    assert!(matches!(err, EgrulError::Status { status, .. } if status.as_u16() == 500));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.search_token(INN).await.unwrap_err();
    assert!(matches!(err, EgrulError::Decode(_)));
}

#[tokio::test]
async fn test_timeout_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "t": "tok" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = EgrulConfig::new(&server.uri()).with_timeout(Duration::from_millis(50));
    let client = EgrulClient::new(config).unwrap();
    let err = client.search_token(INN).await.unwrap_err();
    assert!(matches!(err, EgrulError::Http(e) if e.is_timeout()));
}

#[tokio::test]
async fn test_token_delay_between_requests() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "t": "tok123" })).await;
    Mock::given(method("GET"))
        .and(path("/search-result/tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{ "g": "ДИРЕКТОР: Иванов Иван Иванович" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let delay = Duration::from_millis(300);
    let config = EgrulConfig::new(&server.uri())
        .with_token_delay(delay)
        .with_timeout(Duration::from_secs(5));
    let client = EgrulClient::new(config).unwrap();

    let started = std::time::Instant::now();
    let fio = client.find_director(INN).await.unwrap();
    assert!(started.elapsed() >= delay);
    assert_eq!(fio.as_deref(), Some("Иванов Иван Иванович"));
}

#[tokio::test]
async fn test_no_token_means_no_pause() {
    let server = MockServer::start().await;
    mount_token(&server, json!({ "captchaRequired": true })).await;

    let delay = Duration::from_secs(3);
    let config = EgrulConfig::new(&server.uri())
        .with_token_delay(delay)
        .with_timeout(Duration::from_secs(2));
    let client = EgrulClient::new(config).unwrap();

    let started = std::time::Instant::now();
    assert_eq!(client.find_director(INN).await.unwrap(), None);
    assert!(started.elapsed() < delay);
}
