use chrono::{Duration, Utc};
use mixpanel_client::{Config, Event, Mixpanel, MixpanelApi, MixpanelError, Properties, Update};
use mockito::{Matcher, Server};
use serde_json::{json, Value};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn client_for(server: &Server) -> Mixpanel {
    Mixpanel::new("tok", "key", "secret", &server.url())
}

fn data_param(url: &str) -> Value {
    let (_, query) = url.split_once('?').unwrap();
    let data = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("data="))
        .unwrap();
    serde_json::from_slice(&base64::decode(data).unwrap()).unwrap()
}

fn sign_in() -> Event {
    Event::new(props(json!({ "from": "email" })))
}

#[tokio::test]
async fn accepted_request_sends_basic_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/track".to_string()))
        .match_header("authorization", "Basic a2V5OnNlY3JldA==")
        .with_status(200)
        .with_body(r#"{"error": null, "status": 1}"#)
        .create_async()
        .await;

    client_for(&server)
        .track("1", "Sign In", &sign_in())
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn status_one_wins_over_http_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(500)
        .with_body(r#"{"status": 1}"#)
        .create_async()
        .await;

    let result = client_for(&server).alias("1", "2").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn rejected_request_carries_service_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(r"^/engage".to_string()))
        .with_status(200)
        .with_body(r#"{"error": "token, missing or empty", "status": 0}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let update = Update::set(props(json!({ "plan": "pro" }))).ignore_time();
    let err = client.update("1", &update).await.unwrap_err();

    match &err {
        MixpanelError::Api {
            url,
            message,
            http_status,
            code,
        } => {
            assert!(url.starts_with(&format!("{}/engage?data=", server.url())));
            assert!(url.ends_with("&ip=1&verbose=1"));
            assert_eq!(message, "token, missing or empty");
            assert_eq!(*http_status, 200);
            assert_eq!(*code, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let sent = data_param(err.url().unwrap());
    assert_eq!(sent, client.update_request("1", &update).params);
    assert_eq!(sent["$ignore_time"], json!(true));
    assert!(sent.get("$time").is_none());
}

#[tokio::test]
async fn empty_body_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    let err = client_for(&server)
        .track("1", "Sign In", &sign_in())
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(200));
    assert_eq!(err.code(), Some(0));
    assert_eq!(err.message(), Some(""));
}

#[tokio::test]
async fn undecodable_body_keeps_http_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let err = client_for(&server)
        .track("1", "Sign In", &sign_in())
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(502));
    assert_eq!(err.code(), Some(0));
    assert!(!err.message().unwrap().is_empty());
}

#[tokio::test]
async fn old_events_go_to_import() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/import".to_string()))
        .with_body(r#"{"status": 1}"#)
        .create_async()
        .await;

    let event = sign_in().with_timestamp((Utc::now() - Duration::days(30)).fixed_offset());
    client_for(&server)
        .track("1", "Sign In", &event)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn alias_never_requests_geolocation() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_body(r#"{"error": "nope", "status": 0}"#)
        .create_async()
        .await;

    let err = client_for(&server).alias("1", "2").await.unwrap_err();
    let url = err.url().unwrap();

    assert!(url.contains("/track?data="));
    assert!(!url.contains("ip=1"));
    assert_eq!(
        data_param(url),
        json!({
            "event": "$create_alias",
            "properties": { "token": "tok", "distinct_id": "1", "alias": "2" },
        })
    );
}

#[tokio::test]
async fn explicit_ip_skips_geolocation_flag() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_body(r#"{"status": 0}"#)
        .create_async()
        .await;

    let event = sign_in().with_ip("1.2.3.4");
    let err = client_for(&server)
        .track("1", "Sign In", &event)
        .await
        .unwrap_err();

    let url = err.url().unwrap();

    assert!(!url.contains("&ip=1"));
    assert_eq!(data_param(url)["properties"]["ip"], json!("1.2.3.4"));
}

#[tokio::test]
async fn transport_failure_has_no_http_status() {
    let client = Mixpanel::with_client(
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap(),
        Config::new("tok", "key", "secret", "http://127.0.0.1:1"),
    );

    let err = client
        .track("1", "Sign In", &sign_in())
        .await
        .unwrap_err();

    assert!(err.url().unwrap().starts_with("http://127.0.0.1:1/track?data="));
    assert_eq!(err.http_status(), Some(0));
    assert_eq!(err.code(), Some(0));
    assert!(!err.message().unwrap().is_empty());
}
