//! Session and transport tests against a real HTTP server.

use std::sync::Arc;
use std::time::Duration;

use parkwatch_auth::{
    ApiConfig, AuthError, AuthorizedClient, HttpRequest, HttpTransport, ReqwestTransport,
    SessionManager, TransportError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        email: "device@lot.test".to_string(),
        password: "secret".to_string(),
        request_timeout_secs: 1,
        ..ApiConfig::default()
    }
}

fn client(config: ApiConfig) -> AuthorizedClient {
    let transport = Arc::new(ReqwestTransport::new(&config));
    AuthorizedClient::new(Arc::new(SessionManager::new(config, transport)))
}

#[tokio::test]
async fn reqwest_transport_reports_any_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teapot"))
        .respond_with(ResponseTemplate::new(418).set_body_string("short and stout"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(&config(&server));
    let response = transport
        .send(&HttpRequest::get(format!("{}/api/teapot", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 418);
    assert_eq!(response.body, "short and stout");
}

#[tokio::test]
async fn reqwest_transport_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(&config(&server));
    let err = transport
        .send(&HttpRequest::get(format!("{}/slow", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }));
}

#[tokio::test]
async fn login_then_authorized_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "device@lot.test", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "abc"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/slots"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(config(&server));
    for _ in 0..2 {
        let response = client
            .send(HttpRequest::get(client.url("/api/slots")))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn persistent_401_gives_up_after_one_relogin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/slots"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(config(&server));
    let err = client
        .send(HttpRequest::get(client.url("/api/slots")))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::RefreshExhausted { attempts: 1 }));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = ApiConfig {
        // nothing listens on the discard port
        base_url: "http://127.0.0.1:9".to_string(),
        connect_timeout_secs: 1,
        request_timeout_secs: 1,
        ..ApiConfig::default()
    };
    let client = client(config);
    let err = client
        .send(HttpRequest::get(client.url("/api/slots")))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Transport(_)));
}
