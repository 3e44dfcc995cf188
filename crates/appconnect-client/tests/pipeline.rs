//! End-to-end request pipeline tests against a local HTTP server.

use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use appconnect_client::{ApiError, ApiErrorKind, Client, Error, ReqwestTransport};
use appconnect_core::{ConnectConfig, Credentials, TlsMode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tiny_http::{Header, Response, Server, StatusCode};

const TEST_KEY: &str = include_str!("fixtures/AuthKey_TEST.p8");

#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    authorization: Option<String>,
    cookie: Option<String>,
    body: String,
}

struct TestServer {
    base_url: String,
    seen: mpsc::Receiver<Seen>,
    handle: thread::JoinHandle<()>,
}

impl TestServer {
    fn finish(self) -> Vec<Seen> {
        self.handle.join().expect("join server");
        self.seen.try_iter().collect()
    }
}

/// Serve `responses` in order, one per request, then stop
fn spawn_server(responses: Vec<(u16, String)>) -> TestServer {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let (tx, seen) = mpsc::channel();

    let handle = thread::spawn(move || {
        for (status, body) in responses {
            let mut req = server.recv().expect("request");

            let header = |name: &str| {
                req.headers()
                    .iter()
                    .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
                    .map(|h| h.value.as_str().to_string())
            };
            let authorization = header("Authorization");
            let cookie = header("Cookie");

            let mut content = String::new();
            req.as_reader().read_to_string(&mut content).expect("body");

            tx.send(Seen {
                method: req.method().to_string(),
                url: req.url().to_string(),
                authorization,
                cookie,
                body: content,
            })
            .expect("send");

            let resp = Response::from_string(body)
                .with_status_code(StatusCode(status))
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            req.respond(resp).expect("respond");
        }
    });

    TestServer {
        base_url,
        seen,
        handle,
    }
}

fn config_for(base_url: &str, key_dir: &Path) -> ConnectConfig {
    let key_path = key_dir.join("AuthKey_TEST.p8");
    std::fs::write(&key_path, TEST_KEY).expect("write key");

    let mut config = ConnectConfig::with_credentials(Credentials {
        key_id: "KEY1234567".to_string(),
        issuer_id: "issuer-1".to_string(),
        private_key_path: key_path,
        app_id: Some("6450000000".to_string()),
        bundle_id: Some("com.example.app".to_string()),
    });
    config.api_base_url = format!("{}/v1", base_url);
    config.web_base_url = format!("{}/ra", base_url);
    config
}

fn client_for(config: ConnectConfig) -> Client {
    let transport = ReqwestTransport::new(TlsMode::Verify, None).expect("transport");
    Client::with_transport(config, Arc::new(transport)).expect("client")
}

#[tokio::test]
async fn bearer_token_is_sent_on_api_requests() {
    let server = spawn_server(vec![(200, json!({ "data": [] }).to_string())]);
    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&server.base_url, temp.path()));

    let apps = client.list_apps().await.unwrap();
    assert!(apps.is_empty());

    let seen = server.finish();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/v1/apps");
    let auth = seen[0].authorization.as_deref().unwrap();
    assert!(auth.starts_with("Bearer "));
    assert_eq!(auth.matches('.').count(), 2);
}

#[tokio::test]
async fn not_found_carries_the_requested_path() {
    let server = spawn_server(vec![(
        404,
        json!({ "errors": [{ "status": "404", "code": "NOT_FOUND", "detail": "There is no resource of type 'builds' with id 'nope'" }] })
            .to_string(),
    )]);
    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&server.base_url, temp.path()));

    let err = client.get_build("nope").await.unwrap_err();
    match err {
        Error::Api(ApiError::NotFound { ref path, .. }) => assert_eq!(path, "/builds/nope"),
        ref other => panic!("unexpected {:?}", other),
    }
    assert!(err.to_string().contains("/builds/nope"));
    server.finish();
}

#[tokio::test]
async fn error_documents_become_generic_with_detail() {
    let server = spawn_server(vec![(
        409,
        json!({ "errors": [
            { "status": "409", "title": "Conflict", "detail": "versionString already used" },
            { "status": "409", "title": "Conflict" }
        ]})
        .to_string(),
    )]);
    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&server.base_url, temp.path()));

    let err = client
        .create_version(appconnect_client::resources::Platform::Ios, "1.0")
        .await
        .unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Generic));
    assert!(err.to_string().contains("versionString already used; Conflict"));

    let seen = server.finish();
    let body: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["data"]["type"], "appStoreVersions");
}

#[tokio::test]
async fn rate_limit_reports_retry_after() {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let req = server.recv().expect("request");
        let resp = Response::from_string("")
            .with_status_code(StatusCode(429))
            .with_header(Header::from_bytes("Retry-After", "12").expect("header"));
        req.respond(resp).expect("respond");
    });

    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&base_url, temp.path()));
    let err = client.list_apps().await.unwrap_err();
    handle.join().expect("join server");

    match err {
        Error::Api(ApiError::RateLimited { retry_after, .. }) => assert_eq!(retry_after, Some(12)),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn pagination_follows_next_links() {
    // The next link must point back at the server, which is only known after bind
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let next = format!("{}/v1/apps?cursor=Mg", base_url);

    let handle = thread::spawn(move || {
        let pages = [
            json!({ "data": [{ "type": "apps", "id": "1" }], "links": { "next": next } }),
            json!({ "data": [{ "type": "apps", "id": "2" }, { "type": "apps", "id": "3" }] }),
        ];
        let mut urls = Vec::new();
        for page in pages {
            let req = server.recv().expect("request");
            urls.push(req.url().to_string());
            req.respond(Response::from_string(page.to_string())).expect("respond");
        }
        urls
    });

    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&base_url, temp.path()));
    let apps = client.list_apps().await.unwrap();

    let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    let urls = handle.join().expect("join server");
    assert_eq!(urls, vec!["/v1/apps".to_string(), "/v1/apps?cursor=Mg".to_string()]);
}

#[tokio::test]
async fn web_requests_send_the_session_cookie() {
    let server = spawn_server(vec![(200, json!({ "data": { "messages": [] } }).to_string())]);
    let temp = TempDir::new().unwrap();
    let mut config = config_for(&server.base_url, temp.path());
    config.session = Some("---\n- name: myacinfo\n  value: abc\n".to_string());
    let client = client_for(config);

    let messages = client
        .review_messages(appconnect_client::resources::Platform::Ios)
        .await
        .unwrap();
    assert!(messages.is_empty());

    let seen = server.finish();
    assert_eq!(seen[0].url, "/ra/apps/6450000000/platforms/ios/resolutionCenter?v=latest");
    assert_eq!(seen[0].cookie.as_deref(), Some("myacinfo=abc"));
    assert!(seen[0].authorization.is_none());
}

#[tokio::test]
async fn web_requests_without_session_fail_with_guidance() {
    let server = spawn_server(vec![(401, String::new())]);
    let temp = TempDir::new().unwrap();
    let client = client_for(config_for(&server.base_url, temp.path()));

    let err = client
        .review_messages(appconnect_client::resources::Platform::Ios)
        .await
        .unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::SessionRequired));
    assert!(err.to_string().contains("fastlane spaceauth"));
    server.finish();
}

#[test]
fn missing_key_file_fails_before_any_request() {
    let temp = TempDir::new().unwrap();
    let mut config = config_for("http://127.0.0.1:9", temp.path());
    config.credentials.private_key_path = temp.path().join("AuthKey_missing.p8");

    let err = Client::new(config).err().expect("construction must fail");
    assert!(err.is_config());
    assert!(err.to_string().contains("AuthKey_missing.p8"));
}

#[test]
fn blank_issuer_fails_before_any_request() {
    let temp = TempDir::new().unwrap();
    let mut config = config_for("http://127.0.0.1:9", temp.path());
    config.credentials.issuer_id = "  ".to_string();

    let err = Client::new(config).err().expect("construction must fail");
    assert!(err.is_config());
    assert!(err.to_string().contains("APP_STORE_CONNECT_ISSUER_ID"));
}
