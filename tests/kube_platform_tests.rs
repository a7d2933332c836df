//! # Kubernetes Platform Tests
//!
//! Drives [`KubePlatform`] against a mocked API server over HTTP.
//!
//! These tests verify:
//! - Create-or-replace is POST, then on `409 AlreadyExists` a GET and a PUT
//! - The PUT carries the fetched `resourceVersion` and only the rendered keys
//! - API `Status` responses map to `PlatformError::Rejected` with their reason
//! - `404 NotFound` on reads is absence, not an error

mod common;

use common::init_rustls;
use kube::{Client, Config};
use serde_json::{json, Value};
use sshfs_keysync::config::ResourceNames;
use sshfs_keysync::keys::KeyMaterial;
use sshfs_keysync::platform::{KubePlatform, Platform, PlatformError};
use sshfs_keysync::reconciler::render_desired_state;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SECRETS_PATH: &str = "/api/v1/namespaces/swlabpods/secrets";
const SECRET_PATH: &str = "/api/v1/namespaces/swlabpods/secrets/backend-ssh-key";
const CONFIG_MAP_PATH: &str = "/api/v1/namespaces/swlabpods/configmaps/backend-public-key";

fn platform_for(server: &MockServer) -> KubePlatform {
    init_rustls();
    let config = Config::new(server.uri().parse().expect("mock server uri"));
    let client = Client::try_from(config).expect("client for mock server");
    KubePlatform::new(client)
}

fn rendered_secret() -> k8s_openapi::api::core::v1::Secret {
    let keys = KeyMaterial::new(b"PRIVATE-BYTES".to_vec(), b"PUBLIC-BYTES".to_vec());
    render_desired_state(&keys, &ResourceNames::default()).secret
}

/// API server `Status` body for a failed request
fn status(code: u16, reason: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    }))
}

fn echo(code: u16) -> impl Fn(&Request) -> ResponseTemplate {
    move |req: &Request| ResponseTemplate::new(code).set_body_raw(req.body.clone(), "application/json")
}

fn existing_secret() -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": "backend-ssh-key",
            "namespace": "swlabpods",
            "resourceVersion": "4711",
            "creationTimestamp": "2026-01-01T00:00:00Z"
        },
        "type": "Opaque",
        "data": {
            "extra": "bGVmdC1iZWhpbmQ=",
            "id_rsa": "c3RhbGU="
        }
    })
}

async fn requests(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|r| (r.method.as_str().to_string(), r.url.path().to_string()))
        .collect()
}

#[tokio::test]
async fn test_apply_secret_creates_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SECRETS_PATH))
        .respond_with(echo(201))
        .expect(1)
        .mount(&server)
        .await;

    platform_for(&server)
        .apply_secret(&rendered_secret())
        .await
        .unwrap();

    assert_eq!(
        requests(&server).await,
        vec![("POST".to_string(), SECRETS_PATH.to_string())]
    );
    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default();
    assert!(query.contains("fieldManager=sshfs-keysync"), "query was {query}");
}

#[tokio::test]
async fn test_apply_secret_replaces_existing_with_current_resource_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SECRETS_PATH))
        .respond_with(status(409, "AlreadyExists", "secrets \"backend-ssh-key\" already exists"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(existing_secret()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(SECRET_PATH))
        .respond_with(echo(200))
        .expect(1)
        .mount(&server)
        .await;

    platform_for(&server)
        .apply_secret(&rendered_secret())
        .await
        .unwrap();

    assert_eq!(
        requests(&server).await,
        vec![
            ("POST".to_string(), SECRETS_PATH.to_string()),
            ("GET".to_string(), SECRET_PATH.to_string()),
            ("PUT".to_string(), SECRET_PATH.to_string()),
        ]
    );

    let received = server.received_requests().await.unwrap();
    let put: Value = received[2].body_json().unwrap();
    assert_eq!(put["metadata"]["resourceVersion"], "4711");
    assert_eq!(put["type"], "Opaque");
    // Full replace: only the rendered keys, the foreign one is gone
    assert_eq!(
        put["data"],
        json!({
            "id_rsa": "UFJJVkFURS1CWVRFUw==",
            "id_rsa.pub": "UFVCTElDLUJZVEVT"
        })
    );
}

#[tokio::test]
async fn test_apply_secret_forbidden_is_rejected_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SECRETS_PATH))
        .respond_with(status(403, "Forbidden", "secrets is forbidden"))
        .mount(&server)
        .await;

    let err = platform_for(&server)
        .apply_secret(&rendered_secret())
        .await
        .unwrap_err();

    match &err {
        PlatformError::Rejected { code, reason, message } => {
            assert_eq!(*code, 403);
            assert_eq!(reason, "Forbidden");
            assert_eq!(message, "secrets is forbidden");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert!(!err.is_already_exists());
    assert_eq!(requests(&server).await.len(), 1);
}

#[tokio::test]
async fn test_conflict_on_replace_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SECRETS_PATH))
        .respond_with(status(409, "AlreadyExists", "already exists"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(existing_secret()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(SECRET_PATH))
        .respond_with(status(409, "Conflict", "the object has been modified"))
        .mount(&server)
        .await;

    let err = platform_for(&server)
        .apply_secret(&rendered_secret())
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        PlatformError::Rejected { code: 409, reason, .. } if reason == "Conflict"
    ));
    assert!(!err.is_already_exists());
}

#[tokio::test]
async fn test_create_namespace_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/namespaces"))
        .respond_with(status(409, "AlreadyExists", "namespaces \"swlabpods\" already exists"))
        .mount(&server)
        .await;

    let err = platform_for(&server)
        .create_namespace("swlabpods")
        .await
        .unwrap_err();

    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_missing_objects_read_as_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/swlabpods"))
        .respond_with(status(404, "NotFound", "namespaces \"swlabpods\" not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(status(404, "NotFound", "secrets \"backend-ssh-key\" not found"))
        .mount(&server)
        .await;

    let platform = platform_for(&server);

    assert!(!platform.namespace_exists("swlabpods").await.unwrap());
    assert_eq!(
        platform
            .get_secret("swlabpods", "backend-ssh-key")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_get_config_map_merges_data_and_binary_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONFIG_MAP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "backend-public-key",
                "namespace": "swlabpods",
                "creationTimestamp": "2026-10-18T09:30:00Z"
            },
            "data": { "id_rsa.pub": "PUBLIC-BYTES" },
            "binaryData": { "blob": "//4=" }
        })))
        .mount(&server)
        .await;

    let stored = platform_for(&server)
        .get_config_map("swlabpods", "backend-public-key")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored.data["id_rsa.pub"], b"PUBLIC-BYTES");
    assert_eq!(stored.data["blob"], vec![0xff, 0xfe]);
    assert!(stored
        .creation_timestamp
        .as_deref()
        .is_some_and(|ts| ts.starts_with("2026-10-18T09:30:00")));
}
