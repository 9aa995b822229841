//! Integration tests for token attach and the refresh-and-retry pipeline

use std::sync::{Arc, Mutex};

use hospital_client::{
    ApiRequest, AuthenticatedClient, ClientConfig, ClientError, ExpiryReason, MemorySessionStore,
    RefreshPolicy, SessionExpired, SessionKey, SessionStore,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{Value, json};

struct Harness {
    server: ServerGuard,
    store: Arc<MemorySessionStore>,
    client: AuthenticatedClient,
    expired: Arc<Mutex<Vec<SessionExpired>>>,
}

async fn harness(policy: RefreshPolicy) -> Harness {
    let server = Server::new_async().await;
    let store = Arc::new(MemorySessionStore::new());
    let expired = Arc::new(Mutex::new(Vec::new()));

    let mut config = ClientConfig::new(&server.url()).expect("valid mock server url");
    config.refresh_policy = policy;

    let recorder = expired.clone();
    let client = AuthenticatedClient::builder(config, store.clone())
        .on_session_expired(move |event: &SessionExpired| {
            recorder.lock().unwrap().push(event.clone());
        })
        .build()
        .expect("client should build");

    Harness {
        server,
        store,
        client,
        expired,
    }
}

fn seed(store: &MemorySessionStore, access: Option<&str>, refresh: Option<&str>) {
    if let Some(access) = access {
        store.set(SessionKey::AccessToken, access).unwrap();
    }
    if let Some(refresh) = refresh {
        store.set(SessionKey::RefreshToken, refresh).unwrap();
    }
    store
        .set(
            SessionKey::User,
            r#"{"id":1,"username":"admin","email":"a@b.c","first_name":"","last_name":""}"#,
        )
        .unwrap();
}

fn assert_store_cleared(store: &MemorySessionStore) {
    for key in SessionKey::ALL {
        assert_eq!(store.get(key).unwrap(), None, "{key} should be cleared");
    }
}

#[tokio::test]
async fn stored_access_token_is_attached() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("access-1"), Some("refresh-1"));

    let mock = h
        .server
        .mock("GET", "/api/patients/")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    //* When
    let body: Value = h
        .client
        .send_json(ApiRequest::get("/api/patients/"))
        .await
        .expect("request should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn request_without_token_is_sent_unauthenticated() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;

    let mock = h
        .server
        .mock("POST", "/api/auth/login/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    //* When
    let request = ApiRequest::post("/api/auth/login/")
        .json(&json!({ "username": "admin", "password": "pw" }))
        .unwrap();
    let result = h.client.send_empty(request).await;

    //* Then
    mock.assert_async().await;
    assert!(result.is_ok(), "unexpected error: {result:?}");
}

#[tokio::test]
async fn unauthorized_request_is_refreshed_and_retried_once() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("expired"), Some("refresh-1"));

    let rejected = h
        .server
        .mock("GET", "/api/doctors/")
        .match_header("authorization", "Bearer expired")
        .with_status(401)
        .with_body(r#"{"detail": "Given token not valid for any token type"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "refresh": "refresh-1" })))
        .with_status(200)
        .with_body(r#"{"access": "access-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let retried = h
        .server
        .mock("GET", "/api/doctors/")
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(r#"{"results": [{"id": 3}]}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let body: Value = h
        .client
        .send_json(ApiRequest::get("/api/doctors/"))
        .await
        .expect("retried request should succeed");

    //* Then
    rejected.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;
    assert_eq!(body["results"][0]["id"], 3);
    assert_eq!(
        h.store.get(SessionKey::AccessToken).unwrap().as_deref(),
        Some("access-2")
    );
    assert_eq!(
        h.store.get(SessionKey::RefreshToken).unwrap().as_deref(),
        Some("refresh-1"),
        "refresh must never rotate the stored refresh token"
    );
    assert!(h.expired.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_refresh_token_clears_session_and_expires() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("expired"), None);

    let rejected = h
        .server
        .mock("GET", "/api/mappings/")
        .with_status(401)
        .with_body(r#"{"detail": "Authentication credentials were not provided."}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::get("/api/mappings/"))
        .await
        .expect_err("request should fail");

    //* Then
    rejected.assert_async().await;
    refresh.assert_async().await;
    assert!(
        matches!(error, ClientError::Status { status, .. } if status == 401),
        "original failure should be propagated, got {error:?}"
    );
    assert_eq!(
        error.detail(),
        Some("Authentication credentials were not provided.")
    );
    assert_store_cleared(&h.store);
    assert_eq!(
        *h.expired.lock().unwrap(),
        vec![SessionExpired {
            login_path: "/auth/login".to_string(),
            reason: ExpiryReason::MissingRefreshToken,
        }]
    );
}

#[tokio::test]
async fn failed_refresh_clears_session_without_looping() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("expired"), Some("revoked"));

    let rejected = h
        .server
        .mock("DELETE", "/api/patients/4/")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .with_status(401)
        .with_body(r#"{"detail": "Token is blacklisted"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::delete("/api/patients/4/"))
        .await
        .expect_err("request should fail");

    //* Then
    rejected.assert_async().await;
    refresh.assert_async().await;
    assert!(
        matches!(error, ClientError::RefreshFailed { .. }),
        "refresh failure should be propagated, got {error:?}"
    );
    assert_eq!(error.detail(), Some("Token is blacklisted"));
    assert!(error.is_unauthorized());
    assert_store_cleared(&h.store);

    let expired = h.expired.lock().unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].reason, ExpiryReason::RefreshFailed);
}

#[tokio::test]
async fn undecodable_refresh_response_counts_as_refresh_failure() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("expired"), Some("refresh-1"));

    h.server
        .mock("GET", "/api/auth/profile/")
        .with_status(401)
        .create_async()
        .await;
    h.server
        .mock("POST", "/api/auth/token/refresh/")
        .with_status(200)
        .with_body(r#"{"token": "wrong-field"}"#)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::get("/api/auth/profile/"))
        .await
        .expect_err("request should fail");

    //* Then
    match error {
        ClientError::RefreshFailed { source } => {
            assert!(matches!(*source, ClientError::Decode { .. }), "got {source:?}")
        }
        other => panic!("expected RefreshFailed, got {other:?}"),
    }
    assert_store_cleared(&h.store);
}

#[tokio::test]
async fn second_unauthorized_response_passes_through() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("stale"), Some("refresh-1"));

    let first = h
        .server
        .mock("GET", "/api/patients/")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .with_status(200)
        .with_body(r#"{"access": "fresh"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = h
        .server
        .mock("GET", "/api/patients/")
        .match_header("authorization", "Bearer fresh")
        .with_status(401)
        .with_body(r#"{"detail": "User is inactive"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::get("/api/patients/"))
        .await
        .expect_err("request should fail");

    //* Then
    first.assert_async().await;
    refresh.assert_async().await;
    second.assert_async().await;
    assert!(matches!(error, ClientError::Status { status, .. } if status == 401));
    assert_eq!(error.detail(), Some("User is inactive"));
    assert!(h.expired.lock().unwrap().is_empty());
    assert_eq!(
        h.store.get(SessionKey::AccessToken).unwrap().as_deref(),
        Some("fresh")
    );
}

#[tokio::test]
async fn other_failures_are_not_intercepted() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("access-1"), Some("refresh-1"));

    h.server
        .mock("GET", "/api/patients/99/")
        .with_status(404)
        .with_body(r#"{"detail": "Not found."}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::get("/api/patients/99/"))
        .await
        .expect_err("request should fail");

    //* Then
    refresh.assert_async().await;
    assert_eq!(error.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(
        h.store.get(SessionKey::AccessToken).unwrap().as_deref(),
        Some("access-1")
    );
}

#[tokio::test]
async fn single_flight_refreshes_once_for_concurrent_requests() {
    //* Given
    let mut h = harness(RefreshPolicy::SingleFlight).await;
    seed(&h.store, Some("old"), Some("refresh-1"));

    for path in ["/api/patients/", "/api/doctors/"] {
        h.server
            .mock("GET", path)
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .create_async()
            .await;
        h.server
            .mock("GET", path)
            .match_header("authorization", "Bearer new")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
    }
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .with_status(200)
        .with_body(r#"{"access": "new"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let (patients, doctors) = tokio::join!(
        h.client.send_empty(ApiRequest::get("/api/patients/")),
        h.client.send_empty(ApiRequest::get("/api/doctors/")),
    );

    //* Then
    assert!(patients.is_ok(), "patients failed: {patients:?}");
    assert!(doctors.is_ok(), "doctors failed: {doctors:?}");
    refresh.assert_async().await;
}

#[tokio::test]
async fn empty_access_token_is_sent_unauthenticated() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some(""), None);

    let mock = h
        .server
        .mock("POST", "/api/auth/login/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    //* When
    let request = ApiRequest::post("/api/auth/login/")
        .json(&json!({ "username": "admin", "password": "pw" }))
        .unwrap();
    let result = h.client.send_empty(request).await;

    //* Then
    mock.assert_async().await;
    assert!(result.is_ok(), "unexpected error: {result:?}");
}

#[tokio::test]
async fn empty_refresh_token_is_treated_as_missing() {
    //* Given
    let mut h = harness(RefreshPolicy::default()).await;
    seed(&h.store, Some("stale"), Some(""));

    let rejected = h
        .server
        .mock("GET", "/api/patients/")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    //* When
    let error = h
        .client
        .send_empty(ApiRequest::get("/api/patients/"))
        .await
        .expect_err("request should fail");

    //* Then
    rejected.assert_async().await;
    refresh.assert_async().await;
    assert!(
        matches!(error, ClientError::Status { status, .. } if status == 401),
        "original failure should be propagated, got {error:?}"
    );
    assert_store_cleared(&h.store);
    assert_eq!(
        *h.expired.lock().unwrap(),
        vec![SessionExpired {
            login_path: "/auth/login".to_string(),
            reason: ExpiryReason::MissingRefreshToken,
        }]
    );
}

#[tokio::test]
async fn per_request_policy_refreshes_for_each_concurrent_request() {
    //* Given
    let mut h = harness(RefreshPolicy::PerRequest).await;
    seed(&h.store, Some("old"), Some("refresh-1"));

    for path in ["/api/patients/", "/api/doctors/"] {
        h.server
            .mock("GET", path)
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .create_async()
            .await;
        h.server
            .mock("GET", path)
            .match_header("authorization", "Bearer new")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
    }
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .match_body(Matcher::Json(json!({ "refresh": "refresh-1" })))
        .with_status(200)
        .with_body(r#"{"access": "new"}"#)
        .expect(2)
        .create_async()
        .await;

    //* When
    let (patients, doctors) = tokio::join!(
        h.client.send_empty(ApiRequest::get("/api/patients/")),
        h.client.send_empty(ApiRequest::get("/api/doctors/")),
    );

    //* Then
    assert!(patients.is_ok(), "patients failed: {patients:?}");
    assert!(doctors.is_ok(), "doctors failed: {doctors:?}");
    refresh.assert_async().await;
    assert_eq!(
        h.store.get(SessionKey::AccessToken).unwrap().as_deref(),
        Some("new")
    );
}

#[tokio::test]
async fn single_flight_failed_refresh_expires_session_once() {
    //* Given
    let mut h = harness(RefreshPolicy::SingleFlight).await;
    seed(&h.store, Some("old"), Some("revoked"));

    for path in ["/api/patients/", "/api/doctors/"] {
        h.server
            .mock("GET", path)
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
    }
    let refresh = h
        .server
        .mock("POST", "/api/auth/token/refresh/")
        .with_status(401)
        .with_body(r#"{"detail": "Token is blacklisted"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let (patients, doctors) = tokio::join!(
        h.client.send_empty(ApiRequest::get("/api/patients/")),
        h.client.send_empty(ApiRequest::get("/api/doctors/")),
    );

    //* Then
    refresh.assert_async().await;
    let errors = [
        patients.expect_err("patients should fail"),
        doctors.expect_err("doctors should fail"),
    ];
    let refresh_failures = errors
        .iter()
        .filter(|e| matches!(e, ClientError::RefreshFailed { .. }))
        .count();
    let passed_through = errors
        .iter()
        .filter(|e| matches!(e, ClientError::Status { status, .. } if *status == 401))
        .count();
    assert_eq!(refresh_failures, 1, "got {errors:?}");
    assert_eq!(passed_through, 1, "got {errors:?}");

    assert_store_cleared(&h.store);
    let expired = h.expired.lock().unwrap();
    assert_eq!(expired.len(), 1, "host should be notified once");
    assert_eq!(expired[0].reason, ExpiryReason::RefreshFailed);
}
