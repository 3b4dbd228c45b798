//! Shared helpers for the in-process router tests: seeded identities, signed
//! bearer headers, and oneshot request plumbing.

use axum::extract::FromRef;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::app::build_app;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::hash_password;
use crate::state::AppState;
use crate::users::repo::{self, NewUser, Role};

pub const TEST_PASSWORD: &str = "password1";

pub async fn seed_user(
    state: &AppState,
    email: &str,
    document: &str,
    role: Role,
    active: bool,
) -> i64 {
    let hash = hash_password(TEST_PASSWORD).expect("hash test password");
    repo::create(
        &state.db,
        NewUser {
            first_name: "Test",
            last_name: "User",
            birth_date: "1990-01-01",
            document,
            email,
            password_hash: &hash,
            role,
            active,
            confirmation_token: None,
        },
    )
    .await
    .expect("seed user")
}

pub fn bearer(state: &AppState, id: i64, role: Role) -> String {
    let keys = JwtKeys::from_ref(state);
    format!("Bearer {}", keys.sign(id, role).expect("sign test token"))
}

/// Drive the full router once and return the status plus the parsed JSON body
/// (Null when the response has no JSON body, e.g. redirects).
pub async fn request(
    state: &AppState,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    json: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    let req = match json {
        Some(v) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&v).expect("encode body")))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let res = build_app(state.clone()).oneshot(req).await.expect("oneshot");
    let status = res.status();
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(state: &AppState, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
    request(state, "GET", uri, auth, None).await
}

pub async fn post_json(state: &AppState, uri: &str, json: Value) -> (StatusCode, Value) {
    request(state, "POST", uri, None, Some(json)).await
}

const BOUNDARY: &str = "shopdesk-test-boundary";

/// Hand-rolled multipart/form-data body: text fields plus an optional file
/// part.
pub async fn multipart(
    state: &AppState,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> (StatusCode, Value) {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        "Content-Type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    let req = builder.body(Body::from(body)).expect("build request");

    let res = build_app(state.clone()).oneshot(req).await.expect("oneshot");
    let status = res.status();
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, parsed)
}
