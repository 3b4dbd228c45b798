use axum::{
    extract::{FromRef, Path, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use crate::users::repo::{self, NewUser, Role};

use super::confirm::confirmation_token;
use super::dto::{LoginRequest, RegisterRequest};
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/confirm/:hash", get(confirm))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required(v: &Option<String>) -> Result<&str, ApiError> {
    match v.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ApiError::malformed()),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Envelope, ApiError> {
    let first_name = required(&payload.first_name)?;
    let last_name = required(&payload.last_name)?;
    let birth_date = required(&payload.birth_date)?;
    let document = required(&payload.document)?;
    let email = required(&payload.email)?.to_lowercase();
    let password = required(&payload.password)?;

    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email."));
    }

    if repo::find_by_email_or_document(&state.db, &email, document)
        .await?
        .is_some()
    {
        return Err(ApiError::duplicate_identity());
    }

    if password.len() < 6 {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters.",
        ));
    }

    let password_hash = hash_password(password)?;

    let issued_at = crate::db::now_rfc3339()?;
    let token = confirmation_token(&email, document, &issued_at);
    let confirm_url = format!("{}/auth/confirm/{}", state.config.api_url, token);

    // Best effort: the account is created whether or not delivery works, and
    // a failed send is only observable in the logs.
    if let Err(e) = state
        .mailer
        .send_confirmation_email(&email, first_name, &confirm_url)
        .await
    {
        warn!(error = %e, email = %email, "confirmation email failed, continuing");
    }

    let id = repo::create(
        &state.db,
        NewUser {
            first_name,
            last_name,
            birth_date,
            document,
            email: &email,
            password_hash: &password_hash,
            role: Role::User,
            active: false,
            confirmation_token: Some(&token),
        },
    )
    .await?;

    info!(user_id = id, "user registered, awaiting confirmation");
    Ok(Envelope::created().with("id", id))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Envelope, ApiError> {
    let email = required(&payload.email)?.to_lowercase();
    let password = required(&payload.password)?;

    let user = repo::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::invalid_credentials());
    }

    if !user.active {
        return Err(ApiError::needs_activation());
    }

    let token = JwtKeys::from_ref(&state).sign(user.id, user.role)?;

    info!(user_id = user.id, "user logged in");
    Ok(Envelope::ok().with("token", token))
}

#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Redirect, ApiError> {
    let user = repo::find_by_confirmation_token(&state.db, &hash)
        .await?
        .ok_or_else(|| ApiError::bad_request("Unknown confirmation token."))?;

    if user.active {
        return Err(ApiError::bad_request("Account already confirmed."));
    }

    repo::activate(&state.db, user.id).await?;

    info!(user_id = user.id, "account confirmed");
    Ok(Redirect::temporary(&state.config.web_url))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::state::AppState;
    use crate::testutil::{get, post_json, request};
    use crate::users::repo;

    fn valid_registration() -> serde_json::Value {
        json!({
            "firstName": "A",
            "lastName": "B",
            "birthDate": "2000-01-01",
            "document": "123",
            "email": "a@b.com",
            "password": "secret1"
        })
    }

    #[tokio::test]
    async fn register_confirm_login_flow() {
        let state = AppState::for_tests().await;

        // Register: 201 with an id.
        let (status, body) = post_json(&state, "/auth/register", valid_registration()).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        // Login before confirmation is blocked.
        let creds = json!({"email": "a@b.com", "password": "secret1"});
        let (status, body) = post_json(&state, "/auth/login", creds.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["alias"], "USER_NOT_ACTIVE");

        // Confirm through the emailed link, then login succeeds.
        let user = repo::find_by_id(&state.db, id).await.unwrap().unwrap();
        let hash = user.confirmation_token.unwrap();
        let (status, _) = get(&state, &format!("/auth/confirm/{hash}"), None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);

        let (status, body) = post_json(&state, "/auth/login", creds).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().unwrap().contains('.'));
    }

    #[tokio::test]
    async fn register_rejects_short_passwords() {
        let state = AppState::for_tests().await;
        let mut payload = valid_registration();
        payload["password"] = json!("abc");

        let (status, body) = post_json(&state, "/auth/register", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("6 characters"));
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let state = AppState::for_tests().await;
        let mut payload = valid_registration();
        payload["document"] = json!("");

        let (status, body) = post_json(&state, "/auth/register", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["alias"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_or_document() {
        let state = AppState::for_tests().await;
        let (status, _) = post_json(&state, "/auth/register", valid_registration()).await;
        assert_eq!(status, StatusCode::CREATED);

        // Same document, different email.
        let mut dup = valid_registration();
        dup["email"] = json!("other@b.com");
        let (status, body) = post_json(&state, "/auth/register", dup).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["alias"], "EMAIL_OR_DOCUMENT_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn login_rejects_unknown_email_and_wrong_password() {
        let state = AppState::for_tests().await;
        let (status, body) = post_json(
            &state,
            "/auth/login",
            json!({"email": "ghost@b.com", "password": "secret1"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid email or password");

        post_json(&state, "/auth/register", valid_registration()).await;
        let (status, body) = post_json(
            &state,
            "/auth/login",
            json!({"email": "a@b.com", "password": "wrong-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid email or password");
    }

    #[tokio::test]
    async fn confirm_rejects_unknown_and_reused_tokens() {
        let state = AppState::for_tests().await;
        let (status, body) = get(&state, "/auth/confirm/deadbeef", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Unknown"));

        let (_, body) = post_json(&state, "/auth/register", valid_registration()).await;
        let id = body["id"].as_i64().unwrap();
        let user = repo::find_by_id(&state.db, id).await.unwrap().unwrap();
        let hash = user.confirmation_token.unwrap();

        let (status, _) = get(&state, &format!("/auth/confirm/{hash}"), None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);

        // The token survives on the row; a second visit is rejected because
        // the account is already active.
        let (status, body) = get(&state, &format!("/auth/confirm/{hash}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("already"));
    }

    #[tokio::test]
    async fn issued_token_passes_the_guard() {
        let state = AppState::for_tests().await;
        let (_, body) = post_json(&state, "/auth/register", valid_registration()).await;
        let id = body["id"].as_i64().unwrap();
        let user = repo::find_by_id(&state.db, id).await.unwrap().unwrap();
        let hash = user.confirmation_token.unwrap();
        get(&state, &format!("/auth/confirm/{hash}"), None).await;

        let (_, body) = post_json(
            &state,
            "/auth/login",
            json!({"email": "a@b.com", "password": "secret1"}),
        )
        .await;
        let bearer = format!("Bearer {}", body["token"].as_str().unwrap());

        let (status, body) = request(&state, "GET", "/me", Some(&bearer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["firstName"], "A");
    }
}
