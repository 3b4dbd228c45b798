//! Uniform response envelope and API error type.
//!
//! Every JSON response carries a `{message, code, alias}` triple merged with
//! payload fields (`token`, `id`, `total`, `data`). The HTTP status always
//! mirrors `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

/// Success envelope. Extra payload fields are flattened next to the triple.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub message: String,
    pub code: u16,
    pub alias: &'static str,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            message: "The request succeeded.".into(),
            code: 200,
            alias: "OK",
            extra: Map::new(),
        }
    }

    pub fn created() -> Self {
        Self {
            message: "The request succeeded, and a new resource was created as a result.".into(),
            code: 201,
            alias: "CREATED",
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.extra.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Everything a handler can fail with, rendered as the standard envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        alias: &'static str,
        message: String,
    },
    #[error("{message}")]
    Unauthorized {
        alias: &'static str,
        message: String,
    },
    #[error("The client does not have access rights to the content.")]
    Forbidden,
    #[error("The server cannot find the requested resource.")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            alias: "BAD_REQUEST",
            message: message.into(),
        }
    }

    /// Generic "fields are missing or malformed" rejection.
    pub fn malformed() -> Self {
        Self::bad_request(
            "The server cannot process the request. caused by malformed request syntax, \
             invalid request message framing, or deceptive request routing",
        )
    }

    pub fn duplicate_identity() -> Self {
        Self::BadRequest {
            alias: "EMAIL_OR_DOCUMENT_ALREADY_EXISTS",
            message: "Email or document already exists.".into(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::Unauthorized {
            alias: "UNAUTHORIZED",
            message: "invalid email or password".into(),
        }
    }

    pub fn needs_activation() -> Self {
        Self::Unauthorized {
            alias: "USER_NOT_ACTIVE",
            message: "Account pending email confirmation.".into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            alias: "UNAUTHORIZED",
            message: "The client must authenticate itself to get the requested response.".into(),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest { alias, message } => {
                (StatusCode::BAD_REQUEST, *alias, message.clone())
            }
            Self::Unauthorized { alias, message } => {
                (StatusCode::UNAUTHORIZED, *alias, message.clone())
            }
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            // Message forwarded verbatim, mirroring the envelope contract.
            Self::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                e.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        let (status, alias, message) = self.parts();
        let body = Envelope {
            message,
            code: status.as_u16(),
            alias,
            extra: Map::new(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_merges_payload_fields() {
        let env = Envelope::created().with("id", 7);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["code"], 201);
        assert_eq!(json["alias"], "CREATED");
        assert_eq!(json["id"], 7);
        assert!(json["message"].as_str().unwrap().contains("created"));
    }

    #[test]
    fn error_status_mirrors_code() {
        let cases = [
            (ApiError::malformed(), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized(), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn duplicate_identity_uses_dedicated_alias() {
        let (status, alias, message) = ApiError::duplicate_identity().parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(alias, "EMAIL_OR_DOCUMENT_ALREADY_EXISTS");
        assert!(message.contains("already exists"));
    }
}
