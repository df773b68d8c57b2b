use crate::utils::error::{FundingError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Connection context for the record store: where it lives and which bearer
/// token (if any) to present. Built once at startup and handed to whatever
/// issues requests.
#[derive(Clone)]
pub struct Session {
    base_url: Url,
    token: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
pub(crate) struct MessageBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl Session {
    pub fn new(base_url: &str) -> Result<Self> {
        // 確保結尾有 '/'，join 時才不會吃掉最後一段路徑 (例如 /api)
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            base_url: Url::parse(&normalized)?,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Attaches the bearer token, when there is one.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Exchanges credentials for a token at `POST /auth/login`.
    pub async fn login(client: &Client, base_url: &str, email: &str, password: &str) -> Result<Self> {
        let session = Self::new(base_url)?;
        let url = session.endpoint("auth/login")?;
        tracing::debug!("Logging in as {} at {}", email, url);

        let response = client
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: LoginResponse = response.json().await?;
            tracing::info!("🔑 Logged in as {}", email);
            return Ok(session.with_token(body.token));
        }

        let message = read_message(response).await;
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(FundingError::Unauthorized { message }),
            _ => Err(FundingError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `message` (or `error`) from a JSON error body, falling back to the status text.
pub(crate) async fn read_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<MessageBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let session = Session::new("http://localhost:5000/api").unwrap();
        assert_eq!(
            session.endpoint("fundings").unwrap().as_str(),
            "http://localhost:5000/api/fundings"
        );
        assert_eq!(
            session.endpoint("/auth/login").unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
    }

    #[test]
    fn test_blank_token_is_no_token() {
        let session = Session::new("http://localhost:5000/api").unwrap().with_token("  ");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("http://localhost/api").unwrap().with_token("secret-token");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_login_returns_authenticated_session() {
        let server = MockServer::start();
        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/login")
                .json_body(json!({"email": "admin@example.com", "password": "pw"}));
            then.status(200).json_body(json!({"token": "jwt-token"}));
        });

        let client = Client::new();
        let session = Session::login(&client, &server.url("/api"), "admin@example.com", "pw")
            .await
            .unwrap();

        login_mock.assert();
        assert_eq!(session.token(), Some("jwt-token"));
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(400).json_body(json!({"message": "Invalid credentials"}));
        });

        let client = Client::new();
        let result = Session::login(&client, &server.url("/api"), "admin@example.com", "wrong").await;

        match result {
            Err(FundingError::Unauthorized { message }) => assert_eq!(message, "Invalid credentials"),
            other => panic!("expected unauthorized, got {:?}", other),
        }
    }
}
