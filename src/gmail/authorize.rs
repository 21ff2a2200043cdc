//! One-time interactive OAuth authorization
//!
//! Opens the Google consent page, receives the authorization code on a
//! loopback callback server, exchanges it and persists the resulting token.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::error::{AuthError, GmailMcpError, Result};
use crate::gmail::auth::{
    describe_token_error, AuthorizationToken, ClientSecret, CredentialStore, TokenResponse,
    TokenSource,
};

/// How long to wait for the user to finish the consent page
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Callback path on the loopback server
const CALLBACK_PATH: &str = "/oauth2callback";

/// Random CSRF state for the authorization request
fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect()
}

/// Generate the authorization URL
pub fn authorization_url(
    keys: &ClientSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
        keys.auth_uri,
        urlencoding::encode(&keys.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        urlencoding::encode(state),
    )
}

/// Exchange an authorization code for tokens and persist them
pub async fn exchange_code(
    store: &CredentialStore,
    keys: &ClientSecret,
    code: &str,
    redirect_uri: &str,
) -> Result<AuthorizationToken> {
    let params = [
        ("client_id", keys.client_id.as_str()),
        ("client_secret", keys.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];

    let http_client = reqwest::Client::builder()
        .timeout(store.config().request_timeout)
        .build()?;

    let response = http_client
        .post(&keys.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| GmailMcpError::from_transport("code exchange", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(GmailMcpError::Auth(AuthError::TokenExchangeFailed {
            message: describe_token_error(status, &text),
        }));
    }

    let token_response: TokenResponse = response.json().await?;
    let token = AuthorizationToken::from_response(token_response, None, Utc::now());

    if !token.can_refresh() {
        tracing::warn!("Token endpoint returned no refresh token; re-authorization will be needed when the access token expires");
    }

    store.store(token.clone()).await?;
    Ok(token)
}

/// Outcome reported by the callback handler
enum CallbackOutcome {
    Code(String),
    Denied(String),
    StateMismatch,
    Missing,
}

/// Run the interactive authentication flow with a local HTTP server.
///
/// An existing valid token is left as is; an expired one is refreshed
/// instead of prompting when possible.
pub async fn authorize_interactive(store: &CredentialStore) -> Result<AuthorizationToken> {
    use axum::{extract::Query, response::Html, routing::get, Router};
    use tokio::sync::oneshot;

    let config = store.config().clone();
    let keys = store.client_secret()?;

    match store.load().await {
        Ok(token) if !token.is_expired_at(Utc::now(), config.expiry_skew) => {
            eprintln!("Valid token already exists at {}. No action needed.", config.token_path.display());
            return Ok(token);
        }
        Ok(token) if token.can_refresh() => {
            eprintln!("Refreshing expired token...");
            match store.ensure_valid().await {
                Ok(token) => {
                    eprintln!("Token saved to {}", config.token_path.display());
                    return Ok(token);
                }
                Err(e) => {
                    tracing::warn!("Refresh failed, falling back to consent flow: {}", e);
                }
            }
        }
        Ok(_) | Err(GmailMcpError::Auth(AuthError::MissingToken { .. })) => {}
        Err(GmailMcpError::Auth(AuthError::CorruptToken { message })) => {
            tracing::warn!("Ignoring unreadable token file: {}", message);
        }
        Err(e) => return Err(e),
    }

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.oauth_callback_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://localhost:{}{}", port, CALLBACK_PATH);

    let state = generate_state();
    let auth_url = authorization_url(&keys, &redirect_uri, &config.scopes, &state);

    eprintln!("\nPlease visit this URL to authenticate:");
    eprintln!("{}\n", auth_url);

    if let Err(e) = open::that(&auth_url) {
        eprintln!("Could not open browser automatically: {}", e);
        eprintln!("Please open the URL manually.");
    }

    let (tx, rx) = oneshot::channel::<CallbackOutcome>();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));

    let expected_state = state.clone();
    let tx_clone = tx.clone();
    let callback_handler = move |Query(params): Query<HashMap<String, String>>| async move {
        let outcome = if let Some(error) = params.get("error") {
            CallbackOutcome::Denied(error.clone())
        } else if params.get("state") != Some(&expected_state) {
            CallbackOutcome::StateMismatch
        } else if let Some(code) = params.get("code") {
            CallbackOutcome::Code(code.clone())
        } else {
            CallbackOutcome::Missing
        };

        let page = match &outcome {
            CallbackOutcome::Code(_) => "<html><body><h1>Authentication successful!</h1><p>You can close this window.</p></body></html>",
            _ => "<html><body><h1>Authentication failed</h1><p>Return to the terminal for details.</p></body></html>",
        };

        if let Ok(mut guard) = tx_clone.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(outcome);
            }
        }
        Html(page)
    };

    let app = Router::new().route(CALLBACK_PATH, get(callback_handler));

    eprintln!("Waiting for authentication callback on port {}...", port);

    let server = axum::serve(listener, app);

    let outcome = tokio::select! {
        result = server => {
            return Err(GmailMcpError::Auth(AuthError::CallbackError {
                message: match result {
                    Ok(()) => "callback server stopped unexpectedly".to_string(),
                    Err(e) => e.to_string(),
                },
            }));
        }
        _ = tokio::time::sleep(CALLBACK_TIMEOUT) => {
            return Err(GmailMcpError::Auth(AuthError::CallbackError {
                message: format!("no callback received within {} seconds", CALLBACK_TIMEOUT.as_secs()),
            }));
        }
        outcome = rx => outcome.map_err(|_| GmailMcpError::Auth(AuthError::NoAuthCode))?,
    };

    match outcome {
        CallbackOutcome::Code(code) => {
            eprintln!("Received authorization code, exchanging for tokens...");
            let token = exchange_code(store, &keys, &code, &redirect_uri).await?;
            eprintln!("Token saved to {}", config.token_path.display());
            Ok(token)
        }
        CallbackOutcome::Denied(error) => Err(GmailMcpError::Auth(AuthError::CallbackError {
            message: format!("authorization denied: {}", error),
        })),
        CallbackOutcome::StateMismatch => Err(GmailMcpError::Auth(AuthError::StateMismatch)),
        CallbackOutcome::Missing => Err(GmailMcpError::Auth(AuthError::NoAuthCode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ClientSecret {
        serde_json::from_str(
            r#"{"client_id": "my id", "client_secret": "s", "auth_uri": "https://accounts.google.com/o/oauth2/auth"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url(
            &keys(),
            "http://localhost:8080/oauth2callback",
            &[crate::config::gmail::SEND_SCOPE.to_string()],
            "abc123",
        );

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=my%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Foauth2callback"));
        assert!(url.contains("gmail.send"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("access_type=offline"));
        assert!(!url.contains("client_secret"));
    }
}
