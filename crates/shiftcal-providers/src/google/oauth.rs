//! Google OAuth 2.0 login for a desktop tool.
//!
//! Uses the authorization code flow with PKCE and a loopback redirect: a
//! one-shot listener on `127.0.0.1` catches the browser redirect carrying
//! the code, which is then exchanged for tokens.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

/// How long the user has to finish the consent screen.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h1>Logged in</h1>\
    <p>You can close this window and go back to shiftcal.</p></body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h1>Login failed</h1>\
    <p>You can close this window.</p></body></html>";

/// Token endpoint client.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Creates a client for the given OAuth application.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to build HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(Self { credentials, http })
    }

    /// Runs the interactive browser login and returns fresh tokens.
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();
        let (listener, port) = bind_loopback(port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let auth_url = pkce.auth_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!(port, "waiting for Google login in the browser");
        debug!(url = %auth_url, "authorization URL");
        if let Err(e) = open::that(&auth_url) {
            warn!(error = %e, "could not open a browser");
            eprintln!("\nOpen this URL in your browser to log in:\n\n{}\n", auth_url);
        }

        let callback = tokio::task::spawn_blocking(move || wait_for_callback(listener))
            .await
            .map_err(|e| ProviderError::internal(format!("callback listener panicked: {}", e)))??;

        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch, login aborted",
            ));
        }

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", callback.code.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let response = self.token_request(&params, "code exchange").await?;

        info!("obtained Google tokens");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Trades a refresh token for a new access token.
    ///
    /// A rejected refresh token comes back as an authentication error; the
    /// caller should then drop the stored tokens and log in again.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.token_request(&params, "token refresh").await?;
        debug!("refreshed access token");
        Ok((response.access_token, response.expires_in))
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read {} response: {}", what, e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid {} response: {}", what, e))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Code verifier, challenge and state for one login attempt (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(VERIFIER_BYTES);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(STATE_BYTES),
        }
    }

    /// Builds the consent page URL.
    pub fn auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn bind_loopback((first, last): (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in first..=last {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no free loopback port in {}-{}",
        first, last
    )))
}

/// What the browser redirect carried back.
#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

fn wait_for_callback(listener: TcpListener) -> ProviderResult<Callback> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            if let Some(result) = answer_callback(stream) {
                let _ = tx.send(result);
                return;
            }
        }
    });

    match rx.recv_timeout(CALLBACK_TIMEOUT) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(ProviderError::authentication("timed out waiting for Google login"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::internal("callback listener stopped"))
        }
    }
}

/// Replies to one request; `None` means it was not the redirect.
fn answer_callback(mut stream: TcpStream) -> Option<ProviderResult<Callback>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let target = parts.next()?;
    let query = target.strip_prefix("/callback")?;
    let result = parse_callback_query(query.trim_start_matches('?'));

    let page = if result.is_ok() {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();

    Some(result)
}

fn parse_callback_query(query: &str) -> ProviderResult<Callback> {
    let mut code = None;
    let mut state = None;

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => {
                return Err(ProviderError::authentication(format!(
                    "login denied: {}",
                    value
                )));
            }
            _ => {}
        }
    }

    let code =
        code.ok_or_else(|| ProviderError::authentication("redirect carried no authorization code"))?;
    Ok(Callback {
        code,
        state: state.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_is_43_chars() {
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn challenge_is_sha256_of_verifier() {
        // RFC 7636 appendix B.
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn flows_are_random() {
        let a = PkceFlow::new();
        let b = PkceFlow::new();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn auth_url_requests_offline_calendar_access() {
        let flow = PkceFlow::new();
        let url = flow.auth_url(
            "id.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &["https://www.googleapis.com/auth/calendar".to_string()],
        );

        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fcalendar&"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains(&format!("state={}", flow.state)));
    }

    #[test]
    fn callback_query_with_code() {
        let callback = parse_callback_query("state=abc&code=4%2F0Ab&scope=x").unwrap();
        assert_eq!(
            callback,
            Callback {
                code: "4/0Ab".to_string(),
                state: "abc".to_string(),
            }
        );
    }

    #[test]
    fn callback_query_with_error() {
        let err = parse_callback_query("error=access_denied&state=abc").unwrap_err();
        assert!(err.is_auth());
        assert!(err.message().contains("access_denied"));
    }

    #[test]
    fn callback_query_without_code() {
        assert!(parse_callback_query("state=abc").is_err());
        assert!(parse_callback_query("").is_err());
    }
}
