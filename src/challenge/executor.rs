//! Challenge exchange execution.
//!
//! Drives the fetch/solve/submit round trip against the challenge provider
//! and installs the resulting token as a session cookie. The transport is
//! abstracted behind [`ChallengeHttpClient`] so the exchange can run against
//! the shared session in production and a stub in tests.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use super::detection::{ChallengeParams, ChallengeParseError};
use super::solver::ChallengeSolver;

/// Cookie the provider expects the solved token under.
pub const CHALLENGE_COOKIE: &str = "aws-waf-token";

/// Default domain the token cookie is scoped to.
pub const DEFAULT_COOKIE_DOMAIN: &str = ".paypay.ne.jp";

/// Failure states of the challenge exchange.
///
/// Transport failures stay distinct from the extraction/solving failures so
/// the caller can report them as network errors rather than authentication
/// errors.
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error(transparent)]
    Parse(#[from] ChallengeParseError),
    #[error("challenge api url missing or invalid")]
    InvalidApiUrl,
    #[error("invalid challenge cookie domain: {0}")]
    InvalidCookieDomain(String),
    #[error("challenge transport error: {0}")]
    Transport(String),
    #[error("challenge solver failed: {0}")]
    Solver(String),
    #[error("no token received from challenge submission")]
    MissingToken,
}

/// Transport used for the provider round trip. Implementations must share
/// cookie state with the session issuing the original request.
#[async_trait]
pub trait ChallengeHttpClient: Send + Sync {
    async fn fetch_json(&self, url: &Url) -> Result<Value, ChallengeError>;

    async fn submit_json(&self, url: &Url, body: &Value) -> Result<Value, ChallengeError>;
}

/// Reqwest-backed transport wrapping the session client so the exchange sees
/// the same cookies and default headers as every API call.
pub struct ReqwestChallengeHttpClient {
    client: reqwest::Client,
}

impl ReqwestChallengeHttpClient {
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChallengeHttpClient for ReqwestChallengeHttpClient {
    async fn fetch_json(&self, url: &Url) -> Result<Value, ChallengeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| ChallengeError::Transport(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| ChallengeError::Transport(err.to_string()))
    }

    async fn submit_json(&self, url: &Url, body: &Value) -> Result<Value, ChallengeError> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| ChallengeError::Transport(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| ChallengeError::Transport(err.to_string()))
    }
}

/// Run the full provider exchange and return the resulting token.
///
/// Steps:
/// 1. Fetch challenge data from the provider endpoint.
/// 2. Hand the data to the solver for a solution.
/// 3. Submit `{token, solution}` back to the same endpoint.
/// 4. Read the resulting token from the `token` or `cookie` field.
pub async fn execute_challenge_exchange(
    client: &dyn ChallengeHttpClient,
    solver: &dyn ChallengeSolver,
    params: &ChallengeParams,
) -> Result<String, ChallengeError> {
    if params.api_url.is_empty() {
        return Err(ChallengeError::InvalidApiUrl);
    }
    let api_url = Url::parse(&params.api_url).map_err(|_| ChallengeError::InvalidApiUrl)?;

    let challenge = client.fetch_json(&api_url).await?;
    log::debug!("challenge data fetched, solving with {}", solver.name());
    let solution = solver.solve(&challenge).await?;

    let submission = json!({
        "token": challenge.get("token").and_then(Value::as_str).unwrap_or_default(),
        "solution": solution,
    });
    let result = client.submit_json(&api_url, &submission).await?;

    result
        .get("token")
        .and_then(Value::as_str)
        .or_else(|| result.get("cookie").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or(ChallengeError::MissingToken)
}

/// Install a solved token as a secure root-path cookie on the shared jar.
pub fn install_token_cookie(jar: &Jar, token: &str, domain: &str) -> Result<(), ChallengeError> {
    let host = domain.trim_start_matches('.');
    let url = Url::parse(&format!("https://{host}/"))
        .map_err(|_| ChallengeError::InvalidCookieDomain(domain.to_string()))?;
    let cookie = format!("{CHALLENGE_COOKIE}={token}; Domain={domain}; Path=/; Secure");
    jar.add_cookie_str(&cookie, &url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::solver::FixedDelaySolver;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubClient {
        responses: Mutex<VecDeque<Result<Value, ChallengeError>>>,
        submissions: Mutex<Vec<Value>>,
    }

    impl StubClient {
        fn new(responses: Vec<Result<Value, ChallengeError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                submissions: Mutex::new(Vec::new()),
            }
        }

        fn pop_response(&self) -> Result<Value, ChallengeError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no more stub responses")
        }
    }

    #[async_trait]
    impl ChallengeHttpClient for StubClient {
        async fn fetch_json(&self, _url: &Url) -> Result<Value, ChallengeError> {
            self.pop_response()
        }

        async fn submit_json(&self, _url: &Url, body: &Value) -> Result<Value, ChallengeError> {
            self.submissions.lock().unwrap().push(body.clone());
            self.pop_response()
        }
    }

    fn params() -> ChallengeParams {
        ChallengeParams {
            api_url: "https://challenge.aws/api/verify".into(),
            container: Some("#captcha-box".into()),
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn exchange_submits_echoed_token_and_returns_result_token() {
        let client = StubClient::new(vec![
            Ok(json!({"token": "fetched"})),
            Ok(json!({"token": "solved-token"})),
        ]);
        let solver = FixedDelaySolver::new(Duration::ZERO);

        let token = execute_challenge_exchange(&client, &solver, &params())
            .await
            .unwrap();
        assert_eq!(token, "solved-token");

        let submissions = client.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0]["token"], "fetched");
        assert_eq!(submissions[0]["solution"], "fetched");
    }

    #[tokio::test]
    async fn exchange_reads_cookie_field_when_token_absent() {
        let client = StubClient::new(vec![
            Ok(json!({"token": "fetched"})),
            Ok(json!({"cookie": "cookie-token"})),
        ]);
        let solver = FixedDelaySolver::new(Duration::ZERO);

        let token = execute_challenge_exchange(&client, &solver, &params())
            .await
            .unwrap();
        assert_eq!(token, "cookie-token");
    }

    #[tokio::test]
    async fn missing_result_token_is_an_error() {
        let client = StubClient::new(vec![
            Ok(json!({"token": "fetched"})),
            Ok(json!({"status": "rejected"})),
        ]);
        let solver = FixedDelaySolver::new(Duration::ZERO);

        let err = execute_challenge_exchange(&client, &solver, &params())
            .await
            .unwrap_err();
        assert!(matches!(err, ChallengeError::MissingToken));
    }

    #[tokio::test]
    async fn transport_failure_stays_a_transport_error() {
        let client = StubClient::new(vec![Err(ChallengeError::Transport(
            "connection refused".into(),
        ))]);
        let solver = FixedDelaySolver::new(Duration::ZERO);

        let err = execute_challenge_exchange(&client, &solver, &params())
            .await
            .unwrap_err();
        assert!(matches!(err, ChallengeError::Transport(_)));
    }

    #[tokio::test]
    async fn empty_api_url_is_rejected() {
        let client = StubClient::new(vec![]);
        let solver = FixedDelaySolver::new(Duration::ZERO);
        let err = execute_challenge_exchange(&client, &solver, &ChallengeParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidApiUrl));
    }

    #[test]
    fn cookie_install_accepts_dotted_domain() {
        let jar = Jar::default();
        install_token_cookie(&jar, "tok", DEFAULT_COOKIE_DOMAIN).unwrap();
    }
}
