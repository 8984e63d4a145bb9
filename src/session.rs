//! Session credentials, protocol headers, and token state.

use reqwest::header::{self, HeaderMap, HeaderValue};
use uuid::Uuid;

/// User-agent advertised on every call, matching the mobile app build the
/// endpoints expect.
pub(crate) const USER_AGENT: &str = "PayPay/3.80.0 (iPhone; iOS 16.0; Scale/3.00)";

/// Login identity and device pairing for one client instance.
///
/// The device uuid is stable for the client's lifetime (and should be reused
/// across sessions for a registered device); the client uuid is regenerated
/// for every construction.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub device_uuid: String,
    pub client_uuid: String,
}

impl Credentials {
    pub fn new(
        phone_number: Option<String>,
        password: Option<String>,
        device_uuid: Option<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.map(|phone| normalize_phone(&phone)),
            password,
            device_uuid: device_uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
            client_uuid: Uuid::new_v4().to_string(),
        }
    }
}

/// Authentication lifecycle of a client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No access token yet; login has not run.
    Unauthenticated,
    /// An access token is installed and has not been rejected.
    Authenticated,
    /// The server answered 401; a refresh or a fresh login is required.
    Expired,
}

/// Access/refresh token pair plus lifecycle state.
///
/// Both tokens are replaced together from one response payload or not at all;
/// there is no partial update path.
#[derive(Debug)]
pub(crate) struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub auth: AuthState,
}

impl TokenState {
    pub fn new(access_token: Option<String>) -> Self {
        let auth = if access_token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        Self {
            access_token,
            refresh_token: None,
            auth,
        }
    }

    pub fn store_pair(&mut self, access_token: String, refresh_token: Option<String>) {
        self.access_token = Some(access_token);
        self.refresh_token = refresh_token;
        self.auth = AuthState::Authenticated;
    }

    pub fn mark_expired(&mut self) {
        self.auth = AuthState::Expired;
    }
}

/// Fixed protocol headers identifying the calling app and platform.
pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert("client-os-version", HeaderValue::from_static("16.0"));
    headers.insert("client-os-type", HeaderValue::from_static("IOS"));
    headers.insert("client-app-version", HeaderValue::from_static("3.80.0"));
    headers.insert("client-mode", HeaderValue::from_static("NORMAL"));
    headers
}

/// Strip hyphens from a phone number. Idempotent.
pub(crate) fn normalize_phone(phone: &str) -> String {
    phone.replace('-', "")
}

/// Ensure a proxy endpoint carries a scheme; bare `host:port` gets `http://`.
pub(crate) fn normalize_proxy(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}
