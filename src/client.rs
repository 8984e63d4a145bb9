//! High level PayPay client orchestration.
//!
//! Wires the session state, the challenge handler, and the typed response
//! models into an ergonomic client: one method per API operation, one HTTP
//! call per method, with transparent challenge handling and a single retry
//! when a challenge interrupts a call.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::cookie::Jar;
use serde_json::{Value, json};
use url::Url;

use crate::challenge::{
    ChallengeError, ChallengeHttpClient, ChallengeSolver, DEFAULT_COOKIE_DOMAIN,
    FixedDelaySolver, ReqwestChallengeHttpClient, execute_challenge_exchange,
    extract_challenge_params, has_challenge, install_token_cookie,
};
use crate::error::{PayPayError, PayPayResult};
use crate::models::{
    self, BalanceInfo, BarcodeInfo, ChatMessage, ChatRoom, ChatRoomResult, CreateLinkResult,
    HistoryItem, LinkInfo, P2PCodeResult, ProfileInfo, SendMoneyResult, UserSearchResult,
};
use crate::session::{self, AuthState, Credentials, TokenState};

/// Mobile API host.
pub const BASE_URL: &str = "https://app4.paypay.ne.jp";

/// Web portal host, used by the web variant of the link check.
pub const WEB_BASE_URL: &str = "https://www.paypay.ne.jp";

/// Sole success sentinel carried in structured response headers.
const SUCCESS_CODE: &str = "S0000";

/// Tag some upstream flows prepend to chat-room identifiers.
const CHAT_ROOM_PREFIX: &str = "sendbird_group_channel_";

/// Client configuration used by the builder.
#[derive(Clone)]
pub struct PayPayConfig {
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub device_uuid: Option<String>,
    pub access_token: Option<String>,
    pub proxy: Option<String>,
    pub handle_challenges: bool,
    pub challenge_cookie_domain: String,
    pub solver: Option<Arc<dyn ChallengeSolver>>,
    pub base_url: String,
    pub web_base_url: String,
}

impl Default for PayPayConfig {
    fn default() -> Self {
        Self {
            phone_number: None,
            password: None,
            device_uuid: None,
            access_token: None,
            proxy: None,
            handle_challenges: true,
            challenge_cookie_domain: DEFAULT_COOKIE_DOMAIN.to_string(),
            solver: None,
            base_url: BASE_URL.to_string(),
            web_base_url: WEB_BASE_URL.to_string(),
        }
    }
}

/// Fluent builder for [`PayPay`].
pub struct PayPayBuilder {
    config: PayPayConfig,
}

impl PayPayBuilder {
    pub fn new() -> Self {
        Self {
            config: PayPayConfig::default(),
        }
    }

    /// Phone number and password for the login handshake.
    pub fn credentials(mut self, phone_number: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.phone_number = Some(phone_number.into());
        self.config.password = Some(password.into());
        self
    }

    /// Reuse a registered device uuid instead of generating a fresh one.
    pub fn device_uuid(mut self, device_uuid: impl Into<String>) -> Self {
        self.config.device_uuid = Some(device_uuid.into());
        self
    }

    /// Seed a pre-obtained access token, skipping the login handshake.
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.config.access_token = Some(access_token.into());
        self
    }

    /// Route all traffic through a proxy. A bare `host:port` is accepted.
    pub fn proxy(mut self, endpoint: impl Into<String>) -> Self {
        self.config.proxy = Some(endpoint.into());
        self
    }

    pub fn disable_challenge_handling(mut self) -> Self {
        self.config.handle_challenges = false;
        self
    }

    pub fn with_solver(mut self, solver: Arc<dyn ChallengeSolver>) -> Self {
        self.config.solver = Some(solver);
        self
    }

    pub fn with_challenge_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.challenge_cookie_domain = domain.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_web_base_url(mut self, web_base_url: impl Into<String>) -> Self {
        self.config.web_base_url = web_base_url.into();
        self
    }

    pub fn build(self) -> PayPayResult<PayPay> {
        PayPay::with_config(self.config)
    }
}

impl Default for PayPayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read response captured before status translation and payload mapping.
struct RawResponse {
    status: StatusCode,
    retry_after: Option<Duration>,
    body: String,
}

/// Authenticated PayPay mobile API client.
///
/// One logical request is in flight at a time per instance; callers needing
/// concurrency should use one instance per task.
pub struct PayPay {
    credentials: Credentials,
    http: reqwest::Client,
    jar: Arc<Jar>,
    challenge_client: Arc<dyn ChallengeHttpClient>,
    solver: Arc<dyn ChallengeSolver>,
    tokens: Mutex<TokenState>,
    handle_challenges: bool,
    cookie_domain: String,
    base_url: String,
    web_base_url: String,
}

impl PayPay {
    /// Construct a client that will authenticate with phone number and
    /// password via [`PayPay::login`].
    pub fn new(phone_number: impl Into<String>, password: impl Into<String>) -> PayPayResult<Self> {
        PayPay::builder().credentials(phone_number, password).build()
    }

    /// Construct a client around an existing access token.
    pub fn from_access_token(access_token: impl Into<String>) -> PayPayResult<Self> {
        PayPay::builder().access_token(access_token).build()
    }

    /// Obtain a builder to customise the client instance.
    pub fn builder() -> PayPayBuilder {
        PayPayBuilder::new()
    }

    fn with_config(config: PayPayConfig) -> PayPayResult<Self> {
        let credentials = Credentials::new(
            config.phone_number.clone(),
            config.password.clone(),
            config.device_uuid.clone(),
        );

        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .default_headers(session::default_headers());

        if let Some(ref endpoint) = config.proxy {
            let endpoint = session::normalize_proxy(endpoint);
            let proxy = reqwest::Proxy::all(&endpoint)
                .map_err(|err| PayPayError::Validation(format!("invalid proxy endpoint: {err}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build()?;
        let challenge_client: Arc<dyn ChallengeHttpClient> =
            Arc::new(ReqwestChallengeHttpClient::from_client(http.clone()));
        let solver = config
            .solver
            .clone()
            .unwrap_or_else(|| Arc::new(FixedDelaySolver::default()));

        Ok(Self {
            credentials,
            http,
            jar,
            challenge_client,
            solver,
            tokens: Mutex::new(TokenState::new(config.access_token.clone())),
            handle_challenges: config.handle_challenges,
            cookie_domain: config.challenge_cookie_domain,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            web_base_url: config.web_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.tokens().access_token.clone()
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens().refresh_token.clone()
    }

    /// Current authentication lifecycle state.
    pub fn auth_state(&self) -> AuthState {
        self.tokens().auth
    }

    /// Device uuid in use, stable for this instance's lifetime.
    pub fn device_uuid(&self) -> &str {
        &self.credentials.device_uuid
    }

    /// Session uuid regenerated at construction.
    pub fn client_uuid(&self) -> &str {
        &self.credentials.client_uuid
    }

    /// Complete the two-step login handshake.
    ///
    /// Accepts the full OAuth URL shown to the user or just the value of its
    /// `id` query parameter. Every failure surfaces as
    /// [`PayPayError::Login`].
    pub async fn login(&self, url_or_id: &str) -> PayPayResult<bool> {
        let (phone, password) = match (
            self.credentials.phone_number.clone(),
            self.credentials.password.clone(),
        ) {
            (Some(phone), Some(password)) => (phone, password),
            _ => {
                return Err(PayPayError::login(
                    "phone number and password required for login",
                    None,
                ));
            }
        };
        let link_id = extract_link_id(url_or_id);

        self.login_start(&phone, &password).await.map_err(login_failure)?;
        self.login_confirm(&link_id).await.map_err(login_failure)?;
        log::debug!("login completed for device {}", self.credentials.device_uuid);
        Ok(true)
    }

    async fn login_start(&self, phone: &str, password: &str) -> PayPayResult<()> {
        let body = json!({
            "phoneNumber": phone,
            "password": password,
            "deviceUuid": self.credentials.device_uuid,
            "clientUuid": self.credentials.client_uuid,
        });
        let response = self
            .dispatch(Method::POST, self.api("/bff/v2/oauth2/par")?, Some(&body), &[])
            .await?;

        match result_code(&response) {
            Some(SUCCESS_CODE) => Ok(()),
            code => Err(PayPayError::login(
                format!(
                    "login start failed with result code {}",
                    code.unwrap_or("<missing>")
                ),
                None,
            )),
        }
    }

    async fn login_confirm(&self, link_id: &str) -> PayPayResult<()> {
        let body = json!({
            "deviceUuid": self.credentials.device_uuid,
            "clientUuid": self.credentials.client_uuid,
        });
        let query = [("id", link_id.to_string())];
        let response = self
            .dispatch(
                Method::POST,
                self.api("/bff/v2/oauth2/token")?,
                Some(&body),
                &query,
            )
            .await?;

        let mut payload = take_payload(response);
        let refresh = take_string(&mut payload, "refreshToken");
        let Some(access) = take_string(&mut payload, "accessToken") else {
            return Err(PayPayError::login("failed to obtain access token", None));
        };
        self.tokens().store_pair(access, refresh);
        Ok(())
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// Uses the supplied token or the stored one. Returns `Ok(false)` when
    /// the response lacks a new access token; the stored pair is left
    /// untouched in that case.
    pub async fn token_refresh(&self, refresh_token: Option<&str>) -> PayPayResult<bool> {
        let token = match refresh_token {
            Some(token) => token.to_string(),
            None => self.tokens().refresh_token.clone().ok_or_else(|| {
                PayPayError::Authentication("no refresh token available".into())
            })?,
        };

        let body = json!({ "refreshToken": token });
        let response = self
            .dispatch(
                Method::POST,
                self.api("/bff/v2/oauth2/refresh")?,
                Some(&body),
                &[],
            )
            .await?;

        let mut payload = take_payload(response);
        let refresh = take_string(&mut payload, "refreshToken");
        match take_string(&mut payload, "accessToken") {
            Some(access) => {
                self.tokens().store_pair(access, refresh);
                Ok(true)
            }
            None => {
                log::warn!("token refresh response carried no access token");
                Ok(false)
            }
        }
    }

    /// Fetch the user profile.
    pub async fn get_profile(&self) -> PayPayResult<ProfileInfo> {
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/getProfile")?, None, &[])
            .await?;
        Ok(models::from_payload(take_payload(response)))
    }

    /// Fetch the wallet balance breakdown.
    pub async fn get_balance(&self) -> PayPayResult<BalanceInfo> {
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/getBalance")?, None, &[])
            .await?;
        Ok(models::from_payload(take_payload(response)))
    }

    /// Fetch the most recent payment history entries.
    pub async fn get_history(&self, size: usize) -> PayPayResult<Vec<HistoryItem>> {
        let query = [("size", size.to_string())];
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/getHistory")?, None, &query)
            .await?;
        Ok(models::list_from_payload(take_payload(response), "history"))
    }

    /// Fetch the point history.
    pub async fn get_point_history(&self) -> PayPayResult<Vec<HistoryItem>> {
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/getPointHistory")?, None, &[])
            .await?;
        Ok(models::list_from_payload(take_payload(response), "history"))
    }

    /// List direct-message chat rooms.
    pub async fn get_chat_rooms(&self, size: usize) -> PayPayResult<Vec<ChatRoom>> {
        let query = [("size", size.to_string())];
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/getChatRooms")?, None, &query)
            .await?;
        Ok(models::list_from_payload(take_payload(response), "chatRooms"))
    }

    /// List the messages of one chat room.
    pub async fn get_chat_room_messages(&self, chat_room_id: &str) -> PayPayResult<Vec<ChatMessage>> {
        let chat_room_id = strip_chat_room_prefix(chat_room_id);
        let response = self
            .call_api(
                Method::GET,
                self.api(&format!("/bff/v2/getChatRoomMessages/{chat_room_id}"))?,
                None,
                &[],
            )
            .await?;
        Ok(models::list_from_payload(take_payload(response), "messages"))
    }

    /// Check a payment link. With `web` set, the check goes through the web
    /// portal host instead of the mobile host.
    pub async fn link_check(&self, url_or_id: &str, web: bool) -> PayPayResult<LinkInfo> {
        let link_id = extract_link_id(url_or_id);
        let url = if web {
            self.web_api(&format!("/portal/api/v2/link/check/{link_id}"))?
        } else {
            self.api(&format!("/bff/v2/executeLink/check/{link_id}"))?
        };
        let response = self.call_api(Method::GET, url, None, &[]).await?;
        Ok(models::from_payload(take_payload(response)))
    }

    /// Receive the payment behind a link. Pass a pre-fetched [`LinkInfo`] to
    /// skip the implicit check round trip; `password` unlocks protected
    /// links.
    pub async fn link_receive(
        &self,
        url_or_id: &str,
        password: Option<&str>,
        link_info: Option<LinkInfo>,
    ) -> PayPayResult<bool> {
        self.execute_link_action("receive", url_or_id, password, link_info)
            .await
    }

    /// Reject a payment link.
    pub async fn link_reject(
        &self,
        url_or_id: &str,
        link_info: Option<LinkInfo>,
    ) -> PayPayResult<bool> {
        self.execute_link_action("reject", url_or_id, None, link_info)
            .await
    }

    /// Cancel a payment link this account created.
    pub async fn link_cancel(
        &self,
        url_or_id: &str,
        link_info: Option<LinkInfo>,
    ) -> PayPayResult<bool> {
        self.execute_link_action("cancel", url_or_id, None, link_info)
            .await
    }

    /// Shared flow of the three link mutations: the check must complete and
    /// succeed before the mutating call goes out.
    async fn execute_link_action(
        &self,
        action: &str,
        url_or_id: &str,
        password: Option<&str>,
        link_info: Option<LinkInfo>,
    ) -> PayPayResult<bool> {
        let link_id = extract_link_id(url_or_id);
        let info = match link_info {
            Some(info) => info,
            None => self.link_check(&link_id, false).await?,
        };
        if info.order_id.is_empty() {
            return Err(PayPayError::Link(format!(
                "link {link_id} carries no order id to {action}"
            )));
        }

        let mut body = json!({ "linkId": link_id, "orderId": info.order_id });
        if let Some(password) = password {
            body["password"] = Value::String(password.to_string());
        }
        let response = self
            .call_api(
                Method::POST,
                self.api(&format!("/bff/v2/executeLink/{action}"))?,
                Some(&body),
                &[],
            )
            .await?;
        Ok(is_success(&response))
    }

    /// Create a payment link over `amount` yen, optionally passcode
    /// protected.
    pub async fn create_link(
        &self,
        amount: i64,
        passcode: Option<&str>,
    ) -> PayPayResult<CreateLinkResult> {
        let mut body = json!({ "amount": amount });
        if let Some(passcode) = passcode {
            body["passcode"] = Value::String(passcode.to_string());
        }
        let response = self
            .call_api(Method::POST, self.api("/bff/v2/createLink")?, Some(&body), &[])
            .await?;
        if let Some(code) = result_code(&response)
            && code != SUCCESS_CODE
        {
            return Err(PayPayError::Link(format!(
                "createLink failed with result code {code}"
            )));
        }
        Ok(models::from_payload(take_payload(response)))
    }

    /// Create a P2P receive code, optionally for a fixed amount.
    pub async fn create_p2pcode(&self, amount: Option<i64>) -> PayPayResult<P2PCodeResult> {
        let mut body = json!({});
        if let Some(amount) = amount {
            body["amount"] = json!(amount);
        }
        let response = self
            .call_api(
                Method::POST,
                self.api("/bff/v2/createP2PCode")?,
                Some(&body),
                &[],
            )
            .await?;
        if let Some(code) = result_code(&response)
            && code != SUCCESS_CODE
        {
            return Err(PayPayError::Payment(format!(
                "createP2PCode failed with result code {code}"
            )));
        }
        Ok(models::from_payload(take_payload(response)))
    }

    /// Send `amount` yen to another user.
    pub async fn send_money(&self, amount: i64, receiver_id: &str) -> PayPayResult<SendMoneyResult> {
        let body = json!({ "amount": amount, "receiverId": receiver_id });
        let response = self
            .call_api(Method::POST, self.api("/bff/v2/sendMoney")?, Some(&body), &[])
            .await?;
        if let Some(code) = result_code(&response)
            && code != SUCCESS_CODE
        {
            return Err(PayPayError::Payment(format!(
                "sendMoney failed with result code {code}"
            )));
        }
        Ok(models::from_payload(take_payload(response)))
    }

    /// Post a message into a chat room.
    pub async fn send_message(&self, chat_room_id: &str, message: &str) -> PayPayResult<bool> {
        let chat_room_id = strip_chat_room_prefix(chat_room_id);
        let body = json!({ "chatRoomId": chat_room_id, "message": message });
        let response = self
            .call_api(Method::POST, self.api("/bff/v2/sendMessage")?, Some(&body), &[])
            .await?;
        Ok(is_success(&response))
    }

    /// Choose which balance pays first: PayPay Money when `paypay_money` is
    /// set, Money Light otherwise.
    pub async fn set_money_priority(&self, paypay_money: bool) -> PayPayResult<bool> {
        let priority = if paypay_money { "MONEY" } else { "MONEY_LIGHT" };
        let body = json!({ "priority": priority });
        let response = self
            .call_api(
                Method::POST,
                self.api("/bff/v2/setMoneyPriority")?,
                Some(&body),
                &[],
            )
            .await?;
        Ok(is_success(&response))
    }

    /// Search for a user by id or display name. `order` selects among
    /// multiple matches; zero matches or an out-of-range index fail with
    /// [`PayPayError::Validation`].
    pub async fn search_p2puser(
        &self,
        user_id: &str,
        is_global: bool,
        order: usize,
    ) -> PayPayResult<UserSearchResult> {
        let query = [
            ("userId", user_id.to_string()),
            ("isGlobal", is_global.to_string()),
        ];
        let response = self
            .call_api(Method::GET, self.api("/bff/v2/searchP2PUser")?, None, &query)
            .await?;

        let mut payload = take_payload(response);
        let mut users = match payload.get_mut("users").map(Value::take) {
            Some(Value::Array(users)) => users,
            _ => Vec::new(),
        };
        if users.is_empty() {
            return Err(PayPayError::Validation("user not found".into()));
        }
        if order >= users.len() {
            return Err(PayPayError::Validation(format!(
                "user index {order} out of range"
            )));
        }
        Ok(models::from_payload(users.swap_remove(order)))
    }

    /// Open (or fetch) the chat room shared with another user.
    pub async fn initialize_chatroom(&self, external_user_id: &str) -> PayPayResult<ChatRoomResult> {
        let body = json!({ "externalUserId": external_user_id });
        let response = self
            .call_api(
                Method::POST,
                self.api("/bff/v2/initializeChatroom")?,
                Some(&body),
                &[],
            )
            .await?;
        Ok(models::from_payload(take_payload(response)))
    }

    /// Decode a PayPay QR/barcode URL.
    pub async fn get_barcode_info(&self, url: &str) -> PayPayResult<BarcodeInfo> {
        let body = json!({ "url": url });
        let response = self
            .call_api(
                Method::POST,
                self.api("/bff/v2/getBarcodeInfo")?,
                Some(&body),
                &[],
            )
            .await?;
        Ok(models::from_payload(take_payload(response)))
    }

    /// Entry point for authenticated operations: calls made while the token
    /// is known-expired fail locally instead of hitting the server.
    async fn call_api(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> PayPayResult<Value> {
        if self.tokens().auth == AuthState::Expired {
            return Err(PayPayError::TokenExpired);
        }
        self.dispatch(method, url, body, query).await
    }

    /// Issue one request, run the challenge exchange when the body carries
    /// challenge markup (retrying the original request exactly once), then
    /// translate the HTTP status and parse the JSON envelope.
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> PayPayResult<Value> {
        let mut response = self.send_once(&method, &url, body, query).await?;

        if self.handle_challenges && has_challenge(&response.body) {
            log::debug!("challenge detected on {}, running provider exchange", url.path());
            let params = extract_challenge_params(&response.body).map_err(ChallengeError::from)?;
            let token = execute_challenge_exchange(
                self.challenge_client.as_ref(),
                self.solver.as_ref(),
                &params,
            )
            .await?;
            install_token_cookie(&self.jar, &token, &self.cookie_domain)?;
            // one retry only; a challenge resurfacing here is not handled again
            response = self.send_once(&method, &url, body, query).await?;
        }

        if response.status.as_u16() == 429 {
            return Err(PayPayError::RateLimit {
                retry_after: response.retry_after,
            });
        }
        if response.status.as_u16() == 401 {
            self.tokens().mark_expired();
            return Err(PayPayError::TokenExpired);
        }
        if !response.status.is_success() {
            return Err(PayPayError::Network(format!(
                "unexpected status {} from {}",
                response.status,
                url.path()
            )));
        }

        serde_json::from_str(&response.body)
            .map_err(|err| PayPayError::Network(format!("invalid json response: {err}")))
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> PayPayResult<RawResponse> {
        let bearer = self.tokens().access_token.clone();

        let mut request = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;
        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }

    fn api(&self, endpoint: &str) -> PayPayResult<Url> {
        parse_endpoint(&self.base_url, endpoint)
    }

    fn web_api(&self, endpoint: &str) -> PayPayResult<Url> {
        parse_endpoint(&self.web_base_url, endpoint)
    }

    fn tokens(&self) -> MutexGuard<'_, TokenState> {
        self.tokens.lock().expect("token state lock poisoned")
    }
}

fn parse_endpoint(base: &str, endpoint: &str) -> PayPayResult<Url> {
    Url::parse(&format!("{base}{endpoint}"))
        .map_err(|err| PayPayError::Validation(format!("invalid endpoint url: {err}")))
}

/// Wrap handshake failures into the login kind, once.
fn login_failure(err: PayPayError) -> PayPayError {
    match err {
        err @ PayPayError::Login { .. } => err,
        other => PayPayError::login(other.to_string(), Some(other)),
    }
}

/// Pull the opaque link id out of a full OAuth/link URL, or pass a bare id
/// through unchanged.
fn extract_link_id(url_or_id: &str) -> String {
    if let Some(captures) = LINK_ID_RE.captures(url_or_id)
        && let Some(id) = captures.get(1)
    {
        return id.as_str().to_string();
    }
    url_or_id.to_string()
}

/// Strip the chat-room tag some upstream flows prepend, if present.
fn strip_chat_room_prefix(chat_room_id: &str) -> &str {
    chat_room_id
        .strip_prefix(CHAT_ROOM_PREFIX)
        .unwrap_or(chat_room_id)
}

fn result_code(response: &Value) -> Option<&str> {
    response.get("header")?.get("resultCode")?.as_str()
}

fn is_success(response: &Value) -> bool {
    result_code(response) == Some(SUCCESS_CODE)
}

fn take_payload(mut response: Value) -> Value {
    response
        .get_mut("payload")
        .map(Value::take)
        .unwrap_or(Value::Null)
}

fn take_string(value: &mut Value, key: &str) -> Option<String> {
    match value.get_mut(key).map(Value::take) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = raw.parse::<f64>()
        && seconds.is_finite()
        && seconds >= 0.0
    {
        return Some(Duration::from_secs_f64(seconds));
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(raw).or_else(|_| DateTime::parse_from_rfc3339(raw))
        && let Ok(duration) = (date.with_timezone(&Utc) - Utc::now()).to_std()
    {
        return Some(duration);
    }

    None
}

static LINK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=([A-Za-z0-9]+)").expect("invalid link id regex"));

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn link_id_extracted_from_oauth_url() {
        assert_eq!(
            extract_link_id("https://www.paypay.ne.jp/portal/oauth2/l?id=TK4602"),
            "TK4602"
        );
    }

    #[test]
    fn bare_link_id_passes_through() {
        assert_eq!(extract_link_id("TK4602"), "TK4602");
    }

    #[test]
    fn chat_room_prefix_stripped_once() {
        assert_eq!(
            strip_chat_room_prefix("sendbird_group_channel_ABC123"),
            "ABC123"
        );
        assert_eq!(strip_chat_room_prefix("ABC123"), "ABC123");
    }

    #[test]
    fn result_code_checks_the_sentinel() {
        let ok = json!({"header": {"resultCode": "S0000"}, "payload": {}});
        let failed = json!({"header": {"resultCode": "S0001"}, "payload": {}});
        assert!(is_success(&ok));
        assert!(!is_success(&failed));
        assert!(!is_success(&json!({})));
    }

    #[test]
    fn payload_extraction_defaults_to_null() {
        let response = json!({"header": {"resultCode": "S0000"}});
        assert_eq!(take_payload(response), Value::Null);
    }

    #[test]
    fn retry_after_parses_numeric_seconds() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("120"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(120)));
    }

    #[test]
    fn retry_after_parses_http_dates() {
        let date = (Utc::now() + chrono::Duration::seconds(90)).to_rfc2822();
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            http::header::RETRY_AFTER,
            HeaderValue::from_str(&date).unwrap(),
        );
        let parsed = parse_retry_after(&headers).expect("duration");
        assert!(parsed <= Duration::from_secs(90));
        assert!(parsed >= Duration::from_secs(80));
    }

    #[test]
    fn retry_after_ignores_garbage() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[tokio::test]
    async fn login_without_credentials_fails_locally() {
        let client = PayPay::builder().build().unwrap();
        let err = client.login("TK4602").await.unwrap_err();
        assert!(matches!(err, PayPayError::Login { .. }));
    }

    #[tokio::test]
    async fn token_refresh_without_any_token_fails_locally() {
        let client = PayPay::builder().build().unwrap();
        let err = client.token_refresh(None).await.unwrap_err();
        assert!(matches!(err, PayPayError::Authentication(_)));
    }

    #[test]
    fn builder_rejects_garbage_proxy() {
        let result = PayPay::builder().proxy("http://[not a proxy").build();
        assert!(matches!(result, Err(PayPayError::Validation(_))));
    }
}
