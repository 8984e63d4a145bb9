//! # paypay-rs
//!
//! A Rust client for PayPay's private mobile API, covering the login
//! handshake, payment links, P2P transfers, balance and history queries,
//! messaging, and user search.
//!
//! Responses are mapped into typed records and failures into a flat error
//! taxonomy. When the service interposes an AWS WAF bot challenge, the client
//! extracts the challenge parameters, runs the provider exchange through a
//! pluggable solver, installs the resulting cookie, and retries the original
//! request once.
//!
//! ## Example
//!
//! ```no_run
//! use paypay_rs::PayPay;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paypay = PayPay::new("080-1234-5678", "password")?;
//!     paypay.login("https://www.paypay.ne.jp/portal/oauth2/l?id=TK4602").await?;
//!
//!     let balance = paypay.get_balance().await?;
//!     println!("balance: {} yen", balance.all_balance);
//!     Ok(())
//! }
//! ```
//!
//! Or seed an existing access token and skip the handshake:
//!
//! ```no_run
//! use paypay_rs::PayPay;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paypay = PayPay::from_access_token("eyJhbGciOi...")?;
//! let profile = paypay.get_profile().await?;
//! println!("logged in as {}", profile.name);
//! # Ok(())
//! # }
//! ```
//!
//! The challenge "solve" step is a placeholder by default (a fixed delay that
//! echoes the fetched token); see [`ChallengeSolver`] to plug in a real
//! solving capability.

mod client;
mod session;

pub mod challenge;
pub mod error;
pub mod models;

pub use crate::client::{BASE_URL, PayPay, PayPayBuilder, PayPayConfig, WEB_BASE_URL};

pub use crate::error::{PayPayError, PayPayResult};

pub use crate::session::AuthState;

pub use crate::models::{
    BalanceInfo, BarcodeInfo, ChatMessage, ChatRoom, ChatRoomResult, CreateLinkResult,
    HistoryItem, LinkInfo, P2PCodeResult, ProfileInfo, SendMoneyResult, UserSearchResult,
};

pub use crate::challenge::{
    ChallengeError, ChallengeHttpClient, ChallengeParams, ChallengeParseError, ChallengeSolver,
    FixedDelaySolver, ReqwestChallengeHttpClient,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
