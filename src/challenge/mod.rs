//! AWS WAF bot-challenge handling.
//!
//! Detection, parameter extraction, the provider exchange, and cookie
//! installation. The solving step itself is a pluggable strategy; see
//! [`ChallengeSolver`].

pub mod detection;
pub mod executor;
pub mod solver;

pub use detection::{
    CHALLENGE_MARKERS, ChallengeParams, ChallengeParseError, extract_challenge_params,
    has_challenge,
};
pub use executor::{
    CHALLENGE_COOKIE, ChallengeError, ChallengeHttpClient, DEFAULT_COOKIE_DOMAIN,
    ReqwestChallengeHttpClient, execute_challenge_exchange, install_token_cookie,
};
pub use solver::{ChallengeSolver, FixedDelaySolver};
