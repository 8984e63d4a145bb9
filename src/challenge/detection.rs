//! AWS WAF challenge detection and parameter extraction.
//!
//! A challenge interstitial can replace the body of any API response. This
//! module performs a cheap containment check for the known markers, then
//! extracts the provider parameters either from the embedded
//! `AwsWafCaptcha.renderCaptcha({...})` invocation or, failing that, from the
//! raw body with signature regexes.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

/// Body substrings that identify an AWS WAF challenge interstitial.
pub const CHALLENGE_MARKERS: [&str; 3] = ["aws-waf-token", "AwsWafCaptcha", "challenge.aws"];

/// Provider parameters extracted from one challenge page. Discarded after the
/// exchange completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengeParams {
    /// Challenge provider endpoint used for both fetch and submit.
    pub api_url: String,
    /// DOM container selector the widget renders into.
    pub container: Option<String>,
    /// Remaining string-valued fields of the invocation object.
    pub extra: HashMap<String, String>,
}

/// Outcomes when challenge parameter extraction fails.
#[derive(Debug, Error)]
pub enum ChallengeParseError {
    #[error("response does not contain a challenge")]
    NotChallenge,
    #[error("unable to extract challenge parameters")]
    ParamsNotFound,
}

/// Cheap containment check for challenge markers.
pub fn has_challenge(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Extract provider parameters from a challenge page.
///
/// Tries the script invocation first (tolerating unquoted object keys), then
/// falls back to regex extraction of the endpoint and container selector.
pub fn extract_challenge_params(body: &str) -> Result<ChallengeParams, ChallengeParseError> {
    if !has_challenge(body) {
        return Err(ChallengeParseError::NotChallenge);
    }

    if let Some(params) = params_from_scripts(body) {
        return Ok(params);
    }

    params_from_body(body).ok_or(ChallengeParseError::ParamsNotFound)
}

/// Walk the `<script>` elements and parse the render invocation's argument
/// object.
fn params_from_scripts(body: &str) -> Option<ChallengeParams> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("script").expect("invalid script selector");

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let Some(captures) = RENDER_CAPTCHA_RE.captures(&text) else {
            continue;
        };
        let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        let normalized = quote_object_keys(raw);
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&normalized) else {
            continue;
        };

        let mut params = ChallengeParams::default();
        for (key, value) in fields {
            let Some(value) = value.as_str() else { continue };
            let value = html_escape::decode_html_entities(value).to_string();
            match key.as_str() {
                "apiUrl" => params.api_url = value,
                "container" => params.container = Some(value),
                _ => {
                    params.extra.insert(key, value);
                }
            }
        }
        return Some(params);
    }

    None
}

/// Regex fallback over the raw body; requires both the endpoint and the
/// container selector.
fn params_from_body(body: &str) -> Option<ChallengeParams> {
    let api_url = API_URL_RE.captures(body)?.get(1)?.as_str();
    let container = CONTAINER_RE.captures(body)?.get(1)?.as_str();

    Some(ChallengeParams {
        api_url: html_escape::decode_html_entities(api_url).to_string(),
        container: Some(html_escape::decode_html_entities(container).to_string()),
        extra: HashMap::new(),
    })
}

/// Quote bare object keys so the JS object literal parses as JSON.
fn quote_object_keys(raw: &str) -> String {
    OBJECT_KEY_RE.replace_all(raw, "$1\"$2\":").into_owned()
}

static RENDER_CAPTCHA_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"AwsWafCaptcha\.renderCaptcha\((.*?)\);")
        .dot_matches_new_line(true)
        .build()
        .expect("invalid render captcha regex")
});

static OBJECT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("invalid object key regex")
});

static API_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"apiUrl:\s*["']([^"']+)["']"#).expect("invalid api url regex"));

static CONTAINER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"container:\s*["']([^"']+)["']"#).expect("invalid container regex"));
