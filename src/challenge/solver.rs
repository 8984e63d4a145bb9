//! Pluggable challenge solving strategies.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;

use super::executor::ChallengeError;

/// Strategy that computes a solution for fetched challenge data.
///
/// Solving the actual puzzle is outside this crate's scope; deployments that
/// need a working bypass should implement this trait against a real solving
/// service and hand it to the client builder.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce the solution string submitted back to the provider.
    async fn solve(&self, challenge: &Value) -> Result<String, ChallengeError>;
}

/// Reference solver: waits a fixed interval, then echoes the fetched token
/// verbatim.
///
/// This placeholder may never produce a token a real provider accepts;
/// validate against current provider behavior before relying on it.
pub struct FixedDelaySolver {
    delay: Duration,
}

impl FixedDelaySolver {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelaySolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl ChallengeSolver for FixedDelaySolver {
    fn name(&self) -> &'static str {
        "fixed_delay"
    }

    async fn solve(&self, challenge: &Value) -> Result<String, ChallengeError> {
        if self.delay > Duration::ZERO {
            sleep(self.delay).await;
        }
        Ok(challenge
            .get("token")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn echoes_fetched_token() {
        let solver = FixedDelaySolver::new(Duration::ZERO);
        let solution = solver
            .solve(&json!({"token": "challenge-token"}))
            .await
            .unwrap();
        assert_eq!(solution, "challenge-token");
    }

    #[tokio::test]
    async fn missing_token_yields_empty_solution() {
        let solver = FixedDelaySolver::new(Duration::ZERO);
        let solution = solver.solve(&json!({})).await.unwrap();
        assert_eq!(solution, "");
    }
}
