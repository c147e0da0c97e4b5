//! Challenge verification for subscribe requests.
//!
//! Subscribe requests carry a reCAPTCHA response token. The verifier exchanges
//! the token for a bot score between 0.0 and 1.0, and the handler drops
//! requests that score at or below [`SCORE_THRESHOLD`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Scores at or below this threshold are treated as bot traffic.
pub const SCORE_THRESHOLD: f32 = 0.5;

/// Google's siteverify endpoint.
const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Timeout for a single verification round trip.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors that can occur during challenge verification.
#[derive(Debug, Error)]
pub enum ChallengeError {
    /// The verification request could not be sent or read.
    #[error("Verification request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The verification service answered with a non-200 status.
    #[error("unexpected status code returned: {0}")]
    UnexpectedStatus(u16),
    /// The verification service rejected the token.
    #[error("verify challenge failed: {0:?}")]
    Rejected(Vec<String>),
}

/// Verifies challenge response tokens from subscribe requests.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    /// Verify a challenge response token and return its bot score.
    async fn verify(&self, token: &str) -> Result<f32, ChallengeError>;
}

/// Body returned by the siteverify endpoint.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    score: f32,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Verifier backed by Google's reCAPTCHA siteverify endpoint.
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
}

impl RecaptchaVerifier {
    /// Create a new verifier with the given site secret.
    pub fn new(secret: impl Into<String>) -> Result<Self, ChallengeError> {
        let client = reqwest::Client::builder().timeout(VERIFY_TIMEOUT).build()?;

        Ok(Self {
            client,
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl ChallengeVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<f32, ChallengeError> {
        let response = self
            .client
            .post(VERIFY_URL)
            .query(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ChallengeError::UnexpectedStatus(status.as_u16()));
        }

        let body: VerifyResponse = response.json().await?;
        if !body.success {
            return Err(ChallengeError::Rejected(body.error_codes));
        }

        Ok(body.score)
    }
}

/// Verifier that accepts every token with a perfect score.
///
/// Used when no reCAPTCHA secret is configured, so local development does not
/// need Google credentials.
pub struct AllowAllVerifier;

#[async_trait]
impl ChallengeVerifier for AllowAllVerifier {
    async fn verify(&self, _token: &str) -> Result<f32, ChallengeError> {
        Ok(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allow_all_accepts_any_token() {
        let verifier = AllowAllVerifier;

        let score = verifier.verify("anything").await.unwrap();

        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_verify_response_success_shape() {
        let body = r#"{
            "success": true,
            "challenge_ts": "2023-01-01T00:00:00Z",
            "hostname": "example.com",
            "score": 0.9
        }"#;

        let response: VerifyResponse = serde_json::from_str(body).unwrap();

        assert!(response.success);
        assert_eq!(response.score, 0.9);
        assert!(response.error_codes.is_empty());
    }

    #[test]
    fn test_verify_response_failure_shape() {
        let body = r#"{
            "success": false,
            "error-codes": ["invalid-input-response"]
        }"#;

        let response: VerifyResponse = serde_json::from_str(body).unwrap();

        assert!(!response.success);
        assert_eq!(response.score, 0.0);
        assert_eq!(response.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ChallengeError::UnexpectedStatus(502).to_string(),
            "unexpected status code returned: 502"
        );
        assert_eq!(
            ChallengeError::Rejected(vec!["timeout-or-duplicate".to_string()]).to_string(),
            "verify challenge failed: [\"timeout-or-duplicate\"]"
        );
    }
}
