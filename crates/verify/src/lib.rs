//! HTTP client for the external address-verification provider.
//!
//! The provider's street-address endpoint takes the address and zip as query
//! parameters alongside auth id/token credentials and answers with an array
//! of candidate records. A non-empty array is a match; an empty array is not.
//! Transport, status, and decode failures surface as `VerifyError` and are
//! folded into "invalid" by the validation pipeline, never re-raised.

use std::time::Duration;

use async_trait::async_trait;
use cordwood_core::config::VerifyConfig;
use cordwood_core::{AddressMatch, AddressVerifier, VerifyError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

pub struct HttpAddressVerifier {
    client: Client,
    base_url: String,
    auth_id: String,
    auth_token: SecretString,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub delivery_line_1: Option<String>,
}

impl HttpAddressVerifier {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        auth_id: impl Into<String>,
        auth_token: SecretString,
    ) -> Self {
        Self { client, base_url: base_url.into(), auth_id: auth_id.into(), auth_token }
    }

    pub fn from_config(config: &VerifyConfig) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| VerifyError::Transport(err.to_string()))?;

        Ok(Self::new(
            client,
            config.base_url.clone(),
            config.auth_id.clone(),
            config.auth_token.clone(),
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/street-address", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AddressVerifier for HttpAddressVerifier {
    async fn lookup(&self, street: &str, zip: &str) -> Result<AddressMatch, VerifyError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("auth-id", self.auth_id.as_str()),
                ("auth-token", self.auth_token.expose_secret()),
                ("street", street),
                ("zipcode", zip),
                ("candidates", "1"),
            ])
            .send()
            .await
            .map_err(|err| VerifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status { status: status.as_u16() });
        }

        let candidates: Vec<Candidate> =
            response.json().await.map_err(|err| VerifyError::Decode(err.to_string()))?;

        debug!(
            event_name = "verify.lookup_completed",
            candidate_count = candidates.len(),
            matched_line = candidates
                .first()
                .and_then(|candidate| candidate.delivery_line_1.as_deref())
                .unwrap_or(""),
            "address lookup completed"
        );

        Ok(match_from_candidates(&candidates))
    }
}

pub fn match_from_candidates(candidates: &[Candidate]) -> AddressMatch {
    if candidates.is_empty() {
        AddressMatch::NoMatch
    } else {
        AddressMatch::Match
    }
}

#[cfg(test)]
mod tests {
    use cordwood_core::AddressMatch;

    use super::{match_from_candidates, Candidate};

    #[test]
    fn provider_candidates_parse_from_the_wire_shape() {
        let raw = r#"[
            {"delivery_line_1": "900 Tamarac Pkwy", "components": {"zipcode": "80863"}},
            {"delivery_line_1": "902 Tamarac Pkwy"}
        ]"#;

        let candidates: Vec<Candidate> = serde_json::from_str(raw).expect("parse candidates");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].delivery_line_1.as_deref(), Some("900 Tamarac Pkwy"));
    }

    #[test]
    fn an_empty_candidate_array_is_no_match() {
        let candidates: Vec<Candidate> = serde_json::from_str("[]").expect("parse candidates");
        assert_eq!(match_from_candidates(&candidates), AddressMatch::NoMatch);
    }

    #[test]
    fn any_candidate_is_a_match() {
        let candidates: Vec<Candidate> =
            serde_json::from_str(r#"[{"delivery_line_1": "900 Tamarac Pkwy"}]"#)
                .expect("parse candidates");
        assert_eq!(match_from_candidates(&candidates), AddressMatch::Match);
    }
}
