use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use thiserror::Error;

/// Typed outcome of an address lookup. The pipeline collapses this to
/// valid/invalid at the validator boundary; errors collapse the same way, so
/// the fail-closed behavior is a contract rather than an accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMatch {
    Match,
    NoMatch,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("address provider transport failure: {0}")]
    Transport(String),
    #[error("address provider returned status {status}")]
    Status { status: u16 },
    #[error("address provider response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait AddressVerifier: Send + Sync {
    async fn lookup(&self, street: &str, zip: &str) -> Result<AddressMatch, VerifyError>;
}

/// Deterministic verifier backed by a fixed zip → streets table.
///
/// Serves offline operation and tests; the production implementation lives in
/// `cordwood-verify`.
#[derive(Clone, Debug, Default)]
pub struct StaticAddressBook {
    known: BTreeMap<String, BTreeSet<String>>,
}

impl StaticAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, zip: impl Into<String>, street: impl Into<String>) -> Self {
        self.known
            .entry(zip.into())
            .or_default()
            .insert(normalize_street(&street.into()));
        self
    }
}

#[async_trait]
impl AddressVerifier for StaticAddressBook {
    async fn lookup(&self, street: &str, zip: &str) -> Result<AddressMatch, VerifyError> {
        let matched = self
            .known
            .get(zip)
            .is_some_and(|streets| streets.contains(&normalize_street(street)));
        Ok(if matched { AddressMatch::Match } else { AddressMatch::NoMatch })
    }
}

fn normalize_street(street: &str) -> String {
    street.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Verifier used when remote verification is disabled: any present
/// street/zip pair matches. Presence checks still happen in the pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllAddresses;

#[async_trait]
impl AddressVerifier for AcceptAllAddresses {
    async fn lookup(&self, _street: &str, _zip: &str) -> Result<AddressMatch, VerifyError> {
        Ok(AddressMatch::Match)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressMatch, AddressVerifier, StaticAddressBook};

    #[tokio::test]
    async fn known_street_matches_regardless_of_spacing_and_case() {
        let book = StaticAddressBook::new().with_entry("80863", "900 Tamarac Pkwy");

        let hit = book.lookup("900  tamarac  PKWY", "80863").await.expect("lookup");
        assert_eq!(hit, AddressMatch::Match);
    }

    #[tokio::test]
    async fn unknown_zip_or_street_does_not_match() {
        let book = StaticAddressBook::new().with_entry("80863", "900 Tamarac Pkwy");

        let wrong_zip = book.lookup("900 Tamarac Pkwy", "99999").await.expect("lookup");
        assert_eq!(wrong_zip, AddressMatch::NoMatch);

        let wrong_street = book.lookup("1 Nowhere Ln", "80863").await.expect("lookup");
        assert_eq!(wrong_street, AddressMatch::NoMatch);
    }
}
