use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Session attribute key holding the quoted order total, e.g. `"$400"`.
pub const PRICE_ATTRIBUTE: &str = "Price";
/// Session attribute key flagging a requested transfer to a human agent.
pub const AGENT_ATTRIBUTE: &str = "Agent";

/// The key/value bag the dialog engine round-trips between turns.
///
/// Nothing here is stored server-side: every turn receives the complete bag
/// and returns the complete successor bag. Updates are monotonic: keys are
/// inserted or overwritten, never deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionAttributes(BTreeMap<String, String>);

impl SessionAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Inserts only when the key is not already carried; returns whether the
    /// value was written. Used for the quoted price, which is computed the
    /// turn all slots first validate and never recomputed.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    pub fn merge(&mut self, other: SessionAttributes) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for SessionAttributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionAttributes, PRICE_ATTRIBUTE};

    #[test]
    fn merge_overwrites_but_never_deletes() {
        let mut base = SessionAttributes::new();
        base.set("Price", "$400");
        base.set("Channel", "voice");

        let mut incoming = SessionAttributes::new();
        incoming.set("Price", "$450");

        base.merge(incoming);
        assert_eq!(base.get("Price"), Some("$450"));
        assert_eq!(base.get("Channel"), Some("voice"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn set_if_absent_preserves_a_carried_value() {
        let mut attributes = SessionAttributes::new();
        assert!(attributes.set_if_absent(PRICE_ATTRIBUTE, "$400"));
        assert!(!attributes.set_if_absent(PRICE_ATTRIBUTE, "$600"));
        assert_eq!(attributes.get(PRICE_ATTRIBUTE), Some("$400"));
    }
}
