use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The slots collected by the ordering intent, in elicitation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotName {
    FirewoodType,
    NumberCords,
    DeliveryDate,
    DeliveryTime,
    DeliveryZip,
    DeliveryStreet,
}

impl SlotName {
    /// Fixed validation order. Validators run exactly in this sequence and
    /// the first failure wins; no slot is ever checked out of order.
    pub const ELICITATION_ORDER: [SlotName; 6] = [
        SlotName::FirewoodType,
        SlotName::NumberCords,
        SlotName::DeliveryDate,
        SlotName::DeliveryTime,
        SlotName::DeliveryZip,
        SlotName::DeliveryStreet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirewoodType => "FirewoodType",
            Self::NumberCords => "NumberCords",
            Self::DeliveryDate => "DeliveryDate",
            Self::DeliveryTime => "DeliveryTime",
            Self::DeliveryZip => "DeliveryZip",
            Self::DeliveryStreet => "DeliveryStreet",
        }
    }
}

impl std::fmt::Display for SlotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-turn slot map as the dialog engine round-trips it.
///
/// Keys the engine sends that this core does not know about are preserved and
/// echoed back untouched. A missing key, an explicit null, and an empty
/// string all read as "no value yet".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotValues(BTreeMap<String, Option<String>>);

impl SlotValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotName) -> Option<&str> {
        self.0
            .get(slot.as_str())
            .and_then(|value| value.as_deref())
            .filter(|value| !value.trim().is_empty())
    }

    pub fn set(&mut self, slot: SlotName, value: impl Into<String>) {
        self.0.insert(slot.as_str().to_owned(), Some(value.into()));
    }

    /// Nulls the slot's value while keeping the key, so the caller sees an
    /// explicit "collect this again" marker rather than a vanished entry.
    pub fn clear(&mut self, slot: SlotName) {
        self.0.insert(slot.as_str().to_owned(), None);
    }

    /// Raw value for message interpolation; empty string when unset.
    pub fn display(&self, slot: SlotName) -> &str {
        self.get(slot).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Option<String>)> for SlotValues {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{SlotName, SlotValues};

    #[test]
    fn elicitation_order_is_the_documented_sequence() {
        let names: Vec<&str> =
            SlotName::ELICITATION_ORDER.iter().map(SlotName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "FirewoodType",
                "NumberCords",
                "DeliveryDate",
                "DeliveryTime",
                "DeliveryZip",
                "DeliveryStreet"
            ]
        );
    }

    #[test]
    fn empty_and_null_values_read_as_unset() {
        let mut slots = SlotValues::new();
        slots.set(SlotName::FirewoodType, "  ");
        slots.clear(SlotName::NumberCords);

        assert_eq!(slots.get(SlotName::FirewoodType), None);
        assert_eq!(slots.get(SlotName::NumberCords), None);
        assert_eq!(slots.get(SlotName::DeliveryZip), None);
    }

    #[test]
    fn clearing_keeps_the_key_with_a_null_value() {
        let mut slots = SlotValues::new();
        slots.set(SlotName::DeliveryZip, "80863");
        slots.clear(SlotName::DeliveryZip);

        let raw = serde_json::to_value(&slots).expect("serialize slots");
        assert_eq!(raw["DeliveryZip"], serde_json::Value::Null);
    }

    #[test]
    fn unknown_keys_round_trip_untouched() {
        let raw = r#"{"FirewoodType":"split","PromoCode":"WINTER"}"#;
        let slots: SlotValues = serde_json::from_str(raw).expect("parse slots");
        assert_eq!(slots.get(SlotName::FirewoodType), Some("split"));

        let echoed = serde_json::to_string(&slots).expect("serialize slots");
        assert!(echoed.contains("PromoCode"));
    }
}
