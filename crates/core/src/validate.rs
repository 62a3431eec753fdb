use chrono::{Days, NaiveDate};

use crate::pricing::PriceBook;
use crate::slots::{SlotName, SlotValues};
use crate::verify::{AddressMatch, AddressVerifier};

/// Ordering rules that are not derived from the price list.
///
/// Defaults reproduce the production policy: one to three cords, delivery one
/// to thirty days out, between 9 am and 5 pm, inside a single serviceable zip
/// code. The delivery window admits any minute of the final hour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderPolicy {
    pub min_cords: u32,
    pub max_cords: u32,
    pub min_lead_days: u64,
    pub max_lead_days: u64,
    pub earliest_hour: u32,
    pub latest_hour: u32,
    pub serviceable_zip: String,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            min_cords: 1,
            max_cords: 3,
            min_lead_days: 1,
            max_lead_days: 30,
            earliest_hour: 9,
            latest_hour: 17,
            serviceable_zip: "80863".to_owned(),
        }
    }
}

pub fn firewood_type_is_valid(value: Option<&str>, prices: &PriceBook) -> bool {
    value.is_some_and(|kind| prices.contains(kind))
}

pub fn number_cords_is_valid(value: Option<&str>, policy: &OrderPolicy) -> bool {
    let Some(raw) = value else {
        return false;
    };
    let Ok(cords) = raw.trim().parse::<i64>() else {
        return false;
    };
    cords >= i64::from(policy.min_cords) && cords <= i64::from(policy.max_cords)
}

/// Date-only comparison: valid strictly after `today`, at most
/// `max_lead_days` out.
pub fn delivery_date_is_valid(value: Option<&str>, today: NaiveDate, policy: &OrderPolicy) -> bool {
    let Some(raw) = value else {
        return false;
    };
    let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") else {
        return false;
    };
    let (Some(earliest), Some(latest)) = (
        today.checked_add_days(Days::new(policy.min_lead_days)),
        today.checked_add_days(Days::new(policy.max_lead_days)),
    ) else {
        return false;
    };
    date >= earliest && date <= latest
}

/// Exactly five characters, `HH:MM`, hour within the delivery window.
/// An hour equal to `latest_hour` passes with any minute.
pub fn delivery_time_is_valid(value: Option<&str>, policy: &OrderPolicy) -> bool {
    let Some(raw) = value else {
        return false;
    };
    if raw.len() != 5 {
        return false;
    }
    let Some((hour, minute)) = raw.split_once(':') else {
        return false;
    };
    let (Ok(hour), Ok(minute)) = (hour.parse::<u32>(), minute.parse::<u32>()) else {
        return false;
    };
    hour >= policy.earliest_hour && hour <= policy.latest_hour && minute <= 59
}

pub fn delivery_zip_is_valid(value: Option<&str>, policy: &OrderPolicy) -> bool {
    value == Some(policy.serviceable_zip.as_str())
}

/// Outcome of one pipeline run. A failure always carries both the slot to
/// re-collect and the prompt to ask with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotCheck {
    Valid,
    Invalid { slot: SlotName, message: String },
}

impl SlotCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn first_invalid_slot(&self) -> Option<SlotName> {
        match self {
            Self::Valid => None,
            Self::Invalid { slot, .. } => Some(*slot),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message, .. } => Some(message),
        }
    }
}

/// Runs the six slot validators strictly in elicitation order and stops at
/// the first failure. Only the street check suspends; a provider fault there
/// resolves to invalid, never to an error.
pub struct SlotPipeline<'a> {
    policy: &'a OrderPolicy,
    prices: &'a PriceBook,
    verifier: &'a dyn AddressVerifier,
}

impl<'a> SlotPipeline<'a> {
    pub fn new(
        policy: &'a OrderPolicy,
        prices: &'a PriceBook,
        verifier: &'a dyn AddressVerifier,
    ) -> Self {
        Self { policy, prices, verifier }
    }

    pub async fn validate(&self, slots: &SlotValues, today: NaiveDate) -> SlotCheck {
        if !firewood_type_is_valid(slots.get(SlotName::FirewoodType), self.prices) {
            return SlotCheck::Invalid {
                slot: SlotName::FirewoodType,
                message: self.firewood_type_prompt(),
            };
        }

        if !number_cords_is_valid(slots.get(SlotName::NumberCords), self.policy) {
            return SlotCheck::Invalid {
                slot: SlotName::NumberCords,
                message: self.number_cords_prompt(),
            };
        }

        if !delivery_date_is_valid(slots.get(SlotName::DeliveryDate), today, self.policy) {
            return SlotCheck::Invalid {
                slot: SlotName::DeliveryDate,
                message: DATE_PROMPT.to_owned(),
            };
        }

        if !delivery_time_is_valid(slots.get(SlotName::DeliveryTime), self.policy) {
            return SlotCheck::Invalid {
                slot: SlotName::DeliveryTime,
                message: TIME_PROMPT.to_owned(),
            };
        }

        if !delivery_zip_is_valid(slots.get(SlotName::DeliveryZip), self.policy) {
            return SlotCheck::Invalid {
                slot: SlotName::DeliveryZip,
                message: self.delivery_zip_prompt(),
            };
        }

        if !self.street_matches(slots).await {
            return SlotCheck::Invalid {
                slot: SlotName::DeliveryStreet,
                message: delivery_street_prompt(slots.get(SlotName::DeliveryStreet)),
            };
        }

        SlotCheck::Valid
    }

    async fn street_matches(&self, slots: &SlotValues) -> bool {
        let (Some(street), Some(zip)) =
            (slots.get(SlotName::DeliveryStreet), slots.get(SlotName::DeliveryZip))
        else {
            return false;
        };
        matches!(self.verifier.lookup(street, zip).await, Ok(AddressMatch::Match))
    }

    fn firewood_type_prompt(&self) -> String {
        format!(
            "Our firewood options are {}. Which type would you prefer?",
            or_list(&self.prices.catalog())
        )
    }

    fn number_cords_prompt(&self) -> String {
        let counts: Vec<String> =
            (self.policy.min_cords..=self.policy.max_cords).map(|n| n.to_string()).collect();
        let counts: Vec<&str> = counts.iter().map(String::as_str).collect();
        format!(
            "Delivery quantity options are {} cords. How many cords do you need?",
            or_list(&counts)
        )
    }

    fn delivery_zip_prompt(&self) -> String {
        format!(
            "Delivery is available only within the {} zip code. What is your delivery zip code?",
            self.policy.serviceable_zip
        )
    }
}

const DATE_PROMPT: &str =
    "Available delivery dates are from tomorrow to a month from today. What date would you prefer?";

const TIME_PROMPT: &str =
    "Available delivery times are from 9 am to 5 pm. What time would you prefer?";

fn delivery_street_prompt(street: Option<&str>) -> String {
    match street {
        Some(street) => format!(
            "The street address you provided {street} does not appear to be valid. \
             Please provide a street address for delivery."
        ),
        None => "Please provide a street address for delivery.".to_owned(),
    }
}

fn or_list(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_owned(),
        [first, second] => format!("{first} or {second}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}
