use serde::{Deserialize, Serialize};

use crate::session::SessionAttributes;
use crate::slots::SlotValues;

/// Which code hook the dialog engine invoked for this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
}

/// Conversation phase, derived from the invocation source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Information gathering: validate what has been collected so far.
    Dialog,
    /// Terminal turn: confirm the order and close the conversation.
    Fulfillment,
}

impl InvocationSource {
    pub fn stage(self) -> Stage {
        match self {
            Self::DialogCodeHook => Stage::Dialog,
            Self::FulfillmentCodeHook => Stage::Fulfillment,
        }
    }
}

/// The inbound per-turn event exactly as the dialog engine sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    pub intent_name: String,
    pub user_id: String,
    pub invocation_source: InvocationSource,
    #[serde(default)]
    pub slots: SlotValues,
    #[serde(default)]
    pub session_attributes: Option<SessionAttributes>,
}

/// Normalized form of a turn, created fresh per invocation and never mutated
/// after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnRequest {
    pub intent: String,
    pub stage: Stage,
    pub slots: SlotValues,
    pub session: SessionAttributes,
    pub user_id: String,
}

impl From<TurnEvent> for TurnRequest {
    fn from(event: TurnEvent) -> Self {
        Self {
            intent: event.intent_name,
            stage: event.invocation_source.stage(),
            slots: event.slots,
            session: event.session_attributes.unwrap_or_default(),
            user_id: event.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InvocationSource, Stage, TurnEvent, TurnRequest};
    use crate::slots::SlotName;

    #[test]
    fn parses_a_dialog_hook_event() {
        let raw = r#"{
            "intentName": "OrderFirewood",
            "userId": "user-81",
            "invocationSource": "DialogCodeHook",
            "slots": {"FirewoodType": "split", "NumberCords": null},
            "sessionAttributes": {"Price": "$400"}
        }"#;

        let event: TurnEvent = serde_json::from_str(raw).expect("parse event");
        assert_eq!(event.invocation_source, InvocationSource::DialogCodeHook);

        let request = TurnRequest::from(event);
        assert_eq!(request.intent, "OrderFirewood");
        assert_eq!(request.stage, Stage::Dialog);
        assert_eq!(request.slots.get(SlotName::FirewoodType), Some("split"));
        assert_eq!(request.slots.get(SlotName::NumberCords), None);
        assert_eq!(request.session.get("Price"), Some("$400"));
        assert_eq!(request.user_id, "user-81");
    }

    #[test]
    fn absent_slots_and_attributes_default_to_empty() {
        let raw = r#"{
            "intentName": "RequestAgent",
            "userId": "user-82",
            "invocationSource": "FulfillmentCodeHook",
            "sessionAttributes": null
        }"#;

        let request = TurnRequest::from(
            serde_json::from_str::<TurnEvent>(raw).expect("parse event"),
        );
        assert_eq!(request.stage, Stage::Fulfillment);
        assert!(request.slots.is_empty());
        assert!(request.session.is_empty());
    }

    #[test]
    fn unknown_invocation_sources_are_rejected_at_the_boundary() {
        let raw = r#"{
            "intentName": "OrderFirewood",
            "userId": "user-83",
            "invocationSource": "ConfirmationHook",
            "slots": {}
        }"#;

        assert!(serde_json::from_str::<TurnEvent>(raw).is_err());
    }
}
