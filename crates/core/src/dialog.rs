use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::DialogError;
use crate::event::{Stage, TurnRequest};
use crate::pricing::PriceBook;
use crate::router::IntentHandler;
use crate::session::{SessionAttributes, AGENT_ATTRIBUTE, PRICE_ATTRIBUTE};
use crate::slots::{SlotName, SlotValues};
use crate::validate::{OrderPolicy, SlotCheck, SlotPipeline};
use crate::verify::AddressVerifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogMessage {
    pub content_type: ContentType,
    pub content: String,
}

impl DialogMessage {
    pub fn plain(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
}

/// The directive handed back to the dialog engine. Serialized with a `type`
/// tag so the wire shape is exactly what the engine consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DialogAction {
    /// Non-terminal: proceed with the engine's own next-step logic.
    #[serde(rename_all = "camelCase")]
    Delegate { slots: SlotValues },
    /// Re-prompt the user for one specific slot.
    #[serde(rename_all = "camelCase")]
    ElicitSlot {
        intent_name: String,
        slots: SlotValues,
        slot_to_elicit: SlotName,
        message: DialogMessage,
    },
    /// Terminal: confirm and close the conversation.
    #[serde(rename_all = "camelCase")]
    Close { fulfillment_state: FulfillmentState, message: DialogMessage },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub session_attributes: SessionAttributes,
    pub dialog_action: DialogAction,
}

/// The firewood-ordering workflow: validate during Dialog turns, confirm
/// during the Fulfillment turn.
pub struct OrderFirewoodFlow {
    policy: OrderPolicy,
    prices: PriceBook,
    verifier: Arc<dyn AddressVerifier>,
}

impl OrderFirewoodFlow {
    pub const INTENT: &'static str = "OrderFirewood";

    pub fn new(policy: OrderPolicy, prices: PriceBook, verifier: Arc<dyn AddressVerifier>) -> Self {
        Self { policy, prices, verifier }
    }

    async fn dialog_turn(&self, request: &TurnRequest) -> TurnResponse {
        let pipeline = SlotPipeline::new(&self.policy, &self.prices, self.verifier.as_ref());
        let today = Local::now().date_naive();

        match pipeline.validate(&request.slots, today).await {
            SlotCheck::Valid => {
                let mut session = request.session.clone();
                // The price is fixed the turn all slots first validate; a
                // carried value is never recomputed.
                if let Some(label) = self.quote_for(&request.slots) {
                    session.set_if_absent(PRICE_ATTRIBUTE, label);
                }
                TurnResponse {
                    session_attributes: session,
                    dialog_action: DialogAction::Delegate { slots: request.slots.clone() },
                }
            }
            SlotCheck::Invalid { slot, message } => {
                let mut slots = request.slots.clone();
                slots.clear(slot);
                TurnResponse {
                    session_attributes: request.session.clone(),
                    dialog_action: DialogAction::ElicitSlot {
                        intent_name: request.intent.clone(),
                        slots,
                        slot_to_elicit: slot,
                        message: DialogMessage::plain(message),
                    },
                }
            }
        }
    }

    fn fulfillment_turn(&self, request: &TurnRequest) -> TurnResponse {
        // No revalidation here: a prior Dialog turn already delegated with
        // the price stored. A caller that skips that turn gets an empty
        // price rather than a failed conversation.
        let price = request.session.get(PRICE_ATTRIBUTE).unwrap_or_default().to_owned();
        TurnResponse {
            session_attributes: request.session.clone(),
            dialog_action: DialogAction::Close {
                fulfillment_state: FulfillmentState::Fulfilled,
                message: DialogMessage::plain(confirmation_message(&request.slots, &price)),
            },
        }
    }

    fn quote_for(&self, slots: &SlotValues) -> Option<String> {
        let kind = slots.get(SlotName::FirewoodType)?;
        let cords = slots.get(SlotName::NumberCords)?.trim().parse::<u32>().ok()?;
        self.prices.quote_label(kind, cords)
    }
}

#[async_trait]
impl IntentHandler for OrderFirewoodFlow {
    fn intent_name(&self) -> &'static str {
        Self::INTENT
    }

    async fn handle(&self, request: &TurnRequest) -> Result<TurnResponse, DialogError> {
        Ok(match request.stage {
            Stage::Dialog => self.dialog_turn(request).await,
            Stage::Fulfillment => self.fulfillment_turn(request),
        })
    }
}

/// Hand the conversation to a human agent.
#[derive(Clone, Debug, Default)]
pub struct AgentTransferFlow;

impl AgentTransferFlow {
    pub const INTENT: &'static str = "RequestAgent";
    pub const TRANSFER_MESSAGE: &'static str = "Transferring you to an agent now.";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IntentHandler for AgentTransferFlow {
    fn intent_name(&self) -> &'static str {
        Self::INTENT
    }

    async fn handle(&self, request: &TurnRequest) -> Result<TurnResponse, DialogError> {
        Ok(match request.stage {
            // This intent collects no slots; a dialog-stage turn has nothing
            // to validate and simply proceeds.
            Stage::Dialog => TurnResponse {
                session_attributes: request.session.clone(),
                dialog_action: DialogAction::Delegate { slots: request.slots.clone() },
            },
            Stage::Fulfillment => {
                let mut session = request.session.clone();
                session.set(AGENT_ATTRIBUTE, "true");
                TurnResponse {
                    session_attributes: session,
                    dialog_action: DialogAction::Close {
                        fulfillment_state: FulfillmentState::Fulfilled,
                        message: DialogMessage::plain(Self::TRANSFER_MESSAGE),
                    },
                }
            }
        })
    }
}

fn confirmation_message(slots: &SlotValues, price: &str) -> String {
    format!(
        "Thanks, your order for {} cords of {} firewood has been placed and will be \
         delivered to {} on {} at {}. We will need to collect a payment of {} upon arrival.",
        slots.display(SlotName::NumberCords),
        slots.display(SlotName::FirewoodType),
        slots.display(SlotName::DeliveryStreet),
        slots.display(SlotName::DeliveryDate),
        slots.display(SlotName::DeliveryTime),
        price,
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AgentTransferFlow, ContentType, DialogAction, DialogMessage, FulfillmentState,
        TurnResponse,
    };
    use crate::event::{Stage, TurnRequest};
    use crate::router::IntentHandler;
    use crate::session::SessionAttributes;
    use crate::slots::{SlotName, SlotValues};

    fn request(stage: Stage) -> TurnRequest {
        TurnRequest {
            intent: AgentTransferFlow::INTENT.to_owned(),
            stage,
            slots: SlotValues::new(),
            session: SessionAttributes::new(),
            user_id: "user-1".to_owned(),
        }
    }

    #[tokio::test]
    async fn agent_transfer_closes_with_the_fixed_message() {
        let flow = AgentTransferFlow::new();
        let response =
            flow.handle(&request(Stage::Fulfillment)).await.expect("agent transfer");

        assert_eq!(response.session_attributes.get("Agent"), Some("true"));
        match response.dialog_action {
            DialogAction::Close { fulfillment_state, message } => {
                assert_eq!(fulfillment_state, FulfillmentState::Fulfilled);
                assert_eq!(message.content, AgentTransferFlow::TRANSFER_MESSAGE);
            }
            other => panic!("expected Close, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn agent_transfer_delegates_on_a_dialog_turn() {
        let flow = AgentTransferFlow::new();
        let response = flow.handle(&request(Stage::Dialog)).await.expect("agent transfer");
        assert!(matches!(response.dialog_action, DialogAction::Delegate { .. }));
    }

    #[test]
    fn delegate_serializes_to_the_engine_wire_shape() {
        let mut slots = SlotValues::new();
        slots.set(SlotName::FirewoodType, "split");
        let mut session = SessionAttributes::new();
        session.set("Price", "$400");

        let response = TurnResponse {
            session_attributes: session,
            dialog_action: DialogAction::Delegate { slots },
        };

        let raw = serde_json::to_value(&response).expect("serialize response");
        assert_eq!(raw["sessionAttributes"]["Price"], "$400");
        assert_eq!(raw["dialogAction"]["type"], "Delegate");
        assert_eq!(raw["dialogAction"]["slots"]["FirewoodType"], "split");
    }

    #[test]
    fn elicit_slot_serializes_to_the_engine_wire_shape() {
        let mut slots = SlotValues::new();
        slots.clear(SlotName::DeliveryZip);

        let response = TurnResponse {
            session_attributes: SessionAttributes::new(),
            dialog_action: DialogAction::ElicitSlot {
                intent_name: "OrderFirewood".to_owned(),
                slots,
                slot_to_elicit: SlotName::DeliveryZip,
                message: DialogMessage::plain("What is your delivery zip code?"),
            },
        };

        let raw = serde_json::to_value(&response).expect("serialize response");
        let action = &raw["dialogAction"];
        assert_eq!(action["type"], "ElicitSlot");
        assert_eq!(action["intentName"], "OrderFirewood");
        assert_eq!(action["slotToElicit"], "DeliveryZip");
        assert_eq!(action["slots"]["DeliveryZip"], serde_json::Value::Null);
        assert_eq!(action["message"]["contentType"], "PlainText");
        assert_eq!(action["message"]["content"], "What is your delivery zip code?");
    }

    #[test]
    fn close_serializes_to_the_engine_wire_shape() {
        let response = TurnResponse {
            session_attributes: SessionAttributes::new(),
            dialog_action: DialogAction::Close {
                fulfillment_state: FulfillmentState::Fulfilled,
                message: DialogMessage { content_type: ContentType::PlainText, content: "done".to_owned() },
            },
        };

        let raw = serde_json::to_value(&response).expect("serialize response");
        assert_eq!(raw["dialogAction"]["type"], "Close");
        assert_eq!(raw["dialogAction"]["fulfillmentState"], "Fulfilled");
        assert_eq!(raw["dialogAction"]["message"]["contentType"], "PlainText");
    }
}
