use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use cordwood_core::{DialogError, IntentRouter, TurnEvent, TurnRequest, TurnResponse};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct TurnState {
    router: Arc<IntentRouter>,
}

impl TurnState {
    pub fn new(router: Arc<IntentRouter>) -> Self {
        Self { router }
    }
}

pub fn router(state: TurnState) -> Router {
    Router::new().route("/v1/turn", post(turn)).with_state(state)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnErrorBody {
    pub error: String,
    pub intent: String,
}

/// One dialog turn: event in, directive out. The only failure that reaches
/// the caller is an unsupported intent; everything slot-related comes back
/// inside the response as a prompt.
pub async fn turn(
    State(state): State<TurnState>,
    Json(event): Json<TurnEvent>,
) -> Result<Json<TurnResponse>, (StatusCode, Json<TurnErrorBody>)> {
    let correlation_id = Uuid::new_v4();
    let request = TurnRequest::from(event);

    info!(
        event_name = "turn.received",
        correlation_id = %correlation_id,
        intent = %request.intent,
        user_id = %request.user_id,
        "turn received"
    );

    match state.router.dispatch(&request).await {
        Ok(response) => {
            info!(
                event_name = "turn.resolved",
                correlation_id = %correlation_id,
                intent = %request.intent,
                "turn resolved"
            );
            Ok(Json(response))
        }
        Err(DialogError::UnsupportedIntent { intent }) => {
            warn!(
                event_name = "turn.unsupported_intent",
                correlation_id = %correlation_id,
                intent = %intent,
                "turn rejected: unsupported intent"
            );
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(TurnErrorBody { error: "unsupported intent".to_owned(), intent }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use cordwood_core::{
        DialogAction, IntentRouter, PriceBook, OrderPolicy, StaticAddressBook, TurnEvent,
    };
    use serde_json::json;

    use super::{turn, TurnState};

    fn state() -> TurnState {
        TurnState::new(Arc::new(IntentRouter::builtin(
            OrderPolicy::default(),
            PriceBook::default(),
            Arc::new(StaticAddressBook::new()),
        )))
    }

    fn event(intent: &str) -> TurnEvent {
        serde_json::from_value(json!({
            "intentName": intent,
            "userId": "user-7",
            "invocationSource": "FulfillmentCodeHook",
            "slots": {},
            "sessionAttributes": null
        }))
        .expect("event fixture parses")
    }

    #[tokio::test]
    async fn supported_intent_returns_a_response_body() {
        let response = turn(State(state()), Json(event("RequestAgent")))
            .await
            .expect("agent turn succeeds");
        assert!(matches!(response.0.dialog_action, DialogAction::Close { .. }));
        assert_eq!(response.0.session_attributes.get("Agent"), Some("true"));
    }

    #[tokio::test]
    async fn unsupported_intent_maps_to_unprocessable_entity() {
        let (status, body) = turn(State(state()), Json(event("BookFlight")))
            .await
            .expect_err("unknown intent must be rejected");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.0.intent, "BookFlight");
    }
}
