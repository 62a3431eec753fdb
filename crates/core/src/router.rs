use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dialog::{AgentTransferFlow, OrderFirewoodFlow, TurnResponse};
use crate::errors::DialogError;
use crate::event::TurnRequest;
use crate::pricing::PriceBook;
use crate::validate::OrderPolicy;
use crate::verify::AddressVerifier;

/// One per-intent workflow. Implementations own everything their intent
/// needs; the router only dispatches.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    fn intent_name(&self) -> &'static str;
    async fn handle(&self, request: &TurnRequest) -> Result<TurnResponse, DialogError>;
}

/// Registry of intent workflows keyed by intent name. New intents register
/// without touching dispatch; an intent nothing registered for is the fatal
/// `UnsupportedIntent` condition.
#[derive(Default)]
pub struct IntentRouter {
    handlers: HashMap<String, Box<dyn IntentHandler>>,
}

impl IntentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router covering the two built-in workflows.
    pub fn builtin(
        policy: OrderPolicy,
        prices: PriceBook,
        verifier: Arc<dyn AddressVerifier>,
    ) -> Self {
        let mut router = Self::new();
        router.register(OrderFirewoodFlow::new(policy, prices, verifier));
        router.register(AgentTransferFlow::new());
        router
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: IntentHandler + 'static,
    {
        self.handlers.insert(handler.intent_name().to_owned(), Box::new(handler));
    }

    pub async fn dispatch(&self, request: &TurnRequest) -> Result<TurnResponse, DialogError> {
        let handler = self
            .handlers
            .get(&request.intent)
            .ok_or_else(|| DialogError::UnsupportedIntent { intent: request.intent.clone() })?;
        handler.handle(request).await
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::IntentRouter;
    use crate::errors::DialogError;
    use crate::event::{Stage, TurnRequest};
    use crate::pricing::PriceBook;
    use crate::session::SessionAttributes;
    use crate::slots::SlotValues;
    use crate::validate::OrderPolicy;
    use crate::verify::StaticAddressBook;

    fn request(intent: &str) -> TurnRequest {
        TurnRequest {
            intent: intent.to_owned(),
            stage: Stage::Fulfillment,
            slots: SlotValues::new(),
            session: SessionAttributes::new(),
            user_id: "user-9".to_owned(),
        }
    }

    #[tokio::test]
    async fn builtin_router_covers_both_workflows() {
        let router = IntentRouter::builtin(
            OrderPolicy::default(),
            PriceBook::default(),
            Arc::new(StaticAddressBook::new()),
        );
        assert_eq!(router.len(), 2);

        assert!(router.dispatch(&request("RequestAgent")).await.is_ok());
        assert!(router.dispatch(&request("OrderFirewood")).await.is_ok());
    }

    #[tokio::test]
    async fn unregistered_intent_is_a_fatal_error() {
        let router = IntentRouter::builtin(
            OrderPolicy::default(),
            PriceBook::default(),
            Arc::new(StaticAddressBook::new()),
        );

        let error = router
            .dispatch(&request("BookFlight"))
            .await
            .expect_err("unknown intent must not produce a response");
        assert_eq!(error, DialogError::UnsupportedIntent { intent: "BookFlight".to_owned() });
    }
}
