pub mod config;
pub mod dialog;
pub mod errors;
pub mod event;
pub mod pricing;
pub mod router;
pub mod session;
pub mod slots;
pub mod validate;
pub mod verify;

pub use dialog::{
    AgentTransferFlow, ContentType, DialogAction, DialogMessage, FulfillmentState,
    OrderFirewoodFlow, TurnResponse,
};
pub use errors::DialogError;
pub use event::{InvocationSource, Stage, TurnEvent, TurnRequest};
pub use pricing::PriceBook;
pub use router::{IntentHandler, IntentRouter};
pub use session::{SessionAttributes, AGENT_ATTRIBUTE, PRICE_ATTRIBUTE};
pub use slots::{SlotName, SlotValues};
pub use validate::{OrderPolicy, SlotCheck, SlotPipeline};
pub use verify::{AcceptAllAddresses, AddressMatch, AddressVerifier, StaticAddressBook, VerifyError};
