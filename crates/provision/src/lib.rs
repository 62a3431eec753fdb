//! Provisioning orchestrator for the remote bot-hosting environment.
//!
//! Stands up (and tears down) the hosted side of the assistant: the turn
//! handler, its invoke permissions, slot types, intents, and the bot itself.
//! Creation is ordered, readiness is polled with a bounded attempt budget,
//! and teardown is best-effort in reverse dependency order.

pub mod api;
pub mod orchestrator;
pub mod plan;

pub use api::{BotHostApi, BotStatus, HostApiError, HttpBotHostApi, InMemoryBotHost};
pub use orchestrator::{
    BuildOutcome, PollSettings, ProvisionError, Provisioner, TeardownReport, TeardownSkip,
};
pub use plan::{BotPlan, PlanError, ResourceDefinition};
