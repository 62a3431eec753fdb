use std::time::Duration;

use cordwood_core::config::ProvisionConfig;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{BotHostApi, BotStatus, HostApiError};
use crate::plan::BotPlan;

/// Terminal outcome of a build: the bot reached READY, the host reported a
/// failed build, or the attempt budget ran out first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    Ready,
    Failed,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
    /// Pause between destructive teardown steps so the host can settle.
    pub settle: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { attempts: 20, interval: Duration::from_secs(20), settle: Duration::from_secs(5) }
    }
}

impl From<&ProvisionConfig> for PollSettings {
    fn from(config: &ProvisionConfig) -> Self {
        Self {
            attempts: config.poll_attempts,
            interval: Duration::from_secs(config.poll_interval_secs),
            settle: Duration::from_secs(config.settle_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("host api failure during {step}: {source}")]
    Host { step: &'static str, source: HostApiError },
}

/// Teardown never aborts; it records what it could not remove instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub removed: Vec<String>,
    pub skipped: Vec<TeardownSkip>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeardownSkip {
    pub resource: String,
    pub reason: String,
}

impl TeardownReport {
    pub fn clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Drives the remote bot-hosting environment through its lifecycle: ordered
/// create, poll-until-terminal, ad hoc probe, best-effort teardown in
/// reverse dependency order.
pub struct Provisioner<A> {
    api: A,
    poll: PollSettings,
}

impl<A> Provisioner<A>
where
    A: BotHostApi,
{
    pub fn new(api: A, poll: PollSettings) -> Self {
        Self { api, poll }
    }

    /// Creates every plan resource in dependency order, then polls the bot
    /// build to a terminal outcome. Creation failures abort; a FAILED or
    /// timed-out build is an outcome, not an error.
    pub async fn build(&self, plan: &BotPlan) -> Result<BuildOutcome, ProvisionError> {
        info!(event_name = "provision.build_started", bot = %plan.bot.name, "building bot environment");

        self.api.put_handler(&plan.handler).await.map_err(host_error("create handler"))?;
        for permission in &plan.permissions {
            self.api.grant_permission(permission).await.map_err(host_error("grant permission"))?;
        }
        for slot_type in &plan.slot_types {
            self.api.put_slot_type(slot_type).await.map_err(host_error("create slot type"))?;
        }
        for intent in &plan.intents {
            self.api.put_intent(intent).await.map_err(host_error("create intent"))?;
        }
        self.api.put_bot(&plan.bot).await.map_err(host_error("create bot"))?;

        self.poll_until_terminal(&plan.bot.name).await
    }

    async fn poll_until_terminal(&self, bot: &str) -> Result<BuildOutcome, ProvisionError> {
        for attempt in 1..=self.poll.attempts {
            sleep(self.poll.interval).await;
            match self.api.bot_status(bot).await.map_err(host_error("poll bot status"))? {
                BotStatus::Ready => {
                    info!(event_name = "provision.build_ready", bot, attempt, "bot build is ready");
                    return Ok(BuildOutcome::Ready);
                }
                BotStatus::Failed => {
                    warn!(event_name = "provision.build_failed", bot, attempt, "bot build failed");
                    return Ok(BuildOutcome::Failed);
                }
                BotStatus::Building => {
                    debug!(event_name = "provision.build_pending", bot, attempt, "bot still building");
                }
            }
        }

        warn!(
            event_name = "provision.build_timed_out",
            bot,
            attempts = self.poll.attempts,
            "bot build did not reach a terminal status"
        );
        Ok(BuildOutcome::TimedOut)
    }

    /// Sends one ad hoc text into the hosted bot and returns its reply.
    pub async fn probe(
        &self,
        plan: &BotPlan,
        user_id: &str,
        text: &str,
    ) -> Result<String, ProvisionError> {
        self.api.post_text(&plan.bot.name, user_id, text).await.map_err(host_error("post text"))
    }

    /// Tears down in reverse dependency order. Each failure is recorded and
    /// skipped over so the remaining resources still get removed.
    pub async fn destroy(&self, plan: &BotPlan) -> TeardownReport {
        let mut report = TeardownReport::default();

        let bot = format!("bot:{}", plan.bot.name);
        self.record(&mut report, bot, self.api.delete_bot(&plan.bot.name).await);
        sleep(self.poll.settle).await;

        for intent in plan.intents.iter().rev() {
            let label = format!("intent:{}", intent.name);
            self.record(&mut report, label, self.api.delete_intent(&intent.name).await);
            sleep(self.poll.settle).await;
        }

        for slot_type in plan.slot_types.iter().rev() {
            let label = format!("slot_type:{}", slot_type.name);
            self.record(&mut report, label, self.api.delete_slot_type(&slot_type.name).await);
        }

        let handler = format!("handler:{}", plan.handler.name);
        self.record(&mut report, handler, self.api.delete_handler(&plan.handler.name).await);

        info!(
            event_name = "provision.teardown_finished",
            bot = %plan.bot.name,
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            "teardown finished"
        );
        report
    }

    fn record(
        &self,
        report: &mut TeardownReport,
        resource: String,
        result: Result<(), HostApiError>,
    ) {
        match result {
            Ok(()) => report.removed.push(resource),
            Err(error) => {
                warn!(
                    event_name = "provision.teardown_skipped",
                    resource = %resource,
                    error = %error,
                    "could not remove resource, continuing teardown"
                );
                report.skipped.push(TeardownSkip { resource, reason: error.to_string() });
            }
        }
    }
}

fn host_error(step: &'static str) -> impl FnOnce(HostApiError) -> ProvisionError {
    move |source| ProvisionError::Host { step, source }
}
