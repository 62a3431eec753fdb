use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use cordwood_core::config::ProvisionConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::plan::ResourceDefinition;

/// Remote build state of the hosted bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotStatus {
    Building,
    Ready,
    Failed,
}

#[derive(Debug, Error)]
pub enum HostApiError {
    #[error("host transport failure: {0}")]
    Transport(String),
    #[error("host returned status {status} for {operation}")]
    Status { operation: String, status: u16 },
    #[error("host response could not be decoded: {0}")]
    Decode(String),
}

/// Admin surface of the remote bot-hosting environment. One method per
/// resource operation; the orchestrator owns ordering, polling, and
/// teardown tolerance.
#[async_trait]
pub trait BotHostApi: Send + Sync {
    async fn put_handler(&self, definition: &ResourceDefinition) -> Result<(), HostApiError>;
    async fn grant_permission(&self, definition: &ResourceDefinition) -> Result<(), HostApiError>;
    async fn put_slot_type(&self, definition: &ResourceDefinition) -> Result<(), HostApiError>;
    async fn put_intent(&self, definition: &ResourceDefinition) -> Result<(), HostApiError>;
    async fn put_bot(&self, definition: &ResourceDefinition) -> Result<(), HostApiError>;
    async fn bot_status(&self, name: &str) -> Result<BotStatus, HostApiError>;
    async fn post_text(&self, bot: &str, user_id: &str, text: &str)
        -> Result<String, HostApiError>;
    async fn delete_bot(&self, name: &str) -> Result<(), HostApiError>;
    async fn delete_intent(&self, name: &str) -> Result<(), HostApiError>;
    async fn delete_slot_type(&self, name: &str) -> Result<(), HostApiError>;
    async fn delete_handler(&self, name: &str) -> Result<(), HostApiError>;
}

/// REST client for the host admin API.
pub struct HttpBotHostApi {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    message: String,
}

impl HttpBotHostApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub fn from_config(config: &ProvisionConfig) -> Self {
        Self::new(Client::new(), config.base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn put_resource(
        &self,
        operation: &str,
        path: String,
        definition: &ResourceDefinition,
    ) -> Result<(), HostApiError> {
        let response = self
            .client
            .put(self.url(&path))
            .json(&definition.payload)
            .send()
            .await
            .map_err(|err| HostApiError::Transport(err.to_string()))?;
        ensure_success(operation, response.status())
    }

    async fn delete_resource(&self, operation: &str, path: String) -> Result<(), HostApiError> {
        let response = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|err| HostApiError::Transport(err.to_string()))?;
        ensure_success(operation, response.status())
    }
}

fn ensure_success(operation: &str, status: reqwest::StatusCode) -> Result<(), HostApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(HostApiError::Status { operation: operation.to_owned(), status: status.as_u16() })
    }
}

#[async_trait]
impl BotHostApi for HttpBotHostApi {
    async fn put_handler(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.put_resource("put handler", format!("handlers/{}", definition.name), definition).await
    }

    async fn grant_permission(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        let response = self
            .client
            .post(self.url(&format!("handlers/{}/permissions", definition.name)))
            .json(&definition.payload)
            .send()
            .await
            .map_err(|err| HostApiError::Transport(err.to_string()))?;
        ensure_success("grant permission", response.status())
    }

    async fn put_slot_type(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.put_resource("put slot type", format!("slot-types/{}", definition.name), definition)
            .await
    }

    async fn put_intent(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.put_resource("put intent", format!("intents/{}", definition.name), definition).await
    }

    async fn put_bot(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.put_resource("put bot", format!("bots/{}", definition.name), definition).await
    }

    async fn bot_status(&self, name: &str) -> Result<BotStatus, HostApiError> {
        let response = self
            .client
            .get(self.url(&format!("bots/{name}")))
            .send()
            .await
            .map_err(|err| HostApiError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostApiError::Status {
                operation: "get bot status".to_owned(),
                status: status.as_u16(),
            });
        }

        let payload: StatusPayload =
            response.json().await.map_err(|err| HostApiError::Decode(err.to_string()))?;
        Ok(parse_bot_status(&payload.status))
    }

    async fn post_text(
        &self,
        bot: &str,
        user_id: &str,
        text: &str,
    ) -> Result<String, HostApiError> {
        let response = self
            .client
            .post(self.url(&format!("bots/{bot}/messages")))
            .json(&json!({ "userId": user_id, "text": text }))
            .send()
            .await
            .map_err(|err| HostApiError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostApiError::Status {
                operation: "post text".to_owned(),
                status: status.as_u16(),
            });
        }

        let payload: ReplyPayload =
            response.json().await.map_err(|err| HostApiError::Decode(err.to_string()))?;
        Ok(payload.message)
    }

    async fn delete_bot(&self, name: &str) -> Result<(), HostApiError> {
        self.delete_resource("delete bot", format!("bots/{name}")).await
    }

    async fn delete_intent(&self, name: &str) -> Result<(), HostApiError> {
        self.delete_resource("delete intent", format!("intents/{name}")).await
    }

    async fn delete_slot_type(&self, name: &str) -> Result<(), HostApiError> {
        self.delete_resource("delete slot type", format!("slot-types/{name}")).await
    }

    async fn delete_handler(&self, name: &str) -> Result<(), HostApiError> {
        self.delete_resource("delete handler", format!("handlers/{name}")).await
    }
}

/// Anything the host reports that is not terminal counts as still building.
fn parse_bot_status(raw: &str) -> BotStatus {
    match raw.to_ascii_uppercase().as_str() {
        "READY" => BotStatus::Ready,
        "FAILED" => BotStatus::Failed,
        _ => BotStatus::Building,
    }
}

/// Scriptable host double for orchestrator tests: records the order of every
/// create and delete, pops scripted build statuses, and can be told to fail
/// specific deletions.
#[derive(Default)]
pub struct InMemoryBotHost {
    state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    created: Vec<String>,
    deleted: Vec<String>,
    statuses: VecDeque<BotStatus>,
    failing_deletes: BTreeSet<String>,
    replies: VecDeque<String>,
}

impl InMemoryBotHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = BotStatus>) {
        self.lock().statuses.extend(statuses);
    }

    pub fn script_reply(&self, reply: impl Into<String>) {
        self.lock().replies.push_back(reply.into());
    }

    pub fn fail_delete(&self, label: impl Into<String>) {
        self.lock().failing_deletes.insert(label.into());
    }

    pub fn created(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_create(&self, label: String) {
        self.lock().created.push(label);
    }

    fn record_delete(&self, label: String) -> Result<(), HostApiError> {
        let mut state = self.lock();
        if state.failing_deletes.contains(&label) {
            return Err(HostApiError::Status { operation: label, status: 409 });
        }
        state.deleted.push(label);
        Ok(())
    }
}

#[async_trait]
impl BotHostApi for InMemoryBotHost {
    async fn put_handler(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.record_create(format!("handler:{}", definition.name));
        Ok(())
    }

    async fn grant_permission(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.record_create(format!("permission:{}", definition.name));
        Ok(())
    }

    async fn put_slot_type(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.record_create(format!("slot_type:{}", definition.name));
        Ok(())
    }

    async fn put_intent(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.record_create(format!("intent:{}", definition.name));
        Ok(())
    }

    async fn put_bot(&self, definition: &ResourceDefinition) -> Result<(), HostApiError> {
        self.record_create(format!("bot:{}", definition.name));
        Ok(())
    }

    async fn bot_status(&self, _name: &str) -> Result<BotStatus, HostApiError> {
        Ok(self.lock().statuses.pop_front().unwrap_or(BotStatus::Building))
    }

    async fn post_text(
        &self,
        bot: &str,
        _user_id: &str,
        text: &str,
    ) -> Result<String, HostApiError> {
        Ok(self
            .lock()
            .replies
            .pop_front()
            .unwrap_or_else(|| format!("{bot} echoed: {text}")))
    }

    async fn delete_bot(&self, name: &str) -> Result<(), HostApiError> {
        self.record_delete(format!("bot:{name}"))
    }

    async fn delete_intent(&self, name: &str) -> Result<(), HostApiError> {
        self.record_delete(format!("intent:{name}"))
    }

    async fn delete_slot_type(&self, name: &str) -> Result<(), HostApiError> {
        self.record_delete(format!("slot_type:{name}"))
    }

    async fn delete_handler(&self, name: &str) -> Result<(), HostApiError> {
        self.record_delete(format!("handler:{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bot_status, BotStatus};

    #[test]
    fn terminal_statuses_parse_case_insensitively() {
        assert_eq!(parse_bot_status("READY"), BotStatus::Ready);
        assert_eq!(parse_bot_status("ready"), BotStatus::Ready);
        assert_eq!(parse_bot_status("FAILED"), BotStatus::Failed);
    }

    #[test]
    fn unknown_statuses_count_as_still_building() {
        assert_eq!(parse_bot_status("BUILDING"), BotStatus::Building);
        assert_eq!(parse_bot_status("NOT_BUILT"), BotStatus::Building);
        assert_eq!(parse_bot_status(""), BotStatus::Building);
    }
}
