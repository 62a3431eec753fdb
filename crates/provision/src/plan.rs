use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One remote resource to create: a name for addressing and teardown, plus
/// an opaque payload handed to the host API untouched.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Everything needed to stand up one hosted bot, loaded from a plan
/// directory:
///
/// ```text
/// plan/
///   bot.json
///   handler.json
///   permissions/*.json
///   slot_types/*.json
///   intents/*.json
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BotPlan {
    pub bot: ResourceDefinition,
    pub handler: ResourceDefinition,
    pub permissions: Vec<ResourceDefinition>,
    pub slot_types: Vec<ResourceDefinition>,
    pub intents: Vec<ResourceDefinition>,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("could not read plan document `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse plan document `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
    #[error("could not list plan directory `{path}`: {source}")]
    ReadDir { path: PathBuf, source: std::io::Error },
}

impl BotPlan {
    pub fn load(dir: &Path) -> Result<Self, PlanError> {
        Ok(Self {
            bot: read_document(&dir.join("bot.json"))?,
            handler: read_document(&dir.join("handler.json"))?,
            permissions: read_documents(&dir.join("permissions"))?,
            slot_types: read_documents(&dir.join("slot_types"))?,
            intents: read_documents(&dir.join("intents"))?,
        })
    }
}

fn read_document(path: &Path) -> Result<ResourceDefinition, PlanError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| PlanError::ReadFile { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| PlanError::ParseFile { path: path.to_path_buf(), source })
}

/// Reads every `*.json` in a collection directory, sorted by file name so
/// creation order is deterministic. A missing directory is an empty
/// collection.
fn read_documents(dir: &Path) -> Result<Vec<ResourceDefinition>, PlanError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|source| PlanError::ReadDir { path: dir.to_path_buf(), source })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths.iter().map(|path| read_document(path)).collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{BotPlan, PlanError};

    fn write(dir: &std::path::Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create plan subdirectory");
        }
        fs::write(path, contents).expect("write plan document");
    }

    #[test]
    fn loads_a_complete_plan_in_file_name_order() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "bot.json", r#"{"name": "Firewood", "locale": "en-US"}"#);
        write(dir.path(), "handler.json", r#"{"name": "firewood-turn", "runtime": "provided"}"#);
        write(dir.path(), "permissions/allow.json", r#"{"name": "dialog-engine-invoke"}"#);
        write(dir.path(), "slot_types/b_type.json", r#"{"name": "FirewoodTypeValues"}"#);
        write(dir.path(), "slot_types/a_zip.json", r#"{"name": "ZipValues"}"#);
        write(dir.path(), "intents/order.json", r#"{"name": "OrderFirewood"}"#);
        write(dir.path(), "intents/agent.json", r#"{"name": "RequestAgent"}"#);

        let plan = BotPlan::load(dir.path()).expect("plan loads");
        assert_eq!(plan.bot.name, "Firewood");
        assert_eq!(plan.bot.payload["locale"], "en-US");
        assert_eq!(plan.handler.name, "firewood-turn");
        assert_eq!(plan.permissions.len(), 1);

        let slot_type_names: Vec<&str> =
            plan.slot_types.iter().map(|definition| definition.name.as_str()).collect();
        assert_eq!(slot_type_names, vec!["ZipValues", "FirewoodTypeValues"]);

        let intent_names: Vec<&str> =
            plan.intents.iter().map(|definition| definition.name.as_str()).collect();
        assert_eq!(intent_names, vec!["RequestAgent", "OrderFirewood"]);
    }

    #[test]
    fn missing_collection_directories_are_empty() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "bot.json", r#"{"name": "Firewood"}"#);
        write(dir.path(), "handler.json", r#"{"name": "firewood-turn"}"#);

        let plan = BotPlan::load(dir.path()).expect("plan loads");
        assert!(plan.permissions.is_empty());
        assert!(plan.slot_types.is_empty());
        assert!(plan.intents.is_empty());
    }

    #[test]
    fn a_missing_bot_document_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "handler.json", r#"{"name": "firewood-turn"}"#);

        let error = BotPlan::load(dir.path()).expect_err("bot.json is required");
        assert!(matches!(error, PlanError::ReadFile { .. }));
    }
}
