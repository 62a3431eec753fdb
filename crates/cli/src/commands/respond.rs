use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cordwood_core::{IntentRouter, TurnEvent, TurnRequest};

use super::{build_verifier, load_config};

/// Runs one event document through the same router the server uses and
/// prints the response the dialog engine would receive.
pub async fn run(config_path: Option<PathBuf>, event_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let verifier = build_verifier(&config)?;

    let raw = fs::read_to_string(event_path)
        .with_context(|| format!("could not read event file `{}`", event_path.display()))?;
    let event: TurnEvent = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse event file `{}`", event_path.display()))?;

    let router = IntentRouter::builtin(config.order_policy(), config.price_book(), verifier);
    let response = router.dispatch(&TurnRequest::from(event)).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
