use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cordwood_provision::{BotPlan, BuildOutcome, HttpBotHostApi, PollSettings, Provisioner};

use super::load_config;

fn provisioner(
    config_path: Option<PathBuf>,
) -> Result<(Provisioner<HttpBotHostApi>, BotPlan)> {
    let config = load_config(config_path)?;
    let plan = BotPlan::load(&config.provision.plan_dir).with_context(|| {
        format!("could not load bot plan from `{}`", config.provision.plan_dir.display())
    })?;
    let api = HttpBotHostApi::from_config(&config.provision);
    Ok((Provisioner::new(api, PollSettings::from(&config.provision)), plan))
}

pub async fn build(config_path: Option<PathBuf>) -> Result<()> {
    let (provisioner, plan) = provisioner(config_path)?;

    match provisioner.build(&plan).await? {
        BuildOutcome::Ready => {
            println!("bot `{}` is ready", plan.bot.name);
            Ok(())
        }
        BuildOutcome::Failed => bail!("bot `{}` build failed on the host", plan.bot.name),
        BuildOutcome::TimedOut => {
            bail!("bot `{}` build did not become ready in time", plan.bot.name)
        }
    }
}

pub async fn probe(config_path: Option<PathBuf>, user_id: &str, text: &str) -> Result<()> {
    let (provisioner, plan) = provisioner(config_path)?;
    let reply = provisioner.probe(&plan, user_id, text).await?;
    println!("{reply}");
    Ok(())
}

pub async fn destroy(config_path: Option<PathBuf>) -> Result<()> {
    let (provisioner, plan) = provisioner(config_path)?;
    let report = provisioner.destroy(&plan).await;

    for resource in &report.removed {
        println!("removed {resource}");
    }
    for skip in &report.skipped {
        eprintln!("skipped {}: {}", skip.resource, skip.reason);
    }

    if !report.clean() {
        bail!("teardown finished with {} resource(s) left behind", report.skipped.len());
    }
    Ok(())
}
