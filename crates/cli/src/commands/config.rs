use std::path::PathBuf;

use anyhow::Result;
use secrecy::ExposeSecret;

use super::load_config;

/// Prints the effective configuration after all layering, with secrets
/// reduced to set/unset markers.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("[order]");
    println!("serviceable_zip = {}", config.order.serviceable_zip);
    for (kind, price) in &config.order.prices_per_cord {
        println!("prices_per_cord.{kind} = {price}");
    }

    println!();
    println!("[verify]");
    println!("enabled = {}", config.verify.enabled);
    println!("base_url = {}", config.verify.base_url);
    println!("auth_id = {}", mark_present(!config.verify.auth_id.trim().is_empty()));
    println!(
        "auth_token = {}",
        mark_present(!config.verify.auth_token.expose_secret().trim().is_empty())
    );
    println!("timeout_secs = {}", config.verify.timeout_secs);

    println!();
    println!("[provision]");
    println!("base_url = {}", config.provision.base_url);
    println!("plan_dir = {}", config.provision.plan_dir.display());
    println!("poll_attempts = {}", config.provision.poll_attempts);
    println!("poll_interval_secs = {}", config.provision.poll_interval_secs);
    println!("settle_secs = {}", config.provision.settle_secs);

    println!();
    println!("[server]");
    println!("bind_address = {}", config.server.bind_address);
    println!("port = {}", config.server.port);
    println!("graceful_shutdown_secs = {}", config.server.graceful_shutdown_secs);

    println!();
    println!("[logging]");
    println!("level = {}", config.logging.level);
    println!("format = {:?}", config.logging.format);

    Ok(())
}

fn mark_present(present: bool) -> &'static str {
    if present {
        "<set>"
    } else {
        "<unset>"
    }
}
