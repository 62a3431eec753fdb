pub mod config;
pub mod provision;
pub mod respond;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cordwood_core::config::{AppConfig, LoadOptions};
use cordwood_core::{AcceptAllAddresses, AddressVerifier};
use cordwood_verify::HttpAddressVerifier;

pub(crate) fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig> {
    AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() })
        .context("could not load configuration")
}

pub(crate) fn build_verifier(config: &AppConfig) -> Result<Arc<dyn AddressVerifier>> {
    if config.verify.enabled {
        Ok(Arc::new(
            HttpAddressVerifier::from_config(&config.verify)
                .context("could not construct the address verifier client")?,
        ))
    } else {
        Ok(Arc::new(AcceptAllAddresses))
    }
}
