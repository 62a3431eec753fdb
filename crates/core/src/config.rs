use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::PriceBook;
use crate::validate::OrderPolicy;

/// Effective runtime configuration.
///
/// Layering, lowest precedence first: built-in defaults, an optional
/// `cordwood.toml` patch (with `${ENV}` interpolation), `CORDWOOD_*`
/// environment overrides, programmatic overrides, then validation.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub order: OrderConfig,
    pub verify: VerifyConfig,
    pub provision: ProvisionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct OrderConfig {
    pub serviceable_zip: String,
    /// Whole dollars per cord, keyed by firewood type.
    pub prices_per_cord: BTreeMap<String, u32>,
}

#[derive(Clone, Debug)]
pub struct VerifyConfig {
    /// When false, street checks run against the static address book instead
    /// of the remote provider.
    pub enabled: bool,
    pub base_url: String,
    pub auth_id: String,
    pub auth_token: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ProvisionConfig {
    pub base_url: String,
    pub plan_dir: PathBuf,
    pub poll_attempts: u32,
    pub poll_interval_secs: u64,
    pub settle_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub serviceable_zip: Option<String>,
    pub log_level: Option<String>,
    pub verify_enabled: Option<bool>,
    pub verify_auth_id: Option<String>,
    pub verify_auth_token: Option<String>,
    pub plan_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            order: OrderConfig {
                serviceable_zip: "80863".to_owned(),
                prices_per_cord: BTreeMap::from([
                    ("split".to_owned(), 200),
                    ("logs".to_owned(), 150),
                ]),
            },
            verify: VerifyConfig {
                enabled: false,
                base_url: "https://us-street.api.smartystreets.com".to_owned(),
                auth_id: String::new(),
                auth_token: String::new().into(),
                timeout_secs: 10,
            },
            provision: ProvisionConfig {
                base_url: "http://127.0.0.1:9090".to_owned(),
                plan_dir: PathBuf::from("plan"),
                poll_attempts: 20,
                poll_interval_secs: 20,
                settle_secs: 5,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_owned(),
                port: 8088,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cordwood.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Ordering policy with the configured zip code; everything else is the
    /// fixed production policy.
    pub fn order_policy(&self) -> OrderPolicy {
        OrderPolicy { serviceable_zip: self.order.serviceable_zip.clone(), ..OrderPolicy::default() }
    }

    pub fn price_book(&self) -> PriceBook {
        PriceBook::new(
            self.order
                .prices_per_cord
                .iter()
                .map(|(kind, dollars)| (kind.clone(), Decimal::from(*dollars))),
        )
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(order) = patch.order {
            if let Some(serviceable_zip) = order.serviceable_zip {
                self.order.serviceable_zip = serviceable_zip;
            }
            if let Some(prices_per_cord) = order.prices_per_cord {
                self.order.prices_per_cord = prices_per_cord;
            }
        }

        if let Some(verify) = patch.verify {
            if let Some(enabled) = verify.enabled {
                self.verify.enabled = enabled;
            }
            if let Some(base_url) = verify.base_url {
                self.verify.base_url = base_url;
            }
            if let Some(auth_id) = verify.auth_id {
                self.verify.auth_id = auth_id;
            }
            if let Some(auth_token_value) = verify.auth_token {
                self.verify.auth_token = auth_token_value.into();
            }
            if let Some(timeout_secs) = verify.timeout_secs {
                self.verify.timeout_secs = timeout_secs;
            }
        }

        if let Some(provision) = patch.provision {
            if let Some(base_url) = provision.base_url {
                self.provision.base_url = base_url;
            }
            if let Some(plan_dir) = provision.plan_dir {
                self.provision.plan_dir = plan_dir;
            }
            if let Some(poll_attempts) = provision.poll_attempts {
                self.provision.poll_attempts = poll_attempts;
            }
            if let Some(poll_interval_secs) = provision.poll_interval_secs {
                self.provision.poll_interval_secs = poll_interval_secs;
            }
            if let Some(settle_secs) = provision.settle_secs {
                self.provision.settle_secs = settle_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CORDWOOD_ORDER_SERVICEABLE_ZIP") {
            self.order.serviceable_zip = value;
        }

        if let Some(value) = read_env("CORDWOOD_VERIFY_ENABLED") {
            self.verify.enabled = parse_bool("CORDWOOD_VERIFY_ENABLED", &value)?;
        }
        if let Some(value) = read_env("CORDWOOD_VERIFY_BASE_URL") {
            self.verify.base_url = value;
        }
        if let Some(value) = read_env("CORDWOOD_VERIFY_AUTH_ID") {
            self.verify.auth_id = value;
        }
        if let Some(value) = read_env("CORDWOOD_VERIFY_AUTH_TOKEN") {
            self.verify.auth_token = value.into();
        }
        if let Some(value) = read_env("CORDWOOD_VERIFY_TIMEOUT_SECS") {
            self.verify.timeout_secs = parse_u64("CORDWOOD_VERIFY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CORDWOOD_PROVISION_BASE_URL") {
            self.provision.base_url = value;
        }
        if let Some(value) = read_env("CORDWOOD_PROVISION_PLAN_DIR") {
            self.provision.plan_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("CORDWOOD_PROVISION_POLL_ATTEMPTS") {
            self.provision.poll_attempts = parse_u32("CORDWOOD_PROVISION_POLL_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("CORDWOOD_PROVISION_POLL_INTERVAL_SECS") {
            self.provision.poll_interval_secs =
                parse_u64("CORDWOOD_PROVISION_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("CORDWOOD_PROVISION_SETTLE_SECS") {
            self.provision.settle_secs = parse_u64("CORDWOOD_PROVISION_SETTLE_SECS", &value)?;
        }

        if let Some(value) = read_env("CORDWOOD_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CORDWOOD_SERVER_PORT") {
            self.server.port = parse_u16("CORDWOOD_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CORDWOOD_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CORDWOOD_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("CORDWOOD_LOGGING_LEVEL").or_else(|| read_env("CORDWOOD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CORDWOOD_LOGGING_FORMAT").or_else(|| read_env("CORDWOOD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(serviceable_zip) = overrides.serviceable_zip {
            self.order.serviceable_zip = serviceable_zip;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(verify_enabled) = overrides.verify_enabled {
            self.verify.enabled = verify_enabled;
        }
        if let Some(verify_auth_id) = overrides.verify_auth_id {
            self.verify.auth_id = verify_auth_id;
        }
        if let Some(verify_auth_token) = overrides.verify_auth_token {
            self.verify.auth_token = verify_auth_token.into();
        }
        if let Some(plan_dir) = overrides.plan_dir {
            self.provision.plan_dir = plan_dir;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_order(&self.order)?;
        validate_verify(&self.verify)?;
        validate_provision(&self.provision)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cordwood.toml"), PathBuf::from("config/cordwood.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };
        let key = &after[..end];
        let value = env::var(key)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.to_owned() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_order(order: &OrderConfig) -> Result<(), ConfigError> {
    let zip = order.serviceable_zip.trim();
    if zip.len() != 5 || !zip.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ConfigError::Validation(
            "order.serviceable_zip must be a five-digit zip code".to_owned(),
        ));
    }

    if order.prices_per_cord.is_empty() {
        return Err(ConfigError::Validation(
            "order.prices_per_cord must list at least one firewood type".to_owned(),
        ));
    }
    if order.prices_per_cord.values().any(|price| *price == 0) {
        return Err(ConfigError::Validation(
            "order.prices_per_cord entries must be greater than zero".to_owned(),
        ));
    }

    Ok(())
}

fn validate_verify(verify: &VerifyConfig) -> Result<(), ConfigError> {
    if verify.timeout_secs == 0 || verify.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "verify.timeout_secs must be in range 1..=300".to_owned(),
        ));
    }

    if !verify.base_url.starts_with("http://") && !verify.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "verify.base_url must start with http:// or https://".to_owned(),
        ));
    }

    if verify.enabled {
        if verify.auth_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "verify.auth_id is required when verify.enabled is true".to_owned(),
            ));
        }
        if verify.auth_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "verify.auth_token is required when verify.enabled is true".to_owned(),
            ));
        }
    }

    Ok(())
}

fn validate_provision(provision: &ProvisionConfig) -> Result<(), ConfigError> {
    if !provision.base_url.starts_with("http://") && !provision.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "provision.base_url must start with http:// or https://".to_owned(),
        ));
    }

    if provision.poll_attempts == 0 {
        return Err(ConfigError::Validation(
            "provision.poll_attempts must be greater than zero".to_owned(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_owned()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_owned(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_owned(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    order: Option<OrderPatch>,
    verify: Option<VerifyPatch>,
    provision: Option<ProvisionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OrderPatch {
    serviceable_zip: Option<String>,
    prices_per_cord: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    auth_id: Option<String>,
    auth_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvisionPatch {
    base_url: Option<String>,
    plan_dir: Option<PathBuf>,
    poll_attempts: Option<u32>,
    poll_interval_secs: Option<u64>,
    settle_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
