use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use chrono::TimeDelta;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::provider_client::ProviderClient;
use crate::provider_client::Sender;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub confirmation: ConfirmationSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,

    // env vars are always strings; `config` cannot infer the number
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Public address of this relay, used to build confirmation links
    pub base_url: String,

    /// Public address of the site hosting the subscription form
    pub site_url: String,

    /// Value of `Access-Control-Allow-Origin`
    pub allowed_origin: String,

    pub confirmation: ConfirmationMode,
}

/// Whether a subscriber must click a link before being added to the list.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Check, add, then send a welcome email in a single request
    Direct,
    /// Email a single-use token; the contact is added on `/confirm`
    DoubleOptIn,
}

#[derive(Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Secret<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub list_id: u64,

    pub sender_email: String,
    pub sender_name: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl ProviderSettings {
    pub fn sender(&self) -> Result<Sender, String> {
        Sender::parse(self.sender_name.clone(), self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(self) -> Result<ProviderClient, anyhow::Error> {
        let sender = self.sender().map_err(anyhow::Error::msg)?;
        let timeout = self.timeout();
        let client = ProviderClient::new(
            self.base_url,
            self.api_key,
            self.list_id,
            sender,
            timeout,
        )?;
        Ok(client)
    }
}

#[derive(Deserialize, Clone)]
pub struct ConfirmationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub token_ttl_hours: i64,

    /// Where `/confirm` redirects after the contact was registered
    pub success_url: String,

    /// Where `/confirm` redirects for unknown or expired tokens
    pub error_url: String,
}

impl ConfirmationSettings {
    /// Must be a positive number of hours that `chrono` can represent.
    pub fn token_ttl(&self) -> Result<TimeDelta, String> {
        match TimeDelta::try_hours(self.token_ttl_hours) {
            Some(ttl) if ttl > TimeDelta::zero() => Ok(ttl),
            _ => Err(format!(
                "Invalid token TTL: {} hours",
                self.token_ttl_hours
            )),
        }
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}. Use either `local` or `production`")),
        }
    }
}

/// Layers `configuration/base.yaml`, `configuration/{env}.yaml` and `APP_*`
/// env vars, in that order. `APP_ENVIRONMENT` selects `{env}` (default
/// `local`).
///
/// Nested keys are separated by `__`:
///
/// ```sh
///     APP_PROVIDER__API_KEY=xkeysib-... APP_PROVIDER__LIST_ID=3 APP_APPLICATION__PORT=3000
/// ```
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings
        .confirmation
        .token_ttl()
        .map_err(ConfigError::Message)?;
    Ok(settings)
}
