use std::{env, str::FromStr};

use log::*;
use payment_providers::{FlutterwaveConfig, Provider, StripeConfig};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8380;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The provider used when an initiation request does not name one.
    pub default_provider: Provider,
    pub flutterwave: FlutterwaveConfig,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            default_provider: Provider::default(),
            flutterwave: FlutterwaveConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the store database.");
            String::default()
        });
        let default_provider = env::var("SPG_DEFAULT_PROVIDER")
            .ok()
            .and_then(|s| {
                Provider::from_str(&s)
                    .map_err(|e| warn!("🪛️ Invalid value for SPG_DEFAULT_PROVIDER. {e}. Using the default."))
                    .ok()
            })
            .unwrap_or_default();
        let flutterwave = FlutterwaveConfig::new_from_env_or_default();
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, default_provider, flutterwave, stripe }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the server configuration that request handlers need. Kept small on purpose, and free of secrets,
/// so that it can be injected as shared app data without passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub default_provider: Provider,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { default_provider: config.default_provider }
    }
}
