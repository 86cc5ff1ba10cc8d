//! Config module contains the top-level config for the app.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Namespace of cached user roles in redis
pub const ROLES_CACHE_NAMESPACE: &str = "autoparts:roles";
/// Namespace of the cached product groups tree in redis
pub const PRODUCT_GROUPS_CACHE_NAMESPACE: &str = "autoparts:product_groups";

/// Basic settings - HTTP binding address and database DSN
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub marketplace: Marketplace,
    pub scheduler: Option<Scheduler>,
    pub logging: Option<Logging>,
}

/// Common server settings
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub database: String,
    pub thread_count: usize,
    pub redis: Option<String>,
    pub cache_ttl_sec: u64,
}

/// Business rules of the marketplace
#[derive(Debug, Deserialize, Clone)]
pub struct Marketplace {
    /// How long a seller's offer waits for the customer
    pub offer_ttl_sec: u64,
    /// How long an order request stays open without an accepted offer
    pub order_request_ttl_sec: u64,
    /// Customer reward share of the order total, percent
    pub reward_percent: f64,
    /// Day of the month following completion when the reward is paid
    pub reward_payout_day: u32,
    pub max_cart_quantity: i32,
}

/// Periodic jobs settings
#[derive(Debug, Deserialize, Clone)]
pub struct Scheduler {
    pub interval_s: u64,
    pub thread_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Logging {
    /// Env-filter directive, e.g. `info,autoparts_lib=debug`
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

/// Creates new app config struct
/// #Examples
/// ```
/// use autoparts_lib::config::*;
///
/// let config = Config::new();
/// ```
impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;

        // Note that this file is _optional_
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        s.merge(File::with_name(&format!("config/{}", env)).required(false))?;

        // Add in settings from the environment (with a prefix of AUTOPARTS)
        s.merge(Environment::with_prefix("AUTOPARTS").separator("__"))?;

        s.try_into()
    }
}
