use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use tracing::{info, warn};

/// Secrets used when nothing else is configured; fine for local runs only
pub const DEFAULT_JWT_SECRET: &str = "concierge-dev-jwt-secret";
pub const DEFAULT_WEBHOOK_SECRET: &str = "concierge-dev-webhook-secret";

/// Configuration for the Concierge server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// HMAC secret used to sign access tokens
    pub jwt_secret: String,
    /// Lifetime of access tokens in minutes
    pub access_token_ttl_minutes: i64,
    /// Lifetime of refresh tokens in days
    pub refresh_token_ttl_days: i64,
    /// Seconds between checkout sweeps
    pub checkout_sweep_interval_seconds: u64,
    /// Shared secret for payment webhook signatures
    pub payment_webhook_secret: String,
    /// Directory for daily rolling log files; stdout only when unset
    pub log_dir: Option<String>,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub access_token_ttl_minutes: Option<i64>,
    #[serde(default)]
    pub refresh_token_ttl_days: Option<i64>,
    #[serde(default)]
    pub checkout_sweep_interval_seconds: Option<u64>,
    #[serde(default)]
    pub payment_webhook_secret: Option<String>,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub cors_origin: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "concierge", about = "Hotel guest-services platform server")]
pub struct CliArgs {
    /// Path to a TOML config file, overriding the platform config directory
    #[clap(long, env = "CONCIERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[clap(long, env = "BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Secret for signing access tokens
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes
    #[clap(long, env = "ACCESS_TOKEN_TTL_MINUTES")]
    pub access_token_ttl_minutes: Option<i64>,

    /// Refresh token lifetime in days
    #[clap(long, env = "REFRESH_TOKEN_TTL_DAYS")]
    pub refresh_token_ttl_days: Option<i64>,

    /// Seconds between checkout sweeps
    #[clap(long, env = "CHECKOUT_SWEEP_INTERVAL_SECONDS")]
    pub checkout_sweep_interval_seconds: Option<u64>,

    /// Secret for payment webhook signatures
    #[clap(long, env = "PAYMENT_WEBHOOK_SECRET", hide_env_values = true)]
    pub payment_webhook_secret: Option<String>,

    /// Directory for rolling log files
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,

    /// Allowed CORS origin
    #[clap(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Debug mode
    #[clap(long, env = "CONCIERGE_DEBUG", default_value_t = false)]
    pub debug: bool,

    /// Emit logs as JSON
    #[clap(long, env = "CONCIERGE_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,

    /// Email of a superadmin to create when none exists yet
    #[clap(long, env = "SEED_SUPERADMIN_EMAIL", requires = "seed_superadmin_password")]
    pub seed_superadmin_email: Option<String>,

    /// Password for the seeded superadmin
    #[clap(long, env = "SEED_SUPERADMIN_PASSWORD", hide_env_values = true)]
    pub seed_superadmin_password: Option<String>,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            jwt_secret: update.jwt_secret.unwrap_or(self.jwt_secret),
            access_token_ttl_minutes: update.access_token_ttl_minutes.unwrap_or(self.access_token_ttl_minutes),
            refresh_token_ttl_days: update.refresh_token_ttl_days.unwrap_or(self.refresh_token_ttl_days),
            checkout_sweep_interval_seconds: update
                .checkout_sweep_interval_seconds
                .unwrap_or(self.checkout_sweep_interval_seconds),
            payment_webhook_secret: update.payment_webhook_secret.unwrap_or(self.payment_webhook_secret),
            log_dir: update.log_dir.or(self.log_dir),
            cors_origin: update.cors_origin.or(self.cors_origin),
        }
    }

    /// Returns the checkout sweep interval as a Duration
    ///
    /// Clamped to at least one second; `tokio::time::interval` panics on zero.
    pub fn checkout_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.checkout_sweep_interval_seconds.max(1))
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_ttl_minutes)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_ttl_days)
    }

    /// Whether either signing secret is still the built-in development value
    pub fn uses_default_secrets(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET || self.payment_webhook_secret == DEFAULT_WEBHOOK_SECRET
    }
}

/// Returns the base (default) configuration
///
/// The database lives in the data directory when one is known.
pub fn base_config(data_path: Option<PathBuf>) -> Config {
    let database_url = data_path.map_or("concierge.db".to_string(), |path| {
        path.join("concierge.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        bind_address: "127.0.0.1:3000".to_string(),
        jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        checkout_sweep_interval_seconds: 300,
        payment_webhook_secret: DEFAULT_WEBHOOK_SECRET.to_string(),
        log_dir: None,
        cors_origin: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: &CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url.clone(),
        bind_address: args.bind_address.clone(),
        jwt_secret: args.jwt_secret.clone(),
        access_token_ttl_minutes: args.access_token_ttl_minutes,
        refresh_token_ttl_days: args.refresh_token_ttl_days,
        checkout_sweep_interval_seconds: args.checkout_sweep_interval_seconds,
        payment_webhook_secret: args.payment_webhook_secret.clone(),
        log_dir: args.log_dir.clone(),
        cors_origin: args.cors_origin.clone(),
    }
}

/// Gets the complete configuration by combining defaults with
/// values from the config file, environment variables, and command line
/// arguments in order of increasing precedence
pub fn get_config(args: &CliArgs) -> Config {
    let project_dirs = ProjectDirs::from("com", "concierge", "concierge");
    if project_dirs.is_none() {
        warn!("Could not determine platform directories, using working directory");
    }

    let data_path = project_dirs
        .as_ref()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .filter(|path| path.exists());

    let config_file = args.config.clone().or_else(|| {
        project_dirs
            .as_ref()
            .map(|dirs| dirs.config_dir().join("config.toml"))
    });

    let config = base_config(data_path)
        .apply_update(config_from_file(config_file).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind_address={}, access_ttl={}min, refresh_ttl={}d, sweep={}s",
        config.database_url,
        config.bind_address,
        config.access_token_ttl_minutes,
        config.refresh_token_ttl_days,
        config.checkout_sweep_interval_seconds
    );

    config
}
