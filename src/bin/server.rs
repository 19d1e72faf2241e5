use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use concierge::auth;
use concierge::config::{self, CliArgs, Config};
use concierge::db::{self, DbPool};
use concierge::dto::MIN_PASSWORD_LENGTH;
use concierge::models::{Role, User};
use concierge::{create_app, repo, run_migrations, scheduler, AppState};

/// Sets up stdout logging and, when `log_dir` is configured, a daily rolling JSON log file
///
/// `RUST_LOG` overrides the default level. The returned guard flushes the
/// file writer and must live as long as the server.
fn init_logging(config: &Config, debug: bool, json: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let stdout_layer = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "concierge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Creates the first superadmin from the command line, once
fn seed_superadmin(pool: &DbPool, args: &CliArgs) -> Result<()> {
    let (Some(email), Some(password)) = (&args.seed_superadmin_email, &args.seed_superadmin_password) else {
        return Ok(());
    };

    if repo::superadmin_exists(pool)? {
        info!("A superadmin already exists, skipping seed");
        return Ok(());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Seed superadmin password must be at least {} characters", MIN_PASSWORD_LENGTH);
    }

    let user = User::new(email, auth::hash_password(password)?, "Platform Admin".to_string(), Role::Superadmin);
    repo::create_user(pool, &user)?;
    info!("Seeded superadmin {}", user.get_email());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let config = config::get_config(&args);
    let _log_guard = init_logging(&config, args.debug, args.json_logs)?;

    if config.uses_default_secrets() {
        warn!("Using built-in development secrets; set JWT_SECRET and PAYMENT_WEBHOOK_SECRET in production");
    }

    let pool = db::init_pool(&config.database_url)?;
    {
        let mut conn = pool.get().context("Failed to get a connection for migrations")?;
        run_migrations(&mut conn)?;
    }
    seed_superadmin(&pool, &args)?;

    let pool = Arc::new(pool);
    let sweeper = scheduler::start_checkout_scheduler(pool.clone(), config.checkout_sweep_interval());

    let state = AppState::from_config(pool, &config);
    let app = create_app(state, config.cors_origin.as_deref());

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    sweeper.abort();
    served
}
