pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod jobs;
pub mod scheduler;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use auth::LegacyHasher;
pub use config::Config;
use scheduler::Scheduler;
use state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config).await,

        "check" | "-c" | "--check" => run_single_check(config).await,

        "hash" => {
            if args.len() < 3 {
                println!("Usage: yardman hash <password>");
                return Ok(());
            }
            cmd_hash(&args[2])
        }

        "verify" => {
            if args.len() < 4 {
                println!("Usage: yardman verify <username> <password>");
                return Ok(());
            }
            cmd_verify(&config, &args[2], &args[3]).await
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Yardman - Terminal Back-Office Service");
    println!("Legacy authentication bridge and scheduled job runner");
    println!();
    println!("USAGE:");
    println!("  yardman <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  daemon            Run the scheduler and ops API as a daemon");
    println!("  check             Run every scheduled job once and exit");
    println!("  hash <password>   Print a salted legacy hash for a password");
    println!("  verify <user> <password>");
    println!("                    Check credentials against the database");
    println!("  help              Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the database, scheduler and mail relay.");
}

fn cmd_hash(password: &str) -> anyhow::Result<()> {
    let hashed = LegacyHasher::hash(password);
    println!("hash: {}", hashed.hash);
    println!("salt: {}", hashed.salt);
    Ok(())
}

async fn cmd_verify(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    use auth::{Credentials, LegacyUserProvider};

    let store = db::Store::new(&config.general.database_path).await?;
    let provider = LegacyUserProvider::new(store);

    let credentials = Credentials::with_username(username, password);
    match provider.find_by_credentials(&credentials).await? {
        Some(user) if LegacyUserProvider::validate_credentials(&user, &credentials) => {
            println!("✓ Credentials valid for user {} (id {})", user.username, user.id);
        }
        Some(user) => {
            println!("✗ Wrong password for user {} (id {})", user.username, user.id);
        }
        None => {
            println!("✗ No active user named '{}'", username);
        }
    }

    Ok(())
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Yardman v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let state = Arc::new(AppState::new(config.clone()).await?);

    let scheduler = Arc::new(Scheduler::new(Arc::clone(&state), config.scheduler.clone()));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting ops API on port {}", port);

        let app = api::router(Arc::clone(&state));
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Ops API running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Ops API error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

async fn run_single_check(config: Config) -> anyhow::Result<()> {
    info!("Running single check...");

    let state = Arc::new(AppState::new(config.clone()).await?);
    let scheduler = Scheduler::new(state, config.scheduler.clone());

    scheduler.run_once().await?;

    info!("Check complete");
    Ok(())
}
