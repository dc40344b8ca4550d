//! keyhub - command-line client for the API-key billing backend.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use keyhub::api::{ApiClient, FileSessionStore, SessionKey, SessionStore};
use keyhub::models::HealthStatus;
use keyhub::view::{
    aggregate_usage_rate, availability_percent, bucket_uptime, build_latency_series,
    format_latency, rank_channels, summarize_channels,
};
use keyhub::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides KEYHUB_API_BASE)
    #[arg(long)]
    api_base: Option<String>,
    /// Session file (overrides KEYHUB_SESSION_PATH)
    #[arg(long)]
    session: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Email a one-time login code
    SendCode { email: String },
    /// Log in with an emailed code
    Login { email: String, code: String },
    /// End the current session
    Logout,
    /// Show the stored identity
    Whoami,
    /// Today's usage and the usage-rate trend
    Usage {
        /// User ID (defaults to the logged-in user)
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Channel cards ordered by current latency
    Health {
        #[arg(long, default_value_t = 1)]
        hours: u32,
    },
    /// 24h availability bars of one channel
    Uptime { alias: String },
    /// List issued API keys
    Keys,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("keyhub=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut cfg = ClientConfig::load();
    if let Some(base) = cli.api_base {
        cfg.api_base_url = base;
    }
    if let Some(path) = cli.session {
        cfg.session_path = path;
    }
    tracing::debug!("Using backend {} and session {}", cfg.api_base_url, cfg.session_path);

    let session = Arc::new(FileSessionStore::open(&cfg.session_path)?);
    let client = ApiClient::builder(cfg, session.clone()).build()?;

    match cli.command {
        Command::SendCode { email } => {
            client.send_login_code(&email).await?;
            println!("Login code sent to {}", email);
        }
        Command::Login { email, code } => {
            let login = client.login(&email, &code).await?;
            println!("Logged in as {} (id {}, role {})", login.user.email, login.user.id, login.user.role);
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match session.identity() {
            Some(user) if session.is_logged_in() => {
                println!("{} (id {}, role {})", user.email, user.id, user.role)
            }
            _ => println!("Not logged in"),
        },
        Command::Usage { user, days } => {
            let user_id = match user.or_else(|| session.get(SessionKey::UserId)) {
                Some(id) => id,
                None => return Err("no user given and not logged in".into()),
            };
            let today = client.usage_today(&user_id).await?;
            let history = client.usage_history(&user_id, days).await?;
            let stats = aggregate_usage_rate(&history);

            println!("Today: {} / {} requests ({:.1}%)", today.used, today.quota, today.usage_rate * 100.0);
            println!(
                "Last {} days: current {:.1}%, min {:.1}%, max {:.1}% at {}, avg {:.1}%",
                days,
                stats.current * 100.0,
                stats.min * 100.0,
                stats.max * 100.0,
                if stats.peak_time.is_empty() { "--" } else { stats.peak_time.as_str() },
                stats.average * 100.0
            );
        }
        Command::Health { hours } => {
            let channels = client.channel_snapshots().await?;
            let points = client.realtime_latency(hours).await?;
            let series = build_latency_series(&points, &channels);
            let summary = summarize_channels(&channels);

            println!(
                "{} online, {} offline, mean EWMA {:.0}ms",
                summary.online, summary.offline, summary.mean_online_latency_ms
            );
            for alias in &series.card_order {
                let alive = channels.iter().any(|c| &c.alias == alias && c.alive);
                let latest = series.latest_by_alias.get(alias).copied().flatten();
                println!(
                    "  {:<24} {:<8} {}",
                    alias,
                    if alive { "online" } else { "offline" },
                    format_latency(latest)
                );
            }
            for channel in rank_channels(&channels).iter().filter(|c| c.consecutive_failures > 0) {
                println!("  ! {} failed {} checks in a row", channel.alias, channel.consecutive_failures);
            }
        }
        Command::Uptime { alias } => {
            let records = client.health_history(&alias).await?;
            let bars: String = bucket_uptime(&records)
                .iter()
                .map(|b| match b.status {
                    HealthStatus::Available => '#',
                    HealthStatus::Degraded => '~',
                    HealthStatus::Unavailable => 'x',
                    HealthStatus::Unknown => '.',
                })
                .collect();
            println!("{} {:.2}% available", alias, availability_percent(&records));
            println!("[{}]", bars);
        }
        Command::Keys => {
            for key in client.list_api_keys().await? {
                println!(
                    "{:<20} {:<24} {}",
                    key.id,
                    key.name,
                    if key.enabled { "enabled" } else { "disabled" }
                );
            }
        }
    }

    Ok(())
}
