//! # lobby_app — Session driver
//!
//! Hosts, joins or browses sessions on a NATS-backed session registry and
//! keeps the local view in sync until the session ends.
//!
//! ## Startup Sequence
//!
//! 1. Connect to NATS (configurable URL, default `nats://localhost:4222`).
//! 2. Create or join a session, or list the open ones.
//! 3. Enter the fixed-rate tick loop; Ctrl-C leaves the session.

mod output;
mod tick;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use lobby_model::{MemberId, SessionId};
use lobby_net::connection::{DEFAULT_NATS_URL, NATS_URL_ENV};
use lobby_net::subjects::DEFAULT_PREFIX;
use lobby_net::{NatsConnection, NatsRegistry, SessionFilter};
use lobby_sync::{SessionController, SyncConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use output::Output;
use tick::{TickConfig, TickLoop};

#[derive(Debug, Parser)]
#[command(name = "lobby_app", about = "Host, join or browse registry sessions over NATS")]
struct Cli {
    /// NATS server URL
    #[arg(long, env = NATS_URL_ENV, default_value = DEFAULT_NATS_URL)]
    nats_url: String,

    /// Registry subject prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Display name published for the local player
    #[arg(long, default_value = "Player")]
    player_name: String,

    /// Member id to authenticate as (random when omitted)
    #[arg(long)]
    player_id: Option<String>,

    /// Ticks per second
    #[arg(long, default_value_t = 30.0)]
    tick_rate: f64,

    /// Stop after this many ticks (0 = run until the session ends)
    #[arg(long, default_value_t = 0)]
    max_ticks: u64,

    /// Mark the local player ready right after entering the session
    #[arg(long)]
    ready: bool,

    /// Print sessions and events as JSON lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a session and host it
    Host {
        /// Session name
        #[arg(long, default_value = "Lobby")]
        name: String,

        /// Member capacity
        #[arg(long, default_value_t = 2)]
        max_members: u32,

        /// Hide the session from listings
        #[arg(long)]
        private: bool,

        /// Relay token clients use to reach the host (random when omitted)
        #[arg(long)]
        connection_token: Option<String>,
    },
    /// Join a session by id
    Join { session_id: String },
    /// Join a session by its shareable code
    JoinCode { code: String },
    /// List discoverable sessions
    List {
        /// Only sessions whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Skip full sessions
        #[arg(long)]
        open: bool,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,

        /// Keep refreshing until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lobby_app=info".parse()?))
        .init();

    let cli = Cli::parse();
    let output = Output::from_json_flag(cli.json);
    let member_id = MemberId::new(
        cli.player_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    );

    info!(%member_id, "session driver starting");
    let conn = NatsConnection::connect_to(&cli.nats_url).await?;

    let registry = NatsRegistry::new(conn, member_id.clone()).with_prefix(cli.prefix.clone());
    let mut controller = SessionController::new(Arc::new(registry), member_id, SyncConfig::default());

    match cli.command {
        Command::Host {
            name,
            max_members,
            private,
            connection_token,
        } => {
            let token = connection_token.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
            let session = controller
                .create(&name, max_members, &cli.player_name, private, &token)
                .await?;
            output.session(&session)?;
        }
        Command::Join { session_id } => {
            let joined = controller
                .join(&SessionId::new(session_id), &cli.player_name)
                .await?;
            let Some(session) = joined else {
                bail!("could not join session");
            };
            output.session(&session)?;
        }
        Command::JoinCode { code } => {
            let Some(session) = controller.join_by_code(&code, &cli.player_name).await? else {
                bail!("could not join session with code {code}");
            };
            output.session(&session)?;
        }
        Command::List {
            name,
            open,
            limit,
            watch,
        } => {
            let mut filter = SessionFilter::new();
            if let Some(name) = name {
                filter = filter.name_contains(name);
            }
            if open {
                filter = filter.only_open();
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }
            return browse(controller, &filter, watch, output).await;
        }
    }

    if cli.ready {
        controller.toggle_ready().await;
    }

    let config = TickConfig {
        tick_rate: cli.tick_rate,
        max_ticks: cli.max_ticks,
    };
    let mut tick_loop = TickLoop::new(config, controller, output);
    let outcome = tick_loop.run_until(shutdown_signal()).await?;

    info!(?outcome, ticks = tick_loop.tick_id(), "session driver shut down");
    Ok(())
}

/// Print the session list once, or keep refreshing it until Ctrl-C.
async fn browse(
    mut controller: SessionController,
    filter: &SessionFilter,
    watch: bool,
    output: Output,
) -> Result<()> {
    if !watch {
        for session in controller.refresh_session_list(filter).await {
            output.session(session)?;
        }
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_millis(100));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    controller.start_browsing(Instant::now());

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = interval.tick() => {}
        }
        if controller.browse_tick(Instant::now(), filter).await {
            info!(count = controller.sessions().len(), "session list refreshed");
            for session in controller.sessions() {
                output.session(session)?;
            }
        }
    }

    controller.stop_browsing();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
