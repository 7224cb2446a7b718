//! Break Manager Simulator
//!
//! Runs the full break cycle against scripted collaborators on an
//! accelerated clock:
//! - MockSession / MockDirectory stand in for the remote service
//! - ScaledClock compresses play and break lengths
//! - Optional chaos task drops the session and flips activity flags
//! - Optional console on stdin: `pause`, `resume`, `status`, `quit`
//!
//! Metrics and `/status` are served when `--metrics-addr` is set.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use respite_bins::common::{console_command, init_logging, print_stats, CommonArgs};
use respite_core::config::constants::TICK_INTERVAL;
use respite_core::endpoint::EndpointId;
use respite_core::engine::{BreakManager, BreakRunner, BreakStatus, Collaborators, Policies};
use respite_core::monitoring::{MetricsRegistry, MetricsServer, MetricsServerConfig};
use respite_core::notify::{ChannelSink, FileSink, LogSink};
use respite_core::resilience::{install_panic_handler, KillSwitch};
use respite_core::schedule::ScaledClock;
use respite_core::session::{NotificationSink, PauseFlag, StaticProfile};
use respite_core::testing::{test_profile, ConnectBehavior, MockActivity, MockDirectory, MockSession};
use respite_core::SessionState;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate the break cycle on an accelerated clock")]
struct SimArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Simulated seconds per real second
    #[arg(short, long, default_value = "60")]
    speed: u32,

    /// Stop after this many real seconds
    #[arg(short, long)]
    duration_secs: Option<u64>,

    /// Per-tick probability of a chaos event (0 disables)
    #[arg(long, default_value = "0.0")]
    chaos: f64,

    /// Append notices to this JSON-lines file instead of the log
    #[arg(long)]
    notice_log: Option<PathBuf>,

    /// Read pause/resume/status/quit commands from stdin
    #[arg(long)]
    console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SimArgs::parse();
    let config = args.common.resolve_config()?;

    init_logging(&config)?;
    install_panic_handler();

    tracing::info!("=== Respite: Break Cycle Simulator ===");
    tracing::info!("Speed: {}x", args.speed);

    let session = Arc::new(MockSession::new());
    let activity = Arc::new(MockActivity::new());
    let inner_sink: Arc<dyn NotificationSink> = match &args.notice_log {
        Some(path) => Arc::new(FileSink::open(path)?),
        None => Arc::new(LogSink),
    };
    let collaborators = Collaborators {
        session: session.clone(),
        directory: Arc::new(MockDirectory::new(MockDirectory::sample_pool())),
        notifications: Arc::new(ChannelSink::spawn(inner_sink)),
        activity: activity.clone(),
        scripts: Arc::new(PauseFlag::new()),
        profiles: Arc::new(StaticProfile::new(Some(test_profile()))),
    };

    let metrics = Arc::new(MetricsRegistry::new()?);
    let manager = BreakManager::builder(config.clone(), collaborators)
        .clock(Arc::new(ScaledClock::new(args.speed)))
        .policies(Policies::aggressive())
        .metrics(metrics.clone())
        .build()?;

    let kill_switch = KillSwitch::new();
    {
        let kill_switch = kill_switch.clone();
        ctrlc::set_handler(move || kill_switch.shutdown("Ctrl-C"))?;
    }

    // Tick often enough that one tick stays close to one simulated second
    let interval = (TICK_INTERVAL / args.speed.max(1)).max(Duration::from_millis(10));
    let runner = BreakRunner::new(manager, kill_switch.clone())
        .with_interval(interval)
        .with_metrics(metrics.clone());
    let status = runner.status();

    if let Some(addr) = config.monitoring.metrics_addr {
        let server = MetricsServer::new(MetricsServerConfig::with_addr(addr), metrics)
            .with_status(status.clone());
        let kill_switch = kill_switch.clone();
        tokio::spawn(async move {
            if let Err(e) = server.serve(kill_switch).await {
                tracing::error!(error = %e, "Metrics server failed");
            }
        });
    }

    if args.chaos > 0.0 {
        tokio::spawn(chaos_loop(
            session,
            activity,
            status.clone(),
            kill_switch.clone(),
            args.chaos.min(1.0),
            interval,
        ));
    }

    if args.console {
        spawn_console(kill_switch.clone(), status.clone());
    }

    if let Some(secs) = args.duration_secs {
        let kill_switch = kill_switch.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            kill_switch.shutdown("simulation time elapsed");
        });
    }

    tracing::info!("Starting break runner...");
    let (manager, stats) = runner.run().await;

    print_stats(&stats, &manager);
    if let Some(reason) = kill_switch.shutdown_reason() {
        tracing::info!("Stopped: {}", reason);
    }

    Ok(())
}

/// Operator commands on stdin, one per line
fn spawn_console(kill_switch: KillSwitch, status: BreakStatus) {
    std::thread::spawn(move || {
        tracing::info!("Console ready: pause | resume | status | quit");
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if !console_command(&line, &kill_switch, &status) {
                break;
            }
        }
    });
}

/// Random disturbances: unexpected drops, busy host, failing connects
async fn chaos_loop(
    session: Arc<MockSession>,
    activity: Arc<MockActivity>,
    status: BreakStatus,
    kill_switch: KillSwitch,
    probability: f64,
    interval: Duration,
) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = kill_switch.stopped() => break,
            _ = ticker.tick() => {}
        }

        if !rng.gen_bool(probability) {
            continue;
        }

        match rng.gen_range(0..4) {
            0 if status.current_state() == SessionState::Waiting => {
                tracing::warn!("Chaos: dropping session");
                session.drop_connection();
            }
            1 => {
                let busy = rng.gen_bool(0.5);
                tracing::warn!(busy, "Chaos: host activity changed");
                activity.set_busy(busy);
            }
            2 => {
                let behavior = match rng.gen_range(0..4) {
                    0 => ConnectBehavior::Hang,
                    1 => ConnectBehavior::NotInitiated,
                    2 => ConnectBehavior::Fail,
                    _ => ConnectBehavior::Succeed,
                };
                tracing::warn!(?behavior, "Chaos: connect behavior changed");
                session.set_connect_behavior(behavior);
            }
            3 if status.current_state() == SessionState::Disconnected => {
                let endpoint = EndpointId(rng.gen_range(1..7));
                tracing::warn!(%endpoint, "Chaos: session returned during break");
                session.restore(endpoint);
            }
            _ => {}
        }
    }
}
