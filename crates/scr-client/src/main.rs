//! scr-client - SCR racing client
//!
//! Connects to a Simulated Car Racing server over UDP, identifies, and drives
//! the car with the selected control policy until the server shuts the race
//! down or the configured episode limit is reached.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod config;
mod error;
mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scr_driver::{
    GearStrategy, PolicyFactory, PolicyKind, PredictionError, PredictionProvider, PredictionResult,
    input_channel,
};
use scr_recorder::JsonLinesRecorder;
use scr_session::{RaceStage, Session, SessionReport, UdpTransport};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    RuleBased,
    ModelAssisted,
    ManualCapture,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RuleBased => PolicyKind::RuleBased,
            PolicyArg::ModelAssisted => PolicyKind::ModelAssisted,
            PolicyArg::ManualCapture => PolicyKind::ManualCapture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GearStrategyArg {
    Simple,
    Extended,
}

impl From<GearStrategyArg> for GearStrategy {
    fn from(arg: GearStrategyArg) -> Self {
        match arg {
            GearStrategyArg::Simple => GearStrategy::Simple,
            GearStrategyArg::Extended => GearStrategy::Extended,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "scr-client")]
#[command(about = "SCR racing client - drive a simulated car over the SCR UDP protocol")]
#[command(version)]
#[command(long_about = "
scr-client connects to a Simulated Car Racing server, identifies itself and
answers every sensor frame with a control command.

Settings come from an optional YAML file (--config); flags given on the
command line override the file. With --collect-data the car is driven from
stdin (lines such as +accelerate, -steer-left, gear-up, reverse) and every
cycle is written to a JSON-lines dataset.
")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "SCR_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Server host name or address
    #[arg(long)]
    host: Option<String>,

    /// Server UDP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bot identifier sent with the identification message
    #[arg(long = "id")]
    bot_id: Option<String>,

    /// Episodes to run before exiting (0 = unlimited)
    #[arg(long)]
    max_episodes: Option<u32>,

    /// Cycles per episode (0 = unlimited)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Track name, used in dataset file names
    #[arg(long)]
    track: Option<String>,

    /// Race stage: warm-up, qualifying, race or unknown
    #[arg(long)]
    stage: Option<RaceStage>,

    /// Control policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Gear rules for the rule-based policy
    #[arg(long, value_enum)]
    gear_strategy: Option<GearStrategyArg>,

    /// Drive from stdin and record every cycle
    #[arg(long)]
    collect_data: bool,

    /// Directory for recorded datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Receive timeout in milliseconds (0 = block)
    #[arg(long)]
    receive_timeout_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Load the YAML file, if any, then apply explicit flags on top.
    fn resolve(&self) -> Result<ClientConfig, ClientError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.transport.host = host.clone();
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
        if let Some(timeout) = self.receive_timeout_ms {
            config.transport.receive_timeout_ms = timeout;
        }
        if let Some(bot_id) = &self.bot_id {
            config.session.bot_id = bot_id.clone();
        }
        if let Some(max_episodes) = self.max_episodes {
            config.session.max_episodes = max_episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.session.max_steps = max_steps;
        }
        if let Some(track) = &self.track {
            config.session.track = Some(track.clone());
        }
        if let Some(stage) = self.stage {
            config.session.stage = stage;
        }
        if let Some(policy) = self.policy {
            config.driver.policy = policy.into();
        }
        if let Some(strategy) = self.gear_strategy {
            config.driver.rule_based.gear_strategy = strategy.into();
        }
        if let Some(dir) = &self.data_dir {
            config.recorder.data_dir = dir.clone();
        }
        if self.collect_data {
            config.driver.policy = PolicyKind::ManualCapture;
            config.recorder.enabled = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout and stdin stay free for the report and manual input
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "scr_client={log_level},scr_session={log_level},scr_driver={log_level},\
                 scr_recorder={log_level},scr_telemetry={log_level}"
            )
            .into()
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli) {
        Ok(report) => {
            println!(
                "episodes: {}  cycles: {}  skipped: {}  timeouts: {}",
                report.episodes, report.cycles, report.skipped_frames, report.timeouts
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<ClientError>()
                .map_or(1, ClientError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<SessionReport> {
    let config = cli.resolve()?;
    info!(
        server = %config.transport.server_address(),
        policy = %config.driver.policy,
        recording = config.recorder.enabled,
        "starting scr-client"
    );

    let transport = UdpTransport::connect(&config.transport)
        .map_err(ClientError::from)
        .with_context(|| format!("connecting to {}", config.transport.server_address()))?;
    let factory = policy_factory(&config)?;

    let mut session = Session::new(config.session.clone(), transport, factory);
    if config.recorder.enabled {
        session = session.with_recorder(Box::new(JsonLinesRecorder::new(
            config.recorder.data_dir.clone(),
            config.session.track.clone(),
        )));
    }

    let report = session.run().map_err(ClientError::from)?;
    Ok(report)
}

fn policy_factory(config: &ClientConfig) -> Result<PolicyFactory, ClientError> {
    let rules = config.driver.rule_based;
    Ok(match config.driver.policy {
        PolicyKind::RuleBased => PolicyFactory::rule_based(rules),
        PolicyKind::ModelAssisted => PolicyFactory::model_assisted(rules, Box::new(no_provider)),
        PolicyKind::ManualCapture => {
            let (tx, rx) = input_channel();
            input::spawn_stdin_source(tx)?;
            info!("reading manual input from stdin");
            PolicyFactory::manual_capture(rx)
        }
    })
}

fn no_provider() -> PredictionResult<Box<dyn PredictionProvider>> {
    warn!("scr-client is built without a prediction model");
    Err(PredictionError::Unavailable(
        "no prediction provider in this build".to_string(),
    ))
}
